//! Runtime errors.
//!
//! A well-elaborated program can still fail at runtime in the handful of ways
//! the type system cannot rule out in advance: division or remainder by
//! zero, and a function whose control flow falls off the end without
//! reaching a `return`. Every other invariant violation (an unresolved `Id`
//! expression, a call target that didn't evaluate to a function, a path step
//! that doesn't match the value it's applied to) indicates a bug in the
//! elaborator rather than a condition a well-elaborated program can reach,
//! and is reported with a `panic!` rather than this error type.

use tinker_core::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("division by 0")]
    DivisionByZero,
    #[error("remainder by 0")]
    RemainderByZero,
    #[error("function returned no value")]
    MissingReturn,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct RuntimeError {
    pub span: Span,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(span: Span, kind: RuntimeErrorKind) -> Self {
        Self { span, kind }
    }
}
