//! Core data structures shared by every phase of a Tinker translation: the
//! symbol interner, the canonical type store, the expression/statement/
//! declaration node model, the scope stack, and the runtime value model.
//!
//! Nothing in this crate performs lexing, parsing, elaboration, or
//! evaluation; it only defines the shared vocabulary those phases are
//! written in terms of.

pub mod decl;
pub mod error;
pub mod expr;
pub mod interner;
pub mod scope;
pub mod span;
pub mod stmt;
pub mod types;
pub mod value;

pub use decl::{Decl, DeclArena, DeclId, DeclKind, Specifiers};
pub use error::{Diagnostic, Diagnostics, Severity};
pub use expr::{BinaryOp, ConversionKind, Expr, ExprKind, InitKind, LiteralValue, UnaryOp};
pub use interner::{Interner, Symbol, TokenClass};
pub use scope::{AdmitError, OverloadSet, Scope, ScopeStack};
pub use span::{Location, Span};
pub use stmt::{RawLocalVar, Stmt, StmtKind};
pub use types::{IntPrecision, TypeData, TypeExpr, TypeId, TypeStore};
pub use value::{PathStep, Slot, Value};
