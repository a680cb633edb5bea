//! The statement control-flow token.
//!
//! `eval_stmt` never returns early out of a block by unwinding the Rust call
//! stack; instead every statement evaluation returns one of these four
//! states, and composite statements (blocks, loops) inspect it to decide
//! whether to keep going or propagate it further up.

use tinker_core::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Next,
    Return(Value),
    Break,
    Continue,
}
