//! Tree-walking evaluator for Tinker.
//!
//! Operates directly on the elaborated tree `tinker-compiler` produces: no
//! separate bytecode or intermediate representation. The evaluator crate
//! only depends on `tinker-core` for its data model (declarations, types,
//! expressions, statements, values) plus the small amount of ambient
//! plumbing (`indexmap` for call frames, `thiserror` for the runtime error
//! type, `tracing` for execution spans) that crate needs on its own.

pub mod control;
pub mod error;
pub mod evaluator;
pub mod frame;
pub mod place;
pub mod store;

pub use control::Control;
pub use error::{RuntimeError, RuntimeErrorKind};
pub use evaluator::{Evaluator, reduce};
pub use frame::Frame;
pub use place::Place;
pub use store::Store;
