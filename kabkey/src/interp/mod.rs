//! Tree-walking interpreter
//!
//! Evaluates a parsed [`Program`](crate::ast::Program) against a chain of
//! shared environments. Functions are closures over the environment their
//! literal was evaluated in; natives are bound in the global environment.

pub mod env;
mod error;
mod eval;
pub mod native;
mod output;
mod value;

pub use env::{EnvRef, Environment};
pub use error::{ErrorKind, EvalResult, RuntimeError, Signal};
pub use eval::Interpreter;
pub use native::{CallContext, NativeFn, NativeResult};
pub use output::SharedBuffer;
pub use value::{ErrorFormat, Function, NativeFunction, Value};
