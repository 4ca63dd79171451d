//! Kabkey interpreter library
//!
//! A small dynamically-typed language with closures, run by a tree-walking
//! interpreter.

pub mod ast;
pub mod driver;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;
mod stack;

pub use ast::Position;
pub use error::Diagnostic;
pub use interp::{ErrorFormat, Interpreter, Value};
