//! Runtime errors for the interpreter

use super::Value;
use crate::ast::Position;
use std::fmt;

/// Runtime error produced during evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Source position; native-function errors carry none
    pub position: Option<Position>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Name not bound anywhere in the environment chain
    IdentifierNotFound,
    /// Infix operands of different types
    TypeMismatch,
    /// Operator not defined for the operand types
    UnknownOperator,
    /// Call of a non-function value
    NotAFunction,
    /// Argument count does not match the parameter list
    ArityMismatch,
    /// Integer division by zero
    DivisionByZero,
    /// Call nesting beyond the interpreter's limit
    StackOverflow,
    /// Violation reported by a native function
    Native,
}

impl RuntimeError {
    fn at(kind: ErrorKind, message: String, position: Position) -> Self {
        RuntimeError {
            kind,
            message,
            position: Some(position),
        }
    }

    pub fn identifier_not_found(name: &str, position: Position) -> Self {
        Self::at(
            ErrorKind::IdentifierNotFound,
            format!("identifier not found: {name}"),
            position,
        )
    }

    pub fn type_mismatch(left: &str, op: impl fmt::Display, right: &str, position: Position) -> Self {
        Self::at(
            ErrorKind::TypeMismatch,
            format!("type mismatch: {left} {op} {right}"),
            position,
        )
    }

    pub fn unknown_infix_operator(
        left: &str,
        op: impl fmt::Display,
        right: &str,
        position: Position,
    ) -> Self {
        Self::at(
            ErrorKind::UnknownOperator,
            format!("unknown operator: {left} {op} {right}"),
            position,
        )
    }

    pub fn unknown_prefix_operator(op: impl fmt::Display, operand: &str, position: Position) -> Self {
        Self::at(
            ErrorKind::UnknownOperator,
            format!("unknown operator: {op}{operand}"),
            position,
        )
    }

    pub fn not_a_function(type_name: &str, position: Position) -> Self {
        Self::at(
            ErrorKind::NotAFunction,
            format!("not a function: {type_name}"),
            position,
        )
    }

    pub fn arity_mismatch(expected: usize, got: usize, position: Position) -> Self {
        Self::at(
            ErrorKind::ArityMismatch,
            format!("wrong number of arguments: expected {expected}, got {got}"),
            position,
        )
    }

    pub fn division_by_zero(position: Position) -> Self {
        Self::at(ErrorKind::DivisionByZero, "division by zero".to_string(), position)
    }

    pub fn stack_overflow(position: Position) -> Self {
        Self::at(
            ErrorKind::StackOverflow,
            "stack overflow: too deep recursion".to_string(),
            position,
        )
    }

    /// Error reported by a native function
    pub fn native(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Native,
            message: message.into(),
            position: None,
        }
    }

    /// `[line:column] ERROR: message`, or without the prefix when
    /// `with_position` is false or no position is known.
    pub fn render(&self, with_position: bool) -> String {
        match self.position {
            Some(pos) if with_position => format!("[{pos}] ERROR: {}", self.message),
            _ => format!("ERROR: {}", self.message),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

impl std::error::Error for RuntimeError {}

/// Non-local exit from evaluation: an in-flight `return` or an error
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Unwound to the nearest function call or the program
    Return(Value),
    /// Unwound all the way to the program
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(err: RuntimeError) -> Self {
        Signal::Error(err)
    }
}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, Signal>;
