//! Runtime values for the interpreter

use super::env::EnvRef;
use super::error::RuntimeError;
use super::native::NativeFn;
use crate::ast::BlockStatement;
use std::fmt;
use std::rc::Rc;

/// How Error values are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ErrorFormat {
    /// `[line:column] ERROR: message`
    #[default]
    Extended,
    /// `ERROR: message`
    Plain,
}

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit integer
    Integer(i64),
    /// Immutable string
    String(Rc<str>),
    /// Boolean
    Boolean(bool),
    /// Null
    Null,
    /// Error produced by evaluation or a native function
    Error(RuntimeError),
    /// User-defined or native function, shared by reference
    Function(Rc<Function>),
}

/// A callable value
pub enum Function {
    /// Closure over the environment where its literal was evaluated
    User {
        parameters: Vec<String>,
        body: BlockStatement,
        env: EnvRef,
    },
    /// Host-provided function
    Native(NativeFunction),
}

/// A named host function
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl Value {
    /// Truthiness used by `if`, `while`, `!`, `&&` and `||`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            Value::Integer(n) => *n != 0,
            _ => true,
        }
    }

    /// Type tag used in error messages and by the `type` native
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::String(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Error(_) => "ERROR",
            Value::Function(_) => "FUNCTION",
        }
    }

    /// Display form, with Error values rendered per `format`
    pub fn inspect(&self, format: ErrorFormat) -> String {
        match self {
            Value::Error(err) => err.render(format == ErrorFormat::Extended),
            other => other.to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Error(err) => write!(f, "{err}"),
            Value::Function(func) => write!(f, "{func}"),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::User {
                parameters, body, ..
            } => {
                write!(f, "fn({}) ", parameters.join(", "))?;
                if body.statements.is_empty() {
                    write!(f, "{{}}")
                } else {
                    write!(f, "{{ {body} }}")
                }
            }
            Function::Native(native) => write!(f, "builtin function {}", native.name),
        }
    }
}

// The captured environment usually contains the function itself, so it is
// left out to keep Debug output finite.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::User {
                parameters, body, ..
            } => f
                .debug_struct("User")
                .field("parameters", parameters)
                .field("body", &body.to_string())
                .finish_non_exhaustive(),
            Function::Native(native) => f.debug_tuple("Native").field(&native.name).finish(),
        }
    }
}

/// Scalars and strings compare by value, functions by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
