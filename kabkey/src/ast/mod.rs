//! Abstract Syntax Tree definitions
//!
//! Every node keeps the token that introduced it so later stages can report
//! positions. `Display` renders the canonical, fully parenthesized form used
//! to check precedence and to show function bodies.

mod expr;
mod position;

pub use expr::*;
pub use position::*;

use crate::lexer::Token;
use crate::stack;
use serde::Serialize;
use std::fmt;

/// A program is a sequence of statements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Let(LetStatement),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
    While(WhileStatement),
}

impl Statement {
    pub fn token(&self) -> &Token {
        match self {
            Statement::Let(s) => &s.token,
            Statement::Return(s) => &s.token,
            Statement::Expression(s) => &s.token,
            Statement::While(s) => &s.token,
        }
    }
}

/// `let <name> = <value>;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetStatement {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

/// `return [<value>];`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Option<Expression>,
}

/// An expression used as a statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

/// `while (<condition>) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileStatement {
    pub token: Token,
    pub condition: Expression,
    pub body: BlockStatement,
}

/// `{ <statements> }`, used for function bodies and branches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl Drop for BlockStatement {
    fn drop(&mut self) {
        let statements = std::mem::take(&mut self.statements);
        stack::guarded(|| drop(statements));
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let(s) => write!(f, "let {} = {};", s.name, s.value),
            Statement::Return(s) => match &s.value {
                Some(value) => write!(f, "return {value};"),
                None => write!(f, "return;"),
            },
            Statement::Expression(s) => write!(f, "{}", s.expression),
            Statement::While(s) => write!(f, "while {} {{ {} }}", s.condition, s.body),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}
