//! Expression AST nodes

use super::{BlockStatement, Position};
use crate::lexer::{Token, TokenKind};
use crate::stack;
use serde::Serialize;
use std::fmt;

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Identifier(Identifier),
    Integer(IntegerLiteral),
    String(StringLiteral),
    Boolean(BooleanLiteral),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    If(IfExpression),
    Function(FunctionLiteral),
    Call(CallExpression),
}

impl Expression {
    /// The token that introduced this expression
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier(e) => &e.token,
            Expression::Integer(e) => &e.token,
            Expression::String(e) => &e.token,
            Expression::Boolean(e) => &e.token,
            Expression::Prefix(e) => &e.token,
            Expression::Infix(e) => &e.token,
            Expression::If(e) => &e.token,
            Expression::Function(e) => &e.token,
            Expression::Call(e) => &e.token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub token: Token,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegerLiteral {
    pub token: Token,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringLiteral {
    pub token: Token,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanLiteral {
    pub token: Token,
    pub value: bool,
}

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefixOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

/// `<op><operand>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefixExpression {
    pub token: Token,
    pub op: PrefixOp,
    pub operand: Box<Expression>,
}

/// Infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// `<left> <op> <right>`; the token is the operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfixExpression {
    pub token: Token,
    pub op: InfixOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

/// `if (<condition>) { ... } [else { ... }]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfExpression {
    pub token: Token,
    pub condition: Box<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

/// `fn(<parameters>) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

/// `<function>(<arguments>)`; the token is the opening parenthesis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallExpression {
    pub token: Token,
    pub function: Box<Expression>,
    pub arguments: Vec<Expression>,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Neg => write!(f, "-"),
            PrefixOp::Not => write!(f, "!"),
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Le => "<=",
            InfixOp::Ge => ">=",
            InfixOp::Eq => "==",
            InfixOp::Ne => "!=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Writes `{ <block> }`, or `{}` for an empty block
fn fmt_braced(f: &mut fmt::Formatter<'_>, block: &BlockStatement) -> fmt::Result {
    if block.statements.is_empty() {
        write!(f, "{{}}")
    } else {
        write!(f, "{{ {block} }}")
    }
}

/// Writes a comma-separated parameter list
fn fmt_parameters(f: &mut fmt::Formatter<'_>, parameters: &[Identifier]) -> fmt::Result {
    for (i, p) in parameters.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{p}")?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        stack::guarded(|| self.fmt_canonical(f))
    }
}

impl Expression {
    fn fmt_canonical(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(e) => write!(f, "{e}"),
            Expression::Integer(e) => write!(f, "{}", e.value),
            Expression::String(e) => write!(f, "\"{}\"", e.value),
            Expression::Boolean(e) => write!(f, "{}", e.value),
            Expression::Prefix(e) => write!(f, "({}{})", e.op, e.operand),
            Expression::Infix(e) => write!(f, "({} {} {})", e.left, e.op, e.right),
            Expression::If(e) => {
                write!(f, "if {} ", e.condition)?;
                fmt_braced(f, &e.consequence)?;
                if let Some(alt) = &e.alternative {
                    write!(f, " else ")?;
                    fmt_braced(f, alt)?;
                }
                Ok(())
            }
            Expression::Function(e) => {
                write!(f, "fn(")?;
                fmt_parameters(f, &e.parameters)?;
                write!(f, ") ")?;
                fmt_braced(f, &e.body)
            }
            Expression::Call(e) => {
                write!(f, "{}(", e.function)?;
                for (i, arg) in e.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// Teardown of nested nodes recurses once per level like every other walk, so
// each node hands its children to `stack::guarded` before they are dropped.

/// Moves a child out of its box, leaving a leaf behind
fn take_child(child: &mut Expression) -> Expression {
    let leaf = Expression::Boolean(BooleanLiteral {
        token: Token::new(TokenKind::Eof, "", Position::new(0, 0)),
        value: false,
    });
    std::mem::replace(child, leaf)
}

impl Drop for PrefixExpression {
    fn drop(&mut self) {
        let operand = take_child(&mut self.operand);
        stack::guarded(|| drop(operand));
    }
}

impl Drop for InfixExpression {
    fn drop(&mut self) {
        let children = [take_child(&mut self.left), take_child(&mut self.right)];
        stack::guarded(|| drop(children));
    }
}

impl Drop for IfExpression {
    fn drop(&mut self) {
        let condition = take_child(&mut self.condition);
        stack::guarded(|| drop(condition));
    }
}

impl Drop for CallExpression {
    fn drop(&mut self) {
        let function = take_child(&mut self.function);
        let arguments = std::mem::take(&mut self.arguments);
        stack::guarded(|| drop((function, arguments)));
    }
}
