//! Recursive-descent parser with precedence climbing for expressions
//!
//! The parser never aborts: a failed production records a [`Diagnostic`] and
//! yields `None`, and the statement loop skips one token and keeps going so a
//! single pass surfaces as many problems as possible.

use crate::ast::{
    BlockStatement, BooleanLiteral, CallExpression, Expression, ExpressionStatement,
    FunctionLiteral, Identifier, IfExpression, InfixExpression, InfixOp, IntegerLiteral,
    LetStatement, PrefixExpression, PrefixOp, Program, ReturnStatement, Statement, StringLiteral,
    WhileStatement,
};
use crate::error::Diagnostic;
use crate::lexer::{Scanner, Token, TokenKind};
use crate::stack;


/// Binding power of infix operators, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    /// `&&` `||`
    Logical,
    /// `==` `!=`
    Equals,
    /// `<` `>` `<=` `>=`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `-x` `!x`
    Prefix,
    /// `f(x)`
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::And | TokenKind::Or => Precedence::Logical,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Asterisk => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::Lt => InfixOp::Lt,
        TokenKind::Gt => InfixOp::Gt,
        TokenKind::LtEq => InfixOp::Le,
        TokenKind::GtEq => InfixOp::Ge,
        TokenKind::Eq => InfixOp::Eq,
        TokenKind::NotEq => InfixOp::Ne,
        TokenKind::And => InfixOp::And,
        TokenKind::Or => InfixOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Builds a [`Program`] from the tokens of a [`Scanner`]
pub struct Parser<'src> {
    scanner: Scanner<'src>,
    cur: Token,
    peek: Token,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Parser<'src> {
    pub fn new(mut scanner: Scanner<'src>) -> Self {
        let cur = scanner.next_token();
        let peek = scanner.next_token();
        Parser {
            scanner,
            cur,
            peek,
            diagnostics: Vec::new(),
        }
    }

    /// Parse until end of input. Always returns a program; check
    /// [`Parser::diagnostics`] afterwards.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        tracing::debug!(
            statements = program.statements.len(),
            diagnostics = self.diagnostics.len(),
            "parsed program"
        );
        program
    }

    /// Parser diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Scanner diagnostics
    pub fn scanner_diagnostics(&self) -> &[Diagnostic] {
        self.scanner.diagnostics()
    }

    /// All diagnostics, scanner first
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut all = self.scanner.into_diagnostics();
        all.extend(self.diagnostics);
        all
    }

    fn next_token(&mut self) {
        let next = self.scanner.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    /// Advance if the next token has the required kind, otherwise record a
    /// diagnostic at the next token.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.next_token();
            Some(())
        } else {
            let message = format!(
                "expected token of type \"{}\", got \"{}\"",
                kind, self.peek.kind
            );
            self.error_at(self.peek.clone(), message);
            None
        }
    }

    fn error_at(&mut self, token: Token, message: String) {
        tracing::trace!(%message, line = token.line, column = token.column, "parse diagnostic");
        self.diagnostics
            .push(Diagnostic::parser(message, token.position()));
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    // ============================================
    // Statements
    // ============================================

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_statement().map(Statement::Let),
            TokenKind::Return => self.parse_return_statement().map(Statement::Return),
            TokenKind::While => self.parse_while_statement().map(Statement::While),
            _ => self
                .parse_expression_statement()
                .map(Statement::Expression),
        }
    }

    fn parse_let_statement(&mut self) -> Option<LetStatement> {
        let token = self.cur.clone();

        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier {
            token: self.cur.clone(),
            name: self.cur.text.clone(),
        };

        self.expect_peek(TokenKind::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(LetStatement { token, name, value })
    }

    fn parse_return_statement(&mut self) -> Option<ReturnStatement> {
        let token = self.cur.clone();

        let value = if self.peek_is(TokenKind::Semicolon)
            || self.peek_is(TokenKind::RBrace)
            || self.peek_is(TokenKind::Eof)
        {
            None
        } else {
            self.next_token();
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.skip_semicolon();

        Some(ReturnStatement { token, value })
    }

    fn parse_while_statement(&mut self) -> Option<WhileStatement> {
        let token = self.cur.clone();
        let condition = self.parse_condition()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;
        Some(WhileStatement {
            token,
            condition,
            body,
        })
    }

    fn parse_expression_statement(&mut self) -> Option<ExpressionStatement> {
        let token = self.cur.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(ExpressionStatement { token, expression })
    }

    /// Parses from `{` through the matching `}`
    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let token = self.cur.clone();
        let mut statements = Vec::new();
        self.next_token();

        while !self.cur_is(TokenKind::RBrace) {
            if self.cur_is(TokenKind::Eof) {
                let message = format!(
                    "expected token of type \"{}\", got \"{}\"",
                    TokenKind::RBrace,
                    TokenKind::Eof
                );
                self.error_at(self.cur.clone(), message);
                return None;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }

        Some(BlockStatement { token, statements })
    }

    // ============================================
    // Expressions
    // ============================================

    /// Every nesting level of the grammar passes through here, so this is
    /// where the stack is grown for deeply nested input
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        stack::guarded(|| self.parse_expression_inner(precedence))
    }

    fn parse_expression_inner(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < precedence_of(self.peek.kind) {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let token = self.cur.clone();
        match token.kind {
            TokenKind::Ident => Some(Expression::Identifier(Identifier {
                name: token.text.clone(),
                token,
            })),
            TokenKind::Int => match token.text.parse::<i64>() {
                Ok(value) => Some(Expression::Integer(IntegerLiteral { token, value })),
                Err(_) => {
                    let message = format!("could not parse \"{}\" as integer", token.text);
                    self.error_at(token, message);
                    None
                }
            },
            TokenKind::String => Some(Expression::String(StringLiteral {
                value: token.text.clone(),
                token,
            })),
            TokenKind::True | TokenKind::False => Some(Expression::Boolean(BooleanLiteral {
                value: token.kind == TokenKind::True,
                token,
            })),
            TokenKind::Bang | TokenKind::Minus => {
                let op = if token.kind == TokenKind::Bang {
                    PrefixOp::Not
                } else {
                    PrefixOp::Neg
                };
                self.next_token();
                let operand = self.parse_expression(Precedence::Prefix)?;
                Some(Expression::Prefix(PrefixExpression {
                    token,
                    op,
                    operand: Box::new(operand),
                }))
            }
            TokenKind::LParen => {
                self.next_token();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RParen)?;
                Some(inner)
            }
            TokenKind::If => self.parse_if_expression().map(Expression::If),
            TokenKind::Function => self.parse_function_literal().map(Expression::Function),
            kind => {
                let message = format!("no prefix parse function for \"{kind}\" found");
                self.error_at(token, message);
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        if self.cur_is(TokenKind::LParen) {
            return self.parse_call_expression(left).map(Expression::Call);
        }

        let token = self.cur.clone();
        let op = infix_op(token.kind)?;
        let precedence = precedence_of(token.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix(InfixExpression {
            token,
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// `( <expression> )` following `if` or `while`
    fn parse_condition(&mut self) -> Option<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Some(condition)
    }

    fn parse_if_expression(&mut self) -> Option<IfExpression> {
        let token = self.cur.clone();
        let condition = self.parse_condition()?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            if self.peek_is(TokenKind::If) {
                // `else if` nests the chained `if` in a one-statement block
                self.next_token();
                let nested_token = self.cur.clone();
                let nested = self.parse_if_expression()?;
                Some(BlockStatement {
                    token: nested_token.clone(),
                    statements: vec![Statement::Expression(ExpressionStatement {
                        token: nested_token,
                        expression: Expression::If(nested),
                    })],
                })
            } else {
                self.expect_peek(TokenKind::LBrace)?;
                Some(self.parse_block_statement()?)
            }
        } else {
            None
        };

        Some(IfExpression {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<FunctionLiteral> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;
        Some(FunctionLiteral {
            token,
            parameters,
            body,
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(parameters);
        }

        loop {
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(Identifier {
                token: self.cur.clone(),
                name: self.cur.text.clone(),
            });
            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.next_token();
        }

        self.expect_peek(TokenKind::RParen)?;
        Some(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<CallExpression> {
        let token = self.cur.clone();
        let arguments = self.parse_call_arguments()?;
        Some(CallExpression {
            token,
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_call_arguments(&mut self) -> Option<Vec<Expression>> {
        let mut arguments = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(arguments);
        }

        self.next_token();
        arguments.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(TokenKind::RParen)?;
        Some(arguments)
    }
}

/// Scan and parse `source`, returning the program together with every
/// diagnostic (scanner diagnostics first).
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::new(Scanner::new(source));
    let program = parser.parse_program();
    (program, parser.into_diagnostics())
}
