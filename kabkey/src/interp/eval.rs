//! Tree-walking evaluator

use super::env::{EnvRef, Environment, child_env};
use super::error::{EvalResult, RuntimeError, Signal};
use super::native::{self, CallContext};
use super::value::{ErrorFormat, Function, Value};
use crate::ast::{
    BlockStatement, CallExpression, Expression, IfExpression, InfixExpression, InfixOp, Position,
    PrefixExpression, PrefixOp, Program, Statement, WhileStatement,
};
use crate::stack;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::{debug, trace};

/// Maximum nesting of user function calls
const MAX_CALL_DEPTH: usize = 10_000;

/// The interpreter
pub struct Interpreter {
    /// Top-level environment, pre-populated with natives
    global_env: EnvRef,
    /// Sink for native output
    output: Box<dyn Write>,
    error_format: ErrorFormat,
    /// Current user call nesting
    depth: usize,
}

impl Interpreter {
    /// Create an interpreter writing to stdout
    pub fn new() -> Self {
        let mut env = Environment::new();
        native::register(&mut env);
        Interpreter {
            global_env: env.into_ref(),
            output: Box::new(io::stdout()),
            error_format: ErrorFormat::default(),
            depth: 0,
        }
    }

    /// Redirect native output
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Display mode for Error values, used by front ends when rendering results
    pub fn with_error_format(mut self, format: ErrorFormat) -> Self {
        self.error_format = format;
        self
    }

    pub fn error_format(&self) -> ErrorFormat {
        self.error_format
    }

    /// The environment programs run in; persists across `eval_program` calls
    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Evaluate a program in the global environment.
    ///
    /// Returns the value of the last statement, `None` when it produced no
    /// value, the unwrapped operand of a top-level `return`, or the Error value
    /// that stopped evaluation.
    pub fn eval_program(&mut self, program: &Program) -> Option<Value> {
        let env = Rc::clone(&self.global_env);
        self.eval_program_in(program, &env)
    }

    /// Evaluate a program in `env`
    pub fn eval_program_in(&mut self, program: &Program, env: &EnvRef) -> Option<Value> {
        debug!(statements = program.statements.len(), "evaluating program");
        self.depth = 0;
        let mut result = None;
        for statement in &program.statements {
            match self.eval_statement(statement, env) {
                Ok(value) => result = value,
                Err(Signal::Return(value)) => return Some(value),
                Err(Signal::Error(err)) => {
                    debug!(error = %err, "evaluation stopped");
                    return Some(Value::Error(err));
                }
            }
        }
        result
    }

    fn eval_block(&mut self, block: &BlockStatement, env: &EnvRef) -> EvalResult<Option<Value>> {
        let mut result = None;
        for statement in &block.statements {
            result = self.eval_statement(statement, env)?;
        }
        Ok(result)
    }

    fn eval_statement(&mut self, statement: &Statement, env: &EnvRef) -> EvalResult<Option<Value>> {
        match statement {
            Statement::Let(stmt) => {
                let value = self.eval_expression(&stmt.value, env)?;
                env.borrow_mut().define(stmt.name.name.clone(), value);
                Ok(None)
            }
            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.eval_expression(expr, env)?,
                    None => Value::Null,
                };
                Err(Signal::Return(value))
            }
            Statement::Expression(stmt) => self.eval_expression_result(&stmt.expression, env),
            Statement::While(stmt) => self.eval_while(stmt, env),
        }
    }

    /// The body shares the enclosing environment
    fn eval_while(&mut self, stmt: &WhileStatement, env: &EnvRef) -> EvalResult<Option<Value>> {
        while self.eval_expression(&stmt.condition, env)?.is_truthy() {
            self.eval_block(&stmt.body, env)?;
        }
        Ok(None)
    }

    /// Evaluate an expression in value position, where no result reads as Null
    fn eval_expression(&mut self, expr: &Expression, env: &EnvRef) -> EvalResult<Value> {
        Ok(self.eval_expression_result(expr, env)?.unwrap_or(Value::Null))
    }

    /// Evaluate an expression with automatic stack growth
    fn eval_expression_result(
        &mut self,
        expr: &Expression,
        env: &EnvRef,
    ) -> EvalResult<Option<Value>> {
        stack::guarded(|| self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Expression, env: &EnvRef) -> EvalResult<Option<Value>> {
        let value = match expr {
            Expression::Identifier(ident) => {
                let found = env.borrow().get(&ident.name);
                found.ok_or_else(|| {
                    RuntimeError::identifier_not_found(&ident.name, ident.token.position())
                })?
            }
            Expression::Integer(lit) => Value::Integer(lit.value),
            Expression::String(lit) => Value::from(lit.value.as_str()),
            Expression::Boolean(lit) => Value::Boolean(lit.value),
            Expression::Prefix(prefix) => self.eval_prefix(prefix, env)?,
            Expression::Infix(infix) => self.eval_infix(infix, env)?,
            Expression::If(if_expr) => return self.eval_if(if_expr, env),
            Expression::Function(lit) => Value::Function(Rc::new(Function::User {
                parameters: lit.parameters.iter().map(|p| p.name.clone()).collect(),
                body: lit.body.clone(),
                env: Rc::clone(env),
            })),
            Expression::Call(call) => return self.eval_call(call, env),
        };
        Ok(Some(value))
    }

    fn eval_if(&mut self, expr: &IfExpression, env: &EnvRef) -> EvalResult<Option<Value>> {
        let condition = self.eval_expression(&expr.condition, env)?;
        if condition.is_truthy() {
            self.eval_block(&expr.consequence, env)
        } else if let Some(alternative) = &expr.alternative {
            self.eval_block(alternative, env)
        } else {
            Ok(Some(Value::Null))
        }
    }

    fn eval_prefix(&mut self, expr: &PrefixExpression, env: &EnvRef) -> EvalResult<Value> {
        let operand = self.eval_expression(&expr.operand, env)?;
        match (expr.op, &operand) {
            (PrefixOp::Not, _) => Ok(Value::Boolean(!operand.is_truthy())),
            (PrefixOp::Neg, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
            (PrefixOp::Neg, _) => Err(RuntimeError::unknown_prefix_operator(
                expr.op,
                operand.type_name(),
                expr.operand.token().position(),
            )
            .into()),
        }
    }

    fn eval_infix(&mut self, expr: &InfixExpression, env: &EnvRef) -> EvalResult<Value> {
        let left = self.eval_expression(&expr.left, env)?;

        // `&&` and `||` only look at the right operand when they must
        match expr.op {
            InfixOp::And if !left.is_truthy() => return Ok(Value::Boolean(false)),
            InfixOp::Or if left.is_truthy() => return Ok(Value::Boolean(true)),
            InfixOp::And | InfixOp::Or => {
                let right = self.eval_expression(&expr.right, env)?;
                return Ok(Value::Boolean(right.is_truthy()));
            }
            _ => {}
        }

        let right = self.eval_expression(&expr.right, env)?;
        let position = expr.token.position();
        let value = match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => integer_infix(expr.op, *l, *r, position)?,
            (Value::String(l), Value::String(r)) => match expr.op {
                InfixOp::Add => Value::from(format!("{l}{r}")),
                InfixOp::Eq => Value::Boolean(l == r),
                InfixOp::Ne => Value::Boolean(l != r),
                op => return Err(unknown_operator(&left, op, &right, position)),
            },
            _ if left.type_name() != right.type_name() => {
                return Err(RuntimeError::type_mismatch(
                    left.type_name(),
                    expr.op,
                    right.type_name(),
                    position,
                )
                .into());
            }
            _ => match expr.op {
                InfixOp::Eq => Value::Boolean(left == right),
                InfixOp::Ne => Value::Boolean(left != right),
                op => return Err(unknown_operator(&left, op, &right, position)),
            },
        };
        Ok(value)
    }

    fn eval_call(&mut self, call: &CallExpression, env: &EnvRef) -> EvalResult<Option<Value>> {
        let callee = self.eval_expression(&call.function, env)?;
        let mut args = Vec::with_capacity(call.arguments.len());
        for arg in &call.arguments {
            args.push(self.eval_expression(arg, env)?);
        }
        self.apply_function(&callee, args, call.token.position(), env)
    }

    fn apply_function(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        position: Position,
        env: &EnvRef,
    ) -> EvalResult<Option<Value>> {
        let Value::Function(function) = callee else {
            return Err(RuntimeError::not_a_function(callee.type_name(), position).into());
        };

        match function.as_ref() {
            Function::User {
                parameters,
                body,
                env: captured,
            } => {
                if parameters.len() != args.len() {
                    return Err(
                        RuntimeError::arity_mismatch(parameters.len(), args.len(), position).into(),
                    );
                }
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::stack_overflow(position).into());
                }

                let call_env = child_env(captured);
                {
                    let mut scope = call_env.borrow_mut();
                    for (param, arg) in parameters.iter().zip(args) {
                        scope.define(param.clone(), arg);
                    }
                }

                self.depth += 1;
                trace!(depth = self.depth, %position, "call");
                let result = self.eval_block(body, &call_env);
                self.depth -= 1;

                match result {
                    Err(Signal::Return(value)) => Ok(Some(value)),
                    other => other,
                }
            }
            Function::Native(native) => {
                trace!(name = native.name, args = args.len(), "native call");
                let mut ctx = CallContext {
                    env,
                    out: self.output.as_mut(),
                };
                Ok((native.func)(&mut ctx, &args)?)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn integer_infix(op: InfixOp, l: i64, r: i64, position: Position) -> Result<Value, RuntimeError> {
    let value = match op {
        InfixOp::Add => Value::Integer(l.wrapping_add(r)),
        InfixOp::Sub => Value::Integer(l.wrapping_sub(r)),
        InfixOp::Mul => Value::Integer(l.wrapping_mul(r)),
        InfixOp::Div if r == 0 => return Err(RuntimeError::division_by_zero(position)),
        InfixOp::Div => Value::Integer(l.wrapping_div(r)),
        InfixOp::Lt => Value::Boolean(l < r),
        InfixOp::Gt => Value::Boolean(l > r),
        InfixOp::Le => Value::Boolean(l <= r),
        InfixOp::Ge => Value::Boolean(l >= r),
        InfixOp::Eq => Value::Boolean(l == r),
        InfixOp::Ne => Value::Boolean(l != r),
        // short-circuited in eval_infix before either operand type is looked at
        InfixOp::And | InfixOp::Or => unreachable!("logical operator {op} reached integer_infix"),
    };
    Ok(value)
}

fn unknown_operator(left: &Value, op: InfixOp, right: &Value, position: Position) -> Signal {
    RuntimeError::unknown_infix_operator(left.type_name(), op, right.type_name(), position).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{ErrorKind, SharedBuffer};
    use crate::parser::parse;

    fn run(source: &str) -> Option<Value> {
        run_with_output(source).0
    }

    fn run_with_output(source: &str) -> (Option<Value>, String) {
        let (program, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "diagnostics for {source:?}: {diagnostics:?}");
        let buffer = SharedBuffer::new();
        let mut interp = Interpreter::new().with_output(buffer.clone());
        let result = interp.eval_program(&program);
        (result, buffer.contents())
    }

    fn run_error(source: &str) -> RuntimeError {
        match run(source) {
            Some(Value::Error(err)) => err,
            other => panic!("expected error for {source:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_arithmetic() {
        let cases = [
            ("5", 5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("5 + 2 * 10", 25),
            ("20 + 2 * -10", 0),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
            ("-7 / 2", -3),
        ];
        for (source, expected) in cases {
            assert_eq!(run(source), Some(Value::Integer(expected)), "{source}");
        }
    }

    #[test]
    fn test_boolean_expressions() {
        let cases = [
            ("true", true),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 <= 1", true),
            ("2 >= 3", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("true == true", true),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("(1 > 2) == true", false),
            ("\"a\" == \"a\"", true),
            ("\"a\" != \"b\"", true),
            ("\"a\" != \"a\"", false),
        ];
        for (source, expected) in cases {
            assert_eq!(run(source), Some(Value::Boolean(expected)), "{source}");
        }
    }

    #[test]
    fn test_bang_uses_truthiness() {
        let cases = [
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!0", true),
            ("!!5", true),
            ("!\"\"", false),
        ];
        for (source, expected) in cases {
            assert_eq!(run(source), Some(Value::Boolean(expected)), "{source}");
        }
    }

    #[test]
    fn test_if_expressions() {
        assert_eq!(run("if (true) { 10 }"), Some(Value::Integer(10)));
        assert_eq!(run("if (false) { 10 }"), Some(Value::Null));
        assert_eq!(run("if (1) { 10 }"), Some(Value::Integer(10)));
        assert_eq!(run("if (0) { 10 } else { 20 }"), Some(Value::Integer(20)));
        assert_eq!(run("if (1 > 2) { 10 } else { 20 }"), Some(Value::Integer(20)));
        assert_eq!(
            run("let x = 3; if (x == 1) { 1 } else if (x == 3) { 3 } else { 0 }"),
            Some(Value::Integer(3))
        );
        assert_eq!(run("if (true) {}"), None);
    }

    #[test]
    fn test_return_statements() {
        assert_eq!(run("return 10;"), Some(Value::Integer(10)));
        assert_eq!(run("return 10; 9;"), Some(Value::Integer(10)));
        assert_eq!(run("9; return 2 * 5; 9;"), Some(Value::Integer(10)));
        assert_eq!(run("return;"), Some(Value::Null));
        assert_eq!(
            run("if (10 > 1) { if (10 > 1) { return 10; } return 1; }"),
            Some(Value::Integer(10))
        );
    }

    #[test]
    fn test_return_only_leaves_the_current_call() {
        let source = "let f = fn(x) { return x; 99 }; let g = fn() { f(1); 2 }; g()";
        assert_eq!(run(source), Some(Value::Integer(2)));
        assert_eq!(run("let f = fn() { return; }; f()"), Some(Value::Null));
    }

    #[test]
    fn test_let_statements() {
        assert_eq!(run("let a = 5; a;"), Some(Value::Integer(5)));
        assert_eq!(run("let a = 5 * 5; a;"), Some(Value::Integer(25)));
        assert_eq!(
            run("let a = 5; let b = a; let c = a + b + 5; c;"),
            Some(Value::Integer(15))
        );
        assert_eq!(run("let x = 1;"), None);
        assert_eq!(run("5; let x = 1;"), None);
    }

    #[test]
    fn test_error_messages() {
        let cases = [
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN", (1, 3)),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN", (1, 3)),
            ("1 == true", "type mismatch: INTEGER == BOOLEAN", (1, 3)),
            ("-true", "unknown operator: -BOOLEAN", (1, 2)),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN", (1, 6)),
            ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN", (1, 20)),
            ("foobar", "identifier not found: foobar", (1, 1)),
            ("\"Hello\" - \"World\"", "unknown operator: STRING - STRING", (1, 9)),
            ("5 / 0", "division by zero", (1, 3)),
            ("let x = 1; x(2)", "not a function: INTEGER", (1, 13)),
            ("fn(a, b) { a }(1)", "wrong number of arguments: expected 2, got 1", (1, 15)),
        ];
        for (source, message, (line, column)) in cases {
            let err = run_error(source);
            assert_eq!(err.message, message, "{source}");
            assert_eq!(err.position, Some(Position::new(line, column)), "{source}");
        }
    }

    #[test]
    fn test_error_position_on_later_line() {
        let err = run_error("let a = 1;\nlet b = a + missing;");
        assert_eq!(err.kind, ErrorKind::IdentifierNotFound);
        assert_eq!(err.to_string(), "[2:13] ERROR: identifier not found: missing");
    }

    #[test]
    fn test_error_stops_evaluation() {
        let (result, out) = run_with_output("let a = foo; println(\"after\");");
        assert!(matches!(result, Some(Value::Error(_))));
        assert_eq!(out, "");

        let (result, out) = run_with_output("println(\"before\"); len(1, missing); println(\"after\")");
        assert_eq!(out, "before\n");
        assert_eq!(run_error_value(result).message, "identifier not found: missing");
    }

    fn run_error_value(result: Option<Value>) -> RuntimeError {
        match result {
            Some(Value::Error(err)) => err,
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_native_errors_have_no_position() {
        let err = run_error("len(1)");
        assert_eq!(err.kind, ErrorKind::Native);
        assert_eq!(err.to_string(), "ERROR: type INTEGER not supported for 'len'");
        assert_eq!(run_error("len(\"a\") + len()").message, "missing parameter in call to 'len'");
    }

    #[test]
    fn test_functions() {
        assert_eq!(run("let identity = fn(x) { x; }; identity(5);"), Some(Value::Integer(5)));
        assert_eq!(run("let double = fn(x) { x * 2; }; double(5);"), Some(Value::Integer(10)));
        assert_eq!(run("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));"), Some(Value::Integer(20)));
        assert_eq!(run("fn(x) { x; }(5)"), Some(Value::Integer(5)));
        assert_eq!(run("let f = fn() { let x = 1; }; f()"), None);
    }

    #[test]
    fn test_closures() {
        let source = "let newAdder = fn(x) { fn(y) { x + y } }; let addTwo = newAdder(2); addTwo(2);";
        assert_eq!(run(source), Some(Value::Integer(4)));
    }

    #[test]
    fn test_closure_sees_later_rebinding() {
        let source = "let x = 1; let f = fn() { x }; let x = 2; f()";
        assert_eq!(run(source), Some(Value::Integer(2)));
    }

    #[test]
    fn test_let_in_function_shadows() {
        let source = "let x = 1; let f = fn() { let x = 2; x }; f() + x";
        assert_eq!(run(source), Some(Value::Integer(3)));
    }

    #[test]
    fn test_recursion() {
        let source = "let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } }; fib(15)";
        assert_eq!(run(source), Some(Value::Integer(610)));
    }

    #[test]
    fn test_deep_recursion() {
        let source = "let count = fn(n) { if (n == 0) { 0 } else { 1 + count(n - 1) } }; count(5000)";
        assert_eq!(run(source), Some(Value::Integer(5000)));
    }

    #[test]
    fn test_unbounded_recursion_is_an_error() {
        let err = run_error("let f = fn() { f() }; f()");
        assert_eq!(err.kind, ErrorKind::StackOverflow);
        assert_eq!(err.message, "stack overflow: too deep recursion");
    }

    #[test]
    fn test_while_loop() {
        let source = "let i = 0; let sum = 0; while (i < 5) { let sum = sum + i; let i = i + 1; } sum";
        assert_eq!(run(source), Some(Value::Integer(10)));
        assert_eq!(run("while (false) { 1 }"), None);
    }

    #[test]
    fn test_return_from_while_inside_function() {
        let source = "let f = fn() { let i = 0; while (true) { if (i == 3) { return i; } let i = i + 1; } }; f()";
        assert_eq!(run(source), Some(Value::Integer(3)));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(run("true && false"), Some(Value::Boolean(false)));
        assert_eq!(run("true && 1"), Some(Value::Boolean(true)));
        assert_eq!(run("0 || 5"), Some(Value::Boolean(true)));
        assert_eq!(run("0 || false"), Some(Value::Boolean(false)));
        // integers on both sides never reach the arithmetic table
        assert_eq!(run("3 && 4"), Some(Value::Boolean(true)));
        assert_eq!(run("3 && 0"), Some(Value::Boolean(false)));
        assert_eq!(run("0 || 0"), Some(Value::Boolean(false)));
        assert_eq!(run("1 < 2 && 2 < 3"), Some(Value::Boolean(true)));
        // the right operand is never evaluated
        assert_eq!(run("false && undefined"), Some(Value::Boolean(false)));
        assert_eq!(run("true || undefined"), Some(Value::Boolean(true)));
        assert_eq!(run_error("true && undefined").message, "identifier not found: undefined");
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(run("9223372036854775807 + 1"), Some(Value::Integer(i64::MIN)));
        assert_eq!(run("-9223372036854775807 - 2"), Some(Value::Integer(i64::MAX)));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run("\"Hello\" + \" \" + \"World!\""), Some(Value::from("Hello World!")));
    }

    #[test]
    fn test_function_identity_comparison() {
        assert_eq!(run("let f = fn() {}; f == f"), Some(Value::Boolean(true)));
        assert_eq!(run("let f = fn() {}; let g = fn() {}; f != g"), Some(Value::Boolean(true)));
        assert_eq!(run("len == len"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_native_output() {
        let (result, out) = run_with_output("print(\"a\", 1); println(true); printf(\"%d-%s\\n\", 7, \"x\")");
        assert_eq!(result, None);
        assert_eq!(out, "a1true\n7-x\n");
    }

    #[test]
    fn test_native_values() {
        assert_eq!(run("len(\"four\")"), Some(Value::Integer(4)));
        assert_eq!(run("type(fn() {})"), Some(Value::from("FUNCTION")));
        assert_eq!(run("inspect(fn(a) { a + 1 })"), Some(Value::from("fn(a) { (a + 1) }")));
        assert_eq!(run("type(if (false) { 1 })"), Some(Value::from("NULL")));
    }

    #[test]
    fn test_absent_result_reads_as_null() {
        assert_eq!(run("let x = print(); x"), Some(Value::Null));
        assert_eq!(run("type(print())"), Some(Value::from("NULL")));
    }

    #[test]
    fn test_program_reevaluation_is_idempotent() {
        let (program, _) = parse("let x = 2; let f = fn(y) { x * y }; f(21)");
        let first = Interpreter::new().eval_program(&program);
        let second = Interpreter::new().eval_program(&program);
        assert_eq!(first, Some(Value::Integer(42)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_global_env_persists_between_programs() {
        let mut interp = Interpreter::new();
        let (define, _) = parse("let add = fn(a, b) { a + b };");
        let (call, _) = parse("add(2, 3)");
        assert_eq!(interp.eval_program(&define), None);
        assert_eq!(interp.eval_program(&call), Some(Value::Integer(5)));
        assert!(interp.global_env().borrow().get("add").is_some());
    }
}
