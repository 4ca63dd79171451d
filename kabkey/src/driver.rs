//! Source-to-result pipeline shared by the batch runner and the REPL

use crate::ast::Program;
use crate::error::{Diagnostic, format_diagnostics};
use crate::interp::{ErrorFormat, Interpreter, Value};
use crate::parser::parse;
use tracing::debug;

/// Outcome of running one source text: the program's result, or the
/// diagnostics that kept it from being evaluated
pub type RunResult = Result<Option<Value>, Vec<Diagnostic>>;

/// Scan and parse; any diagnostic rejects the whole source
pub fn parse_source(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let (program, diagnostics) = parse(source);
    if diagnostics.is_empty() {
        Ok(program)
    } else {
        debug!(count = diagnostics.len(), "source rejected");
        Err(diagnostics)
    }
}

/// Parse `source` and evaluate it in the interpreter's global environment
pub fn run_source(interp: &mut Interpreter, source: &str) -> RunResult {
    let program = parse_source(source)?;
    Ok(interp.eval_program(&program))
}

/// Text a front end prints for `result`: one tab-indented line per
/// diagnostic, or the value's display form and a newline
pub fn render(result: &RunResult, format: ErrorFormat) -> String {
    match result {
        Err(diagnostics) => format_diagnostics(diagnostics),
        Ok(Some(value)) => format!("{}\n", value.inspect(format)),
        Ok(None) => String::new(),
    }
}
