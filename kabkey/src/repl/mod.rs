//! REPL (Read-Eval-Print Loop) for Kabkey

use crate::driver::{render, run_source};
use crate::interp::{ErrorFormat, Interpreter};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::ops::ControlFlow;
use std::path::PathBuf;
use tracing::debug;

const PROMPT: &str = ">> ";
const HISTORY_FILE: &str = ".kabkey_history";

/// One interpreter whose bindings accumulate across lines
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    /// Session writing native output to stdout
    pub fn new(format: ErrorFormat) -> Self {
        Self::with_interpreter(Interpreter::new().with_error_format(format))
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    /// Scan, parse and evaluate one line, returning the text to echo
    pub fn eval_line(&mut self, line: &str) -> String {
        let result = run_source(&mut self.interpreter, line);
        render(&result, self.interpreter.error_format())
    }
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(format: ErrorFormat) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session: Session::new(format),
            history_path,
        };

        if let Some(path) = &repl.history_path {
            if let Err(err) = repl.editor.load_history(path) {
                debug!(error = %err, path = %path.display(), "no history loaded");
            }
        }

        Ok(repl)
    }

    /// Read and evaluate lines until `:quit` or end of input
    pub fn run(&mut self) -> RlResult<()> {
        println!("Kabkey REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        let outcome = loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break Ok(());
                }
                Err(err) => break Err(err),
            };
            if self.handle_line(&line).is_break() {
                break Ok(());
            }
        };

        self.save_history();
        outcome
    }

    fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        let line = line.trim();
        if line.is_empty() {
            return ControlFlow::Continue(());
        }
        if let Err(err) = self.editor.add_history_entry(line) {
            debug!(error = %err, "history entry not recorded");
        }

        match line.strip_prefix(':') {
            Some(command) => handle_command(command),
            None => {
                print!("{}", self.session.eval_line(line));
                ControlFlow::Continue(())
            }
        }
    }

    fn save_history(&mut self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Err(err) = self.editor.save_history(path) {
            debug!(error = %err, path = %path.display(), "history not saved");
        }
    }
}

/// REPL commands, given without their leading `:`
fn handle_command(command: &str) -> ControlFlow<()> {
    match command {
        "quit" | "q" | "exit" => {
            println!("Goodbye!");
            return ControlFlow::Break(());
        }
        "help" | "h" | "?" => print_help(),
        "clear" => print!("\x1B[2J\x1B[1;1H"),
        _ => {
            println!("Unknown command: :{command}");
            println!("Type :help for help.");
        }
    }
    ControlFlow::Continue(())
}

fn print_help() {
    println!("Kabkey REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :clear          Clear the screen");
    println!();
    println!("Each line is evaluated in one environment that lasts the session:");
    println!("  let add = fn(a, b) {{ a + b }};");
    println!("  add(1, 2)");
    println!();
    println!("Built-in functions:");
    println!("  print(x, ...)     Print values");
    println!("  println(x, ...)   Print values and a newline");
    println!("  printf(fmt, ...)  Formatted print (%d %s %t %v)");
    println!("  len(s)            Length of a string");
    println!("  inspect(x)        Display form of a value");
    println!("  type(x)           Type name of a value");
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
