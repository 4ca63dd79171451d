//! Kabkey CLI

use clap::{Parser, Subcommand};
use kabkey::driver::{render, run_source};
use kabkey::error::{format_diagnostics, report_diagnostic};
use kabkey::interp::{ErrorFormat, Interpreter};
use kabkey::repl::Repl;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kabkey", version, about = "Kabkey - a small interpreted language")]
struct Cli {
    /// Source file to run; starts the REPL when omitted
    file: Option<PathBuf>,

    /// How runtime errors are displayed [default: extended for files, plain for the REPL]
    #[arg(long, value_enum, global = true)]
    error_format: Option<ErrorFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a source file
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl,
    /// Scan and parse a source file, reporting diagnostics
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Parse and dump the syntax tree as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

type CliResult = Result<bool, Box<dyn std::error::Error>>;

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let format = cli.error_format;

    let result = match (cli.command, cli.file) {
        (Some(Command::Run { file }), _) | (None, Some(file)) => {
            run_file(&file, format.unwrap_or(ErrorFormat::Extended))
        }
        (Some(Command::Repl), _) | (None, None) => run_repl(format.unwrap_or(ErrorFormat::Plain)),
        (Some(Command::Check { file }), _) => check_file(&file),
        (Some(Command::Parse { file }), _) => parse_file(&file),
        (Some(Command::Tokens { file }), _) => tokenize_file(&file),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Install a stderr subscriber, but only when RUST_LOG asks for one
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(path: &Path, format: ErrorFormat) -> CliResult {
    let source = std::fs::read_to_string(path)?;
    let mut interp = Interpreter::new().with_error_format(format);

    let result = run_source(&mut interp, &source);
    print!("{}", render(&result, format));
    Ok(result.is_ok())
}

fn run_repl(format: ErrorFormat) -> CliResult {
    Repl::new(format)?.run()?;
    Ok(true)
}

fn check_file(path: &Path) -> CliResult {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let (_, diagnostics) = kabkey::parser::parse(&source);
    for diagnostic in &diagnostics {
        report_diagnostic(&filename, &source, diagnostic)?;
    }
    if !diagnostics.is_empty() {
        eprintln!("{} error(s) in {filename}", diagnostics.len());
        return Ok(false);
    }

    println!("✓ {filename} parses successfully");
    Ok(true)
}

fn parse_file(path: &Path) -> CliResult {
    let source = std::fs::read_to_string(path)?;

    let (program, diagnostics) = kabkey::parser::parse(&source);
    if !diagnostics.is_empty() {
        print!("{}", format_diagnostics(&diagnostics));
        return Ok(false);
    }

    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(true)
}

fn tokenize_file(path: &Path) -> CliResult {
    let source = std::fs::read_to_string(path)?;

    let (tokens, diagnostics) = kabkey::lexer::tokenize(&source);
    for token in &tokens {
        println!("{} {:?} @ {}", token.kind, token.text, token.position());
    }
    print!("{}", format_diagnostics(&diagnostics));

    Ok(diagnostics.is_empty())
}
