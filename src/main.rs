use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;

use giosue::ast::printer;
use giosue::interpreter::Interpreter;
use giosue::parser::Parser as GiosueParser;
use giosue::scanner::Scanner;
use giosue::scanner::token::Token;
use giosue::source::{StreamSource, StringSource};
use giosue::{CompileError, ReturnCode};

#[derive(Parser, Debug)]
#[command(name = "giosue", about = "Interpreter for the Giosue scripting language")]
struct Cli {
    /// Giosue source file to run (omit for the interactive prompt)
    file: Option<PathBuf>,

    /// Print the tokens, grouped by source line, and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree and exit
    #[arg(long)]
    dump_ast: bool,

    /// Syntax tree output format
    #[arg(long, default_value = "sexp", value_parser = ["sexp", "json"])]
    ast_format: String,

    /// Stream the file through a buffer of this many characters instead of
    /// loading it whole; no single token may be longer than the buffer
    #[arg(long, value_name = "CHARS")]
    buffer_size: Option<usize>,
}

/// Failure whose diagnostics were already printed.
#[derive(Debug, thiserror::Error)]
#[error("{count} error(s)")]
struct Reported {
    code: ReturnCode,
    count: usize,
}

/// Result of scanning a file; `tokens` holds everything scanned before `error`.
struct Scanned {
    source: Option<String>,
    tokens: Vec<Token>,
    error: Option<CompileError>,
}

fn scan_file(path: &Path, buffer_size: Option<usize>) -> Result<Scanned> {
    match buffer_size {
        Some(capacity) => {
            let file = File::open(path)
                .with_context(|| format!("open source file '{}'", path.display()))?;
            let stream = StreamSource::with_capacity(file, capacity)
                .with_context(|| format!("read source file '{}'", path.display()))?;
            let mut scanner = Scanner::new(stream);
            let (tokens, error) = match scanner.scan_tokens() {
                Ok(tokens) => (tokens, None),
                Err(e) => (scanner.tokens().to_vec(), Some(e)),
            };
            Ok(Scanned {
                source: None,
                tokens,
                error,
            })
        }
        None => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("read source file '{}'", path.display()))?;
            let (tokens, error) = {
                let mut scanner = Scanner::new(StringSource::new(&source));
                match scanner.scan_tokens() {
                    Ok(tokens) => (tokens, None),
                    Err(e) => (scanner.tokens().to_vec(), Some(e)),
                }
            };
            Ok(Scanned {
                source: Some(source),
                tokens,
                error,
            })
        }
    }
}

/// Print tokens one per row, with a blank row between source lines.
fn print_tokens(tokens: &[Token]) {
    let mut line = None;
    for token in tokens {
        if line.is_some_and(|l| l != token.line) {
            println!();
        }
        line = Some(token.line);
        println!("{token}");
    }
}

fn report_compile_errors(
    errors: Vec<CompileError>,
    name: &str,
    source: Option<&str>,
) -> anyhow::Error {
    let code = errors
        .first()
        .map_or(ReturnCode::Unknown, CompileError::return_code);
    let count = errors.len();
    for error in errors {
        match source {
            Some(source) => eprintln!(
                "{:?}",
                miette::Report::new(error.with_source_code(name, source))
            ),
            None => eprintln!("{error}"),
        }
    }
    Reported { code, count }.into()
}

fn run(cli: &Cli) -> Result<()> {
    let Some(path) = cli.file.as_deref() else {
        if cli.dump_tokens || cli.dump_ast {
            bail!("a source file is required for --dump-tokens and --dump-ast");
        }
        return giosue::repl::run_repl();
    };
    let name = path.display().to_string();

    let Scanned {
        source,
        tokens,
        error,
    } = scan_file(path, cli.buffer_size)?;
    debug!(file = %name, tokens = tokens.len(), "scanned");

    if cli.dump_tokens {
        print_tokens(&tokens);
    }
    if let Some(error) = error {
        return Err(report_compile_errors(vec![error], &name, source.as_deref()));
    }
    if cli.dump_tokens {
        return Ok(());
    }

    let statements = GiosueParser::new(tokens)
        .parse()
        .map_err(|errors| report_compile_errors(errors, &name, source.as_deref()))?;

    if cli.dump_ast {
        match cli.ast_format.as_str() {
            "json" => println!("{}", printer::to_json(&statements)?),
            _ => print!("{}", printer::to_sexp(&statements)),
        }
        return Ok(());
    }

    let mut interpreter = Interpreter::new();
    interpreter.interpret(&statements).map_err(|e| {
        eprintln!("{e}");
        anyhow::Error::from(Reported {
            code: ReturnCode::InterpreterError,
            count: 1,
        })
    })
}

fn exit_code_for(error: &anyhow::Error) -> ReturnCode {
    if let Some(reported) = error.downcast_ref::<Reported>() {
        return reported.code;
    }
    let not_found = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::NotFound);
    if not_found {
        ReturnCode::FileNotFound
    } else {
        ReturnCode::Unknown
    }
}

fn main() -> ExitCode {
    giosue::init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ReturnCode::AllOk.into(),
        Err(e) => {
            if !e.is::<Reported>() {
                eprintln!("error: {e:#}");
            }
            exit_code_for(&e).into()
        }
    }
}
