use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner;

/// Run the interactive prompt. Definitions persist across lines.
pub fn run_repl() -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        stdout.flush().context("flush prompt")?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // Ctrl-D / EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let source = if is_bare_expression(trimmed) {
            format!("ScriveLina({trimmed});")
        } else {
            trimmed.to_string()
        };
        run_line(&mut interpreter, &source);
    }
    Ok(())
}

/// Scan, parse and run one line, reporting any failure on stderr.
fn run_line(interpreter: &mut Interpreter, source: &str) {
    let tokens = match scanner::scan(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    let statements = match Parser::new(tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            return;
        }
    };

    if let Err(e) = interpreter.interpret(&statements) {
        eprintln!("{e}");
    }
}

/// A line is echoed back as a value when it does not end like a statement
/// and does not open with a statement keyword.
fn is_bare_expression(line: &str) -> bool {
    if line.ends_with(';') || line.ends_with('}') {
        return false;
    }
    let first_word = line
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '{')
        .next()
        .unwrap_or("");
    !matches!(
        first_word,
        "variabile" | "funzione" | "se" | "oppure" | "mentre" | "ritorna"
    ) && !first_word.starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1 + 2", true)]
    #[case("x", true)]
    #[case("TipoDiDato(x)", true)]
    #[case("variabile x = 1;", false)]
    #[case("variabile x = 1", false)]
    #[case("ScriveLina(1);", false)]
    #[case("{ variabile x = 1; }", false)]
    #[case("se (vero) ScriveLina(1);", false)]
    #[case("se(vero) ScriveLina(1)", false)]
    #[case("funzione f() {}", false)]
    #[case("mentre (falso) {}", false)]
    fn bare_expression_detection(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_bare_expression(line), expected);
    }

    #[test]
    fn lines_share_one_environment() {
        let mut interpreter = Interpreter::capturing();
        run_line(&mut interpreter, "variabile x = 41;");
        run_line(&mut interpreter, "x = x + 1;");
        run_line(&mut interpreter, "ScriveLina(x);");
        assert_eq!(interpreter.output(), "42\n");
    }

    #[test]
    fn failing_line_does_not_poison_session() {
        let mut interpreter = Interpreter::capturing();
        run_line(&mut interpreter, "variabile = ;");
        run_line(&mut interpreter, "ScriveLina(indefinita);");
        run_line(&mut interpreter, "ScriveLina(1);");
        assert_eq!(interpreter.output(), "1\n");
    }
}
