use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::interpreter::value::Value;
use crate::scanner::token::Span;

// ============= Error taxonomy =============

/// Broad family an error belongs to; decides the process return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Scoping,
    Runtime,
}

impl ErrorCategory {
    pub fn return_code(self) -> ReturnCode {
        match self {
            Self::Lexical => ReturnCode::ScannerError,
            Self::Syntax => ReturnCode::ParserError,
            Self::Scoping | Self::Runtime => ReturnCode::InterpreterError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    // Lexical
    UnexpectedCharacter,
    UnterminatedString,
    TokenTooLong,
    MalformedNumericLiteral,
    SourceUnreadable,
    // Syntax
    ExpectedToken,
    ExpectedExpression,
    InvalidAssignmentTarget,
    ReturnOutsideFunction,
    // Scoping
    UndefinedVariable,
    ReservedKeyword,
    // Runtime
    MismatchedType,
    NotCallable,
    MissingWhileCondition,
    ArityMismatch,
    InvalidPropertyAccess,
    OutputFailed,
}

impl ErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::UnexpectedCharacter
            | Self::UnterminatedString
            | Self::TokenTooLong
            | Self::MalformedNumericLiteral
            | Self::SourceUnreadable => ErrorCategory::Lexical,
            Self::ExpectedToken
            | Self::ExpectedExpression
            | Self::InvalidAssignmentTarget
            | Self::ReturnOutsideFunction => ErrorCategory::Syntax,
            Self::UndefinedVariable | Self::ReservedKeyword => ErrorCategory::Scoping,
            Self::MismatchedType
            | Self::NotCallable
            | Self::MissingWhileCondition
            | Self::ArityMismatch
            | Self::InvalidPropertyAccess
            | Self::OutputFailed => ErrorCategory::Runtime,
        }
    }
}

/// Process exit status reported by the `giosue` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReturnCode {
    AllOk = 0,
    Unknown = 1,
    FileNotFound = 2,
    ScannerError = 3,
    ParserError = 4,
    InterpreterError = 5,
}

impl From<ReturnCode> for std::process::ExitCode {
    fn from(code: ReturnCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

// ============= Compile-time errors (with miette diagnostics) =============

#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("scan error: line {line}: {message}")]
    #[diagnostic(code(giosue::scan))]
    Scan {
        kind: ErrorKind,
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("parse error: line {line}: {message}")]
    #[diagnostic(code(giosue::parse))]
    Parse {
        kind: ErrorKind,
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },
}

impl CompileError {
    pub fn scan(kind: ErrorKind, message: impl Into<String>, line: usize, span: Span) -> Self {
        Self::Scan {
            kind,
            message: message.into(),
            line,
            span: span.into(),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    pub fn parse(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            kind,
            message: message.into(),
            line: span.line,
            span: span.into(),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Scan { kind, .. } | Self::Parse { kind, .. } => *kind,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Scan { line, .. } | Self::Parse { line, .. } => *line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Scan { message, .. } | Self::Parse { message, .. } => message,
        }
    }

    /// Return code for the stage that produced this error. A parser-detected
    /// empty loop condition still counts as a parser failure.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Self::Scan { .. } => ReturnCode::ScannerError,
            Self::Parse { .. } => ReturnCode::ParserError,
        }
    }

    /// Attach source code for fancy miette diagnostics
    pub fn with_source_code(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let src = miette::NamedSource::new(name.into(), source.into());
        match self {
            Self::Scan {
                kind,
                message,
                line,
                span,
                ..
            } => Self::Scan {
                kind,
                message,
                line,
                span,
                src,
            },
            Self::Parse {
                kind,
                message,
                line,
                span,
                ..
            } => Self::Parse {
                kind,
                message,
                line,
                span,
                src,
            },
        }
    }
}

// ============= Runtime errors (simple, no miette) =============

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("{}", describe(.message, .line))]
    Error {
        kind: ErrorKind,
        message: String,
        line: Option<usize>,
    },

    #[error("return")]
    Return { value: Value },
}

fn describe(message: &str, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("runtime error: line {line}: {message}"),
        None => format!("runtime error: {message}"),
    }
}

impl RuntimeError {
    /// Create a runtime error without a source location
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(kind: ErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self::Error {
            kind,
            message: message.into(),
            line: Some(line),
        }
    }

    /// Fill in the line if the error does not carry one yet.
    pub fn at_line(self, at: usize) -> Self {
        match self {
            Self::Error {
                kind,
                message,
                line: None,
            } => Self::Error {
                kind,
                message,
                line: Some(at),
            },
            other => other,
        }
    }

    /// Kind of a real error; `None` for the return unwinding signal.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { kind, .. } => Some(*kind),
            Self::Return { .. } => None,
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.kind().map(ErrorKind::category)
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Error { line, .. } => *line,
            Self::Return { .. } => None,
        }
    }
}

// ============= Tests =============

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_implements_diagnostic() {
        let err = CompileError::scan(ErrorKind::UnexpectedCharacter, "test", 1, Span::new(0, 1, 1));
        let diag: &dyn Diagnostic = &err;
        assert!(diag.code().is_some());
    }

    #[test]
    fn compile_error_with_source() {
        let err = CompileError::parse(ErrorKind::ExpectedToken, "expected ';'", Span::new(5, 1, 1))
            .with_source_code("test.gsu", "variabile x = 1\n");
        assert!(matches!(err, CompileError::Parse { .. }));
        assert_eq!(err.kind(), ErrorKind::ExpectedToken);
    }

    #[test]
    fn compile_error_reports_line_and_category() {
        let err = CompileError::scan(
            ErrorKind::UnterminatedString,
            "unterminated string",
            3,
            Span::new(20, 4, 3),
        );
        assert_eq!(err.line(), 3);
        assert_eq!(err.category(), ErrorCategory::Lexical);
        assert_eq!(err.to_string(), "scan error: line 3: unterminated string");
    }

    #[test]
    fn runtime_error_simple() {
        let err = RuntimeError::new(ErrorKind::UndefinedVariable, "undefined variable 'x'");
        assert!(matches!(err, RuntimeError::Error { .. }));
        assert_eq!(err.to_string(), "runtime error: undefined variable 'x'");
    }

    #[test]
    fn runtime_error_at_line_keeps_existing_line() {
        let err = RuntimeError::with_line(ErrorKind::NotCallable, "not callable", 2).at_line(7);
        assert_eq!(err.line(), Some(2));
        let err = RuntimeError::new(ErrorKind::NotCallable, "not callable").at_line(7);
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.to_string(), "runtime error: line 7: not callable");
    }

    #[test]
    fn runtime_error_return() {
        let err = RuntimeError::Return {
            value: Value::Int(42),
        };
        assert_eq!(err.kind(), None);
        assert_eq!(err.line(), None);
        assert!(matches!(err, RuntimeError::Return { value: Value::Int(42) }));
    }

    #[test]
    fn categories_map_to_return_codes() {
        assert_eq!(ErrorKind::TokenTooLong.category().return_code(), ReturnCode::ScannerError);
        assert_eq!(ErrorKind::ExpectedExpression.category().return_code(), ReturnCode::ParserError);
        assert_eq!(ErrorKind::ReservedKeyword.category(), ErrorCategory::Scoping);
        assert_eq!(ErrorKind::MismatchedType.category().return_code(), ReturnCode::InterpreterError);
    }
}
