pub mod lexer;
pub mod token;

use std::io::Read;

use crate::error::CompileError;
use crate::source::{StreamSource, StringSource};
pub use lexer::Scanner;
use token::Token;

/// Scan source code into a list of tokens.
pub fn scan(source: &str) -> Result<Vec<Token>, CompileError> {
    Scanner::new(StringSource::new(source)).scan_tokens()
}

/// Scan a byte stream through a windowed buffer of `capacity` characters.
pub fn scan_reader<R: Read>(reader: R, capacity: usize) -> Result<Vec<Token>, CompileError> {
    let source = StreamSource::with_capacity(reader, capacity).map_err(lexer::source_error(1, 0))?;
    Scanner::new(source).scan_tokens()
}
