//! Character sources the scanner reads from.
//!
//! A source hands out one character at a time with up to two characters of
//! lookahead and remembers where the token being scanned started. The
//! current token is always the half-open range `[token_start, current)`.

pub mod stream;

use thiserror::Error;

pub use stream::StreamSource;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("token too long: exceeds the {capacity}-character buffer (starts with {prefix:?})")]
    TokenTooLong { capacity: usize, prefix: String },

    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Cursor over a character stream used by the scanner.
pub trait Source {
    /// Consume one character.
    fn advance(&mut self) -> SourceResult<Option<char>>;

    /// The character at the cursor, without consuming it.
    fn peek(&mut self) -> SourceResult<Option<char>>;

    /// The character after [`Source::peek`], without consuming anything.
    fn peek_next(&mut self) -> SourceResult<Option<char>>;

    /// The text of the token scanned so far.
    fn current_token(&mut self) -> &str;

    /// Start a new token at the cursor.
    fn start_token(&mut self);

    /// Byte offset of the current token's first character in the whole input.
    fn token_offset(&self) -> usize;

    /// Consume the next character only if it equals `expected`.
    fn advance_if_matches(&mut self, expected: char) -> SourceResult<Option<char>> {
        match self.peek()? {
            Some(c) if c == expected => self.advance(),
            _ => Ok(None),
        }
    }

    fn is_at_end(&mut self) -> SourceResult<bool> {
        Ok(self.peek()?.is_none())
    }
}

/// Source over text that is fully resident in memory.
#[derive(Debug, Clone)]
pub struct StringSource<'a> {
    text: &'a str,
    token_start: usize,
    current: usize,
}

impl<'a> StringSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            token_start: 0,
            current: 0,
        }
    }
}

impl Source for StringSource<'_> {
    fn advance(&mut self) -> SourceResult<Option<char>> {
        let next = self.text[self.current..].chars().next();
        if let Some(c) = next {
            self.current += c.len_utf8();
        }
        Ok(next)
    }

    fn peek(&mut self) -> SourceResult<Option<char>> {
        Ok(self.text[self.current..].chars().next())
    }

    fn peek_next(&mut self) -> SourceResult<Option<char>> {
        Ok(self.text[self.current..].chars().nth(1))
    }

    fn current_token(&mut self) -> &str {
        &self.text[self.token_start..self.current]
    }

    fn start_token(&mut self) {
        self.token_start = self.current;
    }

    fn token_offset(&self) -> usize {
        self.token_start
    }

    fn is_at_end(&mut self) -> SourceResult<bool> {
        Ok(self.current >= self.text.len())
    }
}
