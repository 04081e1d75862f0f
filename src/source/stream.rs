use std::io::{ErrorKind, Read};

use tracing::trace;

use super::{Source, SourceError, SourceResult};

/// Source that keeps only a fixed-size window of a byte stream resident.
///
/// The buffer holds at most `capacity` decoded characters. When the cursor
/// needs a character past the resident content, the token being scanned is
/// moved to the front of the buffer and the free space is refilled from the
/// reader. A token can therefore never be longer than the buffer.
///
/// Input is decoded as UTF-8; a sequence split across two reads is carried
/// over, and invalid bytes decode to U+FFFD.
pub struct StreamSource<R> {
    reader: R,
    buffer: Vec<char>,
    capacity: usize,
    token_start: usize,
    current: usize,
    /// Byte offset in the whole input of `buffer[token_start]`.
    token_offset: usize,
    /// Undecoded bytes: a partial character, or input that did not fit yet.
    pending: Vec<u8>,
    exhausted: bool,
    token: Option<String>,
}

enum Decoded {
    Char(char, usize),
    Invalid(usize),
    Incomplete,
}

impl<R: Read> StreamSource<R> {
    pub fn with_capacity(reader: R, capacity: usize) -> SourceResult<Self> {
        let capacity = capacity.max(1);
        let mut source = Self {
            reader,
            buffer: Vec::with_capacity(capacity),
            capacity,
            token_start: 0,
            current: 0,
            token_offset: 0,
            pending: Vec::new(),
            exhausted: false,
            token: None,
        };
        source.fill()?;
        Ok(source)
    }

    /// Make the character `lookahead` places past the cursor resident if the
    /// input has it. Returns false at end of input.
    fn ensure(&mut self, lookahead: usize) -> SourceResult<bool> {
        while self.current + lookahead >= self.buffer.len() {
            if self.exhausted && self.pending.is_empty() {
                return Ok(false);
            }
            if self.current + lookahead - self.token_start >= self.capacity {
                return Err(SourceError::TokenTooLong {
                    capacity: self.capacity,
                    prefix: self.buffer[self.token_start..].iter().take(32).collect(),
                });
            }
            self.compact();
            self.fill()?;
        }
        Ok(true)
    }

    /// Move the in-progress token to the front of the buffer.
    fn compact(&mut self) {
        trace!(
            token_len = self.current - self.token_start,
            dropped = self.token_start,
            "compacting source buffer"
        );
        self.buffer.drain(..self.token_start);
        self.current -= self.token_start;
        self.token_start = 0;
        self.token = None;
    }

    fn fill(&mut self) -> SourceResult<()> {
        self.decode_pending();
        while !self.exhausted && self.buffer.len() < self.capacity {
            let mut chunk = vec![0u8; self.capacity - self.buffer.len()];
            let read = match self.reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if read == 0 {
                self.exhausted = true;
            } else {
                self.pending.extend_from_slice(&chunk[..read]);
            }
            self.decode_pending();
        }
        Ok(())
    }

    fn decode_pending(&mut self) {
        let mut consumed = 0;
        while self.buffer.len() < self.capacity && consumed < self.pending.len() {
            match decode_one(&self.pending[consumed..]) {
                Decoded::Char(c, width) => {
                    self.buffer.push(c);
                    consumed += width;
                }
                Decoded::Invalid(width) => {
                    self.buffer.push(char::REPLACEMENT_CHARACTER);
                    consumed += width;
                }
                Decoded::Incomplete if self.exhausted => {
                    self.buffer.push(char::REPLACEMENT_CHARACTER);
                    consumed = self.pending.len();
                }
                Decoded::Incomplete => break,
            }
        }
        self.pending.drain(..consumed);
    }
}

fn decode_one(bytes: &[u8]) -> Decoded {
    let window = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(window) {
        Ok(text) => text,
        Err(e) if e.valid_up_to() > 0 => match std::str::from_utf8(&window[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return Decoded::Invalid(1),
        },
        Err(e) => {
            return match e.error_len() {
                Some(width) => Decoded::Invalid(width),
                None => Decoded::Incomplete,
            };
        }
    };
    match valid.chars().next() {
        Some(c) => Decoded::Char(c, c.len_utf8()),
        None => Decoded::Invalid(1),
    }
}

impl<R: Read> Source for StreamSource<R> {
    fn advance(&mut self) -> SourceResult<Option<char>> {
        self.token = None;
        if !self.ensure(0)? {
            return Ok(None);
        }
        let c = self.buffer[self.current];
        self.current += 1;
        Ok(Some(c))
    }

    fn peek(&mut self) -> SourceResult<Option<char>> {
        if !self.ensure(0)? {
            return Ok(None);
        }
        Ok(Some(self.buffer[self.current]))
    }

    fn peek_next(&mut self) -> SourceResult<Option<char>> {
        if !self.ensure(1)? {
            return Ok(None);
        }
        Ok(Some(self.buffer[self.current + 1]))
    }

    fn current_token(&mut self) -> &str {
        let chars = &self.buffer[self.token_start..self.current];
        self.token.get_or_insert_with(|| chars.iter().collect())
    }

    fn start_token(&mut self) {
        self.token_offset += self.buffer[self.token_start..self.current]
            .iter()
            .map(|c| c.len_utf8())
            .sum::<usize>();
        self.token_start = self.current;
        self.token = None;
    }

    fn token_offset(&self) -> usize {
        self.token_offset
    }
}
