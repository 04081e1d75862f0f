use tracing::trace;

use crate::error::{CompileError, ErrorKind};
use crate::scanner::token::{Literal, Span, Token, TokenKind, keyword_kind};
use crate::source::{Source, SourceError};

/// Turns the characters of a [`Source`] into [`Token`]s.
///
/// Scanning stops at the first lexical error; the tokens produced before it
/// stay available through [`Scanner::tokens`].
pub struct Scanner<S> {
    source: S,
    tokens: Vec<Token>,
    line: usize,
    /// Line the token being scanned started on.
    token_line: usize,
}

/// Adapter turning a source failure into a scan diagnostic.
pub(crate) fn source_error(line: usize, offset: usize) -> impl Fn(SourceError) -> CompileError {
    move |e| {
        let kind = match e {
            SourceError::TokenTooLong { .. } => ErrorKind::TokenTooLong,
            SourceError::Io(_) => ErrorKind::SourceUnreadable,
        };
        CompileError::scan(kind, e.to_string(), line, Span::new(offset, 1, line))
    }
}

impl<S: Source> Scanner<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            line: 1,
            token_line: 1,
        }
    }

    /// Tokens scanned so far.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Scan the whole source. The returned list always ends with an `Eof` token.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, CompileError> {
        loop {
            // Release the finished token before looking at the next character.
            self.source.start_token();
            if self.is_at_end()? {
                break;
            }
            self.token_line = self.line;
            self.scan_token()?;
        }

        let eof_span = Span::new(self.source.token_offset(), 0, self.line);
        self.tokens.push(Token::new(TokenKind::Eof, "", None, eof_span));
        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<(), CompileError> {
        let Some(c) = self.advance()? else {
            return Ok(());
        };
        match c {
            ' ' | '\t' | '\r' => {}
            '\n' => self.line += 1,
            '(' => self.add_token(TokenKind::LeftParen, None),
            ')' => self.add_token(TokenKind::RightParen, None),
            '{' => self.add_token(TokenKind::LeftBrace, None),
            '}' => self.add_token(TokenKind::RightBrace, None),
            ',' => self.add_token(TokenKind::Comma, None),
            '.' => self.add_token(TokenKind::Dot, None),
            ';' => self.add_token(TokenKind::Semicolon, None),
            '+' => self.add_token(TokenKind::Plus, None),
            '*' => self.add_token(TokenKind::Star, None),
            '/' => self.add_token(TokenKind::Slash, None),
            '@' => self.add_token(TokenKind::At, None),
            '-' => {
                if self.matches('-')? {
                    self.comment()?;
                } else {
                    self.add_token(TokenKind::Minus, None);
                }
            }
            '!' => self.one_or_two('=', TokenKind::Bang, TokenKind::BangEqual)?,
            '=' => self.one_or_two('=', TokenKind::Equal, TokenKind::EqualEqual)?,
            '<' => self.one_or_two('=', TokenKind::Less, TokenKind::LessEqual)?,
            '>' => self.one_or_two('=', TokenKind::Greater, TokenKind::GreaterEqual)?,
            '&' => self.one_or_two('&', TokenKind::Ampersand, TokenKind::AmpersandAmpersand)?,
            '|' => self.one_or_two('|', TokenKind::Pipe, TokenKind::PipePipe)?,
            '^' => self.one_or_two('^', TokenKind::Caret, TokenKind::CaretCaret)?,
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier()?,
            other => {
                return Err(self.error(
                    ErrorKind::UnexpectedCharacter,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
        Ok(())
    }

    fn one_or_two(
        &mut self,
        second: char,
        single: TokenKind,
        double: TokenKind,
    ) -> Result<(), CompileError> {
        let kind = if self.matches(second)? { double } else { single };
        self.add_token(kind, None);
        Ok(())
    }

    /// Comments produce no token, so each character is released as soon as
    /// it is consumed and a comment may be longer than the source window.
    fn comment(&mut self) -> Result<(), CompileError> {
        while let Some(c) = self.peek()? {
            if c == '\n' {
                break;
            }
            self.advance()?;
            self.source.start_token();
        }
        Ok(())
    }

    fn string(&mut self) -> Result<(), CompileError> {
        loop {
            match self.peek()? {
                Some('"') => {
                    self.advance()?;
                    break;
                }
                Some('\n') | None => {
                    return Err(self.error(ErrorKind::UnterminatedString, "unterminated string"));
                }
                Some(_) => {
                    self.advance()?;
                }
            }
        }
        let lexeme = self.source.current_token();
        let text = lexeme[1..lexeme.len() - 1].to_string();
        self.add_token(TokenKind::String, Some(Literal::Str(text)));
        Ok(())
    }

    fn number(&mut self) -> Result<(), CompileError> {
        self.digits()?;

        let is_float = self.peek()? == Some('.')
            && self.peek_next()?.is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance()?; // consume '.'
            self.digits()?;
        }

        let lexeme = self.source.current_token().to_string();
        let (kind, literal) = if is_float {
            let value = lexeme.parse::<f64>().map_err(|_| self.malformed(&lexeme))?;
            (TokenKind::Float, Literal::Float(value))
        } else {
            let value = lexeme.parse::<i64>().map_err(|_| self.malformed(&lexeme))?;
            (TokenKind::Integer, Literal::Integer(value))
        };
        self.add_token(kind, Some(literal));
        Ok(())
    }

    fn digits(&mut self) -> Result<(), CompileError> {
        while self.peek()?.is_some_and(|c| c.is_ascii_digit()) {
            self.advance()?;
        }
        Ok(())
    }

    fn identifier(&mut self) -> Result<(), CompileError> {
        while self
            .peek()?
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance()?;
        }
        let lexeme = self.source.current_token();
        match keyword_kind(lexeme) {
            Some(kind) => self.add_token(kind, None),
            None => {
                let name = lexeme.to_string();
                self.add_token(TokenKind::Identifier, Some(Literal::Str(name)));
            }
        }
        Ok(())
    }

    // --- Helper methods ---

    fn add_token(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let offset = self.source.token_offset();
        let lexeme = self.source.current_token().to_string();
        let span = Span::new(offset, lexeme.len(), self.token_line);
        let token = Token::new(kind, lexeme, literal, span);
        trace!(%token, "scanned");
        self.tokens.push(token);
    }

    fn advance(&mut self) -> Result<Option<char>, CompileError> {
        self.source.advance().map_err(|e| self.source_failure(e))
    }

    fn peek(&mut self) -> Result<Option<char>, CompileError> {
        self.source.peek().map_err(|e| self.source_failure(e))
    }

    fn peek_next(&mut self) -> Result<Option<char>, CompileError> {
        self.source.peek_next().map_err(|e| self.source_failure(e))
    }

    fn matches(&mut self, expected: char) -> Result<bool, CompileError> {
        self.source
            .advance_if_matches(expected)
            .map(|c| c.is_some())
            .map_err(|e| self.source_failure(e))
    }

    fn is_at_end(&mut self) -> Result<bool, CompileError> {
        self.source.is_at_end().map_err(|e| self.source_failure(e))
    }

    fn source_failure(&self, e: SourceError) -> CompileError {
        source_error(self.token_line, self.source.token_offset())(e)
    }

    fn error(&mut self, kind: ErrorKind, message: impl Into<String>) -> CompileError {
        let offset = self.source.token_offset();
        let len = self.source.current_token().len().max(1);
        CompileError::scan(
            kind,
            message,
            self.token_line,
            Span::new(offset, len, self.token_line),
        )
    }

    fn malformed(&self, lexeme: &str) -> CompileError {
        let offset = self.source.token_offset();
        CompileError::scan(
            ErrorKind::MalformedNumericLiteral,
            format!("malformed numeric literal '{lexeme}'"),
            self.token_line,
            Span::new(offset, lexeme.len(), self.token_line),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{StreamSource, StringSource};
    use rstest::rstest;

    fn scan_ok(source: &str) -> Vec<Token> {
        Scanner::new(StringSource::new(source))
            .scan_tokens()
            .expect("scan should succeed")
    }

    fn scan_err(source: &str) -> CompileError {
        Scanner::new(StringSource::new(source))
            .scan_tokens()
            .unwrap_err()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn single_char_tokens() {
        let tokens = scan_ok("(){},.-+;/*@");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Slash,
                TokenKind::Star,
                TokenKind::At,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_tokens() {
        let tokens = scan_ok("!= == >= <= && || ^^");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::AmpersandAmpersand,
                TokenKind::PipePipe,
                TokenKind::CaretCaret,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_then_equal() {
        let tokens = scan_ok("! = < > & | ^");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Bang,
                TokenKind::Equal,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Caret,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_literal() {
        let tokens = scan_ok("123");
        assert_eq!(kinds(&tokens), vec![TokenKind::Integer, TokenKind::Eof]);
        assert_eq!(tokens[0].literal, Some(Literal::Integer(123)));
    }

    #[test]
    fn float_literal() {
        let tokens = scan_ok("1.5");
        assert_eq!(kinds(&tokens), vec![TokenKind::Float, TokenKind::Eof]);
        assert_eq!(tokens[0].literal, Some(Literal::Float(1.5)));
    }

    #[test]
    fn string_literal_strips_quotes() {
        let tokens = scan_ok("\"ciao\"");
        assert_eq!(kinds(&tokens), vec![TokenKind::String, TokenKind::Eof]);
        assert_eq!(tokens[0].lexeme, "\"ciao\"");
        assert_eq!(tokens[0].literal, Some(Literal::Str("ciao".to_string())));
    }

    #[test]
    fn number_no_trailing_dot() {
        let tokens = scan_ok("42.foo");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Integer,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn integer_overflow_is_malformed() {
        let err = scan_err("99999999999999999999");
        assert_eq!(err.kind(), ErrorKind::MalformedNumericLiteral);
    }

    #[rstest]
    #[case("mentre", TokenKind::Mentre)]
    #[case("mentre1", TokenKind::Identifier)]
    #[case("mentre_", TokenKind::Identifier)]
    #[case("se", TokenKind::Se)]
    #[case("oppure", TokenKind::Oppure)]
    #[case("vero", TokenKind::Vero)]
    #[case("falso", TokenKind::Falso)]
    #[case("niente", TokenKind::Niente)]
    #[case("variabile", TokenKind::Variabile)]
    #[case("funzione", TokenKind::Funzione)]
    #[case("ritorna", TokenKind::Ritorna)]
    #[case("_nome", TokenKind::Identifier)]
    fn keywords_match_whole_lexeme(#[case] source: &str, #[case] expected: TokenKind) {
        let tokens = scan_ok(source);
        assert_eq!(kinds(&tokens), vec![expected, TokenKind::Eof]);
    }

    #[test]
    fn identifiers_carry_their_name() {
        let tokens = scan_ok("contatore");
        assert_eq!(
            tokens[0].literal,
            Some(Literal::Str("contatore".to_string()))
        );
    }

    #[test]
    fn comments_ignored() {
        let tokens = scan_ok("variabile x -- commento\nvariabile y");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Variabile,
                TokenKind::Identifier,
                TokenKind::Variabile,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn comment_at_end_of_input() {
        let tokens = scan_ok("1 -- fine");
        assert_eq!(kinds(&tokens), vec![TokenKind::Integer, TokenKind::Eof]);
    }

    #[test]
    fn lines_are_tracked() {
        let tokens = scan_ok("a\nb\n\nc");
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn spans_are_correct() {
        let tokens = scan_ok("variabile x = 42;");
        assert_eq!(tokens[0].span, Span::new(0, 9, 1));
        assert_eq!(tokens[1].span, Span::new(10, 1, 1));
        assert_eq!(tokens[2].span, Span::new(12, 1, 1));
        assert_eq!(tokens[3].span, Span::new(14, 2, 1));
        assert_eq!(tokens[4].span, Span::new(16, 1, 1));
        assert_eq!(tokens[5].span, Span::new(17, 0, 1));
    }

    #[test]
    fn unexpected_character_error() {
        let err = scan_err("variabile x = $;");
        assert_eq!(err.kind(), ErrorKind::UnexpectedCharacter);
        assert!(err.to_string().contains('$'));
    }

    #[test]
    fn unterminated_string_at_end() {
        let err = scan_err("\n\"abc");
        assert_eq!(err.kind(), ErrorKind::UnterminatedString);
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn string_cannot_span_lines() {
        let err = scan_err("\"abc\ndef\"");
        assert_eq!(err.kind(), ErrorKind::UnterminatedString);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn tokens_before_error_are_kept() {
        let mut scanner = Scanner::new(StringSource::new("a b #"));
        assert!(scanner.scan_tokens().is_err());
        assert_eq!(
            kinds(scanner.tokens()),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn windowed_source_matches_in_memory() {
        let text = "variabile saluto = \"ciao\";\nse (saluto == \"ciao\") { x = 1.25; }\n";
        let expected = scan_ok(text);
        let source = StreamSource::with_capacity(text.as_bytes(), 12).unwrap();
        let streamed = Scanner::new(source).scan_tokens().unwrap();
        assert_eq!(streamed, expected);
    }

    #[test]
    fn windowed_source_token_too_long() {
        let source = StreamSource::with_capacity("\"una stringa lunga\"".as_bytes(), 8).unwrap();
        let err = Scanner::new(source).scan_tokens().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenTooLong);
    }

    #[test]
    fn single_character_window_scans_single_character_tokens() {
        let source = StreamSource::with_capacity("(( ))\n;".as_bytes(), 1).unwrap();
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::RightParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[4].line, 2);
    }

    #[test]
    fn multiline_program() {
        let source = "variabile x = 1;\nvariabile y = 2;\nScriveLina(x + y);";
        let tokens = scan_ok(source);
        assert_eq!(tokens.len(), 18); // 17 tokens + EOF
    }
}
