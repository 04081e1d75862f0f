use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    At,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Ampersand,
    AmpersandAmpersand,
    Pipe,
    PipePipe,
    Caret,
    CaretCaret,

    // Literals
    Identifier,
    String,
    Integer,
    Float,

    // Keywords
    Se,
    Oppure,
    Mentre,
    Vero,
    Falso,
    Niente,
    Variabile,
    Funzione,
    Ritorna,
    Questo,
    Super,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Minus => write!(f, "-"),
            Self::Plus => write!(f, "+"),
            Self::Semicolon => write!(f, ";"),
            Self::Slash => write!(f, "/"),
            Self::Star => write!(f, "*"),
            Self::At => write!(f, "@"),
            Self::Bang => write!(f, "!"),
            Self::BangEqual => write!(f, "!="),
            Self::Equal => write!(f, "="),
            Self::EqualEqual => write!(f, "=="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEqual => write!(f, ">="),
            Self::Less => write!(f, "<"),
            Self::LessEqual => write!(f, "<="),
            Self::Ampersand => write!(f, "&"),
            Self::AmpersandAmpersand => write!(f, "&&"),
            Self::Pipe => write!(f, "|"),
            Self::PipePipe => write!(f, "||"),
            Self::Caret => write!(f, "^"),
            Self::CaretCaret => write!(f, "^^"),
            Self::Identifier => write!(f, "IDENTIFIER"),
            Self::String => write!(f, "STRING"),
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Se => write!(f, "se"),
            Self::Oppure => write!(f, "oppure"),
            Self::Mentre => write!(f, "mentre"),
            Self::Vero => write!(f, "vero"),
            Self::Falso => write!(f, "falso"),
            Self::Niente => write!(f, "niente"),
            Self::Variabile => write!(f, "variabile"),
            Self::Funzione => write!(f, "funzione"),
            Self::Ritorna => write!(f, "ritorna"),
            Self::Questo => write!(f, "questo"),
            Self::Super => write!(f, "super"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

/// Location of a lexeme: byte offset and length in the source, plus the
/// 1-based line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    pub line: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize, line: usize) -> Self {
        Self { offset, len, line }
    }

    /// Span from the start of `self` to the end of `end`, on `self`'s line.
    pub fn to(self, end: Span) -> Self {
        let stop = (end.offset + end.len).max(self.offset);
        Self::new(self.offset, stop - self.offset, self.line)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.offset.into(), span.len)
    }
}

/// Value parsed out of a lexeme at scan time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        span: Span,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal,
            line: span.line,
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}'", self.kind, self.lexeme)?;
        if let Some(ref literal) = self.literal {
            write!(f, " = {literal}")?;
        }
        write!(f, " line {}", self.line)
    }
}

pub fn keyword_kind(ident: &str) -> Option<TokenKind> {
    match ident {
        "se" => Some(TokenKind::Se),
        "oppure" => Some(TokenKind::Oppure),
        "mentre" => Some(TokenKind::Mentre),
        "vero" => Some(TokenKind::Vero),
        "falso" => Some(TokenKind::Falso),
        "niente" => Some(TokenKind::Niente),
        "variabile" => Some(TokenKind::Variabile),
        "funzione" => Some(TokenKind::Funzione),
        "ritorna" => Some(TokenKind::Ritorna),
        "questo" => Some(TokenKind::Questo),
        "super" => Some(TokenKind::Super),
        _ => None,
    }
}

/// True if `name` is spelled like a keyword and so can never be bound.
pub fn is_reserved(name: &str) -> bool {
    keyword_kind(name).is_some()
}
