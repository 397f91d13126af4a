use std::fmt;

/// A position in source text, tracking byte offsets plus line and column for
/// error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// The opening delimiter of a tag, including its sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    /// `{{`
    Plain,
    /// `{{{`
    Unescaped,
    /// `{{&`
    Ampersand,
    /// `{{#`
    Block,
    /// `{{/`
    Close,
    /// `{{^`
    Inverse,
    /// `{{>`
    Partial,
    /// `{{#>`
    PartialBlock,
    /// `{{*`
    Decorator,
    /// `{{#*`
    DecoratorBlock,
    /// `{{!` and `{{!--`
    Comment,
    /// `{{{{`
    Raw,
    /// `{{{{/`
    RawClose,
}

impl OpenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OpenKind::Plain => "{{",
            OpenKind::Unescaped => "{{{",
            OpenKind::Ampersand => "{{&",
            OpenKind::Block => "{{#",
            OpenKind::Close => "{{/",
            OpenKind::Inverse => "{{^",
            OpenKind::Partial => "{{>",
            OpenKind::PartialBlock => "{{#>",
            OpenKind::Decorator => "{{*",
            OpenKind::DecoratorBlock => "{{#*",
            OpenKind::Comment => "{{!",
            OpenKind::Raw => "{{{{",
            OpenKind::RawClose => "{{{{/",
        }
    }

    /// The closing delimiter that balances this opening delimiter.
    pub fn closer(self) -> CloseKind {
        match self {
            OpenKind::Unescaped => CloseKind::Unescaped,
            OpenKind::Raw | OpenKind::RawClose => CloseKind::Raw,
            _ => CloseKind::Plain,
        }
    }
}

/// The closing delimiter of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// `}}`
    Plain,
    /// `}}}`
    Unescaped,
    /// `}}}}`
    Raw,
}

impl CloseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseKind::Plain => "}}",
            CloseKind::Unescaped => "}}}",
            CloseKind::Raw => "}}}}",
        }
    }
}

/// Token classification for template source.
///
/// Data-carrying variants embed their value directly.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal text outside of any tag, with `\{{` escapes already resolved.
    Content(String),
    /// The body of a `{{! }}` or `{{!-- --}}` comment.
    Comment(String),

    // Delimiters
    Open(OpenKind),
    Close(CloseKind),
    /// Whitespace-control marker `~` adjacent to a delimiter.
    Tilde,

    // Paths
    Identifier(String),
    /// A bracketed literal segment: `[any text]`.
    Segment(String),
    /// `.` or `/` between two path segments.
    Separator,
    /// A lone `.` referring to the current context.
    Dot,
    /// `../` (or a trailing `..`).
    Up,
    /// `@` prefix of a data variable.
    At,

    // Literals (carry data)
    String(String),
    /// Numeric literal in its original spelling.
    Number(String),
    Boolean(bool),
    Undefined,
    Null,

    // Operators
    Equals,
    LParen,
    RParen,
    Pipe,

    // End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Content(_) => write!(f, "template content"),
            TokenKind::Comment(_) => write!(f, "comment"),
            TokenKind::Open(kind) => write!(f, "`{}`", kind.as_str()),
            TokenKind::Close(kind) => write!(f, "`{}`", kind.as_str()),
            TokenKind::Tilde => write!(f, "`~`"),
            TokenKind::Identifier(name) => write!(f, "identifier `{name}`"),
            TokenKind::Segment(name) => write!(f, "segment `[{name}]`"),
            TokenKind::Separator => write!(f, "path separator"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::Up => write!(f, "`../`"),
            TokenKind::At => write!(f, "`@`"),
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Number(n) => write!(f, "number `{n}`"),
            TokenKind::Boolean(b) => write!(f, "`{b}`"),
            TokenKind::Undefined => write!(f, "`undefined`"),
            TokenKind::Null => write!(f, "`null`"),
            TokenKind::Equals => write!(f, "`=`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::Pipe => write!(f, "`|`"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Characters that can never appear inside a bare identifier.
const NON_ID_CHARS: &str = "!\"#%&'()*+,./;<=>@[\\]^`{|}~";

/// Check if a character may appear in a bare identifier.
pub fn is_id_char(c: char) -> bool {
    !c.is_whitespace() && !NON_ID_CHARS.contains(c)
}

/// Check if a whole string can be written as a bare identifier.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(is_id_char)
        && !matches!(s, "true" | "false" | "null" | "undefined" | "else" | "as" | "this")
        && !s.starts_with(|c: char| c.is_ascii_digit() || c == '-')
}
