use crate::token::{is_id_char, CloseKind, OpenKind, Span, Token, TokenKind};
use crate::LexError;

/// Scanner mode determines how the next character is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Literal template text up to the next unescaped `{{`.
    Content,
    /// Between the delimiters of a tag opened with the given kind.
    Mustache(OpenKind),
}

/// A saved source position.
#[derive(Debug, Clone, Copy)]
struct Mark {
    offset: usize,
    line: usize,
    column: usize,
}

/// Template source scanner.
///
/// Tokenizes template source in a single pass. Content runs are captured
/// verbatim; tags are split into path, literal and operator tokens.
///
/// - `Vec<char>` source for index-based navigation
/// - Mode switch between content and tag interiors
/// - Position tracking on every token
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    mode: ScannerMode,
    /// Where the currently open tag started.
    open_at: Mark,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            mode: ScannerMode::Content,
            open_at: Mark {
                offset: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    /// Scan all tokens from the source.
    fn scan_tokens(&mut self) -> Result<(), LexError> {
        while !self.is_at_end() {
            match self.mode {
                ScannerMode::Content => self.scan_content()?,
                ScannerMode::Mustache(kind) => self.scan_tag_token(kind)?,
            }
        }

        if let ScannerMode::Mustache(kind) = self.mode {
            return Err(self.error_at(
                self.open_at,
                format!("Unterminated tag `{}`", kind.as_str()),
            ));
        }

        let mark = self.mark();
        self.push(TokenKind::Eof, mark);
        Ok(())
    }

    // --- Content ---

    /// Scan literal text up to the next tag, then the tag's opening delimiter.
    fn scan_content(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        let mut text = String::new();

        while !self.is_at_end() {
            if self.starts_with("\\\\{{") {
                // `\\{{` is a literal backslash followed by a real tag
                text.push('\\');
                self.advance_by(2);
                break;
            }
            if self.starts_with("\\{{") {
                text.push_str("{{");
                self.advance_by(3);
                continue;
            }
            if self.starts_with("{{") {
                break;
            }
            text.push(self.peek());
            self.advance();
        }

        if !text.is_empty() {
            self.push(TokenKind::Content(text), start);
        }

        if self.starts_with("{{") {
            self.scan_open()?;
        }
        Ok(())
    }

    /// Scan an opening delimiter with its optional `~` and sigil.
    fn scan_open(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        self.open_at = start;

        if self.starts_with("{{{{/") {
            self.advance_by(5);
            self.push(TokenKind::Open(OpenKind::RawClose), start);
            self.mode = ScannerMode::Mustache(OpenKind::RawClose);
            return Ok(());
        }
        if self.starts_with("{{{{") {
            self.advance_by(4);
            self.push(TokenKind::Open(OpenKind::Raw), start);
            self.mode = ScannerMode::Mustache(OpenKind::Raw);
            return Ok(());
        }

        self.advance_by(2);
        let tilde = if self.peek() == '~' {
            let at = self.mark();
            self.advance();
            Some(at)
        } else {
            None
        };

        let kind = match (self.peek(), self.peek_next()) {
            ('#', '>') => OpenKind::PartialBlock,
            ('#', '*') => OpenKind::DecoratorBlock,
            ('#', _) => OpenKind::Block,
            ('/', _) => OpenKind::Close,
            ('^', _) => OpenKind::Inverse,
            ('>', _) => OpenKind::Partial,
            ('*', _) => OpenKind::Decorator,
            ('&', _) => OpenKind::Ampersand,
            ('{', _) => OpenKind::Unescaped,
            ('!', _) => OpenKind::Comment,
            _ => OpenKind::Plain,
        };
        let sigil_len = match kind {
            OpenKind::Plain => 0,
            OpenKind::PartialBlock | OpenKind::DecoratorBlock => 2,
            _ => 1,
        };
        self.advance_by(sigil_len);

        self.push(TokenKind::Open(kind), start);
        if let Some(at) = tilde {
            let span = Span::new(at.offset, at.offset + 1, at.line, at.column);
            self.tokens.push(Token::new(TokenKind::Tilde, span));
        }

        if kind == OpenKind::Comment {
            return self.scan_comment();
        }

        self.mode = ScannerMode::Mustache(kind);
        Ok(())
    }

    /// Scan a comment body and its closing delimiter. Comments never nest.
    fn scan_comment(&mut self) -> Result<(), LexError> {
        let long = self.starts_with("--");
        if long {
            self.advance_by(2);
        }

        let start = self.mark();
        let mut text = String::new();
        loop {
            if self.is_at_end() {
                return Err(self.error_at(self.open_at, "Unterminated comment".into()));
            }
            let at_end = if long {
                self.starts_with("--}}") || self.starts_with("--~}}")
            } else {
                self.starts_with("}}") || self.starts_with("~}}")
            };
            if at_end {
                break;
            }
            text.push(self.peek());
            self.advance();
        }
        self.push(TokenKind::Comment(text), start);

        if long {
            self.advance_by(2);
        }
        if self.peek() == '~' {
            let at = self.mark();
            self.advance();
            self.push(TokenKind::Tilde, at);
        }
        let close = self.mark();
        self.advance_by(2);
        self.push(TokenKind::Close(CloseKind::Plain), close);
        Ok(())
    }

    // --- Tag interiors ---

    /// Scan the next token inside a tag.
    fn scan_tag_token(&mut self, kind: OpenKind) -> Result<(), LexError> {
        let ch = self.peek();

        match ch {
            c if c.is_whitespace() => {
                self.advance();
                Ok(())
            }
            '~' if self.peek_next() == '}' => self.single(TokenKind::Tilde),
            '}' => self.scan_close(kind),
            '"' | '\'' => self.scan_string(),
            '[' => self.scan_segment(),
            '@' => self.single(TokenKind::At),
            '=' => self.single(TokenKind::Equals),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '|' => self.single(TokenKind::Pipe),
            '/' => self.single(TokenKind::Separator),
            '.' => self.scan_dot(),
            '-' if self.peek_next().is_ascii_digit() && !self.after_separator() => {
                self.scan_number()
            }
            '0'..='9' if !self.after_separator() => self.scan_number(),
            c if is_id_char(c) => self.scan_identifier(),
            _ => Err(self.error(format!("Unexpected character: '{ch}'"))),
        }
    }

    /// Scan the closing delimiter balancing the open tag.
    fn scan_close(&mut self, kind: OpenKind) -> Result<(), LexError> {
        let expected = kind.closer();

        let close = if expected == CloseKind::Unescaped && self.starts_with("}~}}") {
            // `{{~{x}~}}`: the inner brace comes before the marker
            self.advance();
            self.single(TokenKind::Tilde)?;
            CloseKind::Unescaped
        } else if self.starts_with(expected.as_str()) {
            expected
        } else if self.starts_with("}}") {
            CloseKind::Plain
        } else {
            return Err(self.error("Unexpected character: '}'".into()));
        };

        let start = self.mark();
        let len = if close == CloseKind::Unescaped && !self.starts_with("}}}") {
            2
        } else {
            close.as_str().len()
        };
        self.advance_by(len);
        self.push(TokenKind::Close(close), start);
        self.mode = ScannerMode::Content;

        if kind == OpenKind::Raw && close == CloseKind::Raw {
            self.scan_raw_body()?;
        }
        Ok(())
    }

    /// Capture the interior of a raw block verbatim, then its close tag.
    fn scan_raw_body(&mut self) -> Result<(), LexError> {
        let open_at = self.open_at;
        let name = self
            .tokens
            .iter()
            .rev()
            .take_while(|t| t.kind != TokenKind::Open(OpenKind::Raw))
            .filter_map(|t| match &t.kind {
                TokenKind::Identifier(name) => Some(name.clone()),
                _ => None,
            })
            .last()
            .ok_or_else(|| self.error_at(open_at, "Raw block is missing a helper name".into()))?;
        let terminator = ["{{{{/", &name, "}}}}"].concat();

        let start = self.mark();
        let mut body = String::new();
        while !self.starts_with(&terminator) {
            if self.is_at_end() {
                return Err(self.error_at(
                    open_at,
                    format!("Unterminated raw block `{{{{{{{{{name}}}}}}}}}`"),
                ));
            }
            body.push(self.peek());
            self.advance();
        }
        if !body.is_empty() {
            self.push(TokenKind::Content(body), start);
        }

        let close_at = self.mark();
        self.open_at = close_at;
        self.advance_by(5);
        self.push(TokenKind::Open(OpenKind::RawClose), close_at);
        let name_at = self.mark();
        self.advance_by(name.chars().count());
        self.push(TokenKind::Identifier(name), name_at);
        let end_at = self.mark();
        self.advance_by(4);
        self.push(TokenKind::Close(CloseKind::Raw), end_at);
        Ok(())
    }

    /// Scan `.`: a path separator, a reference to `this`, or a `../` hop.
    fn scan_dot(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        if self.peek_next() == '.' {
            self.advance_by(2);
            if self.peek() == '/' {
                self.advance();
            }
            self.push(TokenKind::Up, start);
            return Ok(());
        }

        let next = self.peek_next();
        let continues_path = matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Identifier(_)) | Some(TokenKind::Segment(_))
        ) && (is_id_char(next) || next == '[');

        self.advance();
        if continues_path {
            self.push(TokenKind::Separator, start);
        } else {
            self.push(TokenKind::Dot, start);
        }
        Ok(())
    }

    /// Scan a string literal, resolving escape sequences.
    fn scan_string(&mut self) -> Result<(), LexError> {
        let quote = self.peek();
        let start = self.mark();
        self.advance(); // consume opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                let escape_at = self.mark();
                self.advance(); // consume backslash
                if self.is_at_end() {
                    break;
                }
                match self.peek() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    c => {
                        return Err(self.error_at(
                            escape_at,
                            format!("Invalid escape sequence: '\\{c}'"),
                        ));
                    }
                }
                self.advance();
            } else {
                value.push(self.peek());
                self.advance();
            }
        }

        if self.is_at_end() {
            return Err(self.error_at(start, "Unterminated string".into()));
        }

        self.advance(); // consume closing quote
        self.push(TokenKind::String(value), start);
        Ok(())
    }

    /// Scan a bracketed literal segment `[...]`.
    fn scan_segment(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        self.advance(); // consume `[`

        let mut name = String::new();
        while !self.is_at_end() && self.peek() != ']' {
            name.push(self.peek());
            self.advance();
        }

        if self.is_at_end() {
            return Err(self.error_at(start, "Unterminated path segment".into()));
        }

        self.advance(); // consume `]`
        self.push(TokenKind::Segment(name), start);
        Ok(())
    }

    /// Scan an identifier or literal keyword.
    fn scan_identifier(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        let keywords = !self.after_separator();

        let mut ident = String::new();
        while !self.is_at_end() && is_id_char(self.peek()) {
            ident.push(self.peek());
            self.advance();
        }

        let kind = match ident.as_str() {
            "true" if keywords => TokenKind::Boolean(true),
            "false" if keywords => TokenKind::Boolean(false),
            "undefined" if keywords => TokenKind::Undefined,
            "null" if keywords => TokenKind::Null,
            _ => TokenKind::Identifier(ident),
        };
        self.push(kind, start);
        Ok(())
    }

    /// Scan a number literal (integer or decimal), keeping its spelling.
    fn scan_number(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        let mut text = String::new();

        if self.peek() == '-' {
            text.push('-');
            self.advance();
        }
        while self.peek().is_ascii_digit() {
            text.push(self.peek());
            self.advance();
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            text.push('.');
            self.advance();
            while self.peek().is_ascii_digit() {
                text.push(self.peek());
                self.advance();
            }
        }

        if !self.is_at_end() && is_id_char(self.peek()) {
            return Err(self.error_at(start, format!("Invalid number: '{text}{}'", self.peek())));
        }

        self.push(TokenKind::Number(text), start);
        Ok(())
    }

    // --- Helpers ---

    /// Emit a one-character token and consume it.
    fn single(&mut self, kind: TokenKind) -> Result<(), LexError> {
        let start = self.mark();
        self.advance();
        self.push(kind, start);
        Ok(())
    }

    /// Whether the previous token makes the next word a path segment.
    fn after_separator(&self) -> bool {
        matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Separator) | Some(TokenKind::At)
        )
    }

    fn push(&mut self, kind: TokenKind, start: Mark) {
        let span = Span::new(start.offset, self.offset, start.line, start.column);
        self.tokens.push(Token::new(kind, span));
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        let mut i = self.pos;
        for c in pattern.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(&c) = self.chars.get(self.pos) {
            self.pos += 1;
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, message: String) -> LexError {
        self.error_at(self.mark(), message)
    }

    fn error_at(&self, at: Mark, message: String) -> LexError {
        LexError {
            message,
            line: at.line,
            column: at.column,
            offset: at.offset,
        }
    }
}
