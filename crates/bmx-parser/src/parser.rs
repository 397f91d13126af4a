//! Template parser for BMX.
//!
//! Parses a stream of tokens (from `bmx-lexer`) into a `Template` AST.
//! Matches block open and close tags, collects hash and block parameters,
//! and applies `~` whitespace control to neighbouring content as it goes,
//! so later phases only ever see already-trimmed text.
//!
//! Uses recursive descent: one method per tag form.

use crate::ast::{
    Block, BlockKind, Call, Decorator, Expr, HashPair, Inverse, Literal, Mustache, Partial,
    PartialName, Path, Position, Statement, Strip, Template,
};
use crate::ParseError;
use bmx_lexer::{CloseKind, OpenKind, Span, Token, TokenKind};

/// Deepest nesting of block bodies, else chains and subexpressions.
pub const MAX_NESTING: usize = 128;

/// Positional arguments, hash arguments and block params of one tag.
type Arguments = (Vec<Expr>, Vec<HashPair>, Vec<String>);

/// BMX template parser.
///
/// Converts a flat token stream into a tree of statements using recursive
/// descent. Never panics on malformed input; every failure is a `ParseError`.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Set by a `~}}`: the next content token loses its leading whitespace.
    strip_next: bool,
    depth: usize,
}

impl Parser {
    /// Create a new parser for the given tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            strip_next: false,
            depth: 0,
        }
    }

    /// Parse a token stream into a template.
    pub fn parse(tokens: Vec<Token>) -> Result<Template, ParseError> {
        let mut parser = Parser::new(tokens);
        parser.parse_template()
    }

    /// Parse a full template.
    fn parse_template(&mut self) -> Result<Template, ParseError> {
        let template = self.parse_statements()?;

        match &self.peek().kind {
            TokenKind::Eof => Ok(template),
            TokenKind::Open(OpenKind::Close) => {
                Err(self.expected("a block open tag before this close tag"))
            }
            _ if self.at_else() => Err(self.expected("a block around this `else`")),
            _ => Err(self.expected("end of input")),
        }
    }

    /// Parse statements until the end of input or a tag that ends the
    /// enclosing program (`{{/...}}`, `{{else}}`, `{{^}}`).
    fn parse_statements(&mut self) -> Result<Template, ParseError> {
        let mut statements = Vec::new();

        while !self.at_program_end() {
            let token = self.advance();
            match token.kind {
                TokenKind::Content(text) => self.push_content(&mut statements, text),
                TokenKind::Open(kind) => self.parse_tag(kind, token.span, &mut statements)?,
                other => {
                    return Err(ParseError::at(
                        token.span,
                        "template content or a tag",
                        other.to_string(),
                    ));
                }
            }
        }

        Ok(Template::new(statements))
    }

    /// Parse one tag after its opening delimiter and append the result.
    fn parse_tag(
        &mut self,
        kind: OpenKind,
        span: Span,
        statements: &mut Vec<Statement>,
    ) -> Result<(), ParseError> {
        let position = position(span);
        let open = self.eat_left_tilde(span);
        if open {
            trim_last(statements);
        }
        // comments leave a pending `~}}` in place for the content after them
        if kind != OpenKind::Comment {
            self.strip_next = false;
        }

        let statement = match kind {
            OpenKind::Comment => return self.parse_comment(),
            OpenKind::Plain | OpenKind::Unescaped | OpenKind::Ampersand => {
                self.parse_mustache(kind, open, position)?
            }
            OpenKind::Block => Statement::Block(self.parse_block(BlockKind::Normal, open, position)?),
            OpenKind::Inverse => {
                Statement::Block(self.parse_block(BlockKind::Inverted, open, position)?)
            }
            OpenKind::Raw => Statement::Block(self.parse_raw_block(position)?),
            OpenKind::Partial => Statement::Partial(self.parse_partial(false, open, position)?),
            OpenKind::PartialBlock => {
                Statement::Partial(self.parse_partial(true, open, position)?)
            }
            OpenKind::Decorator => {
                Statement::Decorator(self.parse_decorator(false, open, position)?)
            }
            OpenKind::DecoratorBlock => {
                Statement::Decorator(self.parse_decorator(true, open, position)?)
            }
            OpenKind::Close | OpenKind::RawClose => {
                return Err(ParseError::at(span, "a statement", format!("`{}`", kind.as_str())));
            }
        };

        statements.push(statement);
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse the remainder of a comment. Comments leave no node behind.
    fn parse_comment(&mut self) -> Result<(), ParseError> {
        if let TokenKind::Comment(_) = self.peek().kind {
            self.advance();
        }
        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(CloseKind::Plain)?;
        self.strip_next |= close;
        Ok(())
    }

    /// Parse `{{expr}}`, `{{helper args}}` and the unescaped forms.
    fn parse_mustache(
        &mut self,
        kind: OpenKind,
        open: bool,
        position: Position,
    ) -> Result<Statement, ParseError> {
        let head_span = self.peek().span;
        let head = self.parse_expr()?;
        let (params, hash, _) = self.parse_arguments(false)?;

        let expr = if params.is_empty() && hash.is_empty() {
            head
        } else {
            let call = self.call_from(head, head_span, params, hash, position)?;
            Expr::SubExpression(Box::new(call))
        };

        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(kind.closer())?;
        self.strip_next = close;

        Ok(Statement::Mustache(Mustache {
            expr,
            escaped: kind == OpenKind::Plain,
            strip: Strip { open, close },
            position,
        }))
    }

    /// Parse a block from its open tag through its close tag:
    /// ```text
    /// {{#each items as |item|}}...{{else}}...{{/each}}
    /// ```
    fn parse_block(
        &mut self,
        kind: BlockKind,
        open: bool,
        position: Position,
    ) -> Result<Block, ParseError> {
        let head_span = self.peek().span;
        let head = self.parse_expr()?;
        let (params, hash, block_params) = self.parse_arguments(true)?;
        let call = self.call_from(head, head_span, params, hash, position)?;

        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(CloseKind::Plain)?;
        self.strip_next = close;

        let mut block =
            self.parse_block_body(call, block_params, kind, Strip { open, close }, position)?;

        let name = block.call.name.clone();
        block.close_strip = self.parse_close(&name)?;
        if block.close_strip.open {
            trim_last(&mut last_program_mut(&mut block).statements);
        }

        if kind == BlockKind::Inverted {
            // `{{^x}}A{{else}}B{{/x}}` runs A as the inverse and B as the program
            let inverse = std::mem::take(&mut block.program);
            block.program = match block.inverse.take() {
                Some(Inverse::Program(program)) => program,
                _ => Template::default(),
            };
            block.inverse = Some(Inverse::Program(inverse));
        }

        Ok(block)
    }

    /// Parse a block's program and its optional `{{else}}` continuation,
    /// stopping in front of the close tag.
    fn parse_block_body(
        &mut self,
        call: Call,
        block_params: Vec<String>,
        kind: BlockKind,
        open_strip: Strip,
        position: Position,
    ) -> Result<Block, ParseError> {
        let program = self.nested(Self::parse_statements)?;
        let mut block = Block {
            call,
            block_params,
            program,
            inverse: None,
            kind,
            open_strip,
            inverse_strip: Strip::default(),
            close_strip: Strip::default(),
            position,
        };

        if !self.at_else() {
            return Ok(block);
        }

        let else_token = self.advance();
        let open = self.eat_left_tilde(else_token.span);
        if open {
            trim_last(&mut block.program.statements);
        }
        let keyword = else_token.kind == TokenKind::Open(OpenKind::Plain);
        if keyword {
            self.advance(); // consume `else`
        }

        if !matches!(self.peek().kind, TokenKind::Tilde | TokenKind::Close(_)) {
            // `{{else if cond}}` opens a chained block
            if !keyword || kind != BlockKind::Normal {
                return Err(self.expected("`}}`"));
            }
            let chain_position = position_of(&else_token);
            let head_span = self.peek().span;
            let head = self.parse_expr()?;
            let (params, hash, block_params) = self.parse_arguments(true)?;
            let call = self.call_from(head, head_span, params, hash, chain_position)?;

            let close = self.eat(&TokenKind::Tilde);
            self.expect_close(CloseKind::Plain)?;
            self.strip_next = close;

            let chained = self.nested(|parser| {
                parser.parse_block_body(
                    call,
                    block_params,
                    BlockKind::Normal,
                    Strip { open, close },
                    chain_position,
                )
            })?;
            block.inverse = Some(Inverse::Chain(Box::new(chained)));
            return Ok(block);
        }

        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(CloseKind::Plain)?;
        self.strip_next = close;
        block.inverse_strip = Strip { open, close };
        block.inverse = Some(Inverse::Program(self.nested(Self::parse_statements)?));

        Ok(block)
    }

    /// Parse a raw block after its `{{{{`:
    /// ```text
    /// {{{{raw}}}} {{not parsed}} {{{{/raw}}}}
    /// ```
    fn parse_raw_block(&mut self, position: Position) -> Result<Block, ParseError> {
        let head_span = self.peek().span;
        let head = self.parse_expr()?;
        let (params, hash, _) = self.parse_arguments(false)?;
        let call = self.call_from(head, head_span, params, hash, position)?;
        self.expect_close(CloseKind::Raw)?;

        let mut statements = Vec::new();
        if let TokenKind::Content(text) = &self.peek().kind {
            statements.push(Statement::Content(text.clone()));
            self.advance();
        }

        if self.peek().kind != TokenKind::Open(OpenKind::RawClose) {
            return Err(self.expected(&format!("`{{{{{{{{/{}}}}}}}}}`", call.name)));
        }
        self.advance();
        let name_token = self.advance();
        match &name_token.kind {
            TokenKind::Identifier(name) if *name == call.name => {}
            other => {
                return Err(ParseError::at(
                    name_token.span,
                    format!("`{}`", call.name),
                    other.to_string(),
                ));
            }
        }
        self.expect_close(CloseKind::Raw)?;

        Ok(Block {
            call,
            block_params: Vec::new(),
            program: Template::new(statements),
            inverse: None,
            kind: BlockKind::Raw,
            open_strip: Strip::default(),
            inverse_strip: Strip::default(),
            close_strip: Strip::default(),
            position,
        })
    }

    /// Parse a partial or partial block:
    /// ```text
    /// {{> card person title="Hi"}}
    /// {{#> layout}}fallback{{/layout}}
    /// ```
    fn parse_partial(
        &mut self,
        block: bool,
        open: bool,
        position: Position,
    ) -> Result<Partial, ParseError> {
        let name = self.parse_partial_name()?;
        let args_span = self.peek().span;
        let (mut params, hash, _) = self.parse_arguments(false)?;
        if params.len() > 1 {
            return Err(ParseError::at(
                args_span,
                "at most one context argument",
                format!("{} positional arguments", params.len()),
            ));
        }
        let context = params.pop();

        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(CloseKind::Plain)?;
        self.strip_next = close;

        let mut partial = Partial {
            name,
            context,
            hash,
            block: None,
            strip: Strip { open, close },
            close_strip: Strip::default(),
            position,
        };

        if block {
            let mut body = self.nested(Self::parse_statements)?;
            let close_name = match &partial.name {
                PartialName::Static(name) => name.clone(),
                PartialName::Dynamic(call) => call.name.clone(),
            };
            partial.close_strip = self.parse_close(&close_name)?;
            if partial.close_strip.open {
                trim_last(&mut body.statements);
            }
            partial.block = Some(body);
        }

        Ok(partial)
    }

    /// Parse a decorator or decorator block:
    /// ```text
    /// {{* activate "x"}}
    /// {{#* inline "row"}}...{{/inline}}
    /// ```
    fn parse_decorator(
        &mut self,
        block: bool,
        open: bool,
        position: Position,
    ) -> Result<Decorator, ParseError> {
        let head_span = self.peek().span;
        let head = self.parse_expr()?;
        let (params, hash, _) = self.parse_arguments(false)?;
        let call = self.call_from(head, head_span, params, hash, position)?;

        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(CloseKind::Plain)?;
        self.strip_next = close;

        let mut decorator = Decorator {
            call,
            program: None,
            strip: Strip { open, close },
            close_strip: Strip::default(),
            position,
        };

        if block {
            let mut body = self.nested(Self::parse_statements)?;
            let name = decorator.call.name.clone();
            decorator.close_strip = self.parse_close(&name)?;
            if decorator.close_strip.open {
                trim_last(&mut body.statements);
            }
            decorator.program = Some(body);
        }

        Ok(decorator)
    }

    /// Parse `{{/name}}`, which must repeat the open tag's name exactly.
    fn parse_close(&mut self, name: &str) -> Result<Strip, ParseError> {
        let expected = format!("`{{{{/{name}}}}}`");
        if self.peek().kind != TokenKind::Open(OpenKind::Close) {
            return Err(self.expected(&expected));
        }
        let close_token = self.advance();

        let open = self.eat_left_tilde(close_token.span);
        let name_span = self.peek().span;
        let path = self.parse_path()?;
        let found = path_name(&path);
        if found != name {
            return Err(ParseError::at(
                name_span,
                expected,
                format!("`{{{{/{found}}}}}`"),
            ));
        }

        let close = self.eat(&TokenKind::Tilde);
        self.expect_close(CloseKind::Plain)?;
        self.strip_next = close;
        Ok(Strip { open, close })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Parse positional arguments, then hash arguments, then block params.
    fn parse_arguments(&mut self, allow_block_params: bool) -> Result<Arguments, ParseError> {
        let mut params = Vec::new();
        let mut hash: Vec<HashPair> = Vec::new();
        let mut block_params = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::Tilde | TokenKind::Close(_) | TokenKind::RParen | TokenKind::Eof => {
                    break;
                }
                TokenKind::Identifier(word)
                    if word == "as" && self.peek_kind(1) == Some(&TokenKind::Pipe) =>
                {
                    if !allow_block_params {
                        return Err(self.expected("an argument"));
                    }
                    self.advance(); // consume `as`
                    self.advance(); // consume `|`
                    block_params = self.parse_block_params()?;
                    break;
                }
                TokenKind::Identifier(key) if self.peek_kind(1) == Some(&TokenKind::Equals) => {
                    let key = key.clone();
                    let key_span = self.peek().span;
                    self.advance(); // consume key
                    self.advance(); // consume `=`
                    let value = self.parse_expr()?;
                    if hash.iter().any(|pair| pair.key == key) {
                        return Err(ParseError::at(
                            key_span,
                            "unique hash keys",
                            format!("duplicate key `{key}`"),
                        ));
                    }
                    hash.push(HashPair { key, value });
                }
                _ => {
                    if !hash.is_empty() {
                        return Err(self.expected("a hash argument `key=value`"));
                    }
                    params.push(self.parse_expr()?);
                }
            }
        }

        Ok((params, hash, block_params))
    }

    /// Parse the names of `as |a b|` after the opening pipe.
    fn parse_block_params(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Identifier(name) => names.push(name),
                TokenKind::Pipe if !names.is_empty() => return Ok(names),
                other => {
                    return Err(ParseError::at(
                        token.span,
                        "a block parameter name",
                        other.to_string(),
                    ));
                }
            }
        }
    }

    /// Parse a single expression: literal, path or subexpression.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let literal = match token.kind {
            TokenKind::String(s) => Literal::String(s),
            TokenKind::Number(text) => number_literal(text, token.span)?,
            TokenKind::Boolean(b) => Literal::Boolean(b),
            TokenKind::Undefined => Literal::Undefined,
            TokenKind::Null => Literal::Null,
            TokenKind::LParen => {
                return Ok(Expr::SubExpression(Box::new(self.parse_subexpression()?)));
            }
            TokenKind::At
            | TokenKind::Up
            | TokenKind::Dot
            | TokenKind::Identifier(_)
            | TokenKind::Segment(_) => return Ok(Expr::Path(self.parse_path()?)),
            _ => return Err(self.expected("an expression")),
        };
        self.advance();
        Ok(Expr::Literal(literal))
    }

    /// Parse `(name args key=value)`.
    fn parse_subexpression(&mut self) -> Result<Call, ParseError> {
        self.nested(Self::parse_parenthesized)
    }

    fn parse_parenthesized(&mut self) -> Result<Call, ParseError> {
        let open = self.advance(); // consume `(`
        let head_span = self.peek().span;
        let head = self.parse_expr()?;
        let (params, hash, _) = self.parse_arguments(false)?;

        if self.peek().kind != TokenKind::RParen {
            return Err(self.expected("`)`"));
        }
        self.advance();

        self.call_from(head, head_span, params, hash, position_of(&open))
    }

    /// Parse a path: `this`, `.`, `../a`, `a.b/c`, `[lit].x`, `@index`.
    fn parse_path(&mut self) -> Result<Path, ParseError> {
        let mut path = Path {
            data: self.eat(&TokenKind::At),
            ..Path::default()
        };

        match &self.peek().kind {
            TokenKind::Dot => {
                self.advance();
                path.this = true;
                if !self.eat(&TokenKind::Separator) {
                    return Ok(path);
                }
            }
            TokenKind::Identifier(name) if name == "this" => {
                self.advance();
                path.this = true;
                if !self.eat(&TokenKind::Separator) {
                    return Ok(path);
                }
            }
            TokenKind::Up => {
                while self.eat(&TokenKind::Up) {
                    path.depth += 1;
                }
                match &self.peek().kind {
                    // `../this` is the parent scope itself
                    TokenKind::Identifier(name) if name == "this" => {
                        self.advance();
                        return Ok(path);
                    }
                    TokenKind::Identifier(_) | TokenKind::Segment(_) => {}
                    _ => return Ok(path),
                }
            }
            _ => {}
        }

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Identifier(name) if name != "this" => path.segments.push(name),
                TokenKind::Segment(name) => path.segments.push(name),
                other => {
                    return Err(ParseError::at(
                        token.span,
                        "a path segment",
                        other.to_string(),
                    ));
                }
            }
            if !self.eat(&TokenKind::Separator) {
                break;
            }
        }

        Ok(path)
    }

    /// Parse the name of a partial: a path, a quoted string or a subexpression.
    fn parse_partial_name(&mut self) -> Result<PartialName, ParseError> {
        match &self.peek().kind {
            TokenKind::String(name) => {
                let name = name.clone();
                self.advance();
                Ok(PartialName::Static(name))
            }
            TokenKind::LParen => Ok(PartialName::Dynamic(Box::new(self.parse_subexpression()?))),
            TokenKind::At
            | TokenKind::Up
            | TokenKind::Dot
            | TokenKind::Identifier(_)
            | TokenKind::Segment(_) => {
                let path = self.parse_path()?;
                Ok(PartialName::Static(path_name(&path)))
            }
            _ => Err(self.expected("a partial name")),
        }
    }

    /// Turn a parsed head expression into a helper call. Helper names must be
    /// bare identifiers.
    fn call_from(
        &self,
        head: Expr,
        head_span: Span,
        params: Vec<Expr>,
        hash: Vec<HashPair>,
        position: Position,
    ) -> Result<Call, ParseError> {
        let name = match &head {
            Expr::Path(path) => path.simple_name().map(str::to_string),
            _ => None,
        };
        match name {
            Some(name) => Ok(Call {
                name,
                params,
                hash,
                position,
            }),
            None => Err(ParseError::at(
                head_span,
                "a helper name",
                describe_expr(&head),
            )),
        }
    }

    // =========================================================================
    // Whitespace control
    // =========================================================================

    /// Append content, applying a pending `~}}` and merging with a previous
    /// content node.
    fn push_content(&mut self, statements: &mut Vec<Statement>, text: String) {
        let text = if std::mem::take(&mut self.strip_next) {
            text.trim_start().to_string()
        } else {
            text
        };
        if text.is_empty() {
            return;
        }

        match statements.last_mut() {
            Some(Statement::Content(previous)) => previous.push_str(&text),
            _ => statements.push(Statement::Content(text)),
        }
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        static EOF: std::sync::LazyLock<Token> =
            std::sync::LazyLock::new(|| Token::new(TokenKind::Eof, Span::default()));
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    /// Kind of the token `n` places after the current one.
    fn peek_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().kind == *kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `~` written inside an opening delimiter, as in `{{~#if}}`. Tells
    /// `{{~^}}` apart from `{{^~}}`.
    fn eat_left_tilde(&mut self, open: Span) -> bool {
        let token = self.peek();
        if token.kind == TokenKind::Tilde && token.span.start < open.end {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `{{else ...}}` or `{{^}}`, with optional `~` markers.
    fn at_else(&self) -> bool {
        let mut n = 1;
        if self.peek_kind(n) == Some(&TokenKind::Tilde) {
            n += 1;
        }
        match self.peek().kind {
            TokenKind::Open(OpenKind::Plain) => {
                matches!(self.peek_kind(n), Some(TokenKind::Identifier(word)) if word == "else")
            }
            TokenKind::Open(OpenKind::Inverse) => {
                if self.peek_kind(n) == Some(&TokenKind::Tilde) {
                    n += 1;
                }
                matches!(self.peek_kind(n), Some(TokenKind::Close(_)))
            }
            _ => false,
        }
    }

    fn at_program_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Eof
                | TokenKind::Open(OpenKind::Close)
                | TokenKind::Open(OpenKind::RawClose)
        ) || self.at_else()
    }

    /// Run `parse` one nesting level deeper, refusing to go past
    /// `MAX_NESTING`.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::at(
                self.peek().span,
                format!("at most {MAX_NESTING} levels of nesting"),
                "a deeper one",
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect_close(&mut self, kind: CloseKind) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::Close(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(&format!("`{}`", kind.as_str())))
        }
    }

    fn expected(&self, what: &str) -> ParseError {
        let token = self.peek();
        ParseError::at(token.span, what, token.kind.to_string())
    }
}

/// Trim trailing whitespace from a final content node, dropping it if empty.
fn trim_last(statements: &mut Vec<Statement>) {
    if let Some(Statement::Content(text)) = statements.last_mut() {
        let len = text.trim_end().len();
        text.truncate(len);
        if text.is_empty() {
            statements.pop();
        }
    }
}

/// The program a close tag's `{{~` applies to: the last one in source order.
fn last_program_mut(block: &mut Block) -> &mut Template {
    match &mut block.inverse {
        Some(Inverse::Program(program)) => program,
        Some(Inverse::Chain(chained)) => last_program_mut(chained),
        None => &mut block.program,
    }
}

/// The name a path spells, as used for close tags and partial names.
pub(crate) fn path_name(path: &Path) -> String {
    let mut parts: Vec<&str> = vec![".."; path.depth];
    if path.this && path.segments.is_empty() {
        parts.push("this");
    }
    parts.extend(path.segments.iter().map(String::as_str));
    let joined = parts.join("/");
    if path.data {
        format!("@{joined}")
    } else {
        joined
    }
}

fn number_literal(text: String, span: Span) -> Result<Literal, ParseError> {
    if !text.contains('.') {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Literal::Integer(n));
        }
    }
    match text.parse::<f64>() {
        Ok(value) => Ok(Literal::Decimal { value, text }),
        Err(_) => Err(ParseError::at(span, "a number", format!("`{text}`"))),
    }
}

fn describe_expr(expr: &Expr) -> String {
    match expr {
        Expr::Path(path) => format!("path `{}`", path_name(path)),
        Expr::Literal(_) => "a literal".into(),
        Expr::SubExpression(_) => "a subexpression".into(),
    }
}

fn position(span: Span) -> Position {
    Position {
        line: span.line,
        column: span.column,
        offset: span.start,
    }
}

fn position_of(token: &Token) -> Position {
    position(token.span)
}
