//! Abstract Syntax Tree for BMX templates.
//!
//! The tree is immutable once parsed. Comments never reach it and
//! whitespace control has already been applied to its `Content` nodes.

// ---------------------------------------------------------------------------
// Templates and statements
// ---------------------------------------------------------------------------

/// A parsed template, or the body of a block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub statements: Vec<Statement>,
}

impl Template {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A node in a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Literal text, copied to the output verbatim.
    Content(String),

    /// `{{expr}}`, `{{{expr}}}` or `{{& expr}}`.
    Mustache(Mustache),

    /// `{{#name ...}}...{{/name}}`, its inverted and raw forms.
    Block(Block),

    /// `{{> name}}` and `{{#> name}}...{{/name}}`.
    Partial(Partial),

    /// `{{* name}}` and `{{#* name}}...{{/name}}`.
    Decorator(Decorator),
}

/// Source location of a tag.
///
/// Positions are metadata: two nodes that differ only in where they were
/// written compare equal, so a re-parsed printout equals the original tree.
/// Every `Position` equals every other, which keeps `Eq` lawful. Code that
/// cares about the location itself compares `offset`, `line` and `column`.
#[derive(Debug, Clone, Copy, Default, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl PartialEq for Position {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Whitespace-control markers on one tag: `{{~` and `~}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Strip {
    /// `~` after the opening delimiter: trims whitespace before the tag.
    pub open: bool,
    /// `~` before the closing delimiter: trims whitespace after the tag.
    pub close: bool,
}

/// A value-printing tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Mustache {
    pub expr: Expr,
    /// `{{x}}` is escaped, `{{{x}}}` and `{{& x}}` are not.
    pub escaped: bool,
    pub strip: Strip,
    pub position: Position,
}

/// Distinguishes the three block syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `{{#name}}`
    Normal,
    /// `{{^name}}`: the body is the inverse program.
    Inverted,
    /// `{{{{name}}}}`: the body is one verbatim `Content`.
    Raw,
}

/// A block helper invocation with its main and inverse programs.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub call: Call,
    /// Names bound by `as |a b|`.
    pub block_params: Vec<String>,
    pub program: Template,
    pub inverse: Option<Inverse>,
    pub kind: BlockKind,
    pub open_strip: Strip,
    /// Markers on the `{{else}}` tag, if any.
    pub inverse_strip: Strip,
    pub close_strip: Strip,
    pub position: Position,
}

/// The `{{else}}` side of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Inverse {
    Program(Template),
    /// `{{else name args}}`: a nested block sharing the outer close tag.
    Chain(Box<Block>),
}

/// A partial invocation, optionally with a block body.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub name: PartialName,
    /// Explicit context argument.
    pub context: Option<Expr>,
    pub hash: Vec<HashPair>,
    /// Body of a `{{#> name}}` partial block.
    pub block: Option<Template>,
    pub strip: Strip,
    pub close_strip: Strip,
    pub position: Position,
}

/// How a partial is named.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialName {
    /// A path or quoted name, resolved at parse time.
    Static(String),
    /// `{{> (helper args)}}`, resolved by evaluation.
    Dynamic(Box<Call>),
}

/// A decorator, standalone or in block form.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub call: Call,
    pub program: Option<Template>,
    pub strip: Strip,
    pub close_strip: Strip,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// An expression inside a tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(Path),
    Literal(Literal),
    /// A helper call: `(name args key=value)`. At the top of a mustache the
    /// parentheses are implied: `{{name args}}`.
    SubExpression(Box<Call>),
}

/// A helper name applied to positional and hash arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub params: Vec<Expr>,
    pub hash: Vec<HashPair>,
    pub position: Position,
}

impl Call {
    pub fn has_arguments(&self) -> bool {
        !self.params.is_empty() || !self.hash.is_empty()
    }
}

/// One `key=value` hash argument.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: String,
    pub value: Expr,
}

/// A reference into the context stack, data frame or block params.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// `@name`: looked up in the data frame.
    pub data: bool,
    /// Number of `../` hops.
    pub depth: usize,
    /// Written with a leading `this` or `.`; never dispatched as a helper.
    pub this: bool,
    pub segments: Vec<String>,
}

impl Path {
    /// A bare single-name path such as `foo`, which may name a helper.
    pub fn simple_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [name] if !self.data && !self.this && self.depth == 0 => Some(name),
            _ => None,
        }
    }
}

/// A literal value written in the template.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    /// A decimal literal, kept with its original spelling.
    Decimal { value: f64, text: String },
    Boolean(bool),
    Undefined,
    Null,
}
