//! BMX Parser
//!
//! Turns the token stream from `bmx-lexer` into an immutable `Template`
//! tree, and prints trees back to template source. The printer is the
//! inverse of the parser up to whitespace already consumed by `~`:
//!
//! ```text
//! source → Scanner::tokenize → Parser::parse → Template → to_text → source'
//! parse(source') == parse(source)
//! ```
//!
//! # Example
//!
//! ```
//! let template = bmx_parser::parse("Hello {{name}}!").unwrap();
//! assert_eq!(template.statements.len(), 3);
//! assert_eq!(template.to_text(), "Hello {{name}}!");
//! ```

pub mod ast;
pub mod parser;
pub mod printer;

pub use ast::{Expr, Position, Statement, Template};
pub use bmx_lexer::LexError;
pub use parser::Parser;

use bmx_lexer::{Scanner, Span};

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: expected {expected}, found {found}")]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset into the source.
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn at(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
            line: span.line,
            column: span.column,
            offset: span.start,
        }
    }
}

/// Any failure turning source text into a `Template`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    /// Byte offset of the failure in the source.
    pub fn offset(&self) -> usize {
        match self {
            SyntaxError::Lex(e) => e.offset,
            SyntaxError::Parse(e) => e.offset,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Lex(e) => e.line,
            SyntaxError::Parse(e) => e.line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            SyntaxError::Lex(e) => e.column,
            SyntaxError::Parse(e) => e.column,
        }
    }
}

/// Tokenize and parse template source. Lexing completes before parsing starts.
pub fn parse(source: &str) -> Result<Template, SyntaxError> {
    let tokens = Scanner::tokenize(source)?;
    log::trace!("lexed {} tokens", tokens.len());
    let template = Parser::parse(tokens)?;
    Ok(template)
}
