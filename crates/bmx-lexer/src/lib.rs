//! BMX Lexer
//!
//! Tokenizes Handlebars-compatible template source into a stream of tokens.
//! Literal text between tags becomes `Content`; everything between mustache
//! delimiters is split into identifiers, path pieces, literals and operators.
//! Comments and raw blocks are recognised here so that their interiors never
//! reach the mustache grammar.
//!
//! # Example
//!
//! ```
//! use bmx_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("Hello {{name}}!").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Content("Hello ".into()));
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{CloseKind, OpenKind, Span, Token, TokenKind};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lex error at line {line}, column {column}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset into the source.
    pub offset: usize,
}
