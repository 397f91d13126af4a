//! Template printer.
//!
//! Walks a `Template` and writes equivalent source. Output is canonical:
//! `{{& x}}` prints as `{{{x}}}`, `{{^}}` as `{{else}}`, and comments are
//! gone, but re-parsing the printout always yields an equal tree. Empty
//! comments appear only where content could not be written otherwise.

use std::fmt;

use crate::ast::{
    Block, BlockKind, Call, Decorator, Expr, HashPair, Inverse, Literal, Mustache, Partial,
    PartialName, Path, Statement, Strip, Template,
};
use bmx_lexer::token::is_identifier;

impl Template {
    /// Print the template back to source text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        write_program(&self.statements, &mut out, true);
        out
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_expr(self, &mut out);
        f.write_str(&out)
    }
}

fn write_program(statements: &[Statement], out: &mut String, top_level: bool) {
    for (i, statement) in statements.iter().enumerate() {
        // everything inside a block is followed by at least its close tag
        let before_tag = !top_level || i + 1 < statements.len();
        write_statement(statement, out, before_tag);
    }
}

fn write_statement(statement: &Statement, out: &mut String, before_tag: bool) {
    match statement {
        Statement::Content(text) => write_content(text, out, before_tag),
        Statement::Mustache(m) => write_mustache(m, out),
        Statement::Block(block) => write_block(block, out),
        Statement::Partial(partial) => write_partial(partial, out),
        Statement::Decorator(decorator) => write_decorator(decorator, out),
    }
}

/// Literal `{{` needs its backslash escape back, and a backslash right in
/// front of a tag has to be doubled.
///
/// Two endings have no escape of their own. A backslash before a literal
/// `{{` is closed off with an empty comment, and a `{` before a tag is
/// kept off the tag's braces by a space that a `{{~!}}` trims again. The
/// parser merges content across comments, so neither leaves a trace.
fn write_content(text: &str, out: &mut String, before_tag: bool) {
    let mut pieces = text.split("{{").peekable();
    while let Some(piece) = pieces.next() {
        out.push_str(piece);
        if pieces.peek().is_some() {
            if piece.ends_with('\\') {
                out.push_str("\\{{!}}");
            }
            out.push_str("\\{{");
        }
    }
    if before_tag {
        if text.ends_with('\\') {
            out.push('\\');
        } else if text.ends_with('{') {
            out.push_str(" {{~!}}");
        }
    }
}

fn write_mustache(m: &Mustache, out: &mut String) {
    open(out, m.strip, "");
    if !m.escaped {
        out.push('{');
    }
    match &m.expr {
        Expr::SubExpression(call) if call.has_arguments() => write_call(call, out),
        expr => write_expr(expr, out),
    }
    if !m.escaped {
        out.push('}');
    }
    close(out, m.strip);
}

fn write_block(block: &Block, out: &mut String) {
    match block.kind {
        BlockKind::Raw => {
            out.push_str("{{{{");
            write_call(&block.call, out);
            out.push_str("}}}}");
            for statement in &block.program.statements {
                if let Statement::Content(text) = statement {
                    out.push_str(text);
                }
            }
            out.push_str("{{{{/");
            out.push_str(&block.call.name);
            out.push_str("}}}}");
        }
        BlockKind::Normal => {
            write_block_open(block, "#", out);
            write_program(&block.program.statements, out, false);
            write_inverse(block, out);
            write_close(&block.call.name, block.close_strip, out);
        }
        BlockKind::Inverted => {
            write_block_open(block, "^", out);
            if let Some(Inverse::Program(inverse)) = &block.inverse {
                write_program(&inverse.statements, out, false);
            }
            if !block.program.is_empty() || block.inverse_strip != Strip::default() {
                open(out, block.inverse_strip, "");
                out.push_str("else");
                close(out, block.inverse_strip);
                write_program(&block.program.statements, out, false);
            }
            write_close(&block.call.name, block.close_strip, out);
        }
    }
}

fn write_block_open(block: &Block, sigil: &str, out: &mut String) {
    open(out, block.open_strip, sigil);
    write_call(&block.call, out);
    write_block_params(&block.block_params, out);
    close(out, block.open_strip);
}

/// Write the `{{else}}` side of a normal block, following chains.
fn write_inverse(block: &Block, out: &mut String) {
    match &block.inverse {
        None => {}
        Some(Inverse::Program(program)) => {
            open(out, block.inverse_strip, "");
            out.push_str("else");
            close(out, block.inverse_strip);
            write_program(&program.statements, out, false);
        }
        Some(Inverse::Chain(chained)) => {
            open(out, chained.open_strip, "");
            out.push_str("else ");
            write_call(&chained.call, out);
            write_block_params(&chained.block_params, out);
            close(out, chained.open_strip);
            write_program(&chained.program.statements, out, false);
            write_inverse(chained, out);
        }
    }
}

fn write_block_params(names: &[String], out: &mut String) {
    if !names.is_empty() {
        out.push_str(" as |");
        out.push_str(&names.join(" "));
        out.push('|');
    }
}

fn write_partial(partial: &Partial, out: &mut String) {
    let sigil = if partial.block.is_some() { "#>" } else { ">" };
    open(out, partial.strip, sigil);
    out.push(' ');
    match &partial.name {
        PartialName::Static(name) if is_bare_partial_name(name) => out.push_str(name),
        PartialName::Static(name) => write_string(name, out),
        PartialName::Dynamic(call) => {
            out.push('(');
            write_call(call, out);
            out.push(')');
        }
    }
    if let Some(context) = &partial.context {
        out.push(' ');
        write_expr(context, out);
    }
    write_hash(&partial.hash, out);
    close(out, partial.strip);

    if let Some(body) = &partial.block {
        write_program(&body.statements, out, false);
        let name = match &partial.name {
            PartialName::Static(name) => name.as_str(),
            PartialName::Dynamic(call) => call.name.as_str(),
        };
        write_close(name, partial.close_strip, out);
    }
}

fn write_decorator(decorator: &Decorator, out: &mut String) {
    let sigil = if decorator.program.is_some() { "#*" } else { "*" };
    open(out, decorator.strip, sigil);
    write_call(&decorator.call, out);
    close(out, decorator.strip);

    if let Some(body) = &decorator.program {
        write_program(&body.statements, out, false);
        write_close(&decorator.call.name, decorator.close_strip, out);
    }
}

fn write_close(name: &str, strip: Strip, out: &mut String) {
    open(out, strip, "/");
    out.push_str(name);
    close(out, strip);
}

fn open(out: &mut String, strip: Strip, sigil: &str) {
    out.push_str("{{");
    if strip.open {
        out.push('~');
    }
    out.push_str(sigil);
}

fn close(out: &mut String, strip: Strip) {
    if strip.close {
        out.push('~');
    }
    out.push_str("}}");
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Write `name arg key=value` without the surrounding parentheses.
fn write_call(call: &Call, out: &mut String) {
    out.push_str(&call.name);
    for param in &call.params {
        out.push(' ');
        write_expr(param, out);
    }
    write_hash(&call.hash, out);
}

fn write_hash(hash: &[HashPair], out: &mut String) {
    for pair in hash {
        out.push(' ');
        out.push_str(&pair.key);
        out.push('=');
        write_expr(&pair.value, out);
    }
}

fn write_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Path(path) => write_path(path, out),
        Expr::Literal(literal) => write_literal(literal, out),
        Expr::SubExpression(call) => {
            out.push('(');
            write_call(call, out);
            out.push(')');
        }
    }
}

fn write_path(path: &Path, out: &mut String) {
    if path.data {
        out.push('@');
    }
    if path.depth > 0 {
        if path.segments.is_empty() {
            out.push_str(&vec![".."; path.depth].join("/"));
            return;
        }
        out.push_str(&"../".repeat(path.depth));
    } else if path.this {
        out.push_str("this");
        if path.segments.is_empty() {
            return;
        }
        out.push('.');
    }

    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        if is_identifier(segment) {
            out.push_str(segment);
        } else {
            out.push('[');
            out.push_str(segment);
            out.push(']');
        }
    }
}

fn write_literal(literal: &Literal, out: &mut String) {
    match literal {
        Literal::String(s) => write_string(s, out),
        Literal::Integer(n) => out.push_str(&n.to_string()),
        Literal::Decimal { text, .. } => out.push_str(text),
        Literal::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Undefined => out.push_str("undefined"),
        Literal::Null => out.push_str("null"),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Partial names like `card`, `dir/card` or `@partial-block` print unquoted.
fn is_bare_partial_name(name: &str) -> bool {
    let name = name.strip_prefix('@').unwrap_or(name);
    name.split('/').all(is_identifier)
}
