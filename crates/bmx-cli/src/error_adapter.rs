//! Error adapter for converting `CliError` to miette diagnostics.
//!
//! Template errors carry a byte offset into their source, so they render
//! as a labelled snippet. Everything else is reported as a plain message.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use bmx_parser::SyntaxError;
use bmx_render::{BmxError, EvalError};

use crate::error::CliError;

/// Adapter for a template error, with the template text attached.
pub struct TemplateAdapter<'a> {
    error: &'a BmxError,
    src: NamedSource<String>,
}

impl<'a> TemplateAdapter<'a> {
    pub fn new(error: &'a BmxError, path: &str, text: &str) -> Self {
        Self {
            error,
            src: NamedSource::new(path, text.to_string()),
        }
    }

    fn label(&self) -> String {
        match self.error {
            BmxError::Syntax(SyntaxError::Parse(e)) => format!("expected {}", e.expected),
            BmxError::Syntax(SyntaxError::Lex(_)) => "here".to_string(),
            BmxError::Eval(_) => "while evaluating this tag".to_string(),
        }
    }
}

impl fmt::Debug for TemplateAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateAdapter")
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for TemplateAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.error, f)
    }
}

impl std::error::Error for TemplateAdapter<'_> {}

impl MietteDiagnostic for TemplateAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.error {
            BmxError::Syntax(_) => "bmx::syntax",
            BmxError::Eval(_) => "bmx::eval",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.error {
            BmxError::Eval(EvalError::UnknownPartial { .. }) => {
                "register partials with --partial NAME=PATH"
            }
            BmxError::Eval(EvalError::Unprintable { .. }) => {
                "guard optional values with {{#if}}, and iterate lists with {{#each}}"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let offset = self.error.offset()?;
        let len = usize::from(offset < self.src.inner().len());
        let span = SourceSpan::new(offset.into(), len);
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some(self.label()), span),
        )))
    }
}

/// Adapter for errors without a template position.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Io { .. } => "bmx::io",
            CliError::Json { .. } => "bmx::json",
            CliError::Registry(_) => "bmx::registry",
            CliError::Template { .. } => return None,
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    Template(TemplateAdapter<'a>),
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Template(t) => fmt::Display::fmt(t, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Template(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Template(t) => t.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Template(t) => t.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Template(t) => t.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Template(t) => t.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

pub fn to_reportable(err: &CliError) -> Reportable<'_> {
    match err {
        CliError::Template { path, text, error } => {
            Reportable::Template(TemplateAdapter::new(error, path, text))
        }
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template_error(text: &str) -> CliError {
        let error = match bmx_parser::parse(text) {
            Ok(template) => {
                let registries = bmx_render::Registries::default();
                let context = bmx_render::Value::Undefined;
                bmx_render::render(&template, &context, &registries, &Default::default())
                    .map(|_| ())
                    .map_err(BmxError::from)
            }
            Err(e) => Err(BmxError::from(e)),
        };
        CliError::Template {
            path: "page.hbs".into(),
            text: text.into(),
            error: error.unwrap_err(),
        }
    }

    #[test]
    fn test_parse_error_label() {
        let err = template_error("{{#foo}}x{{/bar}}");
        let reportable = to_reportable(&err);

        assert_eq!(reportable.code().unwrap().to_string(), "bmx::syntax");
        let labels: Vec<_> = reportable.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 12);
        assert_eq!(labels[0].label(), Some("expected `{{/foo}}`"));
    }

    #[test]
    fn test_eval_error_label_and_help() {
        let err = template_error("hi {{> card}}");
        let reportable = to_reportable(&err);

        assert_eq!(reportable.code().unwrap().to_string(), "bmx::eval");
        assert!(reportable.help().is_some());
        let labels: Vec<_> = reportable.labels().unwrap().collect();
        assert_eq!(labels[0].offset(), 3);
    }

    #[test]
    fn test_plain_errors_have_no_labels() {
        let err = CliError::Registry(EvalError::Shadowing {
            registry: "partial",
            name: "row".into(),
        });
        let reportable = to_reportable(&err);
        assert!(matches!(reportable, Reportable::Error(_)));
        assert!(reportable.labels().is_none());
        assert_eq!(reportable.to_string(), "duplicate partial `row`");
    }
}
