//! CLI logic for the `bmx` template engine.
//!
//! Each command reads its files, runs the library pipeline and returns the
//! text to print. Failures come back as `CliError` for `main` to report.

pub mod error_adapter;

mod args;
mod error;

pub use args::{parse_partial, Args, Command, PartialSpec};
pub use error::CliError;

use std::fs;

use log::{debug, info};

use bmx_parser::Template;
use bmx_render::{builtins, json, Escaper, Page, Registries, RenderOptions, Value};

/// Run one `bmx` command and return its standard output.
pub fn run(args: &Args) -> Result<String, CliError> {
    match &args.command {
        Command::Render {
            template,
            data,
            partials,
            no_escape,
        } => render(template, data.as_deref(), partials, *no_escape),
        Command::Check { template } => {
            load_template(template)?;
            Ok(format!("OK: {template}\n"))
        }
        Command::Fmt { template } => {
            let (_, parsed) = load_template(template)?;
            Ok(parsed.to_text())
        }
    }
}

fn render(
    path: &str,
    data: Option<&str>,
    partials: &[PartialSpec],
    no_escape: bool,
) -> Result<String, CliError> {
    let (text, template) = load_template(path)?;

    let context = match data {
        Some(data_path) => {
            let raw = read(data_path)?;
            json::from_str(&raw).map_err(|source| CliError::Json {
                path: data_path.to_string(),
                source,
            })?
        }
        None => Value::context(std::iter::empty::<(String, Value)>()),
    };

    let mut builder = Registries::builder();
    for spec in partials {
        let (_, partial) = load_template(&spec.path)?;
        debug!("registering partial `{}` from {}", spec.name, spec.path);
        builder = builder.partial(spec.name.as_str(), partial);
    }
    let registries = builtins::install(builder).build()?;

    let options = RenderOptions {
        escape: if no_escape {
            Escaper::None
        } else {
            Escaper::Html
        },
    };

    info!("rendering {path}");
    bmx_render::render(&template, &context, &registries, &options)
        .map(Page::into_string)
        .map_err(|error| CliError::Template {
            path: path.to_string(),
            text,
            error: error.into(),
        })
}

fn read(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

/// Read and parse a template, keeping its text for error reports.
fn load_template(path: &str) -> Result<(String, Template), CliError> {
    let text = read(path)?;
    match bmx_parser::parse(&text) {
        Ok(template) => Ok((text, template)),
        Err(error) => Err(CliError::Template {
            path: path.to_string(),
            text,
            error: error.into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn write(dir: &Path, name: &str, text: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn render_args(template: String, data: Option<String>, partials: Vec<PartialSpec>) -> Args {
        Args {
            command: Command::Render {
                template,
                data,
                partials,
                no_escape: false,
            },
            log_level: "off".into(),
        }
    }

    #[test]
    fn test_render_with_data_and_partials() {
        let dir = tempfile::tempdir().unwrap();
        let template = write(
            dir.path(),
            "page.hbs",
            "<ul>{{#each items}}{{> item}}{{/each}}</ul>",
        );
        let data = write(dir.path(), "data.json", r#"{"items": ["a", "<b>"]}"#);
        let item = write(dir.path(), "item.hbs", "<li>{{this}}</li>");

        let args = render_args(
            template,
            Some(data),
            vec![parse_partial(&item).unwrap()],
        );
        assert_eq!(
            run(&args).unwrap(),
            "<ul><li>a</li><li>&lt;b&gt;</li></ul>"
        );
    }

    #[test]
    fn test_check_and_fmt() {
        let dir = tempfile::tempdir().unwrap();
        let template = write(dir.path(), "t.hbs", "{{& name}}{{#if x}}a{{^}}b{{/if}}");

        let check = Args {
            command: Command::Check {
                template: template.clone(),
            },
            log_level: "off".into(),
        };
        assert!(run(&check).unwrap().starts_with("OK: "));

        let fmt = Args {
            command: Command::Fmt { template },
            log_level: "off".into(),
        };
        assert_eq!(run(&fmt).unwrap(), "{{{name}}}{{#if x}}a{{else}}b{{/if}}");
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.hbs").to_string_lossy().into_owned();
        let err = run(&render_args(missing, None, vec![])).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));

        let template = write(dir.path(), "t.hbs", "{{name}}");
        let data = write(dir.path(), "bad.json", "{");
        let err = run(&render_args(template.clone(), Some(data), vec![])).unwrap_err();
        assert!(matches!(err, CliError::Json { .. }));

        let err = run(&render_args(template, None, vec![])).unwrap_err();
        assert!(matches!(err, CliError::Template { .. }));
    }

    #[test]
    fn test_duplicate_partial_names() {
        let dir = tempfile::tempdir().unwrap();
        let template = write(dir.path(), "t.hbs", "x");
        let a = write(dir.path(), "a.hbs", "a");
        let partials = vec![
            parse_partial(&format!("row={a}")).unwrap(),
            parse_partial(&format!("row={a}")).unwrap(),
        ];
        let err = run(&render_args(template, None, partials)).unwrap_err();
        assert_eq!(err.to_string(), "duplicate partial `row`");
    }
}
