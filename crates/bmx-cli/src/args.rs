//! Command-line argument definitions for the `bmx` binary.

use std::path::Path;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bmx")]
#[command(about = "BMX, a Handlebars-compatible template engine")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a template and print the result
    Render {
        /// Template file
        template: String,

        /// JSON file used as the root context
        #[arg(short, long)]
        data: Option<String>,

        /// Register a partial, as NAME=PATH or PATH (named after the file stem)
        #[arg(short, long = "partial", value_parser = parse_partial)]
        partials: Vec<PartialSpec>,

        /// Print `{{expr}}` output without HTML escaping
        #[arg(long)]
        no_escape: bool,
    },

    /// Check a template for syntax errors
    Check {
        /// Template file
        template: String,
    },

    /// Print a template in canonical form
    Fmt {
        /// Template file
        template: String,
    },
}

/// A `--partial` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSpec {
    pub name: String,
    pub path: String,
}

pub fn parse_partial(arg: &str) -> Result<PartialSpec, String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok(PartialSpec {
            name: name.to_string(),
            path: path.to_string(),
        }),
        Some(_) => Err(format!("expected NAME=PATH, got `{arg}`")),
        None => {
            let name = Path::new(arg)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| format!("cannot name a partial after `{arg}`"))?;
            Ok(PartialSpec {
                name: name.to_string(),
                path: arg.to_string(),
            })
        }
    }
}
