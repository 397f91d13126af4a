use bmx_render::{BmxError, EvalError};

/// Everything that can stop a `bmx` command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON in `{path}`: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    /// A template failed to parse or render. Keeps the template text so the
    /// report can point into it.
    #[error("{error}")]
    Template {
        path: String,
        text: String,
        error: BmxError,
    },

    #[error(transparent)]
    Registry(#[from] EvalError),
}
