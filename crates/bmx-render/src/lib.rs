//! BMX Render
//!
//! Evaluates parsed templates against a context value.
//!
//! ```text
//! Template + Value + Registries → Walker<Effect> → Page
//! ```
//!
//! Helpers, partials and decorators come from `Registries`, which are
//! built once and shared read-only across renders. The builtin helpers
//! live in [`builtins`] and are registered like any other helper.
//!
//! # Example
//!
//! ```
//! use bmx_render::{builtins, render_source, Registries, RenderOptions, Value};
//!
//! let registries = builtins::install(Registries::builder()).build().unwrap();
//! let context = Value::context([("items", Value::list([1i64, 2, 3]))]);
//! let page = render_source(
//!     "{{#each items}}{{this}},{{/each}}",
//!     &context,
//!     &registries,
//!     &RenderOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(page.as_str(), "1,2,3,");
//! ```

pub mod builtins;
pub mod effect;
mod error;
pub mod escape;
pub mod eval;
pub mod function;
pub mod json;
pub mod registry;
pub mod scope;
pub mod value;

pub use effect::{Action, Async, Effect, Pure};
pub use error::{BmxError, EvalError};
pub use escape::{Escaper, RenderOptions};
pub use eval::{render, render_async, Branch, EvalState, Invocation, Page};
pub use function::{Arguments, FunctionError, Param};
pub use registry::{Helper, Registries, RegistryBuilder, StateTransform};
pub use value::{Kind, Value};

/// Parse and render `source` in one step.
pub fn render_source(
    source: &str,
    context: &Value,
    registries: &Registries,
    options: &RenderOptions,
) -> Result<Page, BmxError> {
    let template = bmx_parser::parse(source)?;
    Ok(render(&template, context, registries, options)?)
}
