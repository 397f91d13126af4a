//! WASM bindings for BMX.
//!
//! Exposes `render()`, `format()`, `diagnose()` and `version()` to
//! JavaScript via wasm-bindgen. Contexts cross the boundary as JSON text.

use bmx_render::{builtins, json, Registries, RenderOptions};
use wasm_bindgen::prelude::*;

/// Render a template against a JSON context.
///
/// `partials` is an optional `{ name: source }` object. Throws a JS error
/// if any template fails to parse, the JSON is invalid, or rendering fails.
#[wasm_bindgen]
pub fn render(
    source: &str,
    context: &str,
    partials: Option<js_sys::Object>,
) -> Result<String, JsError> {
    let partials = match partials {
        Some(object) => partial_entries(&object)?,
        None => Vec::new(),
    };
    render_text(source, context, &partials).map_err(|e| JsError::new(&e))
}

/// Reprint a template in canonical form.
#[wasm_bindgen]
pub fn format(source: &str) -> Result<String, JsError> {
    format_text(source).map_err(|e| JsError::new(&e))
}

/// Check a template for syntax errors.
///
/// Returns `null` for a valid template, otherwise a JS object
/// `{ message, line, column, offset }`.
#[wasm_bindgen]
pub fn diagnose(source: &str) -> Result<JsValue, JsError> {
    let Err(err) = bmx_parser::parse(source) else {
        return Ok(JsValue::NULL);
    };

    let obj = js_sys::Object::new();
    let fields: [(&str, JsValue); 4] = [
        ("message", err.to_string().into()),
        ("line", (err.line() as u32).into()),
        ("column", (err.column() as u32).into()),
        ("offset", (err.offset() as u32).into()),
    ];
    for (key, value) in fields {
        js_sys::Reflect::set(&obj, &key.into(), &value)
            .map_err(|_| JsError::new(&format!("Failed to set {key} property")))?;
    }
    Ok(obj.into())
}

/// Get the engine version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn partial_entries(object: &js_sys::Object) -> Result<Vec<(String, String)>, JsError> {
    js_sys::Object::entries(object)
        .iter()
        .map(|entry| {
            let pair = js_sys::Array::from(&entry);
            match (pair.get(0).as_string(), pair.get(1).as_string()) {
                (Some(name), Some(source)) => Ok((name, source)),
                _ => Err(JsError::new("partials must map names to template strings")),
            }
        })
        .collect()
}

fn render_text(
    source: &str,
    context: &str,
    partials: &[(String, String)],
) -> Result<String, String> {
    let context = json::from_str(context).map_err(|e| format!("Invalid context JSON: {e}"))?;

    let mut builder = Registries::builder();
    for (name, partial) in partials {
        let template =
            bmx_parser::parse(partial).map_err(|e| format!("In partial `{name}`: {e}"))?;
        builder = builder.partial(name.as_str(), template);
    }
    let registries = builtins::install(builder)
        .build()
        .map_err(|e| e.to_string())?;

    bmx_render::render_source(source, &context, &registries, &RenderOptions::default())
        .map(|page| page.into_string())
        .map_err(|e| e.to_string())
}

fn format_text(source: &str) -> Result<String, String> {
    bmx_parser::parse(source)
        .map(|template| template.to_text())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Native tests: the JS-facing wrappers only convert errors, so the
    // pipeline is exercised through the plain Rust functions.

    #[test]
    fn test_render_with_json() {
        let out = render_text("Hello {{name}}!", r#"{"name": "World"}"#, &[]).unwrap();
        assert_eq!(out, "Hello World!");
    }

    #[test]
    fn test_render_with_partials() {
        let partials = vec![("item".to_string(), "<li>{{this}}</li>".to_string())];
        let out = render_text(
            "<ul>{{#each xs}}{{> item}}{{/each}}</ul>",
            r#"{"xs": [1, 2]}"#,
            &partials,
        )
        .unwrap();
        assert_eq!(out, "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn test_render_errors_are_messages() {
        let err = render_text("{{x}}", "{", &[]).unwrap_err();
        assert!(err.starts_with("Invalid context JSON"));

        let partials = vec![("bad".to_string(), "{{#if}}".to_string())];
        let err = render_text("", "{}", &partials).unwrap_err();
        assert!(err.starts_with("In partial `bad`"));

        let err = render_text("{{missing}}", "{}", &[]).unwrap_err();
        assert_eq!(err, "cannot print undefined value at line 1, column 1");
    }

    #[test]
    fn test_format() {
        assert!(format_text("{{#if x}}").is_err());
        assert_eq!(format_text("a {{& x}} b").unwrap(), "a {{{x}}} b");
    }

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        assert!(v.contains('.'));
    }
}
