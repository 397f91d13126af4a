//! The standard helper library: `if`, `unless`, `each`, `with`, `lookup`,
//! `log` and the `inline` decorator.
//!
//! Nothing here is special to the evaluator. The builtins are ordinary
//! registry entries, so registering a helper named `if` next to them is a
//! shadowing error like any other duplicate.

use std::sync::Arc;

use bmx_parser::Template;
use im::{OrdMap, Vector};

use crate::eval::{EvalState, Invocation};
use crate::function::{
    boolean, context, integer, list, many, map, named, optional, or, run, string, value, Arguments,
    FunctionError,
};
use crate::registry::{Helper, RegistryBuilder, StateTransform};
use crate::value::Value;

/// Add the builtins to `builder`.
pub fn install(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .helper("if", Helper::block(if_helper))
        .helper("unless", Helper::block(unless))
        .helper("each", Helper::block(each))
        .helper("with", Helper::block(with))
        .helper("lookup", Helper::value(lookup))
        .helper("log", Helper::value(log_helper))
        .decorator("inline", inline)
}

/// `cond includeZero=bool`: truthiness, optionally counting zero as true.
fn condition(args: &Arguments) -> Result<bool, FunctionError> {
    let (cond, include_zero) = run(args, (value, optional(named("includeZero", boolean))))?;
    let zero = match &cond {
        Value::Integer(n) => *n == 0,
        Value::Number(n) => *n == 0.0,
        _ => false,
    };
    Ok(cond.is_truthy() || (zero && include_zero.unwrap_or(false)))
}

fn choose(truthy: bool) -> Vec<Invocation> {
    if truthy {
        vec![Invocation::program()]
    } else {
        vec![Invocation::inverse()]
    }
}

fn if_helper(args: &Arguments) -> Result<Vec<Invocation>, FunctionError> {
    Ok(choose(condition(args)?))
}

fn unless(args: &Arguments) -> Result<Vec<Invocation>, FunctionError> {
    Ok(choose(!condition(args)?))
}

enum Items {
    List(Vector<Value>),
    Context(OrdMap<String, Value>),
    Other(Value),
}

/// Iterate a list or the entries of a context. Empty collections and
/// falsy values render the inverse.
fn each(args: &Arguments) -> Result<Vec<Invocation>, FunctionError> {
    let items = run(
        args,
        or(
            map(list, Items::List),
            or(map(context, Items::Context), map(value, Items::Other)),
        ),
    )?;

    match items {
        Items::List(items) if !items.is_empty() => {
            let last = items.len() - 1;
            Ok(items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    Invocation::program()
                        .with_this(item.clone())
                        .with_data("index", i as i64)
                        .with_data("first", i == 0)
                        .with_data("last", i == last)
                        .with_block_params(vec![item, Value::Integer(i as i64)])
                })
                .collect())
        }
        Items::Context(fields) if !fields.is_empty() => {
            let last = fields.len() - 1;
            Ok(fields
                .into_iter()
                .enumerate()
                .map(|(i, (key, item))| {
                    Invocation::program()
                        .with_this(item.clone())
                        .with_data("key", key.clone())
                        .with_data("index", i as i64)
                        .with_data("first", i == 0)
                        .with_data("last", i == last)
                        .with_block_params(vec![item, Value::String(key)])
                })
                .collect())
        }
        Items::Other(other) if other.is_truthy() => Err(FunctionError::Mismatch {
            combinator: "each",
            expected: "a list or a context".into(),
            found: other.describe(),
        }),
        _ => Ok(vec![Invocation::inverse()]),
    }
}

fn with(args: &Arguments) -> Result<Vec<Invocation>, FunctionError> {
    let this = run(args, value)?;
    if !this.is_truthy() {
        return Ok(vec![Invocation::inverse()]);
    }
    Ok(vec![Invocation::program()
        .with_this(this.clone())
        .with_block_params(vec![this])])
}

/// `lookup target key`: a context key or a list index.
fn lookup(args: &Arguments) -> Result<Value, FunctionError> {
    let (target, key) = run(
        args,
        (value, or(string, map(integer, |n: i64| n.to_string()))),
    )?;
    Ok(target.get(&key).cloned().unwrap_or_default())
}

fn log_helper(args: &Arguments) -> Result<Value, FunctionError> {
    let (values, level) = run(args, (many(value), optional(named("level", string))))?;
    let level = match level {
        Some(name) => name
            .parse::<log::Level>()
            .map_err(|_| FunctionError::Failed(format!("unknown log level `{name}`")))?,
        None => log::Level::Info,
    };

    let message = values
        .iter()
        .map(|v| v.to_output().unwrap_or_else(|| v.describe()))
        .collect::<Vec<_>>()
        .join(" ");
    log::log!(target: "bmx::template", level, "{message}");
    Ok(Value::String(String::new()))
}

/// `{{#*inline "name"}}body{{/inline}}` registers `body` as a partial for
/// the rest of the enclosing program.
fn inline(args: &Arguments, program: Option<&Template>) -> Result<StateTransform, FunctionError> {
    let name = run(args, string)?;
    let body = program.cloned().ok_or_else(|| {
        FunctionError::Failed(format!(
            "`inline` needs a body: {{{{#*inline \"{name}\"}}}}...{{{{/inline}}}}"
        ))
    })?;
    Ok(Box::new(move |state: EvalState| {
        state.with_partial(name, Arc::new(body))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Branch;
    use pretty_assertions::assert_eq;

    fn branches(plan: &[Invocation]) -> Vec<Branch> {
        plan.iter().map(|i| i.branch.clone()).collect()
    }

    #[test]
    fn test_if_include_zero() {
        let zero = Arguments::new(vec![Value::Integer(0)]);
        assert_eq!(branches(&if_helper(&zero).unwrap()), vec![Branch::Inverse]);

        let counted = zero.clone().with_param("includeZero", true);
        assert_eq!(branches(&if_helper(&counted).unwrap()), vec![Branch::Program]);
        assert_eq!(branches(&unless(&counted).unwrap()), vec![Branch::Inverse]);
    }

    #[test]
    fn test_if_rejects_extra_arguments() {
        let args = Arguments::new(vec![Value::Bool(true), Value::Bool(false)]);
        assert!(matches!(
            if_helper(&args),
            Err(FunctionError::TooManyArguments { .. })
        ));
    }

    #[test]
    fn test_each_over_list() {
        let args = Arguments::new(vec![Value::list([1i64, 2, 3])]);
        let plan = each(&args).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].this, Some(Value::Integer(1)));
        assert_eq!(plan[0].data.get("first"), Some(&Value::Bool(true)));
        assert_eq!(plan[2].data.get("last"), Some(&Value::Bool(true)));
        assert_eq!(plan[1].block_params, vec![Value::Integer(2), Value::Integer(1)]);
    }

    #[test]
    fn test_each_over_context_sets_key() {
        let args = Arguments::new(vec![Value::context([("a", 1i64), ("b", 2i64)])]);
        let plan = each(&args).unwrap();
        assert_eq!(plan[1].data.get("key"), Some(&Value::from("b")));
        assert_eq!(plan[1].block_params, vec![Value::Integer(2), Value::from("b")]);
    }

    #[test]
    fn test_each_empty_and_falsy_render_inverse() {
        for empty in [Value::list(Vec::<Value>::new()), Value::Undefined, Value::Bool(false)] {
            let plan = each(&Arguments::new(vec![empty])).unwrap();
            assert_eq!(branches(&plan), vec![Branch::Inverse]);
        }
    }

    #[test]
    fn test_each_rejects_scalars() {
        let err = each(&Arguments::new(vec![Value::Integer(5)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`each` expected a list or a context, found integer `5`"
        );
    }

    #[test]
    fn test_lookup_by_key_and_index() {
        let ctx = Value::context([("name", "ada")]);
        let args = Arguments::new(vec![ctx, Value::from("name")]);
        assert_eq!(lookup(&args).unwrap(), Value::from("ada"));

        let items = Value::list(["x", "y"]);
        let args = Arguments::new(vec![items, Value::Integer(1)]);
        assert_eq!(lookup(&args).unwrap(), Value::from("y"));
    }

    #[test]
    fn test_log_returns_empty_string() {
        let args = Arguments::new(vec![Value::from("hello"), Value::Integer(1)])
            .with_param("level", "debug");
        assert_eq!(log_helper(&args).unwrap(), Value::from(""));

        let bad = Arguments::new(vec![]).with_param("level", "loud");
        assert!(matches!(log_helper(&bad), Err(FunctionError::Failed(_))));
    }

    #[test]
    fn test_inline_requires_body() {
        let args = Arguments::new(vec![Value::from("row")]);
        assert!(inline(&args, None).is_err());
        assert!(inline(&args, Some(&Template::default())).is_ok());
    }
}
