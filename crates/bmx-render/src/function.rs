//! Argument-matching combinators for helpers and decorators.
//!
//! A helper describes the arguments it accepts as a `Pattern` built from
//! small pieces, and `run` matches that pattern against the call's
//! positional values and hash params:
//!
//! ```
//! use bmx_render::function::{number, optional, run, string, Arguments};
//! use bmx_render::Value;
//!
//! let args = Arguments::new(vec![Value::from("x"), Value::Integer(5)]);
//! let (s, n) = run(&args, (string, optional(number))).unwrap();
//! assert_eq!((s.as_str(), n), ("x", Some(5.0)));
//! ```
//!
//! A `Cursor` is an immutable view of the inputs still to be consumed.
//! Every pattern takes a cursor by value and hands back a new one, so
//! backtracking in `or`, `optional` and `many` is just reusing the cursor
//! from before the attempt.

use im::{OrdMap, Vector};

use crate::value::{Kind, Value};

/// A named hash argument: `key=value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

/// The evaluated arguments of one helper or decorator call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    pub values: Vec<Value>,
    pub params: Vec<Param>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            params: Vec::new(),
        }
    }

    /// Add a hash param.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push(Param {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Failure inside the function runtime.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FunctionError {
    #[error("`{combinator}` expected {expected}, found {found}")]
    Mismatch {
        combinator: &'static str,
        expected: String,
        found: String,
    },

    #[error("missing hash parameter `{name}`")]
    MissingParam { name: String },

    #[error("too many arguments: helper received unexpected extra argument {found}")]
    TooManyArguments { found: String },

    #[error("effectful helper called during a pure render")]
    Suspended,

    #[error("{0}")]
    Failed(String),
}

/// The inputs a pattern has not consumed yet.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    values: &'a [Value],
    params: Vector<&'a Param>,
}

impl<'a> Cursor<'a> {
    pub fn new(args: &'a Arguments) -> Self {
        Self {
            values: &args.values,
            params: args.params.iter().collect(),
        }
    }

    fn remaining(&self) -> usize {
        self.values.len() + self.params.len()
    }
}

/// Result of one matching step: the output and the advanced cursor.
pub type Step<'a, O> = Result<(O, Cursor<'a>), FunctionError>;

/// Something that matches a prefix of the inputs and produces an `O`.
///
/// Implemented for every `Fn(Cursor) -> Step` and for tuples of patterns,
/// which match in sequence.
pub trait Pattern<'a, O> {
    fn apply(&self, cursor: Cursor<'a>) -> Step<'a, O>;
}

impl<'a, O, F> Pattern<'a, O> for F
where
    F: Fn(Cursor<'a>) -> Step<'a, O>,
{
    fn apply(&self, cursor: Cursor<'a>) -> Step<'a, O> {
        self(cursor)
    }
}

macro_rules! impl_sequence {
    ($($p:ident $o:ident),+) => {
        impl<'a, $($p, $o),+> Pattern<'a, ($($o,)+)> for ($($p,)+)
        where
            $($p: Pattern<'a, $o>),+
        {
            #[allow(non_snake_case)]
            fn apply(&self, cursor: Cursor<'a>) -> Step<'a, ($($o,)+)> {
                let ($($p,)+) = self;
                $(let ($o, cursor) = $p.apply(cursor)?;)+
                Ok((($($o,)+), cursor))
            }
        }
    };
}

impl_sequence!(A OA);
impl_sequence!(A OA, B OB);
impl_sequence!(A OA, B OB, C OC);
impl_sequence!(A OA, B OB, C OC, D OD);
impl_sequence!(A OA, B OB, C OC, D OD, E OE);

/// Match `pattern` against `args`, requiring every input to be consumed.
pub fn run<'a, O, P: Pattern<'a, O>>(args: &'a Arguments, pattern: P) -> Result<O, FunctionError> {
    let (output, rest) = pattern.apply(Cursor::new(args))?;

    if let Some(extra) = rest.values.first() {
        return Err(FunctionError::TooManyArguments {
            found: extra.describe(),
        });
    }
    if let Some(extra) = rest.params.front() {
        return Err(FunctionError::TooManyArguments {
            found: format!("hash parameter `{}`", extra.name),
        });
    }
    Ok(output)
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Consume the next positional value if `extract` accepts it.
fn take<'a, O>(
    cursor: Cursor<'a>,
    combinator: &'static str,
    expected: &str,
    extract: impl Fn(&Value) -> Option<O>,
) -> Step<'a, O> {
    let Some((first, rest)) = cursor.values.split_first() else {
        return Err(FunctionError::Mismatch {
            combinator,
            expected: expected.to_string(),
            found: "end of arguments".into(),
        });
    };
    match extract(first) {
        Some(output) => Ok((
            output,
            Cursor {
                values: rest,
                params: cursor.params,
            },
        )),
        None => Err(FunctionError::Mismatch {
            combinator,
            expected: expected.to_string(),
            found: first.describe(),
        }),
    }
}

/// Any one positional value.
pub fn value<'a>(cursor: Cursor<'a>) -> Step<'a, Value> {
    take(cursor, "value", "a value", |v| Some(v.clone()))
}

pub fn string<'a>(cursor: Cursor<'a>) -> Step<'a, String> {
    take(cursor, "string", "a string", |v| match v {
        Value::String(s) => Some(s.clone()),
        _ => None,
    })
}

/// An integer or a decimal number, widened to `f64`.
pub fn number<'a>(cursor: Cursor<'a>) -> Step<'a, f64> {
    take(cursor, "number", "a number", |v| match v {
        Value::Integer(n) => Some(*n as f64),
        Value::Number(n) => Some(*n),
        _ => None,
    })
}

pub fn integer<'a>(cursor: Cursor<'a>) -> Step<'a, i64> {
    take(cursor, "integer", "an integer", |v| match v {
        Value::Integer(n) => Some(*n),
        _ => None,
    })
}

pub fn boolean<'a>(cursor: Cursor<'a>) -> Step<'a, bool> {
    take(cursor, "boolean", "a boolean", |v| match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    })
}

pub fn list<'a>(cursor: Cursor<'a>) -> Step<'a, Vector<Value>> {
    take(cursor, "list", "a list", |v| match v {
        Value::List(items) => Some(items.clone()),
        _ => None,
    })
}

pub fn context<'a>(cursor: Cursor<'a>) -> Step<'a, OrdMap<String, Value>> {
    take(cursor, "context", "a context", |v| match v {
        Value::Context(map) => Some(map.clone()),
        _ => None,
    })
}

pub fn undef<'a>(cursor: Cursor<'a>) -> Step<'a, ()> {
    take(cursor, "undef", "undefined", |v| {
        (v.kind() == Kind::Undefined).then_some(())
    })
}

/// The hash param `name`, matched against `pattern` as if it were the only
/// positional value. The pattern must consume it.
pub fn named<'a, O, P>(name: &'static str, pattern: P) -> impl Fn(Cursor<'a>) -> Step<'a, O>
where
    P: Pattern<'a, O>,
{
    move |cursor: Cursor<'a>| {
        let index = cursor
            .params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| FunctionError::MissingParam { name: name.into() })?;
        let found: &'a Param = cursor.params[index];

        let inner = Cursor {
            values: std::slice::from_ref(&found.value),
            params: Vector::new(),
        };
        let (output, rest) = pattern.apply(inner)?;
        if rest.remaining() != 0 {
            return Err(FunctionError::Mismatch {
                combinator: "named",
                expected: format!("a matching value for `{name}`"),
                found: found.value.describe(),
            });
        }

        let mut params = cursor.params;
        params.remove(index);
        Ok((
            output,
            Cursor {
                values: cursor.values,
                params,
            },
        ))
    }
}

/// The hash param `name`, whatever its kind.
pub fn param<'a>(name: &'static str) -> impl Fn(Cursor<'a>) -> Step<'a, Value> {
    named(name, value)
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// `pattern` or nothing.
pub fn optional<'a, O, P>(pattern: P) -> impl Fn(Cursor<'a>) -> Step<'a, Option<O>>
where
    P: Pattern<'a, O>,
{
    move |cursor: Cursor<'a>| match pattern.apply(cursor.clone()) {
        Ok((output, rest)) => Ok((Some(output), rest)),
        Err(_) => Ok((None, cursor)),
    }
}

/// Zero or more repetitions of `pattern`. Stops at the first failure or
/// at a match that consumed nothing.
pub fn many<'a, O, P>(pattern: P) -> impl Fn(Cursor<'a>) -> Step<'a, Vec<O>>
where
    P: Pattern<'a, O>,
{
    move |mut cursor: Cursor<'a>| {
        let mut outputs = Vec::new();
        while let Ok((output, rest)) = pattern.apply(cursor.clone()) {
            if rest.remaining() == cursor.remaining() {
                break;
            }
            outputs.push(output);
            cursor = rest;
        }
        Ok((outputs, cursor))
    }
}

/// `a`, or else `b` run against the original inputs.
pub fn or<'a, O, A, B>(a: A, b: B) -> impl Fn(Cursor<'a>) -> Step<'a, O>
where
    A: Pattern<'a, O>,
    B: Pattern<'a, O>,
{
    move |cursor: Cursor<'a>| a.apply(cursor.clone()).or_else(|_| b.apply(cursor))
}

/// Transform the output of `pattern`.
pub fn map<'a, O, T, P, F>(pattern: P, f: F) -> impl Fn(Cursor<'a>) -> Step<'a, T>
where
    P: Pattern<'a, O>,
    F: Fn(O) -> T,
{
    move |cursor: Cursor<'a>| {
        let (output, rest) = pattern.apply(cursor)?;
        Ok((f(output), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(values: Vec<Value>) -> Arguments {
        Arguments::new(values)
    }

    #[test]
    fn test_string_then_number() {
        let ok = args(vec![Value::from("x"), Value::Integer(5)]);
        assert_eq!(run(&ok, (string, number)).unwrap(), ("x".to_string(), 5.0));

        let swapped = args(vec![Value::Integer(5), Value::from("x")]);
        let err = run(&swapped, (string, number)).unwrap_err();
        assert_eq!(
            err,
            FunctionError::Mismatch {
                combinator: "string",
                expected: "a string".into(),
                found: "integer `5`".into(),
            }
        );
    }

    #[test]
    fn test_kind_restricted_primitives() {
        let a = args(vec![
            Value::Bool(true),
            Value::list([1i64]),
            Value::context([("k", 1i64)]),
            Value::Undefined,
            Value::Number(1.5),
        ]);
        let (b, l, c, (), n) = run(&a, (boolean, list, context, undef, number)).unwrap();
        assert!(b);
        assert_eq!(l.len(), 1);
        assert_eq!(c.get("k"), Some(&Value::Integer(1)));
        assert_eq!(n, 1.5);

        assert!(run(&args(vec![Value::Number(1.5)]), integer).is_err());
    }

    #[test]
    fn test_extra_positional_argument() {
        let a = args(vec![Value::from("x"), Value::from("y")]);
        let err = run(&a, string).unwrap_err();
        assert!(err.to_string().contains("too many arguments"));
        assert!(err.to_string().contains("unexpected extra argument"));
    }

    #[test]
    fn test_extra_hash_param() {
        let a = args(vec![Value::from("x")]).with_param("loud", true);
        let err = run(&a, string).unwrap_err();
        assert_eq!(
            err,
            FunctionError::TooManyArguments {
                found: "hash parameter `loud`".into()
            }
        );
    }

    #[test]
    fn test_named_params_in_any_order() {
        let a = Arguments::default()
            .with_param("b", 2i64)
            .with_param("a", "one");
        let (a_val, b_val) = run(&a, (named("a", string), named("b", integer))).unwrap();
        assert_eq!((a_val.as_str(), b_val), ("one", 2));
    }

    #[test]
    fn test_missing_and_mismatched_param() {
        let a = Arguments::default().with_param("level", 3i64);
        assert_eq!(
            run(&a, named("other", string)).unwrap_err(),
            FunctionError::MissingParam {
                name: "other".into()
            }
        );
        assert!(matches!(
            run(&a, named("level", string)).unwrap_err(),
            FunctionError::Mismatch { .. }
        ));
        assert_eq!(run(&a, param("level")).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_optional_param_left_unconsumed_on_mismatch() {
        // the mismatching param stays behind and is reported as extra
        let a = Arguments::default().with_param("flag", "yes");
        let err = run(&a, optional(named("flag", boolean))).unwrap_err();
        assert!(matches!(err, FunctionError::TooManyArguments { .. }));
    }

    #[test]
    fn test_named_must_consume_its_value() {
        let a = Arguments::default().with_param("x", 5i64);
        let err = run(&a, named("x", optional(string))).unwrap_err();
        assert_eq!(
            err,
            FunctionError::Mismatch {
                combinator: "named",
                expected: "a matching value for `x`".into(),
                found: "integer `5`".into(),
            }
        );

        let b = Arguments::default().with_param("x", "five");
        assert_eq!(
            run(&b, named("x", optional(string))).unwrap(),
            Some("five".to_string())
        );
    }

    #[test]
    fn test_or_restores_cursor_for_second_branch() {
        // the first branch consumes a string before failing on the number
        let a = args(vec![Value::from("x"), Value::from("y")]);
        let first = map((string, number), |(s, _): (String, f64)| vec![s]);
        let second = map((string, string), |(x, y): (String, String)| vec![x, y]);
        let out = run(&a, or(first, second)).unwrap();
        assert_eq!(out, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_or_reports_second_failure() {
        let a = args(vec![Value::Bool(true)]);
        let err = run(&a, or(map(string, Value::String), map(number, Value::Number))).unwrap_err();
        assert!(matches!(err, FunctionError::Mismatch { combinator: "number", .. }));
    }

    #[test]
    fn test_many_stops_without_consuming_failure() {
        let a = args(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::from("rest"),
        ]);
        let (numbers, rest) = run(&a, (many(integer), string)).unwrap();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(rest, "rest");
    }

    #[test]
    fn test_many_of_optional_terminates() {
        let a = args(vec![Value::from("x")]);
        let (found, s) = run(&a, (many(optional(integer)), string)).unwrap();
        assert!(found.is_empty());
        assert_eq!(s, "x");
    }

    #[test]
    fn test_end_of_arguments() {
        let err = run(&Arguments::default(), value).unwrap_err();
        assert_eq!(
            err,
            FunctionError::Mismatch {
                combinator: "value",
                expected: "a value".into(),
                found: "end of arguments".into(),
            }
        );
    }
}
