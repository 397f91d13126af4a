use bmx_render::function::{run, string, value, FunctionError};
use bmx_render::{
    builtins, render_source, BmxError, Escaper, EvalError, Helper, Invocation, Kind, Registries,
    RegistryBuilder, RenderOptions, Value,
};
use pretty_assertions::assert_eq;

fn registries() -> Registries {
    with_builtins(Registries::builder())
}

fn with_builtins(builder: RegistryBuilder) -> Registries {
    builtins::install(builder).build().unwrap()
}

fn render(source: &str, context: &Value, registries: &Registries) -> Result<String, BmxError> {
    render_source(source, context, registries, &RenderOptions::default()).map(|p| p.into_string())
}

fn render_ok(source: &str, context: Value) -> String {
    render(source, &context, &registries()).unwrap()
}

fn eval_err(source: &str, context: Value, registries: &Registries) -> EvalError {
    match render(source, &context, registries) {
        Err(BmxError::Eval(err)) => err,
        other => panic!("expected an evaluation error, got {other:?}"),
    }
}

fn upper() -> Helper {
    Helper::value(|args| Ok(Value::from(run(args, string)?.to_uppercase())))
}

// ---------------------------------------------------------------------------
// Mustaches and paths
// ---------------------------------------------------------------------------

#[test]
fn test_hello_world() {
    let context = Value::context([("name", "World")]);
    assert_eq!(render_ok("Hello {{name}}!", context), "Hello World!");
}

#[test]
fn test_nested_paths_and_literal_segments() {
    let context = Value::context([
        ("user", Value::context([("first name", "Ada")])),
        ("items", Value::list(["a", "b"])),
    ]);
    assert_eq!(
        render_ok("{{user.[first name]}} {{items.[1]}} {{user/[first name]}}", context),
        "Ada b Ada"
    );
}

#[test]
fn test_numbers_and_booleans_print() {
    let context = Value::context([
        ("n", Value::Integer(3)),
        ("x", Value::Number(1.5)),
        ("b", Value::Bool(false)),
    ]);
    assert_eq!(render_ok("{{n}} {{x}} {{b}}", context), "3 1.5 false");
}

#[test]
fn test_undefined_is_an_error() {
    let err = eval_err("a\n  {{missing}}", Value::context([("x", 1i64)]), &registries());
    match err {
        EvalError::Unprintable { kind, position } => {
            assert_eq!(kind, Kind::Undefined);
            assert_eq!((position.line, position.column), (2, 3));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_lists_and_contexts_do_not_print() {
    let context = Value::context([
        ("xs", Value::list([1i64])),
        ("user", Value::context([("name", "ada")])),
    ]);
    let err = eval_err("{{xs}}", context.clone(), &registries());
    assert!(matches!(err, EvalError::Unprintable { kind: Kind::List, .. }));
    let err = eval_err("{{user}}", context, &registries());
    assert!(matches!(err, EvalError::Unprintable { kind: Kind::Context, .. }));
}

#[test]
fn test_escaping() {
    let context = Value::context([("s", "<b>\"hi\" & 'bye'</b>")]);
    assert_eq!(
        render_ok("{{s}}", context.clone()),
        "&lt;b&gt;&quot;hi&quot; &amp; &#x27;bye&#x27;&lt;/b&gt;"
    );
    assert_eq!(render_ok("{{{s}}}", context.clone()), "<b>\"hi\" & 'bye'</b>");
    assert_eq!(render_ok("{{& s}}", context.clone()), "<b>\"hi\" & 'bye'</b>");

    let options = RenderOptions {
        escape: Escaper::None,
    };
    let page = render_source("{{s}}", &context, &registries(), &options).unwrap();
    assert_eq!(page.as_str(), "<b>\"hi\" & 'bye'</b>");
}

#[test]
fn test_escaped_mustache_in_content() {
    let context = Value::context([("x", "1")]);
    assert_eq!(render_ok("\\{{x}} {{x}}", context), "{{x}} 1");
}

#[test]
fn test_whitespace_control() {
    let context = Value::context([("x", "1")]);
    assert_eq!(render_ok("a   {{~x~}}   b", context), "a1b");
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[test]
fn test_helper_call_and_subexpression() {
    let registries = with_builtins(Registries::builder().helper("upper", upper()));
    let context = Value::context([("name", "ada"), ("key", "name")]);
    assert_eq!(
        render("{{upper name}} {{upper (lookup this key)}}", &context, &registries).unwrap(),
        "ADA ADA"
    );
}

#[test]
fn test_bare_name_dispatches_to_helper() {
    let registries = with_builtins(
        Registries::builder().helper("greeting", Helper::value(|_| Ok(Value::from("hi")))),
    );
    let context = Value::context([("greeting", "from context")]);
    assert_eq!(
        render("{{greeting}} {{this.greeting}} {{./greeting}}", &context, &registries).unwrap(),
        "hi from context from context"
    );
}

#[test]
fn test_extra_arguments_are_an_error() {
    let err = eval_err("{{#if a b}}x{{/if}}", Value::context([("a", true)]), &registries());
    match err {
        EvalError::Helper { name, source, .. } => {
            assert_eq!(name, "if");
            assert!(matches!(source, FunctionError::TooManyArguments { .. }));
            let message = source.to_string();
            assert!(message.contains("too many arguments"));
            assert!(message.contains("unexpected extra argument"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_helper_kind_mismatch() {
    let registries = with_builtins(Registries::builder().helper("upper", upper()));
    let err = eval_err("{{upper 5}}", Value::Undefined, &registries);
    match err {
        EvalError::Helper { source, .. } => assert_eq!(
            source.to_string(),
            "`string` expected a string, found integer `5`"
        ),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unknown_and_misused_helpers() {
    let registries = with_builtins(Registries::builder().helper("upper", upper()));
    assert!(matches!(
        eval_err("{{#nope}}x{{/nope}}", Value::Undefined, &registries),
        EvalError::UnknownHelper { .. }
    ));
    assert!(matches!(
        eval_err("{{nope 1}}", Value::Undefined, &registries),
        EvalError::UnknownHelper { .. }
    ));
    assert!(matches!(
        eval_err("{{#upper \"a\"}}x{{/upper}}", Value::Undefined, &registries),
        EvalError::NotABlockHelper { .. }
    ));
    assert!(matches!(
        eval_err("{{if true}}", Value::Undefined, &registries),
        EvalError::BlockHelperAsValue { .. }
    ));
}

#[test]
fn test_shadowing_builtin_is_rejected() {
    let builder = Registries::builder().helper("if", Helper::value(|_| Ok(Value::Undefined)));
    let err = builtins::install(builder).build().unwrap_err();
    assert_eq!(
        err,
        EvalError::Shadowing {
            registry: "helper",
            name: "if".into()
        }
    );
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn test_if_else() {
    let context = Value::context([("cond", false)]);
    assert_eq!(render_ok("{{#if cond}}A{{else}}B{{/if}}", context.clone()), "B");
    assert_eq!(render_ok("{{#unless cond}}A{{^}}B{{/unless}}", context), "A");
}

#[test]
fn test_else_chain() {
    let source = "{{#if a}}A{{else if b}}B{{else}}C{{/if}}";
    let both = |a: bool, b: bool| Value::context([("a", a), ("b", b)]);
    assert_eq!(render_ok(source, both(true, false)), "A");
    assert_eq!(render_ok(source, both(false, true)), "B");
    assert_eq!(render_ok(source, both(false, false)), "C");
}

#[test]
fn test_inverted_section() {
    let context = Value::context([("items", Value::list(Vec::<Value>::new()))]);
    assert_eq!(render_ok("{{^if items}}none{{/if}}", context), "none");
}

#[test]
fn test_null_literal_is_falsy() {
    assert_eq!(render_ok("{{#if null}}yes{{else}}no{{/if}}", Value::Undefined), "no");
}

#[test]
fn test_each_list() {
    let context = Value::context([("items", Value::list([1i64, 2, 3]))]);
    assert_eq!(render_ok("{{#each items}}{{this}},{{/each}}", context), "1,2,3,");
}

#[test]
fn test_each_data_variables() {
    let context = Value::context([(
        "people",
        Value::list([
            Value::context([("name", "ada")]),
            Value::context([("name", "bob")]),
            Value::context([("name", "cy")]),
        ]),
    )]);
    let source = "{{#each people}}{{#if @first}}[{{/if}}{{@index}}:{{name}}{{#if @last}}]{{else}} {{/if}}{{/each}}";
    assert_eq!(render_ok(source, context), "[0:ada 1:bob 2:cy]");
}

#[test]
fn test_nested_each_has_its_own_index() {
    let context = Value::context([(
        "rows",
        Value::list([Value::list(["a", "b"]), Value::list(["c", "d"])]),
    )]);
    let source = "{{#each rows}}[{{#each this}}{{@index}}{{this}}{{/each}}]{{/each}}";
    assert_eq!(render_ok(source, context.clone()), "[0a1b][0c1d]");

    let source = "{{#each rows}}{{#each this}}{{#if @last}}{{@../index}}{{/if}}{{/each}}{{/each}}";
    assert_eq!(render_ok(source, context), "01");
}

#[test]
fn test_each_context_keys() {
    let context = Value::context([("scores", Value::context([("a", 1i64), ("b", 2i64)]))]);
    assert_eq!(
        render_ok("{{#each scores}}{{@key}}={{this}};{{/each}}", context),
        "a=1;b=2;"
    );
}

#[test]
fn test_each_empty_renders_inverse() {
    let context = Value::context([("items", Value::list(Vec::<Value>::new()))]);
    assert_eq!(
        render_ok("{{#each items}}x{{else}}empty{{/each}}", context),
        "empty"
    );
}

#[test]
fn test_block_params() {
    let context = Value::context([("items", Value::list(["a", "b"]))]);
    assert_eq!(
        render_ok("{{#each items as |item i|}}{{i}}={{item}} {{/each}}", context),
        "0=a 1=b "
    );
}

#[test]
fn test_nested_block_params_layer() {
    let context = Value::context([
        ("rows", Value::list(["r1", "r2"])),
        ("cols", Value::list(["c1"])),
    ]);
    let source =
        "{{#each rows as |row|}}{{#each @root.cols as |col|}}{{row}}/{{col}} {{/each}}{{/each}}";
    assert_eq!(render_ok(source, context), "r1/c1 r2/c1 ");
}

#[test]
fn test_with_and_parent_paths() {
    let context = Value::context([
        ("title", Value::from("T")),
        ("user", Value::context([("name", "ada")])),
    ]);
    assert_eq!(
        render_ok("{{#with user}}{{name}} in {{../title}}{{/with}}", context.clone()),
        "ada in T"
    );
    assert_eq!(
        render_ok("{{#with user as |u|}}{{u.name}}{{/with}}", context),
        "ada"
    );
}

#[test]
fn test_lookup_helper() {
    let context = Value::context([
        ("names", Value::list(["x", "y"])),
        ("i", Value::Integer(1)),
    ]);
    assert_eq!(render_ok("{{lookup names i}}", context), "y");
}

#[test]
fn test_raw_block() {
    let registries = with_builtins(Registries::builder().helper(
        "raw",
        Helper::block(|_| Ok(vec![Invocation::program()])),
    ));
    assert_eq!(
        render("{{{{raw}}}}{{not evaluated}}{{{{/raw}}}}", &Value::Undefined, &registries)
            .unwrap(),
        "{{not evaluated}}"
    );
}

#[test]
fn test_block_helper_writes_its_own_text() {
    let registries = with_builtins(Registries::builder().helper(
        "wrap",
        Helper::block(|args| {
            let tag = run(args, string)?;
            Ok(vec![
                Invocation::text(format!("<{tag}>")),
                Invocation::program(),
                Invocation::text(format!("</{tag}>")),
            ])
        }),
    ));
    let context = Value::context([("x", "<i>")]);
    assert_eq!(
        render("{{#wrap \"b\"}}{{x}}{{/wrap}}", &context, &registries).unwrap(),
        "<b>&lt;i&gt;</b>"
    );
}

// ---------------------------------------------------------------------------
// Partials and decorators
// ---------------------------------------------------------------------------

fn with_partials(partials: &[(&str, &str)]) -> Registries {
    let mut builder = Registries::builder();
    for (name, source) in partials {
        builder = builder.partial(*name, bmx_parser::parse(source).unwrap());
    }
    with_builtins(builder)
}

#[test]
fn test_partial_context_and_hash() {
    let registries = with_partials(&[("card", "<{{name}}>")]);
    let context = Value::context([
        ("name", Value::from("root")),
        ("user", Value::context([("name", "ada")])),
    ]);
    assert_eq!(
        render("{{> card}}{{> card user}}{{> card user name=\"bob\"}}", &context, &registries)
            .unwrap(),
        "<root><ada><bob>"
    );
}

#[test]
fn test_partial_does_not_see_block_params() {
    let registries = with_partials(&[("show", "{{item}}")]);
    let context = Value::context([("items", Value::list(["a"])), ("item", Value::from("ctx"))]);
    assert_eq!(
        render("{{#each items as |item|}}{{> show @root}}{{/each}}", &context, &registries)
            .unwrap(),
        "ctx"
    );
}

#[test]
fn test_missing_partial() {
    let err = eval_err("{{> nowhere}}", Value::Undefined, &registries());
    assert!(matches!(err, EvalError::UnknownPartial { name, .. } if name == "nowhere"));
}

#[test]
fn test_partial_block_fallback_and_body() {
    let context = Value::context([("x", "1")]);
    assert_eq!(
        render_ok("{{#> layout}}fallback {{x}}{{/layout}}", context.clone()),
        "fallback 1"
    );

    let registries = with_partials(&[("layout", "<main>{{> @partial-block}}</main>")]);
    assert_eq!(
        render("{{#> layout}}body {{x}}{{/layout}}", &context, &registries).unwrap(),
        "<main>body 1</main>"
    );
}

#[test]
fn test_nested_layouts_render_their_own_caller_body() {
    let registries = with_partials(&[
        ("base", "{{#> inner}}[{{> @partial-block}}]{{/inner}}"),
        ("inner", "<{{> @partial-block}}>"),
    ]);
    assert_eq!(
        render("{{#> base}}X{{/base}}", &Value::Undefined, &registries).unwrap(),
        "<[X]>"
    );
}

#[test]
fn test_partial_block_body_sees_caller_block_params() {
    let registries = with_partials(&[("layout", "<{{> @partial-block}}>")]);
    let context = Value::context([("xs", Value::list([1i64, 2]))]);
    assert_eq!(
        render(
            "{{#each xs as |x|}}{{#> layout}}{{x}}{{/layout}}{{/each}}",
            &context,
            &registries
        )
        .unwrap(),
        "<1><2>"
    );
}

#[test]
fn test_partial_block_outside_a_block_is_missing() {
    let err = eval_err("{{> @partial-block}}", Value::Undefined, &registries());
    assert!(matches!(err, EvalError::UnknownPartial { name, .. } if name == "@partial-block"));
}

#[test]
fn test_dynamic_partial_name() {
    let registries = with_builtins(
        Registries::builder()
            .partial("a", bmx_parser::parse("A").unwrap())
            .helper("pick", Helper::value(|args| run(args, value))),
    );
    assert_eq!(
        render("{{> (pick \"a\")}}", &Value::Undefined, &registries).unwrap(),
        "A"
    );
    let err = match render("{{> (pick 1)}}", &Value::Undefined, &registries) {
        Err(BmxError::Eval(err)) => err,
        other => panic!("expected an evaluation error, got {other:?}"),
    };
    assert!(matches!(
        err,
        EvalError::InvalidPartialName {
            kind: Kind::Integer,
            ..
        }
    ));
}

#[test]
fn test_inline_partial() {
    let context = Value::context([("xs", Value::list([1i64, 2]))]);
    assert_eq!(
        render_ok(
            "{{#*inline \"row\"}}[{{this}}]{{/inline}}{{#each xs}}{{> row}}{{/each}}",
            context
        ),
        "[1][2]"
    );
}

#[test]
fn test_decorator_scope_is_confined() {
    let source = "{{#if true}}{{#*inline \"p\"}}in{{/inline}}{{> p}}{{/if}}|{{> p}}";
    let err = eval_err(source, Value::Undefined, &registries());
    assert!(matches!(err, EvalError::UnknownPartial { name, .. } if name == "p"));

    let ok = "{{#if true}}{{#*inline \"p\"}}in{{/inline}}{{> p}}{{/if}}";
    assert_eq!(render_ok(ok, Value::Undefined), "in");
}

#[test]
fn test_decorator_only_affects_following_statements() {
    let err = eval_err(
        "{{> p}}{{#*inline \"p\"}}in{{/inline}}",
        Value::Undefined,
        &registries(),
    );
    assert!(matches!(err, EvalError::UnknownPartial { .. }));
}

#[test]
fn test_unknown_decorator() {
    let err = eval_err("{{* nothing}}", Value::Undefined, &registries());
    assert!(matches!(err, EvalError::UnknownDecorator { .. }));
}

#[test]
fn test_custom_decorator_sets_data() {
    let registries = with_builtins(Registries::builder().decorator("stamp", |args, _| {
        let label = run(args, string)?;
        Ok(Box::new(move |state: bmx_render::EvalState| {
            state.with_data("stamp", label)
        }))
    }));
    assert_eq!(
        render("{{* stamp \"v1\"}}{{@stamp}}", &Value::Undefined, &registries).unwrap(),
        "v1"
    );
}

#[test]
fn test_json_context() {
    let context = bmx_render::json::from_str(r#"{"users": [{"name": "ada"}, {"name": "bob"}]}"#)
        .unwrap();
    assert_eq!(
        render_ok("{{#each users}}{{name}} {{/each}}", context),
        "ada bob "
    );
}
