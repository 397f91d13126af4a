//! The evaluator: walks a template against a context and writes a `Page`.
//!
//! One walk serves both render modes. The walker is generic over an
//! `Effect`, and helper results are the only place the two modes differ.
//!
//! State is threaded by value. A block or partial clones the state it was
//! given, changes the clone and renders its program with it; the caller's
//! copy is never touched. Decorators fold over the state of the program
//! they appear in, so whatever they register is visible to the statements
//! that follow them and nowhere else.

use std::fmt;
use std::sync::Arc;

use bmx_parser::ast::{
    Block, Decorator, Expr, HashPair, Inverse, Literal, Mustache, Partial, PartialName, Path,
    Position, Statement, Template,
};
use futures_util::future::{BoxFuture, FutureExt};
use im::OrdMap;

use crate::effect::{Action, Async, Effect, Pure};
use crate::error::EvalError;
use crate::escape::RenderOptions;
use crate::function::{Arguments, Param};
use crate::registry::{Helper, Registries};
use crate::scope::Scope;
use crate::value::Value;

/// Partial name that renders the body of the enclosing
/// `{{#> name}}...{{/name}}` block.
pub const PARTIAL_BLOCK: &str = "@partial-block";

// ---------------------------------------------------------------------------
// Block helper plans
// ---------------------------------------------------------------------------

/// What an invocation writes: one of the block's programs, or text of the
/// helper's own. Text is written as-is, without escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Program,
    Inverse,
    Text(String),
}

/// One run of a block's program or inverse, as requested by a block helper.
///
/// A block helper returns a list of these and the evaluator renders them in
/// order. `this` pushes a new context frame; without it the block runs in
/// the caller's context. `data` sets `@` variables and `block_params` are
/// bound to the names declared with `as |...|`.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub branch: Branch,
    pub this: Option<Value>,
    pub data: OrdMap<String, Value>,
    pub block_params: Vec<Value>,
}

impl Invocation {
    pub fn program() -> Self {
        Self::new(Branch::Program)
    }

    pub fn inverse() -> Self {
        Self::new(Branch::Inverse)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Branch::Text(text.into()))
    }

    fn new(branch: Branch) -> Self {
        Self {
            branch,
            this: None,
            data: OrdMap::new(),
            block_params: Vec::new(),
        }
    }

    pub fn with_this(mut self, this: Value) -> Self {
        self.this = Some(this);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_block_params(mut self, params: Vec<Value>) -> Self {
        self.block_params = params;
        self
    }
}

// ---------------------------------------------------------------------------
// Evaluation state
// ---------------------------------------------------------------------------

/// Everything a program needs to evaluate: the context stack, the
/// registries and the block params in scope.
#[derive(Debug, Clone)]
pub struct EvalState {
    scope: Scope,
    registries: Registries,
    block_params: OrdMap<String, Value>,
    partial_block: Option<Arc<PartialBlock>>,
}

/// The body of a partial block, closed over the state of the template that
/// wrote it.
#[derive(Debug)]
struct PartialBlock {
    body: Template,
    caller: EvalState,
}

impl EvalState {
    pub fn new(context: Value, registries: Registries) -> Self {
        Self {
            scope: Scope::root(context),
            registries,
            block_params: OrdMap::new(),
            partial_block: None,
        }
    }

    pub fn this(&self) -> &Value {
        self.scope.this()
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn with_partial(mut self, name: impl Into<String>, template: Arc<Template>) -> Self {
        self.registries = self.registries.with_partial(name, template);
        self
    }

    /// Set an `@` variable for the rest of the current frame.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut data = OrdMap::new();
        data.insert(key.into(), value.into());
        self.scope = self.scope.with_data(data);
        self
    }

    /// Resolve a path: block params first, then the context stack.
    pub fn resolve(&self, path: &Path) -> Value {
        if !path.data && !path.this && path.depth == 0 {
            if let Some((first, rest)) = path.segments.split_first() {
                if let Some(bound) = self.block_params.get(first) {
                    return bound.lookup(rest);
                }
            }
        }

        let Some(scope) = self.scope.ancestor(path.depth) else {
            return Value::Undefined;
        };
        if path.data {
            match path.segments.split_first() {
                Some((first, rest)) => scope
                    .data()
                    .get(first)
                    .map(|value| value.lookup(rest))
                    .unwrap_or_default(),
                None => Value::Undefined,
            }
        } else {
            scope.this().lookup(&path.segments)
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The rendered output of a template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    text: String,
}

impl Page {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Render without an executor. An effect helper anywhere in the walk fails
/// the render with `FunctionError::Suspended`.
pub fn render(
    template: &Template,
    context: &Value,
    registries: &Registries,
    options: &RenderOptions,
) -> Result<Page, EvalError> {
    walk(&Pure, template, context, registries, options)
        .now_or_never()
        .unwrap_or(Err(EvalError::Suspended))
}

/// Render, awaiting effect helpers as they are reached.
pub async fn render_async(
    template: &Template,
    context: &Value,
    registries: &Registries,
    options: &RenderOptions,
) -> Result<Page, EvalError> {
    walk(&Async, template, context, registries, options).await
}

fn walk<'a, E: Effect>(
    effect: &'a E,
    template: &'a Template,
    context: &Value,
    registries: &Registries,
    options: &'a RenderOptions,
) -> BoxFuture<'a, Result<Page, EvalError>> {
    let state = EvalState::new(context.clone(), registries.clone());
    async move {
        log::debug!(
            "rendering template with {} statements",
            template.statements.len()
        );
        let walker = Walker { effect, options };
        let mut text = String::new();
        walker.program(template, state, &mut text).await?;
        log::debug!("rendered {} bytes", text.len());
        Ok(Page { text })
    }
    .boxed()
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

struct Walker<'w, E> {
    effect: &'w E,
    options: &'w RenderOptions,
}

impl<'w, E: Effect> Walker<'w, E> {
    fn program<'a>(
        &'a self,
        program: &'a Template,
        mut state: EvalState,
        out: &'a mut String,
    ) -> BoxFuture<'a, Result<(), EvalError>> {
        async move {
            for statement in &program.statements {
                match statement {
                    Statement::Content(text) => out.push_str(text),
                    Statement::Mustache(mustache) => self.mustache(mustache, &state, out).await?,
                    Statement::Block(block) => self.block(block, &state, out).await?,
                    Statement::Partial(partial) => self.partial(partial, &state, out).await?,
                    Statement::Decorator(decorator) => {
                        state = self.decorator(decorator, state).await?;
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }

    fn mustache<'a>(
        &'a self,
        mustache: &'a Mustache,
        state: &'a EvalState,
        out: &'a mut String,
    ) -> BoxFuture<'a, Result<(), EvalError>> {
        async move {
            let position = mustache.position;
            let value = match &mustache.expr {
                Expr::Path(path) => match path.simple_name() {
                    Some(name) if state.registries.helper(name).is_some() => {
                        self.call(name, &[], &[], position, state).await?
                    }
                    _ => state.resolve(path),
                },
                expr => self.expr(expr, state).await?,
            };

            let text = value.to_output().ok_or(EvalError::Unprintable {
                kind: value.kind(),
                position,
            })?;
            if mustache.escaped {
                out.push_str(&self.options.escape.escape(&text));
            } else {
                out.push_str(&text);
            }
            Ok(())
        }
        .boxed()
    }

    fn expr<'a>(
        &'a self,
        expr: &'a Expr,
        state: &'a EvalState,
    ) -> BoxFuture<'a, Result<Value, EvalError>> {
        async move {
            match expr {
                Expr::Literal(literal) => Ok(literal_value(literal)),
                Expr::Path(path) => Ok(state.resolve(path)),
                Expr::SubExpression(call) => {
                    self.call(&call.name, &call.params, &call.hash, call.position, state)
                        .await
                }
            }
        }
        .boxed()
    }

    fn arguments<'a>(
        &'a self,
        params: &'a [Expr],
        hash: &'a [HashPair],
        state: &'a EvalState,
    ) -> BoxFuture<'a, Result<Arguments, EvalError>> {
        async move {
            let mut values = Vec::with_capacity(params.len());
            for param in params {
                values.push(self.expr(param, state).await?);
            }
            let mut named = Vec::with_capacity(hash.len());
            for pair in hash {
                named.push(Param {
                    name: pair.key.clone(),
                    value: self.expr(&pair.value, state).await?,
                });
            }
            Ok(Arguments {
                values,
                params: named,
            })
        }
        .boxed()
    }

    /// Call a value helper.
    fn call<'a>(
        &'a self,
        name: &'a str,
        params: &'a [Expr],
        hash: &'a [HashPair],
        position: Position,
        state: &'a EvalState,
    ) -> BoxFuture<'a, Result<Value, EvalError>> {
        async move {
            let helper = state
                .registries
                .helper(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownHelper {
                    name: name.to_string(),
                    position,
                })?;
            let args = self.arguments(params, hash, state).await?;

            log::trace!("calling helper `{name}`");
            let result = match helper {
                Helper::Value(f) => self.effect.run(Action::Ready(f(&args))).await,
                Helper::Effect(f) => self.effect.run(Action::Suspend(f(args))).await,
                Helper::Block(_) | Helper::EffectBlock(_) => {
                    return Err(EvalError::BlockHelperAsValue {
                        name: name.to_string(),
                        position,
                    })
                }
            };
            result.map_err(|source| EvalError::Helper {
                name: name.to_string(),
                source,
                position,
            })
        }
        .boxed()
    }

    fn block<'a>(
        &'a self,
        block: &'a Block,
        state: &'a EvalState,
        out: &'a mut String,
    ) -> BoxFuture<'a, Result<(), EvalError>> {
        async move {
            let name = block.call.name.as_str();
            let position = block.position;
            let helper = state
                .registries
                .helper(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownHelper {
                    name: name.to_string(),
                    position,
                })?;
            let args = self
                .arguments(&block.call.params, &block.call.hash, state)
                .await?;

            log::trace!("opening block `{name}`");
            let plan = match helper {
                Helper::Block(f) => self.effect.run(Action::Ready(f(&args))).await,
                Helper::EffectBlock(f) => self.effect.run(Action::Suspend(f(args))).await,
                Helper::Value(_) | Helper::Effect(_) => {
                    return Err(EvalError::NotABlockHelper {
                        name: name.to_string(),
                        position,
                    })
                }
            }
            .map_err(|source| EvalError::Helper {
                name: name.to_string(),
                source,
                position,
            })?;

            for invocation in plan {
                let Invocation {
                    branch,
                    this,
                    data,
                    block_params,
                } = invocation;

                let mut inner = state.clone();
                inner.scope = match this {
                    Some(this) => inner.scope.push(this, data),
                    None if data.is_empty() => inner.scope,
                    None => inner.scope.with_data(data),
                };

                match branch {
                    Branch::Text(text) => out.push_str(&text),
                    Branch::Program => {
                        for (name, value) in block.block_params.iter().zip(block_params) {
                            inner.block_params.insert(name.clone(), value);
                        }
                        self.program(&block.program, inner, out).await?;
                    }
                    Branch::Inverse => match &block.inverse {
                        Some(Inverse::Program(inverse)) => {
                            self.program(inverse, inner, out).await?
                        }
                        Some(Inverse::Chain(chained)) => self.block(chained, &inner, out).await?,
                        None => {}
                    },
                }
            }
            Ok(())
        }
        .boxed()
    }

    fn partial<'a>(
        &'a self,
        partial: &'a Partial,
        state: &'a EvalState,
        out: &'a mut String,
    ) -> BoxFuture<'a, Result<(), EvalError>> {
        async move {
            let position = partial.position;
            let name = match &partial.name {
                PartialName::Static(name) => name.clone(),
                PartialName::Dynamic(call) => {
                    match self
                        .call(&call.name, &call.params, &call.hash, call.position, state)
                        .await?
                    {
                        Value::String(name) => name,
                        other => {
                            return Err(EvalError::InvalidPartialName {
                                kind: other.kind(),
                                position,
                            })
                        }
                    }
                }
            };

            // `@partial-block` renders in the state of the template that wrote
            // the block, so nested layouts each see their own caller's body.
            let partial_block = match &state.partial_block {
                Some(block) if name == PARTIAL_BLOCK => Some(Arc::clone(block)),
                _ => None,
            };
            let mut inner = match &partial_block {
                Some(block) => block.caller.clone(),
                None => state.clone(),
            };

            if partial.context.is_some() || !partial.hash.is_empty() {
                let base = match &partial.context {
                    Some(expr) => self.expr(expr, state).await?,
                    None => state.this().clone(),
                };
                let this = if partial.hash.is_empty() {
                    base
                } else {
                    let mut fields = match base {
                        Value::Context(fields) => fields,
                        _ => OrdMap::new(),
                    };
                    for pair in &partial.hash {
                        fields.insert(pair.key.clone(), self.expr(&pair.value, state).await?);
                    }
                    Value::Context(fields)
                };
                inner.scope = inner.scope.push(this, OrdMap::new());
            }

            if let Some(block) = partial_block {
                log::debug!("entering partial block");
                return self.program(&block.body, inner, out).await;
            }

            let Some(template) = state.registries.partial(&name).cloned() else {
                return match &partial.block {
                    Some(fallback) => {
                        log::debug!("partial `{name}` not found, rendering its block");
                        self.program(fallback, inner, out).await
                    }
                    None => Err(EvalError::UnknownPartial { name, position }),
                };
            };

            if let Some(body) = &partial.block {
                inner.partial_block = Some(Arc::new(PartialBlock {
                    body: body.clone(),
                    caller: state.clone(),
                }));
            }
            inner.block_params = OrdMap::new();

            log::debug!("entering partial `{name}`");
            self.program(&template, inner, out).await
        }
        .boxed()
    }

    fn decorator<'a>(
        &'a self,
        decorator: &'a Decorator,
        state: EvalState,
    ) -> BoxFuture<'a, Result<EvalState, EvalError>> {
        async move {
            let name = decorator.call.name.as_str();
            let position = decorator.position;
            let f = state
                .registries
                .decorator(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownDecorator {
                    name: name.to_string(),
                    position,
                })?;
            let args = self
                .arguments(&decorator.call.params, &decorator.call.hash, &state)
                .await?;

            let transform = f(&args, decorator.program.as_ref()).map_err(|source| {
                EvalError::Decorator {
                    name: name.to_string(),
                    source,
                    position,
                }
            })?;
            log::debug!("applying decorator `{name}`");
            Ok(transform(state))
        }
        .boxed()
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Integer(n) => Value::Integer(*n),
        Literal::Decimal { value, .. } => Value::Number(*value),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Undefined | Literal::Null => Value::Undefined,
    }
}
