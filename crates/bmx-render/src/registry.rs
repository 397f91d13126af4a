//! Named helpers, partials and decorators.
//!
//! Each registry is an immutable map from name to a shared callable.
//! `Registries` is cheap to clone, so a decorator can hand the rest of its
//! program a modified copy without touching anyone else's view.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bmx_parser::Template;
use futures_util::future::{BoxFuture, FutureExt};
use im::OrdMap;

use crate::error::EvalError;
use crate::eval::{EvalState, Invocation};
use crate::function::{Arguments, FunctionError};
use crate::value::Value;

pub type ValueFn = Arc<dyn Fn(&Arguments) -> Result<Value, FunctionError> + Send + Sync>;
pub type BlockFn = Arc<dyn Fn(&Arguments) -> Result<Vec<Invocation>, FunctionError> + Send + Sync>;
pub type EffectFn =
    Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Value, FunctionError>> + Send + Sync>;
pub type EffectBlockFn = Arc<
    dyn Fn(Arguments) -> BoxFuture<'static, Result<Vec<Invocation>, FunctionError>> + Send + Sync,
>;

/// A decorator's effect on the rest of its program.
pub type StateTransform = Box<dyn FnOnce(EvalState) -> EvalState + Send>;
pub type DecoratorFn = Arc<
    dyn Fn(&Arguments, Option<&Template>) -> Result<StateTransform, FunctionError> + Send + Sync,
>;

/// A registered helper.
///
/// Value helpers produce a value for a mustache or subexpression. Block
/// helpers produce the list of program/inverse runs for `{{#name}}`. The
/// effect variants do the same work asynchronously and can only run in
/// `render_async`.
#[derive(Clone)]
pub enum Helper {
    Value(ValueFn),
    Block(BlockFn),
    Effect(EffectFn),
    EffectBlock(EffectBlockFn),
}

impl Helper {
    pub fn value<F>(f: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Helper::Value(Arc::new(f))
    }

    pub fn block<F>(f: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Vec<Invocation>, FunctionError> + Send + Sync + 'static,
    {
        Helper::Block(Arc::new(f))
    }

    pub fn effect<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        Helper::Effect(Arc::new(move |args| f(args).boxed()))
    }

    pub fn effect_block<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Invocation>, FunctionError>> + Send + 'static,
    {
        Helper::EffectBlock(Arc::new(move |args| f(args).boxed()))
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Helper::Value(_) => "Value",
            Helper::Block(_) => "Block",
            Helper::Effect(_) => "Effect",
            Helper::EffectBlock(_) => "EffectBlock",
        };
        write!(f, "Helper::{kind}")
    }
}

/// The helper, partial and decorator registries of one render.
#[derive(Clone, Default)]
pub struct Registries {
    helpers: OrdMap<String, Helper>,
    partials: OrdMap<String, Arc<Template>>,
    decorators: OrdMap<String, DecoratorFn>,
}

impl Registries {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn helper(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    pub fn partial(&self, name: &str) -> Option<&Arc<Template>> {
        self.partials.get(name)
    }

    pub fn decorator(&self, name: &str) -> Option<&DecoratorFn> {
        self.decorators.get(name)
    }

    /// A copy with `name` bound to `template`, replacing any earlier binding.
    pub fn with_partial(&self, name: impl Into<String>, template: Arc<Template>) -> Self {
        let mut next = self.clone();
        next.partials.insert(name.into(), template);
        next
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registries")
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("partials", &self.partials.keys().collect::<Vec<_>>())
            .field("decorators", &self.decorators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects registry entries; `build` rejects duplicate names.
#[derive(Default)]
pub struct RegistryBuilder {
    helpers: Vec<(String, Helper)>,
    partials: Vec<(String, Arc<Template>)>,
    decorators: Vec<(String, DecoratorFn)>,
}

impl RegistryBuilder {
    pub fn helper(mut self, name: impl Into<String>, helper: Helper) -> Self {
        self.helpers.push((name.into(), helper));
        self
    }

    pub fn partial(mut self, name: impl Into<String>, template: Template) -> Self {
        self.partials.push((name.into(), Arc::new(template)));
        self
    }

    pub fn decorator<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Arguments, Option<&Template>) -> Result<StateTransform, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        self.decorators.push((name.into(), Arc::new(f)));
        self
    }

    /// Fails on the first name registered twice in the same registry, even
    /// if both entries are the same function.
    pub fn build(self) -> Result<Registries, EvalError> {
        let registries = Registries {
            helpers: unique("helper", self.helpers)?,
            partials: unique("partial", self.partials)?,
            decorators: unique("decorator", self.decorators)?,
        };
        log::debug!(
            "built registries: {} helpers, {} partials, {} decorators",
            registries.helpers.len(),
            registries.partials.len(),
            registries.decorators.len()
        );
        Ok(registries)
    }
}

fn unique<V: Clone>(
    registry: &'static str,
    entries: Vec<(String, V)>,
) -> Result<OrdMap<String, V>, EvalError> {
    let mut map = OrdMap::new();
    for (name, entry) in entries {
        if map.contains_key(&name) {
            return Err(EvalError::Shadowing { registry, name });
        }
        map.insert(name, entry);
    }
    Ok(map)
}
