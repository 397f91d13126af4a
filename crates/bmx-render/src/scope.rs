//! The context stack.
//!
//! A persistent linked list of frames. Pushing returns a new `Scope` that
//! shares every ancestor with the old one, so sibling branches of a render
//! can hold different scopes without copying or mutating each other's.

use std::sync::Arc;

use im::OrdMap;

use crate::value::Value;

#[derive(Debug)]
struct Frame {
    this: Value,
    /// `@` variables. Each frame starts from a copy of its parent's.
    data: OrdMap<String, Value>,
    parent: Option<Arc<Frame>>,
}

/// A handle to the innermost frame of a context stack.
#[derive(Debug, Clone)]
pub struct Scope {
    frame: Arc<Frame>,
}

impl Scope {
    /// The root frame. `@root` refers to `this` from everywhere below it.
    pub fn root(this: Value) -> Self {
        let mut data = OrdMap::new();
        data.insert("root".to_string(), this.clone());
        Self {
            frame: Arc::new(Frame {
                this,
                data,
                parent: None,
            }),
        }
    }

    pub fn this(&self) -> &Value {
        &self.frame.this
    }

    pub fn data(&self) -> &OrdMap<String, Value> {
        &self.frame.data
    }

    /// A child frame with a new `this`. Data variables are inherited and
    /// `data` overrides them.
    pub fn push(&self, this: Value, data: OrdMap<String, Value>) -> Scope {
        Scope {
            frame: Arc::new(Frame {
                this,
                data: overlay(&self.frame.data, data),
                parent: Some(Arc::clone(&self.frame)),
            }),
        }
    }

    /// The same frame with extra data variables, for blocks that set `@`
    /// variables without changing `this`.
    pub fn with_data(&self, data: OrdMap<String, Value>) -> Scope {
        Scope {
            frame: Arc::new(Frame {
                this: self.frame.this.clone(),
                data: overlay(&self.frame.data, data),
                parent: self.frame.parent.clone(),
            }),
        }
    }

    /// The frame `depth` hops up, as reached by `../`.
    pub fn ancestor(&self, depth: usize) -> Option<Scope> {
        let mut frame = &self.frame;
        for _ in 0..depth {
            frame = frame.parent.as_ref()?;
        }
        Some(Scope {
            frame: Arc::clone(frame),
        })
    }
}

/// `inherited` with every key of `own` written over it.
fn overlay(
    inherited: &OrdMap<String, Value>,
    own: OrdMap<String, Value>,
) -> OrdMap<String, Value> {
    let mut data = inherited.clone();
    data.extend(own);
    data
}
