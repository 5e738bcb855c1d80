//! Framework registration table
//!
//! Framework implementations register a constructor under a name at
//! process startup; descriptors then select frameworks by that name. A
//! compile-time table instead of runtime module loading.

use std::collections::HashMap;
use std::sync::Arc;

use crate::framework::FrameworkHandler;
use crate::frameworks::EchoFramework;

/// Constructs a fresh handler instance.
pub type HandlerBuilder = fn() -> Arc<dyn FrameworkHandler>;

#[derive(Default)]
pub struct FrameworkRegistry {
    builders: HashMap<String, HandlerBuilder>,
}

fn build_echo() -> Arc<dyn FrameworkHandler> {
    EchoFramework::new()
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frameworks that ship with the host binary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("echo", build_echo);
        registry
    }

    pub fn register(&mut self, name: &str, builder: HandlerBuilder) {
        self.builders.insert(name.to_string(), builder);
    }

    /// Construct a fresh handler for `name`, if registered.
    pub fn build(&self, name: &str) -> Option<Arc<dyn FrameworkHandler>> {
        self.builders.get(name).map(|builder| builder())
    }

    pub fn names(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }
}
