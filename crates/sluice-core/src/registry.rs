//! Component registry: a deterministic mapping from class-name strings to
//! stage factories.
//!
//! Chain definitions reference component classes by the `class` key of
//! each section; the registry resolves those references at assembly time.
//! Unknown names are a named assembly error, never a silent no-op.

use std::collections::BTreeMap;

use crate::component::Stage;
use crate::config::store::ConfigStore;
use crate::error::ConfigError;

/// Constructs a stage from the configuration section that references it.
pub type StageFactory = fn(&ConfigStore, &str) -> Result<Stage, ConfigError>;

/// Class-name -> factory table.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, StageFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `class`, replacing any previous entry.
    pub fn register(&mut self, class: impl Into<String>, factory: StageFactory) {
        let class = class.into();
        if self.factories.insert(class.clone(), factory).is_some() {
            tracing::warn!(class = class.as_str(), "component class re-registered");
        }
    }

    pub fn resolve(&self, class: &str) -> Option<StageFactory> {
        self.factories.get(class).copied()
    }

    /// Registered class names, in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("classes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Input, Pull, Stage};
    use crate::error::StageError;
    use crate::format::Format as F;
    use crate::packet::Packet;

    struct NullInput {
        section: String,
    }

    impl Component for NullInput {
        fn section(&self) -> &str {
            &self.section
        }
    }

    impl Input for NullInput {
        fn produces(&self) -> F {
            F::Any
        }

        fn invoke(&mut self, _packet: Packet) -> Result<Pull, StageError> {
            Ok(Pull::EndOfStream)
        }
    }

    fn make_null_input(_store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Input(Box::new(NullInput {
            section: section.to_string(),
        })))
    }

    #[test]
    fn resolve_registered_class() {
        let mut registry = ComponentRegistry::new();
        registry.register("null_input", make_null_input);
        let factory = registry.resolve("null_input").expect("registered");
        let stage = factory(&ConfigStore::new(), "s").unwrap();
        assert_eq!(stage.role(), "input");
    }

    #[test]
    fn unknown_class_resolves_to_none() {
        let registry = ComponentRegistry::new();
        assert!(registry.resolve("does_not_exist").is_none());
    }

    #[test]
    fn class_names_are_sorted() {
        let mut registry = ComponentRegistry::new();
        registry.register("b", make_null_input);
        registry.register("a", make_null_input);
        let names: Vec<_> = registry.class_names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
