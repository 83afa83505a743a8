// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::BuildError;
use crate::traits::Work;
use crate::work::SimulatedWork;

/// Free-form per-leaf options handed to a work factory
pub type WorkOptions = HashMap<String, Value>;

type WorkFactory = Arc<dyn Fn(&WorkOptions) -> Result<Arc<dyn Work>, String> + Send + Sync>;

/// Registry resolving the `work` names used in tree definitions.
///
/// Each name maps to a factory that receives the leaf's `options` and returns
/// the work function for that leaf.
///
/// # Example
/// ```
/// use the_arbor::work::{WorkOptions, WorkRegistry};
///
/// let registry = WorkRegistry::with_builtins();
/// assert!(registry.contains("simulated"));
///
/// let work = registry.create("user-service", "simulated", &WorkOptions::new()).unwrap();
/// assert_eq!(work.name(), "simulated");
/// ```
#[derive(Clone, Default)]
pub struct WorkRegistry {
    factories: HashMap<String, WorkFactory>,
}

impl WorkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `simulated` work registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("simulated", |options| {
            SimulatedWork::from_options(options).map(|work| Arc::new(work) as Arc<dyn Work>)
        });
        registry
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&WorkOptions) -> Result<Arc<dyn Work>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Register one shared work instance that every leaf naming it will run
    pub fn register_instance(&mut self, name: impl Into<String>, work: Arc<dyn Work>) {
        self.register(name, move |_options| Ok(work.clone()));
    }

    /// Instantiate the work `work` for the leaf `operation`
    pub fn create(
        &self,
        operation: &str,
        work: &str,
        options: &WorkOptions,
    ) -> Result<Arc<dyn Work>, BuildError> {
        let factory = self
            .factories
            .get(work)
            .ok_or_else(|| BuildError::UnknownWork {
                operation: operation.to_string(),
                work: work.to_string(),
            })?;

        factory(options).map_err(|reason| BuildError::WorkCreationFailed {
            operation: operation.to_string(),
            work: work.to_string(),
            reason,
        })
    }

    /// Check if a work name is registered
    pub fn contains(&self, work: &str) -> bool {
        self.factories.contains_key(work)
    }

    /// List registered work names in sorted order
    pub fn available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for WorkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkRegistry")
            .field("work", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::FnWork;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = WorkRegistry::with_builtins();
        assert_eq!(registry.available(), vec!["simulated"]);
        assert!(!WorkRegistry::new().contains("simulated"));
    }

    #[test]
    fn test_unknown_work() {
        let registry = WorkRegistry::with_builtins();
        let err = registry
            .create("billing", "grpc", &WorkOptions::new())
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::UnknownWork { .. }));
        assert_eq!(
            err.to_string(),
            "operation 'billing' references unknown work 'grpc'"
        );
    }

    #[test]
    fn test_factory_rejection_is_reported() {
        let registry = WorkRegistry::with_builtins();
        let options = WorkOptions::from([("latency_ms".to_string(), json!("soon"))]);
        let err = registry.create("billing", "simulated", &options).err().unwrap();
        assert!(matches!(err, BuildError::WorkCreationFailed { .. }));
    }

    #[test]
    fn test_register_instance_is_shared() {
        let mut registry = WorkRegistry::new();
        let work: Arc<dyn Work> = Arc::new(FnWork::named("noop", |_payload| async {
            anyhow::Ok(())
        }));
        registry.register_instance("noop", work.clone());

        let a = registry.create("a", "noop", &WorkOptions::new()).unwrap();
        let b = registry.create("b", "noop", &WorkOptions::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "noop");
    }
}
