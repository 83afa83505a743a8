// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_MAX_CONCURRENCY;
use crate::config::{validate_tree, Config, OperationConfig};
use crate::engine::{CompositeOperation, LeafOperation};
use crate::errors::{BuildError, FailureStrategy};
use crate::traits::OperationNode;
use crate::work::WorkRegistry;

/// Tree-wide defaults inherited by composites that do not set their own.
#[derive(Debug, Clone, Copy)]
struct Defaults {
    max_concurrency: usize,
    failure_strategy: FailureStrategy,
}

impl Defaults {
    fn from_config(cfg: &Config) -> Self {
        Self {
            max_concurrency: cfg
                .executor_options
                .max_concurrency
                .unwrap_or(DEFAULT_MAX_CONCURRENCY),
            failure_strategy: cfg.failure_strategy,
        }
    }
}

/// Operation tree builder - turns a tree definition into runnable nodes.
///
/// Leaf `work` names are resolved through the supplied `WorkRegistry`, and
/// every composite without its own `max_concurrency` or `failure_strategy`
/// inherits the definition's global values.
///
/// # Examples
///
/// ```
/// use the_arbor::config::{Config, RuntimeBuilder};
/// use the_arbor::engine::OperationStatus;
/// use the_arbor::work::WorkRegistry;
///
/// let config: Config = serde_yaml::from_str(r#"
/// root:
///   name: billing-flow
///   children:
///     - name: invoice
///       work: simulated
///       options: { latency_ms: 1 }
/// "#).unwrap();
///
/// let root = RuntimeBuilder::from_config(&config, &WorkRegistry::with_builtins()).unwrap();
/// assert_eq!(root.name(), "billing-flow");
/// assert_eq!(root.status(), OperationStatus::Pending);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the root node of the tree described by `cfg`.
    ///
    /// The definition is validated first; a root declaring `work` produces a
    /// single leaf.
    pub fn from_config(
        cfg: &Config,
        registry: &WorkRegistry,
    ) -> Result<Box<dyn OperationNode>, BuildError> {
        validate_tree(cfg).map_err(BuildError::Invalid)?;
        Self::build_node(&cfg.root, Defaults::from_config(cfg), registry)
    }

    fn build_node(
        node: &OperationConfig,
        defaults: Defaults,
        registry: &WorkRegistry,
    ) -> Result<Box<dyn OperationNode>, BuildError> {
        match &node.work {
            Some(work) => {
                let work = registry.create(&node.name, work, &node.options)?;
                Ok(Box::new(LeafOperation::new(
                    node.name.clone(),
                    node.payload.clone(),
                    work,
                )))
            }
            None => Ok(Box::new(Self::build_composite(node, defaults, registry)?)),
        }
    }

    fn build_composite(
        node: &OperationConfig,
        defaults: Defaults,
        registry: &WorkRegistry,
    ) -> Result<CompositeOperation, BuildError> {
        let mut composite = CompositeOperation::new(node.name.clone(), node.parallel)
            .with_max_concurrency(node.max_concurrency.unwrap_or(defaults.max_concurrency))
            .with_failure_strategy(node.failure_strategy.unwrap_or(defaults.failure_strategy));

        for child in node.children.iter().flatten() {
            composite = composite.with_boxed_child(Self::build_node(child, defaults, registry)?);
        }
        Ok(composite)
    }
}
