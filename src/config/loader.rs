// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{BuildError, FailureStrategy};
use crate::observability::messages::config::{ConfigLoaded, TreeValidationFailed};
use crate::observability::messages::StructuredLog;
use crate::work::WorkOptions;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Top-level tree definition.
///
/// Global defaults (`executor_options`, `failure_strategy`) apply to every
/// composite in the tree that does not override them.
///
/// # Example
/// ```yaml
/// executor_options:
///   max_concurrency: 4
/// failure_strategy: best_effort
/// root:
///   name: bulk-update
///   parallel: true
///   children:
///     - name: user-service
///       work: simulated
///       payload: { user_id: 1 }
///     - name: inventory-service
///       work: simulated
///       options: { fail: true }
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub failure_strategy: FailureStrategy,
    pub root: OperationConfig,
}

/// Executor-wide options.
#[derive(Debug, Default, Deserialize)]
pub struct ExecutorOptions {
    /// Default bound for parallel composites (falls back to `DEFAULT_MAX_CONCURRENCY`)
    pub max_concurrency: Option<usize>,
}

/// One node of the tree definition.
///
/// A node with `work` is a leaf; a node with `children` (possibly empty) is a
/// composite. Composite-only fields are ignored on leaves and vice versa.
#[derive(Debug, Deserialize)]
pub struct OperationConfig {
    #[serde(default)]
    pub name: String,
    /// Registered work kind run by a leaf
    pub work: Option<String>,
    /// Payload handed to the leaf's work function
    #[serde(default)]
    pub payload: Value,
    /// Options handed to the work factory
    #[serde(default)]
    pub options: WorkOptions,
    #[serde(default)]
    pub parallel: bool,
    pub max_concurrency: Option<usize>,
    pub failure_strategy: Option<FailureStrategy>,
    pub children: Option<Vec<OperationConfig>>,
}

impl OperationConfig {
    pub fn is_leaf(&self) -> bool {
        self.work.is_some() && self.children.is_none()
    }

    pub fn is_composite(&self) -> bool {
        self.children.is_some() && self.work.is_none()
    }

    /// Number of nodes in the subtree rooted here, this node included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(OperationConfig::node_count)
            .sum::<usize>()
    }
}

/// Load a tree definition; `.toml` files are parsed as TOML, anything else as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, BuildError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let cfg = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Load a tree definition and reject it unless its structure is valid.
///
/// Every validation error is logged and returned together in
/// `BuildError::Invalid`.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, BuildError> {
    let path = path.as_ref();
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_tree(&cfg) {
        for error in &validation_errors {
            TreeValidationFailed { error }.log();
        }
        return Err(BuildError::Invalid(validation_errors));
    }

    ConfigLoaded {
        path: &path.display().to_string(),
        root: &cfg.root.name,
        node_count: cfg.root.node_count(),
    }
    .log();

    Ok(cfg)
}
