// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for tree definition loading and validation events.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Tree definition loaded from disk.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_arbor::observability::messages::config::ConfigLoaded;
///
/// let msg = ConfigLoaded {
///     path: "configs/bulk-update.yaml",
///     root: "bulk-update",
///     node_count: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub root: &'a str,
    pub node_count: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded tree definition '{}' from {}: {} nodes",
            self.root, self.path, self.node_count
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            root = self.root,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "config_loaded",
            span_name = name,
            path = self.path,
            root = self.root,
        )
    }
}

/// A tree definition failed validation.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct TreeValidationFailed<'a> {
    pub error: &'a ValidationError,
}

impl Display for TreeValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Tree definition validation failed: {}", self.error)
    }
}

impl StructuredLog for TreeValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("tree_validation_failed", span_name = name, error = %self.error)
    }
}
