// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Usage errors raised by the operation tree and the per-composite failure strategy.
//!
//! Work failures are never represented here. A work function that reports an
//! error (or panics) is captured into the node's `OperationResult`; the
//! variants below only describe misuse of the tree itself.

use crate::engine::OperationStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by `OperationNode` and `CompositeOperation` control methods.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// `execute()` was called on a node whose execution is still in flight.
    #[error("operation '{name}' is already running")]
    AlreadyRunning { name: String },

    /// A child was added to a composite that has already started executing.
    #[error("cannot add children to operation '{name}' after execution has started")]
    AlreadyStarted { name: String },

    /// A status change that would move the node backwards or re-enter a terminal state.
    #[error("operation '{name}' cannot transition from {from} to {to}")]
    InvalidTransition {
        name: String,
        from: OperationStatus,
        to: OperationStatus,
    },
}

/// How a composite reacts when one of its children fails.
///
/// # Variants
/// * `BestEffort` - Every child is attempted exactly once, regardless of sibling outcomes (default)
/// * `FailFast` - Children that have not started yet are skipped once a failure is observed;
///   children already running are allowed to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    #[default]
    BestEffort,
    FailFast,
}

impl FailureStrategy {
    /// Whether a failed child should stop the dispatch of its not-yet-started siblings.
    pub fn halts_on_failure(&self) -> bool {
        matches!(self, FailureStrategy::FailFast)
    }
}
