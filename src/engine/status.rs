// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Status and result data model shared by every node in an operation tree.
//!
//! An `OperationResult` pairs an `OperationStatus` with the ordered list of
//! `FailureRecord`s collected while the node ran. Status only moves forward:
//!
//! ```text
//! Pending -> InProgress -> { Success, Failure }
//!    \____________________________/^
//!         (cancellation of a pending composite)
//! ```
//!
//! Terminal states are never left or re-entered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::errors::OperationError;

/// Lifecycle state of an operation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Created but not yet executed
    #[default]
    Pending,
    /// Execution has started and not yet finished
    InProgress,
    /// Execution finished without any failure
    Success,
    /// Execution finished with at least one failure, or was cancelled
    Failure,
}

impl OperationStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Success | Self::Failure => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only lifecycle.
    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        self.rank() < next.rank()
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("Invalid operation status: {s}")),
        }
    }
}

/// Why a failure record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The leaf's work function reported an error or panicked
    Work,
    /// The node was forced to `Failure` by `cancel()`
    Cancelled,
    /// A parent could not run the child because it was already executing elsewhere
    Rejected,
}

/// One failure attributed to a named operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Name of the node the failure originated from
    pub operation: String,
    pub kind: FailureKind,
    /// Human-readable description of the underlying cause
    pub cause: String,
}

impl FailureRecord {
    pub fn work(operation: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            kind: FailureKind::Work,
            cause: cause.into(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        let cause = format!("Operation {} was cancelled", operation);
        Self {
            operation,
            kind: FailureKind::Cancelled,
            cause,
        }
    }

    pub fn rejected(operation: impl Into<String>, error: &OperationError) -> Self {
        Self {
            operation: operation.into(),
            kind: FailureKind::Rejected,
            cause: error.to_string(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.cause)
    }
}

/// Status of a node plus every failure accumulated beneath it.
///
/// For a leaf, `errors` is non-empty exactly when `status` is `Failure`. For a
/// composite, `errors` is the concatenation of its descendants' records, in child
/// order for sequential composites and in completion order for parallel ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub status: OperationStatus,
    pub errors: Vec<FailureRecord>,
}

impl OperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal failed result carrying a single record.
    pub fn failed(record: FailureRecord) -> Self {
        Self {
            status: OperationStatus::Failure,
            errors: vec![record],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == OperationStatus::Failure
    }

    /// Distinct names of the operations that contributed failure records.
    pub fn failed_operations(&self) -> BTreeSet<&str> {
        self.errors.iter().map(|e| e.operation.as_str()).collect()
    }

    /// Move to `next`, refusing backwards moves and terminal re-entry.
    pub(crate) fn transition(
        &mut self,
        name: &str,
        next: OperationStatus,
    ) -> Result<(), OperationError> {
        if !self.status.can_transition_to(next) {
            return Err(OperationError::InvalidTransition {
                name: name.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Force `Failure` with the given record; a no-op on terminal results.
    pub(crate) fn fail(&mut self, name: &str, record: FailureRecord) -> bool {
        if self.transition(name, OperationStatus::Failure).is_err() {
            return false;
        }
        self.errors.push(record);
        true
    }
}

/// Derive a composite's status from its children's statuses.
///
/// Priority: every child `Success` (vacuously true with no children) gives
/// `Success`; otherwise any `Failure` gives `Failure`; otherwise any child that
/// is running or already finished means the group is `InProgress`; only a
/// group of untouched children is `Pending`.
pub fn aggregate_status<I>(statuses: I) -> OperationStatus
where
    I: IntoIterator<Item = OperationStatus>,
{
    let mut all_success = true;
    let mut any_failure = false;
    let mut any_started = false;

    for status in statuses {
        match status {
            OperationStatus::Success => any_started = true,
            OperationStatus::Failure => {
                any_failure = true;
                all_success = false;
            }
            OperationStatus::InProgress => {
                any_started = true;
                all_success = false;
            }
            OperationStatus::Pending => all_success = false,
        }
    }

    if all_success {
        OperationStatus::Success
    } else if any_failure {
        OperationStatus::Failure
    } else if any_started {
        OperationStatus::InProgress
    } else {
        OperationStatus::Pending
    }
}
