// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for leaf operation lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Leaf execution lifecycle (start, success, failure)
//! * Cooperative cancellation of a running leaf
//! * Re-entrant execution attempts

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Leaf execution started.
///
/// # Log Level
/// `debug!` - Per-leaf detail, noisy on wide trees
///
/// # Example
/// ```
/// use the_arbor::observability::messages::operation::OperationStarted;
///
/// let msg = OperationStarted {
///     operation: "user-service",
///     work: "simulated",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct OperationStarted<'a> {
    pub operation: &'a str,
    pub work: &'a str,
}

impl Display for OperationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing leaf operation '{}' with {} work",
            self.operation, self.work
        )
    }
}

impl StructuredLog for OperationStarted<'_> {
    fn log(&self) {
        tracing::debug!(operation = self.operation, work = self.work, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "leaf",
            span_name = name,
            operation = self.operation,
            work = self.work,
        )
    }
}

/// Leaf execution completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct OperationSucceeded<'a> {
    pub operation: &'a str,
    pub duration: Duration,
}

impl Display for OperationSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executed leaf operation '{}' in {:?}",
            self.operation, self.duration
        )
    }
}

impl StructuredLog for OperationSucceeded<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "leaf_succeeded",
            span_name = name,
            operation = self.operation,
            duration = ?self.duration,
        )
    }
}

/// Leaf work function reported a failure (or panicked).
///
/// # Log Level
/// `warn!` - The failure is captured in the result, the tree keeps going
///
/// # Example
/// ```
/// use the_arbor::observability::messages::operation::OperationFailed;
/// use std::time::Duration;
///
/// let msg = OperationFailed {
///     operation: "inventory-service",
///     cause: "simulated error",
///     duration: Duration::from_millis(500),
/// };
///
/// assert!(msg.to_string().contains("inventory-service"));
/// ```
pub struct OperationFailed<'a> {
    pub operation: &'a str,
    pub cause: &'a str,
    pub duration: Duration,
}

impl Display for OperationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Leaf operation '{}' failed after {:?}: {}",
            self.operation, self.duration, self.cause
        )
    }
}

impl StructuredLog for OperationFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            cause = self.cause,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "leaf_failed",
            span_name = name,
            operation = self.operation,
            cause = self.cause,
        )
    }
}

/// A running leaf was cancelled.
///
/// # Log Level
/// `info!` - Requested by the caller
pub struct OperationCancelled<'a> {
    pub operation: &'a str,
}

impl Display for OperationCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cancelling leaf operation '{}'", self.operation)
    }
}

impl StructuredLog for OperationCancelled<'_> {
    fn log(&self) {
        tracing::info!(operation = self.operation, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("leaf_cancelled", span_name = name, operation = self.operation)
    }
}

/// Work finished after its leaf was already cancelled; the outcome is dropped.
///
/// # Log Level
/// `debug!` - Expected consequence of cooperative cancellation
pub struct OutcomeDiscarded<'a> {
    pub operation: &'a str,
    pub succeeded: bool,
}

impl Display for OutcomeDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let outcome = if self.succeeded { "success" } else { "failure" };
        write!(
            f,
            "Discarding late {} of cancelled operation '{}'",
            outcome, self.operation
        )
    }
}

impl StructuredLog for OutcomeDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(
            operation = self.operation,
            succeeded = self.succeeded,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "outcome_discarded",
            span_name = name,
            operation = self.operation,
            succeeded = self.succeeded,
        )
    }
}

/// `execute()` was called on a node that is already running.
///
/// # Log Level
/// `warn!` - Caller bug
pub struct ExecutionRejected<'a> {
    pub operation: &'a str,
}

impl Display for ExecutionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rejected execute() on operation '{}': already in progress",
            self.operation
        )
    }
}

impl StructuredLog for ExecutionRejected<'_> {
    fn log(&self) {
        tracing::warn!(operation = self.operation, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("execution_rejected", span_name = name, operation = self.operation)
    }
}
