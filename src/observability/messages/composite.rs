// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for composite execution events.
//!
//! This module contains message types for logging events related to:
//! * Composite execution lifecycle (start, completion)
//! * Bounded fan-out and join of parallel children
//! * Children skipped by cancellation or fail-fast
//! * Top-down cancellation

use crate::engine::OperationStatus;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Composite execution started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_arbor::observability::messages::composite::CompositeStarted;
///
/// let msg = CompositeStarted {
///     operation: "bulk-update",
///     mode: "parallel",
///     child_count: 3,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CompositeStarted<'a> {
    pub operation: &'a str,
    pub mode: &'a str,
    pub child_count: usize,
    pub max_concurrency: usize,
}

impl Display for CompositeStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} composite operation '{}': {} children, max_concurrency={}",
            self.mode, self.operation, self.child_count, self.max_concurrency
        )
    }
}

impl StructuredLog for CompositeStarted<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            mode = self.mode,
            child_count = self.child_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "composite",
            span_name = name,
            operation = self.operation,
            mode = self.mode,
            child_count = self.child_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Composite execution reached a terminal status.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_arbor::engine::OperationStatus;
/// use the_arbor::observability::messages::composite::CompositeCompleted;
/// use std::time::Duration;
///
/// let msg = CompositeCompleted {
///     operation: "bulk-update",
///     status: OperationStatus::Failure,
///     failure_count: 1,
///     duration: Duration::from_millis(510),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CompositeCompleted<'a> {
    pub operation: &'a str,
    pub status: OperationStatus,
    pub failure_count: usize,
    pub duration: Duration,
}

impl Display for CompositeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executed composite operation '{}' in {:.2} seconds: status={}, failures={}",
            self.operation,
            self.duration.as_secs_f64(),
            self.status,
            self.failure_count
        )
    }
}

impl StructuredLog for CompositeCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            status = %self.status,
            failure_count = self.failure_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "composite_completed",
            span_name = name,
            operation = self.operation,
            status = %self.status,
            failure_count = self.failure_count,
            duration = ?self.duration,
        )
    }
}

/// Why children of a composite were not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Cancelled,
    FailFast,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SkipReason::Cancelled => write!(f, "cancellation"),
            SkipReason::FailFast => write!(f, "fail-fast"),
        }
    }
}

/// Children were left `Pending` instead of being started.
///
/// # Log Level
/// `info!` - Expected consequence of cancellation or fail-fast
pub struct ChildrenSkipped<'a> {
    pub operation: &'a str,
    pub skipped: usize,
    pub reason: SkipReason,
}

impl Display for ChildrenSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipped {} children of composite operation '{}' due to {}",
            self.skipped, self.operation, self.reason
        )
    }
}

impl StructuredLog for ChildrenSkipped<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            skipped = self.skipped,
            reason = %self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "children_skipped",
            span_name = name,
            operation = self.operation,
            skipped = self.skipped,
            reason = %self.reason,
        )
    }
}

/// A child's execute() was refused because it was already running elsewhere.
///
/// # Log Level
/// `warn!` - The tree was driven from two places at once
pub struct ChildRejected<'a> {
    pub operation: &'a str,
    pub child: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ChildRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Composite operation '{}' could not run child '{}': {}",
            self.operation, self.child, self.error
        )
    }
}

impl StructuredLog for ChildRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            child = self.child,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "child_rejected",
            span_name = name,
            operation = self.operation,
            child = self.child,
        )
    }
}

/// A child's execute() panicked instead of returning a result.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ChildPanicked<'a> {
    pub operation: &'a str,
    pub child: &'a str,
    pub message: &'a str,
}

impl Display for ChildPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Child '{}' of composite operation '{}' panicked: {}",
            self.child, self.operation, self.message
        )
    }
}

impl StructuredLog for ChildPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            operation = self.operation,
            child = self.child,
            message = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "child_panicked",
            span_name = name,
            operation = self.operation,
            child = self.child,
        )
    }
}

/// A worker task ended abnormally before returning its child's result.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct WorkerJoinFailed<'a> {
    pub operation: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkerJoinFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker task of composite operation '{}' failed to join: {}",
            self.operation, self.error
        )
    }
}

impl StructuredLog for WorkerJoinFailed<'_> {
    fn log(&self) {
        tracing::error!(operation = self.operation, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_join_failed", span_name = name, operation = self.operation)
    }
}

/// Cancellation requested on a composite; propagates to its children.
///
/// # Log Level
/// `info!` - Requested by the caller
pub struct CompositeCancelled<'a> {
    pub operation: &'a str,
    pub child_count: usize,
    pub previous_status: OperationStatus,
}

impl Display for CompositeCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cancelling composite operation '{}' ({}) and its {} children",
            self.operation, self.previous_status, self.child_count
        )
    }
}

impl StructuredLog for CompositeCancelled<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            child_count = self.child_count,
            previous_status = %self.previous_status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "composite_cancelled",
            span_name = name,
            operation = self.operation,
            child_count = self.child_count,
        )
    }
}
