// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::DEFAULT_MAX_CONCURRENCY;
use crate::engine::coordinator::{run_child, ExecutionCoordinator};
use crate::engine::guard::CancelOnDrop;
use crate::engine::status::{aggregate_status, FailureRecord, OperationResult, OperationStatus};
use crate::errors::{FailureStrategy, OperationError};
use crate::observability::messages::composite::{
    ChildrenSkipped, CompositeCancelled, CompositeCompleted, CompositeStarted, SkipReason,
};
use crate::observability::messages::operation::ExecutionRejected;
use crate::observability::messages::StructuredLog;
use crate::traits::OperationNode;

/// A node that owns an ordered group of child operations and runs them as one.
///
/// Children run either one at a time in insertion order (sequential) or fanned
/// out over a bounded set of tokio tasks (parallel). Under the default
/// `FailureStrategy::BestEffort` every child is attempted exactly once no
/// matter how its siblings fare; the composite's own status is derived from
/// its children once they have all finished.
///
/// ## Ownership
///
/// `with_child` and `add_child` take the child by value, so a node can only
/// ever have one parent and can never contain itself. Children are held as
/// `Arc` purely so worker tasks can run them; callers get read-only access via
/// `children()`.
///
/// ## Cancellation
///
/// `cancel()` trips the composite's cancellation token, forwards `cancel()` to
/// every child in order, and forces the composite to `Failure`. Children that
/// have not started yet are skipped (they stay `Pending`); children that are
/// running keep running and only their recorded status changes.
///
/// # Example
/// ```
/// use the_arbor::engine::{CompositeOperation, LeafOperation, OperationStatus};
/// use the_arbor::traits::OperationNode;
/// use the_arbor::work::SimulatedWork;
/// use serde_json::json;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let bulk = CompositeOperation::parallel("bulk-update")
///     .with_child(LeafOperation::from_fn("user-service", json!({"user_id": 1}), |_| async {
///         anyhow::Ok(())
///     }))
///     .with_child(LeafOperation::new(
///         "inventory-service",
///         json!({"sku": "A1"}),
///         Arc::new(SimulatedWork::failing(Duration::from_millis(10))),
///     ));
///
/// let result = bulk.execute().await.unwrap();
/// assert_eq!(result.status, OperationStatus::Failure);
/// assert_eq!(result.errors[0].operation, "inventory-service");
/// assert_eq!(bulk.progress(), 100.0);
/// # }
/// ```
pub struct CompositeOperation {
    name: String,
    children: Vec<Arc<dyn OperationNode>>,
    parallel: bool,
    max_concurrency: usize,
    failure_strategy: FailureStrategy,
    result: RwLock<OperationResult>,
    cancellation: CancellationToken,
}

impl CompositeOperation {
    /// Create an empty composite; `parallel` selects the execution mode.
    pub fn new(name: impl Into<String>, parallel: bool) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            parallel,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            failure_strategy: FailureStrategy::default(),
            result: RwLock::new(OperationResult::new()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn sequential(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn parallel(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// Bound the number of children a parallel composite runs at once.
    ///
    /// A value of `0` is clamped to `1` here. Tree definitions loaded through
    /// `config` reject `max_concurrency: 0` during validation instead, so the
    /// clamp only applies to trees built in code.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_failure_strategy(mut self, failure_strategy: FailureStrategy) -> Self {
        self.failure_strategy = failure_strategy;
        self
    }

    /// Append a child while building the tree.
    pub fn with_child(mut self, child: impl OperationNode + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Append an already-boxed child while building the tree.
    pub fn with_boxed_child(mut self, child: Box<dyn OperationNode>) -> Self {
        self.children.push(Arc::from(child));
        self
    }

    /// Append a child; refused once this composite has started executing.
    pub fn add_child(&mut self, child: impl OperationNode + 'static) -> Result<(), OperationError> {
        self.add_boxed_child(Box::new(child))
    }

    /// Append an already-boxed child, as produced when building trees from configuration.
    pub fn add_boxed_child(&mut self, child: Box<dyn OperationNode>) -> Result<(), OperationError> {
        if !self.result.read().is_pending() {
            return Err(OperationError::AlreadyStarted {
                name: self.name.clone(),
            });
        }
        self.children.push(Arc::from(child));
        Ok(())
    }

    pub fn children(&self) -> &[Arc<dyn OperationNode>] {
        &self.children
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn failure_strategy(&self) -> FailureStrategy {
        self.failure_strategy
    }

    /// Percentage of children whose own result is terminal.
    ///
    /// `100.0` for a composite with no children. A nested composite counts
    /// only once its `execute()` has finalized, even if a failed grandchild
    /// already makes its live status `Failure`. Safe to call while
    /// `execute()` is in flight.
    pub fn progress(&self) -> f64 {
        let total = self.children.len();
        if total == 0 {
            return 100.0;
        }
        let completed = self
            .children
            .iter()
            .filter(|child| child.result().is_complete())
            .count();
        completed as f64 / total as f64 * 100.0
    }

    async fn execute_sequential(&self) -> Vec<FailureRecord> {
        let mut errors = Vec::new();

        for (index, child) in self.children.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                self.log_skipped(index, SkipReason::Cancelled);
                break;
            }

            let child_result = run_child(&self.name, child.as_ref()).await;
            let failed = child_result.is_failure();
            errors.extend(child_result.errors);

            if failed && self.failure_strategy.halts_on_failure() {
                self.log_skipped(index + 1, SkipReason::FailFast);
                break;
            }
        }

        errors
    }

    fn log_skipped(&self, first_skipped: usize, reason: SkipReason) {
        let skipped = self.children.len().saturating_sub(first_skipped);
        if skipped > 0 {
            ChildrenSkipped {
                operation: &self.name,
                skipped,
                reason,
            }
            .log();
        }
    }

    async fn execute_parallel(&self) -> Vec<FailureRecord> {
        ExecutionCoordinator {
            operation: &self.name,
            max_concurrency: self.max_concurrency,
            failure_strategy: self.failure_strategy,
            cancellation: &self.cancellation,
        }
        .run_all(&self.children)
        .await
    }

    fn mode(&self) -> &'static str {
        if self.parallel {
            "parallel"
        } else {
            "sequential"
        }
    }
}

#[async_trait]
impl OperationNode for CompositeOperation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<OperationResult, OperationError> {
        {
            let mut result = self.result.write();
            match result.status {
                OperationStatus::InProgress => {
                    ExecutionRejected {
                        operation: &self.name,
                    }
                    .log();
                    return Err(OperationError::AlreadyRunning {
                        name: self.name.clone(),
                    });
                }
                status if status.is_terminal() => return Ok(result.clone()),
                _ => result.transition(&self.name, OperationStatus::InProgress)?,
            }
        }

        let _abandoned = CancelOnDrop(self);
        let started_msg = CompositeStarted {
            operation: &self.name,
            mode: self.mode(),
            child_count: self.children.len(),
            max_concurrency: if self.parallel { self.max_concurrency } else { 1 },
        };
        let span = started_msg.span(&self.name);
        started_msg.log();
        let started = Instant::now();

        let errors = async {
            if self.parallel {
                self.execute_parallel().await
            } else {
                self.execute_sequential().await
            }
        }
        .instrument(span)
        .await;

        let live = aggregate_status(self.children.iter().map(|child| child.status()));

        let mut result = self.result.write();
        if result.status.is_terminal() {
            // cancelled while children were running; keep the cancellation record first
            result.errors.extend(errors);
        } else {
            let status = if live == OperationStatus::Success && errors.is_empty() {
                OperationStatus::Success
            } else {
                OperationStatus::Failure
            };
            result.errors = errors;
            result.transition(&self.name, status)?;
        }

        CompositeCompleted {
            operation: &self.name,
            status: result.status,
            failure_count: result.errors.len(),
            duration: started.elapsed(),
        }
        .log();

        Ok(result.clone())
    }

    fn cancel(&self) {
        let previous_status = self.result.read().status;
        if previous_status.is_terminal() {
            return;
        }

        CompositeCancelled {
            operation: &self.name,
            child_count: self.children.len(),
            previous_status,
        }
        .log();

        self.cancellation.cancel();
        for child in &self.children {
            child.cancel();
        }
        self.result
            .write()
            .fail(&self.name, FailureRecord::cancelled(&self.name));
    }

    fn status(&self) -> OperationStatus {
        let stored = self.result.read().status;
        if stored.is_terminal() {
            return stored;
        }

        let live = aggregate_status(self.children.iter().map(|child| child.status()));
        match (stored, live) {
            // started but not finalized: never Pending, and not Success until execute() says so
            (OperationStatus::InProgress, OperationStatus::Pending | OperationStatus::Success) => {
                OperationStatus::InProgress
            }
            _ => live,
        }
    }

    fn result(&self) -> OperationResult {
        self.result.read().clone()
    }
}

impl std::fmt::Debug for CompositeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeOperation")
            .field("name", &self.name)
            .field("mode", &self.mode())
            .field("max_concurrency", &self.max_concurrency)
            .field("failure_strategy", &self.failure_strategy)
            .field("child_count", &self.children.len())
            .field("status", &self.status())
            .finish()
    }
}
