// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded fan-out and structured join for the children of a parallel composite.
//!
//! Every child gets its own tokio task in a `JoinSet`, but a task only starts
//! its child after acquiring a permit from a semaphore sized to the
//! composite's `max_concurrency`. The joining future drains the set with
//! `join_next()`, so each child's result is consumed exactly once, in
//! completion order, by a single owner. Worker tasks never touch a shared
//! error list.
//!
//! ## Skipping
//!
//! A worker checks the halt token after acquiring its permit and before
//! starting its child. The halt token is a child of the composite's
//! cancellation token, so it trips when the composite is cancelled. Under
//! `FailureStrategy::FailFast` a worker whose child failed trips it too,
//! before releasing its permit, so no queued sibling can slip past.
//! Children already running are never interrupted.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::engine::leaf::panic_message;
use crate::engine::status::{FailureRecord, OperationResult};
use crate::errors::FailureStrategy;
use crate::observability::messages::composite::{
    ChildPanicked, ChildRejected, ChildrenSkipped, SkipReason, WorkerJoinFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::OperationNode;

/// Outcome of one worker task.
enum WorkerOutcome {
    Ran(OperationResult),
    Skipped,
}

/// Runs a set of sibling nodes with at most `max_concurrency` executing at once.
pub(crate) struct ExecutionCoordinator<'a> {
    pub operation: &'a str,
    pub max_concurrency: usize,
    pub failure_strategy: FailureStrategy,
    pub cancellation: &'a CancellationToken,
}

impl ExecutionCoordinator<'_> {
    /// Execute every child and wait for all of them to finish or be skipped.
    ///
    /// Returns the failure records of all children, in completion order.
    pub(crate) async fn run_all(&self, children: &[Arc<dyn OperationNode>]) -> Vec<FailureRecord> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency.max(1)));
        let halt = self.cancellation.child_token();
        let mut workers = JoinSet::new();

        for child in children {
            let child = Arc::clone(child);
            let semaphore = Arc::clone(&semaphore);
            let halt = halt.clone();
            let operation = self.operation.to_string();
            let halts_on_failure = self.failure_strategy.halts_on_failure();

            workers.spawn(
                async move {
                    // the semaphore is owned by this call and never closed
                    let Ok(_permit) = semaphore.acquire().await else {
                        return WorkerOutcome::Skipped;
                    };
                    if halt.is_cancelled() {
                        return WorkerOutcome::Skipped;
                    }
                    let result = run_child(&operation, child.as_ref()).await;
                    if halts_on_failure && result.is_failure() {
                        halt.cancel();
                    }
                    WorkerOutcome::Ran(result)
                }
                .in_current_span(),
            );
        }

        let mut errors = Vec::new();
        let mut skipped = 0;
        let mut any_failed = false;

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(WorkerOutcome::Ran(result)) => {
                    any_failed |= result.is_failure();
                    errors.extend(result.errors);
                }
                Ok(WorkerOutcome::Skipped) => skipped += 1,
                Err(join_error) => {
                    // child panics are caught in run_child, so only an aborted worker lands here
                    WorkerJoinFailed {
                        operation: self.operation,
                        error: &join_error,
                    }
                    .log();
                    errors.push(FailureRecord::work(
                        self.operation,
                        format!("worker task failed: {}", join_error),
                    ));
                }
            }
        }

        if skipped > 0 {
            let reason = if any_failed
                && self.failure_strategy.halts_on_failure()
                && !self.cancellation.is_cancelled()
            {
                SkipReason::FailFast
            } else {
                SkipReason::Cancelled
            };
            ChildrenSkipped {
                operation: self.operation,
                skipped,
                reason,
            }
            .log();
        }

        errors
    }
}

/// Execute one child on behalf of `operation`.
///
/// A usage error becomes a `Rejected` record. A panic out of the child's own
/// `execute()` becomes a `Work` record attributed to the child, and the child
/// is cancelled so it does not stay `InProgress`.
pub(crate) async fn run_child(operation: &str, child: &dyn OperationNode) -> OperationResult {
    match AssertUnwindSafe(child.execute()).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(error)) => {
            ChildRejected {
                operation,
                child: child.name(),
                error: &error,
            }
            .log();
            OperationResult::failed(FailureRecord::rejected(child.name(), &error))
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            ChildPanicked {
                operation,
                child: child.name(),
                message,
            }
            .log();
            child.cancel();
            OperationResult::failed(FailureRecord::work(
                child.name(),
                format!("operation panicked: {}", message),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LeafOperation;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Leaves that record how many of them are running at the same time.
    fn tracked_children(
        count: usize,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    ) -> Vec<Arc<dyn OperationNode>> {
        (0..count)
            .map(|i| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                let leaf = LeafOperation::from_fn(format!("leaf-{i}"), json!({}), move |_payload| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        anyhow::Ok(())
                    }
                });
                Arc::new(leaf) as Arc<dyn OperationNode>
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let children = tracked_children(10, in_flight.clone(), peak.clone());
        let token = CancellationToken::new();

        let coordinator = ExecutionCoordinator {
            operation: "wide",
            max_concurrency: 3,
            failure_strategy: FailureStrategy::BestEffort,
            cancellation: &token,
        };
        let errors = coordinator.run_all(&children).await;

        assert!(errors.is_empty());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(children.iter().all(|c| c.result().is_success()));
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_every_child() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let children = tracked_children(4, in_flight, peak.clone());
        let token = CancellationToken::new();
        token.cancel();

        let coordinator = ExecutionCoordinator {
            operation: "wide",
            max_concurrency: 2,
            failure_strategy: FailureStrategy::BestEffort,
            cancellation: &token,
        };
        let errors = coordinator.run_all(&children).await;

        assert!(errors.is_empty());
        assert_eq!(peak.load(Ordering::SeqCst), 0);
        assert!(children.iter().all(|c| c.result().is_pending()));
    }

    #[tokio::test]
    async fn test_rejected_child_becomes_failure_record() {
        let leaf = Arc::new(LeafOperation::from_fn("busy", json!({}), |_payload| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            anyhow::Ok(())
        }));
        let running = leaf.clone();
        let handle = tokio::spawn(async move { running.execute().await });
        while leaf.status() != crate::engine::OperationStatus::InProgress {
            tokio::task::yield_now().await;
        }

        let result = run_child("parent", leaf.as_ref()).await;
        assert!(result.is_failure());
        assert_eq!(result.errors[0].kind, crate::engine::FailureKind::Rejected);
        assert_eq!(result.errors[0].operation, "busy");

        assert!(handle.await.unwrap().unwrap().is_success());
    }

    /// Node whose execute() panics after it has started.
    struct ExplodingNode {
        result: parking_lot::RwLock<OperationResult>,
    }

    #[async_trait::async_trait]
    impl OperationNode for ExplodingNode {
        fn name(&self) -> &str {
            "exploder"
        }

        async fn execute(&self) -> Result<OperationResult, crate::errors::OperationError> {
            self.result
                .write()
                .transition("exploder", crate::engine::OperationStatus::InProgress)?;
            panic!("node exploded");
        }

        fn cancel(&self) {
            self.result
                .write()
                .fail("exploder", FailureRecord::cancelled("exploder"));
        }

        fn status(&self) -> crate::engine::OperationStatus {
            self.result.read().status
        }

        fn result(&self) -> OperationResult {
            self.result.read().clone()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_child_is_attributed_to_the_child() {
        let exploder = Arc::new(ExplodingNode {
            result: parking_lot::RwLock::new(OperationResult::new()),
        });
        let ok = LeafOperation::from_fn("steady", json!({}), |_payload| async { anyhow::Ok(()) });
        let children: Vec<Arc<dyn OperationNode>> = vec![exploder.clone(), Arc::new(ok)];
        let token = CancellationToken::new();

        let coordinator = ExecutionCoordinator {
            operation: "batch",
            max_concurrency: 2,
            failure_strategy: FailureStrategy::BestEffort,
            cancellation: &token,
        };
        let errors = coordinator.run_all(&children).await;

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].operation, "exploder");
        assert_eq!(errors[0].kind, crate::engine::FailureKind::Work);
        assert_eq!(errors[0].cause, "operation panicked: node exploded");
        assert_eq!(exploder.status(), crate::engine::OperationStatus::Failure);
        assert!(children[1].result().is_success());
    }
}
