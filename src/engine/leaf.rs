// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::engine::guard::CancelOnDrop;
use crate::engine::status::{FailureRecord, OperationResult, OperationStatus};
use crate::errors::OperationError;
use crate::observability::messages::operation::{
    ExecutionRejected, OperationCancelled, OperationFailed, OperationStarted, OperationSucceeded,
    OutcomeDiscarded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{OperationNode, Work};
use crate::work::FnWork;

/// A single unit of work with no children.
///
/// The leaf hands its payload to the supplied `Work` exactly once per run.
/// Whatever happens inside the work function (an `Err`, a panic) is captured
/// into the leaf's result; nothing escapes `execute()`.
///
/// # Example
/// ```
/// use the_arbor::engine::{LeafOperation, OperationStatus};
/// use the_arbor::traits::OperationNode;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let leaf = LeafOperation::from_fn("user-service", json!({"user_id": 1}), |_payload| async {
///     anyhow::Ok(())
/// });
///
/// assert_eq!(leaf.status(), OperationStatus::Pending);
/// let result = leaf.execute().await.unwrap();
/// assert_eq!(result.status, OperationStatus::Success);
/// assert!(result.errors.is_empty());
/// # }
/// ```
pub struct LeafOperation {
    name: String,
    payload: Value,
    work: Arc<dyn Work>,
    result: RwLock<OperationResult>,
}

impl LeafOperation {
    pub fn new(name: impl Into<String>, payload: Value, work: Arc<dyn Work>) -> Self {
        Self {
            name: name.into(),
            payload,
            work,
            result: RwLock::new(OperationResult::new()),
        }
    }

    /// Build a leaf around an async closure that receives a copy of the payload.
    pub fn from_fn<F, Fut>(name: impl Into<String>, payload: Value, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(name, payload, Arc::new(FnWork::new(f)))
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    async fn run_work(&self) -> Result<(), String> {
        match AssertUnwindSafe(self.work.run(&self.payload))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(format!("{:#}", error)),
            Err(panic) => Err(format!("work panicked: {}", panic_message(panic.as_ref()))),
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

#[async_trait]
impl OperationNode for LeafOperation {
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
        OperationStarted {
            operation: &self.name,
            work: self.work.name(),
        }
        .log();
        let started = Instant::now();
        let outcome = self.run_work().await;
        let duration = started.elapsed();

        let mut result = self.result.write();
        if result.status.is_terminal() {
            // cancelled while the work was running
            OutcomeDiscarded {
                operation: &self.name,
                succeeded: outcome.is_ok(),
            }
            .log();
            return Ok(result.clone());
        }

        match outcome {
            Ok(()) => {
                result.transition(&self.name, OperationStatus::Success)?;
                OperationSucceeded {
                    operation: &self.name,
                    duration,
                }
                .log();
            }
            Err(cause) => {
                OperationFailed {
                    operation: &self.name,
                    cause: &cause,
                    duration,
                }
                .log();
                result.fail(&self.name, FailureRecord::work(&self.name, cause));
            }
        }
        Ok(result.clone())
    }

    fn cancel(&self) {
        let mut result = self.result.write();
        if result.status == OperationStatus::InProgress {
            OperationCancelled {
                operation: &self.name,
            }
            .log();
            result.fail(&self.name, FailureRecord::cancelled(&self.name));
        }
    }

    fn status(&self) -> OperationStatus {
        self.result.read().status
    }

    fn result(&self) -> OperationResult {
        self.result.read().clone()
    }
}

impl std::fmt::Debug for LeafOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafOperation")
            .field("name", &self.name)
            .field("work", &self.work.name())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::status::FailureKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn counting_leaf(name: &str, counter: Arc<AtomicUsize>, fail: bool) -> LeafOperation {
        LeafOperation::from_fn(name, json!({}), move |_payload| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if fail {
                    anyhow::bail!("downstream unavailable");
                }
                Ok(())
            }
        })
    }

    /// Leaf whose work blocks until the returned gate receives a permit.
    fn gated_leaf(name: &str) -> (Arc<LeafOperation>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let work_gate = gate.clone();
        let leaf = LeafOperation::from_fn(name, json!({}), move |_payload| {
            let gate = work_gate.clone();
            async move {
                let _permit = gate.acquire().await?;
                anyhow::Ok(())
            }
        });
        (Arc::new(leaf), gate)
    }

    async fn wait_for_status(node: &dyn OperationNode, expected: OperationStatus) {
        for _ in 0..200 {
            if node.status() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("'{}' never reached {}", node.name(), expected);
    }

    #[tokio::test]
    async fn test_status_is_pending_before_execute() {
        let leaf = counting_leaf("user", Arc::new(AtomicUsize::new(0)), false);
        assert_eq!(leaf.status(), OperationStatus::Pending);
        assert!(leaf.result().errors.is_empty());
    }

    #[tokio::test]
    async fn test_successful_execute() {
        let counter = Arc::new(AtomicUsize::new(0));
        let leaf = counting_leaf("user", counter.clone(), false);

        let result = leaf.execute().await.unwrap();

        assert_eq!(result.status, OperationStatus::Success);
        assert!(result.errors.is_empty());
        assert_eq!(leaf.status(), OperationStatus::Success);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_work_is_captured() {
        let leaf = counting_leaf("inventory", Arc::new(AtomicUsize::new(0)), true);

        let result = leaf.execute().await.unwrap();

        assert_eq!(result.status, OperationStatus::Failure);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].operation, "inventory");
        assert_eq!(result.errors[0].kind, FailureKind::Work);
        assert_eq!(result.errors[0].cause, "downstream unavailable");
    }

    #[tokio::test]
    async fn test_error_chain_is_kept_in_cause() {
        let leaf = LeafOperation::from_fn("billing", json!({}), |_payload| async {
            let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
            let outcome: anyhow::Result<()> = Err(anyhow::Error::new(io).context("invoice RPC failed"));
            outcome
        });

        let result = leaf.execute().await.unwrap();
        assert_eq!(result.errors[0].cause, "invoice RPC failed: socket closed");
    }

    #[tokio::test]
    async fn test_panicking_work_is_captured() {
        let leaf = LeafOperation::from_fn("billing", json!({}), |payload| async move {
            if payload.is_object() {
                panic!("ledger exploded");
            }
            anyhow::Ok(())
        });

        let result = leaf.execute().await.unwrap();

        assert_eq!(result.status, OperationStatus::Failure);
        assert_eq!(result.errors[0].cause, "work panicked: ledger exploded");
    }

    #[tokio::test]
    async fn test_payload_is_passed_to_work() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = seen.clone();
        let leaf = LeafOperation::from_fn("user", json!({"user_id": 7}), move |payload| {
            let sink = sink.clone();
            async move {
                *sink.lock() = Some(payload);
                anyhow::Ok(())
            }
        });

        leaf.execute().await.unwrap();
        assert_eq!(*seen.lock(), Some(json!({"user_id": 7})));
        assert_eq!(leaf.payload(), &json!({"user_id": 7}));
    }

    #[tokio::test]
    async fn test_terminal_execute_returns_cached_result() {
        let counter = Arc::new(AtomicUsize::new(0));
        let leaf = counting_leaf("inventory", counter.clone(), true);

        let first = leaf.execute().await.unwrap();
        let second = leaf.execute().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_pending_or_terminal_has_no_effect() {
        let leaf = counting_leaf("user", Arc::new(AtomicUsize::new(0)), false);
        leaf.cancel();
        assert_eq!(leaf.status(), OperationStatus::Pending);

        leaf.execute().await.unwrap();
        leaf.cancel();
        assert_eq!(leaf.status(), OperationStatus::Success);
        assert!(leaf.result().errors.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_mid_flight_forces_failure() {
        let (leaf, gate) = gated_leaf("provisioning");
        let running = leaf.clone();
        let handle = tokio::spawn(async move { running.execute().await });

        wait_for_status(leaf.as_ref(), OperationStatus::InProgress).await;
        leaf.cancel();
        assert_eq!(leaf.status(), OperationStatus::Failure);

        // the work itself is not interrupted; let it finish successfully
        gate.add_permits(1);
        let result = handle.await.unwrap().unwrap();

        assert_eq!(result.status, OperationStatus::Failure);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, FailureKind::Cancelled);
        assert_eq!(leaf.status(), OperationStatus::Failure);
    }

    #[tokio::test]
    async fn test_abandoned_execute_forces_failure() {
        let (leaf, gate) = gated_leaf("provisioning");

        let outcome = tokio::time::timeout(Duration::from_millis(20), leaf.execute()).await;
        assert!(outcome.is_err());

        assert_eq!(leaf.status(), OperationStatus::Failure);
        let result = leaf.result();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, FailureKind::Cancelled);

        // no longer stuck in progress; later calls see the cached result
        gate.add_permits(1);
        assert_eq!(leaf.execute().await.unwrap(), result);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reentrant_execute_is_rejected() {
        let (leaf, gate) = gated_leaf("provisioning");
        let running = leaf.clone();
        let handle = tokio::spawn(async move { running.execute().await });

        wait_for_status(leaf.as_ref(), OperationStatus::InProgress).await;
        let err = leaf.execute().await.unwrap_err();
        assert_eq!(
            err,
            OperationError::AlreadyRunning {
                name: "provisioning".to_string()
            }
        );

        gate.add_permits(1);
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.status, OperationStatus::Success);
    }
}
