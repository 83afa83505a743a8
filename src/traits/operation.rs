// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{OperationResult, OperationStatus};
use crate::errors::OperationError;

/// Contract shared by every node in an operation tree.
///
/// Both `LeafOperation` and `CompositeOperation` implement this trait, so a
/// composite can hold either variant as a child and nesting is unrestricted.
/// Every method takes `&self`: a node owns its result behind interior
/// mutability so status can be observed while `execute()` is still running.
#[async_trait]
pub trait OperationNode: Send + Sync {
    /// Name used in logs and failure records.
    fn name(&self) -> &str;

    /// Run the node to a terminal state and return its result.
    ///
    /// - Work failures are captured in the returned result, never returned as `Err`.
    /// - A node that is already terminal returns its stored result without re-running anything.
    /// - Calling this while the node is `InProgress` returns `OperationError::AlreadyRunning`.
    /// - Dropping the returned future before it resolves cancels the node, so it
    ///   ends `Failure` rather than staying `InProgress`.
    async fn execute(&self) -> Result<OperationResult, OperationError>;

    /// Cooperatively cancel the node. Work already running is not interrupted;
    /// only the recorded status is forced to `Failure`.
    fn cancel(&self);

    /// Current status, without side effects.
    fn status(&self) -> OperationStatus;

    /// Snapshot of the node's current result.
    fn result(&self) -> OperationResult;
}
