// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

/// The unit of work a `LeafOperation` runs.
///
/// Implementations wrap whatever external collaborator the leaf stands for
/// (an RPC, a provisioning call, a simulated delay). Returning `Err` marks the
/// leaf as failed with the error chain as the cause; the engine never retries.
#[async_trait]
pub trait Work: Send + Sync {
    async fn run(&self, payload: &Value) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        "anonymous"
    }
}
