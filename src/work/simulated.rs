// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::traits::Work;
use crate::work::WorkOptions;

/// Latency used by the demo tree to mimic a remote call
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(500);

/// A work function that stands in for a remote service call.
///
/// It sleeps for `latency` and then either succeeds or fails with a
/// simulated error. Used by the demo binary and as a test double.
#[derive(Debug, Clone)]
pub struct SimulatedWork {
    pub latency: Duration,
    pub fail: bool,
}

impl SimulatedWork {
    pub fn succeeding(latency: Duration) -> Self {
        Self {
            latency,
            fail: false,
        }
    }

    pub fn failing(latency: Duration) -> Self {
        Self {
            latency,
            fail: true,
        }
    }

    /// Build from leaf options: `latency_ms` (default 500) and `fail` (default false).
    pub fn from_options(options: &WorkOptions) -> Result<Self, String> {
        let latency = match options.get("latency_ms") {
            None => DEFAULT_SIMULATED_LATENCY,
            Some(value) => value
                .as_u64()
                .map(Duration::from_millis)
                .ok_or_else(|| format!("'latency_ms' must be a non-negative integer, got {}", value))?,
        };
        let fail = match options.get("fail") {
            None => false,
            Some(value) => value
                .as_bool()
                .ok_or_else(|| format!("'fail' must be a boolean, got {}", value))?,
        };
        Ok(Self { latency, fail })
    }
}

#[async_trait]
impl Work for SimulatedWork {
    async fn run(&self, payload: &Value) -> anyhow::Result<()> {
        tokio::time::sleep(self.latency).await;
        if self.fail {
            anyhow::bail!("Operation {} failed due to simulated error", payload);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
