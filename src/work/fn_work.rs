// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

use crate::traits::Work;

/// Adapts an async closure into a `Work` implementation.
///
/// The closure receives an owned copy of the payload so the returned future
/// does not borrow from the leaf.
pub struct FnWork<F> {
    f: F,
    name: String,
}

impl<F, Fut> FnWork<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            name: "fn".to_string(),
        }
    }

    pub fn named(name: impl Into<String>, f: F) -> Self {
        Self {
            f,
            name: name.into(),
        }
    }
}

#[async_trait]
impl<F, Fut> Work for FnWork<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, payload: &Value) -> anyhow::Result<()> {
        (self.f)(payload.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
