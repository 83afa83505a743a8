// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use the_arbor::config::{load_and_validate_config, RuntimeBuilder};
use the_arbor::engine::{CompositeOperation, LeafOperation, OperationResult};
use the_arbor::traits::OperationNode;
use the_arbor::work::{SimulatedWork, WorkRegistry};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} [tree.yaml | tree.toml]", args[0]);
        eprintln!("Example: {} configs/bulk-update.yaml", args[0]);
        eprintln!("Without a definition file the built-in bulk update demo runs.");
        std::process::exit(1);
    }

    match args.get(1) {
        Some(path) => run_config(path).await,
        None => run_builtin_demo().await,
    }
}

/// Build a tree from a definition file and run it.
async fn run_config(path: &str) -> anyhow::Result<()> {
    let config = load_and_validate_config(path)
        .with_context(|| format!("failed to load tree definition {}", path))?;
    let root = RuntimeBuilder::from_config(&config, &WorkRegistry::with_builtins())
        .with_context(|| format!("failed to build operation tree from {}", path))?;

    println!("📋 Tree definition: {}", path);
    println!("🌳 Root: {} ({} nodes)", root.name(), config.root.node_count());
    println!("🛡️  Failure Strategy: {:?}", config.failure_strategy);
    println!();

    let started = Instant::now();
    let result = root.execute().await?;
    report(root.name(), &result, started.elapsed());
    Ok(())
}

/// Run a bulk update against three simulated services, one of which fails,
/// printing progress while it runs.
async fn run_builtin_demo() -> anyhow::Result<()> {
    let service = |name: &str, payload, fail| {
        let work = if fail {
            SimulatedWork::failing(Duration::from_millis(300))
        } else {
            SimulatedWork::succeeding(Duration::from_millis(500))
        };
        LeafOperation::new(name, payload, Arc::new(work))
    };

    let billing_flow = CompositeOperation::sequential("billing-service")
        .with_child(service("invoice", json!({"account": "acct-9"}), false))
        .with_child(service("payment", json!({"account": "acct-9", "amount": 42}), false));

    let bulk = Arc::new(
        CompositeOperation::parallel("bulk-update")
            .with_child(service("user-service", json!({"user_id": 1}), false))
            .with_child(service("inventory-service", json!({"sku": "A1"}), true))
            .with_child(billing_flow),
    );

    println!("🚀 The Arbor bulk update demo");
    println!("═══════════════════════════════");
    println!();

    let started = Instant::now();
    let running = bulk.clone();
    let handle = tokio::spawn(async move { running.execute().await });

    while !handle.is_finished() {
        println!("⏳ {}: {:5.1}% ({})", bulk.name(), bulk.progress(), bulk.status());
        tokio::time::sleep(PROGRESS_INTERVAL).await;
    }

    let result = handle.await??;
    report(bulk.name(), &result, started.elapsed());
    Ok(())
}

fn report(name: &str, result: &OperationResult, elapsed: Duration) {
    println!();
    println!("📊 Execution Results:");
    println!("⏱️  Execution Time: {:?}", elapsed);
    println!("🔢 Status of {}: {}", name, result.status);

    if result.errors.is_empty() {
        println!("✅ No failures");
        return;
    }

    println!("❌ {} failure(s):", result.errors.len());
    for error in &result.errors {
        println!("   • [{:?}] {}", error.kind, error);
    }
}
