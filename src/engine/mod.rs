// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operation-tree execution engine: leaves, composites and the parallel coordinator.

pub mod composite;
mod coordinator;
mod guard;
pub mod leaf;
pub mod status;

pub use composite::CompositeOperation;
pub use leaf::LeafOperation;
pub use status::{aggregate_status, FailureKind, FailureRecord, OperationResult, OperationStatus};
