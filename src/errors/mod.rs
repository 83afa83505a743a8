// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod build;
mod config;
mod execution;

pub use build::BuildError;
pub use config::ValidationError;
pub use execution::{FailureStrategy, OperationError};
