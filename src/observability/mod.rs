// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout The Arbor. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep event field names consistent between call sites
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::operation` - Leaf operation lifecycle events
//! * `messages::composite` - Composite execution, fan-out and cancellation events
//! * `messages::config` - Tree definition loading and validation events
//!
//! # Usage
//!
//! ```rust
//! use the_arbor::observability::messages::operation::OperationFailed;
//! use the_arbor::observability::messages::StructuredLog;
//!
//! let msg = OperationFailed {
//!     operation: "inventory-service",
//!     cause: "connection refused",
//!     duration: std::time::Duration::from_millis(12),
//! };
//!
//! msg.log();
//! ```

pub mod messages;
