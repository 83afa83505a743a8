// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! `StructuredLog` to emit the same event with typed fields at the level the
//! message belongs to.
//!
//! # Organization
//!
//! * `operation` - Leaf operation lifecycle events
//! * `composite` - Composite execution, fan-out and cancellation events
//! * `config` - Tree definition loading and validation events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_arbor::observability::messages::composite::CompositeStarted;
//! use the_arbor::observability::messages::StructuredLog;
//!
//! let msg = CompositeStarted {
//!     operation: "bulk-update",
//!     mode: "parallel",
//!     child_count: 3,
//!     max_concurrency: 4,
//! };
//!
//! let span = msg.span("bulk-update");
//! let _guard = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod composite;
pub mod config;
pub mod operation;

/// Emit a message as a structured tracing event, or open a span carrying its fields.
pub trait StructuredLog {
    /// Emit the message at its designated level with structured fields.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
