// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur while validating an operation tree definition
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A node was declared without a name
    EmptyName {
        /// Slash-separated path of the parent composite
        parent: String,
    },
    /// A node declares both `work` and `children`
    AmbiguousNode {
        /// The node name
        name: String,
    },
    /// A node declares neither `work` nor `children`
    UndefinedNode {
        /// The node name
        name: String,
    },
    /// Two siblings share a name, which makes failure records ambiguous
    DuplicateSiblingName {
        /// Slash-separated path of the parent composite
        parent: String,
        /// The duplicated name
        name: String,
    },
    /// A concurrency bound of zero was configured
    ZeroConcurrency {
        /// Where the bound was set (`executor_options` or a composite name)
        scope: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName { parent } => {
                write!(f, "Operation under '{}' has an empty name", parent)
            }
            ValidationError::AmbiguousNode { name } => {
                write!(
                    f,
                    "Operation '{}' declares both 'work' and 'children'; a node is either a leaf or a composite",
                    name
                )
            }
            ValidationError::UndefinedNode { name } => {
                write!(
                    f,
                    "Operation '{}' declares neither 'work' nor 'children'",
                    name
                )
            }
            ValidationError::DuplicateSiblingName { parent, name } => {
                write!(f, "Duplicate operation name '{}' under '{}'", name, parent)
            }
            ValidationError::ZeroConcurrency { scope } => {
                write!(f, "max_concurrency for '{}' must be at least 1", scope)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
