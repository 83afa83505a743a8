// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for loading tree definitions and instantiating their work functions.

use crate::errors::ValidationError;
use thiserror::Error;

/// Errors that can occur while turning a tree definition into runnable nodes
#[derive(Error, Debug)]
pub enum BuildError {
    /// The definition file could not be read.
    #[error("failed to read tree definition: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML definition could not be parsed.
    #[error("failed to parse YAML tree definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The TOML definition could not be parsed.
    #[error("failed to parse TOML tree definition: {0}")]
    Toml(#[from] toml::de::Error),

    /// The definition parsed but is structurally invalid.
    #[error("tree definition validation failed:\n{}", join_lines(.0))]
    Invalid(Vec<ValidationError>),

    /// A leaf references a work kind the registry does not know.
    #[error("operation '{operation}' references unknown work '{work}'")]
    UnknownWork { operation: String, work: String },

    /// The registry knows the work kind but rejected the leaf's options.
    #[error("failed to create work '{work}' for operation '{operation}': {reason}")]
    WorkCreationFailed {
        operation: String,
        work: String,
        reason: String,
    },
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
