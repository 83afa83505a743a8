// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation for operation tree definitions.
//!
//! The definition is walked once, depth first, and every problem found is
//! collected so a user can fix them all in one pass:
//!
//! 1. **Names**: every node has a non-empty name, unique among its siblings
//! 2. **Shape**: every node is exactly one of leaf (`work`) or composite (`children`)
//! 3. **Bounds**: no `max_concurrency` of zero, globally or per composite
//!
//! Cycles and shared children cannot be expressed in a nested definition, so
//! there is nothing to check for them here.
//!
//! Errors name nodes by their slash-separated path from the root
//! (`bulk-update/billing-flow/invoice`), since names are only unique among
//! siblings.

use std::collections::HashSet;

use crate::config::consts::ROOT_SCOPE;
use crate::config::{Config, OperationConfig};
use crate::errors::ValidationError;

/// Validate a whole tree definition, returning every error found.
///
/// # Example
/// ```
/// use the_arbor::config::{validate_tree, Config};
///
/// let config: Config = serde_yaml::from_str(r#"
/// root:
///   name: bulk-update
///   children:
///     - name: user-service
///       work: simulated
///     - name: user-service
///       children: []
/// "#).unwrap();
///
/// let errors = validate_tree(&config).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// ```
pub fn validate_tree(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.executor_options.max_concurrency == Some(0) {
        errors.push(ValidationError::ZeroConcurrency {
            scope: "executor_options".to_string(),
        });
    }

    validate_node(&config.root, ROOT_SCOPE, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_node(node: &OperationConfig, parent: &str, errors: &mut Vec<ValidationError>) {
    if node.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName {
            parent: parent.to_string(),
        });
    }
    let path = node_path(parent, &node.name);

    match (&node.work, &node.children) {
        (Some(_), Some(_)) => errors.push(ValidationError::AmbiguousNode { name: path.clone() }),
        (None, None) => errors.push(ValidationError::UndefinedNode { name: path.clone() }),
        _ => {}
    }

    let Some(children) = &node.children else {
        return;
    };

    if node.max_concurrency == Some(0) {
        errors.push(ValidationError::ZeroConcurrency {
            scope: path.clone(),
        });
    }

    let mut seen = HashSet::new();
    for child in children {
        if !child.name.is_empty() && !seen.insert(child.name.as_str()) {
            errors.push(ValidationError::DuplicateSiblingName {
                parent: path.clone(),
                name: child.name.clone(),
            });
        }
    }

    for child in children {
        validate_node(child, &path, errors);
    }
}

fn node_path(parent: &str, name: &str) -> String {
    if parent == ROOT_SCOPE {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_nested_tree() {
        let config = parse(
            r#"
executor_options:
  max_concurrency: 2
root:
  name: root
  parallel: true
  children:
    - name: A
      work: simulated
    - name: billing-flow
      children:
        - name: invoice
          work: simulated
        - name: payment
          work: simulated
    - name: C
      work: simulated
"#,
        );
        assert!(validate_tree(&config).is_ok());
    }

    #[test]
    fn test_same_name_in_different_subtrees_is_allowed() {
        let config = parse(
            r#"
root:
  name: root
  children:
    - name: left
      children:
        - name: step
          work: simulated
    - name: right
      children:
        - name: step
          work: simulated
"#,
        );
        assert!(validate_tree(&config).is_ok());
    }

    #[test]
    fn test_duplicate_sibling_names() {
        let config = parse(
            r#"
root:
  name: root
  children:
    - name: flow
      children:
        - name: step
          work: simulated
        - name: step
          work: simulated
"#,
        );
        let errors = validate_tree(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateSiblingName {
                parent: "root/flow".to_string(),
                name: "step".to_string(),
            }]
        );
    }

    #[test]
    fn test_node_shape_errors() {
        let config = parse(
            r#"
root:
  name: root
  children:
    - name: both
      work: simulated
      children: []
    - name: neither
"#,
        );
        let errors = validate_tree(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::AmbiguousNode {
                    name: "root/both".to_string()
                },
                ValidationError::UndefinedNode {
                    name: "root/neither".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_empty_name_and_zero_concurrency() {
        let config = parse(
            r#"
executor_options:
  max_concurrency: 0
root:
  name: root
  parallel: true
  max_concurrency: 0
  children:
    - name: "  "
      work: simulated
"#,
        );
        let errors = validate_tree(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroConcurrency {
            scope: "executor_options".to_string()
        }));
        assert!(errors.contains(&ValidationError::ZeroConcurrency {
            scope: "root".to_string()
        }));
        assert!(errors.contains(&ValidationError::EmptyName {
            parent: "root".to_string()
        }));
    }

    #[test]
    fn test_missing_root_name() {
        let config = parse(
            r#"
root:
  work: simulated
"#,
        );
        let errors = validate_tree(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::EmptyName {
                parent: ROOT_SCOPE.to_string()
            }]
        );
    }
}
