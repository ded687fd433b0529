// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Checks a graph description before any kernel or buffer is touched.
//!
//! Every problem is collected, so a description with three typos reports
//! three errors. The checks are the ones that only need the description and a
//! [`KernelRegistry`]:
//!
//! 1. **Uniqueness**: graph-local ids, and the registered kernels behind them
//! 2. **References**: kernel and field names resolve, connection ends exist
//! 3. **Shapes**: each connection names exactly one consumer, and every
//!    connection and output has a buildable type
//!
//! Connectivity and cycles are whole-graph properties and are left to
//! [`ExecutionGraphBuilder::create`](crate::engine::ExecutionGraphBuilder::create).

use crate::config::GraphConfig;
use crate::errors::ValidationError;
use crate::kernel::KernelRegistry;
use crate::observability::messages::validation::UnresolvedReference;
use crate::observability::messages::StructuredLog;
use std::collections::{HashMap, HashSet};

/// Validates `cfg` against `registry`, returning every problem found.
pub fn validate_graph_config(
    cfg: &GraphConfig,
    registry: &KernelRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if cfg.kernels.is_empty() {
        errors.push(ValidationError::EmptyGraph);
    }

    let mut ids: HashSet<&str> = HashSet::new();
    let mut symbols: HashMap<&str, &str> = HashMap::new();
    for kernel in &cfg.kernels {
        if !ids.insert(kernel.id.as_str()) {
            errors.push(ValidationError::DuplicateKernel {
                kernel: kernel.id.clone(),
            });
            continue;
        }
        if !registry.contains_kernel(&kernel.kernel) {
            errors.push(unresolved(&kernel.id, &kernel.kernel));
            continue;
        }
        // Two ids for one registered kernel would alias the same node.
        if let Some(first) = symbols.insert(kernel.kernel.as_str(), kernel.id.as_str()) {
            errors.push(ValidationError::DuplicateKernel {
                kernel: format!("{} (as '{}' and '{}')", kernel.kernel, first, kernel.id),
            });
        }
    }

    for connection in &cfg.connections {
        let label = connection.label();
        if !ids.contains(connection.from.as_str()) {
            errors.push(unresolved(&label, &connection.from));
        }
        match (&connection.to, &connection.field) {
            (Some(to), None) => {
                if !ids.contains(to.as_str()) {
                    errors.push(unresolved(&label, to));
                }
            }
            (None, Some(field)) => {
                if !registry.contains_field(field) {
                    errors.push(unresolved(&label, field));
                }
            }
            (Some(_), Some(_)) => errors.push(ValidationError::InvalidConnection {
                connection: label.clone(),
                reason: "'to' and 'field' are mutually exclusive".to_string(),
            }),
            (None, None) => errors.push(ValidationError::InvalidConnection {
                connection: label.clone(),
                reason: "one of 'to' or 'field' is required".to_string(),
            }),
        }
        if let Err(e) = connection.ty.to_type() {
            errors.push(ValidationError::InvalidTypeSpec {
                connection: label,
                reason: e.to_string(),
            });
        }
    }

    for output in &cfg.outputs {
        let label = format!("output of {}", output.kernel);
        if !ids.contains(output.kernel.as_str()) {
            errors.push(unresolved(&label, &output.kernel));
        }
        if let Err(e) = output.ty.to_type() {
            errors.push(ValidationError::InvalidTypeSpec {
                connection: label,
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn unresolved(referrer: &str, missing: &str) -> ValidationError {
    UnresolvedReference { referrer, missing }.log();
    ValidationError::UnresolvedReference {
        referrer: referrer.to_string(),
        missing: missing.to_string(),
    }
}
