// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur while validating an execution graph or its
/// declarative description.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No kernels were registered.
    EmptyGraph,
    /// The kernels do not form a single weakly-connected component.
    DisconnectedGraph {
        /// Kernel names grouped by component, in registration order
        components: Vec<Vec<String>>,
    },
    /// A circular dependency was detected between kernels
    CyclicDependency {
        /// The cycle path showing the circular dependency
        cycle: Vec<String>,
    },
    /// A connection references a kernel that was never added
    UnknownKernel { kernel: String },
    /// The same kernel or graph-local id was registered twice
    DuplicateKernel { kernel: String },
    /// A graph description references an id or symbol that doesn't exist
    UnresolvedReference {
        /// Where the reference was made
        referrer: String,
        /// The reference that couldn't be resolved
        missing: String,
    },
    /// A connection's type description could not be turned into a Type
    InvalidTypeSpec { connection: String, reason: String },
    /// A described connection names both or neither of its consumer forms
    InvalidConnection { connection: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyGraph => write!(f, "Graph has no kernels"),
            ValidationError::DisconnectedGraph { components } => {
                write!(f, "Graph is not connected: {} components", components.len())?;
                for component in components {
                    write!(f, " [{}]", component.join(", "))?;
                }
                Ok(())
            }
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnknownKernel { kernel } => {
                write!(f, "Kernel '{}' was not added to the graph", kernel)
            }
            ValidationError::DuplicateKernel { kernel } => {
                write!(f, "Duplicate kernel: '{}'", kernel)
            }
            ValidationError::UnresolvedReference { referrer, missing } => {
                write!(f, "'{}' references '{}' which does not exist", referrer, missing)
            }
            ValidationError::InvalidTypeSpec { connection, reason } => {
                write!(f, "Connection '{}' has an invalid type: {}", connection, reason)
            }
            ValidationError::InvalidConnection { connection, reason } => {
                write!(f, "Connection '{}' is invalid: {}", connection, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
