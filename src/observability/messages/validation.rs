// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph validation failures.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic dependency detected while freezing a graph.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_gridwood::observability::messages::validation::CyclicDependencyDetected;
///
/// let cycle = vec!["m.a".to_string(), "m.b".to_string(), "m.a".to_string()];
/// let msg = CyclicDependencyDetected { cycle: &cycle };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub cycle: &'a [String],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cyclic_dependency",
            span_name = name,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
        )
    }
}

/// Kernels split into more than one weakly-connected component.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DisconnectedGraphDetected<'a> {
    pub components: &'a [Vec<String>],
}

impl Display for DisconnectedGraphDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph splits into {} disconnected components",
            self.components.len()
        )
    }
}

impl StructuredLog for DisconnectedGraphDetected<'_> {
    fn log(&self) {
        let listing: Vec<String> = self
            .components
            .iter()
            .map(|c| format!("[{}]", c.join(", ")))
            .collect();
        tracing::error!(
            component_count = self.components.len(),
            components = listing.join(" "),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "disconnected_graph",
            span_name = name,
            component_count = self.components.len(),
        )
    }
}

/// Graph description references something that doesn't exist.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct UnresolvedReference<'a> {
    pub referrer: &'a str,
    pub missing: &'a str,
}

impl Display for UnresolvedReference<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' references missing '{}'",
            self.referrer, self.missing
        )
    }
}

impl StructuredLog for UnresolvedReference<'_> {
    fn log(&self) {
        tracing::error!(
            referrer = self.referrer,
            missing = self.missing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unresolved_reference",
            span_name = name,
            referrer = self.referrer,
            missing = self.missing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let cycle = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let msg = CyclicDependencyDetected { cycle: &cycle };
        assert_eq!(msg.to_string(), "Cyclic dependency detected: a -> b -> a");
    }

    #[test]
    fn test_disconnected_display() {
        let components = vec![vec!["a".to_string()], vec!["b".to_string()]];
        let msg = DisconnectedGraphDetected {
            components: &components,
        };
        assert_eq!(msg.to_string(), "Graph splits into 2 disconnected components");
    }
}
