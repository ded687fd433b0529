// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for execution graph lifecycle and kernel dispatch.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Graph passed validation and was frozen.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_gridwood::observability::messages::graph::GraphValidated;
///
/// let msg = GraphValidated {
///     graph: "blur",
///     kernel_count: 3,
///     connection_count: 2,
///     edge_buffers: 2,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct GraphValidated<'a> {
    pub graph: &'a str,
    pub kernel_count: usize,
    pub connection_count: usize,
    pub edge_buffers: usize,
}

impl Display for GraphValidated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validated graph '{}': {} kernels, {} connections, {} edge buffers",
            self.graph, self.kernel_count, self.connection_count, self.edge_buffers
        )
    }
}

impl StructuredLog for GraphValidated<'_> {
    fn log(&self) {
        tracing::info!(
            graph = self.graph,
            kernel_count = self.kernel_count,
            connection_count = self.connection_count,
            edge_buffers = self.edge_buffers,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_validated",
            span_name = name,
            graph = self.graph,
            kernel_count = self.kernel_count,
            connection_count = self.connection_count,
        )
    }
}

/// Graph execution started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GraphExecutionStarted<'a> {
    pub graph: &'a str,
    pub kernel_count: usize,
    pub run: u64,
}

impl Display for GraphExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing graph '{}' (run {}): {} kernels",
            self.graph, self.run, self.kernel_count
        )
    }
}

impl StructuredLog for GraphExecutionStarted<'_> {
    fn log(&self) {
        tracing::info!(
            graph = self.graph,
            kernel_count = self.kernel_count,
            run = self.run,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_execution",
            span_name = name,
            graph = self.graph,
            kernel_count = self.kernel_count,
            run = self.run,
        )
    }
}

/// Graph execution completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GraphExecutionCompleted<'a> {
    pub graph: &'a str,
    pub kernel_count: usize,
    pub duration: std::time::Duration,
}

impl Display for GraphExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph '{}' completed: {} kernels in {:?}",
            self.graph, self.kernel_count, self.duration
        )
    }
}

impl StructuredLog for GraphExecutionCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            graph = self.graph,
            kernel_count = self.kernel_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_execution_completed",
            span_name = name,
            graph = self.graph,
            kernel_count = self.kernel_count,
            duration = ?self.duration,
        )
    }
}

/// Kernel dispatched to the executor.
///
/// # Log Level
/// `debug!` - Per-kernel detail
pub struct KernelLaunchStarted<'a> {
    pub graph: &'a str,
    pub kernel: &'a str,
    pub position: usize,
}

impl Display for KernelLaunchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Launching kernel '{}' (step {}) in graph '{}'",
            self.kernel, self.position, self.graph
        )
    }
}

impl StructuredLog for KernelLaunchStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            graph = self.graph,
            kernel = self.kernel,
            position = self.position,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "kernel_launch",
            span_name = name,
            graph = self.graph,
            kernel = self.kernel,
            position = self.position,
        )
    }
}

/// Kernel returned successfully.
///
/// # Log Level
/// `debug!` - Per-kernel detail
pub struct KernelLaunchCompleted<'a> {
    pub kernel: &'a str,
    pub duration: std::time::Duration,
}

impl Display for KernelLaunchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Kernel '{}' completed in {:?}", self.kernel, self.duration)
    }
}

impl StructuredLog for KernelLaunchCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            kernel = self.kernel,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "kernel_completed",
            span_name = name,
            kernel = self.kernel,
            duration = ?self.duration,
        )
    }
}

/// Kernel body failed inside the executor.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct KernelLaunchFailed<'a> {
    pub kernel: &'a str,
    pub error: &'a dyn std::fmt::Display,
}

impl Display for KernelLaunchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Kernel '{}' failed: {}", self.kernel, self.error)
    }
}

impl StructuredLog for KernelLaunchFailed<'_> {
    fn log(&self) {
        tracing::error!(
            kernel = self.kernel,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "kernel_failed",
            span_name = name,
            kernel = self.kernel,
            error = %self.error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_graph_validated_display() {
        let msg = GraphValidated {
            graph: "blur",
            kernel_count: 3,
            connection_count: 2,
            edge_buffers: 2,
        };
        assert_eq!(
            msg.to_string(),
            "Validated graph 'blur': 3 kernels, 2 connections, 2 edge buffers"
        );
    }

    #[test]
    fn test_kernel_failed_display() {
        let err = anyhow::anyhow!("out of range");
        let msg = KernelLaunchFailed {
            kernel: "blur.vertical",
            error: &err,
        };
        assert_eq!(msg.to_string(), "Kernel 'blur.vertical' failed: out of range");
    }

    #[test]
    fn test_completed_display_includes_duration() {
        let msg = GraphExecutionCompleted {
            graph: "g",
            kernel_count: 2,
            duration: Duration::from_millis(5),
        };
        assert!(msg.to_string().contains("5ms"));
    }
}
