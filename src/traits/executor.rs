// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::allocation::SharedAllocation;
use crate::kernel::{FieldPort, KernelNode};
use async_trait::async_trait;
use std::fmt;

/// Everything a backend needs to run one kernel body.
///
/// `input` and `output` are the kernel's positional arguments: edge buffers
/// for internal connections, caller bindings on the graph boundary. `fields`
/// lists the global inputs fed by field-port connections.
#[derive(Clone)]
pub struct KernelLaunch {
    pub kernel: KernelNode,
    pub input: Option<SharedAllocation>,
    pub output: Option<SharedAllocation>,
    pub fields: Vec<(FieldPort, SharedAllocation)>,
}

impl KernelLaunch {
    pub fn new(kernel: KernelNode) -> Self {
        Self {
            kernel,
            input: None,
            output: None,
            fields: Vec::new(),
        }
    }
}

impl fmt::Debug for KernelLaunch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelLaunch")
            .field("kernel", &self.kernel)
            .field("input", &self.input.is_some())
            .field("output", &self.output.is_some())
            .field(
                "fields",
                &self.fields.iter().map(|(port, _)| port).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Runs kernel bodies on behalf of an execution graph.
///
/// The graph calls `launch` once per kernel, in schedule order, and awaits
/// each call before issuing the next. A returned error stops the run and is
/// surfaced to the caller unchanged as a runtime failure.
#[async_trait]
pub trait KernelExecutor: Send + Sync {
    async fn launch(&self, launch: &KernelLaunch) -> anyhow::Result<()>;

    /// Short backend name for log lines.
    fn name(&self) -> &'static str;
}
