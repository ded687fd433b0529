// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::allocation::SharedAllocation;
use crate::config::consts::UNNAMED_GRAPH;
use crate::errors::{Error, Result};
use crate::kernel::{FieldPort, KernelNode};
use crate::observability::messages::graph::{
    GraphExecutionCompleted, GraphExecutionStarted, KernelLaunchCompleted, KernelLaunchFailed,
    KernelLaunchStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{KernelExecutor, KernelLaunch};
use std::collections::HashMap;
use std::time::Instant;
use tracing::Instrument;

/// Lifecycle of a validated graph. There is no way back to building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Returned by `create()`, nothing bound or run yet.
    Validated,
    /// Bound or executed at least once.
    Executable,
}

#[derive(Debug)]
pub(super) struct KernelEntry {
    pub(super) kernel: KernelNode,
    pub(super) predecessors: Vec<usize>,
    pub(super) successors: Vec<usize>,
    /// Producer feeding the positional input.
    pub(super) input_from: Option<usize>,
    /// Field ports fed by a producer.
    pub(super) fields: Vec<(FieldPort, usize)>,
    /// Graph-owned output buffer, present when the kernel has consumers.
    pub(super) edge_buffer: Option<SharedAllocation>,
    bound_input: Option<SharedAllocation>,
    bound_output: Option<SharedAllocation>,
}

impl KernelEntry {
    pub(super) fn new(kernel: KernelNode) -> Self {
        Self {
            kernel,
            predecessors: Vec::new(),
            successors: Vec::new(),
            input_from: None,
            fields: Vec::new(),
            edge_buffer: None,
            bound_input: None,
            bound_output: None,
        }
    }

    fn is_input_boundary(&self) -> bool {
        self.input_from.is_none()
    }

    fn is_output_boundary(&self) -> bool {
        self.edge_buffer.is_none()
    }
}

#[derive(Default)]
struct Overrides {
    input: Option<SharedAllocation>,
    output: Option<SharedAllocation>,
}

/// A validated, ordered set of kernels and the buffers between them.
///
/// The schedule is fixed at `create()` time and reused by every
/// [`ExecutionGraph::execute`] call. Kernels run one at a time, each launch
/// awaited before the next is issued, so anything a kernel writes (through
/// its output or through state outside its declared arguments) is visible to
/// every kernel scheduled after it.
///
/// Bindings on boundary ports persist across runs. Binding a port that a
/// connection already feeds replaces the graph's edge buffer for the next run
/// only: an output override is also what downstream consumers read.
pub struct ExecutionGraph {
    name: Option<String>,
    entries: Vec<KernelEntry>,
    schedule: Vec<usize>,
    index: HashMap<KernelNode, usize>,
    overrides: HashMap<usize, Overrides>,
    connection_count: usize,
    state: GraphState,
    runs: u64,
}

impl std::fmt::Debug for ExecutionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionGraph")
            .field("name", &self.name)
            .field("schedule", &self.schedule())
            .field("state", &self.state)
            .field("runs", &self.runs)
            .finish()
    }
}

impl ExecutionGraph {
    pub(super) fn new(entries: Vec<KernelEntry>, schedule: Vec<usize>, connection_count: usize) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.kernel.clone(), i))
            .collect();
        Self {
            name: None,
            entries,
            schedule,
            index,
            overrides: HashMap::new(),
            connection_count,
            state: GraphState::Validated,
            runs: 0,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Names the graph. A name can be set once and must not be empty.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::illegal("name must not be empty"));
        }
        if let Some(existing) = &self.name {
            return Err(Error::illegal(format!("graph already named '{}'", existing)));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Number of completed or attempted runs.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn kernel_count(&self) -> usize {
        self.entries.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count
    }

    /// Kernels in execution order.
    pub fn schedule(&self) -> Vec<&KernelNode> {
        self.schedule.iter().map(|&i| &self.entries[i].kernel).collect()
    }

    /// Kernels with no incoming connection, in registration order.
    pub fn entry_kernels(&self) -> Vec<&KernelNode> {
        self.entries
            .iter()
            .filter(|e| e.predecessors.is_empty())
            .map(|e| &e.kernel)
            .collect()
    }

    /// Kernels with no outgoing connection, in registration order.
    pub fn exit_kernels(&self) -> Vec<&KernelNode> {
        self.entries
            .iter()
            .filter(|e| e.successors.is_empty())
            .map(|e| &e.kernel)
            .collect()
    }

    /// Graph-owned buffer carrying `kernel`'s output to its consumers.
    pub fn edge_buffer(&self, kernel: &KernelNode) -> Option<SharedAllocation> {
        self.index
            .get(kernel)
            .and_then(|&i| self.entries[i].edge_buffer.clone())
    }

    /// Binds `allocation` as the positional input of `kernel`.
    pub fn set_input(&mut self, kernel: &KernelNode, allocation: SharedAllocation) -> Result<()> {
        let i = self.lookup(kernel)?;
        if self.entries[i].is_input_boundary() {
            self.entries[i].bound_input = Some(allocation);
        } else {
            self.overrides.entry(i).or_default().input = Some(allocation);
        }
        self.state = GraphState::Executable;
        Ok(())
    }

    /// Binds `allocation` as the output of `kernel`.
    pub fn set_output(&mut self, kernel: &KernelNode, allocation: SharedAllocation) -> Result<()> {
        let i = self.lookup(kernel)?;
        if self.entries[i].is_output_boundary() {
            self.entries[i].bound_output = Some(allocation);
        } else {
            self.overrides.entry(i).or_default().output = Some(allocation);
        }
        self.state = GraphState::Executable;
        Ok(())
    }

    /// Runs every kernel once, in schedule order.
    ///
    /// A kernel failure stops the run and comes back as
    /// [`Error::RuntimeFailure`]; the graph itself stays usable.
    pub async fn execute(&mut self, executor: &dyn KernelExecutor) -> Result<()> {
        self.state = GraphState::Executable;
        self.runs += 1;
        let overrides = std::mem::take(&mut self.overrides);
        let graph_name = self.name.as_deref().unwrap_or(UNNAMED_GRAPH);
        let started = Instant::now();

        GraphExecutionStarted {
            graph: graph_name,
            kernel_count: self.entries.len(),
            run: self.runs,
        }
        .log();

        for (position, &i) in self.schedule.iter().enumerate() {
            let launch = self.launch_for(i, &overrides);
            let kernel_name = launch.kernel.to_string();
            let started_msg = KernelLaunchStarted {
                graph: graph_name,
                kernel: &kernel_name,
                position,
            };
            let span = started_msg.span("kernel_launch");
            started_msg.log();

            let launched = Instant::now();
            if let Err(source) = executor.launch(&launch).instrument(span).await {
                KernelLaunchFailed {
                    kernel: &kernel_name,
                    error: &source,
                }
                .log();
                return Err(Error::RuntimeFailure {
                    kernel: kernel_name,
                    source,
                });
            }
            KernelLaunchCompleted {
                kernel: &kernel_name,
                duration: launched.elapsed(),
            }
            .log();
        }

        GraphExecutionCompleted {
            graph: graph_name,
            kernel_count: self.entries.len(),
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }

    /// Tears the graph down, destroying its edge buffers. Handles to those
    /// buffers obtained through [`ExecutionGraph::edge_buffer`] see every
    /// later access fail.
    pub async fn destroy(self) -> Result<()> {
        for entry in &self.entries {
            if let Some(buffer) = &entry.edge_buffer {
                let mut buffer = buffer.lock().await;
                // A caller may already have released it through its handle.
                if buffer.is_live() {
                    buffer.destroy()?;
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, kernel: &KernelNode) -> Result<usize> {
        self.index
            .get(kernel)
            .copied()
            .ok_or_else(|| Error::illegal(format!("kernel '{}' is not part of this graph", kernel)))
    }

    /// Buffer `i` writes to in this run.
    fn output_of(&self, i: usize, overrides: &HashMap<usize, Overrides>) -> Option<SharedAllocation> {
        let entry = &self.entries[i];
        overrides
            .get(&i)
            .and_then(|o| o.output.clone())
            .or_else(|| entry.edge_buffer.clone())
            .or_else(|| entry.bound_output.clone())
    }

    fn launch_for(&self, i: usize, overrides: &HashMap<usize, Overrides>) -> KernelLaunch {
        let entry = &self.entries[i];
        let input = overrides
            .get(&i)
            .and_then(|o| o.input.clone())
            .or_else(|| match entry.input_from {
                Some(producer) => self.output_of(producer, overrides),
                None => entry.bound_input.clone(),
            });
        let fields = entry
            .fields
            .iter()
            .filter_map(|(port, producer)| {
                self.output_of(*producer, overrides)
                    .map(|buffer| (port.clone(), buffer))
            })
            .collect();

        KernelLaunch {
            kernel: entry.kernel.clone(),
            input,
            output: self.output_of(i, overrides),
            fields,
        }
    }
}
