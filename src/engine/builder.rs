// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::graph::{ExecutionGraph, KernelEntry};
use super::validation;
use crate::allocation::Allocation;
use crate::config::consts::UNNAMED_GRAPH;
use crate::errors::{Error, Result, ValidationError};
use crate::kernel::{FieldPort, KernelNode};
use crate::observability::messages::graph::GraphValidated;
use crate::observability::messages::validation::{
    CyclicDependencyDetected, DisconnectedGraphDetected,
};
use crate::observability::messages::StructuredLog;
use crate::types::Type;
use std::collections::HashMap;

/// Receiving end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumer {
    /// The kernel's positional input.
    Kernel(KernelNode),
    /// A global input of every registered kernel of the field's module.
    Field(FieldPort),
}

impl From<KernelNode> for Consumer {
    fn from(kernel: KernelNode) -> Self {
        Consumer::Kernel(kernel)
    }
}

impl From<&KernelNode> for Consumer {
    fn from(kernel: &KernelNode) -> Self {
        Consumer::Kernel(kernel.clone())
    }
}

impl From<FieldPort> for Consumer {
    fn from(field: FieldPort) -> Self {
        Consumer::Field(field)
    }
}

impl From<&FieldPort> for Consumer {
    fn from(field: &FieldPort) -> Self {
        Consumer::Field(field.clone())
    }
}

#[derive(Debug, Clone)]
pub(super) struct Connection {
    pub(super) ty: Type,
    pub(super) from: KernelNode,
    pub(super) to: Consumer,
}

/// Accumulates kernels and connections, then validates them into an
/// [`ExecutionGraph`].
///
/// Argument problems (unknown kernels, conflicting edge types, doubled
/// inputs) are reported as soon as the offending call is made. Structural
/// problems that depend on the whole graph (disconnected kernels, cycles)
/// are reported by [`ExecutionGraphBuilder::create`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionGraphBuilder {
    kernels: Vec<KernelNode>,
    connections: Vec<Connection>,
}

impl ExecutionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_kernel(&mut self, kernel: &KernelNode) -> Result<&mut Self> {
        if self.kernels.contains(kernel) {
            return Err(Error::illegal(format!(
                "kernel '{}' was already added",
                kernel
            )));
        }
        self.kernels.push(kernel.clone());
        Ok(self)
    }

    /// Declares that `to` consumes the output of `from`, carried in a buffer
    /// shaped by `ty`.
    pub fn add_connection(
        &mut self,
        ty: &Type,
        from: &KernelNode,
        to: impl Into<Consumer>,
    ) -> Result<&mut Self> {
        let to = to.into();
        if !self.kernels.contains(from) {
            return Err(Error::illegal(format!(
                "producer '{}' was not added to the graph",
                from
            )));
        }

        // A producer has a single output buffer shared by all its consumers.
        if let Some(existing) = self.connections.iter().find(|c| &c.from == from) {
            if existing.ty != *ty {
                return Err(Error::illegal(format!(
                    "connections from '{}' must all use the same type",
                    from
                )));
            }
        }

        match &to {
            Consumer::Kernel(kernel) => {
                if !self.kernels.contains(kernel) {
                    return Err(Error::illegal(format!(
                        "consumer '{}' was not added to the graph",
                        kernel
                    )));
                }
                if self
                    .connections
                    .iter()
                    .any(|c| c.to == Consumer::Kernel(kernel.clone()))
                {
                    return Err(Error::illegal(format!(
                        "input of '{}' is already connected",
                        kernel
                    )));
                }
            }
            Consumer::Field(field) => {
                if !self.kernels.iter().any(|k| k.module() == field.module()) {
                    return Err(Error::illegal(format!(
                        "no kernel of module '{}' was added for field '{}'",
                        field.module_name(),
                        field
                    )));
                }
                if self.connections.iter().any(|c| c.to == to) {
                    return Err(Error::illegal(format!(
                        "field '{}' is already connected",
                        field
                    )));
                }
            }
        }

        self.connections.push(Connection {
            ty: ty.clone(),
            from: from.clone(),
            to,
        });
        Ok(self)
    }

    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Validates the accumulated graph and freezes it.
    ///
    /// Fails with an `InvalidState`-kind error if the kernels are not one
    /// connected component or if the connections form a cycle. The builder is
    /// left as it was, so it can be inspected or extended and tried again.
    pub fn create(&self) -> Result<ExecutionGraph> {
        if self.kernels.is_empty() {
            return Err(ValidationError::EmptyGraph.into());
        }

        let index: HashMap<&KernelNode, usize> = self
            .kernels
            .iter()
            .enumerate()
            .map(|(i, k)| (k, i))
            .collect();

        let mut edges = Vec::new();
        for connection in &self.connections {
            let from = self.position(&index, &connection.from)?;
            for to in self.consumers_of(&index, &connection.to)? {
                edges.push((from, to));
            }
        }

        let components = validation::connected_components(self.kernels.len(), &edges);
        if components.len() > 1 {
            let components: Vec<Vec<String>> = components
                .iter()
                .map(|members| members.iter().map(|&i| self.kernels[i].to_string()).collect())
                .collect();
            DisconnectedGraphDetected {
                components: &components,
            }
            .log();
            return Err(ValidationError::DisconnectedGraph { components }.into());
        }

        let adjacency = validation::adjacency(self.kernels.len(), &edges);
        if let Some(cycle) = validation::find_cycle(&adjacency) {
            let cycle: Vec<String> = cycle.iter().map(|&i| self.kernels[i].to_string()).collect();
            CyclicDependencyDetected { cycle: &cycle }.log();
            return Err(ValidationError::CyclicDependency { cycle }.into());
        }
        let schedule = validation::topological_order(&adjacency)
            .ok_or_else(|| Error::state("graph has no topological order"))?;

        let mut entries: Vec<KernelEntry> = self
            .kernels
            .iter()
            .map(|k| KernelEntry::new(k.clone()))
            .collect();
        for (i, targets) in adjacency.iter().enumerate() {
            entries[i].successors = targets.clone();
            for &t in targets {
                entries[t].predecessors.push(i);
            }
        }
        for connection in &self.connections {
            let from = self.position(&index, &connection.from)?;
            if entries[from].edge_buffer.is_none() {
                let buffer = Allocation::new(connection.ty.clone())?;
                entries[from].edge_buffer = Some(buffer.into_shared());
            }
            match &connection.to {
                Consumer::Kernel(kernel) => {
                    let to = self.position(&index, kernel)?;
                    entries[to].input_from = Some(from);
                }
                Consumer::Field(field) => {
                    for to in self.consumers_of(&index, &connection.to)? {
                        entries[to].fields.push((field.clone(), from));
                    }
                }
            }
        }

        let edge_buffers = entries.iter().filter(|e| e.edge_buffer.is_some()).count();
        GraphValidated {
            graph: UNNAMED_GRAPH,
            kernel_count: entries.len(),
            connection_count: self.connections.len(),
            edge_buffers,
        }
        .log();

        Ok(ExecutionGraph::new(entries, schedule, self.connections.len()))
    }

    fn position(&self, index: &HashMap<&KernelNode, usize>, kernel: &KernelNode) -> Result<usize> {
        index.get(kernel).copied().ok_or_else(|| {
            ValidationError::UnknownKernel {
                kernel: kernel.to_string(),
            }
            .into()
        })
    }

    fn consumers_of(
        &self,
        index: &HashMap<&KernelNode, usize>,
        consumer: &Consumer,
    ) -> Result<Vec<usize>> {
        match consumer {
            Consumer::Kernel(kernel) => Ok(vec![self.position(index, kernel)?]),
            Consumer::Field(field) => Ok(self
                .kernels
                .iter()
                .enumerate()
                .filter(|(_, k)| k.module() == field.module())
                .map(|(i, _)| i)
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::errors::ErrorKind;
    use crate::kernel::KernelModule;

    fn edge() -> Type {
        Type::sized(&Element::f32(), 4).unwrap()
    }

    #[test]
    fn test_duplicate_kernel_rejected() {
        let module = KernelModule::new("m");
        let k = module.kernel(0, "k");
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&k).unwrap();
        let err = builder.add_kernel(&module.kernel(0, "alias")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
    }

    #[test]
    fn test_connection_endpoints_must_be_registered() {
        let module = KernelModule::new("m");
        let (a, b) = (module.kernel(0, "a"), module.kernel(1, "b"));
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&a).unwrap();
        assert!(builder.add_connection(&edge(), &a, &b).is_err());
        assert!(builder.add_connection(&edge(), &b, &a).is_err());
        assert_eq!(builder.connection_count(), 0);
    }

    #[test]
    fn test_one_output_type_per_producer() {
        let module = KernelModule::new("m");
        let (a, b, c) = (module.kernel(0, "a"), module.kernel(1, "b"), module.kernel(2, "c"));
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&a).unwrap().add_kernel(&b).unwrap().add_kernel(&c).unwrap();
        builder.add_connection(&edge(), &a, &b).unwrap();

        let other = Type::sized(&Element::f32(), 8).unwrap();
        assert!(builder.add_connection(&other, &a, &c).is_err());
        assert!(builder.add_connection(&edge(), &a, &c).is_ok());
    }

    #[test]
    fn test_one_positional_input_per_consumer() {
        let module = KernelModule::new("m");
        let (a, b, c) = (module.kernel(0, "a"), module.kernel(1, "b"), module.kernel(2, "c"));
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&a).unwrap().add_kernel(&b).unwrap().add_kernel(&c).unwrap();
        builder.add_connection(&edge(), &a, &c).unwrap();
        assert!(builder.add_connection(&edge(), &b, &c).is_err());
    }

    #[test]
    fn test_field_requires_kernel_of_its_module() {
        let producer_module = KernelModule::new("p");
        let consumer_module = KernelModule::new("c");
        let producer = producer_module.kernel(0, "make");
        let field = consumer_module.field(0, "table");

        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&producer).unwrap();
        assert!(builder.add_connection(&edge(), &producer, &field).is_err());

        builder.add_kernel(&consumer_module.kernel(0, "use")).unwrap();
        builder.add_connection(&edge(), &producer, &field).unwrap();
        assert!(builder.add_connection(&edge(), &producer, &field).is_err());
    }

    #[test]
    fn test_empty_graph_rejected() {
        let err = ExecutionGraphBuilder::new().create().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(matches!(err, Error::InvalidGraph(ValidationError::EmptyGraph)));
    }

    #[test]
    fn test_single_kernel_is_valid() {
        let module = KernelModule::new("m");
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&module.kernel(0, "only")).unwrap();
        let graph = builder.create().unwrap();
        assert_eq!(graph.schedule().len(), 1);
    }

    #[test]
    fn test_cycle_reports_path() {
        let module = KernelModule::new("m");
        let (a, b) = (module.kernel(0, "a"), module.kernel(1, "b"));
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&a).unwrap().add_kernel(&b).unwrap();
        builder.add_connection(&edge(), &a, &b).unwrap();
        builder.add_connection(&edge(), &b, &a).unwrap();

        match builder.create() {
            Err(Error::InvalidGraph(ValidationError::CyclicDependency { cycle })) => {
                assert_eq!(cycle, vec!["m.a", "m.b", "m.a"]);
            }
            other => panic!("expected a cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_field_edge_into_own_module_is_a_cycle() {
        let module = KernelModule::new("m");
        let a = module.kernel(0, "a");
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&a).unwrap();
        builder.add_connection(&edge(), &a, module.field(0, "f")).unwrap();
        assert_eq!(builder.create().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_failed_create_leaves_builder_usable() {
        let module = KernelModule::new("m");
        let (a, b) = (module.kernel(0, "a"), module.kernel(1, "b"));
        let mut builder = ExecutionGraphBuilder::new();
        builder.add_kernel(&a).unwrap().add_kernel(&b).unwrap();
        assert!(builder.create().is_err());
        assert_eq!(builder.kernel_count(), 2);

        builder.add_connection(&edge(), &a, &b).unwrap();
        assert!(builder.create().is_ok());
    }
}
