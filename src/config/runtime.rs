// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::allocation::{Allocation, SharedAllocation};
use crate::config::GraphConfig;
use crate::engine::{Consumer, ExecutionGraph, ExecutionGraphBuilder};
use crate::errors::{Error, Result, ValidationError};
use crate::kernel::{KernelNode, KernelRegistry};
use std::collections::HashMap;

impl GraphConfig {
    /// Kernel handles by graph-local id.
    pub fn resolve_kernels(&self, registry: &KernelRegistry) -> Result<HashMap<String, KernelNode>> {
        self.kernels
            .iter()
            .map(|k| {
                registry
                    .kernel(&k.kernel)
                    .cloned()
                    .map(|node| (k.id.clone(), node))
                    .ok_or_else(|| missing(&k.id, &k.kernel))
            })
            .collect()
    }

    /// Replays the description onto a fresh builder.
    ///
    /// Kernels are added in description order, which is also the tie-break
    /// order of the resulting schedule.
    pub fn to_builder(&self, registry: &KernelRegistry) -> Result<ExecutionGraphBuilder> {
        let nodes = self.resolve_kernels(registry)?;
        let mut builder = ExecutionGraphBuilder::new();
        for kernel in &self.kernels {
            builder.add_kernel(&nodes[&kernel.id])?;
        }

        for connection in &self.connections {
            let label = connection.label();
            let from = nodes
                .get(&connection.from)
                .ok_or_else(|| missing(&label, &connection.from))?;
            let consumer = match (&connection.to, &connection.field) {
                (Some(to), None) => Consumer::Kernel(
                    nodes.get(to).cloned().ok_or_else(|| missing(&label, to))?,
                ),
                (None, Some(field)) => Consumer::Field(
                    registry
                        .field(field)
                        .cloned()
                        .ok_or_else(|| missing(&label, field))?,
                ),
                _ => {
                    return Err(ValidationError::InvalidConnection {
                        connection: label,
                        reason: "exactly one of 'to' or 'field' is required".to_string(),
                    }
                    .into())
                }
            };
            let ty = connection.ty.to_type().map_err(|e| ValidationError::InvalidTypeSpec {
                connection: label.clone(),
                reason: e.to_string(),
            })?;
            builder.add_connection(&ty, from, consumer)?;
        }
        Ok(builder)
    }

    /// Builds, validates and names the graph in one step.
    pub fn build(&self, registry: &KernelRegistry) -> Result<ExecutionGraph> {
        let mut graph = self.to_builder(registry)?.create()?;
        if let Some(name) = &self.name {
            graph.set_name(name)?;
        }
        Ok(graph)
    }

    /// Creates the described host output buffers and binds each to its
    /// kernel, returning them in description order keyed by kernel id.
    pub fn bind_outputs(
        &self,
        graph: &mut ExecutionGraph,
        registry: &KernelRegistry,
    ) -> Result<Vec<(String, SharedAllocation)>> {
        let nodes = self.resolve_kernels(registry)?;
        let mut outputs = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let label = format!("output of {}", output.kernel);
            let kernel = nodes
                .get(&output.kernel)
                .ok_or_else(|| missing(&label, &output.kernel))?;
            let buffer = Allocation::new(output.ty.to_type()?)?.into_shared();
            graph.set_output(kernel, buffer.clone())?;
            outputs.push((output.kernel.clone(), buffer));
        }
        Ok(outputs)
    }
}

fn missing(referrer: &str, symbol: &str) -> Error {
    ValidationError::UnresolvedReference {
        referrer: referrer.to_string(),
        missing: symbol.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::kernels::BuiltinKernels;
    use crate::errors::ErrorKind;

    fn builtins() -> (BuiltinKernels, KernelRegistry) {
        let builtins = BuiltinKernels::new();
        let mut registry = KernelRegistry::new();
        builtins.register(&mut registry).unwrap();
        (builtins, registry)
    }

    #[test]
    fn test_build_named_graph() {
        let (builtins, registry) = builtins();
        let cfg: GraphConfig = serde_yaml::from_str(
            r#"
name: doubler
kernels:
  - id: src
    kernel: builtin.fill_ramp
  - id: out
    kernel: builtin.double
connections:
  - from: src
    to: out
    type: { element: f32, x: 4 }
"#,
        )
        .unwrap();

        let graph = cfg.build(&registry).unwrap();
        assert_eq!(graph.name(), Some("doubler"));
        assert_eq!(graph.schedule(), vec![&builtins.fill_ramp(), &builtins.double()]);
    }

    #[test]
    fn test_structural_errors_surface_at_build() {
        let (_, registry) = builtins();
        let cfg: GraphConfig = serde_yaml::from_str(
            r#"
kernels:
  - id: a
    kernel: builtin.fill_ramp
  - id: b
    kernel: builtin.copy
"#,
        )
        .unwrap();

        assert!(cfg.to_builder(&registry).is_ok());
        let err = cfg.build(&registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_unknown_kernel_is_unresolved() {
        let (_, registry) = builtins();
        let cfg: GraphConfig = serde_yaml::from_str(
            r#"
kernels:
  - id: a
    kernel: builtin.nope
"#,
        )
        .unwrap();

        assert!(matches!(
            cfg.to_builder(&registry),
            Err(Error::InvalidGraph(ValidationError::UnresolvedReference { .. }))
        ));
    }

    #[tokio::test]
    async fn test_bound_outputs_receive_results() {
        let (builtins, registry) = builtins();
        let cfg: GraphConfig = serde_yaml::from_str(
            r#"
kernels:
  - id: src
    kernel: builtin.fill_ramp
  - id: out
    kernel: builtin.double
connections:
  - from: src
    to: out
    type: { element: f32, x: 3 }
outputs:
  - kernel: out
    type: { element: f32, x: 3 }
"#,
        )
        .unwrap();

        let mut graph = cfg.build(&registry).unwrap();
        let outputs = cfg.bind_outputs(&mut graph, &registry).unwrap();
        graph.execute(&builtins.executor()).await.unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, "out");
        let mut values = [0f32; 3];
        outputs[0].1.lock().await.copy_to(&mut values).unwrap();
        assert_eq!(values, [0.0, 2.0, 4.0]);
    }
}
