// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in `f32` kernels for graph descriptions and demos.
//!
//! | Name | Body |
//! |---|---|
//! | `builtin.fill_ramp` | `out[i] = i` |
//! | `builtin.copy` | `out = in` |
//! | `builtin.double` | `out[i] = 2 * in[i]` |
//! | `builtin.sum` | `out[0] = sum(in)` |
//! | `bias.add` | `out[i] = in[i] + offset[0]`, reading field `bias.offset` |
//!
//! `bias.add` lives in its own module so that feeding `bias.offset` from a
//! `builtin` kernel does not make that kernel depend on itself.

use super::{KernelContext, LocalExecutor};
use crate::errors::Result;
use crate::kernel::{FieldPort, KernelModule, KernelNode, KernelRegistry};
use anyhow::{anyhow, bail};

const BUILTIN_KERNELS: [&str; 4] = ["fill_ramp", "copy", "double", "sum"];
const BIAS_KERNELS: [&str; 1] = ["add"];
const BIAS_FIELDS: [&str; 1] = ["offset"];

/// Handles for the built-in kernel modules.
#[derive(Debug, Clone)]
pub struct BuiltinKernels {
    builtin: KernelModule,
    bias: KernelModule,
}

impl Default for BuiltinKernels {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinKernels {
    pub fn new() -> Self {
        Self {
            builtin: KernelModule::new("builtin"),
            bias: KernelModule::new("bias"),
        }
    }

    pub fn fill_ramp(&self) -> KernelNode {
        self.builtin.kernel(0, BUILTIN_KERNELS[0])
    }

    pub fn copy(&self) -> KernelNode {
        self.builtin.kernel(1, BUILTIN_KERNELS[1])
    }

    pub fn double(&self) -> KernelNode {
        self.builtin.kernel(2, BUILTIN_KERNELS[2])
    }

    pub fn sum(&self) -> KernelNode {
        self.builtin.kernel(3, BUILTIN_KERNELS[3])
    }

    pub fn add_bias(&self) -> KernelNode {
        self.bias.kernel(0, BIAS_KERNELS[0])
    }

    pub fn bias_offset(&self) -> FieldPort {
        self.bias.field(0, BIAS_FIELDS[0])
    }

    /// Registers every built-in kernel and field under its qualified name.
    pub fn register(&self, registry: &mut KernelRegistry) -> Result<()> {
        registry.register_module(&self.builtin, &BUILTIN_KERNELS, &[])?;
        registry.register_module(&self.bias, &BIAS_KERNELS, &BIAS_FIELDS)
    }

    /// A local executor with every built-in body registered.
    pub fn executor(&self) -> LocalExecutor {
        let mut executor = LocalExecutor::new();
        executor
            .register(&self.fill_ramp(), fill_ramp)
            .register(&self.copy(), copy)
            .register(&self.double(), double)
            .register(&self.sum(), sum)
            .register(&self.add_bias(), add_bias);
        executor
    }
}

fn output_len(ctx: &KernelContext<'_>) -> anyhow::Result<usize> {
    let output = ctx.output()?;
    Ok(output.ty().count() * output.element().vector_size() as usize)
}

fn write_output(ctx: &mut KernelContext<'_>, values: &[f32]) -> anyhow::Result<()> {
    let needed = output_len(ctx)?;
    if values.len() < needed {
        bail!(
            "kernel '{}' produced {} values for an output of {}",
            ctx.kernel(),
            values.len(),
            needed
        );
    }
    ctx.output_mut()?.copy_from(&values[..needed])?;
    Ok(())
}

fn fill_ramp(ctx: &mut KernelContext<'_>) -> anyhow::Result<()> {
    let values: Vec<f32> = (0..output_len(ctx)?).map(|i| i as f32).collect();
    write_output(ctx, &values)
}

fn copy(ctx: &mut KernelContext<'_>) -> anyhow::Result<()> {
    let values = ctx.input_values::<f32>()?;
    write_output(ctx, &values)
}

fn double(ctx: &mut KernelContext<'_>) -> anyhow::Result<()> {
    let values: Vec<f32> = ctx.input_values::<f32>()?.iter().map(|v| v * 2.0).collect();
    write_output(ctx, &values)
}

fn sum(ctx: &mut KernelContext<'_>) -> anyhow::Result<()> {
    let total: f32 = ctx.input_values::<f32>()?.iter().sum();
    let mut values = vec![0f32; output_len(ctx)?];
    let first = values
        .first_mut()
        .ok_or_else(|| anyhow!("kernel '{}' has an empty output", ctx.kernel()))?;
    *first = total;
    write_output(ctx, &values)
}

fn add_bias(ctx: &mut KernelContext<'_>) -> anyhow::Result<()> {
    let mut offset = [0f32; 1];
    ctx.field(BIAS_FIELDS[0])?.copy_1d_range_to(0, 1, &mut offset)?;
    let values: Vec<f32> = ctx
        .input_values::<f32>()?
        .iter()
        .map(|v| v + offset[0])
        .collect();
    write_output(ctx, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocation;
    use crate::element::Element;
    use crate::traits::{KernelExecutor, KernelLaunch};

    fn buffer(values: &[f32]) -> crate::allocation::SharedAllocation {
        let mut a = Allocation::create_sized(&Element::f32(), values.len() as u32).unwrap();
        a.copy_from(values).unwrap();
        a.into_shared()
    }

    async fn read(buffer: &crate::allocation::SharedAllocation) -> Vec<f32> {
        let guard = buffer.lock().await;
        let mut out = vec![0f32; guard.ty().count()];
        guard.copy_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_registry_names() {
        let builtins = BuiltinKernels::new();
        let mut registry = KernelRegistry::new();
        builtins.register(&mut registry).unwrap();
        assert_eq!(registry.kernel("builtin.double"), Some(&builtins.double()));
        assert_eq!(registry.field("bias.offset"), Some(&builtins.bias_offset()));
        assert_eq!(registry.len(), 5);
    }

    #[tokio::test]
    async fn test_bodies() {
        let builtins = BuiltinKernels::new();
        let executor = builtins.executor();

        let out = buffer(&[0.0; 4]);
        let mut launch = KernelLaunch::new(builtins.fill_ramp());
        launch.output = Some(out.clone());
        executor.launch(&launch).await.unwrap();
        assert_eq!(read(&out).await, vec![0.0, 1.0, 2.0, 3.0]);

        let doubled = buffer(&[0.0; 4]);
        let mut launch = KernelLaunch::new(builtins.double());
        launch.input = Some(out.clone());
        launch.output = Some(doubled.clone());
        executor.launch(&launch).await.unwrap();
        assert_eq!(read(&doubled).await, vec![0.0, 2.0, 4.0, 6.0]);

        let total = buffer(&[0.0]);
        let mut launch = KernelLaunch::new(builtins.sum());
        launch.input = Some(doubled.clone());
        launch.output = Some(total.clone());
        executor.launch(&launch).await.unwrap();
        assert_eq!(read(&total).await, vec![12.0]);

        let biased = buffer(&[0.0; 4]);
        let mut launch = KernelLaunch::new(builtins.add_bias());
        launch.input = Some(out.clone());
        launch.output = Some(biased.clone());
        launch.fields = vec![(builtins.bias_offset(), total.clone())];
        executor.launch(&launch).await.unwrap();
        assert_eq!(read(&biased).await, vec![12.0, 13.0, 14.0, 15.0]);
    }

    #[tokio::test]
    async fn test_short_input_is_a_kernel_error() {
        let builtins = BuiltinKernels::new();
        let mut launch = KernelLaunch::new(builtins.copy());
        launch.input = Some(buffer(&[1.0, 2.0]));
        launch.output = Some(buffer(&[0.0; 3]));
        assert!(builtins.executor().launch(&launch).await.is_err());
    }
}
