// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process kernel bodies.
//!
//! A [`LocalExecutor`] maps each [`KernelNode`] to a Rust closure. Before a
//! body runs, every allocation of the launch is locked once (buffers shared
//! between the input, output and field slots are locked a single time) and
//! handed to the closure through a [`KernelContext`].

pub mod kernels;

use crate::allocation::{Allocation, SharedAllocation};
use crate::kernel::{FieldPort, KernelNode};
use crate::traits::{KernelExecutor, KernelLaunch};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::MutexGuard;

/// Body of a local kernel.
pub type KernelFn = Arc<dyn Fn(&mut KernelContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Locked view of the allocations bound to one launch.
pub struct KernelContext<'a> {
    kernel: &'a KernelNode,
    guards: Vec<MutexGuard<'a, Allocation>>,
    input: Option<usize>,
    output: Option<usize>,
    fields: Vec<(&'a FieldPort, usize)>,
}

impl<'a> KernelContext<'a> {
    async fn lock(launch: &'a KernelLaunch) -> KernelContext<'a> {
        let mut handles: Vec<&'a SharedAllocation> = Vec::new();
        let input = launch.input.as_ref().map(|a| slot_of(&mut handles, a));
        let output = launch.output.as_ref().map(|a| slot_of(&mut handles, a));
        let fields: Vec<(&'a FieldPort, usize)> = launch
            .fields
            .iter()
            .map(|(port, allocation)| (port, slot_of(&mut handles, allocation)))
            .collect();

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock().await);
        }

        KernelContext {
            kernel: &launch.kernel,
            guards,
            input,
            output,
            fields,
        }
    }

    pub fn kernel(&self) -> &KernelNode {
        self.kernel
    }

    pub fn input(&self) -> anyhow::Result<&Allocation> {
        let i = self
            .input
            .ok_or_else(|| anyhow!("kernel '{}' has no input bound", self.kernel))?;
        Ok(&*self.guards[i])
    }

    pub fn output(&self) -> anyhow::Result<&Allocation> {
        let i = self.output_slot()?;
        Ok(&*self.guards[i])
    }

    pub fn output_mut(&mut self) -> anyhow::Result<&mut Allocation> {
        let i = self.output_slot()?;
        Ok(&mut *self.guards[i])
    }

    pub fn field(&self, name: &str) -> anyhow::Result<&Allocation> {
        let i = self
            .fields
            .iter()
            .find(|(port, _)| port.name() == name)
            .map(|(_, i)| *i)
            .ok_or_else(|| anyhow!("kernel '{}' has no field '{}' bound", self.kernel, name))?;
        Ok(&*self.guards[i])
    }

    /// Copies the input out so the output can be written while reading it.
    pub fn input_values<T: crate::allocation::ElementData + Default>(&self) -> anyhow::Result<Vec<T>> {
        let input = self.input()?;
        let components = input.ty().count() * input.element().vector_size() as usize;
        let mut values = vec![T::default(); components];
        input
            .copy_to(&mut values)
            .with_context(|| format!("reading input of '{}'", self.kernel))?;
        Ok(values)
    }

    fn output_slot(&self) -> anyhow::Result<usize> {
        self.output
            .ok_or_else(|| anyhow!("kernel '{}' has no output bound", self.kernel))
    }
}

/// Index of `allocation` in `handles`, adding it if this is its first use.
fn slot_of<'a>(handles: &mut Vec<&'a SharedAllocation>, allocation: &'a SharedAllocation) -> usize {
    match handles.iter().position(|h| Arc::ptr_eq(h, allocation)) {
        Some(i) => i,
        None => {
            handles.push(allocation);
            handles.len() - 1
        }
    }
}

/// Runs registered closures in the calling task.
#[derive(Default, Clone)]
pub struct LocalExecutor {
    bodies: HashMap<KernelNode, KernelFn>,
}

impl std::fmt::Debug for LocalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("kernels", &self.bodies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `body` for `kernel`, replacing any earlier body.
    pub fn register<F>(&mut self, kernel: &KernelNode, body: F) -> &mut Self
    where
        F: Fn(&mut KernelContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bodies.insert(kernel.clone(), Arc::new(body));
        self
    }

    pub fn contains(&self, kernel: &KernelNode) -> bool {
        self.bodies.contains_key(kernel)
    }
}

#[async_trait]
impl KernelExecutor for LocalExecutor {
    async fn launch(&self, launch: &KernelLaunch) -> anyhow::Result<()> {
        let body = self
            .bodies
            .get(&launch.kernel)
            .ok_or_else(|| anyhow!("no local body registered for '{}'", launch.kernel))?;
        let mut context = KernelContext::lock(launch).await;
        body(&mut context)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::kernel::KernelModule;

    #[tokio::test]
    async fn test_missing_body_is_an_error() {
        let module = KernelModule::new("m");
        let executor = LocalExecutor::new();
        let launch = KernelLaunch::new(module.kernel(0, "k"));
        let err = executor.launch(&launch).await.unwrap_err();
        assert!(err.to_string().contains("m.k"));
    }

    #[tokio::test]
    async fn test_shared_buffer_locked_once() {
        let module = KernelModule::new("m");
        let kernel = module.kernel(0, "double_in_place");
        let buffer = Allocation::create_sized(&Element::i32(), 3).unwrap().into_shared();
        buffer.lock().await.copy_from(&[1i32, 2, 3]).unwrap();

        let mut executor = LocalExecutor::new();
        executor.register(&kernel, |ctx| {
            let doubled: Vec<i32> = ctx.input_values::<i32>()?.iter().map(|v| v * 2).collect();
            ctx.output_mut()?.copy_from(&doubled)?;
            Ok(())
        });

        let mut launch = KernelLaunch::new(kernel);
        launch.input = Some(buffer.clone());
        launch.output = Some(buffer.clone());
        executor.launch(&launch).await.unwrap();

        let mut out = [0i32; 3];
        buffer.lock().await.copy_to(&mut out).unwrap();
        assert_eq!(out, [2, 4, 6]);
    }

    #[tokio::test]
    async fn test_unbound_slots_reported() {
        let module = KernelModule::new("m");
        let kernel = module.kernel(0, "reader");
        let mut executor = LocalExecutor::new();
        executor.register(&kernel, |ctx| {
            ctx.field("weights")?;
            Ok(())
        });
        let err = executor
            .launch(&KernelLaunch::new(kernel))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("weights"));
    }
}
