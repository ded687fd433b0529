// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{FieldPort, KernelModule, KernelNode};
use crate::errors::{Error, Result};
use std::collections::HashMap;

/// Resolves `module.kernel` and `module.field` names to handles.
///
/// Graph descriptions refer to kernels by name; the registry is what ties
/// those names to the modules the caller actually loaded.
#[derive(Debug, Default, Clone)]
pub struct KernelRegistry {
    kernels: HashMap<String, KernelNode>,
    fields: HashMap<String, FieldPort>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every kernel and field of `module`, numbering slots in the
    /// order given.
    pub fn register_module(
        &mut self,
        module: &KernelModule,
        kernels: &[&str],
        fields: &[&str],
    ) -> Result<()> {
        for (slot, name) in kernels.iter().enumerate() {
            self.register_kernel(module.kernel(slot as u32, name))?;
        }
        for (slot, name) in fields.iter().enumerate() {
            self.register_field(module.field(slot as u32, name))?;
        }
        Ok(())
    }

    pub fn register_kernel(&mut self, kernel: KernelNode) -> Result<()> {
        let key = kernel.qualified_name();
        if self.kernels.contains_key(&key) {
            return Err(Error::illegal(format!("kernel '{}' already registered", key)));
        }
        self.kernels.insert(key, kernel);
        Ok(())
    }

    pub fn register_field(&mut self, field: FieldPort) -> Result<()> {
        let key = field.qualified_name();
        if self.fields.contains_key(&key) {
            return Err(Error::illegal(format!("field '{}' already registered", key)));
        }
        self.fields.insert(key, field);
        Ok(())
    }

    pub fn kernel(&self, qualified: &str) -> Option<&KernelNode> {
        self.kernels.get(qualified)
    }

    pub fn field(&self, qualified: &str) -> Option<&FieldPort> {
        self.fields.get(qualified)
    }

    pub fn contains_kernel(&self, qualified: &str) -> bool {
        self.kernels.contains_key(qualified)
    }

    pub fn contains_field(&self, qualified: &str) -> bool {
        self.fields.contains_key(qualified)
    }

    /// Registered kernel names, sorted.
    pub fn kernel_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kernels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}
