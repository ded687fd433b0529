// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Identities of compiled kernels and their global input slots.
//!
//! A [`KernelModule`] stands for one compiled unit. It hands out
//! [`KernelNode`]s (entry points) and [`FieldPort`]s (hidden global inputs),
//! each identified by the module plus a slot number. Two handles for the
//! same slot of the same module compare equal, whatever their display names.

mod registry;

pub use registry::KernelRegistry;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque module identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

/// One compiled kernel unit.
#[derive(Debug, Clone)]
pub struct KernelModule {
    id: ModuleId,
    name: Arc<str>,
}

impl KernelModule {
    pub fn new(name: &str) -> Self {
        Self {
            id: ModuleId(NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed)),
            name: Arc::from(name),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry point at `slot`.
    pub fn kernel(&self, slot: u32, name: &str) -> KernelNode {
        KernelNode {
            module: self.id,
            module_name: self.name.clone(),
            slot,
            name: Arc::from(name),
        }
    }

    /// Global input at `slot`.
    pub fn field(&self, slot: u32, name: &str) -> FieldPort {
        FieldPort {
            module: self.id,
            module_name: self.name.clone(),
            slot,
            name: Arc::from(name),
        }
    }
}

impl PartialEq for KernelModule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for KernelModule {}

/// A vertex of an execution graph: one kernel entry point.
#[derive(Clone)]
pub struct KernelNode {
    module: ModuleId,
    module_name: Arc<str>,
    slot: u32,
    name: Arc<str>,
}

impl KernelNode {
    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `module.kernel`, as used in graph descriptions and log lines.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module_name, self.name)
    }
}

/// A hidden global input of a kernel module that a graph edge can feed.
#[derive(Clone)]
pub struct FieldPort {
    module: ModuleId,
    module_name: Arc<str>,
    slot: u32,
    name: Arc<str>,
}

impl FieldPort {
    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module_name, self.name)
    }
}

macro_rules! slot_identity {
    ($t:ty) => {
        impl PartialEq for $t {
            fn eq(&self, other: &Self) -> bool {
                self.module == other.module && self.slot == other.slot
            }
        }

        impl Eq for $t {}

        impl Hash for $t {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.module.hash(state);
                self.slot.hash(state);
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}", self.module_name, self.name)
            }
        }

        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}#{}", self.module_name, self.name, self.slot)
            }
        }
    };
}

slot_identity!(KernelNode);
slot_identity!(FieldPort);
