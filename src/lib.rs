// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod allocation;    // typed memory and range copies
pub mod backends;      // kernel executors
pub mod config;        // graph descriptions + constants
pub mod element;       // element descriptors
pub mod engine;        // graph building, validation, scheduling
pub mod errors;        // error handling
pub mod kernel;        // kernel modules, nodes, field ports
pub mod observability;
pub mod traits;        // executor abstraction
pub mod types;         // shapes, mip levels, cubemap faces
