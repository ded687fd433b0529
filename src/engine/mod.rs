// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Kernel dependency graphs: building, validating and running them.

mod builder;
mod graph;
mod validation;

pub use builder::{Consumer, ExecutionGraphBuilder};
pub use graph::{ExecutionGraph, GraphState};
