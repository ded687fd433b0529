// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the allocation model and the execution graph.
//!
//! Every diagnostic goes through a message struct that implements `Display`
//! and [`messages::StructuredLog`], so the text and the structured fields of an
//! event are defined in one place instead of as strings at each call site.
//!
//! Messages are organized by subsystem:
//! * `messages::allocation` - allocation lifecycle, rejected copies, mipmaps
//! * `messages::graph` - graph validation and kernel dispatch
//! * `messages::validation` - structural problems found while validating
//!
//! ```rust
//! use the_gridwood::observability::messages::{graph::KernelLaunchStarted, StructuredLog};
//!
//! let msg = KernelLaunchStarted {
//!     graph: "blur",
//!     kernel: "blur.horizontal",
//!     position: 0,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
