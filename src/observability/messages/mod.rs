// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for structured logging, one module per subsystem.

pub mod allocation;
pub mod graph;
pub mod validation;

use tracing::Span;

/// A log event that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the event at its level.
    fn log(&self);

    /// Build a span carrying the event's fields.
    fn span(&self, name: &str) -> Span;
}
