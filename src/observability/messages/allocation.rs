// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for allocation lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Backing buffer allocated.
///
/// # Log Level
/// `debug!` - Frequent, only interesting when tracing memory use
pub struct AllocationCreated {
    pub cells: usize,
    pub bytes: usize,
    pub dimensionality: u8,
    pub lod_count: u32,
    pub faces: bool,
}

impl Display for AllocationCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Allocated {} cells ({} bytes), {}D, {} levels{}",
            self.cells,
            self.bytes,
            self.dimensionality,
            self.lod_count,
            if self.faces { ", cubemap" } else { "" }
        )
    }
}

impl StructuredLog for AllocationCreated {
    fn log(&self) {
        tracing::debug!(
            cells = self.cells,
            bytes = self.bytes,
            dimensionality = self.dimensionality,
            lod_count = self.lod_count,
            faces = self.faces,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "allocation_created",
            span_name = name,
            cells = self.cells,
            bytes = self.bytes,
        )
    }
}

/// 1D allocation resized.
///
/// # Log Level
/// `debug!`
pub struct AllocationResized<'a> {
    pub name: &'a str,
    pub old_x: u32,
    pub new_x: u32,
}

impl Display for AllocationResized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resized allocation '{}' from {} to {} cells",
            self.name, self.old_x, self.new_x
        )
    }
}

impl StructuredLog for AllocationResized<'_> {
    fn log(&self) {
        tracing::debug!(
            name = self.name,
            old_x = self.old_x,
            new_x = self.new_x,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "allocation_resized",
            span_name = name,
            name = self.name,
            old_x = self.old_x,
            new_x = self.new_x,
        )
    }
}

/// Backing buffer released.
///
/// # Log Level
/// `debug!`
pub struct AllocationDestroyed<'a> {
    pub name: &'a str,
    pub bytes: usize,
}

impl Display for AllocationDestroyed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Destroyed allocation '{}', released {} bytes", self.name, self.bytes)
    }
}

impl StructuredLog for AllocationDestroyed<'_> {
    fn log(&self) {
        tracing::debug!(name = self.name, bytes = self.bytes, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "allocation_destroyed",
            span_name = name,
            name = self.name,
            bytes = self.bytes,
        )
    }
}

/// A copy or shape change was refused before touching the buffer.
///
/// # Log Level
/// `debug!` - The error is also returned to the caller
pub struct CopyRejected<'a> {
    pub operation: &'a str,
    pub reason: &'a str,
}

impl Display for CopyRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected {}: {}", self.operation, self.reason)
    }
}

impl StructuredLog for CopyRejected<'_> {
    fn log(&self) {
        tracing::debug!(operation = self.operation, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "copy_rejected",
            span_name = name,
            operation = self.operation,
            reason = self.reason,
        )
    }
}

/// Lower mip levels rebuilt from level 0.
///
/// # Log Level
/// `trace!` - Fires after every partial write under the full mipmap policy
pub struct MipmapsGenerated {
    pub levels: u32,
    pub faces: usize,
}

impl Display for MipmapsGenerated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Generated {} mip levels on {} faces", self.levels, self.faces)
    }
}

impl StructuredLog for MipmapsGenerated {
    fn log(&self) {
        tracing::trace!(levels = self.levels, faces = self.faces, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "mipmaps_generated",
            span_name = name,
            levels = self.levels,
            faces = self.faces,
        )
    }
}
