// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Owned, checked buffers shaped by a [`Type`].
//!
//! An [`Allocation`] owns a zero-initialised byte buffer holding `Type::count`
//! cells. All copy routines validate shape, bounds and element type first and
//! only then touch the buffer, so a failed call never leaves a partial write.
//!
//! Host buffers are tightly packed: a three-wide vector element takes three
//! host components per cell while the allocation stores it in a four-lane
//! slot. The copy routines add and strip that padding lane.

mod copy;
mod element_data;
mod mipmap;
mod pixels;

#[cfg(test)]
mod integration_tests;

pub use copy::Region;
pub use element_data::ElementData;
pub use pixels::{PixelFormat, PixelSource, RawPixels};

use crate::element::{compat, Element};
use crate::errors::{Error, Result};
use crate::observability::messages::allocation::{
    AllocationCreated, AllocationDestroyed, AllocationResized, CopyRejected,
};
use crate::observability::messages::StructuredLog;
use crate::types::{Type, TypeBuilder};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Allocation handle shared between a caller and an execution graph.
pub type SharedAllocation = Arc<Mutex<Allocation>>;

/// How writes to level 0 propagate into lower mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MipmapPolicy {
    /// Lower levels are only changed by explicit writes.
    #[default]
    None,
    /// Lower levels are rebuilt by [`Allocation::sync_all`].
    OnSync,
    /// Lower levels are rebuilt after every partial write to level 0.
    Full,
}

/// Usage flags of an allocation. They describe who may read the memory and
/// do not change copy semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Usage(u32);

impl Usage {
    pub const SCRIPT: Usage = Usage(0x01);
    pub const GRAPHICS_TEXTURE: Usage = Usage(0x02);
    pub const GRAPHICS_VERTEX: Usage = Usage(0x04);
    pub const GRAPHICS_CONSTANTS: Usage = Usage(0x08);
    pub const GRAPHICS_RENDER_TARGET: Usage = Usage(0x10);
    pub const IO_INPUT: Usage = Usage(0x20);
    pub const IO_OUTPUT: Usage = Usage(0x40);
    pub const SHARED: Usage = Usage(0x80);

    const KNOWN: u32 = 0xff;

    /// Flags accepted when building from a pixel source.
    pub const PIXEL_SOURCE_SUPPORTED: Usage =
        Usage(Self::SCRIPT.0 | Self::GRAPHICS_TEXTURE.0 | Self::SHARED.0);

    pub const fn from_bits(bits: u32) -> Usage {
        Usage(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Usage) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_subset_of(self, other: Usage) -> bool {
        self.0 & !other.0 == 0
    }

    fn validate(self) -> Result<()> {
        if self.0 & !Self::KNOWN != 0 {
            return Err(Error::illegal(format!("unknown usage bits {:#x}", self.0)));
        }
        if self.contains(Self::IO_INPUT)
            && !self.is_subset_of(Usage(
                Self::IO_INPUT.0 | Self::SCRIPT.0 | Self::GRAPHICS_TEXTURE.0,
            ))
        {
            return Err(Error::illegal(
                "IO input can only be combined with script and texture usage",
            ));
        }
        Ok(())
    }
}

impl Default for Usage {
    fn default() -> Self {
        Usage::SCRIPT
    }
}

impl BitOr for Usage {
    type Output = Usage;

    fn bitor(self, rhs: Usage) -> Usage {
        Usage(self.0 | rhs.0)
    }
}

/// A buffer of cells matching a [`Type`].
pub struct Allocation {
    ty: Type,
    usage: Usage,
    mipmap_policy: MipmapPolicy,
    data: Vec<u8>,
    name: Option<String>,
    live: bool,
}

impl fmt::Debug for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocation")
            .field("name", &self.name)
            .field("type", &self.ty)
            .field("usage", &self.usage)
            .field("mipmap_policy", &self.mipmap_policy)
            .field("bytes", &self.data.len())
            .field("live", &self.live)
            .finish()
    }
}

impl Allocation {
    /// Script-usable allocation with no mipmap propagation.
    pub fn new(ty: Type) -> Result<Self> {
        Self::create_typed(ty, MipmapPolicy::None, Usage::SCRIPT)
    }

    pub fn create_typed(ty: Type, mipmap_policy: MipmapPolicy, usage: Usage) -> Result<Self> {
        usage.validate()?;
        if mipmap_policy != MipmapPolicy::None
            && ty.has_mipmaps()
            && !mipmap::supports(ty.element())
        {
            return Err(Error::illegal(
                "mipmap generation is not supported for this element",
            ));
        }

        let data = vec![0u8; ty.size_bytes()];
        AllocationCreated {
            cells: ty.count(),
            bytes: data.len(),
            dimensionality: ty.dimensionality(),
            lod_count: ty.lod_count(),
            faces: ty.has_faces(),
        }
        .log();

        Ok(Self {
            ty,
            usage,
            mipmap_policy,
            data,
            name: None,
            live: true,
        })
    }

    /// 1D allocation of `count` cells of `element`.
    pub fn create_sized(element: &Element, count: u32) -> Result<Self> {
        let ty = TypeBuilder::new(element).set_x(count).create()?;
        Self::new(ty)
    }

    pub fn into_shared(self) -> SharedAllocation {
        Arc::new(Mutex::new(self))
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn element(&self) -> &Element {
        self.ty.element()
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn mipmap_policy(&self) -> MipmapPolicy {
        self.mipmap_policy
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Raw cell bytes, including padding lanes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw cell bytes, for executors that run kernel bodies in place.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Names the allocation. A name can be set once and must not be empty.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::illegal("name must not be empty"));
        }
        if let Some(existing) = &self.name {
            return Err(Error::illegal(format!(
                "allocation already named '{}'",
                existing
            )));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Releases the backing buffer. The allocation stays addressable but every
    /// later access fails with `InvalidState`.
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_live("destroy")?;
        let bytes = self.data.len();
        self.data = Vec::new();
        self.live = false;
        AllocationDestroyed {
            name: self.display_name(),
            bytes,
        }
        .log();
        Ok(())
    }

    /// Changes the X extent of a plain 1D allocation, keeping the leading
    /// `min(old, new)` cells and zero-filling any growth.
    pub fn resize(&mut self, new_x: u32) -> Result<()> {
        self.ensure_live("resize")?;
        if self.ty.dimensionality() != 1 || self.ty.has_mipmaps() || self.ty.has_faces() {
            return Err(Error::state(
                "resize is only supported for 1D allocations without mipmaps or faces",
            ));
        }
        if new_x < 1 {
            return Err(self.reject("resize", "new X extent must be at least 1".to_string()));
        }

        let old_x = self.ty.x();
        let ty = TypeBuilder::new(self.ty.element()).set_x(new_x).create()?;
        self.data.resize(ty.size_bytes(), 0);
        self.ty = ty;

        AllocationResized {
            name: self.display_name(),
            old_x,
            new_x,
        }
        .log();
        Ok(())
    }

    /// Full-extent write with an element type check.
    pub fn copy_from<T: ElementData>(&mut self, src: &[T]) -> Result<()> {
        self.ensure_live("copy_from")?;
        self.check_host::<T>("copy_from")?;
        self.copy_from_bytes("copy_from", bytemuck::cast_slice(src))
    }

    /// Full-extent write that only checks length.
    pub fn copy_from_unchecked<T: ElementData>(&mut self, src: &[T]) -> Result<()> {
        self.ensure_live("copy_from_unchecked")?;
        self.copy_from_bytes("copy_from_unchecked", bytemuck::cast_slice(src))
    }

    /// Full-extent read with an element type check.
    pub fn copy_to<T: ElementData>(&self, dst: &mut [T]) -> Result<()> {
        self.ensure_live("copy_to")?;
        self.check_host::<T>("copy_to")?;
        self.copy_to_bytes("copy_to", bytemuck::cast_slice_mut(dst))
    }

    /// Full-extent read that only checks length.
    pub fn copy_to_unchecked<T: ElementData>(&self, dst: &mut [T]) -> Result<()> {
        self.ensure_live("copy_to_unchecked")?;
        self.copy_to_bytes("copy_to_unchecked", bytemuck::cast_slice_mut(dst))
    }

    /// Full copy from another allocation with a compatible element and the
    /// same extents.
    pub fn copy_from_allocation(&mut self, src: &Allocation) -> Result<()> {
        self.ensure_live("copy_from_allocation")?;
        src.ensure_live("copy_from_allocation")?;
        self.check_compatible("copy_from_allocation", src)?;
        let same_shape = self.ty.x() == src.ty.x()
            && self.ty.y() == src.ty.y()
            && self.ty.z() == src.ty.z()
            && self.ty.has_faces() == src.ty.has_faces()
            && self.ty.has_mipmaps() == src.ty.has_mipmaps();
        if !same_shape {
            return Err(self.reject(
                "copy_from_allocation",
                "source and destination extents differ".to_string(),
            ));
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    /// Rebuilds lower mip levels when the policy defers that to a sync.
    pub fn sync_all(&mut self) -> Result<()> {
        self.ensure_live("sync_all")?;
        if self.mipmap_policy == MipmapPolicy::OnSync && self.ty.has_mipmaps() {
            self.rebuild_mips();
        }
        Ok(())
    }

    /// Rebuilds every lower mip level from level 0.
    pub fn generate_mipmaps(&mut self) -> Result<()> {
        self.ensure_live("generate_mipmaps")?;
        if !self.ty.has_mipmaps() {
            return Err(Error::state("allocation has no mipmap levels"));
        }
        if !mipmap::supports(self.ty.element()) {
            return Err(self.reject(
                "generate_mipmaps",
                "mipmap generation is not supported for this element".to_string(),
            ));
        }
        self.rebuild_mips();
        Ok(())
    }

    fn rebuild_mips(&mut self) {
        mipmap::build_chain(&self.ty, &mut self.data);
    }

    /// Called after a successful partial write to `lod`.
    fn after_write(&mut self, lod: u32) {
        if lod == 0 && self.mipmap_policy == MipmapPolicy::Full && self.ty.has_mipmaps() {
            self.rebuild_mips();
        }
    }

    fn copy_from_bytes(&mut self, op: &str, src: &[u8]) -> Result<()> {
        let cells = self.ty.count();
        let needed = cells * self.element().packed_size_bytes();
        if src.len() < needed {
            return Err(self.reject(
                op,
                format!("source holds {} bytes, {} required", src.len(), needed),
            ));
        }
        self.store_cells(0, &src[..needed]);
        Ok(())
    }

    fn copy_to_bytes(&self, op: &str, dst: &mut [u8]) -> Result<()> {
        let cells = self.ty.count();
        let needed = cells * self.element().packed_size_bytes();
        if dst.len() < needed {
            return Err(self.reject(
                op,
                format!("destination holds {} bytes, {} required", dst.len(), needed),
            ));
        }
        self.load_cells(0, &mut dst[..needed]);
        Ok(())
    }

    /// Writes packed host bytes into consecutive cells starting at `cell`.
    fn store_cells(&mut self, cell: usize, src: &[u8]) {
        let element = self.ty.element();
        let stride = element.size_bytes();
        let start = cell * stride;
        if !element.is_padded() {
            self.data[start..start + src.len()].copy_from_slice(src);
            return;
        }
        let packed = element.packed_size_bytes();
        for (i, chunk) in src.chunks_exact(packed).enumerate() {
            let at = start + i * stride;
            self.data[at..at + packed].copy_from_slice(chunk);
            self.data[at + packed..at + stride].fill(0);
        }
    }

    /// Reads consecutive cells starting at `cell` into packed host bytes.
    fn load_cells(&self, cell: usize, dst: &mut [u8]) {
        let element = self.ty.element();
        let stride = element.size_bytes();
        let start = cell * stride;
        if !element.is_padded() {
            let len = dst.len();
            dst.copy_from_slice(&self.data[start..start + len]);
            return;
        }
        let packed = element.packed_size_bytes();
        for (i, chunk) in dst.chunks_exact_mut(packed).enumerate() {
            let at = start + i * stride;
            chunk.copy_from_slice(&self.data[at..at + packed]);
        }
    }

    fn ensure_live(&self, op: &str) -> Result<()> {
        if self.live {
            Ok(())
        } else {
            Err(Error::state(format!("{} on a destroyed allocation", op)))
        }
    }

    fn check_host<T: ElementData>(&self, op: &str) -> Result<()> {
        let element = self.ty.element();
        let accepted = element
            .data_type()
            .map(|dt| compat::host_accepts(T::STORAGE, dt))
            .unwrap_or(false);
        if accepted {
            Ok(())
        } else {
            Err(self.reject(
                op,
                format!(
                    "host type {} does not match element {:?}",
                    std::any::type_name::<T>(),
                    element.data_type()
                ),
            ))
        }
    }

    fn check_compatible(&self, op: &str, src: &Allocation) -> Result<()> {
        if self.element().is_compatible(src.element()) {
            Ok(())
        } else {
            Err(self.reject(op, "source element is not compatible".to_string()))
        }
    }

    fn reject(&self, op: &str, reason: String) -> Error {
        CopyRejected {
            operation: op,
            reason: &reason,
        }
        .log();
        Error::IllegalArgument(reason)
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
