// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Grid shapes built from an [`Element`].
//!
//! A [`Type`] combines an element with X/Y/Z extents, an optional six-face
//! cubemap duplication and an optional mipmap chain. Cells are laid out
//! face-major, then by level of detail, then Z, Y and X (X fastest).

use crate::config::consts::MAX_SIZE_BYTES;
use crate::element::Element;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// One face of a cubemap, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubemapFace {
    #[default]
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubemapFace {
    pub const ALL: [CubemapFace; 6] = [
        CubemapFace::PositiveX,
        CubemapFace::NegativeX,
        CubemapFace::PositiveY,
        CubemapFace::NegativeY,
        CubemapFace::PositiveZ,
        CubemapFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Immutable shape descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    element: Element,
    x: u32,
    y: u32,
    z: u32,
    faces: bool,
    mipmaps: bool,
    cells_per_face: usize,
}

impl Type {
    /// Shortcut for a plain 1D type of `x` cells.
    pub fn sized(element: &Element, x: u32) -> Result<Type> {
        TypeBuilder::new(element).set_x(x).create()
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    /// Y extent; 0 means the type is 1D.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Z extent; 0 means the type has no depth.
    pub fn z(&self) -> u32 {
        self.z
    }

    pub fn has_faces(&self) -> bool {
        self.faces
    }

    pub fn has_mipmaps(&self) -> bool {
        self.mipmaps
    }

    /// Number of spatial dimensions: 1, 2 or 3.
    pub fn dimensionality(&self) -> u8 {
        if self.y == 0 {
            1
        } else if self.z == 0 {
            2
        } else {
            3
        }
    }

    pub fn face_count(&self) -> usize {
        if self.faces {
            6
        } else {
            1
        }
    }

    /// Total addressable cells across every face and level.
    pub fn count(&self) -> usize {
        self.cells_per_face * self.face_count()
    }

    /// Bytes needed to back an allocation of this type.
    pub fn size_bytes(&self) -> usize {
        self.count() * self.element.size_bytes()
    }

    pub fn lod_count(&self) -> u32 {
        lod_count(self.x, self.y, self.z, self.mipmaps)
    }

    /// Extents of level `lod`, each clamped to at least one cell.
    pub fn lod_extent(&self, lod: u32) -> (usize, usize, usize) {
        lod_extent(self.x, self.y, self.z, lod)
    }

    pub(crate) fn cells_per_face(&self) -> usize {
        self.cells_per_face
    }

    /// Cell index at which level `lod` starts within one face.
    pub(crate) fn lod_offset(&self, lod: u32) -> usize {
        (0..lod)
            .map(|l| {
                let (x, y, z) = self.lod_extent(l);
                x * y * z
            })
            .sum()
    }
}

fn lod_extent(x: u32, y: u32, z: u32, lod: u32) -> (usize, usize, usize) {
    let shrink = |d: u32| (d.checked_shr(lod).unwrap_or(0)).max(1) as usize;
    (shrink(x), shrink(y), shrink(z))
}

fn lod_count(x: u32, y: u32, z: u32, mipmaps: bool) -> u32 {
    if !mipmaps {
        return 1;
    }
    let largest = x.max(y).max(z).max(1);
    32 - largest.leading_zeros()
}

/// Value accumulator for [`Type`].
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    element: Element,
    x: u32,
    y: u32,
    z: u32,
    faces: bool,
    mipmaps: bool,
}

impl TypeBuilder {
    pub fn new(element: &Element) -> Self {
        Self {
            element: element.clone(),
            x: 1,
            y: 0,
            z: 0,
            faces: false,
            mipmaps: false,
        }
    }

    pub fn set_x(&mut self, x: u32) -> &mut Self {
        self.x = x;
        self
    }

    pub fn set_y(&mut self, y: u32) -> &mut Self {
        self.y = y;
        self
    }

    pub fn set_z(&mut self, z: u32) -> &mut Self {
        self.z = z;
        self
    }

    pub fn set_faces(&mut self, faces: bool) -> &mut Self {
        self.faces = faces;
        self
    }

    pub fn set_mipmaps(&mut self, mipmaps: bool) -> &mut Self {
        self.mipmaps = mipmaps;
        self
    }

    pub fn create(&self) -> Result<Type> {
        if self.x < 1 {
            return Err(Error::illegal("X dimension must be at least 1"));
        }
        if self.z > 0 && self.y < 1 {
            return Err(Error::illegal("a Z dimension requires a Y dimension"));
        }
        if self.faces && self.y < 1 {
            return Err(Error::illegal("cubemaps require 2D types"));
        }
        if self.faces && self.z > 0 {
            return Err(Error::illegal("cubemaps are not supported with 3D types"));
        }

        let too_large = || Error::illegal("type too large");
        let mut cells_per_face: usize = 0;
        for lod in 0..lod_count(self.x, self.y, self.z, self.mipmaps) {
            let (x, y, z) = lod_extent(self.x, self.y, self.z, lod);
            cells_per_face = x
                .checked_mul(y)
                .and_then(|cells| cells.checked_mul(z))
                .and_then(|cells| cells_per_face.checked_add(cells))
                .ok_or_else(too_large)?;
        }
        // count() and size_bytes() multiply these without further checks.
        cells_per_face
            .checked_mul(if self.faces { 6 } else { 1 })
            .and_then(|cells| cells.checked_mul(self.element.size_bytes()))
            .filter(|&bytes| bytes <= MAX_SIZE_BYTES)
            .ok_or_else(too_large)?;

        Ok(Type {
            element: self.element.clone(),
            x: self.x,
            y: self.y,
            z: self.z,
            faces: self.faces,
            mipmaps: self.mipmaps,
            cells_per_face,
        })
    }
}
