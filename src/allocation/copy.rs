// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Partial-range copies.
//!
//! Every range operation is expressed as a [`Region`]: a box of cells inside
//! one mip level of one cubemap face. Rows of the box are contiguous in the
//! allocation, so copies walk the box row by row (Y outer, X inner).

use super::{Allocation, ElementData};
use crate::errors::Result;
use crate::types::CubemapFace;

/// A box of cells inside one level of one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub lod: u32,
    pub face: CubemapFace,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Region {
    /// `count` cells starting at `offset` along X.
    pub fn span(offset: u32, count: u32) -> Self {
        Self::cube(offset, 0, 0, count, 1, 1)
    }

    pub fn rect(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::cube(x, y, 0, width, height, 1)
    }

    pub fn cube(x: u32, y: u32, z: u32, width: u32, height: u32, depth: u32) -> Self {
        Self {
            lod: 0,
            face: CubemapFace::PositiveX,
            x,
            y,
            z,
            width,
            height,
            depth,
        }
    }

    pub fn at_lod(mut self, lod: u32) -> Self {
        self.lod = lod;
        self
    }

    pub fn on_face(mut self, face: CubemapFace) -> Self {
        self.face = face;
        self
    }

    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Dimensions the box reaches into: a single row at Y 0 is 1D.
    pub fn dimensions(&self) -> u8 {
        if self.z > 0 || self.depth > 1 {
            3
        } else if self.y > 0 || self.height > 1 {
            2
        } else {
            1
        }
    }
}

impl Allocation {
    /// Writes `count` cells starting at X `offset`; requires `offset + count <= X`.
    pub fn copy_1d_range_from<T: ElementData>(
        &mut self,
        offset: u32,
        count: u32,
        src: &[T],
    ) -> Result<()> {
        self.copy_1d_range_from_at(offset, count, src, 0)
    }

    /// As [`Allocation::copy_1d_range_from`], reading from `src` starting at
    /// cell `src_offset`.
    pub fn copy_1d_range_from_at<T: ElementData>(
        &mut self,
        offset: u32,
        count: u32,
        src: &[T],
        src_offset: usize,
    ) -> Result<()> {
        self.ensure_live("copy_1d_range_from")?;
        self.check_host::<T>("copy_1d_range_from")?;
        self.write_region(
            "copy_1d_range_from",
            &Region::span(offset, count),
            1,
            bytemuck::cast_slice(src),
            src_offset,
        )
    }

    pub fn copy_1d_range_from_unchecked<T: ElementData>(
        &mut self,
        offset: u32,
        count: u32,
        src: &[T],
    ) -> Result<()> {
        self.ensure_live("copy_1d_range_from_unchecked")?;
        self.write_region(
            "copy_1d_range_from_unchecked",
            &Region::span(offset, count),
            1,
            bytemuck::cast_slice(src),
            0,
        )
    }

    pub fn copy_1d_range_to<T: ElementData>(
        &self,
        offset: u32,
        count: u32,
        dst: &mut [T],
    ) -> Result<()> {
        self.ensure_live("copy_1d_range_to")?;
        self.check_host::<T>("copy_1d_range_to")?;
        self.read_region(
            "copy_1d_range_to",
            &Region::span(offset, count),
            1,
            bytemuck::cast_slice_mut(dst),
        )
    }

    /// Copies `count` cells from `src` (starting at `src_offset`) into this
    /// allocation at `offset`. Elements must be compatible and both
    /// allocations must have the same dimensionality.
    pub fn copy_1d_range_from_allocation(
        &mut self,
        offset: u32,
        count: u32,
        src: &Allocation,
        src_offset: u32,
    ) -> Result<()> {
        self.copy_between(
            "copy_1d_range_from_allocation",
            &Region::span(offset, count),
            src,
            &Region::span(src_offset, count),
            1,
        )
    }

    /// Writes a `width x height` block at `(x, y)` of level 0. `src` is
    /// row-major with `width` cells per row.
    pub fn copy_2d_range_from<T: ElementData>(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        src: &[T],
    ) -> Result<()> {
        self.ensure_live("copy_2d_range_from")?;
        self.check_host::<T>("copy_2d_range_from")?;
        self.write_region(
            "copy_2d_range_from",
            &Region::rect(x, y, width, height),
            2,
            bytemuck::cast_slice(src),
            0,
        )
    }

    pub fn copy_2d_range_to<T: ElementData>(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        dst: &mut [T],
    ) -> Result<()> {
        self.ensure_live("copy_2d_range_to")?;
        self.check_host::<T>("copy_2d_range_to")?;
        self.read_region(
            "copy_2d_range_to",
            &Region::rect(x, y, width, height),
            2,
            bytemuck::cast_slice_mut(dst),
        )
    }

    pub fn copy_2d_range_from_allocation(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        src: &Allocation,
        src_x: u32,
        src_y: u32,
    ) -> Result<()> {
        self.copy_between(
            "copy_2d_range_from_allocation",
            &Region::rect(x, y, width, height),
            src,
            &Region::rect(src_x, src_y, width, height),
            2,
        )
    }

    /// Writes a `width x height x depth` box at `(x, y, z)` of level 0.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_3d_range_from<T: ElementData>(
        &mut self,
        x: u32,
        y: u32,
        z: u32,
        width: u32,
        height: u32,
        depth: u32,
        src: &[T],
    ) -> Result<()> {
        self.ensure_live("copy_3d_range_from")?;
        self.check_host::<T>("copy_3d_range_from")?;
        self.write_region(
            "copy_3d_range_from",
            &Region::cube(x, y, z, width, height, depth),
            3,
            bytemuck::cast_slice(src),
            0,
        )
    }

    /// Writes any region, including lower mip levels and other cubemap faces.
    /// The allocation needs as many dimensions as the region spans.
    pub fn copy_region_from<T: ElementData>(&mut self, region: &Region, src: &[T]) -> Result<()> {
        self.ensure_live("copy_region_from")?;
        self.check_host::<T>("copy_region_from")?;
        self.write_region(
            "copy_region_from",
            region,
            region.dimensions(),
            bytemuck::cast_slice(src),
            0,
        )
    }

    pub fn copy_region_to<T: ElementData>(&self, region: &Region, dst: &mut [T]) -> Result<()> {
        self.ensure_live("copy_region_to")?;
        self.check_host::<T>("copy_region_to")?;
        self.read_region(
            "copy_region_to",
            region,
            region.dimensions(),
            bytemuck::cast_slice_mut(dst),
        )
    }

    pub(super) fn check_region(&self, op: &str, region: &Region, min_dims: u8) -> Result<()> {
        if region.width < 1 || region.height < 1 || region.depth < 1 {
            return Err(self.reject(op, "region must cover at least one cell".to_string()));
        }
        if self.ty.dimensionality() < min_dims {
            return Err(self.reject(
                op,
                format!(
                    "{}D region on a {}D allocation",
                    min_dims,
                    self.ty.dimensionality()
                ),
            ));
        }
        if region.lod >= self.ty.lod_count() {
            return Err(self.reject(
                op,
                format!(
                    "level {} out of range, allocation has {}",
                    region.lod,
                    self.ty.lod_count()
                ),
            ));
        }
        if !self.ty.has_faces() && region.face != CubemapFace::PositiveX {
            return Err(self.reject(op, "allocation has no cubemap faces".to_string()));
        }

        let (lx, ly, lz) = self.ty.lod_extent(region.lod);
        let fits = |start: u32, len: u32, extent: usize| start as usize + len as usize <= extent;
        if !fits(region.x, region.width, lx) {
            return Err(self.reject(
                op,
                format!(
                    "X range {}..{} exceeds extent {}",
                    region.x,
                    region.x as usize + region.width as usize,
                    lx
                ),
            ));
        }
        if !fits(region.y, region.height, ly) {
            return Err(self.reject(
                op,
                format!(
                    "Y range {}..{} exceeds extent {}",
                    region.y,
                    region.y as usize + region.height as usize,
                    ly
                ),
            ));
        }
        if !fits(region.z, region.depth, lz) {
            return Err(self.reject(
                op,
                format!(
                    "Z range {}..{} exceeds extent {}",
                    region.z,
                    region.z as usize + region.depth as usize,
                    lz
                ),
            ));
        }
        Ok(())
    }

    /// Cell index of the first cell of every row of `region`, in copy order.
    pub(super) fn row_starts(&self, region: &Region) -> Vec<usize> {
        let (lx, ly, _) = self.ty.lod_extent(region.lod);
        let base =
            region.face.index() * self.ty.cells_per_face() + self.ty.lod_offset(region.lod);
        let mut rows = Vec::with_capacity(region.height as usize * region.depth as usize);
        for z in region.z as usize..(region.z + region.depth) as usize {
            for y in region.y as usize..(region.y + region.height) as usize {
                rows.push(base + (z * ly + y) * lx + region.x as usize);
            }
        }
        rows
    }

    fn write_region(
        &mut self,
        op: &str,
        region: &Region,
        min_dims: u8,
        src: &[u8],
        src_offset: usize,
    ) -> Result<()> {
        self.check_region(op, region, min_dims)?;
        let packed = self.element().packed_size_bytes();
        let span = src_offset
            .checked_mul(packed)
            .and_then(|start| Some((start, start.checked_add(region.cells() * packed)?)));
        let (start, needed) = match span {
            Some(span) => span,
            None => {
                return Err(self.reject(
                    op,
                    format!("source offset {} is out of range", src_offset),
                ))
            }
        };
        if src.len() < needed {
            return Err(self.reject(
                op,
                format!("source holds {} bytes, {} required", src.len(), needed),
            ));
        }

        let row_bytes = region.width as usize * packed;
        for (i, row) in self.row_starts(region).into_iter().enumerate() {
            let from = start + i * row_bytes;
            self.store_cells(row, &src[from..from + row_bytes]);
        }
        self.after_write(region.lod);
        Ok(())
    }

    fn read_region(&self, op: &str, region: &Region, min_dims: u8, dst: &mut [u8]) -> Result<()> {
        self.check_region(op, region, min_dims)?;
        let packed = self.element().packed_size_bytes();
        let needed = region.cells() * packed;
        if dst.len() < needed {
            return Err(self.reject(
                op,
                format!("destination holds {} bytes, {} required", dst.len(), needed),
            ));
        }

        let row_bytes = region.width as usize * packed;
        for (i, row) in self.row_starts(region).into_iter().enumerate() {
            let from = i * row_bytes;
            self.load_cells(row, &mut dst[from..from + row_bytes]);
        }
        Ok(())
    }

    fn copy_between(
        &mut self,
        op: &str,
        dst_region: &Region,
        src: &Allocation,
        src_region: &Region,
        min_dims: u8,
    ) -> Result<()> {
        self.ensure_live(op)?;
        src.ensure_live(op)?;
        self.check_compatible(op, src)?;
        if self.ty.dimensionality() != src.ty.dimensionality() {
            return Err(self.reject(
                op,
                format!(
                    "cannot copy between a {}D and a {}D allocation",
                    src.ty.dimensionality(),
                    self.ty.dimensionality()
                ),
            ));
        }
        self.check_region(op, dst_region, min_dims)?;
        src.check_region(op, src_region, min_dims)?;

        let stride = self.element().size_bytes();
        let row_bytes = dst_region.width as usize * stride;
        let dst_rows = self.row_starts(dst_region);
        let src_rows = src.row_starts(src_region);
        for (d, s) in dst_rows.into_iter().zip(src_rows) {
            let (d, s) = (d * stride, s * stride);
            self.data[d..d + row_bytes].copy_from_slice(&src.data[s..s + row_bytes]);
        }
        self.after_write(dst_region.lod);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::errors::ErrorKind;
    use crate::types::TypeBuilder;

    fn grid(element: &Element, x: u32, y: u32) -> Allocation {
        let ty = TypeBuilder::new(element).set_x(x).set_y(y).create().unwrap();
        Allocation::new(ty).unwrap()
    }

    #[test]
    fn test_1d_range_writes_only_the_range() {
        let mut a = Allocation::create_sized(&Element::i32(), 8).unwrap();
        a.copy_from(&[1i32; 8]).unwrap();
        a.copy_1d_range_from(3, 2, &[7i32, 8]).unwrap();
        let mut out = [0i32; 8];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, [1, 1, 1, 7, 8, 1, 1, 1]);
    }

    #[test]
    fn test_1d_range_with_source_offset() {
        let mut a = Allocation::create_sized(&Element::u16(), 4).unwrap();
        a.copy_1d_range_from_at(1, 2, &[10u16, 20, 30, 40], 2).unwrap();
        let mut out = [0u16; 4];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, [0, 30, 40, 0]);

        assert!(a.copy_1d_range_from_at(0, 2, &[1u16, 2, 3], 2).is_err());
    }

    #[test]
    fn test_1d_range_bounds() {
        let mut a = Allocation::create_sized(&Element::f32(), 8).unwrap();
        assert!(a.copy_1d_range_from(6, 2, &[0f32; 2]).is_ok());
        let err = a.copy_1d_range_from(6, 3, &[0f32; 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
        assert!(a.copy_1d_range_from(0, 0, &[0f32; 0]).is_err());
        assert!(a.copy_1d_range_from(u32::MAX, 2, &[0f32; 2]).is_err());
    }

    #[test]
    fn test_1d_range_huge_source_offset_is_rejected() {
        let mut a = Allocation::create_sized(&Element::f32(), 8).unwrap();
        for src_offset in [usize::MAX / 2, usize::MAX / 4 + 1, usize::MAX] {
            let err = a
                .copy_1d_range_from_at(0, 1, &[1.0f32; 4], src_offset)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IllegalArgument, "offset {}", src_offset);
        }

        let mut out = [9f32; 8];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, [0f32; 8]);
    }

    #[test]
    fn test_1d_range_unchecked_skips_only_the_type_check() {
        let mut a = Allocation::create_sized(&Element::f32(), 4).unwrap();
        let bits = [1.5f32.to_bits(), (-2.0f32).to_bits()];

        let err = a.copy_1d_range_from(1, 2, &bits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        a.copy_1d_range_from_unchecked(1, 2, &bits).unwrap();
        let mut out = [0f32; 4];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, [0.0, 1.5, -2.0, 0.0]);

        let err = a.copy_1d_range_from_unchecked(3, 2, &bits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
        let err = a.copy_1d_range_from_unchecked(0, 3, &bits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        a.destroy().unwrap();
        let err = a.copy_1d_range_from_unchecked(0, 1, &bits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_region_on_lower_level_of_1d_mipmapped() {
        let ty = TypeBuilder::new(&Element::u8())
            .set_x(8)
            .set_mipmaps(true)
            .create()
            .unwrap();
        let mut a = Allocation::new(ty).unwrap();
        assert_eq!(Region::span(1, 2).at_lod(1).dimensions(), 1);

        a.copy_region_from(&Region::span(1, 2).at_lod(1), &[5u8, 6])
            .unwrap();
        // level 1 starts after the 8 cells of level 0
        assert_eq!(&a.bytes()[8..12], &[0, 5, 6, 0]);

        let mut back = [0u8; 2];
        a.copy_region_to(&Region::span(1, 2).at_lod(1), &mut back)
            .unwrap();
        assert_eq!(back, [5, 6]);

        assert!(a
            .copy_region_from(&Region::span(3, 2).at_lod(1), &[0u8; 2])
            .is_err());
        assert!(a
            .copy_region_from(&Region::rect(0, 0, 1, 2).at_lod(1), &[0u8; 2])
            .is_err());
    }

    #[test]
    fn test_1d_range_vec3_padding() {
        let mut a = Allocation::create_sized(&Element::i32_3(), 3).unwrap();
        a.copy_1d_range_from(1, 1, &[4i32, 5, 6]).unwrap();
        let mut out = [0i32; 9];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 4, 5, 6, 0, 0, 0]);

        let mut one = [0i32; 3];
        a.copy_1d_range_to(1, 1, &mut one).unwrap();
        assert_eq!(one, [4, 5, 6]);
    }

    #[test]
    fn test_2d_range_row_major() {
        let (nx, ny) = (5u32, 4u32);
        let mut a = grid(&Element::u8(), nx, ny);
        let block: Vec<u8> = (1..=6).collect();
        a.copy_2d_range_from(1, 2, 3, 2, &block).unwrap();

        let mut out = vec![0u8; (nx * ny) as usize];
        a.copy_to(&mut out).unwrap();
        for y in 0..ny as usize {
            for x in 0..nx as usize {
                let expected = if (1..4).contains(&x) && (2..4).contains(&y) {
                    block[(y - 2) * 3 + (x - 1)]
                } else {
                    0
                };
                assert_eq!(out[y * nx as usize + x], expected, "cell ({}, {})", x, y);
            }
        }

        let mut back = [0u8; 6];
        a.copy_2d_range_to(1, 2, 3, 2, &mut back).unwrap();
        assert_eq!(back.to_vec(), block);
    }

    #[test]
    fn test_2d_range_bounds_and_dimensionality() {
        let mut a = grid(&Element::f32(), 4, 4);
        assert!(a.copy_2d_range_from(2, 2, 3, 1, &[0f32; 3]).is_err());
        assert!(a.copy_2d_range_from(0, 3, 1, 2, &[0f32; 2]).is_err());
        assert!(a.copy_2d_range_from(0, 0, 2, 2, &[0f32; 3]).is_err());

        let mut line = Allocation::create_sized(&Element::f32(), 16).unwrap();
        assert!(line.copy_2d_range_from(0, 0, 2, 1, &[0f32; 2]).is_err());
    }

    #[test]
    fn test_allocation_to_allocation_2d() {
        let mut src = grid(&Element::u8_4(), 4, 4);
        let pixels: Vec<u8> = (0..64).collect();
        src.copy_from(&pixels).unwrap();

        let mut dst = grid(&Element::rgba_8888(), 3, 3);
        dst.copy_2d_range_from_allocation(1, 1, 2, 2, &src, 2, 1).unwrap();

        let mut out = [0u8; 4 * 2 * 2];
        dst.copy_2d_range_to(1, 1, 2, 2, &mut out).unwrap();
        // source cells (2,1),(3,1),(2,2),(3,2) -> cell indices 6,7,10,11
        let expected: Vec<u8> = [6usize, 7, 10, 11]
            .iter()
            .flat_map(|c| (c * 4..c * 4 + 4).map(|b| b as u8))
            .collect();
        assert_eq!(out.to_vec(), expected);
    }

    #[test]
    fn test_allocation_to_allocation_rejections() {
        let src = grid(&Element::f32(), 4, 4);
        let mut incompatible = grid(&Element::i32(), 4, 4);
        let err = incompatible
            .copy_2d_range_from_allocation(0, 0, 2, 2, &src, 0, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let mut line = Allocation::create_sized(&Element::f32(), 16).unwrap();
        assert!(line.copy_1d_range_from_allocation(0, 4, &src, 0).is_err());

        let mut dst = grid(&Element::f32(), 4, 4);
        assert!(dst.copy_2d_range_from_allocation(0, 0, 2, 2, &src, 3, 3).is_err());
    }

    #[test]
    fn test_allocation_to_allocation_1d() {
        let mut src = Allocation::create_sized(&Element::f32(), 6).unwrap();
        src.copy_from(&[0f32, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut dst = Allocation::create_sized(&Element::f32(), 4).unwrap();
        dst.copy_1d_range_from_allocation(1, 3, &src, 2).unwrap();
        let mut out = [0f32; 4];
        dst.copy_to(&mut out).unwrap();
        assert_eq!(out, [0.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_3d_range() {
        let ty = TypeBuilder::new(&Element::u8())
            .set_x(3)
            .set_y(2)
            .set_z(2)
            .create()
            .unwrap();
        let mut a = Allocation::new(ty).unwrap();
        a.copy_3d_range_from(1, 1, 0, 2, 1, 2, &[1u8, 2, 3, 4]).unwrap();
        let mut out = [0u8; 12];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 0, 1, 2, 0, 0, 0, 0, 3, 4]);
        assert!(a.copy_3d_range_from(0, 0, 1, 1, 1, 2, &[0u8; 2]).is_err());
    }

    #[test]
    fn test_lod_and_face_addressing() {
        let ty = TypeBuilder::new(&Element::u8())
            .set_x(4)
            .set_y(4)
            .set_faces(true)
            .set_mipmaps(true)
            .create()
            .unwrap();
        let mut a = Allocation::new(ty).unwrap();
        let region = Region::rect(0, 0, 2, 2)
            .at_lod(1)
            .on_face(CubemapFace::NegativeY);
        a.copy_region_from(&region, &[1u8, 2, 3, 4]).unwrap();

        // face 3 starts at 3 * 21, level 1 at offset 16 within the face
        let start = 3 * 21 + 16;
        assert_eq!(&a.bytes()[start..start + 4], &[1, 2, 3, 4]);

        assert!(a
            .copy_region_from(&Region::rect(0, 0, 1, 1).at_lod(3), &[0u8])
            .is_err());
        assert!(a
            .copy_region_from(&Region::rect(1, 1, 2, 2).at_lod(1), &[0u8; 4])
            .is_err());
    }

    #[test]
    fn test_face_rejected_without_faces() {
        let mut a = grid(&Element::u8(), 2, 2);
        let region = Region::rect(0, 0, 1, 1).on_face(CubemapFace::PositiveZ);
        assert!(a.copy_region_from(&region, &[1u8]).is_err());
    }
}
