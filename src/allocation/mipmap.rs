// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Box-filter mip chain generation.
//!
//! Each level is built from the level above it: a destination cell averages
//! the (up to eight) source cells it covers, with sample coordinates clamped
//! to the source extent. Faces are filtered independently.

use crate::element::{DataType, Element};
use crate::observability::messages::allocation::MipmapsGenerated;
use crate::observability::messages::StructuredLog;
use crate::types::Type;

/// Packed pixel channels as `(shift, bits)` pairs.
const CHANNELS_565: &[(u32, u32)] = &[(11, 5), (5, 6), (0, 5)];
const CHANNELS_5551: &[(u32, u32)] = &[(11, 5), (6, 5), (1, 5), (0, 1)];
const CHANNELS_4444: &[(u32, u32)] = &[(12, 4), (8, 4), (4, 4), (0, 4)];

/// Whether lower levels can be generated for `element`.
pub(super) fn supports(element: &Element) -> bool {
    !element.is_complex()
        && matches!(
            element.data_type(),
            Some(
                DataType::Unsigned8
                    | DataType::Float32
                    | DataType::Unsigned565
                    | DataType::Unsigned5551
                    | DataType::Unsigned4444
            )
        )
}

/// Rebuilds levels `1..lod_count` of every face of `data` from level 0.
pub(super) fn build_chain(ty: &Type, data: &mut [u8]) {
    let Some(data_type) = ty.element().data_type() else {
        return;
    };
    let stride = ty.element().size_bytes();

    for face in 0..ty.face_count() {
        let face_base = face * ty.cells_per_face();
        for lod in 1..ty.lod_count() {
            let src_extent = ty.lod_extent(lod - 1);
            let dst_extent = ty.lod_extent(lod);
            let src_start = (face_base + ty.lod_offset(lod - 1)) * stride;
            let dst_start = (face_base + ty.lod_offset(lod)) * stride;
            let dst_len = dst_extent.0 * dst_extent.1 * dst_extent.2 * stride;

            let (head, tail) = data.split_at_mut(dst_start);
            let level = Level {
                data_type,
                stride,
                src: &head[src_start..],
                src_extent,
            };
            level.filter_into(&mut tail[..dst_len], dst_extent);
        }
    }

    MipmapsGenerated {
        levels: ty.lod_count(),
        faces: ty.face_count(),
    }
    .log();
}

struct Level<'a> {
    data_type: DataType,
    stride: usize,
    src: &'a [u8],
    src_extent: (usize, usize, usize),
}

impl Level<'_> {
    fn filter_into(&self, dst: &mut [u8], dst_extent: (usize, usize, usize)) {
        let (dx, dy, _) = dst_extent;
        for (cell, out) in dst.chunks_exact_mut(self.stride).enumerate() {
            let x = cell % dx;
            let y = (cell / dx) % dy;
            let z = cell / (dx * dy);
            let samples = self.samples(x, y, z);
            match self.data_type {
                DataType::Unsigned8 => self.average_bytes(&samples, out),
                DataType::Float32 => self.average_floats(&samples, out),
                DataType::Unsigned565 => self.average_packed(&samples, out, CHANNELS_565),
                DataType::Unsigned5551 => self.average_packed(&samples, out, CHANNELS_5551),
                DataType::Unsigned4444 => self.average_packed(&samples, out, CHANNELS_4444),
                _ => {}
            }
        }
    }

    /// Byte offsets of the source cells covered by destination cell `(x, y, z)`.
    fn samples(&self, x: usize, y: usize, z: usize) -> Vec<usize> {
        let (sx, sy, sz) = self.src_extent;
        let pair = |d: usize, extent: usize| {
            let lo = (2 * d).min(extent - 1);
            let hi = (2 * d + 1).min(extent - 1);
            if lo == hi {
                vec![lo]
            } else {
                vec![lo, hi]
            }
        };

        let mut offsets = Vec::with_capacity(8);
        for &cz in &pair(z, sz) {
            for &cy in &pair(y, sy) {
                for &cx in &pair(x, sx) {
                    offsets.push(((cz * sy + cy) * sx + cx) * self.stride);
                }
            }
        }
        offsets
    }

    fn average_bytes(&self, samples: &[usize], out: &mut [u8]) {
        let n = samples.len() as u32;
        for (lane, byte) in out.iter_mut().enumerate() {
            let sum: u32 = samples.iter().map(|&s| self.src[s + lane] as u32).sum();
            *byte = ((sum + n / 2) / n) as u8;
        }
    }

    fn average_floats(&self, samples: &[usize], out: &mut [u8]) {
        let n = samples.len() as f32;
        for (lane, chunk) in out.chunks_exact_mut(4).enumerate() {
            let sum: f32 = samples
                .iter()
                .map(|&s| {
                    let at = s + lane * 4;
                    f32::from_le_bytes([
                        self.src[at],
                        self.src[at + 1],
                        self.src[at + 2],
                        self.src[at + 3],
                    ])
                })
                .sum();
            chunk.copy_from_slice(&(sum / n).to_le_bytes());
        }
    }

    fn average_packed(&self, samples: &[usize], out: &mut [u8], channels: &[(u32, u32)]) {
        let n = samples.len() as u32;
        let words: Vec<u32> = samples
            .iter()
            .map(|&s| u16::from_le_bytes([self.src[s], self.src[s + 1]]) as u32)
            .collect();

        let mut packed = 0u32;
        for &(shift, bits) in channels {
            let mask = (1u32 << bits) - 1;
            let sum: u32 = words.iter().map(|w| (w >> shift) & mask).sum();
            packed |= ((sum + n / 2) / n) << shift;
        }
        out.copy_from_slice(&(packed as u16).to_le_bytes());
    }
}
