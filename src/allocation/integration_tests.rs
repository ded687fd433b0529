// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::allocation::{Allocation, MipmapPolicy, PixelFormat, RawPixels, Region, Usage};
use crate::element::{Element, ElementBuilder};
use crate::errors::ErrorKind;
use crate::types::{CubemapFace, TypeBuilder};

/// Cross-module scenarios for allocations: shapes from `types`, elements from
/// `element`, and the copy, mipmap and pixel paths together.
#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize, seed: i32) -> Vec<i32> {
        (0..len as i32).map(|i| i * 7 + seed).collect()
    }

    #[test]
    fn test_round_trip_across_element_catalogue() {
        let mut a = Allocation::create_sized(&Element::i16(), 5).unwrap();
        let src = [i16::MIN, -1, 0, 1, i16::MAX];
        a.copy_from(&src).unwrap();
        let mut out = [0i16; 5];
        a.copy_to(&mut out).unwrap();
        assert_eq!(out, src);

        let mut b = Allocation::create_sized(&Element::f64(), 3).unwrap();
        let src = [f64::MIN_POSITIVE, -0.0, f64::NAN];
        b.copy_from(&src).unwrap();
        let mut out = [0f64; 3];
        b.copy_to(&mut out).unwrap();
        for (x, y) in src.iter().zip(out.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }

        let mut c = Allocation::create_sized(&Element::boolean(), 3).unwrap();
        c.copy_from(&[1u8, 0, 1]).unwrap();
        let mut out = [9u8; 3];
        c.copy_to(&mut out).unwrap();
        assert_eq!(out, [1, 0, 1]);
    }

    #[test]
    fn test_partial_range_leaves_other_cells_untouched() {
        let x = 16u32;
        for offset in 0..x {
            for count in 1..=(x - offset) {
                let mut a = Allocation::create_sized(&Element::i32(), x).unwrap();
                let prior = pattern(x as usize, 1000);
                a.copy_from(&prior).unwrap();

                let src = pattern(count as usize, -50);
                a.copy_1d_range_from(offset, count, &src).unwrap();

                let mut out = vec![0i32; x as usize];
                a.copy_to(&mut out).unwrap();
                for (i, value) in out.iter().enumerate() {
                    let i32_index = i as u32;
                    if i32_index >= offset && i32_index < offset + count {
                        assert_eq!(*value, src[(i32_index - offset) as usize]);
                    } else {
                        assert_eq!(*value, prior[i]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_2d_block_addressing_over_all_placements() {
        let (nx, ny) = (6u32, 5u32);
        let ty = TypeBuilder::new(&Element::i32()).set_x(nx).set_y(ny).create().unwrap();
        for (w, h) in [(1u32, 1u32), (2, 3), (6, 1), (1, 5), (6, 5)] {
            for y in 0..=(ny - h) {
                for x in 0..=(nx - w) {
                    let mut a = Allocation::new(ty.clone()).unwrap();
                    let src = pattern((w * h) as usize, 1);
                    a.copy_2d_range_from(x, y, w, h, &src).unwrap();

                    let mut out = vec![0i32; (nx * ny) as usize];
                    a.copy_to(&mut out).unwrap();
                    for yy in y..y + h {
                        for xx in x..x + w {
                            assert_eq!(
                                out[(yy * nx + xx) as usize],
                                src[((yy - y) * w + (xx - x)) as usize]
                            );
                        }
                    }
                    let written: usize = out.iter().filter(|v| **v != 0).count();
                    assert_eq!(written, (w * h) as usize);
                }
            }
        }
    }

    #[test]
    fn test_failed_copies_leave_allocation_unchanged() {
        let ty = TypeBuilder::new(&Element::f32_3()).set_x(4).set_y(2).create().unwrap();
        let mut a = Allocation::new(ty).unwrap();
        let initial: Vec<f32> = (0..24).map(|v| v as f32).collect();
        a.copy_from(&initial).unwrap();
        let before = a.bytes().to_vec();

        assert!(a.copy_2d_range_from(3, 0, 2, 1, &[1f32; 6]).is_err());
        assert!(a.copy_2d_range_from(0, 0, 2, 2, &[1f32; 11]).is_err());
        assert!(a.copy_2d_range_from(0, 0, 1, 1, &[1i32; 3]).is_err());
        assert!(a.copy_1d_range_from(7, 2, &[1f32; 6]).is_err());
        assert_eq!(a.bytes(), &before[..]);
    }

    #[test]
    fn test_full_policy_tracks_level_zero_writes() {
        let ty = TypeBuilder::new(&Element::u8())
            .set_x(4)
            .set_y(4)
            .set_mipmaps(true)
            .create()
            .unwrap();
        let mut full = Allocation::create_typed(ty.clone(), MipmapPolicy::Full, Usage::SCRIPT).unwrap();
        full.copy_2d_range_from(0, 0, 4, 4, &[40u8; 16]).unwrap();
        // level 1 starts at 16, level 2 at 20
        assert!(full.bytes()[16..20].iter().all(|&b| b == 40));
        assert_eq!(full.bytes()[20], 40);

        let mut on_sync =
            Allocation::create_typed(ty.clone(), MipmapPolicy::OnSync, Usage::SCRIPT).unwrap();
        on_sync.copy_2d_range_from(0, 0, 4, 4, &[40u8; 16]).unwrap();
        assert_eq!(on_sync.bytes()[20], 0);
        on_sync.sync_all().unwrap();
        assert_eq!(on_sync.bytes()[20], 40);

        let mut none = Allocation::new(ty).unwrap();
        none.copy_2d_range_from(0, 0, 4, 4, &[40u8; 16]).unwrap();
        none.sync_all().unwrap();
        assert_eq!(none.bytes()[20], 0);
        none.generate_mipmaps().unwrap();
        assert_eq!(none.bytes()[20], 40);
    }

    #[test]
    fn test_explicit_lod_writes_do_not_regenerate() {
        let ty = TypeBuilder::new(&Element::u8())
            .set_x(2)
            .set_y(2)
            .set_mipmaps(true)
            .create()
            .unwrap();
        let mut a = Allocation::create_typed(ty, MipmapPolicy::Full, Usage::SCRIPT).unwrap();
        a.copy_region_from(&Region::rect(0, 0, 1, 1).at_lod(1), &[77u8]).unwrap();
        assert_eq!(a.bytes()[4], 77);
    }

    #[test]
    fn test_generate_mipmaps_rejections() {
        let mut flat = Allocation::create_sized(&Element::u8(), 4).unwrap();
        assert_eq!(
            flat.generate_mipmaps().unwrap_err().kind(),
            ErrorKind::InvalidState
        );

        let ty = TypeBuilder::new(&Element::i32())
            .set_x(4)
            .set_mipmaps(true)
            .create()
            .unwrap();
        let mut ints = Allocation::new(ty.clone()).unwrap();
        assert_eq!(
            ints.generate_mipmaps().unwrap_err().kind(),
            ErrorKind::IllegalArgument
        );
        assert!(Allocation::create_typed(ty, MipmapPolicy::Full, Usage::SCRIPT).is_err());
    }

    #[test]
    fn test_cubemap_strip_round_trip_through_faces() {
        let side = 2u32;
        let mut strip = Vec::new();
        for y in 0..side {
            for x in 0..side * 6 {
                strip.push((y * 100 + x) as u8);
            }
        }
        let source = RawPixels::new(side * 6, side, PixelFormat::Alpha8, strip).unwrap();
        let cube =
            Allocation::create_cubemap_from_pixel_source(&source, MipmapPolicy::None, Usage::SCRIPT)
                .unwrap();

        let mut face = [0u8; 4];
        cube.copy_region_to(
            &Region::rect(0, 0, 2, 2).on_face(CubemapFace::PositiveY),
            &mut face,
        )
        .unwrap();
        assert_eq!(face, [4, 5, 104, 105]);
    }

    #[test]
    fn test_composite_allocation_to_allocation_copy_is_name_blind() {
        let point = ElementBuilder::new()
            .add(&Element::f32(), "x")
            .add(&Element::f32(), "y")
            .create()
            .unwrap();
        let renamed = ElementBuilder::new()
            .add(&Element::f32(), "u")
            .add(&Element::f32(), "v")
            .create()
            .unwrap();

        let mut src = Allocation::create_sized(&point, 3).unwrap();
        src.copy_from_unchecked(&[1f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut dst = Allocation::create_sized(&renamed, 3).unwrap();
        dst.copy_1d_range_from_allocation(1, 2, &src, 0).unwrap();

        let mut out = [0f32; 6];
        dst.copy_to_unchecked(&mut out).unwrap();
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_shared_allocation_visible_across_handles() {
        let shared = Allocation::create_sized(&Element::u32(), 2).unwrap().into_shared();
        let writer = shared.clone();
        tokio::spawn(async move {
            writer.lock().await.copy_from(&[5u32, 6]).unwrap();
        })
        .await
        .unwrap();

        let mut out = [0u32; 2];
        shared.lock().await.copy_to(&mut out).unwrap();
        assert_eq!(out, [5, 6]);
    }
}
