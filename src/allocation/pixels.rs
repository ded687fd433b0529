// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Allocations backed by 2D pixel images.

use super::{Allocation, MipmapPolicy, Usage};
use crate::config::consts::MAX_SIZE_BYTES;
use crate::element::Element;
use crate::errors::{Error, Result};
use crate::types::TypeBuilder;
use serde::{Deserialize, Serialize};

/// Channel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Alpha8,
    Rgb565,
    Rgba4444,
    Rgba8888,
}

impl PixelFormat {
    const ALL: [PixelFormat; 4] = [
        PixelFormat::Alpha8,
        PixelFormat::Rgb565,
        PixelFormat::Rgba4444,
        PixelFormat::Rgba8888,
    ];

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::Rgb565 | PixelFormat::Rgba4444 => 2,
            PixelFormat::Rgba8888 => 4,
        }
    }

    /// Element used for allocations built from this format.
    pub fn element(self) -> Element {
        match self {
            PixelFormat::Alpha8 => Element::a_8(),
            PixelFormat::Rgb565 => Element::rgb_565(),
            PixelFormat::Rgba4444 => Element::rgba_4444(),
            PixelFormat::Rgba8888 => Element::rgba_8888(),
        }
    }

    /// Format whose element is compatible with `element`, if any.
    pub fn for_element(element: &Element) -> Option<PixelFormat> {
        Self::ALL
            .into_iter()
            .find(|format| format.element().is_compatible(element))
    }
}

/// A decoded image: row-major, tightly packed pixels.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> PixelFormat;
    fn pixels(&self) -> &[u8];
}

/// In-memory [`PixelSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPixels {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RawPixels {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if width < 1 || height < 1 {
            return Err(Error::illegal("pixel source must be at least 1x1"));
        }
        let expected = image_len(width, height, format)
            .ok_or_else(|| Error::illegal(format!("{}x{} image is too large", width, height)))?;
        if data.len() != expected {
            return Err(Error::illegal(format!(
                "{}x{} {:?} image needs {} bytes, got {}",
                width,
                height,
                format,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// A zero-filled image.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let len = image_len(width, height, format)
            .ok_or_else(|| Error::illegal(format!("{}x{} image is too large", width, height)))?;
        Self::new(width, height, format, vec![0; len])
    }
}

impl PixelSource for RawPixels {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// Byte length of a tightly packed image, `None` if it does not fit in memory.
fn image_len(width: u32, height: u32, format: PixelFormat) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(format.bytes_per_pixel())
        .filter(|&len| len <= MAX_SIZE_BYTES)
}

fn check_source(source: &dyn PixelSource) -> Result<()> {
    let expected = image_len(source.width(), source.height(), source.format());
    if source.width() < 1 || source.height() < 1 || expected != Some(source.pixels().len()) {
        return Err(Error::illegal(format!(
            "malformed pixel source: {}x{} {:?} with {} bytes",
            source.width(),
            source.height(),
            source.format(),
            source.pixels().len()
        )));
    }
    Ok(())
}

fn check_pixel_usage(usage: Usage) -> Result<()> {
    if usage.is_subset_of(Usage::PIXEL_SOURCE_SUPPORTED) {
        Ok(())
    } else {
        Err(Error::illegal(format!(
            "usage {:#x} is not supported for pixel-source allocations",
            usage.bits()
        )))
    }
}

impl Allocation {
    /// 2D allocation holding a copy of `source`. Any policy other than
    /// `None` adds a mip chain; `Full` fills it immediately.
    pub fn create_from_pixel_source(
        source: &dyn PixelSource,
        mipmap_policy: MipmapPolicy,
        usage: Usage,
    ) -> Result<Self> {
        check_pixel_usage(usage)?;
        check_source(source)?;

        let ty = TypeBuilder::new(&source.format().element())
            .set_x(source.width())
            .set_y(source.height())
            .set_mipmaps(mipmap_policy != MipmapPolicy::None)
            .create()?;
        let mut allocation = Self::create_typed(ty, mipmap_policy, usage)?;
        let level0 = source.pixels().len();
        allocation.data[..level0].copy_from_slice(source.pixels());
        allocation.after_write(0);
        Ok(allocation)
    }

    /// Cubemap built from a horizontal strip of six square faces, in
    /// [`crate::types::CubemapFace::ALL`] order. The strip must be
    /// `6 * n` by `n` pixels with `n` a power of two.
    pub fn create_cubemap_from_pixel_source(
        source: &dyn PixelSource,
        mipmap_policy: MipmapPolicy,
        usage: Usage,
    ) -> Result<Self> {
        check_pixel_usage(usage)?;
        check_source(source)?;
        let (width, height) = (source.width(), source.height());
        if width % 6 != 0 {
            return Err(Error::illegal(format!(
                "cubemap strip width {} is not a multiple of 6",
                width
            )));
        }
        if width / 6 != height {
            return Err(Error::illegal(format!(
                "cubemap faces must be square, got {}x{}",
                width / 6,
                height
            )));
        }
        if !height.is_power_of_two() {
            return Err(Error::illegal(format!(
                "cubemap face size {} is not a power of two",
                height
            )));
        }

        let ty = TypeBuilder::new(&source.format().element())
            .set_x(height)
            .set_y(height)
            .set_faces(true)
            .set_mipmaps(mipmap_policy != MipmapPolicy::None)
            .create()?;
        let mut allocation = Self::create_typed(ty, mipmap_policy, usage)?;

        let bpp = source.format().bytes_per_pixel();
        let side = height as usize;
        let row_bytes = side * bpp;
        let face_bytes = allocation.ty.cells_per_face() * bpp;
        let pixels = source.pixels();
        for face in 0..6 {
            for y in 0..side {
                let from = (y * width as usize + face * side) * bpp;
                let to = face * face_bytes + y * row_bytes;
                allocation.data[to..to + row_bytes].copy_from_slice(&pixels[from..from + row_bytes]);
            }
        }
        allocation.after_write(0);
        Ok(allocation)
    }

    /// Replaces level 0 with the pixels of a same-sized, compatible image.
    pub fn copy_from_pixel_source(&mut self, source: &dyn PixelSource) -> Result<()> {
        self.ensure_live("copy_from_pixel_source")?;
        check_source(source)?;
        if !source.format().element().is_compatible(self.element()) {
            return Err(self.reject(
                "copy_from_pixel_source",
                format!("{:?} pixels do not match the allocation element", source.format()),
            ));
        }
        let region = super::Region::rect(0, 0, source.width(), source.height());
        self.check_region("copy_from_pixel_source", &region, 2)?;
        if self.ty.x() != source.width() || self.ty.y() != source.height() {
            return Err(self.reject(
                "copy_from_pixel_source",
                "image size differs from the allocation".to_string(),
            ));
        }

        let len = source.pixels().len();
        self.data[..len].copy_from_slice(source.pixels());
        self.after_write(0);
        Ok(())
    }

    /// Reads level 0 of a 2D pixel allocation back into an image.
    pub fn copy_to_pixels(&self) -> Result<RawPixels> {
        self.ensure_live("copy_to_pixels")?;
        let format = PixelFormat::for_element(self.element()).ok_or_else(|| {
            self.reject(
                "copy_to_pixels",
                "allocation element has no pixel format".to_string(),
            )
        })?;
        if self.ty.dimensionality() != 2 {
            return Err(self.reject(
                "copy_to_pixels",
                format!("{}D allocation is not an image", self.ty.dimensionality()),
            ));
        }
        let len = self.ty.x() as usize * self.ty.y() as usize * format.bytes_per_pixel();
        RawPixels::new(self.ty.x(), self.ty.y(), format, self.data[..len].to_vec())
    }
}
