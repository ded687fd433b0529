// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Storage type of one component of an element.
///
/// The variants fall into five families: floating point, integer, boolean,
/// packed pixel encodings (several channels squeezed into one 16-bit word),
/// square float matrices, and opaque handles to other runtime objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Float16,
    Float32,
    Float64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Boolean,
    Unsigned565,
    Unsigned5551,
    Unsigned4444,
    Matrix4x4,
    Matrix3x3,
    Matrix2x2,
    ElementHandle,
    TypeHandle,
    AllocationHandle,
    SamplerHandle,
    ScriptHandle,
}

impl DataType {
    /// Size in bytes of a single component.
    pub fn size_bytes(self) -> usize {
        match self {
            DataType::Signed8 | DataType::Unsigned8 | DataType::Boolean => 1,
            DataType::Float16
            | DataType::Signed16
            | DataType::Unsigned16
            | DataType::Unsigned565
            | DataType::Unsigned5551
            | DataType::Unsigned4444 => 2,
            DataType::Float32 | DataType::Signed32 | DataType::Unsigned32 => 4,
            DataType::Float64 | DataType::Signed64 | DataType::Unsigned64 => 8,
            DataType::Matrix4x4 => 64,
            DataType::Matrix3x3 => 36,
            DataType::Matrix2x2 => 16,
            DataType::ElementHandle
            | DataType::TypeHandle
            | DataType::AllocationHandle
            | DataType::SamplerHandle
            | DataType::ScriptHandle => crate::config::consts::HANDLE_SIZE_BYTES,
        }
    }

    /// Types that may be used as the component of a 2-, 3- or 4-wide vector.
    pub fn is_vectorizable(self) -> bool {
        matches!(
            self,
            DataType::Float16
                | DataType::Float32
                | DataType::Float64
                | DataType::Signed8
                | DataType::Signed16
                | DataType::Signed32
                | DataType::Signed64
                | DataType::Unsigned8
                | DataType::Unsigned16
                | DataType::Unsigned32
                | DataType::Unsigned64
                | DataType::Boolean
        )
    }

    pub fn is_packed_pixel(self) -> bool {
        matches!(
            self,
            DataType::Unsigned565 | DataType::Unsigned5551 | DataType::Unsigned4444
        )
    }

    pub fn is_handle(self) -> bool {
        matches!(
            self,
            DataType::ElementHandle
                | DataType::TypeHandle
                | DataType::AllocationHandle
                | DataType::SamplerHandle
                | DataType::ScriptHandle
        )
    }

    /// Parses the short names used in graph descriptions (`f32`, `u8`, `rgb_565`, ...).
    pub fn from_short_name(name: &str) -> Option<DataType> {
        let dt = match name {
            "f16" => DataType::Float16,
            "f32" => DataType::Float32,
            "f64" => DataType::Float64,
            "i8" => DataType::Signed8,
            "i16" => DataType::Signed16,
            "i32" => DataType::Signed32,
            "i64" => DataType::Signed64,
            "u8" => DataType::Unsigned8,
            "u16" => DataType::Unsigned16,
            "u32" => DataType::Unsigned32,
            "u64" => DataType::Unsigned64,
            "bool" => DataType::Boolean,
            "rgb_565" => DataType::Unsigned565,
            "rgba_5551" => DataType::Unsigned5551,
            "rgba_4444" => DataType::Unsigned4444,
            "mat4" => DataType::Matrix4x4,
            "mat3" => DataType::Matrix3x3,
            "mat2" => DataType::Matrix2x2,
            _ => return None,
        };
        Some(dt)
    }
}

/// Interpretation of an element's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Plain user data with no channel semantics.
    #[default]
    User,
    PixelL,
    PixelA,
    PixelLA,
    PixelRgb,
    PixelRgba,
    PixelDepth,
    PixelYuv,
}

impl DataKind {
    pub fn is_pixel(self) -> bool {
        self != DataKind::User
    }

    /// Number of channels a pixel kind implies, used as the vector size of
    /// elements built from unpacked 8-bit channels.
    pub fn channel_count(self) -> u8 {
        match self {
            DataKind::User | DataKind::PixelL | DataKind::PixelA | DataKind::PixelDepth => 1,
            DataKind::PixelLA => 2,
            DataKind::PixelRgb | DataKind::PixelYuv => 3,
            DataKind::PixelRgba => 4,
        }
    }
}
