// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::element::compat::StorageClass;

/// Host scalar types that may be copied in and out of allocations.
///
/// Host buffers are tightly packed slices of components: an element with
/// vector size 3 consumes three consecutive values per cell.
pub trait ElementData: bytemuck::Pod {
    const STORAGE: StorageClass;
}

macro_rules! element_data {
    ($($t:ty => $class:expr),* $(,)?) => {
        $(
            impl ElementData for $t {
                const STORAGE: StorageClass = $class;
            }
        )*
    };
}

element_data! {
    f32 => StorageClass::Float { bits: 32 },
    f64 => StorageClass::Float { bits: 64 },
    i8 => StorageClass::Signed { bits: 8 },
    i16 => StorageClass::Signed { bits: 16 },
    i32 => StorageClass::Signed { bits: 32 },
    i64 => StorageClass::Signed { bits: 64 },
    u8 => StorageClass::Unsigned { bits: 8 },
    u16 => StorageClass::Unsigned { bits: 16 },
    u32 => StorageClass::Unsigned { bits: 32 },
    u64 => StorageClass::Unsigned { bits: 64 },
}
