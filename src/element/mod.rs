// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Layout descriptions of a single addressable cell.
//!
//! An [`Element`] is either *basic* (one data type, one kind, a vector size of
//! 1 to 4) or *composite* (an ordered list of named sub-elements, each with an
//! array multiplicity). Elements are immutable; cloning one is an `Arc` bump.
//!
//! Equality is structural and includes field names. Compatibility
//! ([`Element::is_compatible`]) only asks whether two elements produce the same
//! physical layout, so it ignores names and pixel kinds.

pub mod compat;
mod data_type;

pub use data_type::{DataKind, DataType};

use crate::config::consts::{MAX_SIZE_BYTES, MAX_VECTOR_SIZE};
use crate::errors::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash)]
enum Layout {
    Basic {
        data_type: DataType,
        data_kind: DataKind,
        vector_size: u8,
    },
    Composite {
        fields: Vec<Field>,
    },
}

/// One named member of a composite element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    element: Element,
    array_size: usize,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    fn size_bytes(&self) -> usize {
        self.element.size_bytes() * self.array_size
    }
}

/// Description of the layout of one cell of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    layout: Arc<Layout>,
}

impl Element {
    fn basic(data_type: DataType, data_kind: DataKind, vector_size: u8) -> Self {
        Self {
            layout: Arc::new(Layout::Basic {
                data_type,
                data_kind,
                vector_size,
            }),
        }
    }

    /// Single-component user element of any data type.
    pub fn scalar(data_type: DataType) -> Self {
        Self::basic(data_type, DataKind::User, 1)
    }

    /// Vector user element. `size` must be 2, 3 or 4 and the data type must be
    /// a numeric or boolean type.
    pub fn vector(data_type: DataType, size: u8) -> Result<Self> {
        if !(2..=MAX_VECTOR_SIZE).contains(&size) {
            return Err(Error::illegal(format!(
                "vector size {} out of range 2..={}",
                size, MAX_VECTOR_SIZE
            )));
        }
        if !data_type.is_vectorizable() {
            return Err(Error::illegal(format!(
                "{:?} cannot be used as a vector component",
                data_type
            )));
        }
        Ok(Self::basic(data_type, DataKind::User, size))
    }

    /// Pixel element. The data type decides how channels are stored and must
    /// agree with the kind: packed 565 is RGB only, packed 5551/4444 are RGBA
    /// only, 16-bit unsigned is depth only, 8-bit unsigned covers the
    /// luminance/alpha/colour kinds with one byte per channel.
    pub fn pixel(data_type: DataType, data_kind: DataKind) -> Result<Self> {
        let valid = match data_type {
            DataType::Unsigned8 => matches!(
                data_kind,
                DataKind::PixelL
                    | DataKind::PixelA
                    | DataKind::PixelLA
                    | DataKind::PixelRgb
                    | DataKind::PixelRgba
                    | DataKind::PixelYuv
            ),
            DataType::Unsigned16 => data_kind == DataKind::PixelDepth,
            DataType::Unsigned565 => data_kind == DataKind::PixelRgb,
            DataType::Unsigned5551 | DataType::Unsigned4444 => data_kind == DataKind::PixelRgba,
            _ => false,
        };
        if !valid {
            return Err(Error::illegal(format!(
                "unsupported pixel element {:?}/{:?}",
                data_type, data_kind
            )));
        }
        let vector_size = if data_type == DataType::Unsigned8 {
            data_kind.channel_count()
        } else {
            1
        };
        Ok(Self::basic(data_type, data_kind, vector_size))
    }

    pub fn f16() -> Self {
        Self::scalar(DataType::Float16)
    }
    pub fn f32() -> Self {
        Self::scalar(DataType::Float32)
    }
    pub fn f64() -> Self {
        Self::scalar(DataType::Float64)
    }
    pub fn i8() -> Self {
        Self::scalar(DataType::Signed8)
    }
    pub fn i16() -> Self {
        Self::scalar(DataType::Signed16)
    }
    pub fn i32() -> Self {
        Self::scalar(DataType::Signed32)
    }
    pub fn i64() -> Self {
        Self::scalar(DataType::Signed64)
    }
    pub fn u8() -> Self {
        Self::scalar(DataType::Unsigned8)
    }
    pub fn u16() -> Self {
        Self::scalar(DataType::Unsigned16)
    }
    pub fn u32() -> Self {
        Self::scalar(DataType::Unsigned32)
    }
    pub fn u64() -> Self {
        Self::scalar(DataType::Unsigned64)
    }
    pub fn boolean() -> Self {
        Self::scalar(DataType::Boolean)
    }

    pub fn f32_2() -> Self {
        Self::basic(DataType::Float32, DataKind::User, 2)
    }
    pub fn f32_3() -> Self {
        Self::basic(DataType::Float32, DataKind::User, 3)
    }
    pub fn f32_4() -> Self {
        Self::basic(DataType::Float32, DataKind::User, 4)
    }
    pub fn i32_3() -> Self {
        Self::basic(DataType::Signed32, DataKind::User, 3)
    }
    pub fn u8_3() -> Self {
        Self::basic(DataType::Unsigned8, DataKind::User, 3)
    }
    pub fn u8_4() -> Self {
        Self::basic(DataType::Unsigned8, DataKind::User, 4)
    }

    pub fn a_8() -> Self {
        Self::basic(DataType::Unsigned8, DataKind::PixelA, 1)
    }
    pub fn l_8() -> Self {
        Self::basic(DataType::Unsigned8, DataKind::PixelL, 1)
    }
    pub fn rgb_888() -> Self {
        Self::basic(DataType::Unsigned8, DataKind::PixelRgb, 3)
    }
    pub fn rgba_8888() -> Self {
        Self::basic(DataType::Unsigned8, DataKind::PixelRgba, 4)
    }
    pub fn rgb_565() -> Self {
        Self::basic(DataType::Unsigned565, DataKind::PixelRgb, 1)
    }
    pub fn rgba_5551() -> Self {
        Self::basic(DataType::Unsigned5551, DataKind::PixelRgba, 1)
    }
    pub fn rgba_4444() -> Self {
        Self::basic(DataType::Unsigned4444, DataKind::PixelRgba, 1)
    }

    pub fn matrix_4x4() -> Self {
        Self::scalar(DataType::Matrix4x4)
    }
    pub fn matrix_3x3() -> Self {
        Self::scalar(DataType::Matrix3x3)
    }
    pub fn matrix_2x2() -> Self {
        Self::scalar(DataType::Matrix2x2)
    }

    pub fn allocation_handle() -> Self {
        Self::scalar(DataType::AllocationHandle)
    }
    pub fn sampler_handle() -> Self {
        Self::scalar(DataType::SamplerHandle)
    }

    /// Data type of a basic element, `None` for composites.
    pub fn data_type(&self) -> Option<DataType> {
        match &*self.layout {
            Layout::Basic { data_type, .. } => Some(*data_type),
            Layout::Composite { .. } => None,
        }
    }

    pub fn data_kind(&self) -> DataKind {
        match &*self.layout {
            Layout::Basic { data_kind, .. } => *data_kind,
            Layout::Composite { .. } => DataKind::User,
        }
    }

    /// Vector width of a basic element; composites report 1.
    pub fn vector_size(&self) -> u8 {
        match &*self.layout {
            Layout::Basic { vector_size, .. } => *vector_size,
            Layout::Composite { .. } => 1,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(&*self.layout, Layout::Composite { .. })
    }

    pub fn fields(&self) -> &[Field] {
        match &*self.layout {
            Layout::Basic { .. } => &[],
            Layout::Composite { fields } => fields,
        }
    }

    /// Bytes one cell occupies in an allocation. Three-wide vectors are stored
    /// with a fourth, unused lane.
    pub fn size_bytes(&self) -> usize {
        match &*self.layout {
            Layout::Basic {
                data_type,
                vector_size,
                ..
            } => {
                let lanes = if *vector_size == 3 { 4 } else { *vector_size as usize };
                data_type.size_bytes() * lanes
            }
            Layout::Composite { fields } => fields.iter().map(Field::size_bytes).sum(),
        }
    }

    /// Bytes one cell occupies in a tightly packed host buffer.
    pub fn packed_size_bytes(&self) -> usize {
        match &*self.layout {
            Layout::Basic {
                data_type,
                vector_size,
                ..
            } => data_type.size_bytes() * *vector_size as usize,
            Layout::Composite { .. } => self.size_bytes(),
        }
    }

    /// Whether cells carry a padding lane that host buffers do not.
    pub(crate) fn is_padded(&self) -> bool {
        self.size_bytes() != self.packed_size_bytes()
    }

    /// Byte offset of the field at `index` within a cell.
    pub fn sub_element_offset(&self, index: usize) -> Result<usize> {
        let fields = self.fields();
        if index >= fields.len() {
            return Err(Error::illegal(format!(
                "field index {} out of range for element with {} fields",
                index,
                fields.len()
            )));
        }
        Ok(fields[..index].iter().map(Field::size_bytes).sum())
    }

    /// Two elements are compatible when they produce identical physical
    /// layouts. Names and pixel kinds never participate.
    pub fn is_compatible(&self, other: &Element) -> bool {
        if Arc::ptr_eq(&self.layout, &other.layout) {
            return true;
        }
        match (&*self.layout, &*other.layout) {
            (
                Layout::Basic {
                    data_type: a,
                    vector_size: va,
                    ..
                },
                Layout::Basic {
                    data_type: b,
                    vector_size: vb,
                    ..
                },
            ) => va == vb && compat::same_storage(*a, *b),
            (Layout::Composite { fields: fa }, Layout::Composite { fields: fb }) => {
                fa.len() == fb.len()
                    && fa.iter().zip(fb).all(|(a, b)| {
                        a.array_size == b.array_size && a.element.is_compatible(&b.element)
                    })
            }
            _ => false,
        }
    }

    /// True when both values were produced by the same construction call.
    pub fn same_instance(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.layout, &other.layout)
    }
}

/// Accumulates fields for a composite element.
///
/// The builder is a plain value; `create` snapshots it, so one builder can
/// issue any number of independent elements.
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    fields: Vec<Field>,
}

impl ElementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: &Element, name: &str) -> &mut Self {
        self.add_array(element, name, 1)
    }

    pub fn add_array(&mut self, element: &Element, name: &str, array_size: usize) -> &mut Self {
        self.fields.push(Field {
            name: name.to_string(),
            element: element.clone(),
            array_size,
        });
        self
    }

    pub fn create(&self) -> Result<Element> {
        if self.fields.is_empty() {
            return Err(Error::illegal("composite element needs at least one field"));
        }
        let mut seen = HashSet::new();
        let mut size: usize = 0;
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(Error::illegal("field names must not be empty"));
            }
            if field.array_size == 0 {
                return Err(Error::illegal(format!(
                    "field '{}' has array size 0",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::illegal(format!("duplicate field name '{}'", field.name)));
            }
            size = field
                .element
                .size_bytes()
                .checked_mul(field.array_size)
                .and_then(|bytes| size.checked_add(bytes))
                .filter(|&total| total <= MAX_SIZE_BYTES)
                .ok_or_else(|| {
                    Error::illegal(format!("field '{}' makes the element too large", field.name))
                })?;
        }
        Ok(Element {
            layout: Arc::new(Layout::Composite {
                fields: self.fields.clone(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn particle(position: &str, velocity: &str) -> Element {
        ElementBuilder::new()
            .add(&Element::f32_2(), position)
            .add(&Element::f32_2(), velocity)
            .add_array(&Element::u8(), "flags", 4)
            .create()
            .unwrap()
    }

    #[test]
    fn test_compatibility_ignores_names_equality_does_not() {
        let a = particle("pos", "vel");
        let b = particle("position", "velocity");
        assert_ne!(a, b);
        assert!(a.is_compatible(&b));
        assert!(b.is_compatible(&a));
    }

    #[test]
    fn test_sub_element_type_difference_breaks_both() {
        let a = particle("pos", "vel");
        let b = ElementBuilder::new()
            .add(&Element::f32_2(), "pos")
            .add(&Element::i32(), "vel")
            .add_array(&Element::u8(), "flags", 4)
            .create()
            .unwrap();
        assert_ne!(a, b);
        assert!(!a.is_compatible(&b));
    }

    #[test]
    fn test_array_size_participates_in_compatibility() {
        let a = ElementBuilder::new()
            .add_array(&Element::f32(), "w", 3)
            .create()
            .unwrap();
        let b = ElementBuilder::new()
            .add_array(&Element::f32(), "w", 4)
            .create()
            .unwrap();
        assert!(!a.is_compatible(&b));
    }

    #[test]
    fn test_builder_is_reusable() {
        let mut builder = ElementBuilder::new();
        builder.add(&Element::f32(), "x");
        let first = builder.create().unwrap();
        let second = builder.create().unwrap();
        assert_eq!(first, second);
        assert!(!first.same_instance(&second));

        builder.add(&Element::f32(), "y");
        let third = builder.create().unwrap();
        assert_eq!(first.fields().len(), 1);
        assert_eq!(third.fields().len(), 2);
    }

    #[test]
    fn test_builder_rejects_bad_fields() {
        let err = ElementBuilder::new().create().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let err = ElementBuilder::new()
            .add(&Element::f32(), "x")
            .add(&Element::i32(), "x")
            .create()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let err = ElementBuilder::new()
            .add(&Element::f32(), "")
            .create()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let err = ElementBuilder::new()
            .add_array(&Element::f32(), "x", 0)
            .create()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
    }

    #[test]
    fn test_builder_rejects_oversized_arrays() {
        let err = ElementBuilder::new()
            .add_array(&Element::f32_4(), "huge", usize::MAX / 8)
            .create()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let half = isize::MAX as usize / 2 + 1;
        let err = ElementBuilder::new()
            .add_array(&Element::u8(), "a", half)
            .add_array(&Element::u8(), "b", half)
            .create()
            .unwrap_err();
        assert!(err.to_string().contains("'b'"));

        let fits = ElementBuilder::new()
            .add_array(&Element::u8(), "a", half)
            .create()
            .unwrap();
        assert_eq!(fits.size_bytes(), half);
    }

    #[test]
    fn test_pixel_aliases_are_compatible_with_user_vectors() {
        assert!(Element::rgba_8888().is_compatible(&Element::u8_4()));
        assert_ne!(Element::rgba_8888(), Element::u8_4());
        assert!(Element::pixel(DataType::Unsigned8, DataKind::PixelRgba)
            .unwrap()
            .is_compatible(&Element::rgba_8888()));
        assert!(!Element::rgba_8888().is_compatible(&Element::rgba_4444()));
        assert!(!Element::u8().is_compatible(&Element::i8()));
    }

    #[test]
    fn test_basic_and_composite_never_compatible() {
        let single = ElementBuilder::new()
            .add(&Element::f32(), "v")
            .create()
            .unwrap();
        assert!(!single.is_compatible(&Element::f32()));
    }

    #[test]
    fn test_pixel_kind_rules() {
        assert!(Element::pixel(DataType::Unsigned565, DataKind::PixelRgb).is_ok());
        assert!(Element::pixel(DataType::Unsigned565, DataKind::PixelRgba).is_err());
        assert!(Element::pixel(DataType::Unsigned4444, DataKind::PixelRgba).is_ok());
        assert!(Element::pixel(DataType::Unsigned16, DataKind::PixelDepth).is_ok());
        assert!(Element::pixel(DataType::Float32, DataKind::PixelRgba).is_err());
        assert_eq!(
            Element::pixel(DataType::Unsigned8, DataKind::PixelLA)
                .unwrap()
                .vector_size(),
            2
        );
    }

    #[test]
    fn test_vector_validation() {
        assert!(Element::vector(DataType::Float32, 3).is_ok());
        assert!(Element::vector(DataType::Float32, 5).is_err());
        assert!(Element::vector(DataType::Float32, 1).is_err());
        assert!(Element::vector(DataType::Matrix4x4, 2).is_err());
    }

    #[test]
    fn test_sizes_pad_three_wide_vectors_only() {
        assert_eq!(Element::f32_3().size_bytes(), 16);
        assert_eq!(Element::f32_3().packed_size_bytes(), 12);
        assert_eq!(Element::u8_3().size_bytes(), 4);
        assert_eq!(Element::f32_2().size_bytes(), 8);
        assert_eq!(Element::f32_4().size_bytes(), 16);
        assert!(!Element::f32_4().is_padded());
        assert_eq!(Element::rgb_565().size_bytes(), 2);
    }

    #[test]
    fn test_composite_size_and_offsets() {
        let e = particle("pos", "vel");
        assert_eq!(e.size_bytes(), 8 + 8 + 4);
        assert_eq!(e.sub_element_offset(0).unwrap(), 0);
        assert_eq!(e.sub_element_offset(2).unwrap(), 16);
        assert!(e.sub_element_offset(3).is_err());
        assert!(e.is_complex());
        assert_eq!(e.data_type(), None);
    }
}
