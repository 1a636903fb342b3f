//! Typed, strided views of buffer views

use glam::Mat4;
use serde::Deserialize;
use std::rc::Rc;

use super::BufferView;
use crate::error::{ContentLoadError, ContentResult};

/// Scalar component encoding.
///
/// The discriminants are the numeric codes used by asset producers and must
/// not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
#[repr(u32)]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    Float = 5126,
}

impl ComponentType {
    /// Size of one component in bytes
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Float => 4,
        }
    }

    /// Decode one little-endian component as `f32` (no normalization).
    fn decode(self, bytes: &[u8]) -> f32 {
        match self {
            Self::Byte => bytes[0] as i8 as f32,
            Self::UnsignedByte => bytes[0] as f32,
            Self::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            Self::UnsignedShort => u16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            Self::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            5120 => Ok(Self::Byte),
            5121 => Ok(Self::UnsignedByte),
            5122 => Ok(Self::Short),
            5123 => Ok(Self::UnsignedShort),
            5126 => Ok(Self::Float),
            other => Err(format!("unknown component type {}", other)),
        }
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AttributeType {
    /// Number of components in one element
    pub fn element_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// Construction parameters for an [`Accessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorDesc {
    /// Offset of the first element inside the buffer view
    pub byte_offset: usize,
    /// Distance between element starts; 0 means tightly packed
    pub byte_stride: usize,
    pub component_type: ComponentType,
    pub attribute_type: AttributeType,
    /// Number of elements
    pub count: usize,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

/// Strided element sequence over a [`BufferView`].
#[derive(Debug, Clone)]
pub struct Accessor {
    name: String,
    buffer_view: Rc<BufferView>,
    desc: AccessorDesc,
}

impl Accessor {
    /// Create an accessor, failing if its elements do not fit in the view.
    pub fn new(
        name: impl Into<String>,
        buffer_view: Rc<BufferView>,
        desc: AccessorDesc,
    ) -> ContentResult<Self> {
        let accessor = Self {
            name: name.into(),
            buffer_view,
            desc,
        };

        let element_size = accessor.element_size();
        if accessor.desc.byte_stride != 0 && accessor.desc.byte_stride < element_size {
            return Err(ContentLoadError::invalid_entry(
                "accessors",
                &accessor.name,
                format!(
                    "byteStride {} is smaller than the element size {}",
                    accessor.desc.byte_stride, element_size
                ),
            ));
        }

        let span = accessor.span(accessor.desc.count).ok_or_else(|| {
            overflow(
                accessor.desc.byte_offset,
                accessor.buffer_view.byte_length(),
            )
        })?;
        crate::error::check_range(
            "accessor",
            accessor.desc.byte_offset,
            span,
            accessor.buffer_view.byte_length(),
        )?;

        Ok(accessor)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_view(&self) -> &Rc<BufferView> {
        &self.buffer_view
    }

    pub fn byte_offset(&self) -> usize {
        self.desc.byte_offset
    }

    pub fn component_type(&self) -> ComponentType {
        self.desc.component_type
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.desc.attribute_type
    }

    pub fn count(&self) -> usize {
        self.desc.count
    }

    pub fn min(&self) -> &[f32] {
        &self.desc.min
    }

    pub fn max(&self) -> &[f32] {
        &self.desc.max
    }

    /// Size of one tightly packed element in bytes
    pub fn element_size(&self) -> usize {
        self.desc.attribute_type.element_count() * self.desc.component_type.size_in_bytes()
    }

    /// Effective stride: the explicit stride, or the element size when it is 0.
    pub fn byte_stride(&self) -> usize {
        if self.desc.byte_stride != 0 {
            self.desc.byte_stride
        } else {
            self.element_size()
        }
    }

    /// Bytes covered by `count` elements: `count * byte_stride()`.
    fn span(&self, count: usize) -> Option<usize> {
        count.checked_mul(self.byte_stride())
    }

    /// Raw strided bytes for elements `offset..offset + count`, including the
    /// stride padding after each element.
    pub fn get_data(&self, offset: usize, count: usize) -> ContentResult<&[u8]> {
        let limit = self.buffer_view.byte_length();
        let start = offset
            .checked_mul(self.byte_stride())
            .and_then(|o| o.checked_add(self.desc.byte_offset))
            .ok_or_else(|| overflow(offset, limit))?;
        let span = self.span(count).ok_or_else(|| overflow(start, limit))?;
        self.buffer_view.get_data(start, span)
    }

    /// Bytes of a single element, without stride padding.
    pub fn element(&self, index: usize) -> ContentResult<&[u8]> {
        let data = self.get_data(index, 1)?;
        Ok(&data[..self.element_size()])
    }

    /// Every component of every element, converted to `f32`.
    pub fn read_f32(&self) -> ContentResult<Vec<f32>> {
        let components = self.desc.attribute_type.element_count();
        let component_size = self.desc.component_type.size_in_bytes();
        let mut values = Vec::with_capacity(self.desc.count * components);

        for index in 0..self.desc.count {
            let element = self.element(index)?;
            for chunk in element.chunks_exact(component_size) {
                values.push(self.desc.component_type.decode(chunk));
            }
        }
        Ok(values)
    }

    /// Elements as column-major matrices. Requires `MAT4` of floats.
    pub fn read_mat4(&self) -> ContentResult<Vec<Mat4>> {
        if self.desc.attribute_type != AttributeType::Mat4
            || self.desc.component_type != ComponentType::Float
        {
            return Err(ContentLoadError::invalid_entry(
                "accessors",
                &self.name,
                format!(
                    "expected MAT4 of floats, found {:?} of {:?}",
                    self.desc.attribute_type, self.desc.component_type
                ),
            ));
        }

        let values = self.read_f32()?;
        Ok(values.chunks_exact(16).map(Mat4::from_cols_slice).collect())
    }

    /// Elements as vertex indices. Requires `SCALAR` of unsigned bytes or shorts.
    pub fn read_indices(&self) -> ContentResult<Vec<u32>> {
        let unsigned = matches!(
            self.desc.component_type,
            ComponentType::UnsignedByte | ComponentType::UnsignedShort
        );
        if self.desc.attribute_type != AttributeType::Scalar || !unsigned {
            return Err(ContentLoadError::invalid_entry(
                "accessors",
                &self.name,
                format!(
                    "expected SCALAR unsigned indices, found {:?} of {:?}",
                    self.desc.attribute_type, self.desc.component_type
                ),
            ));
        }

        Ok(self.read_f32()?.into_iter().map(|v| v as u32).collect())
    }
}

fn overflow(offset: usize, limit: usize) -> ContentLoadError {
    ContentLoadError::OutOfBounds {
        what: "accessor",
        offset,
        length: usize::MAX,
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Buffer;

    fn view_over(bytes: Vec<u8>) -> Rc<BufferView> {
        let len = bytes.len();
        let buffer = Rc::new(Buffer::new("b", "b.bin", bytes));
        Rc::new(BufferView::new("v", buffer, 0, len, None).unwrap())
    }

    fn desc(component_type: ComponentType, attribute_type: AttributeType, count: usize) -> AccessorDesc {
        AccessorDesc {
            byte_offset: 0,
            byte_stride: 0,
            component_type,
            attribute_type,
            count,
            min: Vec::new(),
            max: Vec::new(),
        }
    }

    #[test]
    fn test_numeric_codes_are_stable() {
        assert_eq!(ComponentType::Byte as u32, 5120);
        assert_eq!(ComponentType::UnsignedByte as u32, 5121);
        assert_eq!(ComponentType::Short as u32, 5122);
        assert_eq!(ComponentType::UnsignedShort as u32, 5123);
        assert_eq!(ComponentType::Float as u32, 5126);
        assert_eq!(ComponentType::try_from(5126), Ok(ComponentType::Float));
        assert!(ComponentType::try_from(5124).is_err());
    }

    #[test]
    fn test_default_stride_is_element_size() {
        let components = [
            ComponentType::Byte,
            ComponentType::UnsignedByte,
            ComponentType::Short,
            ComponentType::UnsignedShort,
            ComponentType::Float,
        ];
        let shapes = [
            AttributeType::Scalar,
            AttributeType::Vec2,
            AttributeType::Vec3,
            AttributeType::Vec4,
            AttributeType::Mat2,
            AttributeType::Mat3,
            AttributeType::Mat4,
        ];
        let view = view_over(vec![0; 64]);

        for component in components {
            for shape in shapes {
                let accessor = Accessor::new("a", view.clone(), desc(component, shape, 1)).unwrap();
                assert_eq!(
                    accessor.byte_stride(),
                    shape.element_count() * component.size_in_bytes(),
                    "{:?} {:?}",
                    shape,
                    component
                );
            }
        }
    }

    #[test]
    fn test_explicit_stride_wins() {
        let mut d = desc(ComponentType::Float, AttributeType::Vec3, 2);
        d.byte_stride = 20;
        let accessor = Accessor::new("a", view_over(vec![0; 40]), d).unwrap();
        assert_eq!(accessor.byte_stride(), 20);
        assert_eq!(accessor.element_size(), 12);
    }

    #[test]
    fn test_range_covers_full_stride_of_last_element() {
        // offset + count * stride = 40 > 32, even though the last element's
        // own 12 bytes would fit
        let mut d = desc(ComponentType::Float, AttributeType::Vec3, 2);
        d.byte_stride = 20;
        let result = Accessor::new("a", view_over(vec![0; 32]), d.clone());
        assert!(
            matches!(result, Err(ContentLoadError::OutOfBounds { offset: 0, length: 40, limit: 32, .. })),
            "unexpected result: {:?}",
            result
        );

        d.byte_offset = 4;
        assert!(Accessor::new("a", view_over(vec![0; 43]), d.clone()).is_err());
        assert!(Accessor::new("a", view_over(vec![0; 44]), d).is_ok());
    }

    #[test]
    fn test_stride_smaller_than_element_rejected() {
        let mut d = desc(ComponentType::Float, AttributeType::Vec3, 2);
        d.byte_stride = 8;
        assert!(Accessor::new("a", view_over(vec![0; 64]), d).is_err());
    }

    #[test]
    fn test_range_past_view_rejected() {
        // 3 VEC2 floats need 24 bytes
        let result = Accessor::new(
            "a",
            view_over(vec![0; 20]),
            desc(ComponentType::Float, AttributeType::Vec2, 3),
        );
        assert!(matches!(result, Err(ContentLoadError::OutOfBounds { .. })));
    }

    #[test]
    fn test_get_data_uses_stride() {
        let mut d = desc(ComponentType::UnsignedByte, AttributeType::Vec2, 3);
        d.byte_offset = 1;
        d.byte_stride = 4;
        let accessor = Accessor::new("a", view_over((0u8..13).collect()), d).unwrap();

        assert_eq!(accessor.element(0).unwrap(), &[1, 2]);
        assert_eq!(accessor.element(2).unwrap(), &[9, 10]);
        assert_eq!(accessor.get_data(1, 2).unwrap(), &[5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(accessor.get_data(2, 2).is_err());
        assert_eq!(
            accessor.read_f32().unwrap(),
            vec![1.0, 2.0, 5.0, 6.0, 9.0, 10.0]
        );
    }

    #[test]
    fn test_read_signed_components() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-2i16).to_le_bytes());
        bytes.extend_from_slice(&300i16.to_le_bytes());
        let accessor = Accessor::new(
            "a",
            view_over(bytes),
            desc(ComponentType::Short, AttributeType::Scalar, 2),
        )
        .unwrap();
        assert_eq!(accessor.read_f32().unwrap(), vec![-2.0, 300.0]);
    }

    #[test]
    fn test_read_mat4() {
        let matrix = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let bytes: Vec<u8> = matrix
            .to_cols_array()
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let accessor = Accessor::new(
            "ibm",
            view_over(bytes),
            desc(ComponentType::Float, AttributeType::Mat4, 1),
        )
        .unwrap();

        assert_eq!(accessor.read_mat4().unwrap(), vec![matrix]);
        assert!(accessor.read_indices().is_err());
    }

    #[test]
    fn test_read_indices() {
        let bytes: Vec<u8> = [0u16, 1, 2, 65535]
            .iter()
            .flat_map(|i| i.to_le_bytes())
            .collect();
        let accessor = Accessor::new(
            "idx",
            view_over(bytes),
            desc(ComponentType::UnsignedShort, AttributeType::Scalar, 4),
        )
        .unwrap();

        assert_eq!(accessor.read_indices().unwrap(), vec![0, 1, 2, 65535]);
        assert!(accessor.read_mat4().is_err());
    }
}
