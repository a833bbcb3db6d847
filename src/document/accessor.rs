use serde::Deserialize;

use super::Err;

/// glTF component type codes, one per scalar encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    UnsignedInt = 5125,
    Float = 5126,
}

impl ComponentType {
    /// Width of one component in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }

    /// The numeric code used by the document format.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = Err;

    fn try_from(code: u32) -> Result<Self, Err> {
        match code {
            5120 => Ok(ComponentType::Byte),
            5121 => Ok(ComponentType::UnsignedByte),
            5122 => Ok(ComponentType::Short),
            5123 => Ok(ComponentType::UnsignedShort),
            5125 => Ok(ComponentType::UnsignedInt),
            5126 => Ok(ComponentType::Float),
            _ => Err(Err::InvalidComponentType(code)),
        }
    }
}

/// Scalar arity of an accessor element ("SCALAR", "VEC3", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Dimensions {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Dimensions {
    /// Number of components per element.
    pub fn component_count(self) -> usize {
        match self {
            Dimensions::Scalar => 1,
            Dimensions::Vec2 => 2,
            Dimensions::Vec3 => 3,
            Dimensions::Vec4 => 4,
            Dimensions::Mat2 => 4,
            Dimensions::Mat3 => 9,
            Dimensions::Mat4 => 16,
        }
    }

    /// The name used by the document format.
    pub fn name(self) -> &'static str {
        match self {
            Dimensions::Scalar => "SCALAR",
            Dimensions::Vec2 => "VEC2",
            Dimensions::Vec3 => "VEC3",
            Dimensions::Vec4 => "VEC4",
            Dimensions::Mat2 => "MAT2",
            Dimensions::Mat3 => "MAT3",
            Dimensions::Mat4 => "MAT4",
        }
    }
}

impl TryFrom<String> for Dimensions {
    type Error = Err;

    fn try_from(name: String) -> Result<Self, Err> {
        match name.as_str() {
            "SCALAR" => Ok(Dimensions::Scalar),
            "VEC2" => Ok(Dimensions::Vec2),
            "VEC3" => Ok(Dimensions::Vec3),
            "VEC4" => Ok(Dimensions::Vec4),
            "MAT2" => Ok(Dimensions::Mat2),
            "MAT3" => Ok(Dimensions::Mat3),
            "MAT4" => Ok(Dimensions::Mat4),
            _ => Err(Err::InvalidDimensions(name)),
        }
    }
}

/// A contiguous byte range `[byte_offset, byte_offset + byte_length)` within
/// one buffer. Views are append-only; an existing index is never reused for
/// different semantics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    #[serde(default)]
    pub byte_stride: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
}

impl BufferView {
    /// A view covering one buffer from its first byte to its last.
    pub fn spanning(buffer: usize, byte_length: usize, name: impl Into<String>) -> Self {
        Self {
            buffer,
            byte_offset: 0,
            byte_length,
            byte_stride: None,
            name: Some(name.into()),
        }
    }
}

/// Describes how to interpret a byte range reached through a buffer view:
/// element count, component encoding, arity, and a byte offset relative to
/// the start of the referenced view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    #[serde(default)]
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub count: usize,
    #[serde(rename = "type")]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub normalized: bool,
    #[serde(default)]
    pub name: Option<String>,
}

impl Accessor {
    /// Total number of bytes one element occupies.
    pub fn element_byte_width(&self) -> usize {
        self.component_type.byte_width() * self.dimensions.component_count()
    }

    /// Repoints this accessor at the start of a freshly created view.
    pub fn repoint(&mut self, buffer_view: usize) {
        self.buffer_view = Some(buffer_view);
        self.byte_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_codes_round_trip() {
        for code in [5120u32, 5121, 5122, 5123, 5125, 5126] {
            let ct = ComponentType::try_from(code).unwrap();
            assert_eq!(ct.code(), code);
        }
        assert!(ComponentType::try_from(5124).is_err());
    }

    #[test]
    fn component_widths() {
        assert_eq!(ComponentType::UnsignedShort.byte_width(), 2);
        assert_eq!(ComponentType::Float.byte_width(), 4);
        assert_eq!(ComponentType::Byte.byte_width(), 1);
    }

    #[test]
    fn dimensions_from_name() {
        assert_eq!(
            Dimensions::try_from("VEC3".to_string()).unwrap(),
            Dimensions::Vec3
        );
        assert_eq!(Dimensions::Mat4.component_count(), 16);
        assert!(Dimensions::try_from("VEC5".to_string()).is_err());
    }

    #[test]
    fn element_byte_width_combines_width_and_arity() {
        let accessor = Accessor {
            buffer_view: None,
            byte_offset: 0,
            component_type: ComponentType::Float,
            count: 3,
            dimensions: Dimensions::Vec3,
            normalized: false,
            name: None,
        };
        assert_eq!(accessor.element_byte_width(), 12);
    }
}
