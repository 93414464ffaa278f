use std::fmt::{Display, Formatter};

/// Physical representation of a leaf column, i.e. the on-page value layout.
///
/// Logical flavors (unsigned integers, textual byte arrays) are hints carried
/// by the leaf node, not separate physical types; they change comparison and
/// conversion behavior but never the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PhysicalType {
    /// Single-bit truth value.
    Boolean,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 96-bit integer, kept for timestamp compatibility.
    Int96,
    /// 32-bit IEEE-754 floating point.
    Float,
    /// 64-bit IEEE-754 floating point.
    Double,
    /// Variable-length byte sequence.
    ByteArray,
    /// Byte sequence of the declared width.
    FixedLenByteArray(usize),
}

impl PhysicalType {
    /// In-memory width of one value in bytes, where the type has one.
    ///
    /// `ByteArray` values have no fixed width and report `None`.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Boolean => Some(1),
            Self::Int32 | Self::Float => Some(4),
            Self::Int64 | Self::Double => Some(8),
            Self::Int96 => Some(12),
            Self::ByteArray => None,
            Self::FixedLenByteArray(size) => Some(*size),
        }
    }
}

impl Display for PhysicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Int96 => write!(f, "int96"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::ByteArray => write!(f, "byte_array"),
            Self::FixedLenByteArray(size) => write!(f, "fixed_len_byte_array({size})"),
        }
    }
}
