use std::fmt::{Display, Formatter};

use bytes::Bytes;
use shale_schema::Int96;

/// A row is the flat sequence of leaf values produced by a left-to-right,
/// depth-first traversal of the schema. Repeated values share a column index;
/// their relative order in the row is their order within the repetition.
pub type Row = Vec<Value>;

/// The payload of one leaf value, tagged by physical kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ValueData {
    /// The null payload, standing in for an absent optional or repeated
    /// subtree.
    #[default]
    Null,
    /// A boolean payload.
    Boolean(bool),
    /// A 32-bit integer payload (signed or unsigned, per the column).
    Int32(i32),
    /// A 64-bit integer payload (signed or unsigned, per the column).
    Int64(i64),
    /// A 96-bit integer payload.
    Int96(Int96),
    /// A 32-bit floating point payload.
    Float(f32),
    /// A 64-bit floating point payload.
    Double(f64),
    /// A variable-length binary payload.
    ByteArray(Bytes),
    /// A fixed-width binary payload.
    FixedLenByteArray(Bytes),
}

impl ValueData {
    /// Short name of the payload kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Int96(_) => "int96",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::ByteArray(_) => "byte_array",
            Self::FixedLenByteArray(_) => "fixed_len_byte_array",
        }
    }
}

/// One leaf value of a shredded row: a payload plus the column index and the
/// repetition and definition levels of the leaf occurrence it came from.
///
/// The column index is stored as the bitwise complement of the true index, so
/// a zero-initialized value is an invalid sentinel rather than a plausible
/// column 0. [`Value::column_index`] decodes it; values that were never
/// stamped report `-1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Value {
    pub(crate) data: ValueData,
    pub(crate) column_index: i8,
    pub(crate) repetition_level: i8,
    pub(crate) definition_level: i8,
}

impl Value {
    fn new(data: ValueData) -> Self {
        Self {
            data,
            column_index: 0,
            repetition_level: 0,
            definition_level: 0,
        }
    }

    /// The null value.
    pub fn null() -> Self {
        Self::new(ValueData::Null)
    }

    /// A boolean value.
    pub fn boolean(v: bool) -> Self {
        Self::new(ValueData::Boolean(v))
    }

    /// A 32-bit integer value.
    pub fn int32(v: i32) -> Self {
        Self::new(ValueData::Int32(v))
    }

    /// A 64-bit integer value.
    pub fn int64(v: i64) -> Self {
        Self::new(ValueData::Int64(v))
    }

    /// A 96-bit integer value.
    pub fn int96(v: Int96) -> Self {
        Self::new(ValueData::Int96(v))
    }

    /// A 32-bit floating point value.
    pub fn float(v: f32) -> Self {
        Self::new(ValueData::Float(v))
    }

    /// A 64-bit floating point value.
    pub fn double(v: f64) -> Self {
        Self::new(ValueData::Double(v))
    }

    /// A variable-length binary value.
    pub fn byte_array(v: impl Into<Bytes>) -> Self {
        Self::new(ValueData::ByteArray(v.into()))
    }

    /// A fixed-width binary value.
    pub fn fixed_len_byte_array(v: impl Into<Bytes>) -> Self {
        Self::new(ValueData::FixedLenByteArray(v.into()))
    }

    /// The payload.
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    /// Whether the payload is null.
    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    /// The column index this value belongs to; `-1` if never stamped.
    pub fn column_index(&self) -> i8 {
        !self.column_index
    }

    /// The repetition level of this occurrence.
    pub fn repetition_level(&self) -> i8 {
        self.repetition_level
    }

    /// The definition level of this occurrence.
    pub fn definition_level(&self) -> i8 {
        self.definition_level
    }

    /// This value with both levels set.
    pub fn with_levels(mut self, repetition_level: i8, definition_level: i8) -> Self {
        self.repetition_level = repetition_level;
        self.definition_level = definition_level;
        self
    }

    /// This value stamped with its column index.
    ///
    /// Column buffers return values without a column stamp; readers assembling
    /// full rows from a set of buffers stamp each value with the column it was
    /// read from.
    pub fn with_column_index(mut self, index: i8) -> Self {
        self.set_column_index(index);
        self
    }

    /// Stamp the column index in place.
    pub fn set_column_index(&mut self, index: i8) {
        self.column_index = !index;
    }

    /// Overwrite the repetition level, for readers reattaching levels to
    /// values produced from leveled storage.
    pub fn set_repetition_level(&mut self, level: i8) {
        self.repetition_level = level;
    }

    /// Overwrite the definition level, for readers reattaching levels to
    /// values produced from leveled storage.
    pub fn set_definition_level(&mut self, level: i8) {
        self.definition_level = level;
    }

    /// The boolean payload, if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self.data {
            ValueData::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// The 32-bit integer payload, if any.
    pub fn as_int32(&self) -> Option<i32> {
        match self.data {
            ValueData::Int32(v) => Some(v),
            _ => None,
        }
    }

    /// The 64-bit integer payload, if any.
    pub fn as_int64(&self) -> Option<i64> {
        match self.data {
            ValueData::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// The 96-bit integer payload, if any.
    pub fn as_int96(&self) -> Option<Int96> {
        match self.data {
            ValueData::Int96(v) => Some(v),
            _ => None,
        }
    }

    /// The 32-bit floating point payload, if any.
    pub fn as_float(&self) -> Option<f32> {
        match self.data {
            ValueData::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The 64-bit floating point payload, if any.
    pub fn as_double(&self) -> Option<f64> {
        match self.data {
            ValueData::Double(v) => Some(v),
            _ => None,
        }
    }

    /// The binary payload, fixed-width or not, if any.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.data {
            ValueData::ByteArray(v) | ValueData::FixedLenByteArray(v) => Some(v),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            ValueData::Null => write!(f, "null")?,
            ValueData::Boolean(v) => write!(f, "{v}")?,
            ValueData::Int32(v) => write!(f, "{v}")?,
            ValueData::Int64(v) => write!(f, "{v}")?,
            ValueData::Int96(v) => write!(f, "{v}")?,
            ValueData::Float(v) => write!(f, "{v}")?,
            ValueData::Double(v) => write!(f, "{v}")?,
            ValueData::ByteArray(v) | ValueData::FixedLenByteArray(v) => {
                write!(f, "{} bytes", v.len())?
            }
        }
        write!(
            f,
            " [c={} r={} d={}]",
            self.column_index(),
            self.repetition_level,
            self.definition_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_initialized_values_are_invalid() {
        assert_eq!(Value::default().column_index(), -1);
        assert!(Value::default().is_null());
    }

    #[test]
    fn column_stamp_round_trips() {
        let value = Value::int32(7).with_column_index(5);
        assert_eq!(value.column_index(), 5);
        assert_eq!(value.as_int32(), Some(7));
    }

    #[test]
    fn display_shows_levels() {
        let value = Value::int32(42).with_column_index(0).with_levels(0, 1);
        assert_eq!(value.to_string(), "42 [c=0 r=0 d=1]");
    }
}
