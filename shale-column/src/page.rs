use bytes::Bytes;
use shale_error::{ShaleError, ShaleResult};
use shale_row::Value;
use shale_schema::Int96;

/// Location of one variable-length value inside a byte-array arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    /// Byte offset of the value in the arena.
    pub offset: u32,
    /// Length of the value in bytes.
    pub len: u32,
}

/// The typed backing of a [`Page`], borrowed from its source buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageValues<'a> {
    /// Boolean values.
    Boolean(&'a [bool]),
    /// 32-bit integer values.
    Int32(&'a [i32]),
    /// 64-bit integer values.
    Int64(&'a [i64]),
    /// 96-bit integer values.
    Int96(&'a [Int96]),
    /// 32-bit floating point values.
    Float(&'a [f32]),
    /// 64-bit floating point values.
    Double(&'a [f64]),
    /// Variable-length binary values: spans into a shared arena.
    ByteArray {
        /// The shared arena.
        data: &'a [u8],
        /// One span per value, in row order.
        spans: &'a [ByteSpan],
    },
    /// Fixed-width binary values laid out back to back.
    FixedLenByteArray {
        /// Width of each value.
        size: usize,
        /// The flat arena, `size` bytes per value.
        data: &'a [u8],
    },
}

impl<'a> PageValues<'a> {
    /// Number of values in the view.
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Int96(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::ByteArray { spans, .. } => spans.len(),
            Self::FixedLenByteArray { size, data } => {
                if *size == 0 {
                    0
                } else {
                    data.len() / size
                }
            }
        }
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sub-view covering values `from..to`.
    pub fn slice(self, from: usize, to: usize) -> Self {
        match self {
            Self::Boolean(v) => Self::Boolean(&v[from..to]),
            Self::Int32(v) => Self::Int32(&v[from..to]),
            Self::Int64(v) => Self::Int64(&v[from..to]),
            Self::Int96(v) => Self::Int96(&v[from..to]),
            Self::Float(v) => Self::Float(&v[from..to]),
            Self::Double(v) => Self::Double(&v[from..to]),
            Self::ByteArray { data, spans } => Self::ByteArray {
                data,
                spans: &spans[from..to],
            },
            Self::FixedLenByteArray { size, data } => Self::FixedLenByteArray {
                size,
                data: &data[from * size..to * size],
            },
        }
    }

    /// The value at `index`, as an owned payload without levels.
    pub fn value_at(&self, index: usize) -> Value {
        match self {
            Self::Boolean(v) => Value::boolean(v[index]),
            Self::Int32(v) => Value::int32(v[index]),
            Self::Int64(v) => Value::int64(v[index]),
            Self::Int96(v) => Value::int96(v[index]),
            Self::Float(v) => Value::float(v[index]),
            Self::Double(v) => Value::double(v[index]),
            Self::ByteArray { data, spans } => {
                let span = spans[index];
                let bytes = &data[span.offset as usize..(span.offset + span.len) as usize];
                Value::byte_array(Bytes::copy_from_slice(bytes))
            }
            Self::FixedLenByteArray { size, data } => {
                let bytes = &data[index * size..(index + 1) * size];
                Value::fixed_len_byte_array(Bytes::copy_from_slice(bytes))
            }
        }
    }
}

/// An immutable snapshot view over a column buffer's current values.
///
/// For optional and repeated columns the backing values have nulls compacted
/// out while the definition-level array keeps its full length, so the page
/// can still reconstitute null positions on read. The view borrows the source
/// buffer; the borrow checker enforces that it cannot outlive the buffer's
/// next mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a> {
    values: PageValues<'a>,
    max_repetition_level: i8,
    max_definition_level: i8,
    repetition_levels: Option<&'a [i8]>,
    definition_levels: Option<&'a [i8]>,
}

impl<'a> Page<'a> {
    /// A page over a flat column: no levels, one value per row.
    pub fn flat(values: PageValues<'a>) -> Self {
        Self {
            values,
            max_repetition_level: 0,
            max_definition_level: 0,
            repetition_levels: None,
            definition_levels: None,
        }
    }

    /// A page over an optional column: compacted values plus the full
    /// definition-level array.
    pub fn optional(
        values: PageValues<'a>,
        max_definition_level: i8,
        definition_levels: &'a [i8],
    ) -> Self {
        Self {
            values,
            max_repetition_level: 0,
            max_definition_level,
            repetition_levels: None,
            definition_levels: Some(definition_levels),
        }
    }

    /// A page over a repeated column: compacted values plus both full-length
    /// level arrays.
    pub fn repeated(
        values: PageValues<'a>,
        max_repetition_level: i8,
        max_definition_level: i8,
        repetition_levels: &'a [i8],
        definition_levels: &'a [i8],
    ) -> Self {
        Self {
            values,
            max_repetition_level,
            max_definition_level,
            repetition_levels: Some(repetition_levels),
            definition_levels: Some(definition_levels),
        }
    }

    /// The typed backing values.
    pub fn values(&self) -> &PageValues<'a> {
        &self.values
    }

    /// Consume the page, keeping only its backing values.
    pub fn into_values(self) -> PageValues<'a> {
        self.values
    }

    /// Number of non-null values backing the page.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Number of null positions recorded in the definition levels.
    pub fn num_nulls(&self) -> usize {
        match self.definition_levels {
            None => 0,
            Some(defs) => defs
                .iter()
                .filter(|&&d| d != self.max_definition_level)
                .count(),
        }
    }

    /// Number of logical rows in the page.
    pub fn num_rows(&self) -> usize {
        match (self.repetition_levels, self.definition_levels) {
            (Some(reps), _) => reps.iter().filter(|&&r| r == 0).count(),
            (None, Some(defs)) => defs.len(),
            (None, None) => self.values.len(),
        }
    }

    /// Highest repetition level of the column.
    pub fn max_repetition_level(&self) -> i8 {
        self.max_repetition_level
    }

    /// Highest definition level of the column.
    pub fn max_definition_level(&self) -> i8 {
        self.max_definition_level
    }

    /// The repetition levels, present for repeated columns.
    pub fn repetition_levels(&self) -> Option<&'a [i8]> {
        self.repetition_levels
    }

    /// The definition levels, present for optional and repeated columns.
    pub fn definition_levels(&self) -> Option<&'a [i8]> {
        self.definition_levels
    }

    /// Read `out.len()` consecutive values starting at `offset` into `out`.
    ///
    /// The values carry payloads only; levels and column stamps are the
    /// caller's concern. Fails if the range runs past the backing values.
    pub fn read_values_at(&self, offset: usize, out: &mut [Value]) -> ShaleResult<usize> {
        let len = self.values.len();
        if offset + out.len() > len {
            return Err(ShaleError::OutOfBounds {
                index: offset + out.len(),
                len,
            });
        }
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.values.value_at(offset + i);
        }
        Ok(out.len())
    }
}
