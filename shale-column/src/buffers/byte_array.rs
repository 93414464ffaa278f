use bytes::Bytes;
use shale_error::{shale_bail, ShaleError, ShaleResult};
use shale_row::{Row, Value, ValueData};

use crate::{ByteSpan, ColumnBuffer, Page, PageValues};

/// Base buffer for variable-length binary columns.
///
/// Payloads live back to back in a shared arena; each row is a span into it.
/// Sorting permutes only the spans, so swaps stay cheap regardless of value
/// size. Rows order lexicographically by their bytes.
#[derive(Debug, Clone, Default)]
pub struct ByteArrayBuffer {
    data: Vec<u8>,
    spans: Vec<ByteSpan>,
}

// Arena headroom per expected value, matching the row-capacity hint.
const BYTES_PER_VALUE_HINT: usize = 16;

impl ByteArrayBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer with room for `capacity` rows of typical size.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity * BYTES_PER_VALUE_HINT),
            spans: Vec::with_capacity(capacity),
        }
    }

    fn bytes_at(&self, index: usize) -> &[u8] {
        let span = self.spans[index];
        &self.data[span.offset as usize..(span.offset + span.len) as usize]
    }
}

impl ColumnBuffer for ByteArrayBuffer {
    fn len(&self) -> usize {
        self.spans.len()
    }

    fn capacity(&self) -> usize {
        self.spans.capacity()
    }

    fn size_bytes(&self) -> usize {
        self.data.len() + self.spans.len() * std::mem::size_of::<ByteSpan>()
    }

    fn reset(&mut self) {
        self.data.clear();
        self.spans.clear();
    }

    fn clone_column(&self) -> Box<dyn ColumnBuffer> {
        Box::new(self.clone())
    }

    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
        for value in row {
            let bytes: &[u8] = match value.data() {
                // Null placeholder: an empty span keeps the buffer parallel
                // to the wrapping level arrays.
                ValueData::Null => &[],
                ValueData::ByteArray(b) | ValueData::FixedLenByteArray(b) => b,
                other => shale_bail!(
                    "cannot store {} payload in byte_array column",
                    other.kind_name()
                ),
            };
            let offset = self.data.len() as u32;
            self.data.extend_from_slice(bytes);
            self.spans.push(ByteSpan {
                offset,
                len: bytes.len() as u32,
            });
        }
        Ok(())
    }

    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
        if index >= self.spans.len() {
            return Err(ShaleError::EndOfColumn);
        }
        row.push(Value::byte_array(Bytes::copy_from_slice(
            self.bytes_at(index),
        )));
        Ok(())
    }

    fn is_less(&self, i: usize, j: usize) -> bool {
        self.bytes_at(i) < self.bytes_at(j)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.spans.swap(i, j);
    }

    fn page(&mut self) -> ShaleResult<Page<'_>> {
        Ok(Page::flat(PageValues::ByteArray {
            data: &self.data,
            spans: &self.spans,
        }))
    }
}

/// Base buffer for binary columns whose every value has the same declared
/// width.
///
/// The arena is flat: value `i` occupies bytes `i * size .. (i + 1) * size`.
/// Rows order lexicographically, which for equal widths is also the
/// byte-wise total order.
#[derive(Debug, Clone)]
pub struct FixedLenByteArrayBuffer {
    size: usize,
    data: Vec<u8>,
}

impl FixedLenByteArrayBuffer {
    /// An empty buffer for values of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self { size, data: Vec::new() }
    }

    /// An empty buffer for values of `size` bytes, with room for `capacity`
    /// rows.
    pub fn with_capacity(size: usize, capacity: usize) -> Self {
        Self {
            size,
            data: Vec::with_capacity(size * capacity),
        }
    }

    /// The declared value width.
    pub fn value_size(&self) -> usize {
        self.size
    }

    fn bytes_at(&self, index: usize) -> &[u8] {
        &self.data[index * self.size..(index + 1) * self.size]
    }
}

impl ColumnBuffer for FixedLenByteArrayBuffer {
    fn len(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.data.len() / self.size
        }
    }

    fn capacity(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.data.capacity() / self.size
        }
    }

    fn size_bytes(&self) -> usize {
        self.data.len()
    }

    fn reset(&mut self) {
        self.data.clear();
    }

    fn clone_column(&self) -> Box<dyn ColumnBuffer> {
        Box::new(self.clone())
    }

    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
        for value in row {
            match value.data() {
                // Null placeholder: a zeroed value keeps the arena aligned.
                ValueData::Null => self.data.resize(self.data.len() + self.size, 0),
                ValueData::FixedLenByteArray(b) | ValueData::ByteArray(b) => {
                    if b.len() != self.size {
                        shale_bail!(
                            "fixed_len_byte_array({}) column cannot store a {}-byte value",
                            self.size,
                            b.len()
                        );
                    }
                    self.data.extend_from_slice(b);
                }
                other => shale_bail!(
                    "cannot store {} payload in fixed_len_byte_array({}) column",
                    other.kind_name(),
                    self.size
                ),
            }
        }
        Ok(())
    }

    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
        if index >= self.len() {
            return Err(ShaleError::EndOfColumn);
        }
        row.push(Value::fixed_len_byte_array(Bytes::copy_from_slice(
            self.bytes_at(index),
        )));
        Ok(())
    }

    fn is_less(&self, i: usize, j: usize) -> bool {
        self.bytes_at(i) < self.bytes_at(j)
    }

    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        for k in 0..self.size {
            self.data.swap(i * self.size + k, j * self.size + k);
        }
    }

    fn page(&mut self) -> ShaleResult<Page<'_>> {
        Ok(Page::flat(PageValues::FixedLenByteArray {
            size: self.size,
            data: &self.data,
        }))
    }
}
