use num_traits::AsPrimitive;
use shale_error::ShaleResult;
use shale_row::{Row, Value};

use crate::{ColumnBuffer, Page, PrimitiveBuffer};

/// Buffer for uint32 columns: int32 storage, unsigned comparison.
///
/// The payloads stay physically signed; only the order changes, so `-1`
/// (reinterpreted as `u32::MAX`) sorts last instead of first.
#[derive(Debug, Clone, Default)]
pub struct U32Buffer {
    inner: PrimitiveBuffer<i32>,
}

/// Buffer for uint64 columns: int64 storage, unsigned comparison.
#[derive(Debug, Clone, Default)]
pub struct U64Buffer {
    inner: PrimitiveBuffer<i64>,
}

macro_rules! unsigned_buffer {
    ($Buffer:ident, $signed:ty, $unsigned:ty) => {
        impl $Buffer {
            /// An empty buffer.
            pub fn new() -> Self {
                Self::default()
            }

            /// An empty buffer with room for `capacity` rows.
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    inner: PrimitiveBuffer::with_capacity(capacity),
                }
            }
        }

        impl ColumnBuffer for $Buffer {
            fn len(&self) -> usize {
                self.inner.len()
            }

            fn capacity(&self) -> usize {
                self.inner.capacity()
            }

            fn size_bytes(&self) -> usize {
                self.inner.size_bytes()
            }

            fn reset(&mut self) {
                self.inner.reset();
            }

            fn clone_column(&self) -> Box<dyn ColumnBuffer> {
                Box::new(self.clone())
            }

            fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
                self.inner.write_row(row)
            }

            fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
                self.inner.read_row_at(row, index)
            }

            fn is_less(&self, i: usize, j: usize) -> bool {
                let a: $unsigned = self.inner.values()[i].as_();
                let b: $unsigned = self.inner.values()[j].as_();
                a < b
            }

            fn swap(&mut self, i: usize, j: usize) {
                self.inner.swap(i, j);
            }

            fn page(&mut self) -> ShaleResult<Page<'_>> {
                self.inner.page()
            }
        }
    };
}

unsigned_buffer!(U32Buffer, i32, u32);
unsigned_buffer!(U64Buffer, i64, u64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort_column;

    #[test]
    fn unsigned_order_differs_from_signed() {
        let mut signed = PrimitiveBuffer::<i32>::new();
        let mut unsigned = U32Buffer::new();
        for buffer in [&mut signed as &mut dyn ColumnBuffer, &mut unsigned] {
            buffer
                .write_row(&[Value::int32(-1), Value::int32(1)])
                .unwrap();
        }
        assert!(signed.is_less(0, 1));
        assert!(!unsigned.is_less(0, 1)); // -1 reads as u32::MAX
        assert!(unsigned.is_less(1, 0));
    }

    #[test]
    fn sorting_uint64_puts_reinterpreted_negatives_last() {
        let mut buffer = U64Buffer::new();
        buffer
            .write_row(&[Value::int64(-1), Value::int64(0), Value::int64(5)])
            .unwrap();
        sort_column(&mut buffer);

        let mut row = Row::new();
        for index in 0..3 {
            buffer.read_row_at(&mut row, index).unwrap();
        }
        let read: Vec<i64> = row.iter().map(|v| v.as_int64().unwrap()).collect();
        assert_eq!(read, [0, 5, -1]);
    }
}
