pub use byte_array::*;
pub use optional::*;
pub use primitive::*;
pub use repeated::*;
pub use unsigned::*;

mod byte_array;
mod optional;
mod primitive;
mod repeated;
mod unsigned;

use shale_error::ShaleResult;
use shale_row::{Row, Value};
use shale_schema::{ColumnDescriptor, PhysicalType};

use crate::ordering::is_null;
use crate::{NullOrdering, Page, ReversedColumn};

/// An append-only buffer for the values of one leaf column.
///
/// Rows enter through [`write_row`](Self::write_row) and can be read back in
/// their current order with [`read_row_at`](Self::read_row_at). The
/// [`is_less`](Self::is_less) / [`swap`](Self::swap) pair defines a total
/// order and in-place permutation over rows, which [`sort_column`] drives.
/// [`page`](Self::page) materializes the current contents as a read-only
/// view.
///
/// Buffers are single-threaded: every operation runs to completion on the
/// caller's thread, and distinct columns may be owned by distinct threads.
///
/// [`sort_column`]: crate::sort_column
pub trait ColumnBuffer: Send {
    /// Number of rows written.
    fn len(&self) -> usize;

    /// Whether no rows have been written.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of rows the buffer can hold before reallocating.
    fn capacity(&self) -> usize;

    /// Memory footprint of the buffered payloads and levels, in bytes.
    fn size_bytes(&self) -> usize;

    /// Clear all rows, keeping the allocated capacity for reuse.
    fn reset(&mut self);

    /// Deep copy sharing no mutable memory with this buffer.
    fn clone_column(&self) -> Box<dyn ColumnBuffer>;

    /// Append one logical row's values for this column.
    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()>;

    /// Append the values of the row at `index` to `row`.
    ///
    /// Reading past the last row fails with the
    /// [`EndOfColumn`](shale_error::ShaleError::EndOfColumn) stop signal.
    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()>;

    /// Whether the row at `i` sorts before the row at `j`.
    fn is_less(&self, i: usize, j: usize) -> bool;

    /// Exchange the rows at `i` and `j`.
    fn swap(&mut self, i: usize, j: usize);

    /// Materialize the current contents as a read-only page.
    ///
    /// The view borrows the buffer and is invalidated by its next mutation.
    /// Optional and repeated buffers compact nulls out of the backing values
    /// while keeping the full-length level arrays alongside.
    fn page(&mut self) -> ShaleResult<Page<'_>>;
}

/// Construction-time options for [`column_buffer_of`].
#[derive(Debug, Clone, Copy)]
pub struct BufferOptions {
    /// Row-capacity hint for the initial allocation.
    pub capacity: usize,
    /// Where nulls sort for optional and repeated columns.
    pub null_ordering: NullOrdering,
    /// Invert the row order for descending sorts.
    pub descending: bool,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            capacity: 1024,
            null_ordering: NullOrdering::default(),
            descending: false,
        }
    }
}

/// Build the buffer stack for one leaf column: a typed base buffer, wrapped
/// for optionality or repetition according to the column's max levels, and
/// reversed if a descending order was requested.
pub fn column_buffer_of(
    column: &ColumnDescriptor,
    options: &BufferOptions,
) -> Box<dyn ColumnBuffer> {
    let capacity = options.capacity;
    let base: Box<dyn ColumnBuffer> = match column.leaf.physical {
        PhysicalType::Boolean => Box::new(PrimitiveBuffer::<bool>::with_capacity(capacity)),
        PhysicalType::Int32 if column.leaf.unsigned => {
            Box::new(U32Buffer::with_capacity(capacity))
        }
        PhysicalType::Int32 => Box::new(PrimitiveBuffer::<i32>::with_capacity(capacity)),
        PhysicalType::Int64 if column.leaf.unsigned => {
            Box::new(U64Buffer::with_capacity(capacity))
        }
        PhysicalType::Int64 => Box::new(PrimitiveBuffer::<i64>::with_capacity(capacity)),
        PhysicalType::Int96 => {
            Box::new(PrimitiveBuffer::<shale_schema::Int96>::with_capacity(capacity))
        }
        PhysicalType::Float => Box::new(PrimitiveBuffer::<f32>::with_capacity(capacity)),
        PhysicalType::Double => Box::new(PrimitiveBuffer::<f64>::with_capacity(capacity)),
        PhysicalType::ByteArray => Box::new(ByteArrayBuffer::with_capacity(capacity)),
        PhysicalType::FixedLenByteArray(size) => {
            Box::new(FixedLenByteArrayBuffer::with_capacity(size, capacity))
        }
    };

    let leveled: Box<dyn ColumnBuffer> = if column.max_repetition_level > 0 {
        Box::new(RepeatedBuffer::new(
            base,
            column.max_repetition_level,
            column.max_definition_level,
            options.null_ordering,
        ))
    } else if column.max_definition_level > 0 {
        Box::new(OptionalBuffer::new(
            base,
            column.max_definition_level,
            options.null_ordering,
        ))
    } else {
        base
    };

    if options.descending {
        Box::new(ReversedColumn::new(leveled))
    } else {
        leveled
    }
}

/// Compact non-null values to the front of `base`, preserving their relative
/// order, and return how many there are.
///
/// The scan swaps each non-null value into the next free slot, so the base's
/// page sliced to the returned count contains exactly the non-null values.
/// Running it desynchronizes the base from `definition_levels`; callers track
/// a compaction generation so the scan runs at most once per mutation.
pub(crate) fn compact_nulls(
    base: &mut dyn ColumnBuffer,
    max_definition_level: i8,
    definition_levels: &[i8],
) -> usize {
    let mut n = 0;
    let mut i = 0;
    while i < definition_levels.len() {
        let mut j = i;
        while j < definition_levels.len() && is_null(j, max_definition_level, definition_levels) {
            j += 1;
        }
        if j < definition_levels.len() {
            base.swap(n, j);
            n += 1;
        }
        i = j + 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use shale_error::ShaleError;
    use shale_schema::{columns_of, Field, Node};

    use super::*;

    #[test]
    fn factory_wires_wrappers_from_levels() {
        let schema = Node::group(vec![
            Field::new("flat", Node::int32()),
            Field::new("opt", Node::double().optional()),
            Field::new("rep", Node::string().repeated()),
        ]);
        let columns = columns_of(&schema).unwrap();
        let options = BufferOptions::default();

        let mut flat = column_buffer_of(&columns[0], &options);
        let mut opt = column_buffer_of(&columns[1], &options);
        let mut rep = column_buffer_of(&columns[2], &options);

        flat.write_row(&[Value::int32(1)]).unwrap();
        opt.write_row(&[Value::null()]).unwrap();
        rep.write_row(&[
            Value::byte_array(&b"a"[..]).with_levels(0, 1),
            Value::byte_array(&b"b"[..]).with_levels(1, 1),
        ])
        .unwrap();

        assert_eq!(flat.len(), 1);
        assert_eq!(opt.len(), 1);
        assert_eq!(rep.len(), 1);

        assert_eq!(flat.page().unwrap().num_values(), 1);
        assert_eq!(opt.page().unwrap().num_values(), 0);
        assert_eq!(rep.page().unwrap().num_values(), 2);
    }

    #[test]
    fn end_of_column_signals_instead_of_failing() {
        let schema = Node::group(vec![Field::new("a", Node::int32())]);
        let columns = columns_of(&schema).unwrap();
        let mut buffer = column_buffer_of(&columns[0], &BufferOptions::default());
        buffer.write_row(&[Value::int32(9)]).unwrap();

        let mut row = Row::new();
        buffer.read_row_at(&mut row, 0).unwrap();
        let err = buffer.read_row_at(&mut row, 1).unwrap_err();
        assert!(matches!(err, ShaleError::EndOfColumn));
    }
}
