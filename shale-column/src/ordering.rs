use std::cmp::Ordering;

use shale_error::ShaleResult;
use shale_row::{Row, Value};

use crate::{ColumnBuffer, Page};

/// Where nulls sort relative to non-null values.
///
/// Two nulls always compare equal; two non-null values compare through the
/// base buffer's order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NullOrdering {
    /// Nulls sort before every non-null value.
    #[default]
    NullsFirst,
    /// Nulls sort after every non-null value.
    NullsLast,
}

impl NullOrdering {
    /// Whether position `i` sorts before position `j`, consulting the
    /// definition levels for null-ness and the base buffer for values.
    pub fn is_less(
        &self,
        base: &dyn ColumnBuffer,
        i: usize,
        j: usize,
        max_definition_level: i8,
        definition_levels: &[i8],
    ) -> bool {
        let i_null = is_null(i, max_definition_level, definition_levels);
        let j_null = is_null(j, max_definition_level, definition_levels);
        match self {
            Self::NullsFirst => {
                if i_null {
                    !j_null
                } else {
                    !j_null && base.is_less(i, j)
                }
            }
            Self::NullsLast => {
                if i_null {
                    false
                } else {
                    j_null || base.is_less(i, j)
                }
            }
        }
    }
}

pub(crate) fn is_null(i: usize, max_definition_level: i8, definition_levels: &[i8]) -> bool {
    definition_levels[i] != max_definition_level
}

/// An adapter inverting a buffer's order for descending sorts.
///
/// Only [`is_less`](ColumnBuffer::is_less) changes; the underlying data and
/// every other operation pass straight through.
pub struct ReversedColumn {
    inner: Box<dyn ColumnBuffer>,
}

impl ReversedColumn {
    /// Wrap `inner`, inverting its row order.
    pub fn new(inner: Box<dyn ColumnBuffer>) -> Self {
        Self { inner }
    }

    /// Unwrap the underlying buffer.
    pub fn into_inner(self) -> Box<dyn ColumnBuffer> {
        self.inner
    }
}

impl ColumnBuffer for ReversedColumn {
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
        Box::new(Self {
            inner: self.inner.clone_column(),
        })
    }

    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
        self.inner.write_row(row)
    }

    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
        self.inner.read_row_at(row, index)
    }

    fn is_less(&self, i: usize, j: usize) -> bool {
        self.inner.is_less(j, i)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.inner.swap(i, j);
    }

    fn page(&mut self) -> ShaleResult<Page<'_>> {
        self.inner.page()
    }
}

/// Sort a buffer's rows in place through its `is_less` / `swap` operations.
///
/// The sort is stable: rows that compare equal keep their insertion order.
pub fn sort_column(column: &mut dyn ColumnBuffer) {
    let len = column.len();
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| {
        if column.is_less(a, b) {
            Ordering::Less
        } else if column.is_less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    });

    // Realize the permutation with swaps, chasing sources that earlier
    // iterations already moved.
    for i in 0..len {
        let mut src = order[i];
        while src < i {
            src = order[src];
        }
        if src != i {
            column.swap(i, src);
        }
    }
}
