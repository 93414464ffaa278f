use log::debug;
use shale_error::{shale_err, ShaleError, ShaleExpect, ShaleResult};
use shale_row::{Row, Value};

use crate::buffers::compact_nulls;
use crate::{ColumnBuffer, NullOrdering, Page};

/// An `(offset, length)` pair marking one logical row's run inside the
/// parallel value and level arrays of a [`RepeatedBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Start of the run.
    pub offset: u32,
    /// Number of values in the run.
    pub length: u32,
}

/// Wrapper adding repetition- and definition-level tracking to a base
/// buffer, for repeated columns.
///
/// Each written row occupies a contiguous region of the base and of both
/// level arrays. Sorting swaps only the regions; once regions no longer lie
/// contiguously, [`page`](ColumnBuffer::page) rebuilds a contiguous copy in a
/// cached reorder buffer before materializing.
pub struct RepeatedBuffer {
    base: Box<dyn ColumnBuffer>,
    max_repetition_level: i8,
    max_definition_level: i8,
    rows: Vec<Region>,
    repetition_levels: Vec<i8>,
    definition_levels: Vec<i8>,
    null_ordering: NullOrdering,
    /// Scratch row reused while feeding the reorder buffer.
    scratch: Vec<Value>,
    /// Lazily allocated contiguous copy used by the reorder path; reset, not
    /// freed, between pages.
    reordering: Option<Box<RepeatedBuffer>>,
    /// Non-null count from a null-compaction still in sync with the base;
    /// cleared by any mutation.
    compacted: Option<usize>,
}

impl RepeatedBuffer {
    /// Wrap `base` for a column with the given max levels.
    pub fn new(
        base: Box<dyn ColumnBuffer>,
        max_repetition_level: i8,
        max_definition_level: i8,
        null_ordering: NullOrdering,
    ) -> Self {
        let capacity = base.capacity();
        Self {
            base,
            max_repetition_level,
            max_definition_level,
            rows: Vec::with_capacity(capacity / 8),
            repetition_levels: Vec::with_capacity(capacity),
            definition_levels: Vec::with_capacity(capacity),
            null_ordering,
            scratch: Vec::new(),
            reordering: None,
            compacted: None,
        }
    }

    /// The column's max repetition level.
    pub fn max_repetition_level(&self) -> i8 {
        self.max_repetition_level
    }

    /// The column's max definition level.
    pub fn max_definition_level(&self) -> i8 {
        self.max_definition_level
    }

    /// The regions of the buffered rows, in their current order.
    pub fn regions(&self) -> &[Region] {
        &self.rows
    }

    fn fresh_like(&self) -> RepeatedBuffer {
        let mut base = self.base.clone_column();
        base.reset();
        RepeatedBuffer::new(
            base,
            self.max_repetition_level,
            self.max_definition_level,
            self.null_ordering,
        )
    }
}

/// Whether the regions no longer lie contiguously in insertion layout.
///
/// The first region whose offset differs from the running sum of lengths
/// betrays that a sort has moved rows around.
pub(crate) fn rows_have_been_reordered(rows: &[Region]) -> bool {
    let mut offset = 0u32;
    for row in rows {
        if row.offset != offset {
            return true;
        }
        offset += row.length;
    }
    false
}

fn max_row_length(rows: &[Region]) -> u32 {
    rows.iter().map(|row| row.length).max().unwrap_or(0)
}

impl ColumnBuffer for RepeatedBuffer {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn capacity(&self) -> usize {
        self.rows.capacity()
    }

    fn size_bytes(&self) -> usize {
        self.base.size_bytes()
            + self.rows.len() * std::mem::size_of::<Region>()
            + self.repetition_levels.len()
            + self.definition_levels.len()
    }

    fn reset(&mut self) {
        self.base.reset();
        self.rows.clear();
        self.repetition_levels.clear();
        self.definition_levels.clear();
        self.compacted = None;
    }

    fn clone_column(&self) -> Box<dyn ColumnBuffer> {
        Box::new(Self {
            base: self.base.clone_column(),
            max_repetition_level: self.max_repetition_level,
            max_definition_level: self.max_definition_level,
            rows: self.rows.clone(),
            repetition_levels: self.repetition_levels.clone(),
            definition_levels: self.definition_levels.clone(),
            null_ordering: self.null_ordering,
            scratch: Vec::new(),
            reordering: None,
            compacted: self.compacted,
        })
    }

    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
        self.base.write_row(row)?;
        self.rows.push(Region {
            offset: self.repetition_levels.len() as u32,
            length: row.len() as u32,
        });
        for value in row {
            self.repetition_levels.push(value.repetition_level());
            self.definition_levels.push(value.definition_level());
        }
        self.compacted = None;
        Ok(())
    }

    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
        if index >= self.rows.len() {
            return Err(ShaleError::EndOfColumn);
        }

        let reset = row.len();
        let region = self.rows[index];
        let start = region.offset as usize;
        let end = start + region.length as usize;
        let repetition_levels = &self.repetition_levels[start..end];
        let definition_levels = &self.definition_levels[start..end];

        for i in 0..region.length as usize {
            if definition_levels[i] != self.max_definition_level {
                row.push(Value::null().with_levels(repetition_levels[i], definition_levels[i]));
                continue;
            }

            let at = row.len();
            if let Err(e) = self.base.read_row_at(row, start + i) {
                row.truncate(reset);
                return Err(e);
            }
            match row.len() - at {
                1 => {
                    row[at].set_repetition_level(repetition_levels[i]);
                    row[at].set_definition_level(definition_levels[i]);
                }
                0 => {
                    row.truncate(reset);
                    return Err(shale_err!(
                        "repeated column has no value for element {i} of row index {index}"
                    ));
                }
                _ => {
                    row.truncate(reset);
                    return Err(shale_err!(
                        "repeated column has more than one value for element {i} of row index {index}"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Rows compare lexicographically position by position under the null
    /// ordering; a strict prefix sorts before its extension.
    fn is_less(&self, i: usize, j: usize) -> bool {
        let row1 = self.rows[i];
        let row2 = self.rows[j];

        for k in 0..row1.length.min(row2.length) {
            let x = (row1.offset + k) as usize;
            let y = (row2.offset + k) as usize;
            let less = |a, b| {
                self.null_ordering.is_less(
                    self.base.as_ref(),
                    a,
                    b,
                    self.max_definition_level,
                    &self.definition_levels,
                )
            };
            if less(x, y) {
                return true;
            }
            if less(y, x) {
                return false;
            }
        }

        row1.length < row2.length
    }

    /// Swaps exchange regions only; the value and level arrays stay put, so
    /// sorting costs nothing per swap regardless of row length.
    fn swap(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    fn page(&mut self) -> ShaleResult<Page<'_>> {
        if !rows_have_been_reordered(&self.rows) {
            let non_null = match self.compacted {
                Some(n) => n,
                None => {
                    let n = compact_nulls(
                        self.base.as_mut(),
                        self.max_definition_level,
                        &self.definition_levels,
                    );
                    self.compacted = Some(n);
                    n
                }
            };
            let base_page = self.base.page()?;
            return Ok(Page::repeated(
                base_page.into_values().slice(0, non_null),
                self.max_repetition_level,
                self.max_definition_level,
                &self.repetition_levels,
                &self.definition_levels,
            ));
        }

        debug!(
            "reordering {} rows of repeated column before page materialization",
            self.rows.len()
        );

        let max_length = max_row_length(&self.rows) as usize;
        if self.scratch.len() < max_length {
            self.scratch.resize(max_length, Value::default());
        }
        if self.reordering.is_none() {
            self.reordering = Some(Box::new(self.fresh_like()));
        }
        let reordering = self
            .reordering
            .as_mut()
            .shale_expect("reorder buffer was just allocated");
        reordering.reset();

        {
            let base_page = self.base.page()?;
            for region in &self.rows {
                let values = &mut self.scratch[..region.length as usize];
                base_page.read_values_at(region.offset as usize, values)?;
                reordering.base.write_row(values)?;
            }
        }

        for region in &self.rows {
            let start = region.offset as usize;
            let end = start + region.length as usize;
            reordering.rows.push(Region {
                offset: reordering.repetition_levels.len() as u32,
                length: region.length,
            });
            reordering
                .repetition_levels
                .extend_from_slice(&self.repetition_levels[start..end]);
            reordering
                .definition_levels
                .extend_from_slice(&self.definition_levels[start..end]);
        }

        let non_null = compact_nulls(
            reordering.base.as_mut(),
            self.max_definition_level,
            &reordering.definition_levels,
        );
        let base_page = reordering.base.page()?;
        Ok(Page::repeated(
            base_page.into_values().slice(0, non_null),
            self.max_repetition_level,
            self.max_definition_level,
            &reordering.repetition_levels,
            &reordering.definition_levels,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sort_column, PageValues, PrimitiveBuffer};

    const MAX_REP: i8 = 1;
    const MAX_DEF: i8 = 1;

    fn leveled(v: i32, rep: i8, def: i8) -> Value {
        Value::int32(v).with_levels(rep, def)
    }

    fn list_row(values: &[i32]) -> Vec<Value> {
        match values {
            [] => vec![Value::null().with_levels(0, 0)],
            [first, rest @ ..] => {
                let mut row = vec![leveled(*first, 0, MAX_DEF)];
                row.extend(rest.iter().map(|&v| leveled(v, MAX_REP, MAX_DEF)));
                row
            }
        }
    }

    fn buffer_of(rows: &[&[i32]]) -> RepeatedBuffer {
        let mut buffer = RepeatedBuffer::new(
            Box::new(PrimitiveBuffer::<i32>::new()),
            MAX_REP,
            MAX_DEF,
            NullOrdering::NullsFirst,
        );
        for values in rows {
            buffer.write_row(&list_row(values)).unwrap();
        }
        buffer
    }

    fn contents(buffer: &RepeatedBuffer) -> Vec<Vec<Option<i32>>> {
        let mut out = Vec::new();
        for index in 0..buffer.len() {
            let mut row = Row::new();
            buffer.read_row_at(&mut row, index).unwrap();
            out.push(row.iter().map(Value::as_int32).collect());
        }
        out
    }

    #[test]
    fn regions_lay_out_contiguously() {
        let buffer = buffer_of(&[&[10], &[20, 30], &[]]);
        assert_eq!(
            buffer.regions(),
            [
                Region { offset: 0, length: 1 },
                Region { offset: 1, length: 2 },
                Region { offset: 3, length: 1 },
            ]
        );
        assert!(!rows_have_been_reordered(buffer.regions()));
        assert_eq!(buffer.repetition_levels, [0, 0, 1, 0]);
        assert_eq!(buffer.definition_levels, [1, 1, 1, 0]);
    }

    #[test]
    fn reads_restore_levels_and_nulls() {
        let buffer = buffer_of(&[&[10], &[], &[20, 30]]);
        assert_eq!(
            contents(&buffer),
            [
                vec![Some(10)],
                vec![None],
                vec![Some(20), Some(30)],
            ]
        );

        let mut row = Row::new();
        buffer.read_row_at(&mut row, 2).unwrap();
        assert_eq!(row[0].repetition_level(), 0);
        assert_eq!(row[1].repetition_level(), MAX_REP);
    }

    #[test]
    fn swap_breaks_contiguity() {
        let mut buffer = buffer_of(&[&[10], &[20, 30]]);
        buffer.swap(0, 1);
        assert!(rows_have_been_reordered(buffer.regions()));
        // Reads follow the regions, not the layout.
        assert_eq!(
            contents(&buffer),
            [vec![Some(20), Some(30)], vec![Some(10)]]
        );
    }

    #[test]
    fn lexicographic_order_with_prefix_tiebreak() {
        let buffer = buffer_of(&[&[1, 2], &[1, 2, 3], &[0, 9], &[]]);
        assert!(buffer.is_less(0, 1)); // prefix sorts first
        assert!(!buffer.is_less(1, 0));
        assert!(buffer.is_less(2, 0)); // 0 < 1 decides at position 0
        assert!(buffer.is_less(3, 2)); // null marker sorts first under nulls-first
    }

    #[test]
    fn page_without_reordering_compacts_in_place() {
        let mut buffer = buffer_of(&[&[10], &[], &[20, 30]]);
        let page = buffer.page().unwrap();
        assert_eq!(page.num_values(), 3);
        assert_eq!(page.num_nulls(), 1);
        assert_eq!(page.num_rows(), 3);
        assert_eq!(*page.values(), PageValues::Int32(&[10, 20, 30]));
        assert_eq!(page.repetition_levels(), Some(&[0, 0, 0, 1][..]));
        assert_eq!(page.definition_levels(), Some(&[1, 0, 1, 1][..]));
    }

    #[test]
    fn sorted_page_takes_the_reorder_path() {
        let mut buffer = buffer_of(&[&[20, 30], &[10], &[]]);
        sort_column(&mut buffer);
        assert_eq!(
            contents(&buffer),
            [vec![None], vec![Some(10)], vec![Some(20), Some(30)]]
        );
        assert!(rows_have_been_reordered(buffer.regions()));

        let page = buffer.page().unwrap();
        assert_eq!(*page.values(), PageValues::Int32(&[10, 20, 30]));
        assert_eq!(page.repetition_levels(), Some(&[0, 0, 0, 1][..]));
        assert_eq!(page.definition_levels(), Some(&[0, 1, 1, 1][..]));
    }

    #[test]
    fn reordered_page_is_idempotent() {
        let mut buffer = buffer_of(&[&[3], &[1], &[2]]);
        sort_column(&mut buffer);

        let first = match buffer.page().unwrap().values() {
            PageValues::Int32(v) => v.to_vec(),
            _ => unreachable!(),
        };
        let again = buffer.page().unwrap();
        assert_eq!(*again.values(), PageValues::Int32(&first[..]));
        assert_eq!(first, [1, 2, 3]);
    }

    #[test]
    fn reorder_buffer_is_reused_across_pages() {
        let mut buffer = buffer_of(&[&[2], &[1]]);
        buffer.swap(0, 1);
        buffer.page().unwrap();
        assert!(buffer.reordering.is_some());
        buffer.page().unwrap();
        assert!(buffer.reordering.is_some());
    }

    #[test]
    fn clone_is_isolated() {
        let mut buffer = buffer_of(&[&[1, 2]]);
        let snapshot = buffer.clone_column();
        buffer.write_row(&list_row(&[3])).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn reset_clears_rows_and_levels() {
        let mut buffer = buffer_of(&[&[1], &[2, 3]]);
        buffer.reset();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.repetition_levels.is_empty());
        assert!(buffer.definition_levels.is_empty());
    }
}
