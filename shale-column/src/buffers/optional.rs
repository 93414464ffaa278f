use shale_error::{shale_err, ShaleError, ShaleResult};
use shale_row::{Row, Value};

use crate::buffers::compact_nulls;
use crate::{ColumnBuffer, NullOrdering, Page};

/// Wrapper adding definition-level tracking to a base buffer, for optional
/// (but not repeated) columns.
///
/// The base holds one payload per incoming value, a zero placeholder for
/// nulls included, so the definition-level array stays parallel to it. Row
/// order consults the configured [`NullOrdering`] for null positions and the
/// base for the rest.
pub struct OptionalBuffer {
    base: Box<dyn ColumnBuffer>,
    max_definition_level: i8,
    definition_levels: Vec<i8>,
    null_ordering: NullOrdering,
    /// Non-null count from a null-compaction still in sync with the base;
    /// cleared by any mutation.
    compacted: Option<usize>,
}

impl OptionalBuffer {
    /// Wrap `base` for a column with the given max definition level.
    pub fn new(
        base: Box<dyn ColumnBuffer>,
        max_definition_level: i8,
        null_ordering: NullOrdering,
    ) -> Self {
        let capacity = base.capacity();
        Self {
            base,
            max_definition_level,
            definition_levels: Vec::with_capacity(capacity),
            null_ordering,
            compacted: None,
        }
    }

    /// The column's max definition level.
    pub fn max_definition_level(&self) -> i8 {
        self.max_definition_level
    }
}

impl ColumnBuffer for OptionalBuffer {
    fn len(&self) -> usize {
        self.definition_levels.len()
    }

    fn capacity(&self) -> usize {
        self.definition_levels.capacity()
    }

    fn size_bytes(&self) -> usize {
        self.base.size_bytes() + self.definition_levels.len()
    }

    fn reset(&mut self) {
        self.base.reset();
        self.definition_levels.clear();
        self.compacted = None;
    }

    fn clone_column(&self) -> Box<dyn ColumnBuffer> {
        Box::new(Self {
            base: self.base.clone_column(),
            max_definition_level: self.max_definition_level,
            definition_levels: self.definition_levels.clone(),
            null_ordering: self.null_ordering,
            compacted: self.compacted,
        })
    }

    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
        self.base.write_row(row)?;
        for value in row {
            self.definition_levels.push(value.definition_level());
        }
        self.compacted = None;
        Ok(())
    }

    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
        if index >= self.definition_levels.len() {
            return Err(ShaleError::EndOfColumn);
        }

        let definition_level = self.definition_levels[index];
        if definition_level != self.max_definition_level {
            row.push(Value::null().with_levels(0, definition_level));
            return Ok(());
        }

        let at = row.len();
        self.base.read_row_at(row, index)?;
        match row.len() - at {
            1 => {
                row[at].set_definition_level(definition_level);
                Ok(())
            }
            0 => Err(shale_err!(
                "optional column has no value for row index {index}"
            )),
            _ => {
                row.truncate(at);
                Err(shale_err!(
                    "optional column has more than one value for row index {index}"
                ))
            }
        }
    }

    fn is_less(&self, i: usize, j: usize) -> bool {
        self.null_ordering.is_less(
            self.base.as_ref(),
            i,
            j,
            self.max_definition_level,
            &self.definition_levels,
        )
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.base.swap(i, j);
        self.definition_levels.swap(i, j);
        self.compacted = None;
    }

    fn page(&mut self) -> ShaleResult<Page<'_>> {
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
        Ok(Page::optional(
            base_page.into_values().slice(0, non_null),
            self.max_definition_level,
            &self.definition_levels,
        ))
    }
}
