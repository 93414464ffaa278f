//! Umbrella crate re-exporting the shale family.
//!
//! `shale` is the record shredding and assembly core of a columnar table
//! library compatible with the Parquet data model: schemas describe nested
//! records, the row crate flattens records into leveled column values and
//! back, and the column crate buffers those values into sortable, pageable
//! per-column storage.

pub use shale_row::*;
pub use {
    shale_column as column, shale_error as error, shale_row as row, shale_schema as schema,
};
