use shale_error::{shale_bail, ShaleExpect, ShaleResult};
use shale_schema::{columns_of, FieldName, LeafType, Node, NodeKind, PhysicalType, Repetition};

use crate::levels::Levels;
use crate::{Datum, Value, ValueData};

/// An assembler compiled from a schema, the inverse of
/// [`Deconstructor`](crate::Deconstructor).
///
/// Each traversal node consumes a prefix of the row and writes the
/// corresponding slot of the record. Errors carry the field path from the
/// root down to the failing leaf.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    /// First column of this subtree.
    column: i8,
    /// Number of leaf columns the subtree spans.
    width: usize,
    kind: ReconKind,
}

#[derive(Debug, Clone)]
enum ReconKind {
    Leaf(LeafType),
    Group(Vec<(FieldName, Reconstructor)>),
    Optional(Box<Reconstructor>),
    Repeated(Box<Reconstructor>),
    Map(Box<Reconstructor>),
}

impl Reconstructor {
    /// Compile an assembler for `schema`.
    ///
    /// Fails on the same schemas [`Deconstructor::compile`] rejects: too many
    /// leaf columns or nesting beyond the level range.
    ///
    /// [`Deconstructor::compile`]: crate::Deconstructor::compile
    pub fn compile(schema: &Node) -> ShaleResult<Self> {
        columns_of(schema)?;
        let (_, reconstructor) = Self::compile_node(0, schema)?;
        Ok(reconstructor)
    }

    fn compile_node(column: usize, node: &Node) -> ShaleResult<(usize, Self)> {
        match node.repetition() {
            Repetition::Optional => {
                let (next, inner) = Self::compile_required(column, node)?;
                Ok((next, Self::wrap(column, next, ReconKind::Optional(Box::new(inner)))))
            }
            Repetition::Repeated => {
                let (next, inner) = Self::compile_required(column, node)?;
                Ok((next, Self::wrap(column, next, ReconKind::Repeated(Box::new(inner)))))
            }
            Repetition::Required => Self::compile_required(column, node),
        }
    }

    fn compile_required(column: usize, node: &Node) -> ShaleResult<(usize, Self)> {
        match node.kind() {
            NodeKind::Leaf(leaf) => Ok((
                column + 1,
                Self::wrap(column, column + 1, ReconKind::Leaf(*leaf)),
            )),
            NodeKind::Group(fields) => {
                let mut children = Vec::with_capacity(fields.len());
                let mut next = column;
                for field in fields {
                    let (after, child) = Self::compile_node(next, &field.node)?;
                    next = after;
                    children.push((field.name.clone(), child));
                }
                Ok((next, Self::wrap(column, next, ReconKind::Group(children))))
            }
            NodeKind::List(element) => {
                let (next, inner) = Self::compile_required(column, element)?;
                Ok((next, Self::wrap(column, next, ReconKind::Repeated(Box::new(inner)))))
            }
            NodeKind::Map(..) => {
                let entry = node
                    .map_key_value()
                    .shale_expect("map node has an entry group");
                let (next, entry_group) = Self::compile_required(column, &entry)?;
                let repeated = Self::wrap(column, next, ReconKind::Repeated(Box::new(entry_group)));
                Ok((next, Self::wrap(column, next, ReconKind::Map(Box::new(repeated)))))
            }
        }
    }

    fn wrap(column: usize, next: usize, kind: ReconKind) -> Self {
        Self {
            column: column as i8,
            width: next - column,
            kind,
        }
    }

    /// Assemble a record from `row`.
    pub fn reconstruct(&self, row: &[Value]) -> ShaleResult<Datum> {
        let mut record = Datum::Null;
        self.reconstruct_into(&mut record, row)?;
        Ok(record)
    }

    /// Assemble a record from `row` into `record`.
    ///
    /// The row must be consumed exactly; a failed assembly may leave partial
    /// contents in `record`, which the caller should discard.
    pub fn reconstruct_into(&self, record: &mut Datum, row: &[Value]) -> ShaleResult<()> {
        let rest = self.walk(record, Levels::default(), row)?;
        if !rest.is_empty() {
            shale_bail!(
                "row has {} values left over after the last column",
                rest.len()
            );
        }
        Ok(())
    }

    fn walk<'a>(
        &self,
        datum: &mut Datum,
        mut levels: Levels,
        row: &'a [Value],
    ) -> ShaleResult<&'a [Value]> {
        match &self.kind {
            ReconKind::Optional(inner) => {
                if !starts_with(row, self.column) {
                    shale_bail!("row is missing optional column {}", self.column);
                }
                if row.len() < self.width {
                    shale_bail!(
                        "expected optional column {} to span at least {} values but got {}",
                        self.column,
                        self.width,
                        row.len()
                    );
                }

                levels.definition_level += 1;

                if row[0].definition_level < levels.definition_level {
                    *datum = Datum::Null;
                    return Ok(&row[self.width..]);
                }

                inner.walk(datum, levels, row)
            }
            ReconKind::Repeated(inner) => {
                if !starts_with(row, self.column) {
                    shale_bail!("row is missing repeated column {}", self.column);
                }
                if row.len() < self.width {
                    shale_bail!(
                        "expected repeated column {} to span at least {} values but got {}",
                        self.column,
                        self.width,
                        row.len()
                    );
                }

                levels.definition_level += 1;
                levels.repetition_depth += 1;

                if row[0].definition_level < levels.definition_level {
                    *datum = Datum::List(Vec::new());
                    return Ok(&row[self.width..]);
                }

                let mut elements = Vec::with_capacity(10);
                let mut row = row;
                while starts_with(row, self.column)
                    && row[0].repetition_level == levels.repetition_level
                {
                    let mut element = Datum::Null;
                    row = inner.walk(&mut element, levels, row)?;
                    elements.push(element);
                    levels.repetition_level = levels.repetition_depth;
                }

                *datum = Datum::List(elements);
                Ok(row)
            }
            ReconKind::Group(children) => {
                let mut members = Vec::with_capacity(children.len());
                let mut row = row;
                for (name, child) in children {
                    let mut member = Datum::Null;
                    row = child
                        .walk(&mut member, levels, row)
                        .map_err(|e| e.with_field(&**name))?;
                    members.push(member);
                }
                *datum = Datum::Group(members);
                Ok(row)
            }
            ReconKind::Map(inner) => {
                let mut entries = Datum::Null;
                let row = inner.walk(&mut entries, levels, row)?;
                *datum = match entries {
                    Datum::List(pairs) => {
                        let mut map = Vec::with_capacity(pairs.len());
                        for pair in pairs {
                            let Datum::Group(mut members) = pair else {
                                shale_bail!(
                                    "malformed entry while rebuilding map column {}",
                                    self.column
                                );
                            };
                            if members.len() != 2 {
                                shale_bail!(
                                    "malformed entry while rebuilding map column {}",
                                    self.column
                                );
                            }
                            let value = members.pop().shale_expect("entry has a value");
                            let key = members.pop().shale_expect("entry has a key");
                            map.push((key, value));
                        }
                        Datum::Map(map)
                    }
                    Datum::Null => Datum::Null,
                    _ => shale_bail!("cannot rebuild map column {} from scalar data", self.column),
                };
                Ok(row)
            }
            ReconKind::Leaf(leaf) => {
                let Some(value) = row.first() else {
                    shale_bail!("missing value for column {}", self.column);
                };
                if value.column_index() != self.column {
                    shale_bail!(
                        "expected column {} but row starts at column {}",
                        self.column,
                        value.column_index()
                    );
                }
                *datum = leaf_datum(leaf, value)?;
                Ok(&row[1..])
            }
        }
    }
}

fn starts_with(row: &[Value], column: i8) -> bool {
    row.first().is_some_and(|v| v.column_index() == column)
}

/// Convert a leaf payload into the record slot it belongs to, applying the
/// conversions the leaf's logical hints ask for.
fn leaf_datum(leaf: &LeafType, value: &Value) -> ShaleResult<Datum> {
    Ok(match (&value.data, leaf.physical) {
        (ValueData::Null, _) => Datum::Null,
        (ValueData::Boolean(v), PhysicalType::Boolean) => Datum::Boolean(*v),
        (ValueData::Int32(v), PhysicalType::Int32) => {
            if leaf.unsigned {
                Datum::UInt32(*v as u32)
            } else {
                Datum::Int32(*v)
            }
        }
        (ValueData::Int64(v), PhysicalType::Int64) => {
            if leaf.unsigned {
                Datum::UInt64(*v as u64)
            } else {
                Datum::Int64(*v)
            }
        }
        (ValueData::Int96(v), PhysicalType::Int96) => Datum::Int96(*v),
        (ValueData::Float(v), PhysicalType::Float) => Datum::Float(*v),
        (ValueData::Double(v), PhysicalType::Double) => Datum::Double(*v),
        (ValueData::ByteArray(v), PhysicalType::ByteArray) => {
            if leaf.utf8 {
                Datum::Text(std::str::from_utf8(v)?.to_owned())
            } else {
                Datum::Bytes(v.clone())
            }
        }
        (
            ValueData::FixedLenByteArray(v) | ValueData::ByteArray(v),
            PhysicalType::FixedLenByteArray(size),
        ) => {
            if v.len() != size {
                shale_bail!(
                    "fixed_len_byte_array({size}) value has {} bytes",
                    v.len()
                );
            }
            Datum::Bytes(v.clone())
        }
        (data, physical) => shale_bail!(
            "cannot convert {} payload into {physical} slot",
            data.kind_name()
        ),
    })
}
