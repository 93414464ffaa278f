use bytes::Bytes;
use log::trace;
use shale_error::{ShaleError, ShaleExpect, ShaleResult};
use shale_schema::{
    columns_of, LeafType, Node, NodeKind, PhysicalType, Repetition, MAX_COLUMN_COUNT,
};

use crate::levels::Levels;
use crate::{Datum, Row, Value, ValueData};

/// A shredder compiled from a schema.
///
/// Compilation walks the schema depth-first, assigning each leaf a column
/// index, and produces one traversal node per schema node. Invoking the
/// shredder flattens a record into a [`Row`]: one [`Value`] per leaf
/// occurrence, tagged with its column index and the repetition and definition
/// levels of its path.
///
/// Shredding never fails: any record shape is mappable, with absent or
/// mismatched slots emitting null values at the enclosing definition level.
#[derive(Debug, Clone)]
pub struct Deconstructor {
    kind: DeconKind,
}

#[derive(Debug, Clone)]
enum DeconKind {
    Leaf { leaf: LeafType, column: i8 },
    Group(Vec<Deconstructor>),
    Optional(Box<Deconstructor>),
    Repeated(Box<Deconstructor>),
    Map(Box<Deconstructor>),
}

impl Deconstructor {
    /// Compile a shredder for `schema`.
    ///
    /// Fails with [`ShaleError::ColumnOverflow`] if the schema flattens to
    /// more leaf columns than a column index can address, or if its nesting
    /// exceeds the level range.
    pub fn compile(schema: &Node) -> ShaleResult<Self> {
        columns_of(schema)?;
        let (_, deconstructor) = Self::compile_node(0, schema)?;
        Ok(deconstructor)
    }

    fn compile_node(column: usize, node: &Node) -> ShaleResult<(usize, Self)> {
        match node.repetition() {
            Repetition::Optional => {
                let (next, inner) = Self::compile_required(column, node)?;
                Ok((next, Self::wrap(DeconKind::Optional(Box::new(inner)))))
            }
            Repetition::Repeated => {
                let (next, inner) = Self::compile_required(column, node)?;
                Ok((next, Self::wrap(DeconKind::Repeated(Box::new(inner)))))
            }
            Repetition::Required => Self::compile_required(column, node),
        }
    }

    fn compile_required(column: usize, node: &Node) -> ShaleResult<(usize, Self)> {
        match node.kind() {
            NodeKind::Leaf(leaf) => {
                if column >= MAX_COLUMN_COUNT {
                    return Err(ShaleError::ColumnOverflow {
                        count: column + 1,
                        max: MAX_COLUMN_COUNT,
                    });
                }
                trace!("column {column} assigned to {} leaf", leaf.physical);
                let kind = DeconKind::Leaf {
                    leaf: *leaf,
                    column: column as i8,
                };
                Ok((column + 1, Self::wrap(kind)))
            }
            NodeKind::Group(fields) => {
                let mut children = Vec::with_capacity(fields.len());
                let mut column = column;
                for field in fields {
                    let (next, child) = Self::compile_node(column, &field.node)?;
                    column = next;
                    children.push(child);
                }
                Ok((column, Self::wrap(DeconKind::Group(children))))
            }
            // A list is its element, repeated.
            NodeKind::List(element) => {
                let (next, inner) = Self::compile_required(column, element)?;
                Ok((next, Self::wrap(DeconKind::Repeated(Box::new(inner)))))
            }
            // A map is a repeated group of key-value entries, reached through
            // an adapter that linearizes the entries.
            NodeKind::Map(..) => {
                let entry = node
                    .map_key_value()
                    .shale_expect("map node has an entry group");
                let (next, entry_group) = Self::compile_required(column, &entry)?;
                let repeated = Self::wrap(DeconKind::Repeated(Box::new(entry_group)));
                Ok((next, Self::wrap(DeconKind::Map(Box::new(repeated)))))
            }
        }
    }

    fn wrap(kind: DeconKind) -> Self {
        Self { kind }
    }

    /// Shred `record` into a fresh row.
    pub fn deconstruct(&self, record: &Datum) -> Row {
        let mut row = Row::new();
        self.deconstruct_into(&mut row, record);
        row
    }

    /// Shred `record`, appending its values to `row`.
    pub fn deconstruct_into(&self, row: &mut Row, record: &Datum) {
        self.walk(row, Levels::default(), Some(record));
    }

    fn walk(&self, row: &mut Row, mut levels: Levels, datum: Option<&Datum>) {
        match &self.kind {
            DeconKind::Optional(inner) => {
                let datum = datum.filter(|d| !d.is_null());
                if datum.is_some() {
                    levels.definition_level += 1;
                }
                inner.walk(row, levels, datum);
            }
            DeconKind::Repeated(inner) => match datum.and_then(Datum::as_list) {
                None => inner.walk(row, levels, None),
                Some(elements) => {
                    levels.repetition_depth += 1;
                    if elements.is_empty() {
                        // The empty-collection marker: one null occurrence at
                        // the enclosing levels.
                        inner.walk(row, levels, None);
                        return;
                    }
                    levels.definition_level += 1;
                    for element in elements {
                        inner.walk(row, levels, Some(element));
                        levels.repetition_level = levels.repetition_depth;
                    }
                }
            },
            DeconKind::Map(inner) => match datum.and_then(Datum::as_map_entries) {
                None => inner.walk(row, levels, None),
                Some(entries) => {
                    let entries = Datum::List(
                        entries
                            .iter()
                            .map(|(k, v)| Datum::Group(vec![k.clone(), v.clone()]))
                            .collect(),
                    );
                    inner.walk(row, levels, Some(&entries));
                }
            },
            DeconKind::Group(children) => {
                let members = datum.and_then(Datum::as_group);
                for (index, child) in children.iter().enumerate() {
                    child.walk(row, levels, members.and_then(|m| m.get(index)));
                }
            }
            DeconKind::Leaf { leaf, column } => {
                let data = datum.map_or(ValueData::Null, |d| leaf_data(leaf, d));
                row.push(Value {
                    data,
                    column_index: !column,
                    repetition_level: levels.repetition_level,
                    definition_level: levels.definition_level,
                });
            }
        }
    }
}

/// Convert a record slot into the payload of a leaf column, or null when the
/// slot does not fit the leaf.
fn leaf_data(leaf: &LeafType, datum: &Datum) -> ValueData {
    match (leaf.physical, datum) {
        (PhysicalType::Boolean, Datum::Boolean(v)) => ValueData::Boolean(*v),
        (PhysicalType::Int32, Datum::Int32(v)) => ValueData::Int32(*v),
        (PhysicalType::Int32, Datum::UInt32(v)) => ValueData::Int32(*v as i32),
        (PhysicalType::Int64, Datum::Int64(v)) => ValueData::Int64(*v),
        (PhysicalType::Int64, Datum::UInt64(v)) => ValueData::Int64(*v as i64),
        (PhysicalType::Int96, Datum::Int96(v)) => ValueData::Int96(*v),
        (PhysicalType::Float, Datum::Float(v)) => ValueData::Float(*v),
        (PhysicalType::Double, Datum::Double(v)) => ValueData::Double(*v),
        (PhysicalType::ByteArray, Datum::Bytes(v)) => ValueData::ByteArray(v.clone()),
        (PhysicalType::ByteArray, Datum::Text(v)) => {
            ValueData::ByteArray(Bytes::copy_from_slice(v.as_bytes()))
        }
        (PhysicalType::FixedLenByteArray(_), Datum::Bytes(v)) => {
            ValueData::FixedLenByteArray(v.clone())
        }
        _ => ValueData::Null,
    }
}

#[cfg(test)]
mod tests {
    use shale_schema::Field;

    use super::*;

    fn value(column: i8, rep: i8, def: i8, data: ValueData) -> Value {
        Value {
            data,
            column_index: !column,
            repetition_level: rep,
            definition_level: def,
        }
    }

    #[test]
    fn required_leaf() {
        let schema = Node::group(vec![Field::new("a", Node::int32())]);
        let shred = Deconstructor::compile(&schema).unwrap();
        let row = shred.deconstruct(&Datum::group([Datum::Int32(42)]));
        assert_eq!(row, vec![value(0, 0, 0, ValueData::Int32(42))]);
    }

    #[test]
    fn absent_optional_leaf() {
        let schema = Node::group(vec![Field::new("a", Node::int32().optional())]);
        let shred = Deconstructor::compile(&schema).unwrap();
        let row = shred.deconstruct(&Datum::group([Datum::Null]));
        assert_eq!(row, vec![value(0, 0, 0, ValueData::Null)]);
    }

    #[test]
    fn present_optional_zero_is_not_null() {
        let schema = Node::group(vec![Field::new("a", Node::int32().optional())]);
        let shred = Deconstructor::compile(&schema).unwrap();
        let row = shred.deconstruct(&Datum::group([Datum::Int32(0)]));
        assert_eq!(row, vec![value(0, 0, 1, ValueData::Int32(0))]);
    }

    #[test]
    fn repeated_leaf_levels() {
        let schema = Node::group(vec![Field::new("xs", Node::int32().repeated())]);
        let shred = Deconstructor::compile(&schema).unwrap();
        let row = shred.deconstruct(&Datum::group([Datum::list([
            10i32.into(),
            20i32.into(),
            30i32.into(),
        ])]));
        assert_eq!(
            row,
            vec![
                value(0, 0, 1, ValueData::Int32(10)),
                value(0, 1, 1, ValueData::Int32(20)),
                value(0, 1, 1, ValueData::Int32(30)),
            ]
        );
    }

    #[test]
    fn empty_repeated_leaf_emits_marker() {
        let schema = Node::group(vec![Field::new("xs", Node::int32().repeated())]);
        let shred = Deconstructor::compile(&schema).unwrap();
        let row = shred.deconstruct(&Datum::group([Datum::list([])]));
        assert_eq!(row, vec![value(0, 0, 0, ValueData::Null)]);
    }

    #[test]
    fn map_emits_key_and_value_columns() {
        let schema = Node::group(vec![Field::new(
            "pairs",
            Node::map(Node::string(), Node::int32()).optional(),
        )]);
        let shred = Deconstructor::compile(&schema).unwrap();

        let row = shred.deconstruct(&Datum::group([Datum::map([("a".into(), 1i32.into())])]));
        assert_eq!(
            row,
            vec![
                value(0, 0, 2, ValueData::ByteArray(Bytes::from_static(b"a"))),
                value(1, 0, 2, ValueData::Int32(1)),
            ]
        );

        let row = shred.deconstruct(&Datum::group([Datum::Null]));
        assert_eq!(
            row,
            vec![value(0, 0, 0, ValueData::Null), value(1, 0, 0, ValueData::Null)]
        );
    }

    #[test]
    fn optional_group_with_repeated_leaf() {
        let schema = Node::group(vec![Field::new(
            "g",
            Node::group(vec![Field::new("xs", Node::int32().repeated())]).optional(),
        )]);
        let shred = Deconstructor::compile(&schema).unwrap();

        // Absent group: one null per leaf at definition level 0.
        let row = shred.deconstruct(&Datum::group([Datum::Null]));
        assert_eq!(row, vec![value(0, 0, 0, ValueData::Null)]);

        // Present group, empty list: the marker moves up to level 1.
        let row = shred.deconstruct(&Datum::group([Datum::group([Datum::list([])])]));
        assert_eq!(row, vec![value(0, 0, 1, ValueData::Null)]);

        // Present group, one element.
        let row = shred.deconstruct(&Datum::group([Datum::group([Datum::list([7i32.into()])])]));
        assert_eq!(row, vec![value(0, 0, 2, ValueData::Int32(7))]);
    }

    #[test]
    fn nested_repetition_marks_element_depth() {
        let schema = Node::group(vec![Field::new(
            "xss",
            Node::list(Node::list(Node::int32())),
        )]);
        let shred = Deconstructor::compile(&schema).unwrap();
        let row = shred.deconstruct(&Datum::group([Datum::list([
            Datum::list([1i32.into(), 2i32.into()]),
            Datum::list([3i32.into()]),
        ])]));
        assert_eq!(
            row,
            vec![
                value(0, 0, 2, ValueData::Int32(1)),
                value(0, 2, 2, ValueData::Int32(2)),
                value(0, 1, 2, ValueData::Int32(3)),
            ]
        );
    }

    #[test]
    fn first_value_of_a_row_is_at_repetition_zero() {
        let schema = Node::group(vec![Field::new(
            "xs",
            Node::list(Node::int64()).optional(),
        )]);
        let shred = Deconstructor::compile(&schema).unwrap();
        for record in [
            Datum::group([Datum::Null]),
            Datum::group([Datum::list([])]),
            Datum::group([Datum::list([1i64.into(), 2i64.into()])]),
        ] {
            let row = shred.deconstruct(&record);
            assert_eq!(row[0].repetition_level(), 0);
        }
    }

    #[test]
    fn column_overflow_is_reported() {
        let fields = (0..130)
            .map(|i| Field::new(format!("c{i}").as_str(), Node::boolean()))
            .collect();
        let err = Deconstructor::compile(&Node::group(fields)).unwrap_err();
        assert!(matches!(err, ShaleError::ColumnOverflow { .. }));
    }
}
