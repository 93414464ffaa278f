use shale_error::{shale_err, ShaleError, ShaleResult};

use crate::{
    FieldName, LeafType, Node, NodeKind, Repetition, MAX_COLUMN_COUNT, MAX_DEFINITION_LEVEL,
    MAX_REPETITION_LEVEL,
};

/// Everything the column-buffer layer needs to know about one leaf column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Position of the leaf in a depth-first walk of the schema.
    pub index: usize,
    /// Field names from the root down to the leaf.
    pub path: Vec<FieldName>,
    /// Physical type and logical hints of the leaf.
    pub leaf: LeafType,
    /// Highest repetition level a value of this column can carry.
    pub max_repetition_level: i8,
    /// Highest definition level a value of this column can carry.
    pub max_definition_level: i8,
}

/// Flatten a schema into one descriptor per leaf column.
///
/// Leaves are indexed in depth-first declaration order, the same order the
/// shredder assigns column indices, so `columns_of(schema)[i]` describes the
/// values tagged with column index `i`.
pub fn columns_of(root: &Node) -> ShaleResult<Vec<ColumnDescriptor>> {
    let count = count_leaves(root);
    if count > MAX_COLUMN_COUNT {
        return Err(ShaleError::ColumnOverflow {
            count,
            max: MAX_COLUMN_COUNT,
        });
    }

    let mut columns = Vec::with_capacity(count);
    let mut path = Vec::new();
    walk(root, &mut path, 0, 0, &mut columns)?;
    Ok(columns)
}

fn count_leaves(node: &Node) -> usize {
    match node.kind() {
        NodeKind::Leaf(_) => 1,
        NodeKind::Group(fields) => fields.iter().map(|f| count_leaves(&f.node)).sum(),
        NodeKind::List(element) => count_leaves(element),
        NodeKind::Map(key, value) => count_leaves(key) + count_leaves(value),
    }
}

fn walk(
    node: &Node,
    path: &mut Vec<FieldName>,
    max_rep: i16,
    max_def: i16,
    out: &mut Vec<ColumnDescriptor>,
) -> ShaleResult<()> {
    // Mirrors the traversal compilers: an optional node adds one definition
    // level, a repeated node adds one of each, and the logical wrappers are
    // repeated forms of their inner schema.
    match node.repetition() {
        Repetition::Optional => walk_required(node, path, max_rep, max_def + 1, out),
        Repetition::Repeated => walk_required(node, path, max_rep + 1, max_def + 1, out),
        Repetition::Required => walk_required(node, path, max_rep, max_def, out),
    }
}

fn walk_required(
    node: &Node,
    path: &mut Vec<FieldName>,
    max_rep: i16,
    max_def: i16,
    out: &mut Vec<ColumnDescriptor>,
) -> ShaleResult<()> {
    match node.kind() {
        NodeKind::Leaf(leaf) => {
            if max_rep > MAX_REPETITION_LEVEL as i16 || max_def > MAX_DEFINITION_LEVEL as i16 {
                return Err(shale_err!(
                    "column {} nests {max_rep} repetition and {max_def} definition levels deep, \
                     the maximum level is {MAX_DEFINITION_LEVEL}",
                    out.len()
                ));
            }
            out.push(ColumnDescriptor {
                index: out.len(),
                path: path.clone(),
                leaf: *leaf,
                max_repetition_level: max_rep as i8,
                max_definition_level: max_def as i8,
            });
            Ok(())
        }
        NodeKind::Group(fields) => {
            for field in fields {
                path.push(field.name.clone());
                walk(&field.node, path, max_rep, max_def, out)?;
                path.pop();
            }
            Ok(())
        }
        // A list is its element, repeated; the element's own repetition is
        // superseded by the wrapper.
        NodeKind::List(element) => walk_required(element, path, max_rep + 1, max_def + 1, out),
        NodeKind::Map(key, value) => {
            for (name, child) in [("key", key), ("value", value)] {
                path.push(name.into());
                walk(child, path, max_rep + 1, max_def + 1, out)?;
                path.pop();
            }
            Ok(())
        }
    }
}
