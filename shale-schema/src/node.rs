use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;

use crate::{PhysicalType, Repetition};

/// A name for a field in a group.
pub type FieldName = Arc<str>;

/// A named child of a group node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    /// The field's name, unique within its group.
    pub name: FieldName,
    /// The field's schema.
    pub node: Node,
}

impl Field {
    /// Create a named field.
    pub fn new(name: impl Into<FieldName>, node: Node) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }
}

/// Physical type of a leaf plus the logical hints that affect comparison and
/// conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeafType {
    /// On-page value layout.
    pub physical: PhysicalType,
    /// Reinterpret the integer payload as unsigned for ordering purposes.
    pub unsigned: bool,
    /// Byte-array payloads are UTF-8 text.
    pub utf8: bool,
}

impl LeafType {
    fn plain(physical: PhysicalType) -> Self {
        Self {
            physical,
            unsigned: false,
            utf8: false,
        }
    }
}

/// One node of a schema tree.
///
/// A node is a leaf, a group of named fields, or one of the two logical
/// wrappers (list, map), and occurs within its parent according to its
/// [`Repetition`]. Trees are built from the typed constructors and the
/// [`optional`](Node::optional) / [`repeated`](Node::repeated) combinators:
///
/// ```
/// use shale_schema::{Field, Node};
///
/// let schema = Node::group(vec![
///     Field::new("name", Node::string()),
///     Field::new("tags", Node::list(Node::string()).optional()),
/// ]);
/// assert_eq!(schema.to_string(), "{name=string, tags=list(string)?}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    repetition: Repetition,
    kind: NodeKind,
}

/// The flavor of a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// A primitive column.
    Leaf(LeafType),
    /// An ordered collection of named fields.
    Group(Vec<Field>),
    /// A logical list of elements of one schema.
    List(Box<Node>),
    /// A logical map, modeled as a repeated group of key-value pairs.
    Map(Box<Node>, Box<Node>),
}

impl Node {
    fn leaf(leaf: LeafType) -> Self {
        Self {
            repetition: Repetition::Required,
            kind: NodeKind::Leaf(leaf),
        }
    }

    /// A boolean leaf.
    pub fn boolean() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::Boolean))
    }

    /// A 32-bit signed integer leaf.
    pub fn int32() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::Int32))
    }

    /// A 64-bit signed integer leaf.
    pub fn int64() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::Int64))
    }

    /// A 32-bit unsigned integer leaf; stored as int32, ordered unsigned.
    pub fn uint32() -> Self {
        Self::leaf(LeafType {
            unsigned: true,
            ..LeafType::plain(PhysicalType::Int32)
        })
    }

    /// A 64-bit unsigned integer leaf; stored as int64, ordered unsigned.
    pub fn uint64() -> Self {
        Self::leaf(LeafType {
            unsigned: true,
            ..LeafType::plain(PhysicalType::Int64)
        })
    }

    /// A 96-bit integer leaf.
    pub fn int96() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::Int96))
    }

    /// A 32-bit floating point leaf.
    pub fn float() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::Float))
    }

    /// A 64-bit floating point leaf.
    pub fn double() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::Double))
    }

    /// A variable-length binary leaf.
    pub fn byte_array() -> Self {
        Self::leaf(LeafType::plain(PhysicalType::ByteArray))
    }

    /// A UTF-8 text leaf; stored as a byte array.
    pub fn string() -> Self {
        Self::leaf(LeafType {
            utf8: true,
            ..LeafType::plain(PhysicalType::ByteArray)
        })
    }

    /// A binary leaf of exactly `size` bytes per value.
    pub fn fixed_len_byte_array(size: usize) -> Self {
        Self::leaf(LeafType::plain(PhysicalType::FixedLenByteArray(size)))
    }

    /// A group of named fields, in declaration order.
    pub fn group(fields: Vec<Field>) -> Self {
        Self {
            repetition: Repetition::Required,
            kind: NodeKind::Group(fields),
        }
    }

    /// A logical list of `element`.
    pub fn list(element: Node) -> Self {
        Self {
            repetition: Repetition::Required,
            kind: NodeKind::List(Box::new(element)),
        }
    }

    /// A logical map from `key` to `value`.
    pub fn map(key: Node, value: Node) -> Self {
        Self {
            repetition: Repetition::Required,
            kind: NodeKind::Map(Box::new(key), Box::new(value)),
        }
    }

    /// This node, marked optional.
    pub fn optional(mut self) -> Self {
        self.repetition = Repetition::Optional;
        self
    }

    /// This node, marked repeated.
    pub fn repeated(mut self) -> Self {
        self.repetition = Repetition::Repeated;
        self
    }

    /// This node, marked required.
    pub fn required(mut self) -> Self {
        self.repetition = Repetition::Required;
        self
    }

    /// How this node occurs within its parent.
    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    /// Whether this node is optional.
    pub fn is_optional(&self) -> bool {
        self.repetition == Repetition::Optional
    }

    /// Whether this node is repeated.
    pub fn is_repeated(&self) -> bool {
        self.repetition == Repetition::Repeated
    }

    /// The flavor of this node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node is a primitive column.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Whether this node is a group of named fields.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// Whether this node is a logical list.
    pub fn is_list(&self) -> bool {
        matches!(self.kind, NodeKind::List(_))
    }

    /// Whether this node is a logical map.
    pub fn is_map(&self) -> bool {
        matches!(self.kind, NodeKind::Map(..))
    }

    /// The leaf type, if this node is a leaf.
    pub fn leaf_type(&self) -> Option<LeafType> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(*leaf),
            _ => None,
        }
    }

    /// The fields of this node; empty unless it is a group.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            NodeKind::Group(fields) => fields,
            _ => &[],
        }
    }

    /// The element schema, if this node is a logical list.
    pub fn list_element(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::List(element) => Some(element),
            _ => None,
        }
    }

    /// The synthesized `{key, value}` entry group, if this node is a map.
    ///
    /// Traversal compilers treat a map as this group occurring repeatedly.
    pub fn map_key_value(&self) -> Option<Node> {
        match &self.kind {
            NodeKind::Map(key, value) => Some(Node::group(vec![
                Field::new("key", (**key).clone()),
                Field::new("value", (**value).clone()),
            ])),
            _ => None,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NodeKind::Leaf(leaf) => {
                if leaf.utf8 {
                    write!(f, "string")?;
                } else if leaf.unsigned {
                    match leaf.physical {
                        PhysicalType::Int32 => write!(f, "uint32")?,
                        PhysicalType::Int64 => write!(f, "uint64")?,
                        other => write!(f, "{other}")?,
                    }
                } else {
                    write!(f, "{}", leaf.physical)?;
                }
            }
            NodeKind::Group(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|field| format!("{}={}", field.name, field.node))
                    .join(", ")
            )?,
            NodeKind::List(element) => write!(f, "list({element})")?,
            NodeKind::Map(key, value) => write!(f, "map({key}, {value})")?,
        }
        write!(f, "{}", self.repetition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_terse() {
        let schema = Node::group(vec![
            Field::new("id", Node::uint64()),
            Field::new("name", Node::string().optional()),
            Field::new("scores", Node::int32().repeated()),
            Field::new("attrs", Node::map(Node::string(), Node::double()).optional()),
        ]);
        assert_eq!(
            schema.to_string(),
            "{id=uint64, name=string?, scores=int32*, attrs=map(string, double)?}"
        );
    }

    #[test]
    fn map_entry_group_has_key_and_value() {
        let map = Node::map(Node::string(), Node::int32());
        let entry = map.map_key_value().unwrap();
        let fields = entry.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(&*fields[0].name, "key");
        assert_eq!(&*fields[1].name, "value");
        assert!(fields[1].node.is_leaf());
    }

    #[test]
    fn combinators_set_repetition() {
        assert!(Node::int32().optional().is_optional());
        assert!(Node::int32().repeated().is_repeated());
        assert!(!Node::int32().is_optional());
    }
}
