use bytes::Bytes;
use shale_schema::Int96;

/// An in-memory record value, the shape both traversal directions operate on.
///
/// `Datum` is to records what the schema [`Node`](shale_schema::Node) is to
/// types: groups hold one member per declared field, lists hold their
/// elements in order, maps hold insertion-ordered key-value entries. Presence
/// is explicit; [`Datum::Null`] is the absent value, so a legitimate zero
/// stored in an optional slot survives a round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Datum {
    /// The absent value.
    #[default]
    Null,
    /// A boolean.
    Boolean(bool),
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 32-bit unsigned integer.
    UInt32(u32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A 64-bit unsigned integer.
    UInt64(u64),
    /// A 96-bit integer.
    Int96(Int96),
    /// A 32-bit floating point number.
    Float(f32),
    /// A 64-bit floating point number.
    Double(f64),
    /// A binary value.
    Bytes(Bytes),
    /// A UTF-8 text value.
    Text(String),
    /// An ordered sequence of elements.
    List(Vec<Datum>),
    /// Insertion-ordered key-value entries.
    Map(Vec<(Datum, Datum)>),
    /// One member per field of a group schema, in declaration order.
    Group(Vec<Datum>),
}

impl Datum {
    /// Build a list from its elements.
    pub fn list(elements: impl IntoIterator<Item = Datum>) -> Self {
        Self::List(elements.into_iter().collect())
    }

    /// Build a map from its entries, preserving iteration order.
    pub fn map(entries: impl IntoIterator<Item = (Datum, Datum)>) -> Self {
        Self::Map(entries.into_iter().collect())
    }

    /// Build a group from its members, in field declaration order.
    pub fn group(members: impl IntoIterator<Item = Datum>) -> Self {
        Self::Group(members.into_iter().collect())
    }

    /// A text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Whether this is the absent value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Self::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// The entries, if this is a map.
    pub fn as_map_entries(&self) -> Option<&[(Datum, Datum)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The members, if this is a group.
    pub fn as_group(&self) -> Option<&[Datum]> {
        match self {
            Self::Group(members) => Some(members),
            _ => None,
        }
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for Datum {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for Datum {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<Int96> for Datum {
    fn from(v: Int96) -> Self {
        Self::Int96(v)
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Bytes> for Datum {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}
