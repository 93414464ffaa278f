use std::fmt::{Display, Formatter};

/// How many times a schema node may occur within its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Repetition {
    /// The node occurs exactly once.
    #[default]
    Required,
    /// The node occurs zero or one time.
    Optional,
    /// The node occurs zero or more times.
    Repeated,
}

impl Display for Repetition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, ""),
            Self::Optional => write!(f, "?"),
            Self::Repeated => write!(f, "*"),
        }
    }
}
