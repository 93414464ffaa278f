#![deny(missing_docs)]

//! Error handling for the shale crates.
//!
//! All fallible operations across the workspace return [`ShaleResult`]. Errors
//! are constructed through the [`shale_err!`] and [`shale_bail!`] macros, and
//! the [`ShaleExpect`] / [`ShaleUnwrap`] extension traits cover the rare spots
//! where an invariant makes failure impossible but the type system cannot see
//! it.

use std::fmt::Display;

/// The error type shared by every shale crate.
#[derive(Debug, thiserror::Error)]
pub enum ShaleError {
    /// A precondition on an argument or on the shape of the input was
    /// violated.
    #[error("{0}")]
    InvalidArgument(String),

    /// A schema compiled to more leaf columns than a column index can
    /// address.
    #[error("schema has {count} leaf columns but at most {max} are supported")]
    ColumnOverflow {
        /// Number of leaf columns the schema would require.
        count: usize,
        /// The maximum addressable column count.
        max: usize,
    },

    /// An index was outside the addressable range of a buffer.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// The length of the indexed collection.
        len: usize,
    },

    /// A positional read ran past the last row of a column.
    ///
    /// This is a stop signal rather than a failure, in the spirit of
    /// `std::io::ErrorKind::UnexpectedEof`: callers iterating a column match
    /// on it to detect the end of the stream.
    #[error("end of column")]
    EndOfColumn,

    /// A byte-array payload destined for a textual slot was not valid UTF-8.
    #[error("invalid utf-8 in byte array: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// An error produced below a named field, annotated while unwinding
    /// through a group.
    #[error("{name} → {source}")]
    Field {
        /// Name of the field the error surfaced under.
        name: String,
        /// The underlying error.
        source: Box<ShaleError>,
    },
}

impl ShaleError {
    /// Annotate this error with the field it surfaced under.
    ///
    /// Repeated annotation while unwinding through nested groups produces the
    /// full path from the root to the failing leaf, e.g.
    /// `outer → inner → missing value for column 3`.
    pub fn with_field(self, name: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error is the end-of-column stop signal.
    pub fn is_end_of_column(&self) -> bool {
        matches!(self, Self::EndOfColumn)
    }
}

/// Result alias used across the shale crates.
pub type ShaleResult<T> = Result<T, ShaleError>;

/// Construct a [`ShaleError::InvalidArgument`] from a format string.
#[macro_export]
macro_rules! shale_err {
    ($($tt:tt)+) => {
        $crate::ShaleError::InvalidArgument(format!($($tt)+))
    };
}

/// Return early with a [`ShaleError::InvalidArgument`] built from a format
/// string.
#[macro_export]
macro_rules! shale_bail {
    ($($tt:tt)+) => {
        return Err($crate::shale_err!($($tt)+))
    };
}

/// Extension trait panicking with a domain message when an invariant that the
/// caller relies on does not hold.
///
/// Prefer propagating a [`ShaleResult`]; reach for this only where the
/// surrounding code already guarantees success.
pub trait ShaleExpect {
    /// The unwrapped value.
    type Output;

    /// Unwrap, panicking with `msg` and the underlying failure if any.
    fn shale_expect(self, msg: &str) -> Self::Output;
}

impl<T> ShaleExpect for Option<T> {
    type Output = T;

    #[allow(clippy::panic)]
    fn shale_expect(self, msg: &str) -> T {
        match self {
            Some(value) => value,
            None => panic!("{msg}"),
        }
    }
}

impl<T, E: Display> ShaleExpect for Result<T, E> {
    type Output = T;

    #[allow(clippy::panic)]
    fn shale_expect(self, msg: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => panic!("{msg}: {e}"),
        }
    }
}

/// Extension trait unwrapping a [`ShaleResult`] whose error case is
/// unreachable, panicking with the error's display form otherwise.
pub trait ShaleUnwrap {
    /// The unwrapped value.
    type Output;

    /// Unwrap, panicking with the error if any.
    fn shale_unwrap(self) -> Self::Output;
}

impl<T> ShaleUnwrap for ShaleResult<T> {
    type Output = T;

    #[allow(clippy::panic)]
    fn shale_unwrap(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}
