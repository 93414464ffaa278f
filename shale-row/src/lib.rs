//! Record shredding and assembly.
//!
//! This crate turns nested records into flat rows of column-tagged leaf
//! values and back, following the Dremel model: every leaf value carries a
//! repetition level (the depth at which a new repeated element begins) and a
//! definition level (how many optional or repeated ancestors are present on
//! its path).
//!
//! Both directions are driven by traversal trees compiled once per schema:
//! [`Deconstructor::compile`] produces the shredder, [`Reconstructor::compile`]
//! the assembler. Records are represented as [`Datum`] trees, rows as
//! sequences of [`Value`].
//!
//! ```
//! use shale_row::{Datum, Deconstructor, Reconstructor};
//! use shale_schema::{Field, Node};
//!
//! let schema = Node::group(vec![Field::new("xs", Node::int32().repeated())]);
//! let shred = Deconstructor::compile(&schema).unwrap();
//! let assemble = Reconstructor::compile(&schema).unwrap();
//!
//! let record = Datum::group([Datum::list([1i32.into(), 2i32.into()])]);
//! let row = shred.deconstruct(&record);
//! assert_eq!(assemble.reconstruct(&row).unwrap(), record);
//! ```

pub use assemble::Reconstructor;
pub use datum::Datum;
pub use shred::Deconstructor;
pub use value::{Row, Value, ValueData};

mod assemble;
mod datum;
mod levels;
mod shred;
mod value;
