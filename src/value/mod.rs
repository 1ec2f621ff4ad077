//! The typed value system: scalar kinds, values, sequences and coercion.

pub mod sequence;
pub mod types;
pub mod value;

pub use sequence::flatten_one_or_many;
pub use types::ValueType;
pub use value::{Literal, Value, ValueContent};
