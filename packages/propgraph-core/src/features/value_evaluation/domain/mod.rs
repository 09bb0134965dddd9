//! Value domain: concrete values and abstract number sets.

mod number_set;
mod value;

pub use number_set::NumberSet;
pub use value::{compute_binary_op, Value};
