//! vset filter - metadata filter trees for similarity search
//!
//! This crate provides:
//! - `FilterExpr`, a boolean predicate tree over metadata attributes
//! - `compile`, which lowers a tree into the textual filter expression
//!   accepted by Redis vector-set similarity queries

pub mod compile;
pub mod expr;

pub use compile::compile;
pub use expr::{FilterExpr, Operand, Scalar};

/// Prelude for common imports
pub mod prelude {
    pub use crate::compile::compile;
    pub use crate::expr::{FilterExpr, Operand, Scalar};
}
