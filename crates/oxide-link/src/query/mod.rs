//! Query building types for the ORM.
//!
//! This module provides Q objects and the filter expression tree they wrap.

mod filter;

pub use filter::{CompareOp, FilterExpr, Operand, Q};
