//! Rewrites the [`spargebra`] algebra tree into the [`algebra::Plan`] iterator plan
//! [`spareval`](../spareval/index.html) executes.

pub mod algebra;
mod optimizer;

pub use crate::optimizer::{optimize_pattern, optimize_query};
