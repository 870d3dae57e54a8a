//! Evaluates an optimized [`sparopt`] plan against any dataset that implements
//! [`QueryableDataset`], independent of how that dataset stores or indexes its quads.

mod dataset;
mod error;
mod eval;
mod expression;
mod model;

pub use crate::dataset::QueryableDataset;
pub use crate::error::QueryEvaluationError;
pub use crate::eval::QueryEvaluator;
pub use crate::model::{QueryResults, QuerySolution, VariableRef};
