//! A parser that turns SPARQL 1.1 query text into the [`algebra`] tree: the AST the optimizer and
//! evaluator crates operate on.

pub mod algebra;
mod parser;
mod query;
pub mod term;

pub use crate::parser::{SparqlParser, SparqlSyntaxError};
pub use crate::query::Query;
