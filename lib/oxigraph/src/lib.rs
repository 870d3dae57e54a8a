//! An embeddable RDF quad store with a SPARQL 1.1 query engine.
//!
//! [`Store`] is the public entry point: it owns an in-memory, eleven-index [`storage::QuadStore`]
//! and wires [`spargebra`] parsing through [`sparopt`] optimization into [`spareval`] evaluation.

pub mod storage;
mod store;

pub use crate::store::{StorageBackendKind, Store, StoreConfig, StoreError, StoreQueryError};
pub use spareval::{QueryEvaluationError, QueryResults, QuerySolution, VariableRef};
pub use spargebra::{SparqlParser, SparqlSyntaxError};
