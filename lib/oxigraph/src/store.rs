//! The public entry point: an in-memory quad store wired up to SPARQL parsing, optimization and
//! evaluation.

use crate::storage::numeric_encoder::{Decoder, EncodedTerm};
use crate::storage::QuadStore;
use oxrdf::{GraphName, NamedNode, NamedOrBlankNode, Quad, QuadRef, Term};
use spareval::{QueryEvaluationError, QueryEvaluator, QueryResults, QueryableDataset};
use spargebra::{SparqlParser, SparqlSyntaxError};
use std::sync::Arc;

/// Which backend a [`Store`] keeps its indexes in.
///
/// `Memory` is the only variant implemented; it exists as an enum rather than being hard-coded so
/// a future on-disk backend has somewhere to land without changing [`Store`]'s constructor shape.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum StorageBackendKind {
    #[default]
    Memory,
}

/// Configuration passed to [`Store::open`]. Construction happens in-process: there is no
/// environment-variable or config-file lookup here, that's left to callers.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct StoreConfig {
    pub backend: StorageBackendKind,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: StorageBackendKind) -> Self {
        self.backend = backend;
        self
    }
}

/// An embeddable RDF quad store with a SPARQL 1.1 query engine.
///
/// Cloning a [`Store`] is cheap: every clone shares the same underlying data through an
/// [`Arc`].
#[derive(Clone, Default)]
pub struct Store {
    storage: Arc<QuadStore>,
}

impl Store {
    /// Creates a new, empty, in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty store using the given configuration.
    ///
    /// `config.backend` currently only admits [`StorageBackendKind::Memory`]; the `Result`
    /// return type mirrors what a future fallible backend (e.g. one that opens a file) would
    /// need.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackendKind::Memory => Ok(Self::new()),
        }
    }

    /// Inserts a quad; returns `true` if it wasn't already present.
    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StoreError> {
        Ok(self.storage.insert(quad.into())?)
    }

    /// Inserts every quad in `quads`; returns how many were newly added.
    pub fn extend(&self, quads: impl IntoIterator<Item = Quad>) -> Result<usize, StoreError> {
        Ok(self.storage.insert_all(quads)?)
    }

    /// Removes a quad; returns `true` if it was present.
    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StoreError> {
        Ok(self.storage.remove(quad.into())?)
    }

    /// Whether `quad` is currently in the store.
    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.storage.contains(quad.into())
    }

    /// Every quad currently in the store matching `(subject, predicate, object, graph_name)`,
    /// with `None` in any position acting as a wildcard.
    pub fn quads_for_pattern(
        &self,
        subject: Option<&NamedOrBlankNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph_name: Option<&GraphName>,
    ) -> impl Iterator<Item = Result<Quad, StoreError>> + '_ {
        QueryableDataset::quads_for_pattern(self, subject, predicate, object, graph_name)
    }

    /// All distinct named graphs currently present (excludes the default graph).
    pub fn named_graphs(&self) -> impl Iterator<Item = Result<NamedOrBlankNode, StoreError>> + '_ {
        QueryableDataset::named_graphs(self)
    }

    /// The number of quads currently in the store.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Parses, optimizes and evaluates a SPARQL 1.1 query against this store's current contents.
    pub fn query(&self, query: &str) -> Result<QueryResults, StoreQueryError> {
        let parsed = SparqlParser::new().parse_query(query)?;
        let plan = sparopt::optimize_query(&parsed);
        tracing::debug!(root = plan_root_name(&plan), "evaluating optimized plan");
        Ok(QueryEvaluator::new(self.clone()).execute(&plan)?)
    }

    /// Every quad currently in the store, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Quad, StoreError>> + '_ {
        self.quads_for_pattern(None, None, None, None)
    }
}

fn plan_root_name(plan: &sparopt::algebra::QueryPlan) -> &'static str {
    match plan {
        sparopt::algebra::QueryPlan::Select { .. } => "select",
        sparopt::algebra::QueryPlan::Ask { .. } => "ask",
        sparopt::algebra::QueryPlan::Construct { .. } => "construct",
        sparopt::algebra::QueryPlan::Describe { .. } => "describe",
    }
}

/// A dataset view of [`Store`], adapted to what [`spareval`] needs to evaluate a plan: pattern
/// lookups translated through the same [`EncodedTerm`] encoding the storage layer is keyed on.
impl QueryableDataset for Store {
    type Error = StoreError;

    fn quads_for_pattern(
        &self,
        subject: Option<&NamedOrBlankNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph_name: Option<&GraphName>,
    ) -> Box<dyn Iterator<Item = Result<Quad, Self::Error>> + '_> {
        let reader = self.storage.reader();
        let subject = subject.map(|s| EncodedTerm::from(s.as_ref()));
        let predicate = predicate.map(|p| EncodedTerm::from(p.as_ref()));
        let object = object.map(|o| EncodedTerm::from(o.as_ref()));
        let graph_name = graph_name.map(|g| EncodedTerm::from(g.as_ref()));
        // Materialized eagerly: the reader is local to this call, and a lazily-streaming
        // iterator can't outlive it without borrowing across the return boundary.
        let quads: Vec<Result<Quad, StoreError>> = reader
            .query(subject, predicate, object, graph_name)
            .map(|result| {
                let encoded = result?;
                Ok(Quad::new(
                    reader.decode_named_or_blank_node(&encoded.subject)?,
                    reader.decode_named_node(&encoded.predicate)?,
                    reader.decode_term(&encoded.object)?,
                    reader.decode_graph_name(&encoded.graph_name)?,
                ))
            })
            .collect();
        Box::new(quads.into_iter())
    }

    fn named_graphs(&self) -> Box<dyn Iterator<Item = Result<NamedOrBlankNode, Self::Error>> + '_> {
        let reader = self.storage.reader();
        let graphs: Vec<Result<NamedOrBlankNode, StoreError>> =
            reader.named_graphs().map(|r| Ok(r?)).collect();
        Box::new(graphs.into_iter())
    }

    fn contains_named_graph(&self, graph_name: &NamedOrBlankNode) -> Result<bool, Self::Error> {
        let encoded = EncodedTerm::from(graph_name.as_ref());
        Ok(self.storage.reader().contains_named_graph(&encoded))
    }
}

/// An error raised by the storage layer while reading or writing quads.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(#[from] crate::storage::error::StorageError);

/// An error raised while parsing or evaluating a SPARQL query against a [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreQueryError {
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
}
