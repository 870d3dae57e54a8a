use oxrdf::{GraphName, NamedNode, NamedOrBlankNode, Quad, Term};
use std::error::Error;

/// A source of quads an evaluator can query by pattern.
///
/// Implementors decide how quads are stored and indexed; the evaluator only ever asks for
/// pattern matches. `graph_name` follows the usual SPARQL convention: `None` matches quads in
/// any graph (the union of the default graph and every named graph), `Some(&GraphName::DefaultGraph)`
/// matches only the default graph, and `Some(&GraphName::NamedNode(..) | GraphName::BlankNode(..))`
/// matches only that one named graph.
pub trait QueryableDataset {
    type Error: Error + Send + Sync + 'static;

    fn quads_for_pattern(
        &self,
        subject: Option<&NamedOrBlankNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph_name: Option<&GraphName>,
    ) -> Box<dyn Iterator<Item = Result<Quad, Self::Error>> + '_>;

    /// All distinct named graph names currently present (excludes the default graph).
    fn named_graphs(&self) -> Box<dyn Iterator<Item = Result<NamedOrBlankNode, Self::Error>> + '_>;

    /// Whether a quad naming `graph_name` as its graph exists.
    fn contains_named_graph(&self, graph_name: &NamedOrBlankNode) -> Result<bool, Self::Error> {
        Ok(self
            .named_graphs()
            .collect::<Result<Vec<_>, _>>()?
            .contains(graph_name))
    }
}
