use oxrdf::{GraphName, NamedNode, NamedOrBlankNode, Quad, Term};
use spareval::{QueryEvaluator, QueryResults, QueryableDataset};
use spargebra::SparqlParser;
use sparopt::optimize_query;
use std::convert::Infallible;

#[derive(Clone, Default)]
struct VecDataset {
    quads: Vec<Quad>,
}

impl VecDataset {
    fn new(quads: Vec<Quad>) -> Self {
        Self { quads }
    }
}

impl QueryableDataset for VecDataset {
    type Error = Infallible;

    fn quads_for_pattern(
        &self,
        subject: Option<&NamedOrBlankNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph_name: Option<&GraphName>,
    ) -> Box<dyn Iterator<Item = Result<Quad, Self::Error>> + '_> {
        Box::new(
            self.quads
                .iter()
                .filter(move |q| subject.map_or(true, |s| *s == q.subject))
                .filter(move |q| predicate.map_or(true, |p| *p == q.predicate))
                .filter(move |q| object.map_or(true, |o| *o == q.object))
                .filter(move |q| graph_name.map_or(true, |g| *g == q.graph_name))
                .cloned()
                .map(Ok),
        )
    }

    fn named_graphs(&self) -> Box<dyn Iterator<Item = Result<NamedOrBlankNode, Self::Error>> + '_> {
        Box::new(std::iter::empty())
    }
}

fn nn(iri: &str) -> NamedNode {
    NamedNode::new_unchecked(iri)
}

fn run(dataset: VecDataset, query: &str) -> QueryResults {
    let parsed = SparqlParser::new().parse_query(query).unwrap();
    let plan = optimize_query(&parsed);
    QueryEvaluator::new(dataset).execute(&plan).unwrap()
}

#[test]
fn filter_arithmetic_keeps_only_matching_rows() {
    let dataset = VecDataset::new(vec![
        Quad::new(nn("http://example.com/a"), nn("http://example.com/age"), oxrdf::Literal::from(oxsdatatypes::Integer::from(10)), GraphName::DefaultGraph),
        Quad::new(nn("http://example.com/b"), nn("http://example.com/age"), oxrdf::Literal::from(oxsdatatypes::Integer::from(20)), GraphName::DefaultGraph),
    ]);
    let results = run(
        dataset,
        "SELECT ?s WHERE { ?s <http://example.com/age> ?age . FILTER(?age > 15) }",
    );
    let QueryResults::Solutions { iter, .. } = results else {
        panic!("expected solutions");
    };
    let rows: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("s").unwrap().to_string(), "<http://example.com/b>");
}

#[test]
fn bound_checks_whether_an_optional_join_produced_a_value() {
    let dataset = VecDataset::new(vec![Quad::new(
        nn("http://example.com/a"),
        nn("http://example.com/knows"),
        nn("http://example.com/b"),
        GraphName::DefaultGraph,
    )]);
    let results = run(
        dataset,
        "SELECT ?s WHERE { ?s <http://example.com/knows> ?o . OPTIONAL { ?s <http://example.com/nickname> ?nick } FILTER(!BOUND(?nick)) }",
    );
    let QueryResults::Solutions { iter, .. } = results else {
        panic!("expected solutions");
    };
    let rows: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn exists_reflects_whether_a_pattern_has_a_match_for_the_current_binding() {
    let dataset = VecDataset::new(vec![
        Quad::new(nn("http://example.com/a"), nn("http://example.com/knows"), nn("http://example.com/b"), GraphName::DefaultGraph),
        Quad::new(nn("http://example.com/a"), nn("http://example.com/likes"), nn("http://example.com/b"), GraphName::DefaultGraph),
        Quad::new(nn("http://example.com/c"), nn("http://example.com/knows"), nn("http://example.com/d"), GraphName::DefaultGraph),
    ]);
    let results = run(
        dataset,
        "SELECT ?s WHERE { ?s <http://example.com/knows> ?o . FILTER EXISTS { ?s <http://example.com/likes> ?o } }",
    );
    let QueryResults::Solutions { iter, .. } = results else {
        panic!("expected solutions");
    };
    let rows: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("s").unwrap().to_string(), "<http://example.com/a>");
}

#[test]
fn ask_with_no_match_returns_false() {
    let dataset = VecDataset::new(vec![]);
    let results = run(dataset, "ASK { ?s ?p ?o }");
    assert!(matches!(results, QueryResults::Boolean(false)));
}
