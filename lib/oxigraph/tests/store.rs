use oxigraph::{QueryResults, StorageBackendKind, Store, StoreConfig};
use oxrdf::{GraphNameRef, Literal, NamedNodeRef, NamedOrBlankNodeRef, Quad, QuadRef, TermRef};

fn quad_ref<'a>(
    subject: NamedNodeRef<'a>,
    predicate: NamedNodeRef<'a>,
    object: TermRef<'a>,
    graph_name: GraphNameRef<'a>,
) -> QuadRef<'a> {
    QuadRef {
        subject: NamedOrBlankNodeRef::NamedNode(subject),
        predicate,
        object,
        graph_name,
    }
}

#[test]
fn select_finds_inserted_triples_in_the_default_graph() {
    let store = Store::new();
    let alice = NamedNodeRef::new_unchecked("http://example.com/alice");
    let knows = NamedNodeRef::new_unchecked("http://example.com/knows");
    let bob = NamedNodeRef::new_unchecked("http://example.com/bob");
    store
        .insert(quad_ref(alice, knows, TermRef::NamedNode(bob), GraphNameRef::DefaultGraph))
        .unwrap();

    let results = store
        .query("SELECT ?o WHERE { <http://example.com/alice> <http://example.com/knows> ?o }")
        .unwrap();
    match results {
        QueryResults::Solutions { iter, .. } => {
            let rows: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].get("o").unwrap().to_string(), "<http://example.com/bob>");
        }
        _ => panic!("expected a solutions sequence"),
    }
}

#[test]
fn ask_reflects_whether_the_pattern_has_a_match() {
    let store = Store::new();
    let s = NamedNodeRef::new_unchecked("http://example.com/s");
    let p = NamedNodeRef::new_unchecked("http://example.com/p");
    let o = Literal::new_simple_literal("hello");
    store
        .insert(quad_ref(s, p, TermRef::Literal(o.as_ref()), GraphNameRef::DefaultGraph))
        .unwrap();

    let present = store.query("ASK { <http://example.com/s> <http://example.com/p> \"hello\" }").unwrap();
    assert!(matches!(present, QueryResults::Boolean(true)));

    let absent = store.query("ASK { <http://example.com/s> <http://example.com/p> \"nope\" }").unwrap();
    assert!(matches!(absent, QueryResults::Boolean(false)));
}

#[test]
fn construct_builds_a_new_graph_from_the_template() {
    let store = Store::new();
    let s = NamedNodeRef::new_unchecked("http://example.com/s");
    let p = NamedNodeRef::new_unchecked("http://example.com/p");
    let o = NamedNodeRef::new_unchecked("http://example.com/o");
    store.insert(quad_ref(s, p, TermRef::NamedNode(o), GraphNameRef::DefaultGraph)).unwrap();

    let results = store
        .query("CONSTRUCT { ?s <http://example.com/mirrored> ?o } WHERE { ?s <http://example.com/p> ?o }")
        .unwrap();
    match results {
        QueryResults::Graph(iter) => {
            let triples: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
            assert_eq!(triples.len(), 1);
            assert_eq!(triples[0].predicate.as_str(), "http://example.com/mirrored");
        }
        _ => panic!("expected a graph"),
    }
}

#[test]
fn remove_and_contains_round_trip_through_the_store() {
    let store = Store::new();
    let s = NamedNodeRef::new_unchecked("http://example.com/s");
    let p = NamedNodeRef::new_unchecked("http://example.com/p");
    let o = NamedNodeRef::new_unchecked("http://example.com/o");
    let quad = quad_ref(s, p, TermRef::NamedNode(o), GraphNameRef::DefaultGraph);
    assert!(store.insert(quad).unwrap());
    assert!(store.contains(quad));
    assert!(store.remove(quad).unwrap());
    assert!(!store.contains(quad));
    assert!(!store.remove(quad).unwrap());
}

#[test]
fn named_graph_quads_are_excluded_from_the_default_graph_but_counted_in_iter() {
    let store = Store::new();
    let s = NamedNodeRef::new_unchecked("http://example.com/s");
    let p = NamedNodeRef::new_unchecked("http://example.com/p");
    let o = NamedNodeRef::new_unchecked("http://example.com/o");
    let g = NamedNodeRef::new_unchecked("http://example.com/g");
    store
        .insert(quad_ref(s, p, TermRef::NamedNode(o), GraphNameRef::NamedNode(g)))
        .unwrap();

    let default_graph_only = store
        .query("ASK { <http://example.com/s> <http://example.com/p> <http://example.com/o> }")
        .unwrap();
    assert!(matches!(default_graph_only, QueryResults::Boolean(false)));

    assert_eq!(store.iter().collect::<Result<Vec<_>, _>>().unwrap().len(), 1);
    assert_eq!(store.named_graphs().collect::<Result<Vec<_>, _>>().unwrap().len(), 1);
}

#[test]
fn extend_reports_how_many_quads_were_newly_added() {
    let store = Store::new();
    let s = NamedNodeRef::new_unchecked("http://example.com/s").into_owned();
    let p = NamedNodeRef::new_unchecked("http://example.com/p").into_owned();
    let o1 = NamedNodeRef::new_unchecked("http://example.com/o1").into_owned();
    let o2 = NamedNodeRef::new_unchecked("http://example.com/o2").into_owned();
    let quads = vec![
        Quad::new(s.clone(), p.clone(), o1, oxrdf::GraphName::DefaultGraph),
        Quad::new(s, p, o2, oxrdf::GraphName::DefaultGraph),
    ];
    assert_eq!(store.extend(quads.clone()).unwrap(), 2);
    assert_eq!(store.extend(quads).unwrap(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn open_with_the_default_config_starts_out_empty() {
    let store = Store::open(StoreConfig::new().with_backend(StorageBackendKind::Memory)).unwrap();
    assert!(store.is_empty());
}
