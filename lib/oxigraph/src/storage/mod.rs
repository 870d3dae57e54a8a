//! The eleven-index quad store: every quad is written, keyed by every permutation a pattern
//! query might need, into the key-value engine in [`backend`].

pub mod backend;
pub mod binary_encoder;
pub mod error;
pub mod numeric_encoder;

use crate::storage::backend::{StorageBackend, Table};
use crate::storage::binary_encoder::*;
use crate::storage::error::StorageError;
use crate::storage::numeric_encoder::{Decoder, EncodedQuad, EncodedTerm, StrHash, StrLookup, insert_term};
use oxrdf::{NamedOrBlankNode, Quad, QuadRef, TermRef};

#[cfg(test)]
fn test_quad<'a>(
    subject: oxrdf::NamedNodeRef<'a>,
    predicate: oxrdf::NamedNodeRef<'a>,
    object: oxrdf::NamedNodeRef<'a>,
    graph_name: oxrdf::GraphNameRef<'a>,
) -> QuadRef<'a> {
    QuadRef {
        subject: oxrdf::NamedOrBlankNodeRef::NamedNode(subject),
        predicate,
        object: TermRef::NamedNode(object),
        graph_name,
    }
}

/// The eleven-index quad store.
#[derive(Default)]
pub struct QuadStore {
    backend: StorageBackend,
}

impl QuadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(&self) -> QuadStoreReader<'_> {
        QuadStoreReader {
            reader: self.backend.reader(),
        }
    }

    /// Inserts one quad; returns `true` if it wasn't already present.
    pub fn insert(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        tracing::trace!("opening write transaction for a single insert");
        let mut writer = self.backend.writer();
        let inserted = insert_quad(&mut writer, quad)?;
        writer.commit()?;
        Ok(inserted)
    }

    /// Inserts every quad in `quads` as a single transaction; returns how many were newly added.
    pub fn insert_all(&self, quads: impl IntoIterator<Item = Quad>) -> Result<usize, StorageError> {
        tracing::trace!("opening write transaction for a bulk insert");
        let mut writer = self.backend.writer();
        let mut count = 0;
        for quad in quads {
            if insert_quad(&mut writer, quad.as_ref())? {
                count += 1;
            }
        }
        writer.commit()?;
        tracing::debug!(inserted = count, "bulk insert committed");
        Ok(count)
    }

    /// Removes one quad; returns `true` if it was present.
    pub fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        tracing::trace!("opening write transaction for a single remove");
        let mut writer = self.backend.writer();
        let removed = remove_quad(&mut writer, quad)?;
        writer.commit()?;
        Ok(removed)
    }

    pub fn remove_all(&self, quads: impl IntoIterator<Item = Quad>) -> Result<usize, StorageError> {
        tracing::trace!("opening write transaction for a bulk remove");
        let mut writer = self.backend.writer();
        let mut count = 0;
        for quad in quads {
            if remove_quad(&mut writer, quad.as_ref())? {
                count += 1;
            }
        }
        writer.commit()?;
        tracing::debug!(removed = count, "bulk remove committed");
        Ok(count)
    }

    pub fn contains(&self, quad: QuadRef<'_>) -> bool {
        self.reader().contains(quad)
    }

    pub fn len(&self) -> usize {
        self.reader().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn graph_term_ref(graph_name: oxrdf::GraphNameRef<'_>) -> Option<TermRef<'_>> {
    match graph_name {
        oxrdf::GraphNameRef::NamedNode(n) => Some(TermRef::NamedNode(n)),
        oxrdf::GraphNameRef::BlankNode(n) => Some(TermRef::BlankNode(n)),
        oxrdf::GraphNameRef::DefaultGraph => None,
    }
}

fn insert_quad(writer: &mut backend::Writer<'_>, quad: QuadRef<'_>) -> Result<bool, StorageError> {
    let encoded = EncodedQuad::new(
        quad.subject.into(),
        quad.predicate.into(),
        quad.object.into(),
        quad.graph_name.into(),
    );
    if writer.contains_key(Table::Spog, &encode_spog_quad(&encoded)) {
        return Ok(false);
    }
    writer.insert(Table::Spog, &encode_spog_quad(&encoded), &[]);
    writer.insert(Table::Posg, &encode_posg_quad(&encoded), &[]);
    writer.insert(Table::Ospg, &encode_ospg_quad(&encoded), &[]);
    writer.insert(Table::Gspo, &encode_gspo_quad(&encoded), &[]);
    writer.insert(Table::Gpos, &encode_gpos_quad(&encoded), &[]);
    writer.insert(Table::Gosp, &encode_gosp_quad(&encoded), &[]);
    if quad.graph_name.is_default_graph() {
        writer.insert(Table::Spo, &encode_spo_quad(&encoded), &[]);
        writer.insert(Table::Pos, &encode_pos_quad(&encoded), &[]);
        writer.insert(Table::Osp, &encode_osp_quad(&encoded), &[]);
    } else {
        let graph_key = encode_term(&encoded.graph_name);
        if !writer.contains_key(Table::Graphs, &graph_key) {
            writer.insert(Table::Graphs, &graph_key, &[]);
        }
    }
    insert_term(TermRef::from(quad.subject), &encoded.subject, &mut |hash, value| {
        insert_str(writer, hash, value)
    });
    insert_term(TermRef::NamedNode(quad.predicate), &encoded.predicate, &mut |hash, value| {
        insert_str(writer, hash, value)
    });
    insert_term(quad.object, &encoded.object, &mut |hash, value| insert_str(writer, hash, value));
    if let Some(graph_term) = graph_term_ref(quad.graph_name) {
        insert_term(graph_term, &encoded.graph_name, &mut |hash, value| insert_str(writer, hash, value));
    }
    Ok(true)
}

fn insert_str(writer: &mut backend::Writer<'_>, hash: &StrHash, value: &str) {
    let key = hash.to_be_bytes();
    if !writer.contains_key(Table::Id2Str, &key) {
        writer.insert(Table::Id2Str, &key, value.as_bytes());
    }
}

fn remove_quad(writer: &mut backend::Writer<'_>, quad: QuadRef<'_>) -> Result<bool, StorageError> {
    let encoded = EncodedQuad::new(
        quad.subject.into(),
        quad.predicate.into(),
        quad.object.into(),
        quad.graph_name.into(),
    );
    if !writer.remove(Table::Spog, &encode_spog_quad(&encoded)) {
        return Ok(false);
    }
    writer.remove(Table::Posg, &encode_posg_quad(&encoded));
    writer.remove(Table::Ospg, &encode_ospg_quad(&encoded));
    writer.remove(Table::Gspo, &encode_gspo_quad(&encoded));
    writer.remove(Table::Gpos, &encode_gpos_quad(&encoded));
    writer.remove(Table::Gosp, &encode_gosp_quad(&encoded));
    if quad.graph_name.is_default_graph() {
        writer.remove(Table::Spo, &encode_spo_quad(&encoded));
        writer.remove(Table::Pos, &encode_pos_quad(&encoded));
        writer.remove(Table::Osp, &encode_osp_quad(&encoded));
    }
    // id2str entries and graphs-table registrations outlive their last referencing quad: no
    // reference counting is kept, matching the collision-free, append-only id2str contract.
    Ok(true)
}

/// A point-in-time, read-only view of the store.
pub struct QuadStoreReader<'a> {
    reader: backend::Reader<'a>,
}

impl StrLookup for QuadStoreReader<'_> {
    fn get_str(&self, key: &StrHash) -> Result<Option<String>, StorageError> {
        self.reader
            .get(Table::Id2Str, &key.to_be_bytes())
            .map(|bytes| {
                std::str::from_utf8(bytes)
                    .map_err(|e| error::CorruptionError::new(e).into())
                    .map(str::to_owned)
            })
            .transpose()
    }
}

impl QuadStoreReader<'_> {
    pub fn contains(&self, quad: QuadRef<'_>) -> bool {
        let encoded = EncodedQuad::new(
            quad.subject.into(),
            quad.predicate.into(),
            quad.object.into(),
            quad.graph_name.into(),
        );
        self.reader.contains_key(Table::Spog, &encode_spog_quad(&encoded))
    }

    pub fn len(&self) -> usize {
        self.reader.scan(Table::Spog).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn named_graphs(&self) -> impl Iterator<Item = Result<NamedOrBlankNode, StorageError>> + '_ {
        self.reader.scan(Table::Graphs).map(|(key, _)| {
            let (term, _) = decode_term(key)?;
            self.decode_named_or_blank_node(&term)
        })
    }

    pub fn contains_named_graph(&self, graph_name: &EncodedTerm) -> bool {
        self.reader.contains_key(Table::Graphs, &encode_term(graph_name))
    }

    /// Implements the index-selection algorithm: picks whichever of the eleven tables lets the
    /// bound positions of `(subject, predicate, object, graph_name)` be expressed as a single key
    /// prefix, scans that prefix, decodes every matching key back into a quad and re-checks every
    /// originally-bound position (the prefix only guarantees a match on its own *contiguous*
    /// leading run; a bound position past the first gap is rechecked here).
    pub fn query<'a>(
        &'a self,
        subject: Option<EncodedTerm>,
        predicate: Option<EncodedTerm>,
        object: Option<EncodedTerm>,
        graph_name: Option<EncodedTerm>,
    ) -> Box<dyn Iterator<Item = Result<EncodedQuad, StorageError>> + 'a> {
        match graph_name {
            Some(g) if g.is_default_graph() => {
                self.query_triple_indexes(subject, predicate, object, EncodedTerm::DefaultGraph)
            }
            Some(g) => self.query_named_graph(subject, predicate, object, g),
            None => self.query_any_graph(subject, predicate, object),
        }
    }

    fn query_triple_indexes(
        &self,
        subject: Option<EncodedTerm>,
        predicate: Option<EncodedTerm>,
        object: Option<EncodedTerm>,
        graph_name: EncodedTerm,
    ) -> Box<dyn Iterator<Item = Result<EncodedQuad, StorageError>> + '_> {
        let (table, prefix, decode): (_, _, fn([EncodedTerm; 3], EncodedTerm) -> EncodedQuad) = if subject.is_some()
            && predicate.is_some()
        {
            (Table::Spo, prefix_of(&[subject, predicate, object]), decode_spo_quad)
        } else if predicate.is_some() && object.is_some() {
            (Table::Pos, prefix_of(&[predicate, object, subject]), decode_pos_quad)
        } else if object.is_some() && subject.is_some() {
            (Table::Osp, prefix_of(&[object, subject, predicate]), decode_osp_quad)
        } else if subject.is_some() {
            (Table::Spo, prefix_of(&[subject, predicate, object]), decode_spo_quad)
        } else if predicate.is_some() {
            (Table::Pos, prefix_of(&[predicate, object, subject]), decode_pos_quad)
        } else if object.is_some() {
            (Table::Osp, prefix_of(&[object, subject, predicate]), decode_osp_quad)
        } else {
            (Table::Spo, Vec::new(), decode_spo_quad)
        };
        tracing::trace!(?table, prefix_len = prefix.len(), "scanning default-graph index");
        Box::new(
            self.reader
                .scan_prefix(table, &prefix)
                .map(move |(key, _)| -> Result<EncodedQuad, StorageError> {
                    let terms = decode_terms::<3>(key)?;
                    Ok(decode(terms, graph_name))
                })
                .filter(move |result| match result {
                    Ok(quad) => matches_filter(quad, subject, predicate, object, None),
                    Err(_) => true,
                }),
        )
    }

    fn query_named_graph(
        &self,
        subject: Option<EncodedTerm>,
        predicate: Option<EncodedTerm>,
        object: Option<EncodedTerm>,
        graph_name: EncodedTerm,
    ) -> Box<dyn Iterator<Item = Result<EncodedQuad, StorageError>> + '_> {
        let (table, prefix, decode): (_, _, fn([EncodedTerm; 4]) -> EncodedQuad) = if subject.is_some()
            && predicate.is_some()
        {
            (
                Table::Gspo,
                prefix_of(&[Some(graph_name), subject, predicate, object]),
                decode_gspo_quad,
            )
        } else if predicate.is_some() && object.is_some() {
            (
                Table::Gpos,
                prefix_of(&[Some(graph_name), predicate, object, subject]),
                decode_gpos_quad,
            )
        } else if object.is_some() && subject.is_some() {
            (
                Table::Gosp,
                prefix_of(&[Some(graph_name), object, subject, predicate]),
                decode_gosp_quad,
            )
        } else if subject.is_some() {
            (
                Table::Gspo,
                prefix_of(&[Some(graph_name), subject, predicate, object]),
                decode_gspo_quad,
            )
        } else if predicate.is_some() {
            (
                Table::Gpos,
                prefix_of(&[Some(graph_name), predicate, object, subject]),
                decode_gpos_quad,
            )
        } else if object.is_some() {
            (
                Table::Gosp,
                prefix_of(&[Some(graph_name), object, subject, predicate]),
                decode_gosp_quad,
            )
        } else {
            (Table::Gspo, encode_term(&graph_name), decode_gspo_quad)
        };
        tracing::trace!(?table, prefix_len = prefix.len(), "scanning named-graph index");
        Box::new(
            self.reader
                .scan_prefix(table, &prefix)
                .map(move |(key, _)| -> Result<EncodedQuad, StorageError> {
                    let terms = decode_terms::<4>(key)?;
                    Ok(decode(terms))
                })
                .filter(move |result| match result {
                    Ok(quad) => matches_filter(quad, subject, predicate, object, Some(graph_name)),
                    Err(_) => true,
                }),
        )
    }

    fn query_any_graph(
        &self,
        subject: Option<EncodedTerm>,
        predicate: Option<EncodedTerm>,
        object: Option<EncodedTerm>,
    ) -> Box<dyn Iterator<Item = Result<EncodedQuad, StorageError>> + '_> {
        let (table, prefix, decode): (_, _, fn([EncodedTerm; 4]) -> EncodedQuad) = if subject.is_some()
            && predicate.is_some()
        {
            (Table::Spog, prefix_of(&[subject, predicate, object]), decode_spog_quad)
        } else if predicate.is_some() && object.is_some() {
            (Table::Posg, prefix_of(&[predicate, object, subject]), decode_posg_quad)
        } else if object.is_some() && subject.is_some() {
            (Table::Ospg, prefix_of(&[object, subject, predicate]), decode_ospg_quad)
        } else if subject.is_some() {
            (Table::Spog, prefix_of(&[subject, predicate, object]), decode_spog_quad)
        } else if predicate.is_some() {
            (Table::Posg, prefix_of(&[predicate, object, subject]), decode_posg_quad)
        } else if object.is_some() {
            (Table::Ospg, prefix_of(&[object, subject, predicate]), decode_ospg_quad)
        } else {
            (Table::Spog, Vec::new(), decode_spog_quad)
        };
        tracing::trace!(?table, prefix_len = prefix.len(), "scanning union-graph index");
        Box::new(
            self.reader
                .scan_prefix(table, &prefix)
                .map(move |(key, _)| -> Result<EncodedQuad, StorageError> {
                    let terms = decode_terms::<4>(key)?;
                    Ok(decode(terms))
                })
                .filter(move |result| match result {
                    Ok(quad) => matches_filter(quad, subject, predicate, object, None),
                    Err(_) => true,
                }),
        )
    }
}

/// Concatenates the leading contiguous run of `Some` terms in `ordered`, stopping at the first
/// `None`: a bound position after a gap can't be folded into the scan prefix and is rechecked
/// by the caller instead.
fn prefix_of(ordered: &[Option<EncodedTerm>]) -> Vec<u8> {
    let mut out = Vec::new();
    for term in ordered {
        match term {
            Some(term) => write_term(&mut out, term),
            None => break,
        }
    }
    out
}

fn matches_filter(
    quad: &EncodedQuad,
    subject: Option<EncodedTerm>,
    predicate: Option<EncodedTerm>,
    object: Option<EncodedTerm>,
    graph_name: Option<EncodedTerm>,
) -> bool {
    subject.map_or(true, |s| s == quad.subject)
        && predicate.map_or(true, |p| p == quad.predicate)
        && object.map_or(true, |o| o == quad.object)
        && graph_name.map_or(true, |g| g == quad.graph_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{GraphNameRef, NamedNodeRef};

    fn nn(iri: &str) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(iri)
    }

    #[test]
    fn insert_is_idempotent_and_remove_reverses_it() {
        let store = QuadStore::new();
        let quad = test_quad(nn("http://ex/s"), nn("http://ex/p"), nn("http://ex/o"), GraphNameRef::DefaultGraph);
        assert!(store.insert(quad).unwrap());
        assert!(!store.insert(quad).unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.contains(quad));
        assert!(store.remove(quad).unwrap());
        assert!(!store.contains(quad));
        assert!(store.is_empty());
    }

    #[test]
    fn query_by_subject_only_returns_matching_default_graph_quads() {
        let store = QuadStore::new();
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p1"), nn("http://ex/o1"), GraphNameRef::DefaultGraph))
            .unwrap();
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p2"), nn("http://ex/o2"), GraphNameRef::DefaultGraph))
            .unwrap();
        store
            .insert(test_quad(nn("http://ex/other"), nn("http://ex/p1"), nn("http://ex/o1"), GraphNameRef::DefaultGraph))
            .unwrap();
        let reader = store.reader();
        let subject = Some(EncodedTerm::from(nn("http://ex/s")));
        let results: Vec<_> = reader
            .query(subject, None, None, Some(EncodedTerm::DefaultGraph))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn named_graph_quads_are_invisible_to_a_default_graph_only_query() {
        let store = QuadStore::new();
        let named = GraphNameRef::NamedNode(nn("http://ex/g"));
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p"), nn("http://ex/o"), named))
            .unwrap();
        let reader = store.reader();
        let results: Vec<_> = reader
            .query(None, None, None, Some(EncodedTerm::DefaultGraph))
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(results.is_empty());
        let any_graph: Vec<_> = reader.query(None, None, None, None).collect::<Result<_, _>>().unwrap();
        assert_eq!(any_graph.len(), 1);
    }

    #[test]
    fn subject_and_object_bound_with_predicate_unbound_uses_osp() {
        let store = QuadStore::new();
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p1"), nn("http://ex/o"), GraphNameRef::DefaultGraph))
            .unwrap();
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p2"), nn("http://ex/other"), GraphNameRef::DefaultGraph))
            .unwrap();
        let reader = store.reader();
        let subject = Some(EncodedTerm::from(nn("http://ex/s")));
        let object = Some(EncodedTerm::from(nn("http://ex/o")));
        let results: Vec<_> = reader
            .query(subject, None, object, Some(EncodedTerm::DefaultGraph))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].predicate, EncodedTerm::from(nn("http://ex/p1")));
    }

    #[test]
    fn graph_subject_and_object_bound_with_predicate_unbound_uses_gosp() {
        let store = QuadStore::new();
        let g = GraphNameRef::NamedNode(nn("http://ex/g"));
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p1"), nn("http://ex/o"), g))
            .unwrap();
        store
            .insert(test_quad(nn("http://ex/s"), nn("http://ex/p2"), nn("http://ex/other"), g))
            .unwrap();
        let reader = store.reader();
        let subject = Some(EncodedTerm::from(nn("http://ex/s")));
        let object = Some(EncodedTerm::from(nn("http://ex/o")));
        let graph = EncodedTerm::from(oxrdf::NamedOrBlankNodeRef::NamedNode(nn("http://ex/g")));
        let results: Vec<_> = reader.query(subject, None, object, Some(graph)).collect::<Result<_, _>>().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].predicate, EncodedTerm::from(nn("http://ex/p1")));
    }

    #[test]
    fn named_graphs_enumerates_distinct_graph_names_once() {
        let store = QuadStore::new();
        let g = GraphNameRef::NamedNode(nn("http://ex/g"));
        store.insert(test_quad(nn("http://ex/s1"), nn("http://ex/p"), nn("http://ex/o"), g)).unwrap();
        store.insert(test_quad(nn("http://ex/s2"), nn("http://ex/p"), nn("http://ex/o"), g)).unwrap();
        let names: Vec<_> = store.reader().named_graphs().collect::<Result<_, _>>().unwrap();
        assert_eq!(names.len(), 1);
    }
}
