//! Encodes RDF terms into the fixed-width 17-byte tokens the quad indexes are keyed on, and
//! decodes them back given a lookup for the strings too long to inline.
//!
//! Every token is `[type: 1 byte][payload: 16 bytes]`. Terms short enough to fit inline (numeric
//! blank node ids, short plain-string literals, numeric/boolean/date literals) carry their full
//! value in the payload and never touch the `id2str` side table; everything else carries a
//! 128-bit hash of its string content as the payload and the same hash keys an `id2str` entry
//! holding the string itself. Hashes are treated as collision-free: two different strings are
//! assumed to never hash to the same 128 bits.

use crate::storage::error::{CorruptionError, StorageError};
use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef, vocab::xsd,
};
use oxsdatatypes::{Boolean, Date, DateTime, Decimal, Double, Integer};
use std::str;
use xxhash_rust::xxh3::xxh3_128;

pub const ENCODED_TERM_LEN: usize = 17;

/// A 128-bit content hash used as the `id2str` table's key, and as the payload of every
/// hash-based [`EncodedTerm`] variant.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct StrHash {
    hash: [u8; 16],
}

impl StrHash {
    pub fn new(value: &str) -> Self {
        Self {
            hash: xxh3_128(value.as_bytes()).to_be_bytes(),
        }
    }

    #[inline]
    pub fn from_be_bytes(hash: [u8; 16]) -> Self {
        Self { hash }
    }

    #[inline]
    pub fn to_be_bytes(self) -> [u8; 16] {
        self.hash
    }
}

/// The fixed-width, fully self-describing encoding of one RDF term (or the default graph
/// sentinel). Equality and ordering on the *decoded* RDF value are only meaningful after a
/// round-trip through [`Decoder`]; `EncodedTerm` itself just carries the bytes.
///
/// `PartialEq`/`Eq`/`Hash` are implemented over the encoded byte form rather than derived,
/// because [`Double`] wraps an `f64` and doesn't implement them itself.
#[derive(Debug, Clone, Copy)]
pub enum EncodedTerm {
    NamedNode {
        iri_id: StrHash,
    },
    NumericBlankNode {
        id: u64,
    },
    HashedBlankNode {
        id_id: StrHash,
    },
    InlineStringLiteral {
        len: u8,
        value: [u8; 16],
    },
    HashedStringLiteral {
        value_id: StrHash,
    },
    LangStringLiteral {
        value_id: StrHash,
    },
    IntegerLiteral(Integer),
    DecimalLiteral(Decimal),
    DoubleLiteral(Double),
    BooleanLiteral(Boolean),
    DateTimeLiteral(DateTime),
    DateLiteral(Date),
    /// Any typed literal whose datatype isn't one of the six given a dedicated encoding above.
    OtherTypedLiteral {
        value_and_datatype_id: StrHash,
    },
    DefaultGraph,
}

impl PartialEq for EncodedTerm {
    fn eq(&self, other: &Self) -> bool {
        self.to_be_bytes() == other.to_be_bytes()
    }
}

impl Eq for EncodedTerm {}

impl std::hash::Hash for EncodedTerm {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_be_bytes().hash(state);
    }
}

impl EncodedTerm {
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Self::DefaultGraph)
    }

    fn type_tag(&self) -> u8 {
        match self {
            Self::NamedNode { .. } => 0,
            Self::NumericBlankNode { .. } => 1,
            Self::HashedBlankNode { .. } => 2,
            Self::InlineStringLiteral { .. } => 3,
            Self::HashedStringLiteral { .. } => 4,
            Self::LangStringLiteral { .. } => 5,
            Self::IntegerLiteral(_) => 6,
            Self::DecimalLiteral(_) => 7,
            Self::DoubleLiteral(_) => 8,
            Self::BooleanLiteral(_) => 9,
            Self::DateTimeLiteral(_) => 10,
            Self::DateLiteral(_) => 11,
            Self::OtherTypedLiteral { .. } => 12,
            Self::DefaultGraph => 13,
        }
    }

    pub fn to_be_bytes(self) -> [u8; ENCODED_TERM_LEN] {
        let mut out = [0u8; ENCODED_TERM_LEN];
        out[0] = self.type_tag();
        let payload = &mut out[1..];
        match self {
            Self::NamedNode { iri_id } => payload.copy_from_slice(&iri_id.to_be_bytes()),
            Self::NumericBlankNode { id } => payload[..8].copy_from_slice(&id.to_be_bytes()),
            Self::HashedBlankNode { id_id } => payload.copy_from_slice(&id_id.to_be_bytes()),
            Self::InlineStringLiteral { value, .. } => payload.copy_from_slice(&value),
            Self::HashedStringLiteral { value_id } => payload.copy_from_slice(&value_id.to_be_bytes()),
            Self::LangStringLiteral { value_id } => payload.copy_from_slice(&value_id.to_be_bytes()),
            Self::IntegerLiteral(v) => payload[..8].copy_from_slice(&i64::from(v).to_be_bytes()),
            // Decimal keeps its full 16-byte fixed-point payload rather than the 8-byte float64
            // layout doubles use: folding it through `f64` would make values like `0.1` fail to
            // round-trip, which the encoder/decoder pair must never do.
            Self::DecimalLiteral(v) => payload.copy_from_slice(&v.to_be_bytes()),
            Self::DoubleLiteral(v) => payload[..8].copy_from_slice(&v.to_be_bytes()),
            Self::BooleanLiteral(v) => payload[0] = u8::from(bool::from(v)),
            Self::DateTimeLiteral(v) => payload[..8].copy_from_slice(&v.to_be_bytes()),
            Self::DateLiteral(v) => payload[..8].copy_from_slice(&v.to_be_bytes()),
            Self::OtherTypedLiteral {
                value_and_datatype_id,
            } => payload.copy_from_slice(&value_and_datatype_id.to_be_bytes()),
            Self::DefaultGraph => {}
        }
        out
    }

    pub fn from_be_bytes(bytes: [u8; ENCODED_TERM_LEN]) -> Result<Self, StorageError> {
        let mut payload = [0u8; 16];
        payload.copy_from_slice(&bytes[1..]);
        Ok(match bytes[0] {
            0 => Self::NamedNode {
                iri_id: StrHash::from_be_bytes(payload),
            },
            1 => Self::NumericBlankNode {
                id: u64::from_be_bytes(payload[..8].try_into().unwrap()),
            },
            2 => Self::HashedBlankNode {
                id_id: StrHash::from_be_bytes(payload),
            },
            3 => {
                let len = payload.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                Self::InlineStringLiteral {
                    len: len as u8,
                    value: payload,
                }
            }
            4 => Self::HashedStringLiteral {
                value_id: StrHash::from_be_bytes(payload),
            },
            5 => Self::LangStringLiteral {
                value_id: StrHash::from_be_bytes(payload),
            },
            6 => Self::IntegerLiteral(Integer::from(i64::from_be_bytes(
                payload[..8].try_into().unwrap(),
            ))),
            7 => Self::DecimalLiteral(Decimal::from_be_bytes(payload)),
            8 => Self::DoubleLiteral(Double::from_be_bytes(payload[..8].try_into().unwrap())),
            9 => Self::BooleanLiteral(Boolean::from(payload[0] != 0)),
            10 => Self::DateTimeLiteral(DateTime::from_be_bytes(payload[..8].try_into().unwrap())),
            11 => Self::DateLiteral(Date::from_be_bytes(payload[..8].try_into().unwrap())),
            12 => Self::OtherTypedLiteral {
                value_and_datatype_id: StrHash::from_be_bytes(payload),
            },
            13 => Self::DefaultGraph,
            other => {
                return Err(CorruptionError::msg(format!("unknown term type tag {other}")).into());
            }
        })
    }
}

impl From<NamedNodeRef<'_>> for EncodedTerm {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self::NamedNode {
            iri_id: StrHash::new(node.as_str()),
        }
    }
}

impl From<BlankNodeRef<'_>> for EncodedTerm {
    fn from(node: BlankNodeRef<'_>) -> Self {
        match node.unique_id() {
            Some(id) => Self::NumericBlankNode { id },
            None => Self::HashedBlankNode {
                id_id: StrHash::new(node.as_str()),
            },
        }
    }
}

impl From<LiteralRef<'_>> for EncodedTerm {
    fn from(literal: LiteralRef<'_>) -> Self {
        let value = literal.value();
        if let Some(language) = literal.language() {
            return Self::LangStringLiteral {
                value_id: StrHash::new(&format!("{value}@{language}")),
            };
        }
        let datatype = literal.datatype();
        if datatype == xsd::STRING {
            return if let Some(len) = u8::try_from(value.len()).ok().filter(|&l| l <= 16) {
                let mut buf = [0u8; 16];
                buf[..value.len()].copy_from_slice(value.as_bytes());
                Self::InlineStringLiteral { len, value: buf }
            } else {
                Self::HashedStringLiteral {
                    value_id: StrHash::new(value),
                }
            };
        }
        if datatype == xsd::BOOLEAN {
            if let Ok(v) = value.parse::<Boolean>() {
                return Self::BooleanLiteral(v);
            }
        } else if datatype == xsd::INTEGER {
            if let Ok(v) = value.parse::<Integer>() {
                return Self::IntegerLiteral(v);
            }
        } else if datatype == xsd::DECIMAL {
            if let Ok(v) = value.parse::<Decimal>() {
                return Self::DecimalLiteral(v);
            }
        } else if datatype == xsd::DOUBLE {
            if let Ok(v) = value.parse::<Double>() {
                return Self::DoubleLiteral(v);
            }
        } else if datatype == xsd::DATE_TIME {
            if let Ok(v) = value.parse::<DateTime>() {
                return Self::DateTimeLiteral(v);
            }
        } else if datatype == xsd::DATE {
            if let Ok(v) = value.parse::<Date>() {
                return Self::DateLiteral(v);
            }
        }
        Self::OtherTypedLiteral {
            value_and_datatype_id: StrHash::new(&encode_other_literal(value, datatype.as_str())),
        }
    }
}

impl From<NamedOrBlankNodeRef<'_>> for EncodedTerm {
    fn from(node: NamedOrBlankNodeRef<'_>) -> Self {
        match node {
            NamedOrBlankNodeRef::NamedNode(n) => n.into(),
            NamedOrBlankNodeRef::BlankNode(n) => n.into(),
        }
    }
}

impl From<TermRef<'_>> for EncodedTerm {
    fn from(term: TermRef<'_>) -> Self {
        match term {
            TermRef::NamedNode(n) => n.into(),
            TermRef::BlankNode(n) => n.into(),
            TermRef::Literal(l) => l.into(),
        }
    }
}

impl From<GraphNameRef<'_>> for EncodedTerm {
    fn from(graph_name: GraphNameRef<'_>) -> Self {
        match graph_name {
            GraphNameRef::NamedNode(n) => n.into(),
            GraphNameRef::BlankNode(n) => n.into(),
            GraphNameRef::DefaultGraph => Self::DefaultGraph,
        }
    }
}

/// A fully-encoded quad, as stored (in one permutation or another) in every index.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct EncodedQuad {
    pub subject: EncodedTerm,
    pub predicate: EncodedTerm,
    pub object: EncodedTerm,
    pub graph_name: EncodedTerm,
}

impl EncodedQuad {
    pub fn new(subject: EncodedTerm, predicate: EncodedTerm, object: EncodedTerm, graph_name: EncodedTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph_name,
        }
    }
}

/// Packs a literal value and its datatype IRI into the single string `id2str` hashes for
/// [`EncodedTerm::OtherTypedLiteral`], which (unlike every other hashed variant) needs two
/// independent strings to share one side-table row. Uses NUL as a separator; a lexical form that
/// itself contains a literal NUL character would be split incorrectly on decode, a known
/// limitation of this simple packing.
fn encode_other_literal(value: &str, datatype: &str) -> String {
    format!("{value}\0{datatype}")
}

fn decode_other_literal(packed: &str) -> Result<(String, String), StorageError> {
    let (value, datatype) = packed
        .split_once('\0')
        .ok_or_else(|| CorruptionError::msg("malformed packed literal in id2str"))?;
    Ok((value.to_owned(), datatype.to_owned()))
}

/// A read-only view over the `id2str` side table, enough to turn a hash-based [`EncodedTerm`]
/// back into its string content.
pub trait StrLookup {
    fn get_str(&self, key: &StrHash) -> Result<Option<String>, StorageError>;
}

/// Calls `insert_str` for every `(hash, string)` pair `encoded` needs recorded in `id2str`
/// (nothing is called for inline or numeric encodings, which need no side-table entry).
pub fn insert_term<F: FnMut(&StrHash, &str)>(term: TermRef<'_>, encoded: &EncodedTerm, insert_str: &mut F) {
    match (term, encoded) {
        (TermRef::NamedNode(node), EncodedTerm::NamedNode { iri_id }) => {
            insert_str(iri_id, node.as_str());
        }
        (TermRef::BlankNode(node), EncodedTerm::HashedBlankNode { id_id }) => {
            insert_str(id_id, node.as_str());
        }
        (TermRef::BlankNode(_), EncodedTerm::NumericBlankNode { .. }) => {}
        (TermRef::Literal(literal), EncodedTerm::HashedStringLiteral { value_id }) => {
            insert_str(value_id, literal.value());
        }
        (TermRef::Literal(literal), EncodedTerm::LangStringLiteral { value_id }) => {
            let language = literal.language().unwrap_or_default();
            insert_str(value_id, &format!("{}@{language}", literal.value()));
        }
        (
            TermRef::Literal(literal),
            EncodedTerm::OtherTypedLiteral {
                value_and_datatype_id,
            },
        ) => {
            insert_str(
                value_and_datatype_id,
                &encode_other_literal(literal.value(), literal.datatype().as_str()),
            );
        }
        _ => {}
    }
}

/// Decodes an [`EncodedTerm`] back into a full [`Term`]/[`NamedOrBlankNode`]/[`GraphName`],
/// resolving any hashed payload through a [`StrLookup`].
pub trait Decoder: StrLookup {
    fn decode_term(&self, encoded: &EncodedTerm) -> Result<Term, StorageError> {
        Ok(match encoded {
            EncodedTerm::NamedNode { iri_id } => Term::NamedNode(NamedNode::new_unchecked(self.get_required_str(iri_id)?)),
            EncodedTerm::NumericBlankNode { id } => Term::BlankNode(BlankNode::new_from_unique_id(*id)),
            EncodedTerm::HashedBlankNode { id_id } => {
                Term::BlankNode(BlankNode::new(self.get_required_str(id_id)?))
            }
            EncodedTerm::InlineStringLiteral { len, value } => {
                let value = str::from_utf8(&value[..*len as usize])
                    .map_err(|e| CorruptionError::new(e))?
                    .to_owned();
                Term::Literal(Literal::new_simple_literal(value))
            }
            EncodedTerm::HashedStringLiteral { value_id } => {
                Term::Literal(Literal::new_simple_literal(self.get_required_str(value_id)?))
            }
            EncodedTerm::LangStringLiteral { value_id } => {
                let packed = self.get_required_str(value_id)?;
                let (value, language) = packed
                    .rsplit_once('@')
                    .ok_or_else(|| CorruptionError::msg("malformed lang string in id2str"))?;
                Term::Literal(Literal::new_language_tagged_literal_unchecked(value, language))
            }
            EncodedTerm::IntegerLiteral(v) => Term::Literal(Literal::from(*v)),
            EncodedTerm::DecimalLiteral(v) => Term::Literal(Literal::from(*v)),
            EncodedTerm::DoubleLiteral(v) => Term::Literal(Literal::from(*v)),
            EncodedTerm::BooleanLiteral(v) => Term::Literal(Literal::from(*v)),
            EncodedTerm::DateTimeLiteral(v) => Term::Literal(Literal::from(*v)),
            EncodedTerm::DateLiteral(v) => Term::Literal(Literal::from(*v)),
            EncodedTerm::OtherTypedLiteral {
                value_and_datatype_id,
            } => {
                let packed = self.get_required_str(value_and_datatype_id)?;
                let (value, datatype) = decode_other_literal(&packed)?;
                Term::Literal(Literal::new_typed_literal(value, NamedNode::new_unchecked(datatype)))
            }
            EncodedTerm::DefaultGraph => {
                return Err(CorruptionError::msg("the default graph has no term representation").into());
            }
        })
    }

    fn decode_named_or_blank_node(&self, encoded: &EncodedTerm) -> Result<NamedOrBlankNode, StorageError> {
        match self.decode_term(encoded)? {
            Term::NamedNode(n) => Ok(NamedOrBlankNode::NamedNode(n)),
            Term::BlankNode(n) => Ok(NamedOrBlankNode::BlankNode(n)),
            Term::Literal(_) => Err(CorruptionError::msg("literal found in a subject/graph-name position").into()),
        }
    }

    fn decode_named_node(&self, encoded: &EncodedTerm) -> Result<NamedNode, StorageError> {
        match self.decode_term(encoded)? {
            Term::NamedNode(n) => Ok(n),
            _ => Err(CorruptionError::msg("non-IRI found in a predicate position").into()),
        }
    }

    fn decode_graph_name(&self, encoded: &EncodedTerm) -> Result<GraphName, StorageError> {
        if encoded.is_default_graph() {
            return Ok(GraphName::DefaultGraph);
        }
        match self.decode_named_or_blank_node(encoded)? {
            NamedOrBlankNode::NamedNode(n) => Ok(GraphName::NamedNode(n)),
            NamedOrBlankNode::BlankNode(n) => Ok(GraphName::BlankNode(n)),
        }
    }

    fn get_required_str(&self, key: &StrHash) -> Result<String, StorageError> {
        self.get_str(key)?
            .ok_or_else(|| CorruptionError::msg("id2str lookup miss for a hashed term").into())
    }
}

impl<T: StrLookup> Decoder for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;
    use std::collections::HashMap;

    struct MapLookup(HashMap<StrHash, String>);

    impl StrLookup for MapLookup {
        fn get_str(&self, key: &StrHash) -> Result<Option<String>, StorageError> {
            Ok(self.0.get(key).cloned())
        }
    }

    #[test]
    fn named_node_round_trips_through_a_lookup() {
        let node = NamedNodeRef::new_unchecked("http://example.com/foo");
        let encoded: EncodedTerm = node.into();
        let mut map = HashMap::new();
        if let EncodedTerm::NamedNode { iri_id } = encoded {
            map.insert(iri_id, node.as_str().to_owned());
        } else {
            panic!("expected a NamedNode encoding");
        }
        let lookup = MapLookup(map);
        assert_eq!(lookup.decode_named_node(&encoded).unwrap().as_str(), node.as_str());
    }

    #[test]
    fn short_string_literal_is_inlined_without_a_lookup() {
        let literal = Literal::new_simple_literal("hi");
        let encoded: EncodedTerm = literal.as_ref().into();
        assert!(matches!(encoded, EncodedTerm::InlineStringLiteral { .. }));
        let lookup = MapLookup(HashMap::new());
        assert_eq!(lookup.decode_term(&encoded).unwrap(), Term::Literal(literal));
    }

    #[test]
    fn numeric_blank_node_needs_no_side_table_entry() {
        let node = BlankNode::new_from_unique_id(42);
        let encoded: EncodedTerm = node.as_ref().into();
        assert!(matches!(encoded, EncodedTerm::NumericBlankNode { id: 42 }));
        let lookup = MapLookup(HashMap::new());
        assert_eq!(lookup.decode_term(&encoded).unwrap(), Term::BlankNode(node));
    }

    #[test]
    fn other_typed_literal_round_trips_value_and_datatype() {
        let duration = NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#duration");
        let literal = Literal::new_typed_literal("P3D", duration.clone());
        let encoded: EncodedTerm = literal.as_ref().into();
        let mut map = HashMap::new();
        if let EncodedTerm::OtherTypedLiteral { value_and_datatype_id } = encoded {
            map.insert(value_and_datatype_id, encode_other_literal("P3D", duration.as_str()));
        } else {
            panic!("expected an OtherTypedLiteral encoding");
        }
        let lookup = MapLookup(map);
        assert_eq!(lookup.decode_term(&encoded).unwrap(), Term::Literal(literal));
    }

    #[test]
    fn equal_double_literals_hash_and_compare_equal() {
        let one = Literal::new_typed_literal("1.5", xsd::DOUBLE.into_owned());
        let other = Literal::new_typed_literal("1.5", xsd::DOUBLE.into_owned());
        let a: EncodedTerm = one.as_ref().into();
        let b: EncodedTerm = other.as_ref().into();
        assert_eq!(a, b);
        assert_eq!(a.to_be_bytes(), b.to_be_bytes());
    }

    #[test]
    fn default_graph_has_no_term_form() {
        let lookup = MapLookup(HashMap::new());
        assert!(lookup.decode_term(&EncodedTerm::DefaultGraph).is_err());
        assert_eq!(lookup.decode_graph_name(&EncodedTerm::DefaultGraph).unwrap(), GraphName::DefaultGraph);
    }
}
