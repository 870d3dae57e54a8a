//! Concatenates [`EncodedTerm`] tokens into the fixed-width keys the six/eleven quad indexes use,
//! and splits those keys back apart.
//!
//! Every index key is `N` consecutive 17-byte term tokens with no separators — lexicographic byte
//! order over the concatenation is exactly lexicographic order over the term sequence, which is
//! what gives every index its prefix-scannable ordering.

use crate::storage::error::StorageError;
use crate::storage::numeric_encoder::{ENCODED_TERM_LEN, EncodedTerm};

pub fn write_term(sink: &mut Vec<u8>, term: &EncodedTerm) {
    sink.extend_from_slice(&term.to_be_bytes());
}

pub fn encode_term(t: &EncodedTerm) -> Vec<u8> {
    let mut sink = Vec::with_capacity(ENCODED_TERM_LEN);
    write_term(&mut sink, t);
    sink
}

pub fn encode_term_pair(t1: &EncodedTerm, t2: &EncodedTerm) -> Vec<u8> {
    let mut sink = Vec::with_capacity(2 * ENCODED_TERM_LEN);
    write_term(&mut sink, t1);
    write_term(&mut sink, t2);
    sink
}

pub fn encode_term_triple(t1: &EncodedTerm, t2: &EncodedTerm, t3: &EncodedTerm) -> Vec<u8> {
    let mut sink = Vec::with_capacity(3 * ENCODED_TERM_LEN);
    write_term(&mut sink, t1);
    write_term(&mut sink, t2);
    write_term(&mut sink, t3);
    sink
}

pub fn encode_term_quad(t1: &EncodedTerm, t2: &EncodedTerm, t3: &EncodedTerm, t4: &EncodedTerm) -> Vec<u8> {
    let mut sink = Vec::with_capacity(4 * ENCODED_TERM_LEN);
    write_term(&mut sink, t1);
    write_term(&mut sink, t2);
    write_term(&mut sink, t3);
    write_term(&mut sink, t4);
    sink
}

/// Reads one term token off the front of `buffer`, returning the decoded term and the remainder.
pub fn decode_term(buffer: &[u8]) -> Result<(EncodedTerm, &[u8]), StorageError> {
    if buffer.len() < ENCODED_TERM_LEN {
        return Err(crate::storage::error::CorruptionError::msg("truncated term token in an index key").into());
    }
    let mut bytes = [0u8; ENCODED_TERM_LEN];
    bytes.copy_from_slice(&buffer[..ENCODED_TERM_LEN]);
    Ok((EncodedTerm::from_be_bytes(bytes)?, &buffer[ENCODED_TERM_LEN..]))
}

/// Splits a key built from `n` concatenated term tokens, in the order they were written.
pub fn decode_terms<const N: usize>(mut buffer: &[u8]) -> Result<[EncodedTerm; N], StorageError> {
    let mut out = [EncodedTerm::DefaultGraph; N];
    for slot in &mut out {
        let (term, rest) = decode_term(buffer)?;
        *slot = term;
        buffer = rest;
    }
    Ok(out)
}

use crate::storage::numeric_encoder::EncodedQuad;

pub fn encode_spo_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_triple(&quad.subject, &quad.predicate, &quad.object)
}

pub fn encode_pos_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_triple(&quad.predicate, &quad.object, &quad.subject)
}

pub fn encode_osp_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_triple(&quad.object, &quad.subject, &quad.predicate)
}

pub fn encode_spog_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_quad(&quad.subject, &quad.predicate, &quad.object, &quad.graph_name)
}

pub fn encode_posg_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_quad(&quad.predicate, &quad.object, &quad.subject, &quad.graph_name)
}

pub fn encode_ospg_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_quad(&quad.object, &quad.subject, &quad.predicate, &quad.graph_name)
}

pub fn encode_gspo_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_quad(&quad.graph_name, &quad.subject, &quad.predicate, &quad.object)
}

pub fn encode_gpos_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_quad(&quad.graph_name, &quad.predicate, &quad.object, &quad.subject)
}

pub fn encode_gosp_quad(quad: &EncodedQuad) -> Vec<u8> {
    encode_term_quad(&quad.graph_name, &quad.object, &quad.subject, &quad.predicate)
}

pub fn decode_spo_quad(terms: [EncodedTerm; 3], graph_name: EncodedTerm) -> EncodedQuad {
    EncodedQuad::new(terms[0], terms[1], terms[2], graph_name)
}

pub fn decode_pos_quad(terms: [EncodedTerm; 3], graph_name: EncodedTerm) -> EncodedQuad {
    EncodedQuad::new(terms[2], terms[0], terms[1], graph_name)
}

pub fn decode_osp_quad(terms: [EncodedTerm; 3], graph_name: EncodedTerm) -> EncodedQuad {
    EncodedQuad::new(terms[1], terms[2], terms[0], graph_name)
}

pub fn decode_spog_quad(terms: [EncodedTerm; 4]) -> EncodedQuad {
    EncodedQuad::new(terms[0], terms[1], terms[2], terms[3])
}

pub fn decode_posg_quad(terms: [EncodedTerm; 4]) -> EncodedQuad {
    EncodedQuad::new(terms[2], terms[0], terms[1], terms[3])
}

pub fn decode_ospg_quad(terms: [EncodedTerm; 4]) -> EncodedQuad {
    EncodedQuad::new(terms[1], terms[2], terms[0], terms[3])
}

pub fn decode_gspo_quad(terms: [EncodedTerm; 4]) -> EncodedQuad {
    EncodedQuad::new(terms[1], terms[2], terms[3], terms[0])
}

pub fn decode_gpos_quad(terms: [EncodedTerm; 4]) -> EncodedQuad {
    EncodedQuad::new(terms[3], terms[1], terms[2], terms[0])
}

pub fn decode_gosp_quad(terms: [EncodedTerm; 4]) -> EncodedQuad {
    EncodedQuad::new(terms[2], terms[3], terms[1], terms[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNodeRef;

    fn sample_quad() -> EncodedQuad {
        EncodedQuad::new(
            NamedNodeRef::new_unchecked("http://example.com/s").into(),
            NamedNodeRef::new_unchecked("http://example.com/p").into(),
            NamedNodeRef::new_unchecked("http://example.com/o").into(),
            NamedNodeRef::new_unchecked("http://example.com/g").into(),
        )
    }

    #[test]
    fn spo_key_permutes_terms_and_drops_the_graph() {
        let quad = sample_quad();
        let key = encode_spo_quad(&quad);
        let terms = decode_terms::<3>(&key).unwrap();
        assert_eq!(decode_spo_quad(terms, EncodedTerm::DefaultGraph).subject, quad.subject);
        assert_eq!(decode_spo_quad(terms, EncodedTerm::DefaultGraph).object, quad.object);
    }

    #[test]
    fn gspo_key_recovers_every_position_including_the_graph() {
        let quad = sample_quad();
        let key = encode_gspo_quad(&quad);
        let terms = decode_terms::<4>(&key).unwrap();
        assert_eq!(decode_gspo_quad(terms), quad);
    }

    #[test]
    fn decode_term_rejects_a_truncated_buffer() {
        let mut key = encode_term(&quad_subject());
        key.truncate(ENCODED_TERM_LEN - 1);
        assert!(decode_term(&key).is_err());
    }

    fn quad_subject() -> EncodedTerm {
        NamedNodeRef::new_unchecked("http://example.com/s").into()
    }
}
