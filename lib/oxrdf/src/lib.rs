//! Core RDF data model: IRIs, blank nodes, literals, variables, triples and quads.
//!
//! This crate has no notion of storage or querying; it is the vocabulary every other crate in
//! this workspace builds on.

mod blank_node;
mod literal;
mod named_node;
mod triple;
mod variable;
pub mod vocab;

pub use crate::blank_node::{BlankNode, BlankNodeRef};
pub use crate::literal::{Literal, LiteralRef};
pub use crate::named_node::{NamedNode, NamedNodeRef};
pub use crate::triple::{
    GraphName, GraphNameRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Term, TermRef,
    Triple, TripleRef,
};
pub use crate::variable::Variable;

pub use oxiri::IriParseError;
pub use oxilangtag::LanguageTagParseError;
