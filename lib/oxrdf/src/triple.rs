use crate::blank_node::{BlankNode, BlankNodeRef};
use crate::literal::{Literal, LiteralRef};
use crate::named_node::{NamedNode, NamedNodeRef};
use std::fmt;

/// The owned union of IRIs and blank nodes (subject/graph-name position).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum NamedOrBlankNode {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

impl NamedOrBlankNode {
    #[inline]
    pub fn as_ref(&self) -> NamedOrBlankNodeRef<'_> {
        match self {
            Self::NamedNode(n) => NamedOrBlankNodeRef::NamedNode(n.as_ref()),
            Self::BlankNode(n) => NamedOrBlankNodeRef::BlankNode(n.as_ref()),
        }
    }
}

impl fmt::Display for NamedOrBlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl From<NamedNode> for NamedOrBlankNode {
    #[inline]
    fn from(n: NamedNode) -> Self {
        Self::NamedNode(n)
    }
}

impl From<BlankNode> for NamedOrBlankNode {
    #[inline]
    fn from(n: BlankNode) -> Self {
        Self::BlankNode(n)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum NamedOrBlankNodeRef<'a> {
    NamedNode(NamedNodeRef<'a>),
    BlankNode(BlankNodeRef<'a>),
}

impl NamedOrBlankNodeRef<'_> {
    #[inline]
    pub fn into_owned(self) -> NamedOrBlankNode {
        match self {
            Self::NamedNode(n) => NamedOrBlankNode::NamedNode(n.into_owned()),
            Self::BlankNode(n) => NamedOrBlankNode::BlankNode(n.into_owned()),
        }
    }
}

impl fmt::Display for NamedOrBlankNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(n) => n.fmt(f),
            Self::BlankNode(n) => n.fmt(f),
        }
    }
}

/// The owned union of all RDF term kinds (object position).
///
/// Term equality is RDF 1.1 term equality: literals compare lexical value, language tag and
/// datatype IRI together (derived `PartialEq` on `Literal`'s single-variant-at-a-time content
/// gives this for free), named nodes by IRI, blank nodes by label.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
}

impl Term {
    #[inline]
    pub fn as_ref(&self) -> TermRef<'_> {
        match self {
            Self::NamedNode(n) => TermRef::NamedNode(n.as_ref()),
            Self::BlankNode(n) => TermRef::BlankNode(n.as_ref()),
            Self::Literal(l) => TermRef::Literal(l.as_ref()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl From<NamedNode> for Term {
    #[inline]
    fn from(n: NamedNode) -> Self {
        Self::NamedNode(n)
    }
}

impl From<BlankNode> for Term {
    #[inline]
    fn from(n: BlankNode) -> Self {
        Self::BlankNode(n)
    }
}

impl From<Literal> for Term {
    #[inline]
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<NamedOrBlankNode> for Term {
    #[inline]
    fn from(t: NamedOrBlankNode) -> Self {
        match t {
            NamedOrBlankNode::NamedNode(n) => Self::NamedNode(n),
            NamedOrBlankNode::BlankNode(n) => Self::BlankNode(n),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TermRef<'a> {
    NamedNode(NamedNodeRef<'a>),
    BlankNode(BlankNodeRef<'a>),
    Literal(LiteralRef<'a>),
}

impl TermRef<'_> {
    #[inline]
    pub fn into_owned(self) -> Term {
        match self {
            Self::NamedNode(n) => Term::NamedNode(n.into_owned()),
            Self::BlankNode(n) => Term::BlankNode(n.into_owned()),
            Self::Literal(l) => Term::Literal(l.into_owned()),
        }
    }
}

impl fmt::Display for TermRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(n) => n.fmt(f),
            Self::BlankNode(n) => n.fmt(f),
            Self::Literal(l) => l.fmt(f),
        }
    }
}

impl<'a> From<NamedOrBlankNodeRef<'a>> for TermRef<'a> {
    #[inline]
    fn from(t: NamedOrBlankNodeRef<'a>) -> Self {
        match t {
            NamedOrBlankNodeRef::NamedNode(n) => Self::NamedNode(n),
            NamedOrBlankNodeRef::BlankNode(n) => Self::BlankNode(n),
        }
    }
}

/// An RDF [triple](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-triple).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Triple {
    pub subject: NamedOrBlankNode,
    pub predicate: NamedNode,
    pub object: Term,
}

impl Triple {
    #[inline]
    pub fn new(
        subject: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    #[inline]
    pub fn as_ref(&self) -> TripleRef<'_> {
        TripleRef {
            subject: self.subject.as_ref(),
            predicate: self.predicate.as_ref(),
            object: self.object.as_ref(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct TripleRef<'a> {
    pub subject: NamedOrBlankNodeRef<'a>,
    pub predicate: NamedNodeRef<'a>,
    pub object: TermRef<'a>,
}

impl TripleRef<'_> {
    #[inline]
    pub fn into_owned(self) -> Triple {
        Triple {
            subject: self.subject.into_owned(),
            predicate: self.predicate.into_owned(),
            object: self.object.into_owned(),
        }
    }
}

impl fmt::Display for TripleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// The name of a graph: a named graph's IRI/blank node, or the sentinel default graph.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub enum GraphName {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    #[default]
    DefaultGraph,
}

impl GraphName {
    #[inline]
    pub fn as_ref(&self) -> GraphNameRef<'_> {
        match self {
            Self::NamedNode(n) => GraphNameRef::NamedNode(n.as_ref()),
            Self::BlankNode(n) => GraphNameRef::BlankNode(n.as_ref()),
            Self::DefaultGraph => GraphNameRef::DefaultGraph,
        }
    }

    #[inline]
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Self::DefaultGraph)
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl From<NamedNode> for GraphName {
    #[inline]
    fn from(n: NamedNode) -> Self {
        Self::NamedNode(n)
    }
}

impl From<BlankNode> for GraphName {
    #[inline]
    fn from(n: BlankNode) -> Self {
        Self::BlankNode(n)
    }
}

impl From<NamedOrBlankNode> for GraphName {
    #[inline]
    fn from(n: NamedOrBlankNode) -> Self {
        match n {
            NamedOrBlankNode::NamedNode(n) => Self::NamedNode(n),
            NamedOrBlankNode::BlankNode(n) => Self::BlankNode(n),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum GraphNameRef<'a> {
    NamedNode(NamedNodeRef<'a>),
    BlankNode(BlankNodeRef<'a>),
    #[default]
    DefaultGraph,
}

impl GraphNameRef<'_> {
    #[inline]
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Self::DefaultGraph)
    }

    #[inline]
    pub fn into_owned(self) -> GraphName {
        match self {
            Self::NamedNode(n) => GraphName::NamedNode(n.into_owned()),
            Self::BlankNode(n) => GraphName::BlankNode(n.into_owned()),
            Self::DefaultGraph => GraphName::DefaultGraph,
        }
    }
}

impl fmt::Display for GraphNameRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(n) => n.fmt(f),
            Self::BlankNode(n) => n.fmt(f),
            Self::DefaultGraph => f.write_str("DEFAULT"),
        }
    }
}

/// An RDF [quad](https://www.w3.org/TR/rdf11-concepts/#dfn-generalized-rdf-quad) i.e. a triple
/// plus the name of the graph it belongs to.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Quad {
    pub subject: NamedOrBlankNode,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph_name: GraphName,
}

impl Quad {
    #[inline]
    pub fn new(
        subject: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
        graph_name: impl Into<GraphName>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph_name: graph_name.into(),
        }
    }

    #[inline]
    pub fn as_ref(&self) -> QuadRef<'_> {
        QuadRef {
            subject: self.subject.as_ref(),
            predicate: self.predicate.as_ref(),
            object: self.object.as_ref(),
            graph_name: self.graph_name.as_ref(),
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct QuadRef<'a> {
    pub subject: NamedOrBlankNodeRef<'a>,
    pub predicate: NamedNodeRef<'a>,
    pub object: TermRef<'a>,
    pub graph_name: GraphNameRef<'a>,
}

impl<'a> QuadRef<'a> {
    #[inline]
    pub fn into_owned(self) -> Quad {
        Quad {
            subject: self.subject.into_owned(),
            predicate: self.predicate.into_owned(),
            object: self.object.into_owned(),
            graph_name: self.graph_name.into_owned(),
        }
    }

    #[inline]
    pub fn as_triple(self) -> TripleRef<'a> {
        TripleRef {
            subject: self.subject,
            predicate: self.predicate,
            object: self.object,
        }
    }
}

impl fmt::Display for QuadRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if !self.graph_name.is_default_graph() {
            write!(f, " {}", self.graph_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Literal;

    #[test]
    fn named_nodes_with_the_same_iri_are_equal_terms() {
        let a = Term::NamedNode(NamedNode::new_unchecked("http://example.com/a"));
        let b = Term::NamedNode(NamedNode::new_unchecked("http://example.com/a"));
        assert_eq!(a, b);
    }

    #[test]
    fn literals_differing_only_by_datatype_are_not_equal() {
        let plain = Term::Literal(Literal::new_simple_literal("1"));
        let typed = Term::Literal(Literal::new_typed_literal(
            "1",
            NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#integer"),
        ));
        assert_ne!(plain, typed);
    }

    #[test]
    fn default_graph_is_the_default_graph_name() {
        assert!(GraphName::default().is_default_graph());
        assert!(GraphName::from(NamedNode::new_unchecked("http://example.com/g")).is_default_graph() == false);
    }

    #[test]
    fn quad_as_ref_and_into_owned_round_trip() {
        let quad = Quad::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            NamedNode::new_unchecked("http://example.com/o"),
            GraphName::DefaultGraph,
        );
        assert_eq!(quad.as_ref().into_owned(), quad);
    }

    #[test]
    fn quad_display_omits_the_graph_name_for_the_default_graph() {
        let quad = Quad::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            NamedNode::new_unchecked("http://example.com/o"),
            GraphName::DefaultGraph,
        );
        assert_eq!(
            quad.to_string(),
            "<http://example.com/s> <http://example.com/p> <http://example.com/o>"
        );
    }
}
