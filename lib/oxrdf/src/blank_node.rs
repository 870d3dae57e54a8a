use rand::random;
use std::fmt;

/// An owned RDF [blank node](https://www.w3.org/TR/rdf11-concepts/#dfn-blank-node).
///
/// The usual way to create a fresh one is [`BlankNode::default`]; [`BlankNode::new`] builds one
/// from an explicit label (used when a query or insert names a `_:label` directly).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct BlankNode(BlankNodeContent);

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
enum BlankNodeContent {
    Named(String),
    Anonymous(u64),
}

impl BlankNode {
    /// Creates a blank node from an explicit, caller-supplied label.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if let Some(numeric) = parse_numeric_label(&id) {
            Self(BlankNodeContent::Anonymous(numeric))
        } else {
            Self(BlankNodeContent::Named(id))
        }
    }

    /// Creates a blank node directly from a numeric id (no string allocation).
    #[inline]
    pub fn new_from_unique_id(id: u64) -> Self {
        Self(BlankNodeContent::Anonymous(id))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.0 {
            BlankNodeContent::Named(s) => s,
            BlankNodeContent::Anonymous(_) => "",
        }
    }

    /// The numeric id this blank node was allocated from, if it has one.
    ///
    /// This drives the encoder's choice between the 8-byte inline numeric payload and the
    /// hashed non-numeric payload.
    #[inline]
    pub fn unique_id(&self) -> Option<u64> {
        match self.0 {
            BlankNodeContent::Anonymous(id) => Some(id),
            BlankNodeContent::Named(_) => None,
        }
    }

    #[inline]
    pub fn as_ref(&self) -> BlankNodeRef<'_> {
        BlankNodeRef(self)
    }
}

impl Default for BlankNode {
    #[inline]
    fn default() -> Self {
        Self(BlankNodeContent::Anonymous(random()))
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            BlankNodeContent::Named(s) => write!(f, "_:{s}"),
            BlankNodeContent::Anonymous(id) => write!(f, "_:b{id:x}"),
        }
    }
}

/// A blank node numeric label is one that round-trips through `bNNN` (the shape this crate's own
/// `Display` produces); anything else is treated as a non-numeric, hashed label.
fn parse_numeric_label(id: &str) -> Option<u64> {
    let digits = id.strip_prefix('b')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// A borrowed RDF blank node.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct BlankNodeRef<'a>(&'a BlankNode);

impl<'a> BlankNodeRef<'a> {
    #[inline]
    pub fn new(node: &'a BlankNode) -> Self {
        Self(node)
    }

    #[inline]
    pub fn as_str(self) -> &'a str {
        self.0.as_str()
    }

    #[inline]
    pub fn unique_id(self) -> Option<u64> {
        self.0.unique_id()
    }

    #[inline]
    pub fn into_owned(self) -> BlankNode {
        self.0.clone()
    }
}

impl fmt::Display for BlankNodeRef<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
