use crate::named_node::{NamedNode, NamedNodeRef};
use crate::vocab::{rdf, xsd};
use std::fmt;
use std::fmt::Write;

/// An owned RDF [literal](https://www.w3.org/TR/rdf11-concepts/#dfn-literal).
///
/// Two literals are equal iff their lexical value, language tag, and datatype IRI all match —
/// derived `PartialEq` over the three fields gives exactly this.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Literal(LiteralContent);

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
enum LiteralContent {
    String(String),
    LanguageTaggedString { value: String, language: String },
    Typed { value: String, datatype: NamedNode },
}

impl Literal {
    #[inline]
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self(LiteralContent::String(value.into()))
    }

    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, oxilangtag::LanguageTagParseError> {
        let language = language.into();
        oxilangtag::LanguageTag::parse(language.clone())?;
        Ok(Self::new_language_tagged_literal_unchecked(value, language))
    }

    #[inline]
    pub fn new_language_tagged_literal_unchecked(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self(LiteralContent::LanguageTaggedString {
            value: value.into(),
            language: language.into().to_ascii_lowercase(),
        })
    }

    #[inline]
    pub fn new_typed_literal(value: impl Into<String>, datatype: impl Into<NamedNode>) -> Self {
        let datatype = datatype.into();
        if datatype == xsd::STRING {
            return Self::new_simple_literal(value);
        }
        Self(LiteralContent::Typed {
            value: value.into(),
            datatype,
        })
    }

    #[inline]
    pub fn value(&self) -> &str {
        match &self.0 {
            LiteralContent::String(value)
            | LiteralContent::LanguageTaggedString { value, .. }
            | LiteralContent::Typed { value, .. } => value,
        }
    }

    #[inline]
    pub fn language(&self) -> Option<&str> {
        match &self.0 {
            LiteralContent::LanguageTaggedString { language, .. } => Some(language),
            _ => None,
        }
    }

    #[inline]
    pub fn datatype(&self) -> NamedNodeRef<'_> {
        match &self.0 {
            LiteralContent::String(_) => xsd::STRING,
            LiteralContent::LanguageTaggedString { .. } => rdf::LANG_STRING,
            LiteralContent::Typed { datatype, .. } => datatype.as_ref(),
        }
    }

    #[inline]
    pub fn is_plain(&self) -> bool {
        matches!(
            self.0,
            LiteralContent::String(_) | LiteralContent::LanguageTaggedString { .. }
        )
    }

    #[inline]
    pub fn as_ref(&self) -> LiteralRef<'_> {
        LiteralRef(self)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_quoted_str(self.value(), f)?;
        match &self.0 {
            LiteralContent::String(_) => Ok(()),
            LiteralContent::LanguageTaggedString { language, .. } => write!(f, "@{language}"),
            LiteralContent::Typed { datatype, .. } => write!(f, "^^{datatype}"),
        }
    }
}

#[cfg(feature = "oxsdatatypes")]
macro_rules! impl_from_numeric {
    ($ty:ty, $datatype:expr) => {
        impl From<$ty> for Literal {
            #[inline]
            fn from(value: $ty) -> Self {
                Self(LiteralContent::Typed {
                    value: value.to_string(),
                    datatype: $datatype.into_owned(),
                })
            }
        }
    };
}

#[cfg(feature = "oxsdatatypes")]
impl_from_numeric!(oxsdatatypes::Integer, xsd::INTEGER);
#[cfg(feature = "oxsdatatypes")]
impl_from_numeric!(oxsdatatypes::Decimal, xsd::DECIMAL);
#[cfg(feature = "oxsdatatypes")]
impl_from_numeric!(oxsdatatypes::Double, xsd::DOUBLE);
#[cfg(feature = "oxsdatatypes")]
impl_from_numeric!(oxsdatatypes::Boolean, xsd::BOOLEAN);
#[cfg(feature = "oxsdatatypes")]
impl_from_numeric!(oxsdatatypes::DateTime, xsd::DATE_TIME);
#[cfg(feature = "oxsdatatypes")]
impl_from_numeric!(oxsdatatypes::Date, xsd::DATE);

fn print_quoted_str(string: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_char('"')?;
    for c in string.chars() {
        match c {
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// A borrowed RDF literal.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct LiteralRef<'a>(&'a Literal);

impl<'a> LiteralRef<'a> {
    #[inline]
    pub fn new(literal: &'a Literal) -> Self {
        Self(literal)
    }

    #[inline]
    pub fn value(self) -> &'a str {
        self.0.value()
    }

    #[inline]
    pub fn language(self) -> Option<&'a str> {
        self.0.language()
    }

    #[inline]
    pub fn datatype(self) -> NamedNodeRef<'a> {
        self.0.datatype()
    }

    #[inline]
    pub fn is_plain(self) -> bool {
        self.0.is_plain()
    }

    #[inline]
    pub fn into_owned(self) -> Literal {
        self.0.clone()
    }
}

impl fmt::Display for LiteralRef<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_typed_literal_with_the_string_datatype_becomes_a_simple_literal() {
        let literal = Literal::new_typed_literal("hi", xsd::STRING.into_owned());
        assert!(literal.is_plain());
        assert_eq!(literal.datatype(), xsd::STRING);
    }

    #[test]
    fn a_language_tagged_literal_lowercases_its_tag() {
        let literal = Literal::new_language_tagged_literal_unchecked("hi", "EN-GB");
        assert_eq!(literal.language(), Some("en-gb"));
        assert_eq!(literal.datatype(), rdf::LANG_STRING);
    }

    #[test]
    fn display_escapes_control_characters_and_appends_the_datatype() {
        let literal = Literal::new_typed_literal(
            "line1\nline2",
            NamedNode::new_unchecked("http://example.com/mytype"),
        );
        assert_eq!(
            literal.to_string(),
            "\"line1\\nline2\"^^<http://example.com/mytype>"
        );
    }

    #[test]
    fn simple_and_typed_string_literals_with_the_same_value_are_equal() {
        let simple = Literal::new_simple_literal("x");
        let typed = Literal::new_typed_literal("x", xsd::STRING.into_owned());
        assert_eq!(simple, typed);
    }
}
