use std::fmt;
use std::str::FromStr;

/// [XML Schema `boolean` datatype](https://www.w3.org/TR/xmlschema11-2/#boolean)
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Boolean {
    value: bool,
}

impl Boolean {
    #[inline]
    pub fn from_be_bytes(bytes: [u8; 1]) -> Self {
        Self {
            value: bytes[0] != 0,
        }
    }

    #[inline]
    pub fn to_be_bytes(self) -> [u8; 1] {
        [self.value as u8]
    }

    #[inline]
    pub fn is_identical_with(&self, other: &Self) -> bool {
        self == other
    }
}

impl From<bool> for Boolean {
    #[inline]
    fn from(value: bool) -> Self {
        Self { value }
    }
}

impl From<Boolean> for bool {
    #[inline]
    fn from(value: Boolean) -> Self {
        value.value
    }
}

impl FromStr for Boolean {
    type Err = ParseBooleanError;

    #[inline]
    fn from_str(input: &str) -> Result<Self, ParseBooleanError> {
        match input {
            "true" | "1" => Ok(Self { value: true }),
            "false" | "0" => Ok(Self { value: false }),
            _ => Err(ParseBooleanError),
        }
    }
}

impl fmt::Display for Boolean {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.value { "true" } else { "false" })
    }
}

impl std::ops::Not for Boolean {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        Self { value: !self.value }
    }
}

/// The lexical form does not match [the `boolean` grammar](https://www.w3.org/TR/xmlschema11-2/#boolean).
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("invalid boolean lexical form")]
pub struct ParseBooleanError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str() {
        assert_eq!(Boolean::from_str("true").unwrap(), Boolean::from(true));
        assert_eq!(Boolean::from_str("1").unwrap(), Boolean::from(true));
        assert_eq!(Boolean::from_str("false").unwrap(), Boolean::from(false));
        assert_eq!(Boolean::from_str("0").unwrap(), Boolean::from(false));
        assert!(Boolean::from_str("yes").is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Boolean::from(true).to_string(), "true");
        assert_eq!(Boolean::from(false).to_string(), "false");
    }
}
