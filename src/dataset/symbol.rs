use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hyphen-joined hex code points naming one selectable emoji, e.g. `1f468-200d-1f373`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(Arc<str>); // Arc<str> keeps clones cheap across sessions

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolIdError {
    #[error("empty symbol identifier")]
    Empty,
    #[error("invalid code point segment '{segment}' in '{raw}'")]
    BadSegment { raw: String, segment: String },
}

impl SymbolId {
    pub fn parse(raw: &str) -> Result<Self, SymbolIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SymbolIdError::Empty);
        }

        let normalized = raw.to_ascii_lowercase();
        for segment in normalized.split('-') {
            let valid = !segment.is_empty()
                && segment.len() <= 6
                && segment.bytes().all(|b| b.is_ascii_hexdigit())
                && u32::from_str_radix(segment, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .is_some();
            if !valid {
                return Err(SymbolIdError::BadSegment {
                    raw: raw.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        Ok(Self(normalized.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn code_points(&self) -> impl Iterator<Item = &str> {
        self.0.split('-')
    }

    /// Renders the identifier as the emoji text it encodes.
    pub fn to_emoji(&self) -> String {
        // Segments were validated in `parse`.
        self.code_points()
            .filter_map(|cp| u32::from_str_radix(cp, 16).ok())
            .filter_map(char::from_u32)
            .collect()
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SymbolId {
    type Err = SymbolIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SymbolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SymbolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SymbolId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
