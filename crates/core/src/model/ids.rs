use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a level (`beginner`, `intermediate`, ...).
///
/// Also the key of persisted progress maps, so it serializes as a bare string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Creates a new `LevelId`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "LevelId".to_string(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LevelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LevelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LevelId({})", self.0)
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for parsing an id from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for LevelId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LevelId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn level_id_trims_input() {
        let id = LevelId::new("  beginner ").unwrap();
        assert_eq!(id.as_str(), "beginner");
        assert_eq!(id.to_string(), "beginner");
    }

    #[test]
    fn level_id_rejects_blank() {
        assert!("   ".parse::<LevelId>().is_err());
        assert!(LevelId::new("").is_err());
    }

    #[test]
    fn level_id_borrows_as_str_for_map_lookup() {
        let mut map = BTreeMap::new();
        map.insert(LevelId::new("expert").unwrap(), 3);
        assert_eq!(map.get("expert"), Some(&3));
    }
}
