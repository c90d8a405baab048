//! Identifier types for worlds and save directories.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a world or a save base.
///
/// A save base groups an overworld with the nested worlds (caves) created
/// from it; every world also has its own id naming its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(Uuid);

impl WorldId {
    /// Creates a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing uuid (for deserialization).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses an id from its hyphenated string form (a directory name).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Returns the underlying uuid.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_ids_are_unique() {
        assert_ne!(WorldId::new(), WorldId::new());
    }

    #[test]
    fn test_world_id_parses_its_display_form() {
        let id = WorldId::new();
        assert_eq!(WorldId::parse(&id.to_string()), Some(id));
        assert_eq!(WorldId::parse("not-a-uuid"), None);
    }
}
