//! Version types for schema compatibility.

use serde::{Deserialize, Serialize};

/// Schema version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (bug fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current chunk file version.
    pub const CHUNK: Self = Self::new(1, 0, 0);

    /// Current world metadata version.
    pub const WORLD_META: Self = Self::new(1, 0, 0);

    /// Current player stack version.
    pub const PLAYER: Self = Self::new(1, 0, 0);

    /// Current inventory version.
    pub const INVENTORY: Self = Self::new(1, 0, 0);

    /// Checks if this version can read data written by another version.
    #[must_use]
    pub const fn can_read(&self, data_version: &Self) -> bool {
        self.major == data_version.major
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Magic bytes for file format identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicBytes(pub [u8; 4]);

impl MagicBytes {
    /// Chunk file magic bytes.
    pub const CHUNK: Self = Self(*b"ATCH");

    /// World metadata magic bytes.
    pub const WORLD: Self = Self(*b"ATWD");

    /// Player stack magic bytes.
    pub const PLAYER: Self = Self(*b"ATPL");

    /// Inventory magic bytes.
    pub const INVENTORY: Self = Self(*b"ATIV");
}
