//! World tuning parameters.

use atoll_common::coords::WorldSize;
use serde::{Deserialize, Serialize};

/// Idle ticks after which a resident chunk is evicted.
pub const CHUNK_UNLOAD_DELAY: u64 = 600;

/// Ticks between eviction scans.
pub const EVICTION_SCAN_INTERVAL: u64 = 30;

/// Side length of a new overworld, in tiles.
pub const DEFAULT_WORLD_SIZE: u32 = 1024;

/// Side length of a new cave, in tiles.
pub const DEFAULT_CAVE_SIZE: u32 = 256;

/// Streaming and sizing parameters shared by every world of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Size of newly created overworlds
    pub world_size: WorldSize,
    /// Size of newly created caves
    pub cave_size: WorldSize,
    /// Idle ticks before a chunk is evicted
    pub unload_delay: u64,
    /// Ticks between eviction scans
    pub scan_interval: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_size: WorldSize::square(DEFAULT_WORLD_SIZE),
            cave_size: WorldSize::square(DEFAULT_CAVE_SIZE),
            unload_delay: CHUNK_UNLOAD_DELAY,
            scan_interval: EVICTION_SCAN_INTERVAL,
        }
    }
}

impl WorldConfig {
    /// Clamps values into workable ranges.
    pub fn validate(&mut self) {
        self.scan_interval = self.scan_interval.max(1);
        self.unload_delay = self.unload_delay.max(self.scan_interval);
        self.world_size.width = self.world_size.width.max(64);
        self.world_size.height = self.world_size.height.max(64);
        self.cave_size.width = self.cave_size.width.max(32);
        self.cave_size.height = self.cave_size.height.max(32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = WorldConfig::default();
        assert_eq!(config.unload_delay, 600);
        assert_eq!(config.scan_interval, 30);
        assert_eq!(config.world_size, WorldSize::square(1024));
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = WorldConfig {
            scan_interval: 0,
            unload_delay: 0,
            world_size: WorldSize::new(1, 1),
            ..WorldConfig::default()
        };
        config.validate();
        assert_eq!(config.scan_interval, 1);
        assert_eq!(config.unload_delay, 1);
        assert_eq!(config.world_size, WorldSize::square(64));
    }
}
