//! World metadata.

use atoll_common::coords::{TilePos, WorldSize};
use atoll_common::ids::WorldId;
use serde::{Deserialize, Serialize};

use crate::tile::TileKind;

/// Kind of world, selecting the generator and inert tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldType {
    /// Island surface
    Overworld,
    /// Underground level reached through a cave entrance
    Cave,
}

impl WorldType {
    /// Tile a placeholder chunk is filled with while the real one is pending.
    #[must_use]
    pub const fn placeholder_kind(self) -> TileKind {
        match self {
            Self::Overworld => TileKind::Water,
            Self::Cave => TileKind::CaveFloor,
        }
    }

    /// Tile left behind when something is broken.
    #[must_use]
    pub const fn ground(self) -> TileKind {
        match self {
            Self::Overworld => TileKind::Grass,
            Self::Cave => TileKind::CaveFloor,
        }
    }
}

impl std::fmt::Display for WorldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overworld => write!(f, "overworld"),
            Self::Cave => write!(f, "cave"),
        }
    }
}

/// Persisted description of a world (`world.bin`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMeta {
    /// Display name
    pub name: String,
    /// Save base the world belongs to
    pub base_id: WorldId,
    /// This world's id (its directory name)
    pub world_id: WorldId,
    /// Generation seed
    pub seed: i64,
    /// Size in tiles
    pub size: WorldSize,
    /// World type
    pub world_type: WorldType,
}

impl WorldMeta {
    /// Metadata for a new overworld in a new save base.
    #[must_use]
    pub fn overworld(name: impl Into<String>, seed: i64, size: WorldSize) -> Self {
        let base_id = WorldId::new();
        Self {
            name: name.into(),
            base_id,
            world_id: base_id,
            seed,
            size,
            world_type: WorldType::Overworld,
        }
    }

    /// Metadata for a cave below `parent`, entered at `entrance`.
    ///
    /// The seed mixes the parent seed with the entrance position so that
    /// every entrance leads to a different cave.
    #[must_use]
    pub fn cave(parent: &Self, entrance: TilePos, size: WorldSize) -> Self {
        let position = (i64::from(entrance.x) << 32) ^ i64::from(entrance.y);
        let seed = parent
            .seed
            .wrapping_mul(0x5851_F42D_4C95_7F2D)
            .wrapping_add(position);
        Self {
            name: format!("{} cave {}", parent.name, entrance),
            base_id: parent.base_id,
            world_id: WorldId::new(),
            seed,
            size,
            world_type: WorldType::Cave,
        }
    }

    /// Tile the player appears on when entering this world.
    #[must_use]
    pub const fn spawn_tile(&self) -> TilePos {
        let center = self.size.center_tile();
        match self.world_type {
            WorldType::Overworld => center,
            // Just below the exit ladder.
            WorldType::Cave => center.offset(0, 1),
        }
    }

    /// Real-valued spawn position (tile centre).
    #[must_use]
    pub fn spawn_point(&self) -> (f32, f32) {
        let tile = self.spawn_tile();
        (tile.x as f32 + 0.5, tile.y as f32 + 0.5)
    }
}
