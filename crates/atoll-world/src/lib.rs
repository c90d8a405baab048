//! # Atoll World
//!
//! The tile world of Atoll:
//! - Tile kinds, per-kind state and behaviour
//! - Chunks and their cached surfaces
//! - Seeded overworld and cave generation
//! - Chunk streaming (background generation, loading and saving)
//! - On-disk persistence
//! - CPU-side rendering of chunks and connected textures
//!
//! ## Threading
//!
//! [`World`] is owned by the main thread. Each world runs three workers: a
//! generator, a loader and a saver. They communicate with the world only
//! through channels; chunks move by value across them and are never shared.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod chunk;
pub mod config;
pub mod generation;
pub mod meta;
pub mod render;
pub mod storage;
pub mod tile;
pub mod world;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chunk::Chunk;
    pub use crate::config::WorldConfig;
    pub use crate::generation::{generator_for, ChunkGenerator, GeneratorWorker};
    pub use crate::meta::{WorldMeta, WorldType};
    pub use crate::render::{
        AssetStore, BlitTarget, Camera, DrawStats, TextureLookup, CHUNK_PIXELS, PLAYER_SPRITES,
        TILE_PIXELS,
    };
    pub use crate::storage::{SaveLayout, StorageError, StorageResult, WorldPaths};
    pub use crate::tile::{
        build_tile_registry, Tile, TileEffect, TileKind, TileRegistry, TileState, TileView,
    };
    pub use crate::world::{World, WorldStats};
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_kind() {
        let registry = build_tile_registry();
        assert!(registry.is_complete());
        assert_eq!(registry.len(), TileKind::COUNT);
    }

    #[test]
    fn test_cave_meta_shares_base() {
        let parent = WorldMeta::overworld(
            "island",
            7,
            atoll_common::coords::WorldSize::square(1024),
        );
        let cave = WorldMeta::cave(
            &parent,
            atoll_common::coords::TilePos::new(10, 10),
            WorldConfig::default().cave_size,
        );
        assert_eq!(cave.base_id, parent.base_id);
        assert_ne!(cave.world_id, parent.world_id);
        assert_eq!(cave.world_type, WorldType::Cave);
    }
}
