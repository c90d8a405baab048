//! Tile factory table.
//!
//! Loading a chunk turns `(TileKind, TileState)` pairs back into tiles. The
//! registry is the only place that does so for untrusted data: it refuses
//! kinds that were never registered and payloads of the wrong shape.

use ahash::AHashMap;
use atoll_common::coords::TilePos;
use thiserror::Error;

use super::descriptor::{descriptor, StateSchema};
use super::state::TileState;
use super::{Tile, TileKind};

/// Tile reconstruction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileError {
    /// Kind has no registered factory
    #[error("Tile kind {0:?} is not registered")]
    UnknownKind(TileKind),

    /// Payload does not have the shape the kind expects
    #[error("Tile kind {kind:?} cannot hold a {state} state")]
    StateMismatch {
        /// Kind being restored
        kind: TileKind,
        /// Tag of the offending payload
        state: &'static str,
    },
}

/// Result type for tile reconstruction.
pub type TileResult<T> = Result<T, TileError>;

#[derive(Debug, Clone, Copy)]
struct TileFactory {
    schema: StateSchema,
}

/// Table from tile kind to its constructor.
#[derive(Debug, Default)]
pub struct TileRegistry {
    factories: AHashMap<TileKind, TileFactory>,
}

impl TileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind. Registering twice keeps the first entry.
    pub fn register(&mut self, kind: TileKind) {
        self.factories.entry(kind).or_insert(TileFactory {
            schema: descriptor(kind).schema,
        });
    }

    /// Whether a kind is registered.
    #[must_use]
    pub fn contains(&self, kind: TileKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Whether every kind is registered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        TileKind::ALL.iter().all(|kind| self.contains(*kind))
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Constructs a fresh tile.
    ///
    /// # Panics
    /// Panics if the kind is not registered.
    #[must_use]
    pub fn create(&self, kind: TileKind, pos: TilePos, now: u64) -> Tile {
        let Some(factory) = self.factories.get(&kind) else {
            panic!("tile kind {kind:?} used before registration");
        };
        Tile::with_state(kind, pos, factory.schema.initial(now))
    }

    /// Reconstructs a tile from a persisted payload.
    pub fn restore(&self, kind: TileKind, pos: TilePos, state: TileState) -> TileResult<Tile> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or(TileError::UnknownKind(kind))?;
        if !factory.schema.accepts(&state) {
            return Err(TileError::StateMismatch {
                kind,
                state: state.tag(),
            });
        }
        Ok(Tile::with_state(kind, pos, state))
    }
}

/// Builds the registry with every tile kind.
#[must_use]
pub fn build_tile_registry() -> TileRegistry {
    let mut registry = TileRegistry::new();
    registry.register(TileKind::Empty);
    registry.register(TileKind::Water);
    registry.register(TileKind::Sand);
    registry.register(TileKind::SandWithStones);
    registry.register(TileKind::Grass);
    registry.register(TileKind::ShortGrass);
    registry.register(TileKind::Flowers);
    registry.register(TileKind::RedMushroom);
    registry.register(TileKind::BrownMushroom);
    registry.register(TileKind::PineTree);
    registry.register(TileKind::Sapling);
    registry.register(TileKind::BerryBush);
    registry.register(TileKind::Stone);
    registry.register(TileKind::Campfire);
    registry.register(TileKind::CaveEntrance);
    registry.register(TileKind::CaveFloor);
    registry.register(TileKind::CaveWall);
    registry.register(TileKind::CaveExit);
    registry
}
