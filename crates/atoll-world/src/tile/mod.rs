//! Tile data model.
//!
//! A [`Tile`] is a tagged value: its [`TileKind`], its absolute position and a
//! per-kind [`TileState`] payload. Capabilities (collision, textures,
//! behaviours) are answered by the static descriptor table in [`descriptor`]
//! and the behaviour functions in [`behavior`], both keyed by kind.

pub mod behavior;
pub mod descriptor;
pub mod registry;
pub mod state;

use atoll_common::coords::TilePos;
use serde::{Deserialize, Serialize};

pub use behavior::{BreakOutcome, Interaction, TileEffect, TileView};
pub use descriptor::{
    descriptor, BreakRule, CollisionBox, StateSchema, TextureSpec, TileDescriptor, Underlay,
};
pub use registry::{build_tile_registry, TileError, TileRegistry, TileResult};
pub use state::TileState;

/// Every tile variant.
///
/// The discriminant indexes the descriptor table and is stable on disk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum TileKind {
    /// Inert tile returned for out-of-range reads
    Empty = 0,
    /// Ocean; blocks movement
    Water = 1,
    /// Beach
    Sand = 2,
    /// Beach with loose stones
    SandWithStones = 3,
    /// Meadow
    Grass = 4,
    /// Tall grass that flattens when walked through
    ShortGrass = 5,
    /// Flower patch
    Flowers = 6,
    /// Red mushroom
    RedMushroom = 7,
    /// Brown mushroom
    BrownMushroom = 8,
    /// Pine tree
    PineTree = 9,
    /// Young pine
    Sapling = 10,
    /// Berry bush
    BerryBush = 11,
    /// Boulder
    Stone = 12,
    /// Campfire
    Campfire = 13,
    /// Hole leading into a cave world
    CaveEntrance = 14,
    /// Walkable cave ground
    CaveFloor = 15,
    /// Solid cave rock
    CaveWall = 16,
    /// Ladder back to the parent world
    CaveExit = 17,
}

impl TileKind {
    /// Number of tile kinds.
    pub const COUNT: usize = 18;

    /// Every kind in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Empty,
        Self::Water,
        Self::Sand,
        Self::SandWithStones,
        Self::Grass,
        Self::ShortGrass,
        Self::Flowers,
        Self::RedMushroom,
        Self::BrownMushroom,
        Self::PineTree,
        Self::Sapling,
        Self::BerryBush,
        Self::Stone,
        Self::Campfire,
        Self::CaveEntrance,
        Self::CaveFloor,
        Self::CaveWall,
        Self::CaveExit,
    ];

    /// Index into per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Static descriptor for this kind.
    #[must_use]
    pub fn descriptor(self) -> &'static TileDescriptor {
        descriptor(self)
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        descriptor(self).name
    }
}

impl std::fmt::Display for TileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    kind: TileKind,
    pos: TilePos,
    state: TileState,
}

impl Tile {
    /// Creates a tile of the given kind with its initial state.
    #[must_use]
    pub fn new(kind: TileKind, pos: TilePos) -> Self {
        Self::placed(kind, pos, 0)
    }

    /// Creates a tile of the given kind whose timed state starts at `now`.
    #[must_use]
    pub fn placed(kind: TileKind, pos: TilePos, now: u64) -> Self {
        Self {
            kind,
            pos,
            state: descriptor(kind).schema.initial(now),
        }
    }

    /// Creates a tile with an explicit state.
    ///
    /// The state is not checked against the kind; use
    /// [`TileRegistry::restore`] for untrusted input.
    #[must_use]
    pub const fn with_state(kind: TileKind, pos: TilePos, state: TileState) -> Self {
        Self { kind, pos, state }
    }

    /// Inert tile at `pos`.
    #[must_use]
    pub const fn empty(pos: TilePos) -> Self {
        Self::with_state(TileKind::Empty, pos, TileState::Plain)
    }

    /// Tile kind.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Absolute position.
    #[must_use]
    pub const fn pos(&self) -> TilePos {
        self.pos
    }

    /// Per-kind state.
    #[must_use]
    pub const fn state(&self) -> &TileState {
        &self.state
    }

    /// Serializable snapshot of the state payload.
    #[must_use]
    pub fn snapshot(&self) -> TileState {
        self.state.clone()
    }

    /// Same tile with a different state.
    #[must_use]
    pub fn with_new_state(&self, state: TileState) -> Self {
        Self::with_state(self.kind, self.pos, state)
    }

    pub(crate) fn set_pos(&mut self, pos: TilePos) {
        self.pos = pos;
    }

    /// Whether the player cannot walk through this tile.
    #[must_use]
    pub fn is_collidable(&self) -> bool {
        descriptor(self.kind).collision.is_some()
    }

    /// Collision rectangle, if collidable.
    #[must_use]
    pub fn collision_box(&self) -> Option<CollisionBox> {
        descriptor(self.kind).collision
    }

    /// Whether a world-space point lies inside this tile's collision rectangle.
    #[must_use]
    pub fn collides_at(&self, x: f32, y: f32) -> bool {
        self.collision_box()
            .is_some_and(|collision| collision.contains(self.pos, x, y))
    }

    /// Movement multiplier while standing on this tile.
    #[must_use]
    pub fn player_speed(&self) -> f32 {
        descriptor(self.kind).player_speed
    }

    /// Whether the interact action does anything on this tile.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        descriptor(self.kind).interactive
    }

    /// Tool requirement, if the tile can be broken.
    #[must_use]
    pub fn break_rule(&self) -> Option<BreakRule> {
        descriptor(self.kind).breakable
    }

    /// Neighbour kinds this tile's texture joins with, if connected-textured.
    #[must_use]
    pub fn connects_to(&self) -> Option<&'static [TileKind]> {
        match descriptor(self.kind).texture {
            TextureSpec::Connected { connects_to, .. } => Some(connects_to),
            _ => None,
        }
    }

    /// Name of the texture currently shown, which may depend on state.
    ///
    /// For connected tiles this is the atlas base name.
    #[must_use]
    pub fn texture_name(&self) -> Option<&'static str> {
        match (&self.state, descriptor(self.kind).texture) {
            (_, TextureSpec::None) => None,
            (_, TextureSpec::Connected { base, .. }) => Some(base),
            (TileState::ShortGrass { trampled_at: Some(_) }, _) => Some("short_grass_trampled"),
            (TileState::Flowers { variant }, _) => Some(match variant % 3 {
                0 => "flowers_0",
                1 => "flowers_1",
                _ => "flowers_2",
            }),
            (TileState::BerryBush { picked_at: Some(_) }, _) => Some("berry_bush_picked"),
            (TileState::Campfire { lit_at: Some(_) }, _) => Some("campfire_lit"),
            (TileState::Campfire { lit_at: None }, _) => Some("campfire_out"),
            (_, TextureSpec::Simple(name)) => Some(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (index, kind) in TileKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
    }

    #[test]
    fn test_new_tile_uses_initial_state() {
        let pos = TilePos::new(3, 4);
        assert_eq!(Tile::new(TileKind::Grass, pos).state(), &TileState::Plain);
        assert_eq!(
            Tile::placed(TileKind::Sapling, pos, 77).state(),
            &TileState::Sapling { planted_at: 77 }
        );
    }

    #[test]
    fn test_texture_follows_state() {
        let pos = TilePos::new(0, 0);
        let bush = Tile::new(TileKind::BerryBush, pos);
        assert_eq!(bush.texture_name(), Some("berry_bush"));
        let picked = bush.with_new_state(TileState::BerryBush { picked_at: Some(5) });
        assert_eq!(picked.texture_name(), Some("berry_bush_picked"));
        assert_eq!(Tile::empty(pos).texture_name(), None);
        assert_eq!(Tile::new(TileKind::Water, pos).texture_name(), Some("water"));
    }

    #[test]
    fn test_stone_collides_over_whole_tile() {
        let stone = Tile::new(TileKind::Stone, TilePos::new(5, 5));
        assert!(stone.collides_at(5.25, 5.25));
        assert!(stone.collides_at(5.0, 5.99));
        assert!(!stone.collides_at(4.9, 5.5));
        assert!(!Tile::new(TileKind::Grass, TilePos::new(5, 5)).collides_at(5.5, 5.5));
    }
}
