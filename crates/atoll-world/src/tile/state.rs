//! Per-tile state payloads.

use atoll_common::ids::WorldId;
use serde::{Deserialize, Serialize};

/// State carried by a tile, tagged by the shape it belongs to.
///
/// Most kinds are [`TileState::Plain`]; the timed kinds remember the tick of
/// their last transition so behaviours can compare it against the clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileState {
    /// No state
    #[default]
    Plain,
    /// Short grass; flattened since the given tick
    ShortGrass {
        /// Tick when last trampled
        trampled_at: Option<u64>,
    },
    /// Flower patch colour
    Flowers {
        /// Colour variant (0..3)
        variant: u8,
    },
    /// Growing sapling
    Sapling {
        /// Tick when planted
        planted_at: u64,
    },
    /// Berry bush; empty since the given tick
    BerryBush {
        /// Tick when last picked
        picked_at: Option<u64>,
    },
    /// Campfire; burning since the given tick
    Campfire {
        /// Tick when lit
        lit_at: Option<u64>,
    },
    /// Cave entrance; remembers the cave it leads to once created
    CaveEntrance {
        /// Id of the cave world
        cave: Option<WorldId>,
    },
}

impl TileState {
    /// Short tag naming the payload shape (for diagnostics).
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::ShortGrass { .. } => "short_grass",
            Self::Flowers { .. } => "flowers",
            Self::Sapling { .. } => "sapling",
            Self::BerryBush { .. } => "berry_bush",
            Self::Campfire { .. } => "campfire",
            Self::CaveEntrance { .. } => "cave_entrance",
        }
    }
}
