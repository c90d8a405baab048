//! Tile behaviours: per-tick updates, interaction, collision reactions,
//! breaking and placing.
//!
//! Behaviours are pure functions of a tile and a read-only [`TileView`]. They
//! return replacement tiles and effects; the world applies the writes so that
//! dirty tracking and redraw propagation stay in one place.

use atoll_common::coords::TilePos;
use atoll_common::ids::WorldId;
use atoll_common::items::{ItemKind, ItemStack, Tool};

use super::descriptor::descriptor;
use super::registry::TileRegistry;
use super::state::TileState;
use super::{Tile, TileKind};
use crate::meta::WorldType;

/// Ticks before trampled short grass stands back up.
pub const SHORT_GRASS_RECOVERY_TICKS: u64 = 600;
/// Ticks before a sapling grows into a pine tree.
pub const SAPLING_GROWTH_TICKS: u64 = 3600;
/// Ticks before a picked berry bush bears fruit again.
pub const BERRY_REGROWTH_TICKS: u64 = 1800;
/// Ticks a campfire burns once lit.
pub const CAMPFIRE_BURN_TICKS: u64 = 2400;

/// Berries handed out per pick.
pub const BERRIES_PER_PICK: u32 = 2;

/// Read access to the world for tile behaviours and drawing.
pub trait TileView {
    /// Resident tile at `pos`, without side effects.
    fn peek_block(&self, pos: TilePos) -> Option<&Tile>;

    /// Current tick.
    fn now(&self) -> u64;

    /// Type of the world being viewed.
    fn world_type(&self) -> WorldType;

    /// Whether any Moore neighbour of `pos` has a kind in `kinds`.
    fn block_neighboring_with(&self, pos: TilePos, kinds: &[TileKind]) -> bool {
        pos.neighbors8().into_iter().any(|neighbor| {
            self.peek_block(neighbor)
                .is_some_and(|tile| kinds.contains(&tile.kind()))
        })
    }
}

/// Something a behaviour asks the game session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEffect {
    /// Add items to the player's inventory
    GiveItem(ItemStack),
    /// Descend into the cave behind an entrance
    EnterCave {
        /// Entrance position in the current world
        entrance: TilePos,
        /// Cave world, if one was created before
        cave: Option<WorldId>,
    },
    /// Leave the current cave
    ExitCave,
}

/// Result of interacting with or colliding into a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interaction {
    /// New tile to write in place of the old one
    pub replacement: Option<Tile>,
    /// Effects for the session
    pub effects: Vec<TileEffect>,
}

/// Result of breaking a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakOutcome {
    /// Tile left behind
    pub replacement: Tile,
    /// Items dropped
    pub drops: Vec<ItemStack>,
}

fn elapsed(now: u64, since: u64, ticks: u64) -> bool {
    now.saturating_sub(since) >= ticks
}

/// Per-tick update. Returns a replacement tile when the state changes.
#[must_use]
pub fn update(tile: &Tile, view: &dyn TileView) -> Option<Tile> {
    let now = view.now();
    match *tile.state() {
        TileState::ShortGrass {
            trampled_at: Some(at),
        } if elapsed(now, at, SHORT_GRASS_RECOVERY_TICKS) => {
            Some(tile.with_new_state(TileState::ShortGrass { trampled_at: None }))
        }
        TileState::Sapling { planted_at } if elapsed(now, planted_at, SAPLING_GROWTH_TICKS) => {
            // Crowded saplings wait until the neighbouring tree is gone.
            if view.block_neighboring_with(tile.pos(), &[TileKind::PineTree]) {
                None
            } else {
                Some(Tile::new(TileKind::PineTree, tile.pos()))
            }
        }
        TileState::BerryBush {
            picked_at: Some(at),
        } if elapsed(now, at, BERRY_REGROWTH_TICKS) => {
            Some(tile.with_new_state(TileState::BerryBush { picked_at: None }))
        }
        TileState::Campfire { lit_at: Some(at) } if elapsed(now, at, CAMPFIRE_BURN_TICKS) => {
            Some(tile.with_new_state(TileState::Campfire { lit_at: None }))
        }
        _ => None,
    }
}

/// Interact action on a tile.
#[must_use]
pub fn interact(tile: &Tile, now: u64) -> Interaction {
    match (tile.kind(), tile.state()) {
        (TileKind::BerryBush, TileState::BerryBush { picked_at: None }) => Interaction {
            replacement: Some(tile.with_new_state(TileState::BerryBush {
                picked_at: Some(now),
            })),
            effects: vec![TileEffect::GiveItem(ItemStack::new(
                ItemKind::Berries,
                BERRIES_PER_PICK,
            ))],
        },
        (TileKind::Campfire, TileState::Campfire { lit_at: None }) => Interaction {
            replacement: Some(tile.with_new_state(TileState::Campfire { lit_at: Some(now) })),
            effects: Vec::new(),
        },
        (TileKind::CaveEntrance, &TileState::CaveEntrance { cave }) => Interaction {
            replacement: None,
            effects: vec![TileEffect::EnterCave {
                entrance: tile.pos(),
                cave,
            }],
        },
        (TileKind::CaveExit, _) => Interaction {
            replacement: None,
            effects: vec![TileEffect::ExitCave],
        },
        _ => Interaction::default(),
    }
}

/// The player stands on or walks through a tile.
#[must_use]
pub fn collide(tile: &Tile, now: u64) -> Interaction {
    match tile.state() {
        TileState::ShortGrass { trampled_at: None } => Interaction {
            replacement: Some(tile.with_new_state(TileState::ShortGrass {
                trampled_at: Some(now),
            })),
            effects: Vec::new(),
        },
        _ => Interaction::default(),
    }
}

/// Breaks a tile with `tool`. Returns `None` when the tile cannot be broken
/// or the tool is too weak.
#[must_use]
pub fn break_tile(tile: &Tile, tool: Tool, world_type: WorldType) -> Option<BreakOutcome> {
    let rule = descriptor(tile.kind()).breakable?;
    if !tool.satisfies(rule.family, rule.min_strength) {
        return None;
    }

    let pos = tile.pos();
    let ground = Tile::new(world_type.ground(), pos);
    let (replacement, drops) = match tile.kind() {
        TileKind::SandWithStones => (
            Tile::new(TileKind::Sand, pos),
            vec![ItemStack::one(ItemKind::Stone)],
        ),
        TileKind::ShortGrass => (ground, Vec::new()),
        TileKind::Flowers => (ground, vec![ItemStack::one(ItemKind::Flower)]),
        TileKind::RedMushroom | TileKind::BrownMushroom => {
            (ground, vec![ItemStack::one(ItemKind::Mushroom)])
        }
        TileKind::PineTree => (
            ground,
            vec![
                ItemStack::new(ItemKind::Wood, 3),
                ItemStack::one(ItemKind::Sapling),
            ],
        ),
        TileKind::Sapling => (ground, vec![ItemStack::one(ItemKind::Sapling)]),
        TileKind::BerryBush => {
            let mut drops = vec![ItemStack::one(ItemKind::Wood)];
            if matches!(tile.state(), TileState::BerryBush { picked_at: None }) {
                drops.push(ItemStack::new(ItemKind::Berries, BERRIES_PER_PICK));
            }
            (ground, drops)
        }
        TileKind::Stone => (ground, vec![ItemStack::one(ItemKind::Stone)]),
        TileKind::Campfire => (ground, vec![ItemStack::one(ItemKind::Campfire)]),
        TileKind::CaveWall => (
            Tile::new(TileKind::CaveFloor, pos),
            vec![ItemStack::one(ItemKind::Stone)],
        ),
        _ => (ground, Vec::new()),
    };
    Some(BreakOutcome { replacement, drops })
}

/// Tile kind produced by placing an item, if it can be placed.
#[must_use]
pub const fn placement(item: ItemKind) -> Option<TileKind> {
    match item {
        ItemKind::Sapling => Some(TileKind::Sapling),
        ItemKind::Berries => Some(TileKind::BerryBush),
        ItemKind::Stone => Some(TileKind::Stone),
        ItemKind::Campfire => Some(TileKind::Campfire),
        _ => None,
    }
}

/// Tile created by placing `item` at `pos` at tick `now`.
#[must_use]
pub fn placed_tile(registry: &TileRegistry, item: ItemKind, pos: TilePos, now: u64) -> Option<Tile> {
    let kind = placement(item)?;
    let tile = match kind {
        // A planted berry starts as a bare bush.
        TileKind::BerryBush => Tile::with_state(
            kind,
            pos,
            TileState::BerryBush {
                picked_at: Some(now),
            },
        ),
        _ => registry.create(kind, pos, now),
    };
    Some(tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;
    use atoll_common::items::ToolFamily;

    use crate::tile::build_tile_registry;

    struct FakeView {
        tiles: AHashMap<TilePos, Tile>,
        now: u64,
    }

    impl FakeView {
        fn new(now: u64) -> Self {
            Self {
                tiles: AHashMap::new(),
                now,
            }
        }
    }

    impl TileView for FakeView {
        fn peek_block(&self, pos: TilePos) -> Option<&Tile> {
            self.tiles.get(&pos)
        }

        fn now(&self) -> u64 {
            self.now
        }

        fn world_type(&self) -> WorldType {
            WorldType::Overworld
        }
    }

    #[test]
    fn test_trampled_grass_recovers() {
        let pos = TilePos::new(1, 1);
        let trampled = collide(&Tile::new(TileKind::ShortGrass, pos), 100)
            .replacement
            .expect("short grass tramples");
        assert_eq!(
            trampled.state(),
            &TileState::ShortGrass {
                trampled_at: Some(100)
            }
        );
        assert!(update(&trampled, &FakeView::new(699)).is_none());
        let recovered = update(&trampled, &FakeView::new(700)).expect("recovers");
        assert_eq!(recovered.state(), &TileState::ShortGrass { trampled_at: None });
    }

    #[test]
    fn test_sapling_grows_unless_crowded() {
        let pos = TilePos::new(10, 10);
        let sapling = Tile::placed(TileKind::Sapling, pos, 0);
        let mut view = FakeView::new(SAPLING_GROWTH_TICKS);
        assert_eq!(
            update(&sapling, &view).map(|tile| tile.kind()),
            Some(TileKind::PineTree)
        );

        let beside = pos.offset(1, 1);
        view.tiles.insert(beside, Tile::new(TileKind::PineTree, beside));
        assert!(update(&sapling, &view).is_none());
    }

    #[test]
    fn test_berry_bush_pick_and_regrow() {
        let bush = Tile::new(TileKind::BerryBush, TilePos::new(0, 0));
        let picked = interact(&bush, 50);
        assert_eq!(
            picked.effects,
            vec![TileEffect::GiveItem(ItemStack::new(ItemKind::Berries, 2))]
        );
        let empty = picked.replacement.expect("bush is emptied");
        assert!(interact(&empty, 60).effects.is_empty());
        assert!(update(&empty, &FakeView::new(50 + BERRY_REGROWTH_TICKS)).is_some());
    }

    #[test]
    fn test_campfire_burns_out_and_relights() {
        let fire = Tile::placed(TileKind::Campfire, TilePos::new(0, 0), 0);
        let out = update(&fire, &FakeView::new(CAMPFIRE_BURN_TICKS)).expect("burns out");
        assert_eq!(out.state(), &TileState::Campfire { lit_at: None });
        let lit = interact(&out, 9000).replacement.expect("relights");
        assert_eq!(lit.state(), &TileState::Campfire { lit_at: Some(9000) });
    }

    #[test]
    fn test_cave_tiles_emit_travel_effects() {
        let entrance = Tile::new(TileKind::CaveEntrance, TilePos::new(4, 4));
        assert_eq!(
            interact(&entrance, 0).effects,
            vec![TileEffect::EnterCave {
                entrance: TilePos::new(4, 4),
                cave: None
            }]
        );
        let exit = Tile::new(TileKind::CaveExit, TilePos::new(0, 0));
        assert_eq!(interact(&exit, 0).effects, vec![TileEffect::ExitCave]);
    }

    #[test]
    fn test_break_requires_tool() {
        let tree = Tile::new(TileKind::PineTree, TilePos::new(2, 2));
        assert!(break_tile(&tree, Tool::HAND, WorldType::Overworld).is_none());
        let axe = Tool {
            family: ToolFamily::Axe,
            strength: 1,
        };
        let outcome = break_tile(&tree, axe, WorldType::Overworld).expect("axe fells trees");
        assert_eq!(outcome.replacement.kind(), TileKind::Grass);
        assert_eq!(outcome.drops.len(), 2);

        let wall = Tile::new(TileKind::CaveWall, TilePos::new(2, 2));
        let pickaxe = Tool {
            family: ToolFamily::Pickaxe,
            strength: 1,
        };
        let outcome = break_tile(&wall, pickaxe, WorldType::Cave).expect("pickaxe mines");
        assert_eq!(outcome.replacement.kind(), TileKind::CaveFloor);
        assert!(break_tile(&Tile::new(TileKind::Water, TilePos::new(0, 0)), pickaxe, WorldType::Overworld).is_none());
    }

    #[test]
    fn test_placement() {
        let registry = build_tile_registry();
        let bush = placed_tile(&registry, ItemKind::Berries, TilePos::new(1, 2), 30).expect("placeable");
        assert_eq!(bush.state(), &TileState::BerryBush { picked_at: Some(30) });
        let sapling = placed_tile(&registry, ItemKind::Sapling, TilePos::new(1, 2), 30).expect("placeable");
        assert_eq!(sapling.state(), &TileState::Sapling { planted_at: 30 });
        assert!(placed_tile(&registry, ItemKind::Wood, TilePos::new(1, 2), 30).is_none());
    }
}
