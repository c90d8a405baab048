//! Island overworld generator.
//!
//! Three passes per tile: base terrain from masked height noise, vegetation
//! on interior grass and stones on sand, then at most one cave entrance per
//! chunk.

use atoll_common::coords::{ChunkCoord, LocalCoord, TilePos, WorldSize};

use super::{position_rng, sub_seeds, ChunkGenerator, NoiseLayer};
use crate::chunk::Chunk;
use crate::meta::WorldType;
use crate::tile::{Tile, TileKind, TileState};

/// Tiles per noise unit.
pub const OVERWORLD_SCALE: f64 = 1.0 / 48.0;
/// Heights up to this are water.
pub const WATER_LEVEL: f64 = 1.0;
/// Heights up to this (and above water) are sand.
pub const SAND_LEVEL: f64 = 1.1;
/// Chance that a chunk holds a cave entrance.
pub const CAVE_CHANCE: f64 = 0.05;

/// Chebyshev radius of plain grass around the world centre.
const SPAWN_CLEARING: i32 = 2;

/// Local positions tried in order when placing a cave entrance.
const CAVE_CANDIDATES: [(u32, u32); 9] = [
    (8, 8),
    (4, 4),
    (11, 4),
    (4, 11),
    (11, 11),
    (8, 3),
    (3, 8),
    (12, 8),
    (8, 12),
];

/// Deterministic overworld generator.
#[derive(Debug, Clone)]
pub struct OverworldGenerator {
    size: WorldSize,
    base: NoiseLayer,
    secondary: NoiseLayer,
}

impl OverworldGenerator {
    /// Creates a generator for a world of `size`.
    #[must_use]
    pub fn new(seed: i64, size: WorldSize) -> Self {
        // The third sub-seed belongs to the unused mountain layer.
        let [base, secondary, _] = sub_seeds::<3>(seed);
        Self {
            size,
            base: NoiseLayer::new(base, OVERWORLD_SCALE),
            secondary: NoiseLayer::new(secondary, OVERWORLD_SCALE),
        }
    }

    /// Masked terrain height at a tile, in `[0, 2]`.
    ///
    /// Zero outside a circle of radius `size / 2.5` around the centre; inside
    /// it the raw noise is lowered linearly towards the rim.
    #[must_use]
    pub fn base_height(&self, x: i32, y: i32) -> f64 {
        let (x, y) = (f64::from(x), f64::from(y));
        let (cx, cy) = self.size.center();
        let distance = (x - cx).hypot(y - cy);
        let radius = f64::from(self.size.width.min(self.size.height)) / 2.5;
        if distance > radius {
            return 0.0;
        }
        let raw = self.base.sample(x, y);
        (raw - distance / radius / 1.5).max(0.0)
    }

    /// Terrain kind before features.
    #[must_use]
    pub fn base_kind(&self, pos: TilePos) -> TileKind {
        if !self.size.contains(pos) {
            return TileKind::Water;
        }
        match self.base_height(pos.x, pos.y) {
            h if h <= WATER_LEVEL => TileKind::Water,
            h if h <= SAND_LEVEL => TileKind::Sand,
            _ => TileKind::Grass,
        }
    }

    fn in_spawn_clearing(&self, pos: TilePos) -> bool {
        let center = self.size.center_tile();
        (pos.x - center.x).abs() <= SPAWN_CLEARING && (pos.y - center.y).abs() <= SPAWN_CLEARING
    }

    fn interior_grass(&self, pos: TilePos) -> bool {
        self.base_kind(pos) == TileKind::Grass
            && pos
                .neighbors8()
                .into_iter()
                .all(|neighbor| self.base_kind(neighbor) == TileKind::Grass)
    }

    /// Final tile at a position, excluding cave entrances.
    #[must_use]
    pub fn surface_tile(&self, pos: TilePos) -> Tile {
        if self.in_spawn_clearing(pos) {
            return Tile::new(TileKind::Grass, pos);
        }
        match self.base_kind(pos) {
            TileKind::Grass if self.interior_grass(pos) => self.vegetation(pos),
            TileKind::Sand => {
                let mut rng = self.tile_rng(pos);
                if rng.f64() < 0.03 {
                    Tile::new(TileKind::SandWithStones, pos)
                } else {
                    Tile::new(TileKind::Sand, pos)
                }
            }
            kind => Tile::new(kind, pos),
        }
    }

    fn tile_rng(&self, pos: TilePos) -> fastrand::Rng {
        let value = self
            .secondary
            .sample(f64::from(pos.x) + 0.5, f64::from(pos.y) + 0.5);
        position_rng(value, pos.x, pos.y)
    }

    fn vegetation(&self, pos: TilePos) -> Tile {
        let value = self.secondary.sample(f64::from(pos.x), f64::from(pos.y));
        if value <= 0.9 {
            return Tile::new(TileKind::Grass, pos);
        }
        if value > 1.3 {
            return Tile::new(TileKind::PineTree, pos);
        }

        let mut rng = self.tile_rng(pos);
        let roll = rng.f64();
        if roll < 0.015 {
            if rng.bool() {
                Tile::new(TileKind::RedMushroom, pos)
            } else {
                Tile::new(TileKind::BrownMushroom, pos)
            }
        } else if roll < 0.075 {
            let variant = rng.u8(0..3);
            Tile::with_state(TileKind::Flowers, pos, TileState::Flowers { variant })
        } else if rng.f64() < 0.02 {
            Tile::new(TileKind::BerryBush, pos)
        } else {
            Tile::new(TileKind::ShortGrass, pos)
        }
    }

    /// Cave entrance position for a chunk, if it gets one.
    #[must_use]
    pub fn cave_entrance(&self, coord: ChunkCoord) -> Option<TilePos> {
        let origin = coord.origin();
        let value = self
            .secondary
            .sample(f64::from(origin.x) + 0.25, f64::from(origin.y) + 0.25);
        let mut rng = position_rng(value, coord.x, coord.y);
        if rng.f64() >= CAVE_CHANCE {
            return None;
        }
        CAVE_CANDIDATES
            .iter()
            .map(|&(x, y)| coord.tile(LocalCoord::new(x, y)))
            .find(|&pos| {
                self.size.contains(pos) && !self.in_spawn_clearing(pos) && self.interior_grass(pos)
            })
    }
}

impl ChunkGenerator for OverworldGenerator {
    fn generate(&self, coord: ChunkCoord) -> Chunk {
        let tiles = LocalCoord::all()
            .map(|local| self.surface_tile(coord.tile(local)))
            .collect();
        let mut chunk = Chunk::from_tiles(coord, tiles);
        if let Some(pos) = self.cave_entrance(coord) {
            chunk.set_tile(pos.local(), Tile::new(TileKind::CaveEntrance, pos), 0);
            chunk.mark_clean();
        }
        chunk
    }

    fn world_type(&self) -> WorldType {
        WorldType::Overworld
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::codec::encode_chunk;
    use proptest::prelude::*;

    fn island(seed: i64) -> OverworldGenerator {
        OverworldGenerator::new(seed, WorldSize::square(1024))
    }

    #[test]
    fn test_seed_one_spot_check() {
        let generator = island(1);
        assert_eq!(generator.base_kind(TilePos::new(512, 512)), TileKind::Grass);
        assert!(generator.base_height(512, 512) > SAND_LEVEL);
        assert_eq!(generator.surface_tile(TilePos::new(512, 512)).kind(), TileKind::Grass);
        assert_eq!(generator.base_kind(TilePos::new(0, 0)), TileKind::Water);
        assert_eq!(generator.surface_tile(TilePos::new(0, 0)).kind(), TileKind::Water);
    }

    #[test]
    fn test_generated_chunks_are_clean() {
        let chunk = island(1).generate(ChunkCoord::new(32, 32));
        assert!(!chunk.is_dirty());
        assert!(chunk.needs_redraw());
        assert!(!chunk.is_placeholder());
    }

    #[test]
    fn test_mask_centre_is_raw_noise() {
        let generator = island(5);
        let raw = generator.base.sample(512.0, 512.0);
        assert!((generator.base_height(512, 512) - raw).abs() < 1e-12);
    }

    #[test]
    fn test_vegetation_only_on_interior_grass() {
        let generator = island(3);
        for coord in [ChunkCoord::new(30, 30), ChunkCoord::new(20, 32), ChunkCoord::new(40, 25)] {
            let chunk = generator.generate(coord);
            for tile in chunk.tiles() {
                let decorated = matches!(
                    tile.kind(),
                    TileKind::ShortGrass
                        | TileKind::Flowers
                        | TileKind::RedMushroom
                        | TileKind::BrownMushroom
                        | TileKind::PineTree
                        | TileKind::BerryBush
                        | TileKind::CaveEntrance
                );
                if decorated {
                    assert!(generator.interior_grass(tile.pos()), "{tile:?}");
                }
            }
        }
    }

    #[test]
    fn test_cave_entrances_appear_somewhere() {
        let generator = island(11);
        let found = (20..44)
            .flat_map(|x| (20..44).map(move |y| ChunkCoord::new(x, y)))
            .filter_map(|coord| generator.cave_entrance(coord))
            .count();
        assert!(found > 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(4))]

        #[test]
        fn prop_outside_mask_is_water(angle in 0.0f64..std::f64::consts::TAU, extra in 1.0f64..100.0) {
            let generator = island(9);
            let radius = 1024.0 / 2.5 + extra;
            let x = (512.0 + radius * angle.cos()).round() as i32;
            let y = (512.0 + radius * angle.sin()).round() as i32;
            let pos = TilePos::new(x, y);
            prop_assume!((f64::from(x) - 512.0).hypot(f64::from(y) - 512.0) > 1024.0 / 2.5);
            prop_assert_eq!(generator.base_height(x, y), 0.0);
            prop_assert_eq!(generator.surface_tile(pos).kind(), TileKind::Water);
        }

        #[test]
        fn prop_generation_is_deterministic(
            coords in proptest::collection::vec((0i32..64, 0i32..64), 250),
            seed in any::<i64>(),
        ) {
            let first = OverworldGenerator::new(seed, WorldSize::square(1024));
            let second = OverworldGenerator::new(seed, WorldSize::square(1024));
            for (x, y) in coords {
                let coord = ChunkCoord::new(x, y);
                let a = encode_chunk(&first.generate(coord)).expect("encode");
                let b = encode_chunk(&second.generate(coord)).expect("encode");
                prop_assert_eq!(a, b);
            }
        }
    }
}
