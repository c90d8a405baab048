//! Cave generator.

use atoll_common::coords::{ChunkCoord, LocalCoord, TilePos, WorldSize};

use super::{sub_seeds, ChunkGenerator, NoiseLayer};
use crate::chunk::Chunk;
use crate::meta::WorldType;
use crate::tile::{Tile, TileKind};

/// Tiles per noise unit; finer than the overworld.
pub const CAVE_SCALE: f64 = 1.0 / 12.0;

/// Solid rock ring along the world edge.
const BORDER: i32 = 2;
/// Chebyshev radius of floor around the exit.
const EXIT_CLEARING: i32 = 2;

/// Deterministic cave generator.
#[derive(Debug, Clone)]
pub struct CaveGenerator {
    size: WorldSize,
    noise: NoiseLayer,
}

impl CaveGenerator {
    /// Creates a generator for a cave of `size`.
    #[must_use]
    pub fn new(seed: i64, size: WorldSize) -> Self {
        let [noise] = sub_seeds(seed);
        Self {
            size,
            noise: NoiseLayer::new(noise, CAVE_SCALE),
        }
    }

    /// Kind at a position.
    #[must_use]
    pub fn kind_at(&self, pos: TilePos) -> TileKind {
        if !self.size.contains(pos) {
            return TileKind::CaveWall;
        }
        let center = self.size.center_tile();
        if pos == center {
            return TileKind::CaveExit;
        }
        if (pos.x - center.x).abs() <= EXIT_CLEARING && (pos.y - center.y).abs() <= EXIT_CLEARING {
            return TileKind::CaveFloor;
        }
        let width = self.size.width as i32;
        let height = self.size.height as i32;
        if pos.x < BORDER || pos.y < BORDER || pos.x >= width - BORDER || pos.y >= height - BORDER {
            return TileKind::CaveWall;
        }
        if self.noise.sample(f64::from(pos.x), f64::from(pos.y)) < 1.0 {
            TileKind::CaveFloor
        } else {
            TileKind::CaveWall
        }
    }
}

impl ChunkGenerator for CaveGenerator {
    fn generate(&self, coord: ChunkCoord) -> Chunk {
        let tiles = LocalCoord::all()
            .map(|local| {
                let pos = coord.tile(local);
                Tile::new(self.kind_at(pos), pos)
            })
            .collect();
        Chunk::from_tiles(coord, tiles)
    }

    fn world_type(&self) -> WorldType {
        WorldType::Cave
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_sits_in_a_clearing() {
        let generator = CaveGenerator::new(77, WorldSize::square(256));
        let center = TilePos::new(128, 128);
        assert_eq!(generator.kind_at(center), TileKind::CaveExit);
        for dy in -2..=2 {
            for dx in -2..=2 {
                if (dx, dy) != (0, 0) {
                    assert_eq!(generator.kind_at(center.offset(dx, dy)), TileKind::CaveFloor);
                }
            }
        }
    }

    #[test]
    fn test_border_is_wall() {
        let generator = CaveGenerator::new(77, WorldSize::square(256));
        for i in 0..256 {
            assert_eq!(generator.kind_at(TilePos::new(i, 0)), TileKind::CaveWall);
            assert_eq!(generator.kind_at(TilePos::new(255, i)), TileKind::CaveWall);
        }
    }

    #[test]
    fn test_caves_mix_floor_and_wall() {
        let generator = CaveGenerator::new(3, WorldSize::square(256));
        let kinds: Vec<TileKind> = (2..14)
            .flat_map(|x| generator.generate(ChunkCoord::new(x, x)).tiles().to_vec())
            .map(|tile| tile.kind())
            .collect();
        assert!(kinds.contains(&TileKind::CaveFloor));
        assert!(kinds.contains(&TileKind::CaveWall));
    }
}
