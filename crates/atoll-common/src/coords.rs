//! Coordinate types for tile, chunk, and local positions.
//!
//! Tile coordinates are absolute grid positions. Chunk coordinates are tile
//! coordinates divided by [`CHUNK_SIZE`]. Local coordinates address a tile
//! inside its chunk.

use serde::{Deserialize, Serialize};

/// Width and height of a chunk in tiles.
pub const CHUNK_SIZE: u32 = 16;

/// Number of tiles in a chunk.
pub const CHUNK_TILES: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Absolute tile coordinate.
///
/// Signed so that neighbour arithmetic at the world border stays total;
/// anything negative is simply out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// X coordinate in tiles
    pub x: i32,
    /// Y coordinate in tiles
    pub y: i32,
}

impl TilePos {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a real-valued position.
    #[must_use]
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Returns the chunk this tile belongs to.
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        let size = CHUNK_SIZE as i32;
        ChunkCoord {
            x: self.x.div_euclid(size),
            y: self.y.div_euclid(size),
        }
    }

    /// Returns the position of this tile inside its chunk.
    #[must_use]
    pub const fn local(self) -> LocalCoord {
        let size = CHUNK_SIZE as i32;
        LocalCoord {
            x: self.x.rem_euclid(size) as u8,
            y: self.y.rem_euclid(size) as u8,
        }
    }

    /// Returns this position shifted by the given offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Cardinal neighbours in left, right, top, bottom order.
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// Moore neighbourhood (all eight surrounding tiles), row-major.
    #[must_use]
    pub const fn neighbors8(self) -> [Self; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left tile of the chunk.
    #[must_use]
    pub const fn origin(self) -> TilePos {
        let size = CHUNK_SIZE as i32;
        TilePos {
            x: self.x * size,
            y: self.y * size,
        }
    }

    /// Absolute position of a local coordinate in this chunk.
    #[must_use]
    pub const fn tile(self, local: LocalCoord) -> TilePos {
        let origin = self.origin();
        TilePos {
            x: origin.x + local.x as i32,
            y: origin.y + local.y as i32,
        }
    }

    /// Orthogonal neighbours in left, right, top, bottom order.
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            Self::new(self.x - 1, self.y),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y - 1),
            Self::new(self.x, self.y + 1),
        ]
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Local coordinate within a chunk (0 to [`CHUNK_SIZE`] - 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalCoord {
    /// X coordinate within chunk
    pub x: u8,
    /// Y coordinate within chunk
    pub y: u8,
}

impl LocalCoord {
    /// Creates a new local coordinate.
    ///
    /// # Panics
    /// Panics if either component is outside `[0, CHUNK_SIZE)`.
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        assert!(
            x < CHUNK_SIZE && y < CHUNK_SIZE,
            "local coordinate ({x}, {y}) outside chunk of size {CHUNK_SIZE}"
        );
        Self {
            x: x as u8,
            y: y as u8,
        }
    }

    /// Converts to linear (row-major) index for array access.
    #[must_use]
    pub const fn to_index(self) -> usize {
        (self.y as usize) * (CHUNK_SIZE as usize) + (self.x as usize)
    }

    /// Creates from linear (row-major) index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        let size = CHUNK_SIZE as usize;
        Self {
            x: (index % size) as u8,
            y: (index / size) as u8,
        }
    }

    /// Iterates every local coordinate in row-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..CHUNK_TILES).map(Self::from_index)
    }
}

/// World dimensions in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSize {
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
}

impl WorldSize {
    /// Creates a new world size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square world of the given side length.
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Whether the tile lies inside the world.
    #[must_use]
    pub const fn contains(self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Whether the real-valued position lies inside the world.
    #[must_use]
    pub fn contains_f32(self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32
    }

    /// Number of chunk columns.
    #[must_use]
    pub const fn chunks_x(self) -> u32 {
        self.width.div_ceil(CHUNK_SIZE)
    }

    /// Number of chunk rows.
    #[must_use]
    pub const fn chunks_y(self) -> u32 {
        self.height.div_ceil(CHUNK_SIZE)
    }

    /// Whether the chunk overlaps the world.
    #[must_use]
    pub const fn contains_chunk(self, coord: ChunkCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.chunks_x()
            && (coord.y as u32) < self.chunks_y()
    }

    /// Centre of the world in tile units.
    #[must_use]
    pub fn center(self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Centre tile of the world.
    #[must_use]
    pub const fn center_tile(self) -> TilePos {
        TilePos::new((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

impl std::fmt::Display for WorldSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
