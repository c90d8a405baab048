//! Chunk: a 16×16 tile region with persistence and render bookkeeping.

use atoll_common::coords::{ChunkCoord, LocalCoord, CHUNK_TILES};
use image::RgbaImage;
use tracing::debug;

use crate::render::{draw_tile, TextureLookup, CHUNK_PIXELS, TILE_PIXELS};
use crate::storage::codec::encode_chunk;
use crate::storage::{write_file, StorageResult, WorldPaths};
use crate::tile::{behavior, descriptor, Tile, TileKind, TileView};

/// A square region of tiles.
///
/// `dirty` tracks unsaved changes, `needs_redraw` tracks a stale cached
/// surface. A placeholder stands in for a chunk that is still being
/// generated or loaded; it is never saved or updated.
#[derive(Debug, Clone)]
pub struct Chunk {
    coord: ChunkCoord,
    tiles: Vec<Tile>,
    surface: Option<RgbaImage>,
    dirty: bool,
    needs_redraw: bool,
    last_accessed: u64,
    placeholder: bool,
}

impl Chunk {
    /// Creates a chunk filled with one kind.
    #[must_use]
    pub fn new(coord: ChunkCoord, fill: TileKind) -> Self {
        let tiles = LocalCoord::all()
            .map(|local| Tile::new(fill, coord.tile(local)))
            .collect();
        Self {
            coord,
            tiles,
            surface: None,
            dirty: false,
            needs_redraw: true,
            last_accessed: 0,
            placeholder: false,
        }
    }

    /// Creates a placeholder filled with `fill`, accessed at `now`.
    #[must_use]
    pub fn placeholder(coord: ChunkCoord, fill: TileKind, now: u64) -> Self {
        let mut chunk = Self::new(coord, fill);
        chunk.placeholder = true;
        chunk.last_accessed = now;
        chunk
    }

    /// Creates a chunk from row-major tiles, fixing up their positions.
    ///
    /// # Panics
    /// Panics unless exactly [`CHUNK_TILES`] tiles are given.
    #[must_use]
    pub fn from_tiles(coord: ChunkCoord, mut tiles: Vec<Tile>) -> Self {
        assert_eq!(
            tiles.len(),
            CHUNK_TILES,
            "chunk {coord} built from {} tiles",
            tiles.len()
        );
        for (index, tile) in tiles.iter_mut().enumerate() {
            tile.set_pos(coord.tile(LocalCoord::from_index(index)));
        }
        Self {
            coord,
            tiles,
            surface: None,
            dirty: false,
            needs_redraw: true,
            last_accessed: 0,
            placeholder: false,
        }
    }

    /// Chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Whether the chunk has unsaved changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the cached surface is stale.
    #[must_use]
    pub const fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Whether this is a placeholder awaiting the real chunk.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Tick of the last access.
    #[must_use]
    pub const fn last_accessed(&self) -> u64 {
        self.last_accessed
    }

    /// Records an access at `now`.
    pub fn touch(&mut self, now: u64) {
        self.last_accessed = now;
    }

    /// Marks the chunk as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Marks the chunk as saved.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Requests a redraw of the cached surface.
    pub fn trigger_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// All tiles, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at local coordinates.
    ///
    /// # Panics
    /// Panics if either coordinate is outside `[0, 16)`.
    #[must_use]
    pub fn block_at(&self, local_x: u32, local_y: u32) -> &Tile {
        self.tile(LocalCoord::new(local_x, local_y))
    }

    /// Tile at a local coordinate.
    #[must_use]
    pub fn tile(&self, local: LocalCoord) -> &Tile {
        &self.tiles[local.to_index()]
    }

    /// Stores a tile at local coordinates, stamping its absolute position.
    ///
    /// # Panics
    /// Panics if either coordinate is outside `[0, 16)`.
    pub fn set_block(&mut self, local_x: u32, local_y: u32, tile: Tile, now: u64) {
        self.set_tile(LocalCoord::new(local_x, local_y), tile, now);
    }

    /// Stores a tile at a local coordinate and returns the previous kind.
    pub fn set_tile(&mut self, local: LocalCoord, mut tile: Tile, now: u64) -> TileKind {
        tile.set_pos(self.coord.tile(local));
        let slot = &mut self.tiles[local.to_index()];
        let previous = slot.kind();
        *slot = tile;
        self.dirty = true;
        self.needs_redraw = true;
        self.last_accessed = now;
        previous
    }

    /// Runs every updatable tile's hook in row-major order and returns the
    /// replacement tiles to write.
    #[must_use]
    pub fn update(&self, view: &dyn TileView) -> Vec<Tile> {
        self.tiles
            .iter()
            .filter(|tile| descriptor(tile.kind()).updatable)
            .filter_map(|tile| behavior::update(tile, view))
            .collect()
    }

    /// Cached surface, if one has been rendered.
    #[must_use]
    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref()
    }

    /// Removes the cached surface so it can be repainted while the chunk is
    /// borrowed immutably.
    pub fn take_surface(&mut self) -> Option<RgbaImage> {
        self.surface.take()
    }

    /// Installs a freshly painted surface and clears `needs_redraw`.
    pub fn store_surface(&mut self, surface: RgbaImage) {
        self.surface = Some(surface);
        self.needs_redraw = false;
    }

    /// Empty surface of the chunk's pixel size.
    #[must_use]
    pub fn blank_surface() -> RgbaImage {
        RgbaImage::new(CHUNK_PIXELS, CHUNK_PIXELS)
    }

    /// Paints every tile into `surface` at its local pixel offset.
    pub fn render_into(
        &self,
        surface: &mut RgbaImage,
        textures: &dyn TextureLookup,
        view: &dyn TileView,
    ) {
        for pixel in surface.pixels_mut() {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
        for (index, tile) in self.tiles.iter().enumerate() {
            let local = LocalCoord::from_index(index);
            let x = i64::from(local.x) * i64::from(TILE_PIXELS);
            let y = i64::from(local.y) * i64::from(TILE_PIXELS);
            draw_tile(tile, surface, x, y, textures, view);
        }
    }

    /// Writes the chunk to disk if dirty. Returns whether a file was written.
    pub fn save(&mut self, paths: &WorldPaths) -> StorageResult<bool> {
        if !self.dirty || self.placeholder {
            return Ok(false);
        }
        let bytes = encode_chunk(self)?;
        write_file(&paths.chunk(self.coord), &bytes)?;
        self.dirty = false;
        debug!("Saved chunk {} ({} bytes)", self.coord, bytes.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atoll_common::coords::TilePos;

    #[test]
    fn test_tiles_belong_to_their_chunk() {
        let coord = ChunkCoord::new(3, 7);
        let chunk = Chunk::new(coord, TileKind::Grass);
        for tile in chunk.tiles() {
            assert_eq!(tile.pos().chunk(), coord);
        }
        assert_eq!(chunk.block_at(2, 5).pos(), TilePos::new(50, 117));
    }

    #[test]
    fn test_set_block_marks_flags_and_position() {
        let mut chunk = Chunk::new(ChunkCoord::new(1, 1), TileKind::Grass);
        assert!(!chunk.is_dirty());
        chunk.store_surface(Chunk::blank_surface());
        assert!(!chunk.needs_redraw());

        let previous = chunk.set_tile(
            LocalCoord::new(0, 0),
            Tile::new(TileKind::Stone, TilePos::new(999, 999)),
            42,
        );
        assert_eq!(previous, TileKind::Grass);
        assert!(chunk.is_dirty());
        assert!(chunk.needs_redraw());
        assert_eq!(chunk.last_accessed(), 42);
        assert_eq!(chunk.block_at(0, 0).pos(), TilePos::new(16, 16));
    }

    #[test]
    fn test_trigger_redraw_leaves_dirty_alone() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), TileKind::Water);
        chunk.store_surface(Chunk::blank_surface());
        chunk.trigger_redraw();
        assert!(chunk.needs_redraw());
        assert!(!chunk.is_dirty());
    }

    #[test]
    #[should_panic(expected = "outside chunk")]
    fn test_block_at_rejects_out_of_range() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0), TileKind::Water);
        let _ = chunk.block_at(0, 16);
    }

    #[test]
    fn test_save_skips_clean_and_placeholder_chunks() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let mut clean = Chunk::new(ChunkCoord::new(0, 0), TileKind::Grass);
        assert!(!clean.save(&paths).expect("save"));

        let mut placeholder = Chunk::placeholder(ChunkCoord::new(1, 0), TileKind::Water, 0);
        placeholder.mark_dirty();
        assert!(!placeholder.save(&paths).expect("save"));

        let mut dirty = Chunk::new(ChunkCoord::new(2, 0), TileKind::Grass);
        dirty.mark_dirty();
        assert!(dirty.save(&paths).expect("save"));
        assert!(!dirty.is_dirty());
        assert!(paths.chunk(ChunkCoord::new(2, 0)).exists());
    }
}
