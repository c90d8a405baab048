//! The world: chunk index, streaming and tile access.
//!
//! All tile reads and writes go through [`World`]. Chunks that are not
//! resident are requested from the loader (when a save exists) or the
//! generator, with a placeholder standing in until the real chunk arrives.
//! Idle chunks are handed to the saver and dropped from the index.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use atoll_common::coords::{ChunkCoord, TilePos, WorldSize};
use atoll_common::ids::WorldId;
use atoll_common::items::{ItemKind, ItemStack, Tool};
use atoll_common::tick::TickClock;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::chunk::Chunk;
use crate::config::WorldConfig;
use crate::generation::GeneratorWorker;
use crate::meta::{WorldMeta, WorldType};
use crate::storage::codec::{read_world_meta, write_world_meta};
use crate::storage::worker::{load_or_quarantine, ChunkLoader, ChunkSaver, LoadOutcome, SaveOutcome};
use crate::storage::{SaveLayout, StorageResult, WorldPaths};
use crate::tile::{behavior, descriptor, Interaction, Tile, TileEffect, TileKind, TileRegistry, TileState, TileView};

/// Snapshot of streaming counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks in the index (placeholders included)
    pub resident: usize,
    /// Placeholders awaiting their chunk
    pub placeholders: usize,
    /// Resident chunks with unsaved changes
    pub dirty: usize,
    /// Outstanding generation requests
    pub generating: usize,
    /// Outstanding load requests
    pub loading: usize,
    /// Unacknowledged saves
    pub saving: usize,
}

/// A bounded, streamed tile world.
#[derive(Debug)]
pub struct World {
    meta: WorldMeta,
    config: WorldConfig,
    paths: WorldPaths,
    registry: Arc<TileRegistry>,
    clock: TickClock,
    chunks: AHashMap<ChunkCoord, Chunk>,
    deferred_loads: AHashSet<ChunkCoord>,
    failed_saves: AHashSet<ChunkCoord>,
    generator: GeneratorWorker,
    saver: ChunkSaver,
    loader: ChunkLoader,
}

impl World {
    /// Creates a new world on disk, writing its metadata.
    ///
    /// # Panics
    /// Panics if `registry` does not cover every tile kind.
    pub fn create(
        layout: &SaveLayout,
        meta: WorldMeta,
        config: WorldConfig,
        registry: Arc<TileRegistry>,
        clock: TickClock,
    ) -> StorageResult<Self> {
        let paths = layout.world(meta.base_id, meta.world_id);
        write_world_meta(&paths, &meta)?;
        info!(
            "Created {} world {} (seed {}, {})",
            meta.world_type, meta.world_id, meta.seed, meta.size
        );
        Self::start(meta, paths, config, registry, clock)
    }

    /// Opens an existing world from its metadata.
    ///
    /// # Panics
    /// Panics if `registry` does not cover every tile kind.
    pub fn open(
        layout: &SaveLayout,
        base: WorldId,
        world: WorldId,
        config: WorldConfig,
        registry: Arc<TileRegistry>,
        clock: TickClock,
    ) -> StorageResult<Self> {
        let paths = layout.world(base, world);
        let meta = read_world_meta(&paths)?;
        info!("Opened {} world {} ({})", meta.world_type, meta.world_id, meta.size);
        Self::start(meta, paths, config, registry, clock)
    }

    fn start(
        meta: WorldMeta,
        paths: WorldPaths,
        config: WorldConfig,
        registry: Arc<TileRegistry>,
        clock: TickClock,
    ) -> StorageResult<Self> {
        assert!(
            registry.is_complete(),
            "tile registry is missing kinds; build it with build_tile_registry()"
        );
        let id = meta.world_id.to_string();
        let name = format!("atoll-{}", &id[..8]);
        let generator = GeneratorWorker::spawn(&meta, &name)?;
        let saver = ChunkSaver::spawn(paths.clone(), &name)?;
        let loader = ChunkLoader::spawn(paths.clone(), Arc::clone(&registry), &name)?;
        Ok(Self {
            meta,
            config,
            paths,
            registry,
            clock,
            chunks: AHashMap::new(),
            deferred_loads: AHashSet::new(),
            failed_saves: AHashSet::new(),
            generator,
            saver,
            loader,
        })
    }

    /// World metadata.
    #[must_use]
    pub const fn meta(&self) -> &WorldMeta {
        &self.meta
    }

    /// Size in tiles.
    #[must_use]
    pub const fn size(&self) -> WorldSize {
        self.meta.size
    }

    /// Tick clock shared with the session.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Paths of this world's directory.
    #[must_use]
    pub const fn paths(&self) -> &WorldPaths {
        &self.paths
    }

    /// Streaming counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            resident: self.chunks.len(),
            placeholders: self.chunks.values().filter(|c| c.is_placeholder()).count(),
            dirty: self.chunks.values().filter(|c| c.is_dirty()).count(),
            generating: self.generator.pending(),
            loading: self.loader.pending(),
            saving: self.saver.in_flight(),
        }
    }

    /// Resident chunk, without side effects.
    #[must_use]
    pub fn resident_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Coordinates of every resident chunk.
    pub fn resident_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Chunk at a chunk coordinate, requesting it if absent. A resident
    /// chunk counts as accessed.
    ///
    /// Returns `None` only for coordinates outside the world.
    pub fn chunk_at(&mut self, coord: ChunkCoord) -> Option<&Chunk> {
        if !self.meta.size.contains_chunk(coord) {
            return None;
        }
        let now = self.clock.now();
        match self.chunks.get_mut(&coord) {
            Some(chunk) => chunk.touch(now),
            None => self.request_chunk(coord),
        }
        self.chunks.get(&coord)
    }

    /// Chunk containing a tile, requesting it if absent.
    pub fn chunk_at_b(&mut self, pos: TilePos) -> Option<&Chunk> {
        if !self.meta.size.contains(pos) {
            return None;
        }
        self.chunk_at(pos.chunk())
    }

    fn request_chunk(&mut self, coord: ChunkCoord) {
        if self.saver.is_saving(coord) {
            debug!("Chunk {} requested while saving; load deferred", coord);
            self.deferred_loads.insert(coord);
        } else if self.paths.has_chunk(coord) {
            self.loader.load(coord);
        } else {
            self.generator.generate(coord);
        }
        let now = self.clock.now();
        self.chunks.insert(
            coord,
            Chunk::placeholder(coord, self.meta.world_type.placeholder_kind(), now),
        );
    }

    /// Tile at a position.
    ///
    /// Out of range gives an empty tile with no side effects. A chunk that is
    /// not resident is requested and an empty tile returned; nothing is
    /// generated on this thread.
    pub fn block_at(&mut self, pos: TilePos) -> Tile {
        if !self.meta.size.contains(pos) {
            return Tile::empty(pos);
        }
        let coord = pos.chunk();
        let now = self.clock.now();
        match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.touch(now);
                chunk.tile(pos.local()).clone()
            }
            None => {
                self.request_chunk(coord);
                Tile::empty(pos)
            }
        }
    }

    /// Resident tile at a position, without side effects.
    #[must_use]
    pub fn peek_block(&self, pos: TilePos) -> Option<&Tile> {
        if !self.meta.size.contains(pos) {
            return None;
        }
        self.chunks
            .get(&pos.chunk())
            .map(|chunk| chunk.tile(pos.local()))
    }

    /// Writes a tile. Out-of-range writes are ignored.
    ///
    /// A missing or placeholder chunk is first loaded or generated on this
    /// thread so the write is never lost.
    pub fn set_block(&mut self, pos: TilePos, tile: Tile) {
        if !self.meta.size.contains(pos) {
            debug!("Ignoring write outside the world at {}", pos);
            return;
        }
        self.ensure_real_chunk(pos.chunk());
        self.write_tile(pos, tile);
    }

    fn ensure_real_chunk(&mut self, coord: ChunkCoord) {
        // A pending save may hold newer tiles than the file on disk.
        while self.saver.is_saving(coord) {
            match self.saver.receive_blocking() {
                Some(outcome) => self.handle_save_outcome(outcome),
                None => break,
            }
        }
        let last_accessed = match self.chunks.get(&coord) {
            Some(chunk) if !chunk.is_placeholder() => return,
            Some(chunk) => chunk.last_accessed(),
            None => self.clock.now(),
        };
        let chunk = match load_or_quarantine(&self.paths, &self.registry, coord) {
            Some(chunk) => chunk,
            None => self.generator.generate_immediately(coord),
        };
        debug!("Produced chunk {} synchronously for a write", coord);
        self.deferred_loads.remove(&coord);
        self.install_chunk(chunk, last_accessed);
    }

    fn install_chunk(&mut self, mut chunk: Chunk, last_accessed: u64) {
        let coord = chunk.coord();
        chunk.touch(last_accessed);
        chunk.trigger_redraw();
        self.chunks.insert(coord, chunk);
        for neighbor in coord.neighbors4() {
            if let Some(chunk) = self.chunks.get_mut(&neighbor) {
                chunk.trigger_redraw();
            }
        }
    }

    fn accept_chunk(&mut self, chunk: Chunk) {
        let coord = chunk.coord();
        match self.chunks.get(&coord) {
            Some(existing) if existing.is_placeholder() => {
                let last_accessed = existing.last_accessed();
                debug!("Chunk {} arrived", coord);
                self.install_chunk(chunk, last_accessed);
            }
            Some(_) => debug!("Dropping stale delivery of chunk {}", coord),
            None => debug!("Dropping chunk {} delivered after eviction", coord),
        }
    }

    /// Stores a tile in a resident chunk and flags neighbouring chunks whose
    /// connected textures may change.
    fn write_tile(&mut self, pos: TilePos, tile: Tile) {
        let now = self.clock.now();
        let new_kind = tile.kind();
        let Some(chunk) = self.chunks.get_mut(&pos.chunk()) else {
            return;
        };
        let old_kind = chunk.set_tile(pos.local(), tile, now);
        self.propagate_redraw(pos, old_kind, new_kind);
    }

    fn propagate_redraw(&mut self, pos: TilePos, old: TileKind, new: TileKind) {
        let own_chunk = pos.chunk();
        let new_connects = Tile::new(new, pos).connects_to().unwrap_or(&[]);
        for neighbor in pos.neighbors4() {
            let coord = neighbor.chunk();
            if coord == own_chunk || !self.meta.size.contains(neighbor) {
                continue;
            }
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            let neighbor_tile = chunk.tile(neighbor.local());
            let joins_us = neighbor_tile
                .connects_to()
                .is_some_and(|kinds| kinds.contains(&old) || kinds.contains(&new));
            if joins_us || new_connects.contains(&neighbor_tile.kind()) {
                chunk.trigger_redraw();
            }
        }
    }

    /// Per-tick update: collect worker output, evict idle chunks, run tile
    /// updates.
    pub fn update(&mut self) {
        let now = self.clock.now();

        self.retry_failed_saves(now);

        for chunk in self.generator.receive() {
            self.accept_chunk(chunk);
        }
        while let Some(outcome) = self.loader.receive() {
            match outcome {
                LoadOutcome::Loaded(chunk) => self.accept_chunk(chunk),
                LoadOutcome::Failed(coord) => {
                    if self.chunks.get(&coord).is_some_and(Chunk::is_placeholder) {
                        debug!("Regenerating chunk {} after failed load", coord);
                        self.generator.generate(coord);
                    }
                }
            }
        }
        while let Some(outcome) = self.saver.receive() {
            self.handle_save_outcome(outcome);
        }

        if now % self.config.scan_interval == 0 {
            self.evict_idle(now);
        }
        self.update_chunks();
    }

    fn handle_save_outcome(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Saved(coord) => {
                if self.saver.is_saving(coord) || !self.deferred_loads.remove(&coord) {
                    return;
                }
                if self.chunks.get(&coord).is_some_and(Chunk::is_placeholder) {
                    self.loader.load(coord);
                }
            }
            SaveOutcome::Failed(chunk) => {
                let coord = chunk.coord();
                let resident = self.chunks.get(&coord);
                let replace =
                    resident.map_or(true, |resident| resident.is_placeholder() || !resident.is_dirty());
                if replace {
                    // A placeholder means the chunk was asked for again since it was evicted.
                    let last_accessed = resident.map_or(chunk.last_accessed(), Chunk::last_accessed);
                    warn!("Keeping unsaved chunk {} resident", coord);
                    self.deferred_loads.remove(&coord);
                    self.install_chunk(chunk, last_accessed);
                    self.failed_saves.insert(coord);
                } else {
                    warn!("Discarding failed save of chunk {}; a newer copy is resident", coord);
                }
            }
        }
    }

    /// Resubmits chunks whose save failed last tick, if they are still idle.
    fn retry_failed_saves(&mut self, now: u64) {
        let delay = self.config.unload_delay;
        for coord in std::mem::take(&mut self.failed_saves) {
            let retry = self.chunks.get(&coord).is_some_and(|chunk| {
                !chunk.is_placeholder()
                    && chunk.is_dirty()
                    && now.saturating_sub(chunk.last_accessed()) > delay
            });
            if !retry {
                continue;
            }
            if let Some(chunk) = self.chunks.remove(&coord) {
                debug!("Retrying save of chunk {}", coord);
                self.saver.save(chunk);
            }
        }
    }

    fn evict_idle(&mut self, now: u64) {
        let delay = self.config.unload_delay;
        let idle: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|chunk| now.saturating_sub(chunk.last_accessed()) > delay)
            .map(Chunk::coord)
            .collect();
        for coord in idle {
            let Some(chunk) = self.chunks.remove(&coord) else {
                continue;
            };
            if chunk.is_placeholder() {
                debug!("Dropping idle placeholder {}", coord);
                continue;
            }
            debug!("Evicting chunk {}", coord);
            self.saver.save(chunk);
        }
    }

    fn update_chunks(&mut self) {
        let coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        for coord in coords {
            let replacements = match self.chunks.get(&coord) {
                Some(chunk) if !chunk.is_placeholder() => chunk.update(self),
                _ => continue,
            };
            for tile in replacements {
                self.write_tile(tile.pos(), tile);
            }
        }
    }

    /// Resident orthogonal neighbours of a chunk.
    #[must_use]
    pub fn get_neighbors(&self, coord: ChunkCoord) -> Vec<&Chunk> {
        coord
            .neighbors4()
            .iter()
            .filter_map(|neighbor| self.chunks.get(neighbor))
            .collect()
    }

    /// Whether all four orthogonal neighbours of a chunk are resident.
    #[must_use]
    pub fn check_neighbors(&self, coord: ChunkCoord) -> bool {
        coord
            .neighbors4()
            .iter()
            .all(|neighbor| self.chunks.contains_key(neighbor))
    }

    /// Whether every Moore neighbour of `pos` is resident with a kind in
    /// `whitelist`.
    #[must_use]
    pub fn check_block_neighbors(&self, pos: TilePos, whitelist: &[TileKind]) -> bool {
        pos.neighbors8().into_iter().all(|neighbor| {
            self.peek_block(neighbor)
                .is_some_and(|tile| whitelist.contains(&tile.kind()))
        })
    }

    /// Whether any Moore neighbour of `pos` has a kind in `kinds`.
    #[must_use]
    pub fn block_neighboring_with(&self, pos: TilePos, kinds: &[TileKind]) -> bool {
        TileView::block_neighboring_with(self, pos, kinds)
    }

    fn apply(&mut self, pos: TilePos, interaction: Interaction) -> Vec<TileEffect> {
        if let Some(tile) = interaction.replacement {
            self.write_tile(pos, tile);
        }
        interaction.effects
    }

    fn touched_tile(&mut self, pos: TilePos) -> Option<Tile> {
        if self.peek_block(pos).is_none() {
            return None;
        }
        let tile = self.block_at(pos);
        let resident = self.chunks.get(&pos.chunk()).is_some_and(|chunk| !chunk.is_placeholder());
        resident.then_some(tile)
    }

    /// Interact action on the tile at `pos`.
    pub fn interact(&mut self, pos: TilePos, player_pos: (f32, f32)) -> Vec<TileEffect> {
        let Some(tile) = self.touched_tile(pos) else {
            return Vec::new();
        };
        if !tile.is_interactive() {
            return Vec::new();
        }
        debug!(
            "Interacting with {} at {} from ({:.2}, {:.2})",
            tile.kind(),
            pos,
            player_pos.0,
            player_pos.1
        );
        let interaction = behavior::interact(&tile, self.clock.now());
        self.apply(pos, interaction)
    }

    /// The player overlaps the tile at `pos` this tick.
    pub fn collide(&mut self, pos: TilePos, _player_pos: (f32, f32)) -> Vec<TileEffect> {
        let Some(tile) = self.peek_block(pos) else {
            return Vec::new();
        };
        if !descriptor(tile.kind()).collision_reactive {
            return Vec::new();
        }
        let interaction = behavior::collide(tile, self.clock.now());
        if interaction.replacement.is_none() && interaction.effects.is_empty() {
            return Vec::new();
        }
        self.apply(pos, interaction)
    }

    /// Breaks the tile at `pos` with `tool`. Returns the drops, or `None`
    /// when the tile is unbreakable, not resident, or the tool too weak.
    pub fn break_block(&mut self, pos: TilePos, tool: Tool) -> Option<Vec<ItemStack>> {
        let tile = self.touched_tile(pos)?;
        let outcome = behavior::break_tile(&tile, tool, self.meta.world_type)?;
        debug!("Broke {} at {}", tile.kind(), pos);
        self.write_tile(pos, outcome.replacement);
        Some(outcome.drops)
    }

    /// Places an item as a tile at `pos`. Returns whether it was placed.
    pub fn place_block(&mut self, pos: TilePos, item: ItemKind) -> bool {
        let Some(target) = self.touched_tile(pos) else {
            return false;
        };
        if !descriptor(target.kind()).replaceable {
            return false;
        }
        let Some(tile) = behavior::placed_tile(&self.registry, item, pos, self.clock.now()) else {
            return false;
        };
        self.write_tile(pos, tile);
        true
    }

    /// Records on a cave entrance which cave it leads to.
    pub fn link_cave(&mut self, entrance: TilePos, cave: WorldId) {
        let Some(tile) = self.peek_block(entrance) else {
            return;
        };
        if tile.kind() != TileKind::CaveEntrance {
            return;
        }
        let linked = tile.with_new_state(TileState::CaveEntrance { cave: Some(cave) });
        self.set_block(entrance, linked);
    }

    /// Requests a redraw of every resident chunk.
    pub fn redraw_all(&mut self) {
        for chunk in self.chunks.values_mut() {
            chunk.trigger_redraw();
        }
    }

    /// Saves every dirty resident chunk and the metadata on this thread.
    /// Returns the number of chunks written.
    pub fn flush(&mut self) -> StorageResult<usize> {
        while let Some(outcome) = self.saver.receive() {
            self.handle_save_outcome(outcome);
        }
        let mut saved = 0;
        for chunk in self.chunks.values_mut() {
            match chunk.save(&self.paths) {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to save chunk {}: {}", chunk.coord(), e),
            }
        }
        write_world_meta(&self.paths, &self.meta)?;
        info!("Flushed {} chunks of world {}", saved, self.meta.world_id);
        Ok(saved)
    }

    /// Flushes, waits for queued saves and stops the workers.
    pub fn close(mut self) -> StorageResult<()> {
        self.flush()?;
        let Self { saver, paths, .. } = self;
        for outcome in saver.shutdown() {
            if let SaveOutcome::Failed(mut chunk) = outcome {
                if let Err(e) = chunk.save(&paths) {
                    warn!("Chunk {} lost on close: {}", chunk.coord(), e);
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn drop_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        self.chunks.remove(&coord)
    }

    pub(crate) fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Takes a chunk's surface for repainting when it is stale or missing.
    pub(crate) fn take_stale_surface(&mut self, coord: ChunkCoord) -> Option<RgbaImage> {
        let chunk = self.chunks.get_mut(&coord)?;
        if !chunk.needs_redraw() && chunk.surface().is_some() {
            return None;
        }
        Some(chunk.take_surface().unwrap_or_else(Chunk::blank_surface))
    }
}

impl TileView for World {
    fn peek_block(&self, pos: TilePos) -> Option<&Tile> {
        World::peek_block(self, pos)
    }

    fn now(&self) -> u64 {
        self.clock.now()
    }

    fn world_type(&self) -> WorldType {
        self.meta.world_type
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::config::CHUNK_UNLOAD_DELAY;
    use crate::tile::build_tile_registry;

    fn create_world(dir: &Path, seed: i64) -> World {
        let meta = WorldMeta::overworld("test", seed, WorldSize::square(1024));
        World::create(
            &SaveLayout::new(dir),
            meta,
            WorldConfig::default(),
            Arc::new(build_tile_registry()),
            TickClock::new(),
        )
        .unwrap()
    }

    fn settle(world: &mut World, coord: ChunkCoord) {
        for _ in 0..1000 {
            world.update();
            if world.resident_chunk(coord).is_some_and(|c| !c.is_placeholder()) {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("chunk {coord} never arrived");
    }

    fn settle_at(world: &mut World, pos: TilePos) -> Tile {
        world.block_at(pos);
        settle(world, pos.chunk());
        world.block_at(pos)
    }

    #[test]
    fn test_seeded_spot_check_and_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 1);

        assert_eq!(settle_at(&mut world, TilePos::new(512, 512)).kind(), TileKind::Grass);
        assert_eq!(settle_at(&mut world, TilePos::new(0, 0)).kind(), TileKind::Water);

        let centre = ChunkCoord::new(32, 32);
        for _ in 0..10 {
            world.update();
        }
        assert!(world.resident_chunk(centre).is_some());

        for _ in 0..(CHUNK_UNLOAD_DELAY + 30) {
            world.clock().advance();
            world.update();
        }
        assert!(world.resident_chunk(centre).is_none());
        world.close().unwrap();
    }

    #[test]
    fn test_edit_survives_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 42);
        let coord = ChunkCoord::new(5, 5);
        let pos = TilePos::new(80, 80);

        world.chunk_at(coord);
        settle(&mut world, coord);
        world.set_block(pos, Tile::new(TileKind::Stone, pos));
        assert_eq!(world.flush().unwrap(), 1);
        assert!(world.paths().has_chunk(coord));

        world.drop_chunk(coord);
        assert!(world.resident_chunk(coord).is_none());
        world.chunk_at(coord);
        assert!(world.loader.is_pending(coord));
        settle(&mut world, coord);
        assert_eq!(world.block_at(pos).kind(), TileKind::Stone);
        assert_eq!(world.generator.submitted(), 1);
    }

    #[test]
    fn test_write_flags_neighbouring_chunk_for_redraw() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 3);
        let coords = [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(1, 0),
            ChunkCoord::new(0, 1),
            ChunkCoord::new(1, 1),
        ];
        for coord in coords {
            world.chunk_at(coord);
            settle(&mut world, coord);
        }

        let across = TilePos::new(16, 3);
        world.set_block(across, Tile::new(TileKind::Grass, across));
        for coord in coords {
            let chunk = world.chunk_mut(coord).unwrap();
            chunk.store_surface(Chunk::blank_surface());
        }

        let edge = TilePos::new(15, 3);
        world.set_block(edge, Tile::new(TileKind::Grass, edge));
        world.update();
        let neighbour = world.resident_chunk(ChunkCoord::new(1, 0)).unwrap();
        assert!(neighbour.needs_redraw());
        // Not adjacent to the edited tile.
        assert!(!world.resident_chunk(ChunkCoord::new(1, 1)).unwrap().needs_redraw());
    }

    #[test]
    fn test_out_of_range_reads_have_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 1);

        let tile = world.block_at(TilePos::new(100_000, 100_000));
        assert_eq!(tile.kind(), TileKind::Empty);
        assert_eq!(world.block_at(TilePos::new(-1, 5)).kind(), TileKind::Empty);
        assert_eq!(world.stats().resident, 0);
        assert_eq!(world.generator.submitted(), 0);
        assert!(world.chunk_at(ChunkCoord::new(64, 0)).is_none());

        world.set_block(TilePos::new(2000, 0), Tile::new(TileKind::Stone, TilePos::new(2000, 0)));
        assert_eq!(world.stats().resident, 0);
    }

    #[test]
    fn test_missing_chunk_is_requested_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 1);
        let pos = TilePos::new(300, 300);

        assert_eq!(world.block_at(pos).kind(), TileKind::Empty);
        world.block_at(pos);
        world.block_at(pos.offset(1, 1));
        assert_eq!(world.generator.submitted(), 1);
        assert!(world.resident_chunk(pos.chunk()).unwrap().is_placeholder());
    }

    #[test]
    fn test_write_into_placeholder_generates_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 9);
        let pos = TilePos::new(520, 515);

        world.block_at(pos);
        world.set_block(pos, Tile::new(TileKind::Stone, pos));
        let chunk = world.resident_chunk(pos.chunk()).unwrap();
        assert!(!chunk.is_placeholder());
        assert!(chunk.is_dirty());

        // The late delivery from the worker must not clobber the edit.
        for _ in 0..50 {
            world.update();
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(world.block_at(pos).kind(), TileKind::Stone);
    }

    #[test]
    fn test_idle_chunk_is_saved_on_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 5);
        let pos = TilePos::new(500, 500);

        settle_at(&mut world, pos);
        world.set_block(pos, Tile::new(TileKind::Campfire, pos));
        for _ in 0..=(CHUNK_UNLOAD_DELAY + 30) {
            world.clock().advance();
            world.update();
        }
        assert!(world.resident_chunk(pos.chunk()).is_none());
        while world.saver.in_flight() > 0 {
            if let Some(outcome) = world.saver.receive_blocking() {
                assert!(matches!(outcome, SaveOutcome::Saved(_)));
            }
        }
        assert!(world.paths().has_chunk(pos.chunk()));
        assert_eq!(settle_at(&mut world, pos).kind(), TileKind::Campfire);
    }

    #[test]
    fn test_break_and_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 5);
        let pos = TilePos::new(512, 512);
        settle_at(&mut world, pos);
        world.set_block(pos, Tile::new(TileKind::Grass, pos));

        assert!(world.place_block(pos, ItemKind::Stone));
        assert!(!world.place_block(pos, ItemKind::Sapling));
        assert!(world.break_block(pos, Tool::HAND).is_none());

        let pickaxe = ItemKind::WoodenPickaxe.tool().unwrap();
        let drops = world.break_block(pos, pickaxe).unwrap();
        assert_eq!(drops, vec![ItemStack::one(ItemKind::Stone)]);
        assert_eq!(world.block_at(pos).kind(), TileKind::Grass);
    }

    #[test]
    fn test_interact_with_berry_bush_and_cave_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 5);
        let bush = TilePos::new(510, 512);
        let entrance = TilePos::new(511, 512);
        settle_at(&mut world, bush);
        world.set_block(bush, Tile::placed(TileKind::BerryBush, bush, 0));
        world.set_block(entrance, Tile::placed(TileKind::CaveEntrance, entrance, 0));

        let effects = world.interact(bush, (510.5, 513.5));
        assert_eq!(
            effects,
            vec![TileEffect::GiveItem(ItemStack::new(ItemKind::Berries, behavior::BERRIES_PER_PICK))]
        );
        assert!(world.interact(bush, (510.5, 513.5)).is_empty());

        let cave = WorldId::new();
        world.link_cave(entrance, cave);
        assert_eq!(
            world.interact(entrance, (511.5, 512.5)),
            vec![TileEffect::EnterCave {
                entrance,
                cave: Some(cave)
            }]
        );
    }

    #[test]
    fn test_neighbour_queries() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 5);
        let pos = TilePos::new(520, 520);
        settle_at(&mut world, pos);
        for neighbor in pos.neighbors8() {
            world.set_block(neighbor, Tile::new(TileKind::Grass, neighbor));
        }
        assert!(world.check_block_neighbors(pos, &[TileKind::Grass]));
        assert!(!world.block_neighboring_with(pos, &[TileKind::Stone]));

        world.set_block(pos.offset(1, 1), Tile::new(TileKind::Stone, pos.offset(1, 1)));
        assert!(!world.check_block_neighbors(pos, &[TileKind::Grass]));
        assert!(world.block_neighboring_with(pos, &[TileKind::Stone]));

        let coord = pos.chunk();
        assert!(!world.check_neighbors(coord));
        assert!(world.get_neighbors(coord).is_empty());
    }

    #[test]
    fn test_reopen_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let world = create_world(dir.path(), 77);
        let meta = world.meta().clone();
        world.close().unwrap();

        let reopened = World::open(
            &SaveLayout::new(dir.path()),
            meta.base_id,
            meta.world_id,
            WorldConfig::default(),
            Arc::new(build_tile_registry()),
            TickClock::new(),
        )
        .unwrap();
        assert_eq!(reopened.meta(), &meta);
    }

    #[test]
    fn test_failed_save_is_retried_next_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = create_world(dir.path(), 5);
        let pos = TilePos::new(500, 500);
        let coord = pos.chunk();

        settle_at(&mut world, pos);
        world.set_block(pos, Tile::new(TileKind::Stone, pos));
        // A directory where the chunk file belongs makes every write fail.
        let blocker = world.paths().chunk(coord);
        std::fs::create_dir_all(&blocker).unwrap();

        while world.saver.submitted() == 0 {
            world.clock().advance();
            world.update();
        }
        world.clock().advance();
        assert_ne!(world.clock().now() % world.config.scan_interval, 0);

        // Retries happen without the clock reaching another eviction scan.
        for _ in 0..1000 {
            if world.saver.submitted() >= 3 {
                break;
            }
            world.update();
            thread::sleep(Duration::from_millis(2));
        }
        assert!(world.saver.submitted() >= 3);

        std::fs::remove_dir(&blocker).unwrap();
        for _ in 0..1000 {
            if world.paths().has_chunk(coord) {
                break;
            }
            world.update();
            thread::sleep(Duration::from_millis(2));
        }
        assert!(world.paths().has_chunk(coord));
        while world.saver.in_flight() > 0 {
            world.update();
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(settle_at(&mut world, pos).kind(), TileKind::Stone);
    }

    #[test]
    #[should_panic(expected = "tile registry is missing kinds")]
    fn test_incomplete_registry_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let world = create_world(dir.path(), 42);
        let meta = world.meta().clone();
        world.close().unwrap();

        let mut registry = TileRegistry::new();
        registry.register(TileKind::Water);
        let _ = World::open(
            &SaveLayout::new(dir.path()),
            meta.base_id,
            meta.world_id,
            WorldConfig::default(),
            Arc::new(registry),
            TickClock::new(),
        );
    }
}
