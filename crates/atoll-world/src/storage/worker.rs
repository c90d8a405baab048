//! Background saver and loader threads.
//!
//! Each worker owns one thread fed by an unbounded request channel and
//! publishes results on a second channel that the main thread drains without
//! blocking. Dropping a handle closes its request channel and joins the
//! thread, so queued saves complete before the world goes away.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ahash::{AHashMap, AHashSet};
use atoll_common::coords::ChunkCoord;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use super::codec::load_chunk_file;
use super::{quarantine, StorageError, WorldPaths};
use crate::chunk::Chunk;
use crate::tile::TileRegistry;

/// Acknowledgement for a submitted save.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Written (or nothing to write)
    Saved(ChunkCoord),
    /// Write failed; the chunk comes back still dirty
    Failed(Chunk),
}

impl SaveOutcome {
    /// Coordinate the outcome refers to.
    #[must_use]
    pub fn coord(&self) -> ChunkCoord {
        match self {
            Self::Saved(coord) => *coord,
            Self::Failed(chunk) => chunk.coord(),
        }
    }
}

/// Handle to the saver thread.
#[derive(Debug)]
pub struct ChunkSaver {
    requests: Option<Sender<Chunk>>,
    outcomes: Receiver<SaveOutcome>,
    in_flight: AHashMap<ChunkCoord, u32>,
    submitted: u64,
    thread: Option<JoinHandle<()>>,
}

impl ChunkSaver {
    /// Starts the saver thread for one world.
    pub fn spawn(paths: WorldPaths, name: &str) -> std::io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<Chunk>();
        let (outcome_tx, outcome_rx) = unbounded();
        let thread = thread::Builder::new()
            .name(format!("{name}-saver"))
            .spawn(move || run_saver(&paths, &request_rx, &outcome_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            in_flight: AHashMap::new(),
            submitted: 0,
            thread: Some(thread),
        })
    }

    /// Submits a chunk for saving. Never blocks.
    pub fn save(&mut self, chunk: Chunk) {
        let coord = chunk.coord();
        let Some(requests) = &self.requests else {
            return;
        };
        if requests.send(chunk).is_err() {
            warn!("Saver thread is gone; chunk {} was not saved", coord);
            return;
        }
        *self.in_flight.entry(coord).or_insert(0) += 1;
        self.submitted += 1;
    }

    /// Next acknowledgement, if one is ready.
    pub fn receive(&mut self) -> Option<SaveOutcome> {
        let outcome = self.outcomes.try_recv().ok()?;
        self.settle(&outcome);
        Some(outcome)
    }

    /// Waits for the next acknowledgement. `None` when nothing is in flight.
    pub fn receive_blocking(&mut self) -> Option<SaveOutcome> {
        if self.in_flight.is_empty() {
            return None;
        }
        let outcome = self.outcomes.recv().ok()?;
        self.settle(&outcome);
        Some(outcome)
    }

    fn settle(&mut self, outcome: &SaveOutcome) {
        let coord = outcome.coord();
        if let Some(count) = self.in_flight.get_mut(&coord) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&coord);
            }
        }
    }

    /// Whether a save for `coord` has not been acknowledged yet.
    #[must_use]
    pub fn is_saving(&self, coord: ChunkCoord) -> bool {
        self.in_flight.contains_key(&coord)
    }

    /// Number of unacknowledged saves.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.values().map(|count| *count as usize).sum()
    }

    /// Total chunks ever submitted.
    #[must_use]
    pub const fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Stops the thread after the queue drains and returns the outcomes not
    /// yet received.
    pub fn shutdown(mut self) -> Vec<SaveOutcome> {
        self.stop();
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.receive() {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn stop(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Saver thread panicked");
            }
        }
    }
}

impl Drop for ChunkSaver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_saver(paths: &WorldPaths, requests: &Receiver<Chunk>, outcomes: &Sender<SaveOutcome>) {
    debug!("Saver started for {}", paths.dir().display());
    while let Ok(mut chunk) = requests.recv() {
        let outcome = match chunk.save(paths) {
            Ok(_) => SaveOutcome::Saved(chunk.coord()),
            Err(e) => {
                warn!("Failed to save chunk {}: {}", chunk.coord(), e);
                SaveOutcome::Failed(chunk)
            }
        };
        // The world may already be gone; queued writes still complete.
        let _ = outcomes.send(outcome);
    }
    debug!("Saver stopped for {}", paths.dir().display());
}

/// Result of a load request.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Chunk read from disk (clean, needs redraw)
    Loaded(Chunk),
    /// Missing or unreadable; the caller regenerates it
    Failed(ChunkCoord),
}

/// Handle to the loader thread.
#[derive(Debug)]
pub struct ChunkLoader {
    requests: Option<Sender<ChunkCoord>>,
    ready: Receiver<LoadOutcome>,
    pending: AHashSet<ChunkCoord>,
    submitted: u64,
    thread: Option<JoinHandle<()>>,
}

impl ChunkLoader {
    /// Starts the loader thread for one world.
    pub fn spawn(
        paths: WorldPaths,
        registry: Arc<TileRegistry>,
        name: &str,
    ) -> std::io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<ChunkCoord>();
        let (ready_tx, ready_rx) = unbounded();
        let thread = thread::Builder::new()
            .name(format!("{name}-loader"))
            .spawn(move || run_loader(&paths, &registry, &request_rx, &ready_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            ready: ready_rx,
            pending: AHashSet::new(),
            submitted: 0,
            thread: Some(thread),
        })
    }

    /// Requests a chunk. Returns `false` if it is already pending.
    pub fn load(&mut self, coord: ChunkCoord) -> bool {
        if self.pending.contains(&coord) {
            return false;
        }
        let Some(requests) = &self.requests else {
            return false;
        };
        if requests.send(coord).is_err() {
            warn!("Loader thread is gone; chunk {} not requested", coord);
            return false;
        }
        self.pending.insert(coord);
        self.submitted += 1;
        true
    }

    /// Next result, if one is ready.
    pub fn receive(&mut self) -> Option<LoadOutcome> {
        let outcome = self.ready.try_recv().ok()?;
        let coord = match &outcome {
            LoadOutcome::Loaded(chunk) => chunk.coord(),
            LoadOutcome::Failed(coord) => *coord,
        };
        self.pending.remove(&coord);
        Some(outcome)
    }

    /// Whether a load for `coord` is outstanding.
    #[must_use]
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// Number of outstanding loads.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total loads ever submitted.
    #[must_use]
    pub const fn submitted(&self) -> u64 {
        self.submitted
    }
}

impl Drop for ChunkLoader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Loader thread panicked");
            }
        }
    }
}

/// Loads one chunk, moving unreadable files aside.
pub fn load_or_quarantine(
    paths: &WorldPaths,
    registry: &TileRegistry,
    coord: ChunkCoord,
) -> Option<Chunk> {
    match load_chunk_file(paths, registry, coord) {
        Ok(chunk) => chunk,
        Err(StorageError::Io(e)) => {
            warn!("Failed to read chunk {}: {}", coord, e);
            None
        }
        Err(e) => {
            warn!("Chunk {} is corrupt: {}", coord, e);
            quarantine(&paths.chunk(coord));
            None
        }
    }
}

fn run_loader(
    paths: &WorldPaths,
    registry: &TileRegistry,
    requests: &Receiver<ChunkCoord>,
    ready: &Sender<LoadOutcome>,
) {
    debug!("Loader started for {}", paths.dir().display());
    while let Ok(coord) = requests.recv() {
        let outcome = match load_or_quarantine(paths, registry, coord) {
            Some(chunk) => {
                debug!("Loaded chunk {}", coord);
                LoadOutcome::Loaded(chunk)
            }
            None => LoadOutcome::Failed(coord),
        };
        if ready.send(outcome).is_err() {
            break;
        }
    }
    debug!("Loader stopped for {}", paths.dir().display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::write_file;
    use crate::tile::{build_tile_registry, Tile, TileKind};
    use atoll_common::coords::TilePos;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait_for<T>(mut poll: impl FnMut() -> Option<T>) -> T {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(value) = poll() {
                return value;
            }
            assert!(Instant::now() < deadline, "worker did not answer");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_saver_acknowledges_and_writes() {
        let dir = TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let mut saver = ChunkSaver::spawn(paths.clone(), "test").expect("spawn");

        let coord = ChunkCoord::new(2, 3);
        let mut chunk = Chunk::new(coord, TileKind::Grass);
        chunk.set_block(1, 1, Tile::new(TileKind::Stone, TilePos::default()), 0);
        saver.save(chunk);
        assert!(saver.is_saving(coord));

        let outcome = wait_for(|| saver.receive());
        assert!(matches!(outcome, SaveOutcome::Saved(c) if c == coord));
        assert!(!saver.is_saving(coord));
        assert!(paths.has_chunk(coord));
        assert_eq!(saver.submitted(), 1);
    }

    #[test]
    fn test_failed_save_returns_dirty_chunk() {
        let dir = TempDir::new().expect("temp dir");
        // A file where the world directory should be makes every write fail.
        let blocker = dir.path().join("world");
        std::fs::write(&blocker, b"").expect("write");
        let mut saver = ChunkSaver::spawn(WorldPaths::new(&blocker), "test").expect("spawn");

        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), TileKind::Grass);
        chunk.mark_dirty();
        saver.save(chunk);
        match wait_for(|| saver.receive()) {
            SaveOutcome::Failed(chunk) => assert!(chunk.is_dirty()),
            SaveOutcome::Saved(_) => panic!("write should fail"),
        }
    }

    #[test]
    fn test_dropping_saver_flushes_queue() {
        let dir = TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let mut saver = ChunkSaver::spawn(paths.clone(), "test").expect("spawn");
        for x in 0..8 {
            let mut chunk = Chunk::new(ChunkCoord::new(x, 0), TileKind::Sand);
            chunk.mark_dirty();
            saver.save(chunk);
        }
        let outcomes = saver.shutdown();
        assert_eq!(outcomes.len(), 8);
        for x in 0..8 {
            assert!(paths.has_chunk(ChunkCoord::new(x, 0)));
        }
    }

    #[test]
    fn test_loader_dedupes_and_reports_missing() {
        let dir = TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let mut loader =
            ChunkLoader::spawn(paths, Arc::new(build_tile_registry()), "test").expect("spawn");

        let coord = ChunkCoord::new(9, 9);
        assert!(loader.load(coord));
        assert!(!loader.load(coord));
        assert_eq!(loader.submitted(), 1);

        let outcome = wait_for(|| loader.receive());
        assert!(matches!(outcome, LoadOutcome::Failed(c) if c == coord));
        assert!(!loader.is_pending(coord));
        assert!(loader.load(coord));
    }

    #[test]
    fn test_loader_quarantines_corrupt_files() {
        let dir = TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let coord = ChunkCoord::new(1, 1);
        write_file(&paths.chunk(coord), b"\x04\0\0\0junkjunk").expect("write");

        let mut loader =
            ChunkLoader::spawn(paths.clone(), Arc::new(build_tile_registry()), "test")
                .expect("spawn");
        loader.load(coord);
        let outcome = wait_for(|| loader.receive());
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(!paths.has_chunk(coord));
        assert!(dir.path().join("chunk_1_1.bin.bad").exists());
    }

    #[test]
    fn test_loader_restores_saved_chunk() {
        let dir = TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let coord = ChunkCoord::new(4, 2);
        let mut chunk = Chunk::new(coord, TileKind::Grass);
        chunk.set_block(5, 6, Tile::new(TileKind::Campfire, TilePos::default()), 3);
        chunk.save(&paths).expect("save");

        let mut loader =
            ChunkLoader::spawn(paths, Arc::new(build_tile_registry()), "test").expect("spawn");
        loader.load(coord);
        match wait_for(|| loader.receive()) {
            LoadOutcome::Loaded(loaded) => {
                assert_eq!(loaded.block_at(5, 6).kind(), TileKind::Campfire);
                assert!(!loaded.is_dirty());
            }
            LoadOutcome::Failed(_) => panic!("chunk should load"),
        }
    }
}
