//! Background chunk generation.

use std::thread::{self, JoinHandle};

use ahash::AHashSet;
use atoll_common::coords::ChunkCoord;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use super::{generator_for, ChunkGenerator};
use crate::chunk::Chunk;
use crate::meta::WorldMeta;

/// Handle to a world's generator thread.
///
/// Requests are deduplicated while pending. Generated chunks are collected
/// with [`GeneratorWorker::receive`], which never blocks.
pub struct GeneratorWorker {
    requests: Option<Sender<ChunkCoord>>,
    ready: Receiver<Chunk>,
    pending: AHashSet<ChunkCoord>,
    local: Box<dyn ChunkGenerator>,
    submitted: u64,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for GeneratorWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorWorker")
            .field("pending", &self.pending.len())
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl GeneratorWorker {
    /// Starts a generator thread for the world described by `meta`.
    pub fn spawn(meta: &WorldMeta, name: &str) -> std::io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<ChunkCoord>();
        let (ready_tx, ready_rx) = unbounded();
        let generator = generator_for(meta);
        let thread = thread::Builder::new()
            .name(format!("{name}-generator"))
            .spawn(move || run(generator.as_ref(), &request_rx, &ready_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            ready: ready_rx,
            pending: AHashSet::new(),
            local: generator_for(meta),
            submitted: 0,
            thread: Some(thread),
        })
    }

    /// Queues a chunk. Returns `false` if it is already pending.
    pub fn generate(&mut self, coord: ChunkCoord) -> bool {
        if self.pending.contains(&coord) {
            return false;
        }
        let Some(requests) = &self.requests else {
            return false;
        };
        if requests.send(coord).is_err() {
            warn!("Generator thread is gone; chunk {} not requested", coord);
            return false;
        }
        self.pending.insert(coord);
        self.submitted += 1;
        true
    }

    /// Generates a chunk on the calling thread.
    #[must_use]
    pub fn generate_immediately(&self, coord: ChunkCoord) -> Chunk {
        self.local.generate(coord)
    }

    /// Drains every chunk generated so far.
    pub fn receive(&mut self) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self.ready.try_iter().collect();
        for chunk in &chunks {
            self.pending.remove(&chunk.coord());
        }
        chunks
    }

    /// Whether a request for `coord` is outstanding.
    #[must_use]
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total requests ever submitted.
    #[must_use]
    pub const fn submitted(&self) -> u64 {
        self.submitted
    }
}

impl Drop for GeneratorWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Generator thread panicked");
            }
        }
    }
}

fn run(generator: &dyn ChunkGenerator, requests: &Receiver<ChunkCoord>, ready: &Sender<Chunk>) {
    debug!("Generator started ({:?})", generator.world_type());
    while let Ok(coord) = requests.recv() {
        if ready.send(generator.generate(coord)).is_err() {
            break;
        }
    }
    debug!("Generator stopped");
}
