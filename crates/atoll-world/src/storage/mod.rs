//! On-disk persistence: save layout, record codec and the saver/loader
//! workers.
//!
//! ```text
//! <saves>/<base_id>/player.bin
//! <saves>/<base_id>/inventory.bin
//! <saves>/<base_id>/<world_id>/world.bin
//! <saves>/<base_id>/<world_id>/chunk_<cx>_<cy>.bin
//! ```

pub mod codec;
pub mod worker;

use std::fs;
use std::path::{Path, PathBuf};

use atoll_common::coords::ChunkCoord;
use atoll_common::ids::WorldId;
use thiserror::Error;
use tracing::{debug, warn};

use crate::tile::TileError;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding failed
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Decoding failed
    #[error("Decoding failed: {0}")]
    Decode(String),

    /// Magic bytes do not match the expected record type
    #[error("Invalid file format")]
    InvalidFormat,

    /// Written by an incompatible schema
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version
        actual: String,
    },

    /// Body failed to decompress
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// A tile could not be restored
    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    /// File holds a different chunk than its name says
    #[error("Expected chunk {expected}, file holds {found}")]
    WrongChunk {
        /// Requested chunk
        expected: ChunkCoord,
        /// Chunk found in the file
        found: ChunkCoord,
    },
}

/// Result type for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Root of all save bases.
#[derive(Debug, Clone)]
pub struct SaveLayout {
    root: PathBuf,
}

impl SaveLayout {
    /// Creates a layout rooted at `root` (the saves directory).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Saves directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a save base.
    #[must_use]
    pub fn base_dir(&self, base: WorldId) -> PathBuf {
        self.root.join(base.to_string())
    }

    /// Player stack file of a base.
    #[must_use]
    pub fn player_path(&self, base: WorldId) -> PathBuf {
        self.base_dir(base).join("player.bin")
    }

    /// Inventory file of a base.
    #[must_use]
    pub fn inventory_path(&self, base: WorldId) -> PathBuf {
        self.base_dir(base).join("inventory.bin")
    }

    /// Paths of one world inside a base.
    #[must_use]
    pub fn world(&self, base: WorldId, world: WorldId) -> WorldPaths {
        WorldPaths::new(self.base_dir(base).join(world.to_string()))
    }

    /// Most recently played base: the base whose player file was modified
    /// last.
    #[must_use]
    pub fn latest_base(&self) -> Option<WorldId> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No saves at {}: {}", self.root.display(), e);
                return None;
            }
        };
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let id = WorldId::parse(entry.file_name().to_str()?)?;
                let modified = fs::metadata(entry.path().join("player.bin"))
                    .and_then(|meta| meta.modified())
                    .ok()?;
                Some((modified, id))
            })
            .max()
            .map(|(_, id)| id)
    }
}

/// Paths of a single world directory.
#[derive(Debug, Clone)]
pub struct WorldPaths {
    dir: PathBuf,
}

impl WorldPaths {
    /// Creates paths for the world stored in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// World directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Metadata file.
    #[must_use]
    pub fn meta(&self) -> PathBuf {
        self.dir.join("world.bin")
    }

    /// File of one chunk.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> PathBuf {
        self.dir.join(format!("chunk_{}_{}.bin", coord.x, coord.y))
    }

    /// Whether a chunk has been saved.
    #[must_use]
    pub fn has_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunk(coord).is_file()
    }
}

/// Writes a file, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Moves an unreadable file aside with a `.bad` suffix.
pub fn quarantine(path: &Path) {
    let mut bad = path.as_os_str().to_owned();
    bad.push(".bad");
    match fs::rename(path, &bad) {
        Ok(()) => warn!("Moved unreadable file to {}", Path::new(&bad).display()),
        Err(e) => warn!("Failed to quarantine {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = SaveLayout::new("/saves");
        let base = WorldId::new();
        let world = WorldId::new();
        let paths = layout.world(base, world);
        assert_eq!(
            paths.chunk(ChunkCoord::new(5, -1)),
            PathBuf::from(format!("/saves/{base}/{world}/chunk_5_-1.bin"))
        );
        assert_eq!(
            layout.player_path(base),
            PathBuf::from(format!("/saves/{base}/player.bin"))
        );
        assert!(paths.meta().ends_with("world.bin"));
    }

    #[test]
    fn test_latest_base_needs_a_player_file() {
        let dir = TempDir::new().expect("temp dir");
        let layout = SaveLayout::new(dir.path());
        assert_eq!(layout.latest_base(), None);

        let abandoned = WorldId::new();
        fs::create_dir_all(layout.base_dir(abandoned)).expect("mkdir");
        assert_eq!(layout.latest_base(), None);

        let played = WorldId::new();
        write_file(&layout.player_path(played), b"x").expect("write");
        assert_eq!(layout.latest_base(), Some(played));
    }

    #[test]
    fn test_quarantine_renames() {
        let dir = TempDir::new().expect("temp dir");
        let paths = WorldPaths::new(dir.path());
        let path = paths.chunk(ChunkCoord::new(1, 2));
        write_file(&path, b"garbage").expect("write");
        quarantine(&path);
        assert!(!path.exists());
        assert!(dir.path().join("chunk_1_2.bin.bad").exists());
    }
}
