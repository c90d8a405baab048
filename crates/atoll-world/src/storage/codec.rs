//! Binary record codec.
//!
//! Every file is `[u32 LE header length][bincode header][body]`. The header
//! names the record type (magic bytes) and schema version; the body is the
//! bincode encoding of the record, lz4-compressed for chunks.

use std::fs;
use std::io::ErrorKind;

use atoll_common::coords::{ChunkCoord, LocalCoord, CHUNK_TILES};
use atoll_common::version::{MagicBytes, SchemaVersion};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{write_file, StorageError, StorageResult, WorldPaths};
use crate::chunk::Chunk;
use crate::meta::WorldMeta;
use crate::tile::{TileKind, TileRegistry, TileState};

const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_LZ4: u8 = 1;

/// Header preceding every record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Record type
    pub magic: [u8; 4],
    /// Schema version the body was written with
    pub version: SchemaVersion,
    /// Body compression (0 = none, 1 = lz4)
    pub compression: u8,
}

impl RecordHeader {
    /// Validates the header against the expected record type.
    pub fn validate(&self, magic: MagicBytes, version: SchemaVersion) -> StorageResult<()> {
        if self.magic != magic.0 {
            return Err(StorageError::InvalidFormat);
        }
        if !version.can_read(&self.version) {
            return Err(StorageError::VersionMismatch {
                expected: version.to_string(),
                actual: self.version.to_string(),
            });
        }
        Ok(())
    }
}

/// Encodes a record.
pub fn encode_record<T: Serialize>(
    magic: MagicBytes,
    version: SchemaVersion,
    value: &T,
    compress: bool,
) -> StorageResult<Vec<u8>> {
    let header = RecordHeader {
        magic: magic.0,
        version,
        compression: if compress {
            COMPRESSION_LZ4
        } else {
            COMPRESSION_NONE
        },
    };
    let header_bytes =
        bincode::serialize(&header).map_err(|e| StorageError::Encode(e.to_string()))?;
    let body = bincode::serialize(value).map_err(|e| StorageError::Encode(e.to_string()))?;
    let body = if compress {
        lz4_flex::compress_prepend_size(&body)
    } else {
        body
    };

    let mut result = Vec::with_capacity(4 + header_bytes.len() + body.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&body);
    Ok(result)
}

/// Decodes a record, validating its header.
pub fn decode_record<T: DeserializeOwned>(
    bytes: &[u8],
    magic: MagicBytes,
    version: SchemaVersion,
) -> StorageResult<T> {
    if bytes.len() < 4 {
        return Err(StorageError::Decode("data too short".into()));
    }
    let (len_bytes, rest) = bytes.split_at(4);
    let header_len =
        u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if rest.len() < header_len {
        return Err(StorageError::Decode("header length mismatch".into()));
    }
    let (header_bytes, body) = rest.split_at(header_len);

    let header: RecordHeader =
        bincode::deserialize(header_bytes).map_err(|e| StorageError::Decode(e.to_string()))?;
    header.validate(magic, version)?;

    let decompressed;
    let body = match header.compression {
        COMPRESSION_NONE => body,
        COMPRESSION_LZ4 => {
            decompressed = lz4_flex::decompress_size_prepended(body)
                .map_err(|e| StorageError::Decompression(e.to_string()))?;
            decompressed.as_slice()
        }
        other => {
            return Err(StorageError::Decode(format!(
                "unknown compression type {other}"
            )))
        }
    };
    bincode::deserialize(body).map_err(|e| StorageError::Decode(e.to_string()))
}

/// Persisted form of a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk X
    pub x: i32,
    /// Chunk Y
    pub y: i32,
    /// Row-major tiles
    pub tiles: Vec<(TileKind, TileState)>,
}

impl ChunkRecord {
    /// Captures a chunk.
    #[must_use]
    pub fn capture(chunk: &Chunk) -> Self {
        let coord = chunk.coord();
        Self {
            x: coord.x,
            y: coord.y,
            tiles: chunk
                .tiles()
                .iter()
                .map(|tile| (tile.kind(), tile.snapshot()))
                .collect(),
        }
    }

    /// Chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        ChunkCoord::new(self.x, self.y)
    }

    /// Rebuilds the chunk, restoring each tile through the registry.
    pub fn restore(self, registry: &TileRegistry) -> StorageResult<Chunk> {
        if self.tiles.len() != CHUNK_TILES {
            return Err(StorageError::Decode(format!(
                "chunk holds {} tiles",
                self.tiles.len()
            )));
        }
        let coord = self.coord();
        let tiles = self
            .tiles
            .into_iter()
            .enumerate()
            .map(|(index, (kind, state))| {
                registry.restore(kind, coord.tile(LocalCoord::from_index(index)), state)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Chunk::from_tiles(coord, tiles))
    }
}

/// Encodes a chunk file.
pub fn encode_chunk(chunk: &Chunk) -> StorageResult<Vec<u8>> {
    encode_record(
        MagicBytes::CHUNK,
        SchemaVersion::CHUNK,
        &ChunkRecord::capture(chunk),
        true,
    )
}

/// Decodes a chunk file holding `expected`.
pub fn decode_chunk(
    bytes: &[u8],
    registry: &TileRegistry,
    expected: ChunkCoord,
) -> StorageResult<Chunk> {
    let record: ChunkRecord = decode_record(bytes, MagicBytes::CHUNK, SchemaVersion::CHUNK)?;
    if record.coord() != expected {
        return Err(StorageError::WrongChunk {
            expected,
            found: record.coord(),
        });
    }
    record.restore(registry)
}

/// Reads a saved chunk. `Ok(None)` when no file exists.
pub fn load_chunk_file(
    paths: &WorldPaths,
    registry: &TileRegistry,
    coord: ChunkCoord,
) -> StorageResult<Option<Chunk>> {
    let bytes = match fs::read(paths.chunk(coord)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    decode_chunk(&bytes, registry, coord).map(Some)
}

/// Writes `world.bin`.
pub fn write_world_meta(paths: &WorldPaths, meta: &WorldMeta) -> StorageResult<()> {
    let bytes = encode_record(MagicBytes::WORLD, SchemaVersion::WORLD_META, meta, false)?;
    write_file(&paths.meta(), &bytes)
}

/// Reads `world.bin`.
pub fn read_world_meta(paths: &WorldPaths) -> StorageResult<WorldMeta> {
    let bytes = fs::read(paths.meta())?;
    decode_record(&bytes, MagicBytes::WORLD, SchemaVersion::WORLD_META)
}
