//! Player stack and inventory persistence.
//!
//! Both files live in the save base directory next to the world
//! directories and use the same record framing as world files.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use atoll_common::error::{WorldError, WorldResult};
use atoll_common::ids::WorldId;
use atoll_common::items::ItemStack;
use atoll_common::version::{MagicBytes, SchemaVersion};
use atoll_world::meta::WorldType;
use atoll_world::storage::codec::{decode_record, encode_record};
use atoll_world::storage::{write_file, SaveLayout, StorageError};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::inventory::Inventory;
use crate::player::{Direction, Player};

/// Errors that can occur during save/load operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding, decoding or world file error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Saved state does not describe a playable world
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// No save for this base
    #[error("Save not found: {0}")]
    NotFound(WorldId),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// One level of the player stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// World the player is in
    pub world_id: WorldId,
    /// Type of that world
    pub world_type: WorldType,
    /// Position in tile space
    pub position: Vec2,
    /// Facing direction
    pub facing: Direction,
}

impl PlayerRecord {
    /// Captures a player.
    #[must_use]
    pub fn capture(player: &Player, world_type: WorldType) -> Self {
        Self {
            world_id: player.world(),
            world_type,
            position: player.position(),
            facing: player.facing(),
        }
    }

    /// Rebuilds the player.
    #[must_use]
    pub fn restore(&self) -> Player {
        Player::restored(self.world_id, self.position, self.facing)
    }
}

/// Persisted player stack, outermost level first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStackRecord {
    /// Tick counter when saved
    pub tick: u64,
    /// Levels, bottom of the stack first
    pub levels: Vec<PlayerRecord>,
}

/// Persisted inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Slot contents
    pub slots: Vec<Option<ItemStack>>,
    /// Selected hotbar slot
    pub selected: usize,
}

impl From<&Inventory> for InventoryRecord {
    fn from(inventory: &Inventory) -> Self {
        Self {
            slots: inventory.slots().to_vec(),
            selected: inventory.selected_index(),
        }
    }
}

impl From<InventoryRecord> for Inventory {
    fn from(record: InventoryRecord) -> Self {
        Self::from_slots(record.slots, record.selected)
    }
}

/// Writes the player stack of a base.
pub fn write_player_stack(
    layout: &SaveLayout,
    base: WorldId,
    record: &PlayerStackRecord,
) -> SaveResult<()> {
    let bytes = encode_record(MagicBytes::PLAYER, SchemaVersion::PLAYER, record, false)?;
    write_file(&layout.player_path(base), &bytes)?;
    debug!("Saved player stack of {} ({} levels)", base, record.levels.len());
    Ok(())
}

/// Reads the player stack of a base.
pub fn read_player_stack(layout: &SaveLayout, base: WorldId) -> SaveResult<PlayerStackRecord> {
    let bytes = read_or_not_found(&layout.player_path(base), base)?;
    let record: PlayerStackRecord =
        decode_record(&bytes, MagicBytes::PLAYER, SchemaVersion::PLAYER)?;
    check_stack(&record, base)?;
    Ok(record)
}

fn check_stack(record: &PlayerStackRecord, base: WorldId) -> WorldResult<()> {
    let Some(outermost) = record.levels.first() else {
        return Err(WorldError::InvalidMetadata(format!("empty player stack in {base}")));
    };
    if outermost.world_id != base || outermost.world_type != WorldType::Overworld {
        return Err(WorldError::InvalidMetadata(format!(
            "player stack of {base} does not start in its overworld"
        )));
    }
    Ok(())
}

/// Writes the inventory of a base.
pub fn write_inventory(layout: &SaveLayout, base: WorldId, inventory: &Inventory) -> SaveResult<()> {
    let record = InventoryRecord::from(inventory);
    let bytes = encode_record(MagicBytes::INVENTORY, SchemaVersion::INVENTORY, &record, false)?;
    write_file(&layout.inventory_path(base), &bytes)?;
    Ok(())
}

/// Reads the inventory of a base.
pub fn read_inventory(layout: &SaveLayout, base: WorldId) -> SaveResult<Inventory> {
    let bytes = read_or_not_found(&layout.inventory_path(base), base)?;
    let record: InventoryRecord =
        decode_record(&bytes, MagicBytes::INVENTORY, SchemaVersion::INVENTORY)?;
    Ok(record.into())
}

fn read_or_not_found(path: &Path, base: WorldId) -> SaveResult<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(SaveError::NotFound(base)),
        Err(e) => Err(e.into()),
    }
}
