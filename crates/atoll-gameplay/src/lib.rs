//! # Atoll Gameplay
//!
//! Everything between the input devices and the tile world:
//! - Per-tick input snapshot
//! - Player controller with collision physics and animation
//! - Inventory and hotbar
//! - The game session with its stack of nested worlds
//! - Player and inventory persistence

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod input;
pub mod inventory;
pub mod player;
pub mod save;
pub mod session;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::input::*;
    pub use crate::inventory::*;
    pub use crate::player::*;
    pub use crate::save::*;
    pub use crate::session::*;
}

pub use prelude::*;
