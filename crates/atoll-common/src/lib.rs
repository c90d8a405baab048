//! # Atoll Common
//!
//! Common types shared by every Atoll crate:
//! - Coordinate types (tile, chunk, local, world size)
//! - World identifiers
//! - Items and tools
//! - The tick clock
//! - Schema versions and magic bytes
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod items;
pub mod tick;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::items::*;
    pub use crate::tick::*;
    pub use crate::version::*;
}

pub use prelude::*;
