//! # Atoll
//!
//! Entry point of the atoll game: a top-down tile world with streamed,
//! generated chunks and caves below the overworld.
//!
//! This crate ties together:
//! - World: tiles, chunk streaming, generation and persistence
//! - Gameplay: player, inventory and the nested-world session
//! - Window, keyboard and presentation of the CPU-drawn frame

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod assets;
mod config;
mod events;
mod input;
mod presenter;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("atoll=info".parse()?))
        .init();

    info!("Atoll starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    app::run()?;

    info!("Atoll shutdown complete");
    Ok(())
}
