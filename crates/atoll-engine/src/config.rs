//! Engine configuration.
//!
//! Read from `atoll.toml` in the platform config directory, or from the
//! working directory when there is none. Missing or unreadable files fall
//! back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use atoll_common::coords::WorldSize;
use atoll_common::tick::TICKS_PER_SECOND;
use atoll_world::config::{
    WorldConfig, CHUNK_UNLOAD_DELAY, DEFAULT_CAVE_SIZE, DEFAULT_WORLD_SIZE, EVICTION_SCAN_INTERVAL,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "atoll.toml";

/// Configuration write errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config could not be serialized
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Window ===
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// Enable VSync
    pub vsync: bool,
    /// Window pixels per game pixel
    pub render_scale: u32,

    // === Simulation ===
    /// Simulation ticks per second
    pub tick_rate: u32,

    // === World ===
    /// Save directory, relative to the working directory
    pub saves_dir: PathBuf,
    /// Side length of new overworlds in tiles
    pub world_size: u32,
    /// Side length of new caves in tiles
    pub cave_size: u32,
    /// Seed for new games (None = random)
    pub world_seed: Option<i64>,
    /// Idle ticks before a chunk is evicted
    pub unload_delay: u64,

    // === Debug ===
    /// Start with the debug overlay on
    pub show_debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            vsync: true,
            render_scale: 3,

            tick_rate: TICKS_PER_SECOND as u32,

            saves_dir: PathBuf::from("saves"),
            world_size: DEFAULT_WORLD_SIZE,
            cave_size: DEFAULT_CAVE_SIZE,
            world_seed: None,
            unload_delay: CHUNK_UNLOAD_DELAY,

            show_debug: false,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from the default location.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Loads the configuration from `path`, falling back to defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };
        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path())
    }

    /// Saves the configuration to `path`.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    fn config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("atoll").join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        self.window_width = self.window_width.clamp(320, 7680);
        self.window_height = self.window_height.clamp(240, 4320);
        self.render_scale = self.render_scale.clamp(1, 8);
        self.tick_rate = self.tick_rate.clamp(10, 240);
        self.world_size = self.world_size.clamp(64, 16384);
        self.cave_size = self.cave_size.clamp(32, 4096);
        self.unload_delay = self.unload_delay.max(EVICTION_SCAN_INTERVAL);
    }

    /// Seed for a new game.
    pub fn seed(&self) -> i64 {
        self.world_seed.unwrap_or_else(|| fastrand::i64(..))
    }

    /// World streaming and sizing parameters.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        let mut config = WorldConfig {
            world_size: WorldSize::square(self.world_size),
            cave_size: WorldSize::square(self.cave_size),
            unload_delay: self.unload_delay,
            ..WorldConfig::default()
        };
        config.validate();
        config
    }
}
