//! Monotonic tick counter.
//!
//! One tick elapses per session update regardless of frame duration. The
//! counter timestamps chunk access, gates periodic housekeeping, and drives
//! timed tile behaviours, which read it through [`TickClock::now`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Simulation ticks per second.
pub const TICKS_PER_SECOND: u64 = 60;

/// Shared handle to a tick counter. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    ticks: Arc<AtomicU64>,
}

impl TickClock {
    /// Creates a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter starting at the given tick.
    #[must_use]
    pub fn starting_at(tick: u64) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(tick)),
        }
    }

    /// Current tick.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Advances the counter by one tick and returns the new value.
    pub fn advance(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}
