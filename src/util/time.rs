//! Time utilities for the simulation and sync timers

use std::time::{Duration, Instant};

/// Process start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize process start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const DEFAULT_TICK_RATE: u32 = 60; // one tick per display refresh
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SYNC_MIN_GAP_MS: u64 = 80;

/// Wall-clock length of one simulation tick
pub fn tick_duration(tick_rate: u32) -> Duration {
    Duration::from_micros((1_000_000 / u64::from(tick_rate.max(1))).max(1))
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
