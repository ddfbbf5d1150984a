//! Engine options
//!
//! All state is in-memory per run; options come from defaults merged with
//! the command line.

use anyhow::{Context, Result};

use crate::gesture::GESTURE_FADE_SECS;

/// Default backend/asset server
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default poll cadence for the lip-sync timer
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Engine options that can be set via the CLI
#[derive(Debug, Clone)]
pub struct Options {
    /// Base URL of the backend serving assets and the pipeline API
    pub server_url: String,
    /// Lip-sync poll cadence in milliseconds
    pub poll_interval_ms: u64,
    /// Gesture cross-fade duration in seconds
    pub gesture_fade_secs: f32,
    /// Speech volume in [0.0, 1.0]
    pub speech_volume: f32,
    /// Parsed cue tracks kept in the LRU cache
    pub cue_cache_entries: usize,
    /// Skip the audio device and run on the wall clock
    pub silent: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            gesture_fade_secs: GESTURE_FADE_SECS,
            speech_volume: 1.0,
            cue_cache_entries: 16,
            silent: false,
        }
    }
}

impl Options {
    /// Check option ranges
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            anyhow::bail!("server URL must not be empty");
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll interval must be at least 1 ms");
        }
        if self.gesture_fade_secs < 0.0 {
            anyhow::bail!("gesture fade must not be negative");
        }
        Ok(())
    }
}

/// Parse a volume value (0-100) to a float (0.0-1.0)
pub fn parse_volume(vol: i32) -> f32 {
    if vol < 0 {
        return 0.0;
    }
    if vol > 100 {
        return 1.0;
    }
    vol as f32 / 100.0
}

/// Parse a gesture fade duration in seconds
pub fn parse_fade(s: &str) -> Result<f32> {
    let fade: f32 = s.parse().context("Invalid fade value")?;
    if !(0.0..=10.0).contains(&fade) {
        anyhow::bail!("Gesture fade out of range (0 to 10 seconds)");
    }
    Ok(fade)
}
