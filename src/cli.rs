use anyhow::Result;
use clap::Parser;

use crate::config::{parse_fade, parse_volume, Options};

/// Avatar lip-sync player
#[derive(Parser, Debug)]
#[command(name = "avatar-lipsync")]
#[command(version)]
#[command(about = "Plays a synthesized utterance with lip-sync and gestures", long_about = None)]
pub struct Cli {
    /// Backend/asset server base URL
    #[arg(short, long, value_name = "URL")]
    pub server: Option<String>,

    /// Utterance to play (its .wav and .json must exist on the server)
    #[arg(short, long, value_name = "NAME", default_value = "current")]
    pub utterance: String,

    /// Run TEXT through TTS and cue generation first, then play the result
    #[arg(long, value_name = "TEXT")]
    pub say: Option<String>,

    /// Speech volume (0-100)
    #[arg(short, long, value_name = "VOLUME")]
    pub volume: Option<i32>,

    /// Lip-sync poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Gesture cross-fade duration in seconds
    #[arg(long, value_name = "SECS")]
    pub fade: Option<String>,

    /// Do not open an audio device; animate on the wall clock only
    #[arg(long)]
    pub silent: bool,
}

impl Cli {
    /// Merge CLI arguments over existing options
    pub fn merge_into_options(&self, mut options: Options) -> Result<Options> {
        if let Some(server) = &self.server {
            options.server_url = server.clone();
        }
        if let Some(volume) = self.volume {
            options.speech_volume = parse_volume(volume);
        }
        if let Some(interval) = self.interval {
            options.poll_interval_ms = interval;
        }
        if let Some(fade) = &self.fade {
            options.gesture_fade_secs = parse_fade(fade)?;
        }
        if self.silent {
            options.silent = true;
        }
        options.validate()?;
        Ok(options)
    }
}
