//! Speech audio playback
//!
//! The synchronizer only needs four things from audio: start it, stop it,
//! know where it is, and know when it is done. `SpeechAudio` captures that;
//! backends decide how it is honored. The rodio backend does real output,
//! the null backend runs the same timeline silently when no device exists,
//! and the scripted clock lets tests move time by hand.

pub mod clock;
pub mod voice;
pub mod wav;

pub use clock::{ScriptHandle, ScriptedAudio, SpeechAudio};
pub use voice::{AudioBackend, AudioOutput, NullBackend, NullSpeech, RodioBackend, RodioSpeech};
pub use wav::wav_duration;

use thiserror::Error;

/// Error type for audio playback operations
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No usable output device
    #[error("no audio output device: {0}")]
    NoDevice(String),
    /// Audio data did not decode
    #[error("audio decode failed: {0}")]
    Decode(String),
    /// Output stream refused playback
    #[error("audio output failed: {0}")]
    Output(String),
}

/// Result type for audio playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;
