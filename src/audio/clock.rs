//! The `SpeechAudio` trait and the scripted test clock

use std::sync::Arc;

use parking_lot::Mutex;

use super::PlaybackResult;

/// Playback-position view and transport control over one utterance's audio
///
/// Positions are seconds from the start of the asset. Implementations are
/// owned by a single playback session and discarded with it.
pub trait SpeechAudio: Send {
    /// Start (or resume) playback
    fn play(&mut self) -> PlaybackResult<()>;

    /// Pause playback, keeping position
    fn pause(&mut self);

    /// Reset position to zero and discard queued audio
    fn rewind(&mut self);

    /// Current playback position in seconds
    fn position(&self) -> f32;

    /// Whether the audio has reached its natural end
    fn is_ended(&self) -> bool;
}

#[derive(Debug, Default)]
struct ScriptState {
    position: f32,
    ended: bool,
    playing: bool,
    play_calls: u32,
    pause_calls: u32,
}

/// Manually driven audio clock
///
/// Stands in for a real output stream in tests and headless drivers: the
/// position only moves when the paired [`ScriptHandle`] says so.
#[derive(Debug)]
pub struct ScriptedAudio {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedAudio {
    /// Create a scripted clock and the handle that drives it
    pub fn new() -> (Self, ScriptHandle) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            ScriptHandle { state },
        )
    }
}

impl SpeechAudio for ScriptedAudio {
    fn play(&mut self) -> PlaybackResult<()> {
        let mut state = self.state.lock();
        state.playing = true;
        state.play_calls += 1;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.pause_calls += 1;
    }

    fn rewind(&mut self) {
        self.state.lock().position = 0.0;
    }

    fn position(&self) -> f32 {
        self.state.lock().position
    }

    fn is_ended(&self) -> bool {
        self.state.lock().ended
    }
}

/// Driver side of a [`ScriptedAudio`]
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptHandle {
    /// Move the clock to `seconds`
    pub fn set_position(&self, seconds: f32) {
        self.state.lock().position = seconds;
    }

    /// Mark the audio as naturally ended
    pub fn finish(&self) {
        self.state.lock().ended = true;
    }

    /// Current position
    pub fn position(&self) -> f32 {
        self.state.lock().position
    }

    /// Whether play() has been called without a later pause()
    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Number of play() calls observed
    pub fn play_count(&self) -> u32 {
        self.state.lock().play_calls
    }

    /// Number of pause() calls observed
    pub fn pause_count(&self) -> u32 {
        self.state.lock().pause_calls
    }
}
