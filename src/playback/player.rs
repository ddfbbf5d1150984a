//! Threaded playback driver
//!
//! `AvatarPlayer` is the boundary the presentation layer talks to: hand it
//! an utterance and read blend weights back. It owns the shared
//! synchronizer, fetches assets on a background thread per utterance, and
//! arms/cancels the poll timer. All engine failures are absorbed here:
//! logged, resolved to the idle state, never propagated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::asset::{AssetSource, AssetStore, Utterance};
use crate::audio::AudioBackend;
use crate::config::Options;
use crate::gesture::{GestureClip, GestureMachine};
use crate::mouth::{BlendState, MeshPart, Viseme};
use crate::playback::synchronizer::{EngineState, PlaybackSynchronizer, TickOutcome};
use crate::playback::timer::PollTimer;

/// Player driving one avatar's mouth and gestures
pub struct AvatarPlayer<S: AssetSource + 'static> {
    sync: Arc<Mutex<PlaybackSynchronizer<BlendState>>>,
    store: Arc<AssetStore<S>>,
    backend: Arc<dyn AudioBackend>,
    timer: Arc<Mutex<Option<PollTimer>>>,
    options: Options,
}

impl<S: AssetSource + 'static> AvatarPlayer<S> {
    /// Create an idle player
    pub fn new(store: AssetStore<S>, backend: Arc<dyn AudioBackend>, options: Options) -> Self {
        let gestures = GestureMachine::new(options.gesture_fade_secs);
        Self {
            sync: Arc::new(Mutex::new(PlaybackSynchronizer::new(
                BlendState::new(),
                gestures,
            ))),
            store: Arc::new(store),
            backend,
            timer: Arc::new(Mutex::new(None)),
            options,
        }
    }

    /// Start a new playback cycle, interrupting any current one
    ///
    /// Returns immediately; assets load on a background thread. Failures are
    /// logged and leave the player idle awaiting the next utterance.
    pub fn speak(&self, utterance: Utterance) {
        // Cancel the previous cycle's timer before anything else so no tick
        // lands between teardown and the new session.
        Self::cancel_timer(&self.timer);

        let token = self.sync.lock().begin_loading(utterance.clone());

        let sync = Arc::clone(&self.sync);
        let store = Arc::clone(&self.store);
        let backend = Arc::clone(&self.backend);
        let timer = Arc::clone(&self.timer);
        let volume = self.options.speech_volume;
        let poll_interval = Duration::from_millis(self.options.poll_interval_ms);

        let _loader = std::thread::spawn(move || {
            let loaded = store
                .cue_track(&utterance)
                .and_then(|cues| store.audio(&utterance).map(|wav| (cues, wav)));

            let (cues, wav) = match loaded {
                Ok(assets) => assets,
                Err(e) => {
                    warn!(utterance = %utterance, error = %e, "asset load failed");
                    sync.lock().fail_loading(token);
                    return;
                }
            };

            let audio = match backend.open(wav, volume) {
                Ok(audio) => audio,
                Err(e) => {
                    warn!(utterance = %utterance, error = %e, "audio open failed");
                    sync.lock().fail_loading(token);
                    return;
                }
            };

            let started = match sync.lock().begin_playing(token, cues, audio) {
                Ok(started) => started,
                Err(e) => {
                    warn!(utterance = %utterance, error = %e, "playback start failed");
                    return;
                }
            };
            if !started {
                debug!(utterance = %utterance, "superseded before playback started");
                return;
            }

            Self::arm_timer(&timer, &sync, token, poll_interval);
        });
    }

    /// Stop playback and return to idle
    pub fn stop(&self) {
        Self::cancel_timer(&self.timer);
        self.sync.lock().stop();
    }

    /// Current engine state
    pub fn state(&self) -> EngineState {
        self.sync.lock().state()
    }

    /// Whether nothing is loading or playing
    pub fn is_idle(&self) -> bool {
        self.state() == EngineState::Idle
    }

    /// Viseme currently carrying weight
    pub fn active_viseme(&self) -> Option<Viseme> {
        self.sync.lock().active_viseme()
    }

    /// Snapshot of all nonzero blend weights
    pub fn blend_snapshot(&self) -> Vec<(MeshPart, String, f32)> {
        self.sync.lock().mesh().nonzero_targets()
    }

    /// Gesture clip currently winning, and whether a fade is in progress
    pub fn gesture(&self) -> (GestureClip, bool) {
        let sync = self.sync.lock();
        (sync.gestures().active(), sync.gestures().is_fading())
    }

    /// The asset store
    pub fn store(&self) -> &AssetStore<S> {
        &self.store
    }

    /// Block until the player is idle or `timeout` elapses
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.is_idle() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        self.is_idle()
    }

    fn cancel_timer(timer: &Mutex<Option<PollTimer>>) {
        let taken = timer.lock().take();
        if let Some(mut t) = taken {
            t.cancel();
        }
    }

    fn arm_timer(
        timer: &Mutex<Option<PollTimer>>,
        sync: &Arc<Mutex<PlaybackSynchronizer<BlendState>>>,
        token: u64,
        period: Duration,
    ) {
        let tick_sync = Arc::clone(sync);
        let dt = period.as_secs_f32();
        let poll = PollTimer::spawn(period, move || {
            !matches!(tick_sync.lock().tick(dt), TickOutcome::Inactive)
        });

        // A newer utterance may have started while the timer was being
        // created; its generation decides whether this one lives.
        let mut slot = timer.lock();
        if sync.lock().generation() == token {
            if let Some(mut stale) = slot.replace(poll) {
                stale.cancel();
            }
        } else {
            drop(slot);
            let mut poll = poll;
            poll.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::DirAssetSource;
    use crate::audio::{PlaybackResult, ScriptHandle, ScriptedAudio, SpeechAudio};
    use crate::mouth::Viseme;

    const CUE_JSON: &[u8] = br#"{ "mouthCues": [
        { "start": 0.0, "end": 0.5, "value": "X" },
        { "start": 0.5, "end": 1.2, "value": "D" }
    ] }"#;

    /// Backend handing out scripted audio and keeping the drive handles
    struct ScriptedBackend {
        handles: Mutex<Vec<ScriptHandle>>,
    }

    impl ScriptedBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                handles: Mutex::new(Vec::new()),
            })
        }

        fn handle(&self, index: usize) -> ScriptHandle {
            self.handles.lock()[index].clone()
        }

        fn opened(&self) -> usize {
            self.handles.lock().len()
        }
    }

    impl AudioBackend for ScriptedBackend {
        fn open(&self, _wav: Vec<u8>, _volume: f32) -> PlaybackResult<Box<dyn SpeechAudio>> {
            let (audio, handle) = ScriptedAudio::new();
            self.handles.lock().push(handle);
            Ok(Box::new(audio))
        }
    }

    fn fixture_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(format!("{name}.json")), CUE_JSON).unwrap();
            std::fs::write(dir.path().join(format!("{name}.wav")), b"RIFF").unwrap();
        }
        dir
    }

    fn player_over(
        dir: &tempfile::TempDir,
        backend: Arc<ScriptedBackend>,
    ) -> AvatarPlayer<DirAssetSource> {
        let store = AssetStore::new(DirAssetSource::new(dir.path()), 4);
        AvatarPlayer::new(store, backend, Options::default())
    }

    fn wait_for<F: Fn() -> bool>(what: &str, cond: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("timed out waiting for {what}");
    }

    #[test]
    fn test_speak_plays_and_animates() {
        let dir = fixture_dir(&["current"]);
        let backend = ScriptedBackend::new();
        let player = player_over(&dir, Arc::clone(&backend));

        player.speak(Utterance::new("current").unwrap());
        wait_for("playing", || player.state() == EngineState::Playing);

        let handle = backend.handle(0);
        assert!(handle.is_playing());

        handle.set_position(0.7);
        wait_for("viseme D", || {
            player.active_viseme() == Some(Viseme::Aa)
        });
        let snapshot = player.blend_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|(_, t, w)| t == "viseme_aa" && *w == 1.0));

        handle.set_position(1.5);
        wait_for("neutral past last cue", || player.blend_snapshot().is_empty());
        assert_eq!(player.state(), EngineState::Playing);
    }

    #[test]
    fn test_natural_end_returns_to_idle() {
        let dir = fixture_dir(&["pizzas"]);
        let backend = ScriptedBackend::new();
        let player = player_over(&dir, Arc::clone(&backend));

        player.speak(Utterance::new("pizzas").unwrap());
        wait_for("playing", || player.state() == EngineState::Playing);
        assert_eq!(player.gesture().0, GestureClip::AngryGesture);

        backend.handle(0).finish();
        assert!(player.wait_idle(Duration::from_secs(2)));
        assert!(player.blend_snapshot().is_empty());
        assert_eq!(player.gesture().0, GestureClip::Idle);
    }

    #[test]
    fn test_interruption_pauses_previous_audio() {
        let dir = fixture_dir(&["welcome", "current"]);
        let backend = ScriptedBackend::new();
        let player = player_over(&dir, Arc::clone(&backend));

        player.speak(Utterance::new("welcome").unwrap());
        wait_for("first playing", || player.state() == EngineState::Playing);

        player.speak(Utterance::new("current").unwrap());
        wait_for("second playing", || {
            backend.opened() == 2 && player.state() == EngineState::Playing
        });

        let first = backend.handle(0);
        assert!(!first.is_playing());
        assert!(first.pause_count() >= 1);
        assert!(backend.handle(1).is_playing());
    }

    #[test]
    fn test_missing_assets_leave_player_idle() {
        let dir = fixture_dir(&[]);
        let backend = ScriptedBackend::new();
        let player = player_over(&dir, Arc::clone(&backend));

        player.speak(Utterance::new("ghost").unwrap());
        assert!(player.wait_idle(Duration::from_secs(2)));
        assert!(player.blend_snapshot().is_empty());
        assert_eq!(backend.opened(), 0);
    }

    #[test]
    fn test_stop_while_playing() {
        let dir = fixture_dir(&["current"]);
        let backend = ScriptedBackend::new();
        let player = player_over(&dir, Arc::clone(&backend));

        player.speak(Utterance::new("current").unwrap());
        wait_for("playing", || player.state() == EngineState::Playing);

        player.stop();
        assert!(player.is_idle());
        assert!(!backend.handle(0).is_playing());
        assert!(player.blend_snapshot().is_empty());
    }
}
