//! The playback synchronizer state machine
//!
//! Owns the playback session and walks `Idle -> Loading -> Playing -> Idle`,
//! with interruption re-entering at `Loading`. Each tick resolves the cue
//! window containing the current audio position and hard-cuts the mouth to
//! the mapped viseme, keeping the invariant that at most one viseme target
//! carries weight at any instant.
//!
//! Loading happens off-thread; results are handed back through
//! `begin_playing` guarded by a generation token so a stale load (one that
//! lost a race against a newer utterance) is discarded without touching the
//! mesh.

use std::sync::Arc;

use tracing::{debug, info};

use crate::asset::{CueTrack, Utterance};
use crate::audio::{PlaybackResult, SpeechAudio};
use crate::gesture::GestureMachine;
use crate::mouth::{MorphMesh, Viseme, VISEME_PARTS};

/// Synchronizer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing playing, idle clip running
    #[default]
    Idle,
    /// Assets for the next utterance are in flight
    Loading,
    /// Audio is playing and the poll loop is live
    Playing,
}

/// Outcome of one poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Playing, or a gesture fade still needs driving; keep polling
    Active,
    /// Audio reached its natural end this tick
    Finished,
    /// Nothing left to poll; the timer should stop
    Inactive,
}

/// The ephemeral binding of one utterance to its playback resources
struct PlaybackSession {
    utterance: Utterance,
    cues: Arc<CueTrack>,
    audio: Box<dyn SpeechAudio>,
    active: Option<Viseme>,
}

/// Viseme-driven lip-sync playback engine
pub struct PlaybackSynchronizer<M: MorphMesh> {
    state: EngineState,
    session: Option<PlaybackSession>,
    pending: Option<Utterance>,
    generation: u64,
    mesh: M,
    gestures: GestureMachine,
}

impl<M: MorphMesh> PlaybackSynchronizer<M> {
    /// Create an idle synchronizer writing weights into `mesh`
    pub fn new(mesh: M, gestures: GestureMachine) -> Self {
        Self {
            state: EngineState::Idle,
            session: None,
            pending: None,
            generation: 0,
            mesh,
            gestures,
        }
    }

    /// Begin a new playback cycle for `utterance`
    ///
    /// Tears down any current session (audio paused and rewound, mouth
    /// zeroed) before entering `Loading`, so at most one session exists at a
    /// time. Returns the generation token the eventual `begin_playing` or
    /// `fail_loading` call must present.
    pub fn begin_loading(&mut self, utterance: Utterance) -> u64 {
        self.teardown_session();
        self.generation += 1;
        debug!(utterance = %utterance, generation = self.generation, "loading utterance");
        self.pending = Some(utterance);
        self.state = EngineState::Loading;
        self.generation
    }

    /// Promote a finished load into `Playing`
    ///
    /// Returns `Ok(false)` when `token` is stale (a newer utterance has
    /// started loading meanwhile), in which case nothing changes and the
    /// caller just drops the assets. On playback failure the engine resolves
    /// to `Idle`.
    pub fn begin_playing(
        &mut self,
        token: u64,
        cues: Arc<CueTrack>,
        mut audio: Box<dyn SpeechAudio>,
    ) -> PlaybackResult<bool> {
        if token != self.generation || self.state != EngineState::Loading {
            debug!(token, generation = self.generation, "discarding stale load");
            return Ok(false);
        }
        let utterance = match self.pending.take() {
            Some(u) => u,
            None => return Ok(false),
        };

        if let Err(e) = audio.play() {
            self.state = EngineState::Idle;
            return Err(e);
        }

        self.gestures.on_utterance(utterance.as_str());
        info!(utterance = %utterance, cues = cues.len(), "utterance playing");
        self.session = Some(PlaybackSession {
            utterance,
            cues,
            audio,
            active: None,
        });
        self.state = EngineState::Playing;
        Ok(true)
    }

    /// Abort a load that failed
    ///
    /// A no-op when `token` is stale, so a failed old load cannot knock a
    /// newer one out of `Loading`.
    pub fn fail_loading(&mut self, token: u64) -> bool {
        if token != self.generation || self.state != EngineState::Loading {
            return false;
        }
        self.pending = None;
        self.state = EngineState::Idle;
        true
    }

    /// One poll step: advance fades, resolve the active cue, update weights
    ///
    /// Outside `Playing` the tick keeps reporting `Active` while a gesture
    /// cross-fade is in flight, since the poll loop is the only clock the
    /// fade has, and `Inactive` once it completes.
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        self.gestures.update(dt);

        if self.state != EngineState::Playing {
            if self.gestures.is_fading() {
                return TickOutcome::Active;
            }
            return TickOutcome::Inactive;
        }
        let session = match self.session.as_mut() {
            Some(s) => s,
            None => return TickOutcome::Inactive,
        };

        if session.audio.is_ended() {
            self.finish_playback();
            return TickOutcome::Finished;
        }

        let position = session.audio.position();
        match session.cues.cue_at(position) {
            Some(cue) => {
                // An unknown phoneme code is a no-op: the mouth holds its
                // current shape for the length of the bad cue.
                if let Some(viseme) = Viseme::from_phoneme_code(&cue.value) {
                    if session.active != Some(viseme) {
                        if let Some(previous) = session.active {
                            Self::write_viseme(&mut self.mesh, previous, 0.0);
                        }
                        Self::write_viseme(&mut self.mesh, viseme, 1.0);
                        session.active = Some(viseme);
                    }
                }
            }
            None => {
                if let Some(previous) = session.active.take() {
                    Self::write_viseme(&mut self.mesh, previous, 0.0);
                }
            }
        }
        TickOutcome::Active
    }

    /// Stop playback immediately and return to idle
    pub fn stop(&mut self) {
        self.teardown_session();
        self.pending = None;
        if self.state != EngineState::Idle {
            self.state = EngineState::Idle;
            self.gestures.on_idle();
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Token of the most recent `begin_loading` call
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Utterance currently playing, if any
    pub fn current_utterance(&self) -> Option<&Utterance> {
        self.session.as_ref().map(|s| &s.utterance)
    }

    /// Viseme currently carrying weight, if any
    pub fn active_viseme(&self) -> Option<Viseme> {
        self.session.as_ref().and_then(|s| s.active)
    }

    /// The blend-weight sink
    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    /// The gesture state machine
    pub fn gestures(&self) -> &GestureMachine {
        &self.gestures
    }

    fn finish_playback(&mut self) {
        if let Some(mut session) = self.session.take() {
            info!(utterance = %session.utterance, "utterance finished");
            if let Some(viseme) = session.active.take() {
                Self::write_viseme(&mut self.mesh, viseme, 0.0);
            }
            session.audio.pause();
        }
        self.state = EngineState::Idle;
        self.gestures.on_idle();
    }

    fn teardown_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(viseme) = session.active.take() {
                Self::write_viseme(&mut self.mesh, viseme, 0.0);
            }
            session.audio.pause();
            session.audio.rewind();
        }
    }

    fn write_viseme(mesh: &mut M, viseme: Viseme, weight: f32) {
        for part in VISEME_PARTS {
            mesh.set_morph_weight(part, viseme.morph_target(), weight);
        }
    }
}
