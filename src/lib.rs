//! Viseme-driven lip-sync playback engine
//!
//! Drives a 3D avatar's mouth in time with synthesized speech: a timed
//! phoneme-class cue track is fetched alongside the audio, and on a fixed
//! poll cadence the engine resolves the active cue, maps it to a morph
//! target, and hard-cuts blend weights on the mesh, while a small gesture
//! state machine cross-fades idle and gesture clips around it.
//!
//! The speech pipeline itself (transcription, chat, TTS, phoneme
//! extraction) is an external collaborator behind HTTP; see
//! [`pipeline::PipelineClient`].

pub mod asset;
pub mod audio;
pub mod cli;
pub mod config;
pub mod gesture;
pub mod mouth;
pub mod pipeline;
pub mod playback;

pub use asset::{AssetError, AssetSource, AssetStore, Cue, CueTrack, Utterance};
pub use audio::{AudioBackend, AudioOutput, PlaybackError, SpeechAudio};
pub use cli::Cli;
pub use config::Options;
pub use gesture::{GestureClip, GestureMachine};
pub use mouth::{BlendState, MeshPart, MorphMesh, Viseme};
pub use pipeline::{PipelineClient, PipelineError};
pub use playback::{AvatarPlayer, EngineState, PlaybackSynchronizer, PollTimer};
