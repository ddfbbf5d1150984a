//! Playback synchronization
//!
//! # Architecture
//!
//! The synchronizer is a pure state machine: give it assets, tick it, read
//! the mesh. Everything wall-clock shaped lives around it: the `PollTimer`
//! driving ticks at a fixed cadence and the `AvatarPlayer` loading assets
//! off-thread and owning the timer's lifecycle.
//!
//! # Thread safety
//!
//! All engine mutation funnels through one mutex around the synchronizer;
//! loader threads and the timer thread never touch the mesh directly.

pub mod player;
pub mod synchronizer;
pub mod timer;

pub use player::AvatarPlayer;
pub use synchronizer::{EngineState, PlaybackSynchronizer, TickOutcome};
pub use timer::PollTimer;
