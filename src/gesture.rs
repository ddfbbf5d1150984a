//! Gesture clip selection and cross-fading
//!
//! A small animation state machine beside the mouth: the idle clip runs by
//! default, selected utterances trigger a named gesture clip, and every
//! transition is a fixed-duration cross-fade. Only one gesture intent is
//! honored per utterance; a new utterance preempts immediately.

/// Default cross-fade duration in seconds
pub const GESTURE_FADE_SECS: f32 = 0.5;

/// A named, time-bounded animation clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureClip {
    /// Breathing loop, the resting state
    Idle,
    /// Wave played for greeting utterances
    StandingGreeting,
    /// Annoyed arm gesture
    AngryGesture,
}

impl GestureClip {
    /// All clips the rig carries
    pub const ALL: [GestureClip; 3] = [
        GestureClip::Idle,
        GestureClip::StandingGreeting,
        GestureClip::AngryGesture,
    ];

    /// Clip name in the animation library
    pub fn clip_name(self) -> &'static str {
        match self {
            GestureClip::Idle => "Idle",
            GestureClip::StandingGreeting => "Standing Greeting",
            GestureClip::AngryGesture => "Angry Gesture",
        }
    }
}

/// Gesture clip keyed by utterance identifier
///
/// Static configuration; identifiers absent from the table leave whatever
/// clip is running untouched.
pub fn clip_for_utterance(utterance: &str) -> Option<GestureClip> {
    match utterance {
        "welcome" => Some(GestureClip::StandingGreeting),
        "pizzas" => Some(GestureClip::AngryGesture),
        _ => None,
    }
}

/// Cross-fading gesture state machine
#[derive(Debug)]
pub struct GestureMachine {
    active: GestureClip,
    fading_from: Option<GestureClip>,
    fade_elapsed: f32,
    fade_duration: f32,
}

impl GestureMachine {
    /// Create a machine resting on the idle clip
    pub fn new(fade_duration: f32) -> Self {
        Self {
            active: GestureClip::Idle,
            fading_from: None,
            fade_elapsed: 0.0,
            fade_duration: fade_duration.max(0.0),
        }
    }

    /// Start cross-fading to `clip`, preempting any fade in progress
    pub fn play(&mut self, clip: GestureClip) {
        if clip == self.active && self.fading_from.is_none() {
            return;
        }
        if self.fade_duration == 0.0 {
            self.active = clip;
            self.fading_from = None;
            return;
        }
        self.fading_from = Some(self.active);
        self.active = clip;
        self.fade_elapsed = 0.0;
    }

    /// React to a new utterance; returns the clip started, if any
    pub fn on_utterance(&mut self, utterance: &str) -> Option<GestureClip> {
        let clip = clip_for_utterance(utterance)?;
        self.play(clip);
        Some(clip)
    }

    /// Cross-fade back to the idle clip
    pub fn on_idle(&mut self) {
        self.play(GestureClip::Idle);
    }

    /// Advance fade progress by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.fading_from.is_some() {
            self.fade_elapsed += dt.max(0.0);
            if self.fade_elapsed >= self.fade_duration {
                self.fading_from = None;
            }
        }
    }

    /// The clip currently winning (or being faded in)
    pub fn active(&self) -> GestureClip {
        self.active
    }

    /// Whether a cross-fade is in progress
    pub fn is_fading(&self) -> bool {
        self.fading_from.is_some()
    }

    /// Blend weight of `clip` in [0, 1]
    pub fn weight_of(&self, clip: GestureClip) -> f32 {
        match self.fading_from {
            Some(from) => {
                let t = (self.fade_elapsed / self.fade_duration).clamp(0.0, 1.0);
                if clip == self.active {
                    t
                } else if clip == from {
                    1.0 - t
                } else {
                    0.0
                }
            }
            None => {
                if clip == self.active {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new(GESTURE_FADE_SECS)
    }
}
