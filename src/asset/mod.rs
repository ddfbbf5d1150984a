//! Utterance assets: cue tracks and speech audio
//!
//! An utterance is a filename-derived key naming a pair of generated assets:
//! a WAV recording of synthesized speech and a JSON cue document describing
//! the mouth shapes to show while it plays. This module owns the data model
//! for those assets and the loaders that retrieve them.

pub mod cue;
pub mod store;

pub use cue::{Cue, CueTrack};
pub use store::{AssetSource, AssetStore, DirAssetSource, HttpAssetSource};

use std::fmt;

use thiserror::Error;

/// Error type for asset operations
#[derive(Debug, Error)]
pub enum AssetError {
    /// Utterance name is empty or would escape the asset location
    #[error("invalid utterance name `{0}`")]
    InvalidUtterance(String),
    /// Audio or cue resource is missing (or the server answered non-success)
    #[error("asset not found: {0}")]
    NotFound(String),
    /// Transport-level failure talking to the asset server
    #[error("network error: {0}")]
    Network(String),
    /// Cue document did not parse
    #[error("malformed cue document: {0}")]
    InvalidCue(#[from] serde_json::Error),
    /// I/O error reading a local asset
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Identifier naming a cue-track/audio pair
///
/// Derived from the synthesized audio filename minus its extension. The name
/// becomes part of a path on the asset server, so separators and parent
/// references are rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utterance(String);

impl Utterance {
    /// Create a validated utterance identifier
    pub fn new<S: Into<String>>(name: S) -> AssetResult<Self> {
        let name = name.into();
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(AssetError::InvalidUtterance(name));
        }
        Ok(Self(name))
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename of the cue document for this utterance
    pub fn cue_filename(&self) -> String {
        format!("{}.json", self.0)
    }

    /// Filename of the audio asset for this utterance
    pub fn audio_filename(&self) -> String {
        format!("{}.wav", self.0)
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_valid() {
        let u = Utterance::new("current").unwrap();
        assert_eq!(u.as_str(), "current");
        assert_eq!(u.cue_filename(), "current.json");
        assert_eq!(u.audio_filename(), "current.wav");
    }

    #[test]
    fn test_utterance_rejects_empty() {
        assert!(matches!(
            Utterance::new(""),
            Err(AssetError::InvalidUtterance(_))
        ));
    }

    #[test]
    fn test_utterance_rejects_traversal() {
        assert!(Utterance::new("../etc/passwd").is_err());
        assert!(Utterance::new("a/b").is_err());
        assert!(Utterance::new("a\\b").is_err());
        assert!(Utterance::new("..").is_err());
    }

    #[test]
    fn test_utterance_display() {
        let u = Utterance::new("welcome").unwrap();
        assert_eq!(format!("{}", u), "welcome");
    }
}
