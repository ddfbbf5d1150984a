//! Timed mouth-shape cues for an utterance
//!
//! The cue document is produced by the phoneme extraction step of the
//! upstream pipeline: `{ "mouthCues": [ { "start", "end", "value" }, ... ] }`
//! where `value` is a one-letter phoneme-class code. Cues are ordered and
//! assumed non-overlapping by construction of the generator; this module does
//! not enforce that, and lookup is first-match-wins.

use serde::Deserialize;

use super::AssetResult;

/// A single mouth-shape cue covering a time window of the audio
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cue {
    /// Window start in seconds
    pub start: f32,
    /// Window end in seconds
    pub end: f32,
    /// Phoneme-class code (kept raw; unknown codes are resolved downstream)
    pub value: String,
}

impl Cue {
    /// Create a new cue
    pub fn new(start: f32, end: f32, value: &str) -> Self {
        Self {
            start,
            end,
            value: value.to_string(),
        }
    }

    /// Whether the window contains `time` (inclusive on both ends)
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start && time <= self.end
    }
}

/// On-the-wire shape of the cue document
#[derive(Debug, Deserialize)]
struct CueDocument {
    #[serde(rename = "mouthCues", default)]
    mouth_cues: Vec<Cue>,
}

/// The full cue sequence for one utterance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueTrack {
    cues: Vec<Cue>,
}

impl CueTrack {
    /// Create a track from a cue sequence (kept in given order)
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    /// Parse a cue document
    ///
    /// A document with no `mouthCues` key parses as an empty track.
    pub fn from_json(bytes: &[u8]) -> AssetResult<Self> {
        let doc: CueDocument = serde_json::from_slice(bytes)?;
        Ok(Self::new(doc.mouth_cues))
    }

    /// First cue whose window contains `time`, if any
    pub fn cue_at(&self, time: f32) -> Option<&Cue> {
        self.cues.iter().find(|c| c.contains(time))
    }

    /// End of the last-ending cue (0.0 for an empty track)
    pub fn end_time(&self) -> f32 {
        self.cues.iter().fold(0.0, |acc, c| acc.max(c.end))
    }

    /// All cues in document order
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the track has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cue_contains() {
        let cue = Cue::new(0.5, 1.2, "D");
        assert!(cue.contains(0.5));
        assert!(cue.contains(0.7));
        assert!(cue.contains(1.2));
        assert!(!cue.contains(0.49));
        assert!(!cue.contains(1.21));
    }

    #[test]
    fn test_parse_document() {
        let json = br#"{
            "metadata": { "soundFile": "current.wav", "duration": 1.2 },
            "mouthCues": [
                { "start": 0.0, "end": 0.5, "value": "X" },
                { "start": 0.5, "end": 1.2, "value": "D" }
            ]
        }"#;
        let track = CueTrack::from_json(json).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.cues()[0].value, "X");
        assert_eq!(track.cues()[1].start, 0.5);
        assert_eq!(track.end_time(), 1.2);
    }

    #[test]
    fn test_parse_missing_cues_key() {
        let track = CueTrack::from_json(b"{}").unwrap();
        assert!(track.is_empty());
        assert_eq!(track.end_time(), 0.0);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(CueTrack::from_json(b"not json").is_err());
        assert!(CueTrack::from_json(br#"{"mouthCues": [{"start": "a"}]}"#).is_err());
    }

    #[test]
    fn test_cue_at_first_match() {
        // Overlap is unspecified upstream; first match wins here.
        let track = CueTrack::new(vec![
            Cue::new(0.0, 1.0, "A"),
            Cue::new(0.5, 1.5, "B"),
        ]);
        assert_eq!(track.cue_at(0.7).unwrap().value, "A");
        assert_eq!(track.cue_at(1.2).unwrap().value, "B");
    }

    #[test]
    fn test_cue_at_gap_and_past_end() {
        let track = CueTrack::new(vec![
            Cue::new(0.0, 0.5, "X"),
            Cue::new(0.8, 1.2, "D"),
        ]);
        assert!(track.cue_at(0.6).is_none());
        assert!(track.cue_at(1.5).is_none());
        assert_eq!(track.cue_at(0.3).unwrap().value, "X");
    }

    #[test]
    fn test_empty_track() {
        let track = CueTrack::default();
        assert!(track.cue_at(0.0).is_none());
        assert!(track.is_empty());
    }

    proptest! {
        #[test]
        fn prop_cue_at_agrees_with_containment(
            spans in proptest::collection::vec((0.0f32..0.5, 0.01f32..1.0), 0..12),
            probe in 0.0f32..20.0,
        ) {
            // Build a gapped, non-overlapping track the way the generator would.
            let mut cues = Vec::new();
            let mut t = 0.0f32;
            for (gap, len) in spans {
                let start = t + gap;
                let end = start + len;
                cues.push(Cue::new(start, end, "A"));
                t = end;
            }
            let track = CueTrack::new(cues.clone());
            match track.cue_at(probe) {
                Some(hit) => prop_assert!(hit.contains(probe)),
                None => prop_assert!(!cues.iter().any(|c| c.contains(probe))),
            }
        }
    }
}
