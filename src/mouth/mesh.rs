//! Morph-target sink and blend-weight state
//!
//! The engine never touches renderer objects directly; it writes named
//! blend weights through the `MorphMesh` trait. `BlendState` is the default
//! sink: a plain weight board the presentation layer reads each frame, and a
//! convenient observation point in tests.

use std::collections::HashMap;

/// Mesh parts that carry viseme morph targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshPart {
    Head,
    Teeth,
}

impl MeshPart {
    /// Node name of this part in the character model
    pub fn node_name(self) -> &'static str {
        match self {
            MeshPart::Head => "Wolf3D_Head",
            MeshPart::Teeth => "Wolf3D_Teeth",
        }
    }
}

/// Parts a viseme weight is written to
pub const VISEME_PARTS: [MeshPart; 2] = [MeshPart::Head, MeshPart::Teeth];

/// Sink for morph-target blend weights
pub trait MorphMesh {
    /// Set the weight of `target` on `part`; weights are clamped to [0, 1]
    fn set_morph_weight(&mut self, part: MeshPart, target: &str, weight: f32);
}

/// In-memory blend-weight board
#[derive(Debug, Default)]
pub struct BlendState {
    weights: HashMap<(MeshPart, String), f32>,
}

impl BlendState {
    /// Create an all-neutral board
    pub fn new() -> Self {
        Self::default()
    }

    /// Current weight of a target (0.0 when never written)
    pub fn weight(&self, part: MeshPart, target: &str) -> f32 {
        self.weights
            .get(&(part, target.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    /// All targets with nonzero weight
    pub fn nonzero_targets(&self) -> Vec<(MeshPart, String, f32)> {
        let mut targets: Vec<_> = self
            .weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|((part, target), w)| (*part, target.clone(), *w))
            .collect();
        targets.sort_by(|a, b| a.1.cmp(&b.1));
        targets
    }

    /// Whether every weight is zero
    pub fn is_neutral(&self) -> bool {
        self.weights.values().all(|w| *w == 0.0)
    }

    /// Zero every weight
    pub fn clear(&mut self) {
        self.weights.clear();
    }
}

impl MorphMesh for BlendState {
    fn set_morph_weight(&mut self, part: MeshPart, target: &str, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        if weight == 0.0 {
            self.weights.remove(&(part, target.to_string()));
        } else {
            self.weights.insert((part, target.to_string()), weight);
        }
    }
}
