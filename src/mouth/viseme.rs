//! Phoneme-class to viseme mapping
//!
//! The cue generator uses a closed nine-class alphabet (`A`..`H` plus `X`
//! for silence). The mapping to morph-target names is static configuration;
//! codes outside the alphabet resolve to no target so a bad cue can never
//! take the engine down.

/// A visual mouth shape, one per phoneme class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viseme {
    /// Closed lips (p, b, m)
    Pp,
    /// Back-of-tongue closure (k, g)
    Kk,
    /// Spread lips (ih)
    I,
    /// Open jaw (aa)
    Aa,
    /// Mid-open (eh)
    E,
    /// Rounded lips (uw, ow)
    U,
    /// Lip-teeth contact (f, v)
    Ff,
    /// Tongue between teeth (th)
    Th,
    /// Explicit silence shape
    Sil,
}

impl Viseme {
    /// All visemes, in phoneme-class order
    pub const ALL: [Viseme; 9] = [
        Viseme::Pp,
        Viseme::Kk,
        Viseme::I,
        Viseme::Aa,
        Viseme::E,
        Viseme::U,
        Viseme::Ff,
        Viseme::Th,
        Viseme::Sil,
    ];

    /// Resolve a phoneme-class code; unknown codes map to `None`
    pub fn from_phoneme_code(code: &str) -> Option<Viseme> {
        match code {
            "A" => Some(Viseme::Pp),
            "B" => Some(Viseme::Kk),
            "C" => Some(Viseme::I),
            "D" => Some(Viseme::Aa),
            "E" => Some(Viseme::E),
            "F" => Some(Viseme::U),
            "G" => Some(Viseme::Ff),
            "H" => Some(Viseme::Th),
            "X" => Some(Viseme::Sil),
            _ => None,
        }
    }

    /// The phoneme-class code this viseme answers to
    pub fn phoneme_code(self) -> &'static str {
        match self {
            Viseme::Pp => "A",
            Viseme::Kk => "B",
            Viseme::I => "C",
            Viseme::Aa => "D",
            Viseme::E => "E",
            Viseme::U => "F",
            Viseme::Ff => "G",
            Viseme::Th => "H",
            Viseme::Sil => "X",
        }
    }

    /// Morph-target name on the mesh
    pub fn morph_target(self) -> &'static str {
        match self {
            Viseme::Pp => "viseme_PP",
            Viseme::Kk => "viseme_kk",
            Viseme::I => "viseme_I",
            Viseme::Aa => "viseme_aa",
            Viseme::E => "viseme_E",
            Viseme::U => "viseme_U",
            Viseme::Ff => "viseme_FF",
            Viseme::Th => "viseme_TH",
            Viseme::Sil => "viseme_sil",
        }
    }

    /// Whether this is the silence class
    pub fn is_silence(self) -> bool {
        self == Viseme::Sil
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A", Viseme::Pp, "viseme_PP")]
    #[case("B", Viseme::Kk, "viseme_kk")]
    #[case("C", Viseme::I, "viseme_I")]
    #[case("D", Viseme::Aa, "viseme_aa")]
    #[case("E", Viseme::E, "viseme_E")]
    #[case("F", Viseme::U, "viseme_U")]
    #[case("G", Viseme::Ff, "viseme_FF")]
    #[case("H", Viseme::Th, "viseme_TH")]
    #[case("X", Viseme::Sil, "viseme_sil")]
    fn test_mapping_table(
        #[case] code: &str,
        #[case] viseme: Viseme,
        #[case] target: &str,
    ) {
        assert_eq!(Viseme::from_phoneme_code(code), Some(viseme));
        assert_eq!(viseme.phoneme_code(), code);
        assert_eq!(viseme.morph_target(), target);
    }

    #[rstest]
    #[case("Z")]
    #[case("")]
    #[case("AA")]
    #[case("a")]
    fn test_unknown_codes_map_to_none(#[case] code: &str) {
        assert_eq!(Viseme::from_phoneme_code(code), None);
    }

    #[test]
    fn test_round_trip_all() {
        for v in Viseme::ALL {
            assert_eq!(Viseme::from_phoneme_code(v.phoneme_code()), Some(v));
        }
    }

    #[test]
    fn test_silence() {
        assert!(Viseme::Sil.is_silence());
        assert!(!Viseme::Aa.is_silence());
    }
}
