// src/types.rs
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Highest harmonic order carried by a `HarmonicSpec`.
pub const MAX_HARMONIC_ORDER: u8 = 13;

/// One of the three phase conductors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
}
impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];
    pub fn index(self) -> usize {
        match self {
            Phase::A => 0,
            Phase::B => 1,
            Phase::C => 2,
        }
    }
    /// Spatial/temporal offset of the phase: 0, 120 and 240 degrees.
    pub fn offset_radians(self) -> f64 {
        self.index() as f64 * 2.0 * PI / 3.0
    }
}
impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
        };
        f.write_str(name)
    }
}

/// Symmetrical-component class of a harmonic order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceClass {
    /// Counter-clockwise rotation.
    Positive,
    /// Clockwise rotation.
    Negative,
    /// Co-phasal in all three phases; never drawn as a vector.
    Zero,
}
impl SequenceClass {
    /// `order mod 3`: 1 → positive, 2 → negative, 0 → zero sequence.
    pub fn of_order(order: u8) -> Self {
        match order % 3 {
            1 => SequenceClass::Positive,
            2 => SequenceClass::Negative,
            _ => SequenceClass::Zero,
        }
    }
    pub fn rotation_sign(self) -> f64 {
        match self {
            SequenceClass::Positive => 1.0,
            SequenceClass::Negative => -1.0,
            SequenceClass::Zero => 0.0,
        }
    }
    pub fn is_rotating(self) -> bool {
        self != SequenceClass::Zero
    }
    pub fn label(self) -> &'static str {
        match self {
            SequenceClass::Positive => "CCW",
            SequenceClass::Negative => "CW",
            SequenceClass::Zero => "0",
        }
    }
}

/// Color lookup key shared by spectral peaks and rotating phasors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColorKey {
    FundamentalPositive,
    FundamentalNegative,
    /// Orders 2..=13; one sequence class per order, so the sign is not needed.
    Harmonic(u8),
}
impl ColorKey {
    /// Maps a rounded harmonic order and the sign of its frequency to a key.
    /// Orders outside 1..=13 have no key.
    pub fn for_order(order: u8, frequency: f64) -> Option<Self> {
        match order {
            1 if frequency > 0.0 => Some(ColorKey::FundamentalPositive),
            1 => Some(ColorKey::FundamentalNegative),
            2..=MAX_HARMONIC_ORDER => Some(ColorKey::Harmonic(order)),
            _ => None,
        }
    }
}
impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorKey::FundamentalPositive => f.write_str("H1+"),
            ColorKey::FundamentalNegative => f.write_str("H1-"),
            ColorKey::Harmonic(order) => write!(f, "H{order}"),
        }
    }
}
impl FromStr for ColorKey {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidSelector {
            kind: "color key",
            value: s.to_owned(),
        };
        let trimmed = s.trim();
        match trimmed {
            "H1+" | "H1" => return Ok(ColorKey::FundamentalPositive),
            "H1-" => return Ok(ColorKey::FundamentalNegative),
            _ => {}
        }
        let order: u8 = trimmed
            .strip_prefix('H')
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(invalid)?;
        if (2..=MAX_HARMONIC_ORDER).contains(&order) {
            Ok(ColorKey::Harmonic(order))
        } else {
            Err(invalid())
        }
    }
}

/// Normalization constant of the Clarke transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClarkeInvariant {
    /// k = 2/3, preserves peak amplitude.
    #[default]
    Amplitude,
    /// k = sqrt(2/3), preserves instantaneous power.
    Power,
}
impl ClarkeInvariant {
    pub fn gain(self) -> f64 {
        match self {
            ClarkeInvariant::Amplitude => 2.0 / 3.0,
            ClarkeInvariant::Power => (2.0_f64 / 3.0).sqrt(),
        }
    }
}
impl FromStr for ClarkeInvariant {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_selector(s).as_str() {
            "amplitude" | "amplitudeinvariant" => Ok(ClarkeInvariant::Amplitude),
            "power" | "powerinvariant" => Ok(ClarkeInvariant::Power),
            _ => Err(EngineError::InvalidSelector {
                kind: "clarke invariant",
                value: s.to_owned(),
            }),
        }
    }
}

/// Which signal feeds the spectral analyzer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FftSource {
    PhaseA,
    PhaseB,
    PhaseC,
    Alpha,
    Beta,
    /// `alpha + j*beta`; keeps rotation direction as the frequency sign.
    #[default]
    ComplexVector,
}
impl FftSource {
    pub const ALL: [FftSource; 6] = [
        FftSource::PhaseA,
        FftSource::PhaseB,
        FftSource::PhaseC,
        FftSource::Alpha,
        FftSource::Beta,
        FftSource::ComplexVector,
    ];
    pub fn label(self) -> &'static str {
        match self {
            FftSource::PhaseA => "Phase A",
            FftSource::PhaseB => "Phase B",
            FftSource::PhaseC => "Phase C",
            FftSource::Alpha => "Alpha",
            FftSource::Beta => "Beta",
            FftSource::ComplexVector => "Complex Vector (α + jβ)",
        }
    }
}
impl FromStr for FftSource {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_selector(s).as_str() {
            "phasea" | "a" => Ok(FftSource::PhaseA),
            "phaseb" | "b" => Ok(FftSource::PhaseB),
            "phasec" | "c" => Ok(FftSource::PhaseC),
            "alpha" => Ok(FftSource::Alpha),
            "beta" => Ok(FftSource::Beta),
            "complex" | "complexvector" | "complexvector(α+jβ)" => Ok(FftSource::ComplexVector),
            _ => Err(EngineError::InvalidSelector {
                kind: "fft source",
                value: s.to_owned(),
            }),
        }
    }
}

/// How phasor vectors are laid out for a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Tip-to-tail in input order.
    Decomposition,
    /// Every vector from the origin.
    #[default]
    Superposed,
    /// One rotating phasor per active harmonic, chained tip-to-tail.
    HarmonicRotation,
}
impl FromStr for RenderMode {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_selector(s).as_str() {
            "decomposition" => Ok(RenderMode::Decomposition),
            "superposed" | "superposition" => Ok(RenderMode::Superposed),
            "harmonicrotation" | "rotation" => Ok(RenderMode::HarmonicRotation),
            _ => Err(EngineError::InvalidSelector {
                kind: "render mode",
                value: s.to_owned(),
            }),
        }
    }
}

/// Field panel a phasor chain is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhasorView {
    /// Phase vectors of the harmonic set (zero sequence removed).
    Harmonics,
    /// Phase vectors of the negative-sequence fundamental.
    Negative,
    /// Both sets together.
    Combined,
    /// Alpha on the x axis, beta on the y axis.
    Clarke,
}
impl PhasorView {
    pub const ALL: [PhasorView; 4] = [
        PhasorView::Harmonics,
        PhasorView::Negative,
        PhasorView::Combined,
        PhasorView::Clarke,
    ];
}
impl FromStr for PhasorView {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_selector(s).as_str() {
            "harmonics" | "positive" => Ok(PhasorView::Harmonics),
            "negative" => Ok(PhasorView::Negative),
            "combined" => Ok(PhasorView::Combined),
            "clarke" | "alphabeta" => Ok(PhasorView::Clarke),
            _ => Err(EngineError::InvalidSelector {
                kind: "phasor view",
                value: s.to_owned(),
            }),
        }
    }
}

// Lowercase and drop separators so "Phase A", "phase_a" and "phase-a" agree.
pub(crate) fn normalize_selector(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn sequence_class_follows_order_mod_three() {
        assert_eq!(SequenceClass::of_order(1), SequenceClass::Positive);
        assert_eq!(SequenceClass::of_order(2), SequenceClass::Negative);
        assert_eq!(SequenceClass::of_order(3), SequenceClass::Zero);
        assert_eq!(SequenceClass::of_order(7), SequenceClass::Positive);
        assert_eq!(SequenceClass::of_order(11), SequenceClass::Negative);
        assert_eq!(SequenceClass::of_order(12), SequenceClass::Zero);
        assert!(!SequenceClass::Zero.is_rotating());
    }
    #[test]
    fn color_key_uses_sign_only_for_fundamental() {
        assert_eq!(
            ColorKey::for_order(1, 1.0),
            Some(ColorKey::FundamentalPositive)
        );
        assert_eq!(
            ColorKey::for_order(1, -1.0),
            Some(ColorKey::FundamentalNegative)
        );
        assert_eq!(ColorKey::for_order(5, -5.0), Some(ColorKey::Harmonic(5)));
        assert_eq!(ColorKey::for_order(5, 5.0), Some(ColorKey::Harmonic(5)));
        assert_eq!(ColorKey::for_order(13, 13.0), Some(ColorKey::Harmonic(13)));
        assert_eq!(ColorKey::for_order(0, 0.0), None);
        assert_eq!(ColorKey::for_order(14, -14.0), None);
    }
    #[test]
    fn color_key_text_form_parses_back() {
        for key in [
            ColorKey::FundamentalPositive,
            ColorKey::FundamentalNegative,
            ColorKey::Harmonic(2),
            ColorKey::Harmonic(13),
        ] {
            assert_eq!(key.to_string().parse::<ColorKey>().unwrap(), key);
        }
        assert!("H14".parse::<ColorKey>().is_err());
        assert!("X3".parse::<ColorKey>().is_err());
    }
    #[test]
    fn power_gain_ratio_is_sqrt_three_halves() {
        let ratio = ClarkeInvariant::Power.gain() / ClarkeInvariant::Amplitude.gain();
        assert!((ratio - 1.5_f64.sqrt()).abs() < 1e-12);
    }
    #[test]
    fn selectors_parse_loosely_but_reject_unknown() {
        assert_eq!("Phase A".parse::<FftSource>().unwrap(), FftSource::PhaseA);
        assert_eq!("phase_c".parse::<FftSource>().unwrap(), FftSource::PhaseC);
        assert_eq!(
            "Complex Vector".parse::<FftSource>().unwrap(),
            FftSource::ComplexVector
        );
        assert!(matches!(
            "gamma".parse::<FftSource>(),
            Err(EngineError::InvalidSelector { kind: "fft source", .. })
        ));
        assert_eq!(
            "harmonic-rotation".parse::<RenderMode>().unwrap(),
            RenderMode::HarmonicRotation
        );
        assert!("spiral".parse::<RenderMode>().is_err());
        assert_eq!("Clarke".parse::<PhasorView>().unwrap(), PhasorView::Clarke);
        assert_eq!(
            "power".parse::<ClarkeInvariant>().unwrap(),
            ClarkeInvariant::Power
        );
    }
    #[test]
    fn phase_offsets_are_120_degrees_apart() {
        assert_eq!(Phase::A.offset_radians(), 0.0);
        assert!((Phase::B.offset_radians() - 2.0 * PI / 3.0).abs() < 1e-15);
        assert!((Phase::C.offset_radians() - 4.0 * PI / 3.0).abs() < 1e-15);
    }
}
