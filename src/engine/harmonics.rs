use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::types::{ColorKey, SequenceClass, MAX_HARMONIC_ORDER};

const SLOTS: usize = MAX_HARMONIC_ORDER as usize;

/// Amplitudes for harmonic orders 1..=13 plus a separate negative-sequence
/// fundamental. Sequence classes are derived from the order, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HarmonicSpecRecord", into = "HarmonicSpecRecord")]
pub struct HarmonicSpec {
    amplitudes: [f64; SLOTS],
    negative_fundamental: f64,
}

/// A harmonic entry that rotates (positive or negative sequence).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SequenceComponent {
    pub order: u8,
    pub amplitude: f64,
    pub class: SequenceClass,
    pub color: ColorKey,
}
impl SequenceComponent {
    /// Harmonic order carrying the rotation direction as its sign.
    pub fn signed_order(&self) -> f64 {
        self.class.rotation_sign() * self.order as f64
    }
}

impl HarmonicSpec {
    /// All amplitudes zero.
    pub fn silent() -> Self {
        Self {
            amplitudes: [0.0; SLOTS],
            negative_fundamental: 0.0,
        }
    }
    pub fn new(
        harmonics: impl IntoIterator<Item = (u8, f64)>,
        negative_fundamental: f64,
    ) -> Result<Self, EngineError> {
        let mut spec = Self::silent();
        for (order, amplitude) in harmonics {
            spec.set_harmonic(order, amplitude)?;
        }
        spec.set_negative_fundamental(negative_fundamental)?;
        Ok(spec)
    }
    /// Only the positive-sequence fundamental.
    pub fn fundamental(amplitude: f64) -> Result<Self, EngineError> {
        Self::new([(1, amplitude)], 0.0)
    }
    pub fn with_harmonic(mut self, order: u8, amplitude: f64) -> Result<Self, EngineError> {
        self.set_harmonic(order, amplitude)?;
        Ok(self)
    }
    pub fn with_negative_fundamental(mut self, amplitude: f64) -> Result<Self, EngineError> {
        self.set_negative_fundamental(amplitude)?;
        Ok(self)
    }
    pub fn set_harmonic(&mut self, order: u8, amplitude: f64) -> Result<(), EngineError> {
        let slot = slot_of(order)?;
        check_amplitude(Some(order), amplitude)?;
        self.amplitudes[slot] = amplitude;
        Ok(())
    }
    pub fn set_negative_fundamental(&mut self, amplitude: f64) -> Result<(), EngineError> {
        check_amplitude(None, amplitude)?;
        self.negative_fundamental = amplitude;
        Ok(())
    }
    pub fn amplitude(&self, order: u8) -> Option<f64> {
        slot_of(order).ok().map(|slot| self.amplitudes[slot])
    }
    pub fn negative_fundamental(&self) -> f64 {
        self.negative_fundamental
    }
    /// `(order, amplitude)` for every order 1..=13, zeros included.
    pub fn harmonics(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.amplitudes
            .iter()
            .enumerate()
            .map(|(slot, &amp)| (slot as u8 + 1, amp))
    }
    pub fn total_harmonic_amplitude(&self) -> f64 {
        self.amplitudes.iter().sum()
    }
    pub fn is_silent(&self) -> bool {
        self.negative_fundamental == 0.0 && self.amplitudes.iter().all(|&amp| amp == 0.0)
    }
    /// Rotating entries above `threshold`, in activation order: positive
    /// fundamental, negative fundamental, then ascending harmonic order.
    /// Zero-sequence orders are skipped.
    pub fn active_components(&self, threshold: f64) -> Vec<SequenceComponent> {
        let mut components = Vec::new();
        let fundamental = self.amplitudes[0];
        if is_visible(fundamental, threshold) {
            components.push(SequenceComponent {
                order: 1,
                amplitude: fundamental,
                class: SequenceClass::Positive,
                color: ColorKey::FundamentalPositive,
            });
        }
        if is_visible(self.negative_fundamental, threshold) {
            components.push(SequenceComponent {
                order: 1,
                amplitude: self.negative_fundamental,
                class: SequenceClass::Negative,
                color: ColorKey::FundamentalNegative,
            });
        }
        for (order, amplitude) in self.harmonics().skip(1) {
            let class = SequenceClass::of_order(order);
            if class.is_rotating() && is_visible(amplitude, threshold) {
                components.push(SequenceComponent {
                    order,
                    amplitude,
                    class,
                    color: ColorKey::Harmonic(order),
                });
            }
        }
        components
    }
}
impl Default for HarmonicSpec {
    fn default() -> Self {
        let mut amplitudes = [0.0; SLOTS];
        amplitudes[0] = 1.0;
        Self {
            amplitudes,
            negative_fundamental: 0.1,
        }
    }
}

/// Strictly above the threshold; used for every "is this drawn" decision.
pub fn is_visible(amplitude: f64, threshold: f64) -> bool {
    amplitude > threshold
}

fn slot_of(order: u8) -> Result<usize, EngineError> {
    if (1..=MAX_HARMONIC_ORDER).contains(&order) {
        Ok(order as usize - 1)
    } else {
        Err(EngineError::HarmonicOrderOutOfRange(order))
    }
}

fn check_amplitude(order: Option<u8>, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidAmplitude { order, value })
    }
}

/// Serialized form: a sparse order → amplitude map.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct HarmonicSpecRecord {
    #[serde(default)]
    harmonics: BTreeMap<u8, f64>,
    #[serde(default)]
    negative_fundamental: f64,
}
impl TryFrom<HarmonicSpecRecord> for HarmonicSpec {
    type Error = EngineError;
    fn try_from(record: HarmonicSpecRecord) -> Result<Self, Self::Error> {
        HarmonicSpec::new(record.harmonics, record.negative_fundamental)
    }
}
impl From<HarmonicSpec> for HarmonicSpecRecord {
    fn from(spec: HarmonicSpec) -> Self {
        Self {
            harmonics: spec.harmonics().filter(|&(_, amp)| amp != 0.0).collect(),
            negative_fundamental: spec.negative_fundamental,
        }
    }
}
