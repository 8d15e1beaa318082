use log::debug;
use ndarray::{s, Array2, ArrayView1};

use crate::config::SamplingConfig;
use crate::engine::{EngineError, HarmonicSpec};
use crate::types::{Phase, SequenceClass};

/// Uniformly sampled three-phase quantity: rows are instants, columns are phases A, B, C.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreePhaseSignal {
    sample_spacing: f64,
    samples: Array2<f64>,
}
impl ThreePhaseSignal {
    pub fn zeros(len: usize, sample_spacing: f64) -> Self {
        Self {
            sample_spacing,
            samples: Array2::zeros((len, 3)),
        }
    }
    pub fn len(&self) -> usize {
        self.samples.nrows()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn sample_spacing(&self) -> f64 {
        self.sample_spacing
    }
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.sample_spacing
    }
    pub fn times(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.time_at(i)).collect()
    }
    pub fn phase(&self, phase: Phase) -> ArrayView1<'_, f64> {
        self.samples.column(phase.index())
    }
    /// `[a, b, c]` at one instant.
    pub fn sample(&self, index: usize) -> Option<[f64; 3]> {
        (index < self.len()).then(|| {
            let row = self.samples.row(index);
            [row[0], row[1], row[2]]
        })
    }
    pub fn as_array(&self) -> &Array2<f64> {
        &self.samples
    }
    /// Leading `len` samples (clamped to the signal length).
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self {
            sample_spacing: self.sample_spacing,
            samples: self.samples.slice(s![..len, ..]).to_owned(),
        }
    }
}

/// The per-set signals of one time window.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalSet {
    /// Positive- and negative-sequence harmonic terms (orders not divisible by 3).
    pub harmonics: ThreePhaseSignal,
    /// Orders divisible by 3; identical in all phases.
    pub zero_sequence: ThreePhaseSignal,
    /// Negative-sequence fundamental.
    pub negative: ThreePhaseSignal,
    /// Sum of the three sets; what Clarke and the FFT see.
    pub combined: ThreePhaseSignal,
}
impl SignalSet {
    pub fn len(&self) -> usize {
        self.combined.len()
    }
    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }
    fn prefix(&self, len: usize) -> Self {
        Self {
            harmonics: self.harmonics.prefix(len),
            zero_sequence: self.zero_sequence.prefix(len),
            negative: self.negative.prefix(len),
            combined: self.combined.prefix(len),
        }
    }
}

/// Short window for drawing, long window for spectral resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedSignals {
    /// Leading prefix of `analysis`, one entry per animation frame.
    pub display: SignalSet,
    pub analysis: SignalSet,
}

/// Builds three-phase signals from a `HarmonicSpec`.
#[derive(Clone, Copy, Debug)]
pub struct SignalSynthesizer {
    sampling: SamplingConfig,
}
impl SignalSynthesizer {
    /// Rejects sampling that would give an empty or unbounded time axis.
    pub fn new(sampling: SamplingConfig) -> Result<Self, EngineError> {
        sampling.validate()?;
        Ok(Self { sampling })
    }
    pub fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }
    pub fn synthesize(&self, spec: &HarmonicSpec) -> SynthesizedSignals {
        let dt = self.sampling.sample_spacing();
        let len = self.sampling.analysis_samples();
        let omega = self.sampling.omega();
        let (rotating, zero): (Vec<(u8, f64)>, Vec<(u8, f64)>) = spec
            .harmonics()
            .filter(|&(_, amp)| amp > 0.0)
            .partition(|&(order, _)| SequenceClass::of_order(order).is_rotating());
        let harmonics = harmonic_terms(len, dt, omega, &rotating);
        let zero_sequence = harmonic_terms(len, dt, omega, &zero);
        let negative = negative_fundamental(len, dt, omega, spec.negative_fundamental());
        let combined = ThreePhaseSignal {
            sample_spacing: dt,
            samples: &harmonics.samples + &zero_sequence.samples + &negative.samples,
        };
        let analysis = SignalSet {
            harmonics,
            zero_sequence,
            negative,
            combined,
        };
        let display = analysis.prefix(self.sampling.display_samples);
        debug!(
            "synthesized {} display / {} analysis samples ({} rotating, {} zero-sequence terms)",
            display.len(),
            analysis.len(),
            rotating.len(),
            zero.len()
        );
        SynthesizedSignals { display, analysis }
    }
}

// a * cos(h * (wt - phi_k)) summed over the given terms.
fn harmonic_terms(len: usize, dt: f64, omega: f64, terms: &[(u8, f64)]) -> ThreePhaseSignal {
    if terms.is_empty() {
        return ThreePhaseSignal::zeros(len, dt);
    }
    let samples = Array2::from_shape_fn((len, 3), |(i, k)| {
        let t = i as f64 * dt;
        let phi = Phase::ALL[k].offset_radians();
        terms
            .iter()
            .map(|&(order, amp)| amp * (order as f64 * (omega * t - phi)).cos())
            .sum()
    });
    ThreePhaseSignal {
        sample_spacing: dt,
        samples,
    }
}

// a * cos(wt + phi_k): opposite phase rotation.
fn negative_fundamental(len: usize, dt: f64, omega: f64, amp: f64) -> ThreePhaseSignal {
    if amp == 0.0 {
        return ThreePhaseSignal::zeros(len, dt);
    }
    let samples = Array2::from_shape_fn((len, 3), |(i, k)| {
        let t = i as f64 * dt;
        amp * (omega * t + Phase::ALL[k].offset_radians()).cos()
    });
    ThreePhaseSignal {
        sample_spacing: dt,
        samples,
    }
}
