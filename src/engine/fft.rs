use std::f64::consts::PI;

use log::{debug, warn};
use ndarray::ArrayView1;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;

use crate::engine::{ClarkeSignal, EngineError, ThreePhaseSignal};
use crate::types::{ColorKey, FftSource, Phase, SequenceClass};

/// Hann-windowed, zero-centred magnitude spectrum.
#[derive(Clone, Debug, Default)]
pub struct Spectrum {
    /// Cycles per fundamental period, ascending.
    pub frequencies: Vec<f64>,
    /// Divided by the window sum, so a pure tone of amplitude A reads as A.
    pub magnitudes: Vec<f64>,
}
impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
    /// Bins above `threshold` that are strict local maxima, labeled, in bin order.
    pub fn peaks(&self, threshold: f64) -> Vec<SpectralPeak> {
        let mut peaks = Vec::new();
        for (bin, (&frequency, &magnitude)) in
            self.frequencies.iter().zip(&self.magnitudes).enumerate()
        {
            if !exceeds_threshold(magnitude, threshold) || !is_local_peak(&self.magnitudes, bin) {
                continue;
            }
            match SpectralPeak::label(frequency, magnitude) {
                Some(peak) => peaks.push(peak),
                None => warn!(
                    "dropping peak at {frequency:.3} (magnitude {magnitude:.4}): order outside 1..=13"
                ),
            }
        }
        peaks
    }
}

/// One labeled line of the spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpectralPeak {
    /// Signed frequency in harmonic orders; the sign is the rotation direction.
    pub frequency: f64,
    pub magnitude: f64,
    /// `round(|frequency|)`.
    pub order: u8,
    pub class: SequenceClass,
    pub color: ColorKey,
}
impl SpectralPeak {
    fn label(frequency: f64, magnitude: f64) -> Option<Self> {
        let rounded = frequency.abs().round();
        if rounded > u8::MAX as f64 {
            return None;
        }
        let order = rounded as u8;
        let color = ColorKey::for_order(order, frequency)?;
        let class = match color {
            ColorKey::FundamentalPositive => SequenceClass::Positive,
            ColorKey::FundamentalNegative => SequenceClass::Negative,
            ColorKey::Harmonic(order) => SequenceClass::of_order(order),
        };
        Some(Self {
            frequency,
            magnitude,
            order,
            class,
            color,
        })
    }
}

/// Strictly greater than the threshold.
pub fn exceeds_threshold(magnitude: f64, threshold: f64) -> bool {
    magnitude > threshold
}

/// Strictly greater than both neighbours; bins past either edge count as zero.
pub fn is_local_peak(magnitudes: &[f64], bin: usize) -> bool {
    let Some(&center) = magnitudes.get(bin) else {
        return false;
    };
    let left = if bin == 0 { 0.0 } else { magnitudes[bin - 1] };
    let right = magnitudes.get(bin + 1).copied().unwrap_or(0.0);
    center > left && center > right
}

/// Symmetric Hann window; a single-point window is `[1.0]`.
pub fn hann_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len.saturating_sub(1)) as f64;
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / denom).cos())
        .collect()
}

/// Hann taper and its sum; falls back to a rectangular window when the Hann
/// weights sum to zero (fewer than three samples).
fn analysis_window(len: usize) -> (Vec<f64>, f64) {
    let window = hann_window(len);
    let sum: f64 = window.iter().sum();
    if sum > 0.0 {
        (window, sum)
    } else {
        (vec![1.0; len], len as f64)
    }
}

/// Signed DFT frequencies after shifting zero to the centre.
pub fn shifted_frequencies(len: usize, sample_spacing: f64) -> Vec<f64> {
    let span = len as f64 * sample_spacing;
    (0..len)
        .map(|i| {
            let bin = (i + len - len / 2) % len;
            let signed = if bin < (len + 1) / 2 {
                bin as f64
            } else {
                bin as f64 - len as f64
            };
            signed / span
        })
        .collect()
}

/// Picks the analyzer input for a selector.
pub fn select_source(
    source: FftSource,
    phases: &ThreePhaseSignal,
    clarke: &ClarkeSignal,
) -> Vec<Complex64> {
    match source {
        FftSource::PhaseA => to_complex(phases.phase(Phase::A)),
        FftSource::PhaseB => to_complex(phases.phase(Phase::B)),
        FftSource::PhaseC => to_complex(phases.phase(Phase::C)),
        FftSource::Alpha => to_complex(clarke.alpha()),
        FftSource::Beta => to_complex(clarke.beta()),
        FftSource::ComplexVector => clarke.complex(),
    }
}

fn to_complex(values: ArrayView1<'_, f64>) -> Vec<Complex64> {
    values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
}

/// Windowed FFT plus peak discrimination over the long analysis signal.
#[derive(Clone, Copy, Debug)]
pub struct SpectralAnalyzer {
    magnitude_threshold: f64,
    fundamental_hz: f64,
}
impl SpectralAnalyzer {
    pub fn new(magnitude_threshold: f64) -> Result<Self, EngineError> {
        if !(magnitude_threshold >= 0.0 && magnitude_threshold.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "magnitude threshold {magnitude_threshold} must be non-negative"
            )));
        }
        Ok(Self {
            magnitude_threshold,
            fundamental_hz: 1.0,
        })
    }
    /// Reports frequencies in multiples of `fundamental_hz` instead of cycles per second.
    pub fn with_fundamental(mut self, fundamental_hz: f64) -> Result<Self, EngineError> {
        if !(fundamental_hz > 0.0 && fundamental_hz.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "fundamental frequency {fundamental_hz} must be positive"
            )));
        }
        self.fundamental_hz = fundamental_hz;
        Ok(self)
    }
    pub fn magnitude_threshold(&self) -> f64 {
        self.magnitude_threshold
    }
    pub fn spectrum(&self, signal: &[Complex64], sample_spacing: f64) -> Spectrum {
        let len = signal.len();
        if len == 0 {
            return Spectrum::default();
        }
        let (window, window_sum) = analysis_window(len);
        let mut buffer: Vec<Complex64> = signal
            .iter()
            .zip(&window)
            .map(|(&x, &w)| x * w)
            .collect();
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(len);
        fft.process(&mut buffer);
        let magnitudes = (0..len)
            .map(|i| buffer[(i + len - len / 2) % len].norm() / window_sum)
            .collect();
        Spectrum {
            frequencies: shifted_frequencies(len, sample_spacing * self.fundamental_hz),
            magnitudes,
        }
    }
    pub fn analyze(&self, signal: &[Complex64], sample_spacing: f64) -> Vec<SpectralPeak> {
        let spectrum = self.spectrum(signal, sample_spacing);
        let peaks = spectrum.peaks(self.magnitude_threshold);
        debug!("{} bins -> {} peaks", spectrum.len(), peaks.len());
        peaks
    }
    pub fn analyze_real(&self, signal: &[f64], sample_spacing: f64) -> Vec<SpectralPeak> {
        let complex: Vec<Complex64> = signal.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.analyze(&complex, sample_spacing)
    }
    /// Spectrum and peaks for a named source.
    pub fn analyze_source(
        &self,
        source: FftSource,
        phases: &ThreePhaseSignal,
        clarke: &ClarkeSignal,
    ) -> Result<(Spectrum, Vec<SpectralPeak>), EngineError> {
        if phases.len() != clarke.len() {
            return Err(EngineError::InvalidConfig(format!(
                "phase signal ({}) and clarke signal ({}) lengths differ",
                phases.len(),
                clarke.len()
            )));
        }
        let input = select_source(source, phases, clarke);
        let spectrum = self.spectrum(&input, phases.sample_spacing());
        let peaks = spectrum.peaks(self.magnitude_threshold);
        debug!(
            "{:?}: {} bins -> {} peaks",
            source,
            spectrum.len(),
            peaks.len()
        );
        Ok((spectrum, peaks))
    }
}
impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self {
            magnitude_threshold: 0.004,
            fundamental_hz: 1.0,
        }
    }
}
