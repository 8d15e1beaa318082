use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Longest analysis window accepted; 2^24 points of `f64` per phase.
pub const MAX_ANALYSIS_SAMPLES: usize = 1 << 24;

/// Time axis shared by the display and analysis windows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Points in the short display window; also the number of animation frames.
    pub display_samples: usize,
    /// Fundamental periods covered by the display window, endpoints included.
    pub display_periods: f64,
    /// Fundamental periods covered by the analysis window.
    pub analysis_periods: f64,
    pub fundamental_hz: f64,
}
impl SamplingConfig {
    /// Sample spacing: the display window is a linspace that includes both endpoints.
    pub fn sample_spacing(&self) -> f64 {
        self.display_periods / self.fundamental_hz / self.display_samples.saturating_sub(1) as f64
    }
    pub fn analysis_samples(&self) -> usize {
        self.analysis_samples_exact().round() as usize
    }
    fn analysis_samples_exact(&self) -> f64 {
        self.analysis_periods / self.fundamental_hz / self.sample_spacing()
    }
    pub fn omega(&self) -> f64 {
        2.0 * PI * self.fundamental_hz
    }
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.display_samples < 2 {
            return Err(invalid("display window needs at least 2 samples"));
        }
        if !positive_finite(self.fundamental_hz) {
            return Err(invalid("fundamental frequency must be positive and finite"));
        }
        if !positive_finite(self.display_periods) || !positive_finite(self.analysis_periods) {
            return Err(invalid("window durations must be positive and finite"));
        }
        let analysis = self.analysis_samples_exact();
        if !analysis.is_finite() || analysis.round() > MAX_ANALYSIS_SAMPLES as f64 {
            return Err(invalid(format!(
                "analysis window of {analysis:.0} samples exceeds {MAX_ANALYSIS_SAMPLES}"
            )));
        }
        if self.analysis_samples() < self.display_samples {
            return Err(invalid(format!(
                "analysis window ({} samples) shorter than display window ({} samples)",
                self.analysis_samples(),
                self.display_samples
            )));
        }
        Ok(())
    }
}
impl Default for SamplingConfig {
    fn default() -> Self {
        // 200 points over two periods for drawing, 100 periods for the FFT.
        Self {
            display_samples: 200,
            display_periods: 2.0,
            analysis_periods: 100.0,
            fundamental_hz: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Peaks must be strictly above this normalized magnitude.
    pub magnitude_threshold: f64,
}
impl SpectrumConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !non_negative_finite(self.magnitude_threshold) {
            return Err(invalid("magnitude threshold must be non-negative"));
        }
        Ok(())
    }
}
impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            magnitude_threshold: 0.004,
        }
    }
}

/// Presentation constants for phasor geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasorConfig {
    /// Uniform scale of the harmonic-rotation chain so it fits the plotting viewport.
    pub rotation_scale: f64,
    /// Components at or below this amplitude are not drawn as rotating phasors.
    pub visibility_threshold: f64,
    /// A whole phase set (harmonics or negative fundamental) below this total
    /// amplitude is hidden in the three-phase views.
    pub set_visibility_threshold: f64,
}
impl PhasorConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !positive_finite(self.rotation_scale) {
            return Err(invalid("rotation scale must be positive"));
        }
        if !non_negative_finite(self.visibility_threshold)
            || !non_negative_finite(self.set_visibility_threshold)
        {
            return Err(invalid("visibility thresholds must be non-negative"));
        }
        Ok(())
    }
}
impl Default for PhasorConfig {
    fn default() -> Self {
        Self {
            rotation_scale: 1.5,
            visibility_threshold: 0.001,
            set_visibility_threshold: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sampling: SamplingConfig,
    pub spectrum: SpectrumConfig,
    pub phasor: PhasorConfig,
}
impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|err| EngineError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| {
            EngineError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
    pub fn validate(&self) -> Result<(), EngineError> {
        self.sampling.validate()?;
        self.spectrum.validate()?;
        self.phasor.validate()
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig(message.into())
}

fn positive_finite(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

fn non_negative_finite(value: f64) -> bool {
    value >= 0.0 && value.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn default_windows_give_two_display_and_hundred_analysis_periods() {
        let sampling = SamplingConfig::default();
        assert!((sampling.sample_spacing() - 2.0 / 199.0).abs() < 1e-15);
        assert_eq!(sampling.analysis_samples(), 9950);
        assert!(EngineConfig::default().validate().is_ok());
    }
    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "phasor": { "rotation_scale": 1.0 } }"#).unwrap();
        assert_eq!(config.phasor.rotation_scale, 1.0);
        assert_eq!(config.phasor.visibility_threshold, 0.001);
        assert_eq!(config.spectrum.magnitude_threshold, 0.004);
        assert_eq!(config.sampling.display_samples, 200);
    }
    #[test]
    fn rejects_unusable_sampling() {
        let err = EngineConfig::from_json_str(r#"{ "sampling": { "display_samples": 1 } }"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        let err = EngineConfig::from_json_str(r#"{ "sampling": { "analysis_periods": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert!(EngineConfig::from_json_str("{ not json").is_err());
    }
    #[test]
    fn rejects_empty_display_window_without_panicking() {
        let sampling = SamplingConfig {
            display_samples: 0,
            ..SamplingConfig::default()
        };
        assert!(matches!(sampling.validate(), Err(EngineError::InvalidConfig(_))));
        assert!(sampling.sample_spacing().is_infinite());
    }
    #[test]
    fn rejects_unbounded_or_non_finite_windows() {
        for json in [
            r#"{ "sampling": { "analysis_periods": 1e300 } }"#,
            r#"{ "sampling": { "analysis_periods": 1e9 } }"#,
            r#"{ "sampling": { "display_periods": 1e-300 } }"#,
        ] {
            let err = EngineConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfig(_)), "{json}");
        }
        let mut config = EngineConfig::default();
        config.sampling.display_periods = f64::INFINITY;
        assert!(config.validate().is_err());
        config.sampling.display_periods = 2.0;
        config.sampling.analysis_periods = f64::NAN;
        assert!(config.validate().is_err());
        config.sampling.analysis_periods = 100.0;
        config.spectrum.magnitude_threshold = f64::INFINITY;
        assert!(config.validate().is_err());
    }
    #[test]
    fn rejects_non_positive_rotation_scale() {
        let mut config = EngineConfig::default();
        config.phasor.rotation_scale = 0.0;
        assert!(config.validate().is_err());
    }
}
