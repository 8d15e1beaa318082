//! Three-phase symmetrical component engine.
//!
//! Turns a set of harmonic amplitudes into time-domain phase signals,
//! their Clarke (alpha/beta) form, labeled spectral peaks and per-frame phasor
//! chains. Everything here is a pure function of its inputs; timing, looping
//! and drawing belong to the caller.
pub mod config;
pub mod engine;
pub mod presets;
pub mod render;
pub mod types;

pub use config::EngineConfig;
pub use engine::{
    AnalysisSnapshot, ClarkeSignal, ClarkeTransformer, EngineError, FrameGeometry, HarmonicSpec,
    PhasorChain, SequencePipeline, SignalSynthesizer, SpectralAnalyzer, SpectralPeak,
    VectorChainBuilder,
};
pub use presets::Preset;
pub use types::{ClarkeInvariant, ColorKey, FftSource, Phase, PhasorView, RenderMode, SequenceClass};
