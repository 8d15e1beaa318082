// src/engine/mod.rs
// Numeric core: synthesis, Clarke transform, spectrum and phasor geometry.
pub mod clarke;
pub mod error;
pub mod fft;
pub mod harmonics;
pub mod phasor;
pub mod pipeline;
pub mod synth;

pub use clarke::{ClarkeSignal, ClarkeTransformer};
pub use error::EngineError;
pub use fft::{SpectralAnalyzer, SpectralPeak, Spectrum};
pub use harmonics::{is_visible, HarmonicSpec, SequenceComponent};
pub use phasor::{
    ChainLayout, FrameSignals, PhaseSet, PhasorChain, PhasorInput, PhasorSegment,
    RotatingFields, SegmentSource, TourStop, Vector2, VectorChainBuilder,
};
pub use pipeline::{AnalysisSnapshot, FrameGeometry, SequencePipeline};
pub use synth::{SignalSet, SignalSynthesizer, SynthesizedSignals, ThreePhaseSignal};
