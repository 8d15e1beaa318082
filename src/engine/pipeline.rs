use log::info;

use crate::config::EngineConfig;
use crate::engine::fft::select_source;
use crate::engine::phasor::{FrameSignals, PhasorChain, RotatingFields, TourStop};
use crate::engine::{
    ClarkeSignal, ClarkeTransformer, EngineError, HarmonicSpec, SignalSynthesizer,
    SpectralAnalyzer, SpectralPeak, Spectrum, SynthesizedSignals, VectorChainBuilder,
};
use crate::types::{ClarkeInvariant, FftSource, PhasorView, RenderMode};

/// Everything derived from one set of inputs.
#[derive(Clone, Debug)]
pub struct AnalysisSnapshot {
    pub spec: HarmonicSpec,
    pub invariant: ClarkeInvariant,
    pub fft_source: FftSource,
    pub signals: SynthesizedSignals,
    pub display_clarke: ClarkeSignal,
    pub analysis_clarke: ClarkeSignal,
    pub spectrum: Spectrum,
    pub peaks: Vec<SpectralPeak>,
}
impl AnalysisSnapshot {
    pub fn frame_count(&self) -> usize {
        self.signals.display.len()
    }
    pub fn frame_signals(&self, index: usize) -> Result<FrameSignals, EngineError> {
        let invalid = || EngineError::InvalidFrame {
            index,
            frame_count: self.frame_count(),
        };
        let display = &self.signals.display;
        let (alpha, beta) = self.display_clarke.sample(index).ok_or_else(invalid)?;
        Ok(FrameSignals {
            time: display.combined.time_at(index),
            harmonics: display.harmonics.sample(index).ok_or_else(invalid)?,
            negative: display.negative.sample(index).ok_or_else(invalid)?,
            alpha,
            beta,
        })
    }
}

/// Phasor geometry for every view at one frame.
#[derive(Clone, Debug)]
pub struct FrameGeometry {
    pub index: usize,
    pub time: f64,
    pub mode: RenderMode,
    pub harmonics: PhasorChain,
    pub negative: PhasorChain,
    pub combined: PhasorChain,
    pub clarke: PhasorChain,
    pub rotating_fields: RotatingFields,
}
impl FrameGeometry {
    pub fn chain(&self, view: PhasorView) -> &PhasorChain {
        match view {
            PhasorView::Harmonics => &self.harmonics,
            PhasorView::Negative => &self.negative,
            PhasorView::Combined => &self.combined,
            PhasorView::Clarke => &self.clarke,
        }
    }
}

/// Holds the current inputs and recomputes the full analysis whenever one changes.
pub struct SequencePipeline {
    config: EngineConfig,
    synthesizer: SignalSynthesizer,
    analyzer: SpectralAnalyzer,
    chain_builder: VectorChainBuilder,
    spec: HarmonicSpec,
    invariant: ClarkeInvariant,
    fft_source: FftSource,
    snapshot: Option<AnalysisSnapshot>,
}
impl SequencePipeline {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let synthesizer = SignalSynthesizer::new(config.sampling)?;
        let analyzer = SpectralAnalyzer::new(config.spectrum.magnitude_threshold)?
            .with_fundamental(config.sampling.fundamental_hz)?;
        let chain_builder = VectorChainBuilder::new(config.phasor, config.sampling.omega())?;
        Ok(Self {
            config,
            synthesizer,
            analyzer,
            chain_builder,
            spec: HarmonicSpec::default(),
            invariant: ClarkeInvariant::default(),
            fft_source: FftSource::default(),
            snapshot: None,
        })
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn spec(&self) -> &HarmonicSpec {
        &self.spec
    }
    pub fn invariant(&self) -> ClarkeInvariant {
        self.invariant
    }
    pub fn fft_source(&self) -> FftSource {
        self.fft_source
    }
    pub fn recompute(&mut self) -> &AnalysisSnapshot {
        let signals = self.synthesizer.synthesize(&self.spec);
        let transformer = ClarkeTransformer::new(self.invariant);
        let display_clarke = transformer.transform(&signals.display.combined);
        let analysis_clarke = transformer.transform(&signals.analysis.combined);
        let analyzer = &self.analyzer;
        let input = select_source(self.fft_source, &signals.analysis.combined, &analysis_clarke);
        let spectrum = analyzer.spectrum(&input, signals.analysis.combined.sample_spacing());
        let peaks = spectrum.peaks(analyzer.magnitude_threshold());
        info!(
            "recomputed {} frames, {}-point {:?} spectrum ({:?}) -> {} peaks",
            signals.display.len(),
            spectrum.len(),
            self.fft_source,
            self.invariant,
            peaks.len()
        );
        self.snapshot.insert(AnalysisSnapshot {
            spec: self.spec.clone(),
            invariant: self.invariant,
            fft_source: self.fft_source,
            signals,
            display_clarke,
            analysis_clarke,
            spectrum,
            peaks,
        })
    }
    pub fn set_spec(&mut self, spec: HarmonicSpec) -> &AnalysisSnapshot {
        self.spec = spec;
        self.recompute()
    }
    /// Changes one harmonic amplitude; a rejected value leaves the previous analysis in place.
    pub fn set_harmonic(
        &mut self,
        order: u8,
        amplitude: f64,
    ) -> Result<&AnalysisSnapshot, EngineError> {
        self.spec.set_harmonic(order, amplitude)?;
        Ok(self.recompute())
    }
    pub fn set_negative_fundamental(
        &mut self,
        amplitude: f64,
    ) -> Result<&AnalysisSnapshot, EngineError> {
        self.spec.set_negative_fundamental(amplitude)?;
        Ok(self.recompute())
    }
    pub fn set_invariant(&mut self, invariant: ClarkeInvariant) -> &AnalysisSnapshot {
        self.invariant = invariant;
        self.recompute()
    }
    pub fn set_fft_source(&mut self, source: FftSource) -> &AnalysisSnapshot {
        self.fft_source = source;
        self.recompute()
    }
    pub fn set_fft_source_str(&mut self, source: &str) -> Result<&AnalysisSnapshot, EngineError> {
        let source = source.parse()?;
        Ok(self.set_fft_source(source))
    }
    pub fn latest(&self) -> Result<&AnalysisSnapshot, EngineError> {
        self.snapshot.as_ref().ok_or(EngineError::NotComputed)
    }
    pub fn frame_count(&self) -> usize {
        self.config.sampling.display_samples
    }
    pub fn time_at(&self, index: usize) -> Result<f64, EngineError> {
        self.check_frame(index)?;
        Ok(index as f64 * self.config.sampling.sample_spacing())
    }
    pub fn frame(&self, index: usize, mode: RenderMode) -> Result<FrameGeometry, EngineError> {
        self.check_frame(index)?;
        let snapshot = self.latest()?;
        let frame = snapshot.frame_signals(index)?;
        let builder = &self.chain_builder;
        let spec = &snapshot.spec;
        Ok(FrameGeometry {
            index,
            time: frame.time,
            mode,
            harmonics: builder.build(PhasorView::Harmonics, mode, &frame, spec),
            negative: builder.build(PhasorView::Negative, mode, &frame, spec),
            combined: builder.build(PhasorView::Combined, mode, &frame, spec),
            clarke: builder.build(PhasorView::Clarke, mode, &frame, spec),
            rotating_fields: builder.rotating_fields(&frame, spec),
        })
    }
    pub fn frame_str(&self, index: usize, mode: &str) -> Result<FrameGeometry, EngineError> {
        self.frame(index, mode.parse()?)
    }
    pub fn tour(&self, index: usize) -> Result<Vec<TourStop>, EngineError> {
        let time = self.time_at(index)?;
        let snapshot = self.latest()?;
        Ok(self.chain_builder.tour(&snapshot.spec, time, &snapshot.peaks))
    }
    fn check_frame(&self, index: usize) -> Result<(), EngineError> {
        let frame_count = self.frame_count();
        if index < frame_count {
            Ok(())
        } else {
            Err(EngineError::InvalidFrame { index, frame_count })
        }
    }
}
