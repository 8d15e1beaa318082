use std::ops::{Add, AddAssign, Sub};

use serde::Serialize;

use crate::config::PhasorConfig;
use crate::engine::harmonics::SequenceComponent;
use crate::engine::{EngineError, HarmonicSpec, SpectralPeak};
use crate::types::{ColorKey, Phase, PhasorView, RenderMode, SequenceClass};

/// A tour stop is matched to the first spectral peak this close to its frequency.
pub const PEAK_MATCH_TOLERANCE: f64 = 0.1;
const TOUR_ZOOM_FACTOR: f64 = 3.0;
const TOUR_MIN_SPAN: f64 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}
impl Vector2 {
    pub const ORIGIN: Vector2 = Vector2 { x: 0.0, y: 0.0 };
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    pub fn from_polar(radius: f64, angle: f64) -> Self {
        Self::new(radius * angle.cos(), radius * angle.sin())
    }
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}
impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}
impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Which three-phase set a phase vector belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhaseSet {
    Harmonics,
    Negative,
}

/// What a chain element represents; drives its color in the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum SegmentSource {
    Phase { phase: Phase, set: PhaseSet },
    Alpha,
    Beta,
    Rotating(SequenceComponent),
}
impl SegmentSource {
    pub fn color_key(&self) -> Option<ColorKey> {
        match self {
            SegmentSource::Rotating(component) => Some(component.color),
            _ => None,
        }
    }
}

/// One vector before layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhasorInput {
    pub vector: Vector2,
    pub source: SegmentSource,
    /// Hidden inputs still count toward the resultant.
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PhasorSegment {
    pub start: Vector2,
    pub vector: Vector2,
    pub source: SegmentSource,
    pub visible: bool,
}
impl PhasorSegment {
    pub fn end(&self) -> Vector2 {
        self.start + self.vector
    }
    pub fn midpoint(&self) -> Vector2 {
        self.start + self.vector.scaled(0.5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChainLayout {
    TipToTail,
    FromOrigin,
}

/// Laid-out vectors for one view and frame, plus their sum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhasorChain {
    pub layout: ChainLayout,
    pub segments: Vec<PhasorSegment>,
    pub resultant: Vector2,
}
impl PhasorChain {
    pub fn empty(layout: ChainLayout) -> Self {
        Self {
            layout,
            segments: Vec::new(),
            resultant: Vector2::ORIGIN,
        }
    }
    /// Each vector starts at the previous tip; the resultant is the last tip.
    pub fn tip_to_tail(inputs: &[PhasorInput]) -> Self {
        let mut tip = Vector2::ORIGIN;
        let segments = inputs
            .iter()
            .map(|input| {
                let segment = PhasorSegment {
                    start: tip,
                    vector: input.vector,
                    source: input.source,
                    visible: input.visible,
                };
                tip = segment.end();
                segment
            })
            .collect();
        Self {
            layout: ChainLayout::TipToTail,
            segments,
            resultant: tip,
        }
    }
    /// Every vector starts at the origin; the resultant is their sum.
    pub fn from_origin(inputs: &[PhasorInput]) -> Self {
        let mut sum = Vector2::ORIGIN;
        let segments = inputs
            .iter()
            .map(|input| {
                sum += input.vector;
                PhasorSegment {
                    start: Vector2::ORIGIN,
                    vector: input.vector,
                    source: input.source,
                    visible: input.visible,
                }
            })
            .collect();
        Self {
            layout: ChainLayout::FromOrigin,
            segments,
            resultant: sum,
        }
    }
    fn laid_out(inputs: &[PhasorInput], layout: ChainLayout) -> Self {
        match layout {
            ChainLayout::TipToTail => Self::tip_to_tail(inputs),
            ChainLayout::FromOrigin => Self::from_origin(inputs),
        }
    }
    pub fn len(&self) -> usize {
        self.segments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Instantaneous values of one display frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSignals {
    pub time: f64,
    /// Phase values of the harmonic set (zero sequence excluded).
    pub harmonics: [f64; 3],
    pub negative: [f64; 3],
    pub alpha: f64,
    pub beta: f64,
}

/// Positive-set resultant from the origin with the negative-set resultant stacked on it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RotatingFields {
    pub positive: Option<PhasorSegment>,
    pub negative: Option<PhasorSegment>,
}

/// Spotlight geometry for one active component of the rotation chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TourStop {
    pub component: SequenceComponent,
    /// Signed harmonic order of the component.
    pub frequency: f64,
    pub peak: Option<SpectralPeak>,
    pub segment: PhasorSegment,
    /// Midpoint of the segment.
    pub focus: Vector2,
    /// Side length of a square viewport around `focus`.
    pub zoom_span: f64,
}

/// Turns frame values into 2D phasor chains.
#[derive(Clone, Copy, Debug)]
pub struct VectorChainBuilder {
    config: PhasorConfig,
    omega: f64,
}
impl VectorChainBuilder {
    /// `omega` is the fundamental angular frequency in rad/s.
    pub fn new(config: PhasorConfig, omega: f64) -> Result<Self, EngineError> {
        config.validate()?;
        if !(omega > 0.0 && omega.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "angular frequency {omega} must be positive"
            )));
        }
        Ok(Self { config, omega })
    }
    pub fn config(&self) -> &PhasorConfig {
        &self.config
    }
    /// `(v cos(phi_k), v sin(phi_k))` for each phase.
    pub fn phase_vectors(values: [f64; 3], set: PhaseSet, visible: bool) -> [PhasorInput; 3] {
        Phase::ALL.map(|phase| PhasorInput {
            vector: Vector2::from_polar(values[phase.index()], phase.offset_radians()),
            source: SegmentSource::Phase { phase, set },
            visible,
        })
    }
    pub fn clarke_vectors(alpha: f64, beta: f64) -> [PhasorInput; 2] {
        [
            PhasorInput {
                vector: Vector2::new(alpha, 0.0),
                source: SegmentSource::Alpha,
                visible: true,
            },
            PhasorInput {
                vector: Vector2::new(0.0, beta),
                source: SegmentSource::Beta,
                visible: true,
            },
        ]
    }
    /// One phasor per active component, rotating at `±h·ω`, scaled by `rotation_scale`.
    pub fn rotating_vectors(&self, components: &[SequenceComponent], time: f64) -> Vec<PhasorInput> {
        components
            .iter()
            .map(|component| {
                let angle = component.signed_order() * self.omega * time;
                PhasorInput {
                    vector: Vector2::from_polar(
                        component.amplitude * self.config.rotation_scale,
                        angle,
                    ),
                    source: SegmentSource::Rotating(*component),
                    visible: true,
                }
            })
            .collect()
    }
    pub fn build(
        &self,
        view: PhasorView,
        mode: RenderMode,
        frame: &FrameSignals,
        spec: &HarmonicSpec,
    ) -> PhasorChain {
        let layout = match mode {
            RenderMode::Superposed => ChainLayout::FromOrigin,
            RenderMode::Decomposition | RenderMode::HarmonicRotation => ChainLayout::TipToTail,
        };
        if mode == RenderMode::HarmonicRotation && view != PhasorView::Clarke {
            let components: Vec<SequenceComponent> = spec
                .active_components(self.config.visibility_threshold)
                .into_iter()
                .filter(|component| rotation_view_includes(view, component))
                .collect();
            return PhasorChain::tip_to_tail(&self.rotating_vectors(&components, frame.time));
        }
        let inputs: Vec<PhasorInput> = match view {
            PhasorView::Harmonics => self.harmonic_set(frame, spec).to_vec(),
            PhasorView::Negative => self.negative_set(frame, spec).to_vec(),
            PhasorView::Combined => {
                let mut inputs = self.harmonic_set(frame, spec).to_vec();
                inputs.extend(self.negative_set(frame, spec));
                inputs
            }
            PhasorView::Clarke => Self::clarke_vectors(frame.alpha, frame.beta).to_vec(),
        };
        PhasorChain::laid_out(&inputs, layout)
    }
    pub fn rotating_fields(&self, frame: &FrameSignals, spec: &HarmonicSpec) -> RotatingFields {
        let sum = |inputs: &[PhasorInput]| {
            inputs
                .iter()
                .fold(Vector2::ORIGIN, |acc, input| acc + input.vector)
        };
        let positive = self.harmonic_set(frame, spec);
        let negative = self.negative_set(frame, spec);
        let positive = positive[0].visible.then(|| PhasorSegment {
            start: Vector2::ORIGIN,
            vector: sum(&positive),
            source: SegmentSource::Phase {
                phase: Phase::A,
                set: PhaseSet::Harmonics,
            },
            visible: true,
        });
        let base = positive.map(|segment| segment.end()).unwrap_or_default();
        let negative = negative[0].visible.then(|| PhasorSegment {
            start: base,
            vector: sum(&negative),
            source: SegmentSource::Phase {
                phase: Phase::A,
                set: PhaseSet::Negative,
            },
            visible: true,
        });
        RotatingFields { positive, negative }
    }
    /// Walks the combined rotation chain, pairing each segment with its spectral peak.
    pub fn tour(&self, spec: &HarmonicSpec, time: f64, peaks: &[SpectralPeak]) -> Vec<TourStop> {
        let components = spec.active_components(self.config.visibility_threshold);
        let chain = PhasorChain::tip_to_tail(&self.rotating_vectors(&components, time));
        components
            .iter()
            .zip(&chain.segments)
            .map(|(component, segment)| {
                let frequency = component.signed_order();
                TourStop {
                    component: *component,
                    frequency,
                    peak: peaks
                        .iter()
                        .find(|peak| (peak.frequency - frequency).abs() < PEAK_MATCH_TOLERANCE)
                        .copied(),
                    segment: *segment,
                    focus: segment.midpoint(),
                    zoom_span: (segment.vector.norm() * TOUR_ZOOM_FACTOR).max(TOUR_MIN_SPAN),
                }
            })
            .collect()
    }
    fn harmonic_set(&self, frame: &FrameSignals, spec: &HarmonicSpec) -> [PhasorInput; 3] {
        let total: f64 = spec
            .harmonics()
            .filter(|&(order, _)| SequenceClass::of_order(order).is_rotating())
            .map(|(_, amp)| amp)
            .sum();
        let visible = set_visible(total, self.config.set_visibility_threshold);
        Self::phase_vectors(frame.harmonics, PhaseSet::Harmonics, visible)
    }
    fn negative_set(&self, frame: &FrameSignals, spec: &HarmonicSpec) -> [PhasorInput; 3] {
        let visible = set_visible(
            spec.negative_fundamental(),
            self.config.set_visibility_threshold,
        );
        Self::phase_vectors(frame.negative, PhaseSet::Negative, visible)
    }
}

// A phase set is drawn once its total amplitude reaches the threshold.
fn set_visible(total_amplitude: f64, threshold: f64) -> bool {
    total_amplitude >= threshold
}

fn rotation_view_includes(view: PhasorView, component: &SequenceComponent) -> bool {
    let negative_fundamental = component.color == ColorKey::FundamentalNegative;
    match view {
        PhasorView::Harmonics => !negative_fundamental,
        PhasorView::Negative => negative_fundamental,
        PhasorView::Combined | PhasorView::Clarke => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::engine::{ClarkeTransformer, SignalSynthesizer, SpectralAnalyzer};
    use crate::types::{ClarkeInvariant, FftSource};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f64::consts::PI;

    const MODES: [RenderMode; 3] = [
        RenderMode::Decomposition,
        RenderMode::Superposed,
        RenderMode::HarmonicRotation,
    ];

    fn frames(spec: &HarmonicSpec) -> Vec<FrameSignals> {
        let signals = SignalSynthesizer::new(SamplingConfig::default())
            .unwrap()
            .synthesize(spec);
        let display = &signals.display;
        let clarke = ClarkeTransformer::new(ClarkeInvariant::Amplitude).transform(&display.combined);
        (0..display.len())
            .map(|i| {
                let (alpha, beta) = clarke.sample(i).unwrap();
                FrameSignals {
                    time: display.combined.time_at(i),
                    harmonics: display.harmonics.sample(i).unwrap(),
                    negative: display.negative.sample(i).unwrap(),
                    alpha,
                    beta,
                }
            })
            .collect()
    }
    fn builder() -> VectorChainBuilder {
        VectorChainBuilder::new(PhasorConfig::default(), 2.0 * PI).unwrap()
    }
    fn random_spec(rng: &mut StdRng) -> HarmonicSpec {
        let mut spec = HarmonicSpec::silent();
        for order in 1..=13 {
            if rng.gen_bool(0.6) {
                spec.set_harmonic(order, rng.gen_range(0.0..1.5)).unwrap();
            }
        }
        spec.set_negative_fundamental(rng.gen_range(0.0..1.0))
            .unwrap();
        spec
    }
    fn close(a: Vector2, b: Vector2, tol: f64) -> bool {
        (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol
    }

    #[test]
    fn tip_to_tail_endpoints_accumulate() {
        let inputs: Vec<PhasorInput> = [(1.0, 0.0), (0.0, 2.0), (-0.5, 0.5)]
            .iter()
            .map(|&(x, y)| PhasorInput {
                vector: Vector2::new(x, y),
                source: SegmentSource::Alpha,
                visible: true,
            })
            .collect();
        let chain = PhasorChain::tip_to_tail(&inputs);
        assert_eq!(chain.segments[1].start, Vector2::new(1.0, 0.0));
        assert_eq!(chain.segments[2].start, Vector2::new(1.0, 2.0));
        assert_eq!(chain.resultant, Vector2::new(0.5, 2.5));
        let origin = PhasorChain::from_origin(&inputs);
        assert!(origin.segments.iter().all(|s| s.start == Vector2::ORIGIN));
        assert_eq!(origin.resultant, chain.resultant);
    }
    #[test]
    fn superposed_and_decomposition_resultants_agree_every_frame() {
        let mut rng = StdRng::seed_from_u64(42);
        let builder = builder();
        for _ in 0..5 {
            let spec = random_spec(&mut rng);
            for frame in frames(&spec) {
                for view in PhasorView::ALL {
                    let tip = builder.build(view, RenderMode::Decomposition, &frame, &spec);
                    let sum = builder.build(view, RenderMode::Superposed, &frame, &spec);
                    assert_eq!(tip.layout, ChainLayout::TipToTail);
                    assert_eq!(sum.layout, ChainLayout::FromOrigin);
                    assert!(close(tip.resultant, sum.resultant, 1e-9));
                }
            }
        }
    }
    #[test]
    fn zero_sequence_orders_never_reach_a_chain() {
        let base = HarmonicSpec::new([(1, 1.0), (2, 0.3), (7, 0.2)], 0.2).unwrap();
        let with_zero = base
            .clone()
            .with_harmonic(3, 0.8)
            .and_then(|s| s.with_harmonic(6, 0.4))
            .and_then(|s| s.with_harmonic(9, 0.6))
            .unwrap();
        let builder = builder();
        for (a, b) in frames(&base).iter().zip(frames(&with_zero).iter()).step_by(7) {
            for view in PhasorView::ALL {
                for mode in MODES {
                    let plain = builder.build(view, mode, a, &base);
                    let zero = builder.build(view, mode, b, &with_zero);
                    assert_eq!(plain.len(), zero.len());
                    for (p, z) in plain.segments.iter().zip(&zero.segments) {
                        assert!(close(p.end(), z.end(), 1e-9));
                    }
                    assert!(zero.segments.iter().all(|s| match s.source {
                        SegmentSource::Rotating(c) => c.class != SequenceClass::Zero,
                        _ => true,
                    }));
                }
            }
        }
    }
    #[test]
    fn combined_resultant_is_three_halves_of_clarke() {
        let mut rng = StdRng::seed_from_u64(3);
        let spec = random_spec(&mut rng);
        let builder = builder();
        for frame in frames(&spec).iter().step_by(5) {
            let chain = builder.build(PhasorView::Combined, RenderMode::Superposed, frame, &spec);
            let clarke = builder.build(PhasorView::Clarke, RenderMode::Superposed, frame, &spec);
            assert!(close(chain.resultant.scaled(2.0 / 3.0), clarke.resultant, 1e-9));
        }
    }
    #[test]
    fn rotation_chain_orders_and_directions() {
        let spec = HarmonicSpec::new([(1, 1.0), (2, 0.5), (3, 0.9), (4, 0.25)], 0.2).unwrap();
        let builder = builder();
        let frame = frames(&spec)[13];
        let chain = builder.build(
            PhasorView::Combined,
            RenderMode::HarmonicRotation,
            &frame,
            &spec,
        );
        let keys: Vec<ColorKey> = chain
            .segments
            .iter()
            .filter_map(|s| s.source.color_key())
            .collect();
        assert_eq!(
            keys,
            vec![
                ColorKey::FundamentalPositive,
                ColorKey::FundamentalNegative,
                ColorKey::Harmonic(2),
                ColorKey::Harmonic(4),
            ]
        );
        let wt = 2.0 * PI * frame.time;
        let h2 = chain.segments[2].vector;
        assert!(close(h2, Vector2::from_polar(0.5 * 1.5, -2.0 * wt), 1e-12));
        let h4 = chain.segments[3].vector;
        assert!(close(h4, Vector2::from_polar(0.25 * 1.5, 4.0 * wt), 1e-12));
        assert_eq!(chain.segments[3].start, chain.segments[2].end());
        assert_eq!(chain.resultant, chain.segments[3].end());

        let harmonics =
            builder.build(PhasorView::Harmonics, RenderMode::HarmonicRotation, &frame, &spec);
        assert_eq!(harmonics.len(), 3);
        let negative =
            builder.build(PhasorView::Negative, RenderMode::HarmonicRotation, &frame, &spec);
        assert_eq!(negative.len(), 1);
        let clarke = builder.build(PhasorView::Clarke, RenderMode::HarmonicRotation, &frame, &spec);
        assert_eq!(clarke.layout, ChainLayout::TipToTail);
        assert_eq!(clarke.len(), 2);
    }
    #[test]
    fn unscaled_rotation_resultant_matches_amplitude_invariant_clarke() {
        let mut rng = StdRng::seed_from_u64(11);
        let spec = random_spec(&mut rng);
        let config = PhasorConfig {
            rotation_scale: 1.0,
            visibility_threshold: 0.0,
            ..PhasorConfig::default()
        };
        let builder = VectorChainBuilder::new(config, 2.0 * PI).unwrap();
        for frame in frames(&spec).iter().step_by(9) {
            let chain = builder.build(
                PhasorView::Combined,
                RenderMode::HarmonicRotation,
                frame,
                &spec,
            );
            assert!(close(chain.resultant, Vector2::new(frame.alpha, frame.beta), 1e-9));
        }
    }
    #[test]
    fn silent_spec_leaves_every_resultant_at_origin() {
        let spec = HarmonicSpec::silent();
        let builder = builder();
        for frame in frames(&spec).iter().step_by(20) {
            for view in PhasorView::ALL {
                for mode in MODES {
                    let chain = builder.build(view, mode, frame, &spec);
                    assert_eq!(chain.resultant, Vector2::ORIGIN);
                }
            }
            let rotation =
                builder.build(PhasorView::Combined, RenderMode::HarmonicRotation, frame, &spec);
            assert!(rotation.is_empty());
        }
    }
    #[test]
    fn quiet_sets_are_hidden_but_still_summed() {
        let spec = HarmonicSpec::new([(1, 1.0)], 0.005).unwrap();
        let frame = frames(&spec)[10];
        let chain = builder().build(PhasorView::Combined, RenderMode::Decomposition, &frame, &spec);
        assert_eq!(chain.len(), 6);
        assert!(chain.segments[..3].iter().all(|s| s.visible));
        assert!(chain.segments[3..].iter().all(|s| !s.visible));
        assert_eq!(chain.resultant, chain.segments[5].end());
    }
    #[test]
    fn rotating_fields_stack_negative_on_positive() {
        let spec = HarmonicSpec::new([(1, 1.0)], 0.4).unwrap();
        let builder = builder();
        let frame = frames(&spec)[37];
        let fields = builder.rotating_fields(&frame, &spec);
        let positive = fields.positive.unwrap();
        let negative = fields.negative.unwrap();
        assert_eq!(positive.start, Vector2::ORIGIN);
        assert_eq!(negative.start, positive.end());
        let combined = builder.build(PhasorView::Combined, RenderMode::Superposed, &frame, &spec);
        assert!(close(negative.end(), combined.resultant, 1e-9));

        let quiet = HarmonicSpec::new([(1, 1.0)], 0.0).unwrap();
        let fields = builder.rotating_fields(&frames(&quiet)[37], &quiet);
        assert!(fields.positive.is_some());
        assert!(fields.negative.is_none());
    }
    #[test]
    fn tour_pairs_segments_with_peaks() {
        let spec = HarmonicSpec::new([(1, 1.0), (5, 0.2)], 0.3).unwrap();
        let signals = SignalSynthesizer::new(SamplingConfig::default())
            .unwrap()
            .synthesize(&spec);
        let phases = &signals.analysis.combined;
        let clarke = ClarkeTransformer::default().transform(phases);
        let (_, peaks) = SpectralAnalyzer::default()
            .analyze_source(FftSource::ComplexVector, phases, &clarke)
            .unwrap();
        let stops = builder().tour(&spec, 0.3, &peaks);
        let freqs: Vec<f64> = stops.iter().map(|s| s.frequency).collect();
        assert_eq!(freqs, vec![1.0, -1.0, -5.0]);
        for stop in &stops {
            let peak = stop.peak.expect("every active component has a peak");
            assert_eq!(peak.color, stop.component.color);
            assert_eq!(stop.focus, stop.segment.midpoint());
        }
        assert!((stops[0].zoom_span - 4.5).abs() < 1e-12);
        assert!((stops[2].zoom_span - 0.9).abs() < 1e-12);
        assert_eq!(stops[1].segment.start, stops[0].segment.end());
        assert!(builder().tour(&HarmonicSpec::silent(), 0.3, &peaks).is_empty());
    }
    #[test]
    fn rejects_unusable_geometry_settings() {
        let bad_scale = PhasorConfig {
            rotation_scale: 0.0,
            ..PhasorConfig::default()
        };
        let err = VectorChainBuilder::new(bad_scale, 2.0 * PI).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        let bad_threshold = PhasorConfig {
            visibility_threshold: f64::NAN,
            ..PhasorConfig::default()
        };
        assert!(VectorChainBuilder::new(bad_threshold, 2.0 * PI).is_err());
        for omega in [0.0, -1.0, f64::INFINITY] {
            assert!(VectorChainBuilder::new(PhasorConfig::default(), omega).is_err());
        }
    }
}
