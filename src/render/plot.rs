use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::engine::phasor::{PhasorChain, RotatingFields, Vector2};
use crate::engine::{ClarkeSignal, EngineError, SpectralPeak, Spectrum, ThreePhaseSignal};
use crate::render::palette::{
    HarmonicPalette, ALPHA, BACKGROUND, BETA, POSITIVE_SET, RESULTANT_NEGATIVE, RESULTANT_POSITIVE,
};
use crate::render::trace::Trajectory;
use crate::types::{Phase, MAX_HARMONIC_ORDER};

const SPECTRUM_SPAN: f64 = MAX_HARMONIC_ORDER as f64 + 2.0;
const SPECTRUM_CURVE: RGBColor = RGBColor(0x00, 0x7a, 0xcc);

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    /// Captions, axis labels and legends; needs a system font.
    pub show_labels: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: BACKGROUND,
            show_labels: true,
        }
    }
}
impl PlotStyle {
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
            ..Self::default()
        }
    }
    pub fn without_labels(mut self) -> Self {
        self.show_labels = false;
        self
    }
}

struct Curve {
    label: String,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

pub fn render_waveform_png(
    signal: &ThreePhaseSignal,
    style: &PlotStyle,
) -> Result<Vec<u8>, EngineError> {
    if signal.is_empty() {
        return Err(EngineError::Plot("three-phase signal has no samples".into()));
    }
    let times = signal.times();
    let curves: Vec<Curve> = Phase::ALL
        .iter()
        .map(|&phase| Curve {
            label: phase.to_string(),
            color: POSITIVE_SET[phase.index()],
            points: times
                .iter()
                .copied()
                .zip(signal.phase(phase).iter().copied())
                .collect(),
        })
        .collect();
    render_curves("Phase signals", &curves, style)
}

pub fn render_clarke_png(
    clarke: &ClarkeSignal,
    style: &PlotStyle,
) -> Result<Vec<u8>, EngineError> {
    if clarke.is_empty() {
        return Err(EngineError::Plot("clarke signal has no samples".into()));
    }
    let dt = clarke.sample_spacing();
    let curve = |label: &str, color, values: ndarray::ArrayView1<'_, f64>| Curve {
        label: label.to_owned(),
        color,
        points: values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64 * dt, v))
            .collect(),
    };
    let curves = [
        curve("alpha", ALPHA, clarke.alpha()),
        curve("beta", BETA, clarke.beta()),
    ];
    render_curves("Clarke components", &curves, style)
}

/// Magnitude curve with one colored stem per labeled peak.
pub fn render_spectrum_png(
    spectrum: &Spectrum,
    peaks: &[SpectralPeak],
    palette: &HarmonicPalette,
    style: &PlotStyle,
) -> Result<Vec<u8>, EngineError> {
    if spectrum.is_empty() {
        return Err(EngineError::Plot("spectrum has no magnitudes".into()));
    }
    let visible: Vec<(f64, f64)> = spectrum
        .frequencies
        .iter()
        .copied()
        .zip(spectrum.magnitudes.iter().copied())
        .filter(|(f, _)| f.abs() <= SPECTRUM_SPAN)
        .collect();
    let y_max = visible.iter().fold(0.0_f64, |acc, &(_, m)| acc.max(m)).max(1e-3) * 1.1;
    render_to_png(style, |root| {
        let mut builder = ChartBuilder::on(root);
        builder.margin(10);
        if style.show_labels {
            builder
                .caption("FFT Magnitude", ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 45)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(-SPECTRUM_SPAN..SPECTRUM_SPAN, 0.0..y_max)?;
        if style.show_labels {
            chart
                .configure_mesh()
                .light_line_style(&WHITE.mix(0.1))
                .draw()?;
        }
        chart.draw_series(LineSeries::new(visible.iter().copied(), &SPECTRUM_CURVE))?;
        chart.draw_series(peaks.iter().map(|peak| {
            PathElement::new(
                vec![(peak.frequency, 0.0), (peak.frequency, peak.magnitude)],
                palette.get(peak.color).stroke_width(2),
            )
        }))?;
        chart.draw_series(peaks.iter().map(|peak| {
            Circle::new(
                (peak.frequency, peak.magnitude),
                4,
                palette.get(peak.color).filled(),
            )
        }))?;
        Ok(())
    })
}

/// One phasor view: visible segments, resultant, optional overlay and trace.
pub fn render_phasor_png(
    chain: &PhasorChain,
    fields: Option<&RotatingFields>,
    trajectory: Option<&Trajectory>,
    palette: &HarmonicPalette,
    style: &PlotStyle,
) -> Result<Vec<u8>, EngineError> {
    let mut extent = 1.0_f64;
    let mut widen = |p: Vector2| extent = extent.max(p.x.abs()).max(p.y.abs());
    for segment in &chain.segments {
        widen(segment.start);
        widen(segment.end());
    }
    widen(chain.resultant);
    for segment in fields.iter().flat_map(|f| [f.positive, f.negative]).flatten() {
        widen(segment.end());
    }
    trajectory.into_iter().flat_map(Trajectory::points).for_each(&mut widen);
    let extent = extent * 1.15;
    render_to_png(style, |root| {
        let mut builder = ChartBuilder::on(root);
        builder.margin(10);
        if style.show_labels {
            builder
                .set_label_area_size(LabelAreaPosition::Left, 40)
                .set_label_area_size(LabelAreaPosition::Bottom, 30);
        }
        let mut chart = builder.build_cartesian_2d(-extent..extent, -extent..extent)?;
        if style.show_labels {
            chart
                .configure_mesh()
                .light_line_style(&WHITE.mix(0.1))
                .draw()?;
        }
        if let Some(trajectory) = trajectory {
            chart.draw_series(LineSeries::new(
                trajectory.points().map(|p| (p.x, p.y)),
                &RESULTANT_POSITIVE.mix(0.6),
            ))?;
        }
        let drawn = chain.segments.iter().filter(|segment| segment.visible);
        chart.draw_series(drawn.clone().map(|segment| {
            let (start, end) = (segment.start, segment.end());
            PathElement::new(
                vec![(start.x, start.y), (end.x, end.y)],
                palette.segment_color(&segment.source).stroke_width(2),
            )
        }))?;
        chart.draw_series(drawn.map(|segment| {
            let end = segment.end();
            Circle::new(
                (end.x, end.y),
                3,
                palette.segment_color(&segment.source).filled(),
            )
        }))?;
        if let Some(fields) = fields {
            let overlay = [
                (fields.positive, RESULTANT_POSITIVE),
                (fields.negative, RESULTANT_NEGATIVE),
            ];
            for (segment, color) in overlay {
                if let Some(segment) = segment {
                    let (start, end) = (segment.start, segment.end());
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(start.x, start.y), (end.x, end.y)],
                        color.stroke_width(1),
                    )))?;
                }
            }
        }
        let tip = chain.resultant;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (tip.x, tip.y)],
            RESULTANT_POSITIVE.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(Circle::new(
            (tip.x, tip.y),
            5,
            RESULTANT_POSITIVE.filled(),
        )))?;
        Ok(())
    })
}

fn render_curves(
    caption: &str,
    curves: &[Curve],
    style: &PlotStyle,
) -> Result<Vec<u8>, EngineError> {
    let x_max = curves
        .iter()
        .filter_map(|curve| curve.points.last())
        .fold(0.0_f64, |acc, &(x, _)| acc.max(x));
    let values = curves.iter().flat_map(|curve| curve.points.iter().map(|&(_, y)| y));
    let y_min = values.clone().fold(0.0_f64, f64::min);
    let y_max = values.fold(0.0_f64, f64::max);
    let (y_min, y_max) = if (y_max - y_min).abs() < f64::EPSILON {
        (-1.0, 1.0)
    } else {
        let pad = 0.1 * (y_max - y_min);
        (y_min - pad, y_max + pad)
    };
    render_to_png(style, |root| {
        let mut builder = ChartBuilder::on(root);
        builder.margin(10);
        if style.show_labels {
            builder
                .caption(caption, ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 45)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(0.0..x_max.max(1e-9), y_min..y_max)?;
        if style.show_labels {
            chart
                .configure_mesh()
                .light_line_style(&WHITE.mix(0.1))
                .draw()?;
        }
        for curve in curves {
            let color = curve.color;
            let series = chart.draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(2),
            ))?;
            if style.show_labels {
                series
                    .label(curve.label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
        }
        if style.show_labels {
            chart
                .configure_series_labels()
                .border_style(&WHITE.mix(0.2))
                .background_style(&style.background)
                .draw()?;
        }
        Ok(())
    })
}

fn render_to_png<F>(style: &PlotStyle, draw: F) -> Result<Vec<u8>, EngineError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), EngineError>,
{
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        draw(&root)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EngineError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| EngineError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::{HarmonicSpec, SequencePipeline};
    use crate::types::RenderMode;

    const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

    fn style() -> PlotStyle {
        PlotStyle {
            width: 240,
            height: 160,
            ..PlotStyle::default()
        }
        .without_labels()
    }
    #[test]
    fn plotting_helpers_return_png() {
        let mut pipeline = SequencePipeline::new(EngineConfig::default()).unwrap();
        let snapshot = pipeline.set_spec(HarmonicSpec::new([(1, 1.0), (5, 0.2)], 0.1).unwrap());
        let palette = HarmonicPalette::default();
        let wave = render_waveform_png(&snapshot.signals.display.combined, &style()).unwrap();
        let clarke = render_clarke_png(&snapshot.display_clarke, &style()).unwrap();
        let fft =
            render_spectrum_png(&snapshot.spectrum, &snapshot.peaks, &palette, &style()).unwrap();
        for png in [&wave, &clarke, &fft] {
            assert_eq!(png[..4], PNG_MAGIC);
        }
        let geometry = pipeline.frame(17, RenderMode::Decomposition).unwrap();
        let mut trace = Trajectory::with_capacity(50).unwrap();
        trace.extend((0..=17).filter_map(|i| {
            pipeline
                .frame(i, RenderMode::Decomposition)
                .ok()
                .map(|g| g.combined.resultant)
        }));
        let phasor = render_phasor_png(
            &geometry.combined,
            Some(&geometry.rotating_fields),
            Some(&trace),
            &palette,
            &PlotStyle::square(200).without_labels(),
        )
        .unwrap();
        assert_eq!(phasor[..4], PNG_MAGIC);
    }
    #[test]
    fn empty_inputs_are_rejected() {
        let palette = HarmonicPalette::default();
        assert!(matches!(
            render_spectrum_png(&Spectrum::default(), &[], &palette, &style()),
            Err(EngineError::Plot(_))
        ));
        assert!(matches!(
            render_waveform_png(&ThreePhaseSignal::zeros(0, 0.01), &style()),
            Err(EngineError::Plot(_))
        ));
    }
    #[test]
    fn silent_chain_still_renders() {
        let chain = PhasorChain::empty(crate::engine::ChainLayout::TipToTail);
        let png = render_phasor_png(
            &chain,
            None,
            None,
            &HarmonicPalette::default(),
            &PlotStyle::square(120).without_labels(),
        )
        .unwrap();
        assert!(!png.is_empty());
    }
}
