// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use seqscope::render::{
    render_clarke_png, render_phasor_png, render_spectrum_png, render_waveform_png,
    HarmonicPalette, PlotStyle, Trajectory,
};
use seqscope::{EngineConfig, Preset, RenderMode, SequencePipeline};

// Headless snapshot: phase signals, Clarke components, spectrum and the
// harmonic-rotation chain with its traced curve.
fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let preset: Preset = match args.next() {
        Some(name) => name.parse().context("unknown preset")?,
        None => Preset::WindBlades,
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "seqscope-out".to_owned()));
    let config = match args.next() {
        Some(path) => {
            EngineConfig::load(&path).with_context(|| format!("loading config {path}"))?
        }
        None => EngineConfig::default(),
    };
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut pipeline = SequencePipeline::new(config)?;
    let snapshot = pipeline.set_spec(preset.spec()?);
    info!("{preset}: {} peaks", snapshot.peaks.len());
    let palette = HarmonicPalette::default();
    let style = PlotStyle::default();
    write_png(
        &out_dir,
        "phases.png",
        render_waveform_png(&snapshot.signals.display.combined, &style)?,
    )?;
    write_png(
        &out_dir,
        "clarke.png",
        render_clarke_png(&snapshot.display_clarke, &style)?,
    )?;
    write_png(
        &out_dir,
        "spectrum.png",
        render_spectrum_png(&snapshot.spectrum, &snapshot.peaks, &palette, &style)?,
    )?;
    let peaks_json = serde_json::to_string_pretty(&snapshot.peaks)?;
    fs::write(out_dir.join("peaks.json"), peaks_json).context("writing peaks.json")?;

    let frames = pipeline.frame_count();
    let mut trajectory = Trajectory::with_capacity(frames)?;
    for index in 0..frames {
        let geometry = pipeline.frame(index, RenderMode::HarmonicRotation)?;
        trajectory.push(geometry.combined.resultant);
    }
    let last = pipeline.frame(frames - 1, RenderMode::HarmonicRotation)?;
    write_png(
        &out_dir,
        "rotation.png",
        render_phasor_png(
            &last.combined,
            None,
            Some(&trajectory),
            &palette,
            &PlotStyle::square(600),
        )?,
    )?;
    println!("wrote {preset} snapshots to {}", out_dir.display());
    Ok(())
}

fn write_png(dir: &Path, name: &str, bytes: Vec<u8>) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
