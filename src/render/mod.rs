// src/render/mod.rs
// PNG snapshots of engine output; the engine never calls into here.
pub mod palette;
pub mod plot;
pub mod trace;

pub use palette::HarmonicPalette;
pub use plot::{
    render_clarke_png, render_phasor_png, render_spectrum_png, render_waveform_png, PlotStyle,
};
pub use trace::Trajectory;
