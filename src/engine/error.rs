use thiserror::Error;
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("frame index {index} out of range; expected 0..{frame_count}")]
    InvalidFrame { index: usize, frame_count: usize },
    #[error("unsupported {kind} selector: {value:?}")]
    InvalidSelector { kind: &'static str, value: String },
    #[error("harmonic order {0} outside 1..=13")]
    HarmonicOrderOutOfRange(u8),
    #[error("amplitude {value} for {} must be finite and non-negative", amplitude_slot(.order))]
    InvalidAmplitude { order: Option<u8>, value: f64 },
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("no analysis computed yet; call recompute first")]
    NotComputed,
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for EngineError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        EngineError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for EngineError {
    fn from(value: image::ImageError) -> Self {
        EngineError::Plot(value.to_string())
    }
}
fn amplitude_slot(order: &Option<u8>) -> String {
    match order {
        Some(order) => format!("H{order}"),
        None => "negative-sequence fundamental".to_owned(),
    }
}
