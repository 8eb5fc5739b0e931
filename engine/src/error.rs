use thiserror::Error;

use crate::position::PositionError;
use crate::synth::SynthesisError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("positioning unavailable: {0}")]
    Positioning(#[from] PositionError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("run target distance must be strictly positive")]
    InvalidTarget,
    #[error("no directions access token configured")]
    MissingDirectionsToken,
}
