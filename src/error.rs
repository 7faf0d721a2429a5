use thiserror::Error;

/// Per-block analysis failures. The block is dropped and the previously
/// published features stay in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid sample block: {len} samples at {sample_rate} Hz (need a power-of-two length and a positive rate)")]
    InvalidFormat { len: usize, sample_rate: f32 },
    #[error("Spectral analyzer is not initialized")]
    NotReady,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to build fractal pipeline: {0}")]
    PipelineInitFailed(String),
    #[error("Frame target {width}x{height} is outside the device limit of 1..={max} per side")]
    UnsupportedTargetSize { width: u32, height: u32, max: u32 },
    #[error("Frame dispatch skipped: {0}")]
    DispatchSkipped(String),
    #[error("Frame readback failed: {0}")]
    Readback(String),
}

impl RenderError {
    /// Only pipeline and target setup failures stop rendering; everything else is a
    /// dropped frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RenderError::PipelineInitFailed(_) | RenderError::UnsupportedTargetSize { .. }
        )
    }
}
