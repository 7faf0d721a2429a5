//! Audio-reactive fractal explorer: spectral analysis of a live sample
//! stream drives a camera over the Mandelbrot set, and three GPU compute
//! passes turn each camera/audio snapshot into a frame.

pub mod audio;
pub mod error;
pub mod navigation;
pub mod params;
pub mod render;

pub use error::{AnalysisError, RenderError};
pub use params::FrameParameters;
