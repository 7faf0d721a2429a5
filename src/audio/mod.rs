pub mod analysis;
pub mod decode;
pub mod engine;
pub mod features;
pub mod pitch;
pub mod window;

pub use analysis::{SpectralAnalyzer, BLOCK_SIZE};
pub use engine::AudioEngine;
pub use features::{AudioFeatures, FeatureBuffer};
