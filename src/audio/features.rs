use std::sync::{Arc, Mutex};

pub const NUM_BANDS: usize = 8;

/// Dominant frequencies are mapped onto 0..1 against this ceiling before they
/// drive navigation triggers, trap selection and the Julia constant.
pub const NORMALIZED_FREQUENCY_CEILING_HZ: f32 = 2000.0;

/// One analyzed block, ready for the render tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFeatures {
    /// RMS of the windowed block, gain-scaled (0.0-1.0)
    pub loudness: f32,
    /// Center frequency of the strongest bin (Hz)
    pub dominant_frequency_hz: f32,
    /// Log-compressed band energies (0.0-1.0)
    pub spectrum: [f32; NUM_BANDS],
    pub bass: f32, // bands 0-1
    pub mid: f32,  // bands 2-4
    pub high: f32, // bands 5-7
}

impl AudioFeatures {
    pub fn from_spectrum(loudness: f32, dominant_frequency_hz: f32, spectrum: [f32; NUM_BANDS]) -> Self {
        let mean = |bands: &[f32]| bands.iter().sum::<f32>() / bands.len() as f32;
        Self {
            loudness,
            dominant_frequency_hz,
            bass: mean(&spectrum[0..2]),
            mid: mean(&spectrum[2..5]),
            high: mean(&spectrum[5..8]),
            spectrum,
        }
    }

    pub fn normalized_frequency(&self) -> f32 {
        if !self.dominant_frequency_hz.is_finite() {
            return 0.0;
        }
        (self.dominant_frequency_hz / NORMALIZED_FREQUENCY_CEILING_HZ).clamp(0.0, 1.0)
    }
}

/// Latest-value-wins handoff between the analysis thread and the render tick.
///
/// The writer swaps in a whole new snapshot; readers clone the `Arc` and keep
/// a consistent view for as long as they hold it.
#[derive(Debug, Default)]
pub struct FeatureBuffer {
    current: Mutex<Arc<AudioFeatures>>,
}

impl FeatureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, features: AudioFeatures) {
        let next = Arc::new(features);
        match self.current.lock() {
            Ok(mut slot) => *slot = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn latest(&self) -> Arc<AudioFeatures> {
        match self.current.lock() {
            Ok(slot) => Arc::clone(&slot),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
