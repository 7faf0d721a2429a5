use std::sync::Arc;

use super::analysis::{SpectralAnalyzer, BLOCK_SIZE};
use super::features::FeatureBuffer;
use crate::error::AnalysisError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub analyzed: u64,
    pub invalid: u64,
    pub not_ready: u64,
}

/// Capture-side entry point: re-chunks incoming samples into analysis blocks
/// and publishes the resulting features.
pub struct AudioEngine {
    analyzer: SpectralAnalyzer,
    features: Arc<FeatureBuffer>,
    pending: Vec<f32>,
    sample_rate: f32,
    stats: EngineStats,
}

impl AudioEngine {
    pub fn new(gain: f32) -> Self {
        Self {
            analyzer: SpectralAnalyzer::new(gain),
            features: Arc::new(FeatureBuffer::new()),
            pending: Vec::with_capacity(BLOCK_SIZE * 2),
            sample_rate: 0.0,
            stats: EngineStats::default(),
        }
    }

    /// Plan the transform. Blocks delivered before this are dropped.
    pub fn initialize(&mut self) -> Result<(), AnalysisError> {
        self.analyzer.initialize(BLOCK_SIZE)
    }

    /// Shared handle for the render side.
    pub fn features(&self) -> Arc<FeatureBuffer> {
        Arc::clone(&self.features)
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Capture callback. Never fails: a bad block is counted, logged and
    /// dropped while the previous snapshot stays published.
    pub fn on_samples(&mut self, samples: &[f32], sample_rate: f32) {
        // Rejected before the rate comparison: NaN never equals the stored rate
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            self.stats.invalid += 1;
            log::debug!("{}", AnalysisError::InvalidFormat { len: samples.len(), sample_rate });
            return;
        }

        if sample_rate != self.sample_rate {
            if !self.pending.is_empty() {
                log::debug!("Sample rate changed {} -> {}, dropping partial block", self.sample_rate, sample_rate);
            }
            self.pending.clear();
            self.sample_rate = sample_rate;
        }

        self.pending.extend_from_slice(samples);

        let mut consumed = 0;
        while self.pending.len() - consumed >= BLOCK_SIZE {
            let block = &self.pending[consumed..consumed + BLOCK_SIZE];
            match self.analyzer.analyze(block, sample_rate) {
                Ok(features) => {
                    self.features.publish(features);
                    self.stats.analyzed += 1;
                }
                Err(AnalysisError::NotReady) => {
                    self.stats.not_ready += 1;
                    log::debug!("Analyzer not ready, dropping block");
                }
                Err(err @ AnalysisError::InvalidFormat { .. }) => {
                    self.stats.invalid += 1;
                    log::debug!("{}", err);
                }
            }
            consumed += BLOCK_SIZE;
        }
        self.pending.drain(..consumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pitch::note_name;
    use std::f32::consts::PI;

    fn sine_block(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_a440_end_to_end() {
        let mut engine = AudioEngine::new(4.0);
        engine.initialize().unwrap();
        let features = engine.features();

        engine.on_samples(&sine_block(440.0, 44_100.0, BLOCK_SIZE), 44_100.0);

        let latest = features.latest();
        assert!((latest.dominant_frequency_hz - 440.0).abs() <= 44.0);
        assert_eq!(note_name(latest.dominant_frequency_hz), "A4");
        assert!(latest.loudness > 0.0);
        assert_eq!(engine.stats().analyzed, 1);
    }

    #[test]
    fn test_rechunks_odd_sized_buffers() {
        let mut engine = AudioEngine::new(4.0);
        engine.initialize().unwrap();

        let samples = sine_block(440.0, 48_000.0, BLOCK_SIZE * 3);
        for chunk in samples.chunks(300) {
            engine.on_samples(chunk, 48_000.0);
        }
        assert_eq!(engine.stats().analyzed, 3);
    }

    #[test]
    fn test_blocks_before_initialize_keep_previous_features() {
        let mut engine = AudioEngine::new(4.0);
        let features = engine.features();

        engine.on_samples(&sine_block(440.0, 44_100.0, BLOCK_SIZE), 44_100.0);
        assert_eq!(engine.stats().not_ready, 1);
        assert_eq!(features.latest().loudness, 0.0);

        engine.initialize().unwrap();
        engine.on_samples(&sine_block(440.0, 44_100.0, BLOCK_SIZE), 44_100.0);
        assert!(features.latest().loudness > 0.0);
    }

    #[test]
    fn test_zero_rate_is_dropped() {
        let mut engine = AudioEngine::new(4.0);
        engine.initialize().unwrap();
        engine.on_samples(&sine_block(440.0, 44_100.0, BLOCK_SIZE), 44_100.0);
        let before = *engine.features().latest();

        engine.on_samples(&[0.0; BLOCK_SIZE], 0.0);
        assert_eq!(engine.stats().invalid, 1);
        assert_eq!(*engine.features().latest(), before);
    }

    #[test]
    fn test_non_finite_rate_is_counted_and_keeps_pending_samples() {
        let mut engine = AudioEngine::new(4.0);
        engine.initialize().unwrap();
        let block = sine_block(440.0, 44_100.0, BLOCK_SIZE);

        engine.on_samples(&block[..600], 44_100.0);
        engine.on_samples(&block, f32::NAN);
        engine.on_samples(&block, f32::INFINITY);
        assert_eq!(engine.stats().invalid, 2);
        assert_eq!(engine.stats().analyzed, 0);

        // The partial block survives the rejected calls
        engine.on_samples(&block[600..], 44_100.0);
        assert_eq!(engine.stats().analyzed, 1);
    }
}
