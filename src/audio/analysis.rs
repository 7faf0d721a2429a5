use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::features::{AudioFeatures, NUM_BANDS};
use super::window::{coherent_gain, hamming_window};
use crate::error::AnalysisError;

pub const BLOCK_SIZE: usize = 1024;
pub const DEFAULT_GAIN: f32 = 4.0;

/// Band boundaries in Hz. The last band runs up to Nyquist.
pub const BAND_EDGES_HZ: [f32; NUM_BANDS + 1] = [
    20.0, 60.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, f32::INFINITY,
];

struct Plan {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    coherent_gain: f32,
    buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

/// Turns sample blocks into [`AudioFeatures`].
///
/// The FFT plan and window are built by [`SpectralAnalyzer::initialize`];
/// until then every block is rejected with [`AnalysisError::NotReady`].
pub struct SpectralAnalyzer {
    gain: f32,
    plan: Option<Plan>,
}

impl SpectralAnalyzer {
    pub fn new(gain: f32) -> Self {
        Self { gain, plan: None }
    }

    /// Plan the transform and window for `block_size`. Calling again with the
    /// same size keeps the existing plan.
    pub fn initialize(&mut self, block_size: usize) -> Result<(), AnalysisError> {
        if !block_size.is_power_of_two() {
            return Err(AnalysisError::InvalidFormat { len: block_size, sample_rate: 0.0 });
        }
        if self.plan.as_ref().is_some_and(|p| p.size == block_size) {
            return Ok(());
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(block_size);
        let window = hamming_window(block_size);
        let coherent_gain = coherent_gain(&window).max(1e-10);

        log::debug!("Planned {}-point FFT (coherent gain {:.2})", block_size, coherent_gain);

        self.plan = Some(Plan {
            size: block_size,
            fft,
            window,
            coherent_gain,
            buffer: vec![Complex::new(0.0, 0.0); block_size],
            magnitudes: vec![0.0; block_size / 2 + 1],
        });
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.plan.is_some()
    }

    pub fn analyze(&mut self, block: &[f32], sample_rate: f32) -> Result<AudioFeatures, AnalysisError> {
        let invalid = || AnalysisError::InvalidFormat { len: block.len(), sample_rate };
        if !block.len().is_power_of_two() || !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(invalid());
        }

        let plan = self.plan.as_mut().ok_or(AnalysisError::NotReady)?;
        if plan.size != block.len() {
            return Err(invalid());
        }

        // Window + RMS
        let mut sum_sq = 0.0f32;
        for (slot, (&s, &w)) in plan.buffer.iter_mut().zip(block.iter().zip(plan.window.iter())) {
            let windowed = if s.is_finite() { s * w } else { 0.0 };
            sum_sq += windowed * windowed;
            *slot = Complex::new(windowed, 0.0);
        }
        let rms = (sum_sq / plan.size as f32).sqrt();
        let loudness = (rms * self.gain).clamp(0.0, 1.0);

        plan.fft.process(&mut plan.buffer);

        let half = plan.size / 2;
        for (mag, c) in plan.magnitudes.iter_mut().zip(plan.buffer[..=half].iter()) {
            *mag = c.norm() / plan.coherent_gain;
        }

        let freq_resolution = sample_rate / plan.size as f32;

        // Strongest bin, skipping DC
        let dominant_bin = plan.magnitudes[1..]
            .iter()
            .enumerate()
            .fold((0usize, 0.0f32), |best, (i, &m)| if m > best.1 { (i + 1, m) } else { best });
        let dominant_frequency_hz = if dominant_bin.1 > 1e-6 {
            dominant_bin.0 as f32 * freq_resolution
        } else {
            0.0
        };

        let spectrum = band_energies(&plan.magnitudes, freq_resolution, sample_rate / 2.0);

        Ok(AudioFeatures::from_spectrum(loudness, dominant_frequency_hz, spectrum))
    }
}

/// Average magnitude per band, log-compressed into 0..1.
fn band_energies(magnitudes: &[f32], freq_resolution: f32, nyquist: f32) -> [f32; NUM_BANDS] {
    let mut sums = [0.0f32; NUM_BANDS];
    let mut counts = [0usize; NUM_BANDS];

    for (bin, &mag) in magnitudes.iter().enumerate() {
        let freq = bin as f32 * freq_resolution;
        if let Some(band) = band_for_frequency(freq, nyquist) {
            sums[band] += mag;
            counts[band] += 1;
        }
    }

    let mut energies = [0.0f32; NUM_BANDS];
    for band in 0..NUM_BANDS {
        if counts[band] == 0 {
            continue;
        }
        let avg = sums[band] / counts[band] as f32;
        energies[band] = compress(avg);
    }
    energies
}

pub fn band_for_frequency(freq: f32, nyquist: f32) -> Option<usize> {
    if freq > nyquist {
        return None;
    }
    (0..NUM_BANDS).find(|&b| {
        let lo = BAND_EDGES_HZ[b];
        let hi = BAND_EDGES_HZ[b + 1];
        freq >= lo && (freq < hi || (b == NUM_BANDS - 1 && freq <= nyquist))
    })
}

fn compress(avg: f32) -> f32 {
    ((1.0 + 10.0 * avg).log10() / 2.0).clamp(0.0, 1.0)
}
