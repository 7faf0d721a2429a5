use std::f32::consts::PI;

/// Hamming window of `size` points (symmetric).
pub fn hamming_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / (size - 1) as f32).cos())
        .collect()
}

/// Amplitude a full-scale sinusoid reaches in its FFT bin after windowing.
pub fn coherent_gain(window: &[f32]) -> f32 {
    window.iter().sum::<f32>() / 2.0
}
