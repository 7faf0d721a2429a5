//! CPU rendition of the per-pixel math in `shaders/`. The composite pass is
//! checked against it on a real adapter; the coloring helpers are checked
//! here without one.

use rayon::prelude::*;

use crate::params::FrameParameters;

pub const FOREGROUND_MAX_ITER_CAP: u32 = 1024;
pub const INV_GAMMA: f32 = 1.0 / 2.2;

/// Orbit trap used by the foreground pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    Circle,
    Line,
    Cross,
    Spiral,
}

impl Trap {
    /// Quartiles of the normalized dominant frequency pick the trap.
    pub fn for_frequency(normalized_frequency: f32) -> Self {
        if normalized_frequency < 0.25 {
            Trap::Circle
        } else if normalized_frequency < 0.5 {
            Trap::Line
        } else if normalized_frequency < 0.75 {
            Trap::Cross
        } else {
            Trap::Spiral
        }
    }
}

pub fn foreground_max_iterations(params: &FrameParameters) -> u32 {
    let n = 256.0
        + params.zoom_factor * 100.0
        + params.features.loudness * 50.0
        + params.features.bass * 100.0;
    (n.min(FOREGROUND_MAX_ITER_CAP as f32)) as u32
}

pub fn hsv2rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let k = [1.0, 2.0 / 3.0, 1.0 / 3.0];
    let mut out = [0.0; 3];
    for (channel, offset) in out.iter_mut().zip(k) {
        let p = ((h + offset).fract() * 6.0 - 3.0).abs();
        let c = (p - 1.0).clamp(0.0, 1.0);
        *channel = v * (1.0 + (c - 1.0) * s);
    }
    out
}

pub fn gamma_correct(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| c.max(0.0).powf(INV_GAMMA))
}

/// Composite one pixel. `bg` carries the background opacity in alpha.
pub fn composite_pixel(params: &FrameParameters, fg: [f32; 4], bg: [f32; 4]) -> [f32; 4] {
    let blend = params.layer_mix
        * (0.3 + params.zoom_factor * 0.4 + params.features.loudness * 0.3);
    let t = (blend * bg[3]).clamp(0.0, 1.0);
    let boost = 1.0 + params.zoom_factor * 0.3;

    let mut out = [0.0, 0.0, 0.0, 1.0];
    for i in 0..3 {
        let mixed = fg[i] + (bg[i] - fg[i]) * t;
        out[i] = (mixed * boost).clamp(0.0, 1.0);
    }
    out
}

/// Composite whole layers into RGBA8, row-parallel.
pub fn composite_surface(
    params: &FrameParameters,
    width: usize,
    foreground: &[[f32; 4]],
    background: &[[f32; 4]],
) -> Vec<u8> {
    let mut pixels = vec![0u8; foreground.len() * 4];
    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(row, out)| {
            let start = row * width;
            for (x, texel) in out.chunks_exact_mut(4).enumerate() {
                let rgba = composite_pixel(params, foreground[start + x], background[start + x]);
                for (dst, c) in texel.iter_mut().zip(rgba) {
                    *dst = (c * 255.0).round() as u8;
                }
            }
        });
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::NUM_BANDS;
    use crate::audio::AudioFeatures;
    use crate::navigation::CameraState;

    fn params(loudness: f32, zoom: f32) -> FrameParameters {
        let camera = CameraState {
            current_zoom: zoom,
            ..CameraState::default()
        };
        let features = AudioFeatures::from_spectrum(loudness, 440.0, [0.5; NUM_BANDS]);
        FrameParameters::marshal(&camera, &features, 1.0)
    }

    #[test]
    fn test_zero_mix_keeps_foreground() {
        let mut p = params(0.5, 2.0);
        p.layer_mix = 0.0;
        let fg = [0.2, 0.4, 0.6, 1.0];
        let out = composite_pixel(&p, fg, [1.0, 0.0, 0.0, 0.35]);
        // zoom_factor is 0 at the initial zoom so there is no boost
        for i in 0..3 {
            assert!((out[i] - fg[i]).abs() < 1e-6);
        }
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn test_transparent_background_is_ignored() {
        let p = params(1.0, 2.0);
        let fg = [0.1, 0.2, 0.3, 1.0];
        assert_eq!(composite_pixel(&p, fg, [1.0, 1.0, 1.0, 0.0]), [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn test_composite_is_clamped() {
        let p = params(1.0, 2e-15);
        assert!((p.zoom_factor - 1.0).abs() < 1e-6);
        let out = composite_pixel(&p, [1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 0.35]);
        assert_eq!(out, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_surface_matches_pixels() {
        let p = params(0.6, 0.01);
        let (w, h) = (5, 3);
        let fg: Vec<[f32; 4]> = (0..w * h).map(|i| [i as f32 / 15.0, 0.5, 0.25, 1.0]).collect();
        let bg: Vec<[f32; 4]> = (0..w * h).map(|_| [0.9, 0.1, 0.4, 0.35]).collect();
        let surface = composite_surface(&p, w, &fg, &bg);
        assert_eq!(surface.len(), w * h * 4);
        for i in 0..w * h {
            let expected = composite_pixel(&p, fg[i], bg[i]);
            assert_eq!(surface[i * 4], (expected[0] * 255.0).round() as u8);
            assert_eq!(surface[i * 4 + 3], 255);
        }
    }

    #[test]
    fn test_trap_quartiles() {
        assert_eq!(Trap::for_frequency(0.0), Trap::Circle);
        assert_eq!(Trap::for_frequency(0.3), Trap::Line);
        assert_eq!(Trap::for_frequency(0.5), Trap::Cross);
        assert_eq!(Trap::for_frequency(1.0), Trap::Spiral);
    }

    #[test]
    fn test_iteration_budget() {
        assert_eq!(foreground_max_iterations(&params(0.0, 2.0)), 306);
        let mut deep = params(1.0, 2e-15);
        deep.features.bass = 100.0;
        assert_eq!(foreground_max_iterations(&deep), FOREGROUND_MAX_ITER_CAP);
    }

    #[test]
    fn test_hsv_primaries_and_gamma() {
        let red = hsv2rgb(0.0, 1.0, 1.0);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6 && red[2].abs() < 1e-6);
        let grey = hsv2rgb(0.7, 0.0, 0.5);
        assert!(grey.iter().all(|c| (c - 0.5).abs() < 1e-6));
        let g = gamma_correct([0.0, 1.0, -0.5]);
        assert_eq!(g, [0.0, 1.0, 0.0]);
    }
}
