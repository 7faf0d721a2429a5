//! Per-frame parameter record handed from the simulation to the GPU passes.

use bytemuck::{Pod, Zeroable};

use crate::audio::AudioFeatures;
use crate::navigation::CameraState;

/// Immutable snapshot of everything the three passes need for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParameters {
    pub time: f32,
    pub zoom: f32,
    /// Camera center including the cosmetic jitter
    pub center: [f32; 2],
    pub features: AudioFeatures,
    pub normalized_frequency: f32,
    pub julia_constant: [f32; 2],
    pub layer_mix: f32,
    pub complexity: f32,
    /// Zoom depth mapped to 0..1 over fifteen decades
    pub zoom_factor: f32,
}

impl FrameParameters {
    pub fn marshal(camera: &CameraState, features: &AudioFeatures, elapsed_s: f32) -> Self {
        let freq = features.normalized_frequency();
        let zoom = camera.current_zoom;
        let depth = (2.0 / zoom).log10() / 15.0;

        Self {
            time: elapsed_s,
            zoom,
            center: camera.view_center(),
            features: *features,
            normalized_frequency: freq,
            julia_constant: [
                (0.1 * elapsed_s + 5.0 * freq).cos() * 0.8,
                (0.15 * elapsed_s + 3.0 * freq).sin() * 0.8,
            ],
            layer_mix: features.loudness * 0.7 + 0.3,
            complexity: if zoom < 0.1 { depth } else { 0.0 },
            zoom_factor: depth.clamp(0.0, 1.0),
        }
    }

    pub fn to_uniforms(&self, width: u32, height: u32) -> FrameUniforms {
        let f = &self.features;
        FrameUniforms {
            resolution: [width as f32, height as f32],
            center: self.center,
            julia: self.julia_constant,
            zoom: self.zoom,
            time: self.time,
            loudness: f.loudness,
            frequency: self.normalized_frequency,
            bass: f.bass,
            mid: f.mid,
            high: f.high,
            layer_mix: self.layer_mix,
            zoom_factor: self.zoom_factor,
            complexity: self.complexity,
            spectrum: f.spectrum,
        }
    }
}

/// GPU layout of [`FrameParameters`]; must match `FrameUniforms` in
/// `shaders/common.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub resolution: [f32; 2],
    pub center: [f32; 2],
    pub julia: [f32; 2],
    pub zoom: f32,
    pub time: f32,
    pub loudness: f32,
    pub frequency: f32,
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub layer_mix: f32,
    pub zoom_factor: f32,
    pub complexity: f32,
    pub spectrum: [f32; 8],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::NUM_BANDS;

    fn camera_at_zoom(zoom: f32) -> CameraState {
        CameraState {
            current_zoom: zoom,
            ..CameraState::default()
        }
    }

    #[test]
    fn test_julia_constant_at_origin() {
        let p = FrameParameters::marshal(&camera_at_zoom(2.0), &AudioFeatures::default(), 0.0);
        assert!((p.julia_constant[0] - 0.8).abs() < 1e-6);
        assert!(p.julia_constant[1].abs() < 1e-6);
    }

    #[test]
    fn test_layer_mix_tracks_loudness() {
        let quiet = FrameParameters::marshal(&camera_at_zoom(2.0), &AudioFeatures::default(), 0.0);
        assert!((quiet.layer_mix - 0.3).abs() < 1e-6);

        let loud_features = AudioFeatures::from_spectrum(1.0, 440.0, [0.5; NUM_BANDS]);
        let loud = FrameParameters::marshal(&camera_at_zoom(2.0), &loud_features, 0.0);
        assert!((loud.layer_mix - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_complexity_only_when_deep() {
        let shallow = FrameParameters::marshal(&camera_at_zoom(0.5), &AudioFeatures::default(), 1.0);
        assert_eq!(shallow.complexity, 0.0);

        let deep = FrameParameters::marshal(&camera_at_zoom(2e-6), &AudioFeatures::default(), 1.0);
        assert!((deep.complexity - 0.4).abs() < 1e-4);
        assert!((deep.zoom_factor - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_marshal_is_deterministic() {
        let features = AudioFeatures::from_spectrum(0.4, 900.0, [0.2; NUM_BANDS]);
        let camera = camera_at_zoom(0.01);
        assert_eq!(
            FrameParameters::marshal(&camera, &features, 3.5),
            FrameParameters::marshal(&camera, &features, 3.5)
        );
    }

    #[test]
    fn test_uniform_layout() {
        // Two vec4 spectrum halves after 64 bytes of scalars
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 96);
        let features = AudioFeatures::from_spectrum(0.5, 440.0, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
        let u = FrameParameters::marshal(&camera_at_zoom(1.0), &features, 2.0).to_uniforms(640, 360);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&u));
        assert_eq!(&floats[0..2], &[640.0, 360.0]);
        assert_eq!(floats[6], 1.0);
        assert_eq!(floats[7], 2.0);
        assert_eq!(&floats[16..24], &features.spectrum);
    }
}
