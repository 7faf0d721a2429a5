//! Autonomous zoom-and-pan camera driven by audio features.

use rand::Rng;
use std::f32::consts::TAU;

use super::presets::{nearest, PRESETS};
use crate::audio::AudioFeatures;

pub const INITIAL_ZOOM: f32 = 2.0;
pub const ZOOM_EASING: f32 = 0.95;
pub const CRUISE_EASING: f32 = 0.02;
pub const SEEK_EASING: f32 = 0.008;
pub const RECOVERY_EASING: f32 = 0.05;

/// Defaults for [`NavigationTuning`]. Both were picked by eye and are meant to
/// be adjusted from config.
pub const RESET_THRESHOLD: f32 = 1e-15;
pub const TRIGGER_CHANCE: u32 = 3;

/// Normalized dominant frequency above which preset hops may fire.
const TRIGGER_FREQUENCY: f32 = 0.5;
/// Distance at which a seek or recovery pan counts as arrived.
const ARRIVAL_RADIUS: f32 = 1e-5;
/// A location is named exactly only when the center is this close to it.
const NAME_RADIUS: f32 = 0.1;
const JITTER_SCALE: f32 = 0.005;
const PLACEHOLDER_NAME: &str = "Exploring";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationTuning {
    /// Chance out of 100 per tick of hopping to the next preset
    pub trigger_chance: u32,
    /// Zoom below which the camera resets to the overview
    pub reset_threshold: f32,
}

impl Default for NavigationTuning {
    fn default() -> Self {
        Self {
            trigger_chance: TRIGGER_CHANCE,
            reset_threshold: RESET_THRESHOLD,
        }
    }
}

/// Which easing is currently steering the center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Cruising,
    Seeking,
    Recovering,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraState {
    pub current_zoom: f32,
    pub target_zoom: f32,
    pub center: [f32; 2],
    pub target_center: [f32; 2],
    pub camera_easing: f32,
    pub zoom_easing: f32,
    pub current_preset_index: usize,
    pub last_visited_preset: Option<&'static str>,
    /// Cosmetic offset applied on top of `center` when rendering
    pub jitter: [f32; 2],
}

impl Default for CameraState {
    fn default() -> Self {
        let start = PRESETS[0].position();
        Self {
            current_zoom: INITIAL_ZOOM,
            target_zoom: INITIAL_ZOOM,
            center: start,
            target_center: start,
            camera_easing: CRUISE_EASING,
            zoom_easing: ZOOM_EASING,
            current_preset_index: 0,
            last_visited_preset: None,
            jitter: [0.0, 0.0],
        }
    }
}

impl CameraState {
    pub fn view_center(&self) -> [f32; 2] {
        [self.center[0] + self.jitter[0], self.center[1] + self.jitter[1]]
    }

    pub fn motion(&self) -> Motion {
        if self.camera_easing == SEEK_EASING {
            Motion::Seeking
        } else if self.camera_easing == RECOVERY_EASING {
            Motion::Recovering
        } else {
            Motion::Cruising
        }
    }

    fn distance_to_target(&self) -> f32 {
        let dx = self.target_center[0] - self.center[0];
        let dy = self.target_center[1] - self.center[1];
        (dx * dx + dy * dy).sqrt()
    }
}

/// What happened during one tick, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub triggered: bool,
    pub reset: bool,
}

/// Values the display shows next to the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub zoom_level: f32,
    pub location_name: String,
}

pub struct Navigator<R: Rng> {
    state: CameraState,
    tuning: NavigationTuning,
    rng: R,
}

impl<R: Rng> Navigator<R> {
    pub fn new(tuning: NavigationTuning, rng: R) -> Self {
        Self::from_state(CameraState::default(), tuning, rng)
    }

    pub fn from_state(state: CameraState, tuning: NavigationTuning, rng: R) -> Self {
        Self { state, tuning, rng }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Advance the camera by one display frame.
    pub fn tick(&mut self, features: &AudioFeatures, elapsed_s: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let s = &mut self.state;

        let audio_influence = features.loudness.clamp(0.0, 1.0) * 0.5 + 0.5;
        let freq = features.normalized_frequency();

        // Zoom: exponential dive, faster when loud
        let zoom_speed = 0.995 - audio_influence * 0.015;
        s.target_zoom = s.current_zoom * zoom_speed;
        s.current_zoom = s.current_zoom * s.zoom_easing + s.target_zoom * (1.0 - s.zoom_easing);

        if freq > TRIGGER_FREQUENCY && self.rng.random_range(0..100) < self.tuning.trigger_chance {
            s.current_preset_index = (s.current_preset_index + 1) % PRESETS.len();
            s.target_center = PRESETS[s.current_preset_index].position();
            s.camera_easing = SEEK_EASING;
            outcome.triggered = true;
            log::debug!("Seeking {}", PRESETS[s.current_preset_index].name);
        } else if s.camera_easing != CRUISE_EASING && s.distance_to_target() < ARRIVAL_RADIUS {
            s.camera_easing = CRUISE_EASING;
        }

        s.center[0] += (s.target_center[0] - s.center[0]) * s.camera_easing;
        s.center[1] += (s.target_center[1] - s.center[1]) * s.camera_easing;

        // Passing close to a preset counts as a visit even between status reads
        let (nearby, dist) = nearest(s.center);
        if dist < NAME_RADIUS {
            s.last_visited_preset = Some(PRESETS[nearby].name);
        }

        let amplitude = audio_influence * s.current_zoom * JITTER_SCALE;
        let phase = freq * TAU;
        s.jitter = [
            amplitude * (elapsed_s * 1.3 + phase).sin(),
            amplitude * (elapsed_s * 1.7 + phase).cos(),
        ];

        // Subnormal, zero and NaN zooms reset whatever the configured threshold
        if !s.current_zoom.is_normal() || s.current_zoom < self.tuning.reset_threshold {
            s.current_zoom = INITIAL_ZOOM;
            s.target_zoom = INITIAL_ZOOM;
            s.current_preset_index = self.rng.random_range(0..PRESETS.len());
            s.target_center = PRESETS[s.current_preset_index].position();
            s.camera_easing = RECOVERY_EASING;
            s.jitter = [0.0, 0.0];
            outcome.reset = true;
            log::debug!("Depth limit reached, resetting toward {}", PRESETS[s.current_preset_index].name);
        }

        outcome
    }

    /// Name of the preset the camera is at, or an advisory fallback.
    pub fn nearest_preset_name(&mut self) -> String {
        let (idx, dist) = nearest(self.state.center);
        if dist < NAME_RADIUS {
            let name = PRESETS[idx].name;
            self.state.last_visited_preset = Some(name);
            return name.to_string();
        }
        match self.state.last_visited_preset {
            Some(last) => format!("Near {}", last),
            None => PLACEHOLDER_NAME.to_string(),
        }
    }

    pub fn status(&mut self) -> Status {
        Status {
            zoom_level: INITIAL_ZOOM / self.state.current_zoom,
            location_name: self.nearest_preset_name(),
        }
    }
}
