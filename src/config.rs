use serde::Deserialize;
use std::path::{Path, PathBuf};

use fractalis::audio::analysis::DEFAULT_GAIN;
use fractalis::navigation::camera::{INITIAL_ZOOM, RESET_THRESHOLD, TRIGGER_CHANCE};
use fractalis::navigation::NavigationTuning;

const CONFIG_NAME: &str = "fractalis";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_gain")]
    pub gain: f32,
}

#[derive(Debug, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_trigger_chance")]
    pub trigger_chance: u32,
    #[serde(default = "default_reset_threshold")]
    pub reset_threshold: f32,
}

impl NavigationConfig {
    pub fn tuning(&self) -> NavigationTuning {
        NavigationTuning {
            trigger_chance: self.trigger_chance.min(100),
            reset_threshold: self.reset_threshold(),
        }
    }

    /// The threshold must sit between the smallest normal f32 and the
    /// starting zoom, otherwise the default is used.
    fn reset_threshold(&self) -> f32 {
        let value = self.reset_threshold;
        if value > f32::MIN_POSITIVE && value < INITIAL_ZOOM {
            return value;
        }
        log::warn!(
            "navigation.reset_threshold = {} is out of range, using {}",
            value, RESET_THRESHOLD
        );
        RESET_THRESHOLD
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { gain: default_gain() }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            trigger_chance: default_trigger_chance(),
            reset_threshold: default_reset_threshold(),
        }
    }
}

fn default_width() -> u32 { 1920 }
fn default_height() -> u32 { 1080 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_gain() -> f32 { DEFAULT_GAIN }
fn default_trigger_chance() -> u32 { TRIGGER_CHANCE }
fn default_reset_threshold() -> f32 { RESET_THRESHOLD }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::debug!("Config parse error: {}", err);
            None
        }
    }
}

/// Explicit path, else `fractalis.toml` in the working directory, else
/// `~/.config/fractalis/config.toml`, else the platform config dir.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(format!("{}.toml", CONFIG_NAME));
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join(CONFIG_NAME).join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join(CONFIG_NAME).join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
