pub mod ffmpeg;

pub use ffmpeg::{EncodeSettings, FfmpegEncoder};
