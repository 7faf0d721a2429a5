use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fractalis", about = "Audio-reactive fractal explorer video generator")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Video width in pixels
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// Seed for preset jumps and camera jitter. Random when unset.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Loudness gain applied to the block RMS
    #[arg(long, default_value_t = 4.0)]
    pub gain: f32,

    /// Config file (defaults to fractalis.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only render the first N seconds of the track
    #[arg(long)]
    pub max_seconds: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["fractalis", "song.flac"]);
        assert_eq!(cli.input, PathBuf::from("song.flac"));
        assert_eq!(cli.output, PathBuf::from("output.mp4"));
        assert_eq!((cli.width, cli.height, cli.fps), (1920, 1080, 30));
        assert_eq!(cli.gain, 4.0);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "fractalis", "in.wav", "-o", "out.mp4", "--seed", "7", "--max-seconds", "12.5", "-b", "5M",
        ]);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.max_seconds, Some(12.5));
        assert_eq!(cli.bitrate.as_deref(), Some("5M"));
    }
}
