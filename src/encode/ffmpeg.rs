use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Encoder settings taken from the CLI/config merge.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
    /// Trim the muxed audio to this many seconds
    pub duration: Option<f32>,
}

/// Raw RGBA frames in on stdin, finished video with the source audio out.
pub struct FfmpegEncoder {
    child: Child,
    frame_bytes: usize,
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, input_audio: &Path, settings: &EncodeSettings) -> Result<Self> {
        let args = build_args(output_path, input_audio, settings)?;

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width, settings.height, settings.fps, settings.codec
        );

        Ok(Self {
            child,
            frame_bytes: settings.width as usize * settings.height as usize * 4,
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_bytes {
            anyhow::bail!("Frame is {} bytes, expected {}", rgba_pixels.len(), self.frame_bytes);
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgba_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}

fn path_arg(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))
}

fn build_args(output_path: &Path, input_audio: &Path, settings: &EncodeSettings) -> Result<Vec<String>> {
    let mut args = vec![
        "-y".to_string(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{}x{}", settings.width, settings.height),
        "-framerate".into(), settings.fps.to_string(),
        "-i".into(), "pipe:0".into(),
    ];

    if let Some(seconds) = settings.duration {
        args.extend(["-t".to_string(), format!("{:.3}", seconds)]);
    }

    args.extend([
        "-i".into(), path_arg(input_audio)?,
        "-c:v".into(), settings.codec.clone(),
        "-pix_fmt".into(), settings.pix_fmt.clone(),
    ]);

    if let Some(ref br) = settings.bitrate {
        args.extend(["-b:v".to_string(), br.clone()]);
    } else {
        args.extend(["-crf".to_string(), settings.crf.to_string()]);
        args.extend(["-preset".to_string(), "medium".to_string()]);
    }

    args.extend([
        "-c:a".into(), "aac".into(),
        "-b:a".into(), "192k".into(),
        "-shortest".into(),
        path_arg(output_path)?,
    ]);

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EncodeSettings {
        EncodeSettings {
            width: 640,
            height: 360,
            fps: 24,
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 20,
            bitrate: None,
            duration: None,
        }
    }

    fn position(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|a| a == flag)
    }

    #[test]
    fn test_crf_mode() {
        let args = build_args(Path::new("out.mp4"), Path::new("in.wav"), &settings()).unwrap();
        let crf = position(&args, "-crf").unwrap();
        assert_eq!(args[crf + 1], "20");
        assert!(position(&args, "-b:v").is_none());
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.contains(&"640x360".to_string()));
    }

    #[test]
    fn test_bitrate_replaces_crf() {
        let mut s = settings();
        s.bitrate = Some("5M".into());
        let args = build_args(Path::new("out.mp4"), Path::new("in.wav"), &s).unwrap();
        assert!(position(&args, "-crf").is_none());
        assert_eq!(args[position(&args, "-b:v").unwrap() + 1], "5M");
    }

    #[test]
    fn test_duration_trims_audio_input() {
        let mut s = settings();
        s.duration = Some(12.5);
        let args = build_args(Path::new("out.mp4"), Path::new("in.wav"), &s).unwrap();
        let t = position(&args, "-t").unwrap();
        assert_eq!(args[t + 1], "12.500");
        // Input option, so it must precede the audio input
        assert_eq!(args[t + 2], "-i");
        assert_eq!(args[t + 3], "in.wav");
    }
}
