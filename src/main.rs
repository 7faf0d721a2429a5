mod cli;
mod config;
mod encode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cli::Cli;
use encode::{EncodeSettings, FfmpegEncoder};
use fractalis::audio::decode::decode_audio;
use fractalis::audio::pitch::note_name;
use fractalis::audio::{AudioEngine, BLOCK_SIZE};
use fractalis::navigation::{NavigationTuning, Navigator};
use fractalis::render::gpu::GpuContext;
use fractalis::render::FractalRenderer;
use fractalis::FrameParameters;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();
    let mut tuning = NavigationTuning::default();

    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 1920 { cli.width = cfg.output.width; }
            if cli.height == 1080 { cli.height = cfg.output.height; }
            if cli.fps == 30 { cli.fps = cfg.output.fps; }
            if cli.crf == 18 { cli.crf = cfg.output.crf; }
            if cli.codec == "libx264" { cli.codec = cfg.output.codec.clone(); }
            if cli.gain == 4.0 { cli.gain = cfg.audio.gain; }
            if cli.seed.is_none() { cli.seed = cfg.navigation.seed; }
            tuning = cfg.navigation.tuning();
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    if cli.fps == 0 || cli.width == 0 || cli.height == 0 {
        anyhow::bail!("Resolution and frame rate must be non-zero");
    }

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());

    log::info!("fractalis - audio-reactive fractal explorer");
    log::info!("Input: {}", cli.input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Resolution: {}x{} @ {}fps", cli.width, cli.height, cli.fps);
    log::info!("Seed: {}", seed);

    // 1. Decode audio
    log::info!("Decoding audio...");
    let track = decode_audio(&cli.input)?;
    let duration = match cli.max_seconds {
        Some(limit) => track.duration().min(limit.max(0.0)),
        None => track.duration(),
    };
    let total_frames = (duration * cli.fps as f32).ceil() as usize;
    log::info!("Total frames: {}, Duration: {:.1}s", total_frames, duration);

    // 2. Audio engine and camera
    let mut engine = AudioEngine::new(cli.gain);
    engine.initialize().context("Failed to initialize spectral analyzer")?;
    let features = engine.features();
    let mut navigator = Navigator::new(tuning, StdRng::seed_from_u64(seed));

    // 3. Initialize GPU
    log::info!("Initializing GPU...");
    let gpu = GpuContext::new().context("Failed to initialize GPU")?;
    let mut renderer = FractalRenderer::new(gpu);
    renderer.initialize().context("Failed to build fractal pipeline")?;
    let target = renderer
        .create_target(cli.width, cli.height)
        .context("Failed to allocate frame target")?;

    // 4. Start FFmpeg encoder
    log::info!("Starting FFmpeg encoder...");
    let settings = EncodeSettings {
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
        codec: cli.codec.clone(),
        pix_fmt: cli.pix_fmt.clone(),
        crf: cli.crf,
        bitrate: cli.bitrate.clone(),
        duration: cli.max_seconds.map(|_| duration),
    };
    let mut encoder = FfmpegEncoder::new(&cli.output, &cli.input, &settings)?;

    // 5. Render loop
    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let sample_rate = track.sample_rate as f32;
    let fps = cli.fps as f32;
    let mut fed_until = 0.0f32;
    let mut pixels = vec![0u8; cli.width as usize * cli.height as usize * 4];
    let mut skipped = 0usize;
    let mut resets = 0usize;

    for frame_idx in 0..total_frames {
        let time = frame_idx as f32 / fps;

        // Deliver audio up to the end of this frame's interval
        let frame_end = ((frame_idx + 1) as f32 / fps).min(duration);
        for block in track.span(fed_until, frame_end).chunks(BLOCK_SIZE) {
            engine.on_samples(block, sample_rate);
        }
        fed_until = frame_end;

        let snapshot = features.latest();
        let outcome = navigator.tick(&snapshot, time);
        if outcome.reset {
            resets += 1;
        }
        let params = FrameParameters::marshal(navigator.state(), &snapshot, time);

        // A skipped dispatch resends the previous frame
        match renderer.render(&params, &target) {
            Ok(()) => match renderer.read_frame(&target) {
                Ok(frame) => pixels = frame,
                Err(err) => {
                    skipped += 1;
                    log::warn!("Frame {}: {}", frame_idx, err);
                }
            },
            Err(err) if err.is_fatal() => return Err(anyhow::Error::new(err).context("Rendering failed")),
            Err(err) => {
                skipped += 1;
                log::warn!("Frame {}: {}", frame_idx, err);
            }
        }

        encoder.write_frame(&pixels)?;

        if frame_idx % cli.fps as usize == 0 {
            let status = navigator.status();
            pb.suspend(|| {
                log::info!(
                    "{:>7.1}s  zoom {:.3e}  {}  note {}",
                    time,
                    status.zoom_level,
                    status.location_name,
                    note_name(snapshot.dominant_frequency_hz)
                );
            });
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    let stats = engine.stats();
    log::info!(
        "Analyzed {} blocks ({} invalid, {} before init), {} zoom resets, {} skipped frames",
        stats.analyzed, stats.invalid, stats.not_ready, resets, skipped
    );

    renderer.shutdown();
    encoder.finish()?;

    log::info!("Output written to {}", cli.output.display());
    Ok(())
}
