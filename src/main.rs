use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use breakbeat::audio::{self, PlaybackStatus};
use breakbeat::control::{Command, Flow};
use breakbeat::shared::{pattern_length, PatternStyle};
use breakbeat::{BreakbeatEngine, EngineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural breakbeat sequencer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bounce whole 4-bar cycles to a 32-bit float mono WAV.
    Render {
        /// Directory of drum samples.
        #[arg(short, long)]
        samples: Option<PathBuf>,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value_t = 4)]
        cycles: usize,
        #[arg(long)]
        bpm: Option<f32>,
        #[arg(long)]
        style: Option<PatternStyle>,
        #[arg(long)]
        variation: Option<i32>,
        #[arg(long)]
        seed: Option<u64>,
        /// JSON session config; flags given here override it.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Play through the default output device, reading control lines from stdin.
    Play {
        #[arg(short, long)]
        samples: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Render { samples, out, cycles, bpm, style, variation, seed, config } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(dir) = samples {
                cfg.sample_dir = dir;
            }
            if let Some(bpm) = bpm {
                cfg.params.bpm = bpm;
            }
            if let Some(style) = style {
                cfg.params.pattern_style = style;
            }
            if let Some(v) = variation {
                cfg.params.pattern_variation = v.clamp(0, 9) as u8;
            }
            if seed.is_some() {
                cfg.seed = seed;
            }
            cfg.params = cfg.params.clamped();
            render(&cfg, &out, cycles)
        }
        Commands::Play { samples, config } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(dir) = samples {
                cfg.sample_dir = dir;
            }
            play(cfg)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p).with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn render(cfg: &EngineConfig, out: &Path, cycles: usize) -> anyhow::Result<()> {
    let mut engine = BreakbeatEngine::from_config(cfg)
        .with_context(|| format!("failed to load samples from {}", cfg.sample_dir.display()))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: cfg.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(out, spec)
        .with_context(|| format!("failed to create {}", out.display()))?;

    let total = pattern_length(cfg.params.bpm, cfg.sample_rate) * cycles;
    let mut chunk = vec![0.0f32; 512];
    let mut written = 0;
    while written < total {
        let n = chunk.len().min(total - written);
        engine.get_audio_chunk(&mut chunk[..n]);
        for &s in &chunk[..n] {
            writer.write_sample(s)?;
        }
        written += n;
    }
    writer.finalize().context("failed to finalize wav")?;

    tracing::info!(path = %out.display(), cycles, samples = written, "render complete");
    Ok(())
}

fn play(cfg: EngineConfig) -> anyhow::Result<()> {
    let handle = audio::start_playback(|device_rate| {
        let mut cfg = cfg.clone();
        cfg.sample_rate = device_rate;
        BreakbeatEngine::from_config(&cfg)
            .with_context(|| format!("failed to load samples from {}", cfg.sample_dir.display()))
    })?;

    let (line_tx, line_rx) = crossbeam_channel::bounded::<String>(64);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut latest = PlaybackStatus { bar_count: 0, gain_reduction_db: 0.0 };
    loop {
        crossbeam_channel::select! {
            recv(line_rx) -> line => {
                // stdin closed
                let Ok(line) = line else { return Ok(()) };
                let cmd = match Command::parse(&line) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!("{e}");
                        continue;
                    }
                };
                match cmd.apply(handle.controls(), handle.sample_rate()) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::ShowStatus) => {
                        let p = handle.controls().snapshot();
                        println!(
                            "bar {} | {} bpm {} v{} | gr {:.1} dB",
                            latest.bar_count, p.bpm, p.pattern_style, p.pattern_variation, latest.gain_reduction_db
                        );
                    }
                    Ok(Flow::Quit) => return Ok(()),
                    Err(e) => tracing::warn!("{e}"),
                }
            }
            recv(handle.status()) -> status => {
                if let Ok(status) = status {
                    latest = status;
                }
            }
        }
    }
}
