use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

pub mod compressor;
pub mod engine;
pub mod mix;

pub use compressor::Compressor;
pub use engine::BreakbeatEngine;

use crate::params::EngineControls;

/// Meter readings pushed out of the audio callback once per block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackStatus {
    pub bar_count: u64,
    pub gain_reduction_db: f32,
}

pub struct PlaybackHandle {
    controls: EngineControls,
    status_rx: Receiver<PlaybackStatus>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl PlaybackHandle {
    pub fn controls(&self) -> &EngineControls {
        &self.controls
    }

    pub fn status(&self) -> &Receiver<PlaybackStatus> {
        &self.status_rx
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Open the default output device and drive an engine from its callback.
/// `make_engine` gets the device rate so samples are resampled to match.
pub fn start_playback<F>(make_engine: F) -> anyhow::Result<PlaybackHandle>
where
    F: FnOnce(u32) -> anyhow::Result<BreakbeatEngine>,
{
    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = make_engine(sample_rate)?;
            let controls = engine.controls();
            let (status_tx, status_rx) = crossbeam_channel::bounded::<PlaybackStatus>(64);

            let output_stream = build_output_stream_f32(&device, &config.into(), engine, status_tx, channels)?;
            output_stream.play().context("failed to play output stream")?;
            tracing::info!(sample_rate, channels, "playback started");

            Ok(PlaybackHandle {
                controls,
                status_rx,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: BreakbeatEngine,
    status_tx: Sender<PlaybackStatus>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    // grown on the first callback, reused after that
    let mut mono: Vec<f32> = Vec::new();

    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            let n_frames = data.len() / channels.max(1);
            mono.resize(n_frames, 0.0);
            engine.get_audio_chunk(&mut mono);

            for (frame, &s) in data.chunks_exact_mut(channels.max(1)).zip(mono.iter()) {
                frame.fill(s);
            }

            let _ = status_tx.try_send(PlaybackStatus {
                bar_count: engine.bar_count(),
                gain_reduction_db: engine.gain_reduction_db(),
            });
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
