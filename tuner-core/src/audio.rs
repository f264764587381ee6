//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input device and configuration, assembles the callback data into
//! fixed-size analysis windows and hands them to the analysis worker.
//!
//! ## Features
//! - Automatic audio device selection
//! - Mono down-mix of multi-channel input
//! - Warmup skipping of the first windows after the stream starts
//! - Non-blocking hand-off from the audio callback

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::config::TunerConfig;
use crate::worker::{SampleWindow, WindowSubmitter};

/// Splits a stream of interleaved callback data into fixed-size mono windows.
///
/// The first `warmup_windows` complete windows are discarded, since input
/// devices often deliver transients right after starting.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    window_size: usize,
    channels: usize,
    warmup_remaining: usize,
    buffer: Vec<f32>,
}

impl FrameAssembler {
    pub fn new(window_size: usize, channels: usize, warmup_windows: usize) -> Self {
        Self {
            window_size,
            channels: channels.max(1),
            warmup_remaining: warmup_windows,
            buffer: Vec::with_capacity(window_size * 2),
        }
    }

    /// Appends interleaved samples and calls `emit` once per completed window.
    pub fn push(&mut self, interleaved: &[f32], mut emit: impl FnMut(Vec<f32>)) {
        if self.channels == 1 {
            self.buffer.extend_from_slice(interleaved);
        } else {
            let scale = 1.0 / self.channels as f32;
            self.buffer.extend(
                interleaved
                    .chunks_exact(self.channels)
                    .map(|frame| frame.iter().sum::<f32>() * scale),
            );
        }

        while self.buffer.len() >= self.window_size {
            let window: Vec<f32> = self.buffer.drain(..self.window_size).collect();
            if self.warmup_remaining > 0 {
                self.warmup_remaining -= 1;
                continue;
            }
            emit(window);
        }
    }

    /// Samples waiting for the next window to fill.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an f32 configuration near the configured sample rate, mono if available
/// 3. Streams assembled windows to the analysis worker through `submitter`
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and actual sample rate
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(
    config: &TunerConfig,
    submitter: WindowSubmitter,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, config.sample_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let target_rate = config.sample_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let supported_config = supported_config.with_sample_rate(cpal::SampleRate(target_rate));

    let sample_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels() as usize;
    let stream_config: cpal::StreamConfig = supported_config.into();

    log::info!("Selected sample rate: {} Hz, {} channel(s)", sample_rate, channels);

    let err_fn = |err| log::error!("An error occurred on the audio stream: {}", err);

    let mut assembler = FrameAssembler::new(config.buffer_size, channels, config.warmup_windows);
    let mut worker_gone = false;

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            assembler.push(data, |samples| {
                if worker_gone {
                    return;
                }
                if submitter.submit(SampleWindow { samples, sample_rate }).is_err() {
                    log::warn!("Analysis worker stopped; discarding captured audio");
                    worker_gone = true;
                }
            });
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float formats are considered. Among those, configurations whose
/// rate range contains the target win, then fewer channels.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let rate_distance = if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            };
            (rate_distance, c.channels())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_uneven_callbacks_into_windows() {
        let mut assembler = FrameAssembler::new(4, 1, 0);
        let mut windows = Vec::new();
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();

        assembler.push(&samples[..3], |w| windows.push(w));
        assembler.push(&samples[3..9], |w| windows.push(w));
        assembler.push(&samples[9..], |w| windows.push(w));

        assert_eq!(windows, vec![vec![0.0, 1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0, 7.0]]);
        assert_eq!(assembler.pending(), 2);
    }

    #[test]
    fn skips_warmup_windows() {
        let mut assembler = FrameAssembler::new(2, 1, 3);
        let mut windows = Vec::new();
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();

        assembler.push(&samples, |w| windows.push(w));

        assert_eq!(windows, vec![vec![6.0, 7.0], vec![8.0, 9.0]]);
    }

    #[test]
    fn downmixes_interleaved_stereo() {
        let mut assembler = FrameAssembler::new(2, 2, 0);
        let mut windows = Vec::new();

        assembler.push(&[1.0, 3.0, -1.0, 1.0, 0.5, 0.5], |w| windows.push(w));

        assert_eq!(windows, vec![vec![2.0, 0.0]]);
        assert_eq!(assembler.pending(), 1);
    }
}
