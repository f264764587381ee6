//! # Tuner - Terminal Front End
//!
//! A headless presentation layer for the tuner core. It starts audio capture,
//! runs analysis on a worker thread and prints each update to the terminal.
//!
//! ## Architecture
//! - **Audio callback**: assembles windows and submits them to the worker
//! - **Analysis thread**: pitch detection, smoothing and note mapping
//! - **Main thread**: consumes updates at its own pace and renders them
//!
//! Usage: `tuner-cli [config.json]`. Press Enter (or close stdin) to quit.
//! Set `RUST_LOG=debug` for diagnostics.

use anyhow::{Context, Result};
use cpal::traits::StreamTrait;
use crossbeam_channel::Receiver;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::thread;
use std::time::Duration;
use tuner_core::{TunerConfig, TunerUpdate, audio, worker::AnalysisWorker};

/// How long the display waits for a fresh update before showing the placeholder.
const IDLE_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => TunerConfig::default(),
    };
    config.validate()?;
    log::info!("Starting tuner with {:?}", config);

    let (worker, submitter, updates) = AnalysisWorker::spawn(&config)?;
    let (stream, sample_rate) = audio::start_audio_capture(&config, submitter)?;
    log::info!("Capturing at {} Hz", sample_rate);

    let quit = spawn_quit_listener(BufReader::new(std::io::stdin()));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut last_line = String::new();
    loop {
        let line = crossbeam_channel::select! {
            recv(updates) -> msg => match msg {
                Ok(update) => render(&update),
                Err(_) => {
                    log::warn!("Analysis worker stopped");
                    break;
                }
            },
            recv(quit) -> _ => {
                log::debug!("Quit requested");
                break;
            },
            default(IDLE_TIMEOUT) => render(&TunerUpdate::default()),
        };
        if line != last_line {
            write!(out, "\r{:<40}", line)?;
            out.flush()?;
            last_line = line;
        }
    }
    writeln!(out)?;

    if let Err(e) = stream.pause() {
        log::error!("Error pausing stream: {}", e);
    }
    drop(stream);
    worker.shutdown();
    Ok(())
}

/// Watches `input` on a background thread; the returned channel fires on the
/// first line or at end of input.
fn spawn_quit_listener<R: BufRead + Send + 'static>(mut input: R) -> Receiver<()> {
    let (quit_tx, quit_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        let _ = input.read_line(&mut line);
        let _ = quit_tx.send(());
    });
    quit_rx
}

/// Loads a tuner configuration from a JSON file.
fn load_config(path: &str) -> Result<TunerConfig> {
    let file = File::open(path).with_context(|| format!("opening config file {path}"))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config file {path}"))?;
    Ok(config)
}

/// Formats an update as a single display line.
fn render(update: &TunerUpdate) -> String {
    match (&update.note, update.frequency) {
        (Some(note), Some(frequency)) => format!(
            "{:<4} {:>+6.1} cents  ({:.2} Hz)  {}",
            note.to_string(),
            note.cents,
            frequency,
            deviation_bar(note.cents)
        ),
        _ => "--".to_string(),
    }
}

/// A small text meter: the marker moves one slot per 10 cents.
fn deviation_bar(cents: f32) -> String {
    const HALF_WIDTH: i32 = 5;
    let offset = ((cents / 10.0).round() as i32).clamp(-HALF_WIDTH, HALF_WIDTH);
    (-HALF_WIDTH..=HALF_WIDTH)
        .map(|slot| match slot {
            s if s == offset => '|',
            0 => '+',
            _ => '.',
        })
        .collect::<String>()
}
