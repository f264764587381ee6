//! # Analysis Worker
//!
//! Runs the [`Tuner`] on a dedicated thread so pitch estimation never executes
//! on the real-time audio callback.
//!
//! ## Architecture
//! - **Capture side**: submits windows through a [`WindowSubmitter`] without blocking
//! - **Worker thread**: owns the `Tuner`, analyses windows in arrival order
//! - **Completion channel**: every analysed window yields one [`TunerUpdate`]
//!
//! At most one window waits for the worker. Submitting while one is pending
//! replaces it, so the worker always picks up the newest audio.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};

use crate::{
    TunerUpdate,
    config::TunerConfig,
    error::{Result, TunerError},
    tuner::Tuner,
};

/// A window of captured samples and the rate it was captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Hands sample windows to the analysis worker.
///
/// Cheap to clone. `submit` never blocks or allocates, so it can be called
/// from an audio callback.
#[derive(Debug, Clone)]
pub struct WindowSubmitter {
    sender: Sender<SampleWindow>,
    // Second handle on the one-slot queue, used to evict a stale window.
    stale: Receiver<SampleWindow>,
    // Disconnects when the worker thread exits.
    alive: Receiver<()>,
}

impl WindowSubmitter {
    /// Queues a window for analysis, replacing any window still pending.
    ///
    /// # Returns
    /// * `Err(TunerError::WorkerDisconnected)` - The worker has stopped
    pub fn submit(&self, window: SampleWindow) -> Result<()> {
        if let Err(TryRecvError::Disconnected) = self.alive.try_recv() {
            return Err(TunerError::WorkerDisconnected);
        }
        match self.sender.try_send(window) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(window)) => {
                if self.stale.try_recv().is_ok() {
                    log::trace!("Replaced pending window");
                }
                // Another submitter may have refilled the slot; its window is as new as ours.
                let _ = self.sender.try_send(window);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(TunerError::WorkerDisconnected),
        }
    }

    /// Number of windows waiting for the worker (0 or 1).
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

/// Handle to the analysis thread.
///
/// Dropping the handle signals the thread to stop and waits for it.
#[derive(Debug)]
pub struct AnalysisWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Validates `config` and starts the analysis thread.
    ///
    /// # Returns
    /// * The worker handle
    /// * A submitter for the capture side
    /// * The receiver of analysis updates for the presentation side
    pub fn spawn(config: &TunerConfig) -> Result<(Self, WindowSubmitter, Receiver<TunerUpdate>)> {
        config.validate()?;

        let (window_tx, window_rx) = crossbeam_channel::bounded::<SampleWindow>(1);
        let (update_tx, update_rx) = crossbeam_channel::unbounded::<TunerUpdate>();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (alive_tx, alive_rx) = crossbeam_channel::bounded::<()>(0);

        let submitter = WindowSubmitter {
            sender: window_tx,
            stale: window_rx.clone(),
            alive: alive_rx,
        };

        let tuner = Tuner::new(config);
        let thread_handle = thread::Builder::new()
            .name("tuner-analysis".into())
            .spawn(move || {
                let _alive = alive_tx;
                run(tuner, window_rx, update_tx, shutdown_rx)
            })
            .map_err(|e| TunerError::WorkerSpawn(e.to_string()))?;

        let worker = Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        };
        Ok((worker, submitter, update_rx))
    }

    /// Stops the analysis thread and waits for it to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.shutdown_tx.try_send(());
            if handle.join().is_err() {
                log::error!("Analysis thread panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    mut tuner: Tuner,
    window_rx: Receiver<SampleWindow>,
    update_tx: Sender<TunerUpdate>,
    shutdown_rx: Receiver<()>,
) {
    log::debug!("Analysis thread started");
    loop {
        crossbeam_channel::select! {
            recv(window_rx) -> msg => match msg {
                Ok(window) => {
                    let update = tuner.process(&window.samples, window.sample_rate);
                    if update_tx.send(update).is_err() {
                        log::debug!("Update receiver dropped");
                        break;
                    }
                }
                Err(_) => {
                    log::debug!("Window channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                log::debug!("Received shutdown signal");
                break;
            },
        }
    }
    log::debug!("Analysis thread finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn sine_window(frequency: f32, config: &TunerConfig) -> SampleWindow {
        let samples = (0..config.buffer_size)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / config.sample_rate as f32).sin())
            .collect();
        SampleWindow {
            samples,
            sample_rate: config.sample_rate,
        }
    }

    fn silent_window(config: &TunerConfig) -> SampleWindow {
        SampleWindow {
            samples: vec![0.0; config.buffer_size],
            sample_rate: config.sample_rate,
        }
    }

    #[test]
    fn pending_window_is_replaced_by_newer_one() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let (_alive_tx, alive) = crossbeam_channel::bounded(0);
        let submitter = WindowSubmitter {
            sender,
            stale: receiver.clone(),
            alive,
        };

        for rate in 1..=200 {
            submitter
                .submit(SampleWindow {
                    samples: vec![0.0; 4],
                    sample_rate: rate,
                })
                .unwrap();
            assert_eq!(submitter.pending(), 1);
        }
        assert_eq!(receiver.try_recv().unwrap().sample_rate, 200);
        assert!(receiver.is_empty());
    }

    #[test]
    fn burst_never_queues_more_than_one_window() {
        let config = TunerConfig::default();
        let (worker, submitter, updates) = AnalysisWorker::spawn(&config).unwrap();

        let mut max_pending = 0;
        for _ in 0..199 {
            submitter.submit(silent_window(&config)).unwrap();
            max_pending = max_pending.max(submitter.pending());
        }
        submitter.submit(sine_window(440.0, &config)).unwrap();
        max_pending = max_pending.max(submitter.pending());
        assert!(max_pending <= 1, "{max_pending} windows pending");

        // The newest window is never evicted, so its result must arrive.
        let tone = loop {
            let update = updates.recv_timeout(TIMEOUT).unwrap();
            if update.note.is_some() {
                break update;
            }
        };
        assert_eq!(tone.note.unwrap().to_string(), "A4");

        worker.shutdown();
    }

    #[test]
    fn worker_emits_updates_in_order() {
        let config = TunerConfig::default();
        let (worker, submitter, updates) = AnalysisWorker::spawn(&config).unwrap();

        submitter.submit(silent_window(&config)).unwrap();
        let silent = updates.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(silent.frequency, None);

        submitter.submit(sine_window(440.0, &config)).unwrap();
        let tone = updates.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(tone.note.unwrap().to_string(), "A4");

        worker.shutdown();
    }

    #[test]
    fn dropping_submitter_stops_worker() {
        let config = TunerConfig::default();
        let (worker, submitter, updates) = AnalysisWorker::spawn(&config).unwrap();
        drop(submitter);
        assert!(updates.recv_timeout(TIMEOUT).is_err());
        worker.shutdown();
    }

    #[test]
    fn submit_after_shutdown_reports_disconnect() {
        let config = TunerConfig::default();
        let (worker, submitter, _updates) = AnalysisWorker::spawn(&config).unwrap();
        worker.shutdown();
        assert_eq!(
            submitter.submit(sine_window(440.0, &config)),
            Err(TunerError::WorkerDisconnected)
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TunerConfig {
            history_size: 0,
            ..TunerConfig::default()
        };
        assert!(matches!(
            AnalysisWorker::spawn(&config),
            Err(TunerError::InvalidConfig(_))
        ));
    }
}
