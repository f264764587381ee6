//! # Analysis Pipeline
//!
//! Runs one sample window through detection, smoothing and note mapping.

use crate::{
    TunerUpdate, config::TunerConfig, pitch::PitchDetector, smoothing::FrequencySmoother,
    tuning::Note,
};

/// The complete per-window analysis pipeline.
///
/// Owns the detector scratch buffer and the smoothing history, so one
/// instance must be driven by a single writer. The analysis worker does this
/// by owning the `Tuner` on its own thread.
#[derive(Debug, Clone)]
pub struct Tuner {
    detector: PitchDetector,
    smoother: FrequencySmoother,
    reference_a4: f32,
}

impl Tuner {
    pub fn new(config: &TunerConfig) -> Self {
        Self {
            detector: PitchDetector::from_config(config),
            smoother: FrequencySmoother::new(config.history_size),
            reference_a4: config.reference_a4,
        }
    }

    /// Analyses one window and returns the resulting update.
    ///
    /// A window without a detectable pitch leaves the smoothing history as it
    /// was; the update then still carries the last smoothed frequency.
    pub fn process(&mut self, window: &[f32], sample_rate: u32) -> TunerUpdate {
        let raw_frequency = self.detector.detect_frequency(window, sample_rate);
        match raw_frequency {
            Some(frequency) => {
                log::debug!("Detected {:.2} Hz", frequency);
                self.smoother.observe(frequency);
            }
            None => log::trace!("No pitch in window of {} samples", window.len()),
        }

        let frequency = self.smoother.current();
        let note = frequency.and_then(|f| Note::from_frequency_with_reference(f, self.reference_a4));

        TunerUpdate {
            raw_frequency,
            frequency,
            note,
        }
    }

    /// The current smoothed frequency, if any pitch has been detected yet.
    pub fn current_frequency(&self) -> Option<f32> {
        self.smoother.current()
    }

    /// The note for the current smoothed frequency.
    pub fn current_note(&self) -> Option<Note> {
        self.current_frequency()
            .and_then(|f| Note::from_frequency_with_reference(f, self.reference_a4))
    }
}
