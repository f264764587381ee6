//! # Tuner Configuration
//!
//! All tunable parameters of the analysis pipeline in one place. The defaults
//! match a 2048-sample window at 44.1 kHz with A4 = 440 Hz.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};

/// Tuner configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Samples per analysis window (default: 2048)
    pub buffer_size: usize,

    /// Sample rate requested from the input device in Hz (default: 44100)
    pub sample_rate: u32,

    /// YIN absolute threshold (default: 0.15)
    /// Lower values demand a cleaner periodic signal before a dip is accepted.
    pub yin_threshold: f32,

    /// Lowest frequency reported, exclusive (default: 60.0 Hz)
    pub min_frequency: f32,

    /// Highest frequency reported, exclusive (default: 2000.0 Hz)
    pub max_frequency: f32,

    /// Number of recent estimates averaged by the smoother (default: 5)
    pub history_size: usize,

    /// Reference pitch for A4 in Hz (default: 440.0)
    pub reference_a4: f32,

    /// Windows discarded after the input stream starts (default: 3)
    pub warmup_windows: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 2048,
            sample_rate: 44100,
            yin_threshold: 0.15,
            min_frequency: 60.0,
            max_frequency: 2000.0,
            history_size: 5,
            reference_a4: 440.0,
            warmup_windows: 3,
        }
    }
}

impl TunerConfig {
    /// Checks that the parameters describe a usable pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < 4 {
            return Err(TunerError::InvalidConfig(format!(
                "buffer_size must be at least 4, got {}",
                self.buffer_size
            )));
        }
        if self.sample_rate == 0 {
            return Err(TunerError::InvalidConfig("sample_rate must be positive".into()));
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold < 1.0) {
            return Err(TunerError::InvalidConfig(format!(
                "yin_threshold must lie in (0, 1), got {}",
                self.yin_threshold
            )));
        }
        if !(self.min_frequency >= 0.0 && self.min_frequency < self.max_frequency) {
            return Err(TunerError::InvalidConfig(format!(
                "frequency range {}..{} Hz is empty",
                self.min_frequency, self.max_frequency
            )));
        }
        if self.history_size == 0 {
            return Err(TunerError::InvalidConfig("history_size must be at least 1".into()));
        }
        if !(self.reference_a4.is_finite() && self.reference_a4 > 0.0) {
            return Err(TunerError::InvalidConfig(format!(
                "reference_a4 must be a positive frequency, got {}",
                self.reference_a4
            )));
        }
        Ok(())
    }
}
