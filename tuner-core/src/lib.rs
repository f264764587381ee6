// tuner-core/src/lib.rs

//! The core logic for the instrument tuner.
//! This crate is responsible for audio capture, pitch detection, smoothing
//! and note mapping. It is completely headless and contains no display code.

pub mod audio;
pub mod config;
pub mod error;
pub mod pitch;
pub mod smoothing;
pub mod tuner;
pub mod tuning;
pub mod worker;

pub use config::TunerConfig;
pub use error::{Result, TunerError};
pub use tuner::Tuner;
pub use tuning::Note;

/// Represents the result of analysing a single audio window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TunerUpdate {
    /// The frequency detected in this window, before smoothing.
    pub raw_frequency: Option<f32>,
    /// The smoothed frequency in Hz.
    pub frequency: Option<f32>,
    /// The nearest note to the smoothed frequency.
    pub note: Option<Note>,
}
