//! # Musical Tuning Module
//!
//! Maps frequencies to equal-tempered notes and measures their deviation in
//! cents.
//!
//! ## Conventions
//! - Twelve pitch classes per octave, starting at C
//! - Octaves change at C (scientific pitch notation, A4 = 440 Hz by default)
//! - Positive cents are sharp, negative cents are flat

use std::fmt;

/// Pitch class names in octave order.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Standard concert pitch for A4 in Hz.
pub const REFERENCE_A4: f32 = 440.0;

/// Half steps from C0 up to A4.
const HALF_STEPS_C0_TO_A4: i32 = 57;

/// A frequency mapped onto the nearest equal-tempered note.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Pitch class name (e.g., "A", "C#")
    pub name: &'static str,
    /// Octave number in scientific pitch notation
    pub octave: i32,
    /// The measured frequency in Hz
    pub frequency: f32,
    /// Deviation from the nearest equal-tempered pitch in cents
    pub cents: f32,
}

impl Note {
    /// Maps a frequency to the nearest note relative to A4 = 440 Hz.
    ///
    /// Returns `None` for non-positive or non-finite frequencies.
    pub fn from_frequency(frequency: f32) -> Option<Self> {
        Self::from_frequency_with_reference(frequency, REFERENCE_A4)
    }

    /// Maps a frequency to the nearest note relative to a custom A4.
    ///
    /// # Arguments
    /// * `frequency` - Measured frequency in Hz
    /// * `reference_a4` - Frequency of A4 in Hz (e.g., 440.0, 442.0, 432.0)
    ///
    /// # Returns
    /// * `Some(note)` - Nearest note with its cents deviation
    /// * `None` - Frequency or reference is not a positive finite number
    pub fn from_frequency_with_reference(frequency: f32, reference_a4: f32) -> Option<Self> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return None;
        }
        if !(reference_a4.is_finite() && reference_a4 > 0.0) {
            return None;
        }

        let reference = reference_a4 as f64;
        let half_steps = 12.0 * (frequency as f64 / reference).log2();
        let nearest = nearest_half_step(half_steps);
        let perfect_frequency = reference * 2f64.powf(nearest as f64 / 12.0);
        let cents = cents_between(frequency as f64, perfect_frequency);

        let (index, octave) = pitch_class_and_octave(nearest);
        Some(Self {
            name: NOTE_NAMES[index],
            octave,
            frequency,
            cents: cents as f32,
        })
    }

    /// The equal-tempered frequency the cents deviation is measured from.
    pub fn target_frequency(&self) -> f32 {
        (self.frequency as f64 / 2f64.powf(self.cents as f64 / 1200.0)) as f32
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Rounds a fractional half-step distance to the nearest whole half step.
/// Ties round away from zero.
pub fn nearest_half_step(half_steps: f64) -> i32 {
    half_steps.round() as i32
}

/// Pitch class index (0 = C) and octave for a half-step offset from A4.
///
/// Uses floor division so offsets below C0 land in negative octaves rather
/// than being pulled toward zero.
pub fn pitch_class_and_octave(half_steps_from_a4: i32) -> (usize, i32) {
    let from_c0 = half_steps_from_a4 + HALF_STEPS_C0_TO_A4;
    let index = from_c0.rem_euclid(12) as usize;
    let octave = 4 + (half_steps_from_a4 + 9).div_euclid(12);
    (index, octave)
}

/// Calculates the deviation of `frequency` from `target` in cents.
///
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn cents_between(frequency: f64, target: f64) -> f64 {
    1200.0 * (frequency / target).log2()
}
