//! # Pitch Detection Module
//!
//! This module estimates the fundamental frequency of a fixed-size window of
//! audio samples using the YIN algorithm.
//!
//! ## Features
//! - YIN difference function with cumulative mean normalisation
//! - First-dip threshold search, which favours the fundamental over louder overtones
//! - Parabolic interpolation for sub-sample accuracy
//! - Plausibility filter on the resulting frequency

use crate::config::TunerConfig;

/// A YIN pitch detector bound to one window length.
///
/// The detector owns its difference buffer and reuses it across calls, so a
/// single instance should not be shared between threads. Independent windows
/// can be analysed concurrently with one detector each.
#[derive(Debug, Clone)]
pub struct PitchDetector {
    buffer_size: usize,
    threshold: f32,
    min_frequency: f32,
    max_frequency: f32,
    yin_buffer: Vec<f32>,
}

impl PitchDetector {
    /// Creates a detector for windows of `buffer_size` samples with the
    /// default threshold (0.15) and frequency range (60 to 2000 Hz).
    pub fn new(buffer_size: usize) -> Self {
        let defaults = TunerConfig::default();
        Self {
            buffer_size,
            threshold: defaults.yin_threshold,
            min_frequency: defaults.min_frequency,
            max_frequency: defaults.max_frequency,
            yin_buffer: vec![0.0; buffer_size / 2],
        }
    }

    /// Creates a detector from a tuner configuration.
    pub fn from_config(config: &TunerConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            threshold: config.yin_threshold,
            min_frequency: config.min_frequency,
            max_frequency: config.max_frequency,
            yin_buffer: vec![0.0; config.buffer_size / 2],
        }
    }

    /// The window length this detector accepts.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Detects the fundamental frequency of `window`.
    ///
    /// # Arguments
    /// * `window` - Exactly `buffer_size` audio samples
    /// * `sample_rate` - Sample rate of the window in Hz
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected frequency in Hz
    /// * `None` - Wrong window length, no usable period, or a frequency
    ///   outside the plausible range
    pub fn detect_frequency(&mut self, window: &[f32], sample_rate: u32) -> Option<f32> {
        if window.len() != self.buffer_size || sample_rate == 0 {
            return None;
        }
        let half = self.yin_buffer.len();
        if half < 3 {
            return None;
        }

        self.difference(window);
        self.cumulative_mean_normalize();

        let period = self.absolute_threshold().or_else(|| self.global_minimum())?;
        let refined_period = self.parabolic_interpolation(period);

        let frequency = sample_rate as f32 / refined_period;
        if frequency.is_finite() && frequency > self.min_frequency && frequency < self.max_frequency {
            log::trace!("YIN period {:.2} samples -> {:.2} Hz", refined_period, frequency);
            Some(frequency)
        } else {
            None
        }
    }

    /// d(tau) = sum_j (x_j - x_{j+tau})^2 over the first half of the window.
    fn difference(&mut self, window: &[f32]) {
        let half = self.yin_buffer.len();
        self.yin_buffer[0] = 0.0;
        for tau in 1..half {
            self.yin_buffer[tau] = window[..half]
                .iter()
                .zip(&window[tau..tau + half])
                .map(|(a, b)| {
                    let delta = a - b;
                    delta * delta
                })
                .sum();
        }
    }

    fn cumulative_mean_normalize(&mut self) {
        self.yin_buffer[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..self.yin_buffer.len() {
            running_sum += self.yin_buffer[tau];
            if running_sum > 0.0 {
                self.yin_buffer[tau] *= tau as f32 / running_sum;
            }
        }
    }

    /// Finds the first dip that falls below the threshold and returns the lag
    /// at the bottom of that dip.
    fn absolute_threshold(&self) -> Option<usize> {
        let buf = &self.yin_buffer;
        let mut tau = (2..buf.len()).find(|&tau| buf[tau] < self.threshold && buf[tau] < buf[tau - 1])?;
        while tau + 1 < buf.len() && buf[tau + 1] < buf[tau] {
            tau += 1;
        }
        Some(tau)
    }

    fn global_minimum(&self) -> Option<usize> {
        self.yin_buffer
            .iter()
            .enumerate()
            .skip(1)
            .fold(None, |best: Option<(usize, f32)>, (tau, &value)| match best {
                Some((_, min)) if value >= min => best,
                _ => Some((tau, value)),
            })
            .map(|(tau, _)| tau)
    }

    fn parabolic_interpolation(&self, period: usize) -> f32 {
        if period == 0 || period + 1 >= self.yin_buffer.len() {
            return period as f32;
        }
        let prev = self.yin_buffer[period - 1];
        let current = self.yin_buffer[period];
        let next = self.yin_buffer[period + 1];

        let a = (prev + next - 2.0 * current) / 2.0;
        let b = (next - prev) / 2.0;
        let shift = if a != 0.0 { -b / (2.0 * a) } else { 0.0 };
        period as f32 + shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;
    const BUFFER_SIZE: usize = 2048;

    fn sine(frequency: f32, amplitude: f32) -> Vec<f32> {
        (0..BUFFER_SIZE)
            .map(|i| {
                amplitude * (2.0 * std::f32::consts::PI * frequency * i as f32 / SAMPLE_RATE as f32).sin()
            })
            .collect()
    }

    #[test]
    fn detects_440_hz_sine() {
        let mut detector = PitchDetector::new(BUFFER_SIZE);
        let frequency = detector.detect_frequency(&sine(440.0, 1.0), SAMPLE_RATE).unwrap();
        assert!((frequency - 440.0).abs() < 5.0, "got {frequency}");
    }

    #[test]
    fn detects_880_hz_sine() {
        let mut detector = PitchDetector::new(BUFFER_SIZE);
        let frequency = detector.detect_frequency(&sine(880.0, 1.0), SAMPLE_RATE).unwrap();
        assert!((frequency - 880.0).abs() < 5.0, "got {frequency}");
    }

    #[test]
    fn prefers_fundamental_over_louder_overtone() {
        let fundamental = sine(220.0, 0.7);
        let overtone = sine(440.0, 1.0);
        let mixed: Vec<f32> = fundamental.iter().zip(&overtone).map(|(a, b)| a + b).collect();

        let mut detector = PitchDetector::new(BUFFER_SIZE);
        let frequency = detector.detect_frequency(&mixed, SAMPLE_RATE).unwrap();
        assert!((frequency - 220.0).abs() < 5.0, "got {frequency}");
    }

    #[test]
    fn low_string_is_detected_within_range() {
        let mut detector = PitchDetector::new(BUFFER_SIZE);
        let frequency = detector.detect_frequency(&sine(110.0, 0.5), SAMPLE_RATE).unwrap();
        assert!((frequency - 110.0).abs() < 1.0, "got {frequency}");
    }

    #[test]
    fn wrong_window_length_is_absent() {
        let mut detector = PitchDetector::new(BUFFER_SIZE);
        assert_eq!(detector.detect_frequency(&sine(440.0, 1.0)[..1024], SAMPLE_RATE), None);
        assert_eq!(detector.detect_frequency(&[], SAMPLE_RATE), None);
    }

    #[test]
    fn silence_and_dc_are_absent() {
        let mut detector = PitchDetector::new(BUFFER_SIZE);
        assert_eq!(detector.detect_frequency(&vec![0.0; BUFFER_SIZE], SAMPLE_RATE), None);
        assert_eq!(detector.detect_frequency(&vec![0.5; BUFFER_SIZE], SAMPLE_RATE), None);
    }

    #[test]
    fn detection_is_deterministic_across_reuse() {
        let mut detector = PitchDetector::new(BUFFER_SIZE);
        let window = sine(330.0, 0.8);
        let first = detector.detect_frequency(&window, SAMPLE_RATE);
        detector.detect_frequency(&sine(880.0, 1.0), SAMPLE_RATE);
        let second = detector.detect_frequency(&window, SAMPLE_RATE);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_frequency_is_rejected() {
        let config = TunerConfig {
            max_frequency: 400.0,
            ..TunerConfig::default()
        };
        let mut detector = PitchDetector::from_config(&config);
        assert_eq!(detector.detect_frequency(&sine(440.0, 1.0), SAMPLE_RATE), None);
    }
}
