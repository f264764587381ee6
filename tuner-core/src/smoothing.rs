//! Moving-average smoothing of successive pitch estimates.

use std::collections::VecDeque;

/// Averages the most recent successful frequency estimates.
///
/// Only detections are observed. A window without a pitch leaves the history
/// untouched, so the smoothed value holds through short dropouts.
#[derive(Debug, Clone)]
pub struct FrequencySmoother {
    history: VecDeque<f32>,
    capacity: usize,
}

impl Default for FrequencySmoother {
    fn default() -> Self {
        Self::new(5)
    }
}

impl FrequencySmoother {
    /// Creates an empty smoother holding at most `capacity` estimates.
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Records a new estimate, evicting the oldest one once full.
    pub fn observe(&mut self, frequency: f32) {
        self.history.push_back(frequency);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    /// Mean of the estimates currently held, or `None` if none were observed.
    pub fn current(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }
        let sum: f32 = self.history.iter().sum();
        Some(sum / self.history.len() as f32)
    }

    /// Number of estimates currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True until the first estimate is observed.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Maximum number of estimates averaged.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
