// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;

/// Fixed-length window over the most recent samples.
///
/// The window is full from the start: it is seeded with a value and every push evicts the
/// oldest sample, so its length never changes.
#[derive(Clone, Debug, PartialEq)]
pub struct SlidingWindow {
    values: VecDeque<f64>,
}

impl SlidingWindow {
    /// Creates a window of `capacity` samples, all set to `seed`.
    ///
    /// A zero capacity is bumped to one, an empty window has no mean.
    pub fn filled(capacity: usize, seed: f64) -> Self {
        Self {
            values: std::iter::repeat(seed).take(capacity.max(1)).collect(),
        }
    }

    /// Appends `value` and drops the oldest sample.
    pub fn push(&mut self, value: f64) {
        self.values.pop_front();
        self.values.push_back(value);
    }

    // Never empty, see `filled`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn latest(&self) -> f64 {
        self.values.back().copied().unwrap_or_default()
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

#[test]
fn test_push_evicts_oldest() {
    let mut window = SlidingWindow::filled(5, 0.0);
    for value in 1..=6 {
        window.push(value as f64);
    }

    assert_eq!(window.len(), 5);
    assert_eq!(window.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(window.latest(), 6.0);
}

#[test]
fn test_statistics() {
    let mut window = SlidingWindow::filled(4, 1.0);
    window.push(5.0);
    window.push(-3.0);

    assert_eq!(window.min(), -3.0);
    assert_eq!(window.max(), 5.0);
    assert_eq!(window.mean(), 1.0);
}

#[test]
fn test_zero_capacity() {
    let window = SlidingWindow::filled(0, 2.0);
    assert_eq!(window.len(), 1);
    assert_eq!(window.mean(), 2.0);
}
