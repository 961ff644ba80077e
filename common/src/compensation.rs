// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use crate::window::SlidingWindow;

/// Corrects the ambient temperature for the heat radiated by the CPU below the board.
///
/// Decrease the factor to adjust the temperature down, increase it to adjust up.
#[derive(Clone, Debug)]
pub struct TemperatureCompensator {
    cpu_temperatures: SlidingWindow,
    factor: f64,
}

impl TemperatureCompensator {
    pub const DEFAULT_FACTOR: f64 = 1.3;
    pub const WINDOW_SIZE: usize = 5;

    /// Creates a compensator whose CPU window is seeded with `initial_cpu_temperature`.
    pub fn new(initial_cpu_temperature: f64, factor: f64) -> Self {
        Self {
            cpu_temperatures: SlidingWindow::filled(Self::WINDOW_SIZE, initial_cpu_temperature),
            factor,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Smoothed CPU temperature over the window.
    pub fn average_cpu_temperature(&self) -> f64 {
        self.cpu_temperatures.mean()
    }

    /// Records `cpu_temperature` and returns the compensated `raw_temperature`.
    pub fn compensate(&mut self, raw_temperature: f64, cpu_temperature: f64) -> f64 {
        self.cpu_temperatures.push(cpu_temperature);
        raw_temperature - (self.average_cpu_temperature() - raw_temperature) / self.factor
    }
}

#[test]
fn test_compensation_formula() {
    let mut compensator = TemperatureCompensator::new(25.0, TemperatureCompensator::DEFAULT_FACTOR);
    let temperature = compensator.compensate(20.0, 25.0);

    assert!((temperature - 16.154).abs() < 0.001);
}

#[test]
fn test_compensation_averages_window() {
    let mut compensator = TemperatureCompensator::new(40.0, 2.0);
    compensator.compensate(20.0, 50.0);

    // (40 * 4 + 50) / 5
    assert_eq!(compensator.average_cpu_temperature(), 42.0);

    // Window is now [40, 40, 40, 50, 42], mean 42.4
    let temperature = compensator.compensate(22.0, 42.0);
    assert!((temperature - 11.8).abs() < 1e-9);
}
