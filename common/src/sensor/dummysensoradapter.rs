// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use enviro_model::{GasReading, ParticulateReading};
use serde::Deserialize;

use crate::sensor::sensoradapter::{SensorAdapter, SensorError};

/// A slowly oscillating value around `base`.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
struct Signal {
    base: f64,
    amplitude: f64,
}

impl Signal {
    fn sample(&self, step: u64, phase: f64) -> f64 {
        self.base + self.amplitude * (step as f64 * 0.05 + phase).sin()
    }
}

/// Simulated Enviro+ board for running the monitor away from the hardware.
#[derive(Deserialize, Default)]
pub struct DummySensorAdapter {
    temperature: Signal,
    pressure: Signal,
    humidity: Signal,
    lux: Signal,
    oxidising_ohms: Signal,
    reducing_ohms: Signal,
    nh3_ohms: Signal,
    pm1: Signal,
    pm25: Signal,
    pm10: Signal,

    /// Simulates a hand over the proximity sensor every this many proximity reads.
    #[serde(default)]
    tap_every: Option<u64>,

    #[serde(skip)]
    step: u64,
    #[serde(skip)]
    proximity_reads: u64,
    #[serde(skip)]
    particulate_timeouts: bool,
}

impl DummySensorAdapter {
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./dummysensors.json");

        serde_json::from_str::<Self>(json_data)
    }

    /// Makes every particulate read time out, as an unplugged PMS5003 would.
    pub fn with_particulate_timeouts(mut self, enabled: bool) -> Self {
        self.particulate_timeouts = enabled;
        self
    }

    fn next(&mut self, signal: Signal, phase: f64) -> f64 {
        self.step += 1;
        signal.sample(self.step, phase)
    }
}

impl SensorAdapter for DummySensorAdapter {
    fn temperature(&mut self) -> Result<f64, SensorError> {
        Ok(self.next(self.temperature, 0.0))
    }

    fn pressure(&mut self) -> Result<f64, SensorError> {
        Ok(self.next(self.pressure, 1.0))
    }

    fn humidity(&mut self) -> Result<f64, SensorError> {
        Ok(self.next(self.humidity, 2.0).clamp(0.0, 100.0))
    }

    fn lux(&mut self) -> Result<f64, SensorError> {
        Ok(self.next(self.lux, 3.0).max(0.0))
    }

    fn proximity(&mut self) -> Result<u16, SensorError> {
        self.proximity_reads += 1;

        match self.tap_every {
            Some(every) if every > 0 && self.proximity_reads % every == 0 => Ok(2000),
            _ => Ok(0),
        }
    }

    fn gas(&mut self) -> Result<GasReading, SensorError> {
        Ok(GasReading::from_ohms(
            self.next(self.oxidising_ohms, 4.0),
            self.next(self.reducing_ohms, 5.0),
            self.next(self.nh3_ohms, 6.0),
        ))
    }

    fn particulates(&mut self) -> Result<ParticulateReading, SensorError> {
        if self.particulate_timeouts {
            return Err(SensorError::ReadTimeout("PMS5003"));
        }

        Ok(ParticulateReading {
            pm1: self.next(self.pm1, 7.0).max(0.0).round(),
            pm25: self.next(self.pm25, 8.0).max(0.0).round(),
            pm10: self.next(self.pm10, 9.0).max(0.0).round(),
        })
    }
}

#[test]
fn test_dummy_sensor_adapter() {
    let mut adapter = DummySensorAdapter::new().unwrap();

    let temperature = adapter.temperature().unwrap();
    assert!((23.6..=24.8).contains(&temperature));

    let gas = adapter.gas().unwrap();
    assert!(gas.reducing > 300.0 && gas.reducing < 350.0);

    // Every 40th proximity read is a tap
    let taps = (0..80).filter(|_| adapter.proximity().unwrap() > 1500).count();
    assert_eq!(taps, 2);
}

#[test]
fn test_dummy_particulate_timeout() {
    let mut adapter = DummySensorAdapter::new()
        .unwrap()
        .with_particulate_timeouts(true);

    assert!(adapter.particulates().unwrap_err().is_timeout());
}
