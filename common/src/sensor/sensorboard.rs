// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use enviro_model::{ParticulateReading, Reading};

use crate::compensation::TemperatureCompensator;
use crate::sensor::cputhermometer::CpuThermometerPointer;
use crate::sensor::sensoradapter::{SensorAdapterPointer, SensorError};

/// Ties the sensor adapter, the CPU thermometer and the compensation together and produces
/// one [`Reading`] per query.
pub struct SensorBoard {
    adapter: SensorAdapterPointer,
    cpu: CpuThermometerPointer,
    compensator: TemperatureCompensator,
    particulates_enabled: bool,
    last_particulates: Option<ParticulateReading>,
}

impl SensorBoard {
    /// Above this proximity the light sensor is covered and lux is not meaningful.
    pub const LIGHT_PROXIMITY_LIMIT: u16 = 10;

    /// Creates the board and seeds the compensation window with the current CPU temperature.
    pub fn new(
        adapter: SensorAdapterPointer,
        mut cpu: CpuThermometerPointer,
        factor: f64,
        particulates_enabled: bool,
    ) -> Result<Self, SensorError> {
        let initial_cpu_temperature = cpu.cpu_temperature()?;
        let compensator = TemperatureCompensator::new(initial_cpu_temperature, factor);
        log::info!(
            "CPU at {initial_cpu_temperature:.1} C, compensation factor {}",
            compensator.factor()
        );

        Ok(Self {
            adapter,
            cpu,
            compensator,
            particulates_enabled,
            last_particulates: None,
        })
    }

    pub fn particulates_enabled(&self) -> bool {
        self.particulates_enabled
    }

    pub fn proximity(&mut self) -> Result<u16, SensorError> {
        self.adapter.proximity()
    }

    /// Reads every sensor once.
    ///
    /// A particulate timeout is not an error: the previous particulate values are reused.
    pub fn query(&mut self, proximity: u16) -> Result<Reading, SensorError> {
        let timestamp = chrono::Local::now();

        let cpu_temperature = self.cpu.cpu_temperature()?;
        let raw_temperature = self.adapter.temperature()?;
        let temperature = self.compensator.compensate(raw_temperature, cpu_temperature);

        let pressure = self.adapter.pressure()?;
        let humidity = self.adapter.humidity()?;

        let light = if proximity < Self::LIGHT_PROXIMITY_LIMIT {
            self.adapter.lux()?
        } else {
            1.0
        };

        let gas = self.adapter.gas()?;

        let particulates = if self.particulates_enabled {
            match self.adapter.particulates() {
                Ok(reading) => {
                    self.last_particulates = Some(reading);
                    Some(reading)
                }
                Err(e) if e.is_timeout() => {
                    log::warn!("Failed to read PMS5003");
                    self.last_particulates
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        log::debug!(
            "raw {raw_temperature:.2} C, cpu {cpu_temperature:.2} C (avg {:.2}), compensated {temperature:.2} C",
            self.compensator.average_cpu_temperature()
        );

        Ok(Reading {
            timestamp,
            temperature,
            pressure,
            humidity,
            light,
            gas,
            particulates,
        })
    }
}

#[cfg(test)]
use crate::sensor::{DummySensorAdapter, FixedThermometer};

#[test]
fn test_query_reuses_particulates_on_timeout() {
    let adapter = DummySensorAdapter::new().unwrap();
    let mut board =
        SensorBoard::new(Box::new(adapter), Box::new(FixedThermometer(45.0)), 1.3, true).unwrap();

    let first = board.query(0).unwrap();
    assert!(first.particulates.is_some());

    board.adapter = Box::new(DummySensorAdapter::new().unwrap().with_particulate_timeouts(true));
    let second = board.query(0).unwrap();
    assert_eq!(second.particulates, first.particulates);
}

#[test]
fn test_query_covered_light_sensor() {
    let adapter = DummySensorAdapter::new().unwrap();
    let mut board =
        SensorBoard::new(Box::new(adapter), Box::new(FixedThermometer(45.0)), 1.3, false).unwrap();

    let reading = board.query(1600).unwrap();
    assert_eq!(reading.light, 1.0);
    assert_eq!(reading.particulates, None);

    // Raw temperature stays below the CPU, so compensation lowers it
    assert!(reading.temperature < 24.2 - 0.6);
}

#[test]
fn test_timeout_before_first_read_yields_none() {
    let adapter = DummySensorAdapter::new()
        .unwrap()
        .with_particulate_timeouts(true);
    let mut board =
        SensorBoard::new(Box::new(adapter), Box::new(FixedThermometer(45.0)), 1.3, true).unwrap();

    assert_eq!(board.query(0).unwrap().particulates, None);
}
