// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use crate::sensor::sensoradapter::SensorError;

pub type CpuThermometerPointer = Box<dyn CpuThermometer + Send>;

/// Source of the CPU temperature used to compensate the ambient temperature.
pub trait CpuThermometer {
    /// CPU temperature in degrees Celsius.
    fn cpu_temperature(&mut self) -> Result<f64, SensorError>;
}

/// Parses the output of `vcgencmd measure_temp`, e.g. `temp=48.3'C`.
pub fn parse_vcgencmd_output(output: &str) -> Result<f64, SensorError> {
    let start = output.find('=');
    let end = output.rfind('\'');

    match (start, end) {
        (Some(start), Some(end)) if start < end => output[start + 1..end]
            .trim()
            .parse::<f64>()
            .map_err(|_| SensorError::Parse(output.trim().to_string())),
        _ => Err(SensorError::Parse(output.trim().to_string())),
    }
}

/// Asks the Raspberry Pi firmware through `vcgencmd`.
#[derive(Clone, Copy, Debug, Default)]
pub struct VcgencmdThermometer;

impl CpuThermometer for VcgencmdThermometer {
    fn cpu_temperature(&mut self) -> Result<f64, SensorError> {
        const COMMAND: &str = "vcgencmd";

        let output = std::process::Command::new(COMMAND)
            .arg("measure_temp")
            .output()?;

        if !output.status.success() {
            return Err(SensorError::Command {
                command: COMMAND,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_vcgencmd_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads a Linux thermal zone, which reports millidegrees.
#[derive(Clone, Debug)]
pub struct ThermalZoneThermometer {
    path: PathBuf,
}

impl ThermalZoneThermometer {
    pub const DEFAULT_PATH: &'static str = "/sys/class/thermal/thermal_zone0/temp";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ThermalZoneThermometer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl CpuThermometer for ThermalZoneThermometer {
    fn cpu_temperature(&mut self) -> Result<f64, SensorError> {
        let contents = std::fs::read_to_string(&self.path)?;
        let millidegrees = contents
            .trim()
            .parse::<f64>()
            .map_err(|_| SensorError::Parse(contents.trim().to_string()))?;

        Ok(millidegrees / 1000.0)
    }
}

/// Always reports the same temperature. For machines without a readable CPU sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedThermometer(pub f64);

impl CpuThermometer for FixedThermometer {
    fn cpu_temperature(&mut self) -> Result<f64, SensorError> {
        Ok(self.0)
    }
}

#[test]
fn test_parse_vcgencmd_output() {
    assert_eq!(parse_vcgencmd_output("temp=48.3'C\n").unwrap(), 48.3);
    assert!(matches!(
        parse_vcgencmd_output("error"),
        Err(SensorError::Parse(_))
    ));
    assert!(parse_vcgencmd_output("temp=hot'C").is_err());
}

#[test]
fn test_thermal_zone_thermometer() {
    let path = std::env::temp_dir().join(format!("enviro-thermal-{}", std::process::id()));
    std::fs::write(&path, "51540\n").unwrap();

    let mut thermometer = ThermalZoneThermometer::new(&path);
    assert_eq!(thermometer.cpu_temperature().unwrap(), 51.54);

    std::fs::remove_file(&path).unwrap();
}
