use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Format of the timestamp column in the persisted records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

/// Writes a value the way the data files expect it: whole numbers keep a trailing `.0`.
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// One measured quantity of the Enviro+ board.
///
/// The order of the variants is the order in which the chart screens are cycled.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Temperature,
    Pressure,
    Humidity,
    Light,
    Oxidised,
    Reduced,
    Nh3,
    Pm1,
    Pm25,
    Pm10,
}

impl Variable {
    /// Every variable, particulates included.
    pub const ALL: [Variable; 10] = [
        Variable::Temperature,
        Variable::Pressure,
        Variable::Humidity,
        Variable::Light,
        Variable::Oxidised,
        Variable::Reduced,
        Variable::Nh3,
        Variable::Pm1,
        Variable::Pm25,
        Variable::Pm10,
    ];

    /// The variables a board without a particulate sensor can show.
    pub const WITHOUT_PARTICULATES: [Variable; 7] = [
        Variable::Temperature,
        Variable::Pressure,
        Variable::Humidity,
        Variable::Light,
        Variable::Oxidised,
        Variable::Reduced,
        Variable::Nh3,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Pressure => "pressure",
            Variable::Humidity => "humidity",
            Variable::Light => "light",
            Variable::Oxidised => "oxidised",
            Variable::Reduced => "reduced",
            Variable::Nh3 => "nh3",
            Variable::Pm1 => "pm1",
            Variable::Pm25 => "pm25",
            Variable::Pm10 => "pm10",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature => "C",
            Variable::Pressure => "hPa",
            Variable::Humidity => "%",
            Variable::Light => "Lux",
            Variable::Oxidised | Variable::Reduced | Variable::Nh3 => "kO",
            Variable::Pm1 | Variable::Pm25 | Variable::Pm10 => "ug/m3",
        }
    }

    pub fn is_particulate(&self) -> bool {
        matches!(self, Variable::Pm1 | Variable::Pm25 | Variable::Pm10)
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Gas sensor resistances in kOhm.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct GasReading {
    pub oxidising: f64,
    pub reducing: f64,
    pub nh3: f64,
}

impl GasReading {
    /// Builds a reading from raw resistances in Ohm.
    pub fn from_ohms(oxidising: f64, reducing: f64, nh3: f64) -> Self {
        Self {
            oxidising: oxidising / 1000.0,
            reducing: reducing / 1000.0,
            nh3: nh3 / 1000.0,
        }
    }
}

/// Particulate matter concentrations in ug/m3.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticulateReading {
    pub pm1: f64,
    pub pm25: f64,
    pub pm10: f64,
}

/// A single timestamped set of measurements taken in one loop iteration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    /// Compensated ambient temperature in degrees Celsius.
    pub temperature: f64,
    /// Pressure in hPa.
    pub pressure: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Ambient light in lux.
    pub light: f64,
    pub gas: GasReading,
    pub particulates: Option<ParticulateReading>,
}

impl Reading {
    /// The value of `variable`, or `None` for a particulate variable when no particulate
    /// reading is available.
    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Temperature => Some(self.temperature),
            Variable::Pressure => Some(self.pressure),
            Variable::Humidity => Some(self.humidity),
            Variable::Light => Some(self.light),
            Variable::Oxidised => Some(self.gas.oxidising),
            Variable::Reduced => Some(self.gas.reducing),
            Variable::Nh3 => Some(self.gas.nh3),
            Variable::Pm1 => self.particulates.map(|pm| pm.pm1),
            Variable::Pm25 => self.particulates.map(|pm| pm.pm25),
            Variable::Pm10 => self.particulates.map(|pm| pm.pm10),
        }
    }

    /// The fields of this reading in persisted column order.
    pub fn csv_record(&self) -> Vec<String> {
        let mut record = vec![self.timestamp.format(TIMESTAMP_FORMAT).to_string()];
        record.extend(
            [
                self.temperature,
                self.pressure,
                self.humidity,
                self.light,
                self.gas.oxidising,
                self.gas.reducing,
                self.gas.nh3,
            ]
            .map(format_value),
        );

        if let Some(pm) = self.particulates {
            record.extend([pm.pm1, pm.pm25, pm.pm10].map(format_value));
        }

        record
    }
}

#[cfg(test)]
fn sample_reading(particulates: Option<ParticulateReading>) -> Reading {
    use chrono::TimeZone;

    Reading {
        timestamp: Local.with_ymd_and_hms(2020, 8, 1, 12, 30, 5).unwrap(),
        temperature: 21.5,
        pressure: 1013.25,
        humidity: 40.0,
        light: 120.0,
        gas: GasReading::from_ohms(12000.0, 340000.0, 95000.0),
        particulates,
    }
}

#[test]
fn test_csv_record_order() {
    let reading = sample_reading(Some(ParticulateReading {
        pm1: 1.0,
        pm25: 2.0,
        pm10: 3.0,
    }));

    let record = reading.csv_record();
    assert_eq!(record.len(), 11);
    assert_eq!(record[0], "2020-08-01, 12:30:05");
    assert_eq!(record[1], "21.5");
    assert_eq!(record[3], "40.0");
    assert_eq!(record[5], "12.0");
    assert_eq!(record[10], "3.0");
}

#[test]
fn test_reading_without_particulates() {
    let reading = sample_reading(None);

    assert_eq!(reading.csv_record().len(), 8);
    assert_eq!(reading.value(Variable::Pm25), None);
    assert_eq!(reading.value(Variable::Reduced), Some(340.0));
}

#[test]
fn test_variable_units() {
    assert_eq!(Variable::ALL.len(), 10);
    assert_eq!(Variable::Temperature.unit(), "C");
    assert_eq!(Variable::Nh3.unit(), "kO");
    assert!(Variable::Pm10.is_particulate());
    assert!(!Variable::WITHOUT_PARTICULATES.iter().any(Variable::is_particulate));
}
