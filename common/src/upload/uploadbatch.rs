// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use enviro_model::{format_value, Reading};
use serde::{Deserialize, Serialize};

/// Metric names starting with this prefix are particulate values (`P1`, `P2`).
pub const PARTICULATE_PREFIX: &str = "P";

/// One entry of the `sensordatavalues` list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SensorDataValue {
    pub value_type: String,
    pub value: String,
}

/// The JSON body of a push to the air quality API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Payload {
    pub software_version: String,
    pub sensordatavalues: Vec<SensorDataValue>,
}

/// Metric name to formatted value, in insertion order. Built fresh for every upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadBatch {
    values: Vec<(String, String)>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The metrics the API accepts from this board.
    pub fn from_reading(reading: &Reading) -> Self {
        let mut batch = Self::new();
        batch.insert("temperature", format!("{:.2}", reading.temperature));
        batch.insert("pressure", format!("{:.2}", reading.pressure));
        batch.insert("humidity", format!("{:.2}", reading.humidity));

        if let Some(pm) = reading.particulates {
            batch.insert("P2", format_value(pm.pm25));
            batch.insert("P1", format_value(pm.pm10));
        }

        batch
    }

    /// Sets `key`, replacing an earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.values.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Splits the batch into `(particulate, environmental)` by key prefix.
    pub fn partition(&self) -> (UploadBatch, UploadBatch) {
        let (particulate, environmental) = self
            .values
            .iter()
            .cloned()
            .partition(|(key, _)| key.starts_with(PARTICULATE_PREFIX));

        (
            UploadBatch {
                values: particulate,
            },
            UploadBatch {
                values: environmental,
            },
        )
    }

    pub fn payload(&self, software_version: &str) -> Payload {
        Payload {
            software_version: software_version.to_string(),
            sensordatavalues: self
                .values
                .iter()
                .map(|(key, value)| SensorDataValue {
                    value_type: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

#[test]
fn test_partition_by_prefix() {
    let mut batch = UploadBatch::new();
    batch.insert("temperature", "21.50");
    batch.insert("P1", "7.0");
    batch.insert("P2", "5.0");

    let (particulate, environmental) = batch.partition();

    assert_eq!(particulate.keys().collect::<Vec<_>>(), vec!["P1", "P2"]);
    assert_eq!(environmental.keys().collect::<Vec<_>>(), vec!["temperature"]);
}

#[test]
fn test_batch_from_reading() {
    use enviro_model::{GasReading, ParticulateReading};

    let reading = Reading {
        timestamp: chrono::Local::now(),
        temperature: 21.456,
        pressure: 1013.0,
        humidity: 40.123,
        light: 1.0,
        gas: GasReading::default(),
        particulates: Some(ParticulateReading {
            pm1: 1.0,
            pm25: 2.0,
            pm10: 3.5,
        }),
    };

    let batch = UploadBatch::from_reading(&reading);
    assert_eq!(batch.get("temperature"), Some("21.46"));
    assert_eq!(batch.get("pressure"), Some("1013.00"));
    assert_eq!(batch.get("P2"), Some("2.0"));
    assert_eq!(batch.get("P1"), Some("3.5"));

    let without_pm = UploadBatch::from_reading(&Reading {
        particulates: None,
        ..reading
    });
    assert_eq!(without_pm.len(), 3);
}

#[test]
fn test_payload_shape() {
    let mut batch = UploadBatch::new();
    batch.insert("humidity", "40.00");
    batch.insert("humidity", "41.00");

    let json = serde_json::to_value(batch.payload("enviro-plus 0.0.1")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "software_version": "enviro-plus 0.0.1",
            "sensordatavalues": [{"value_type": "humidity", "value": "41.00"}]
        })
    );
}
