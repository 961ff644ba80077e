// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::upload::uploadbatch::UploadBatch;
use crate::upload::UploadError;

/// Where and as whom to push the readings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LuftdatenSettings {
    pub endpoint: String,
    pub software_version: String,
    /// Sent as `X-Sensor`, `raspi-<serial>` for a Raspberry Pi.
    pub sensor_id: String,
    /// `X-PIN` of the particulate sensor.
    pub particulate_pin: String,
    /// `X-PIN` of the temperature/pressure/humidity sensor.
    pub environmental_pin: String,
}

impl Default for LuftdatenSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.luftdaten.info/v1/push-sensor-data/".into(),
            software_version: "enviro-plus 0.0.1".into(),
            sensor_id: String::new(),
            particulate_pin: "1".into(),
            environmental_pin: "11".into(),
        }
    }
}

/// Pushes readings to the Luftdaten (sensor.community) API.
///
/// The requests run on the given tokio runtime, `send` blocks until both are answered.
pub struct LuftdatenClient {
    runtime: Handle,
    http: reqwest::Client,
    settings: LuftdatenSettings,
}

impl LuftdatenClient {
    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

    pub fn new(runtime: Handle, settings: LuftdatenSettings) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;

        Ok(Self {
            runtime,
            http,
            settings,
        })
    }

    pub fn settings(&self) -> &LuftdatenSettings {
        &self.settings
    }

    /// Posts the particulate and the environmental part of `batch`.
    ///
    /// Returns `true` only when both posts were accepted. An empty part is not posted.
    pub fn send(&self, batch: &UploadBatch) -> Result<bool, UploadError> {
        let (particulate, environmental) = batch.partition();

        self.runtime.block_on(async {
            let particulate_ok = self.post(&particulate, &self.settings.particulate_pin).await?;
            let environmental_ok = self
                .post(&environmental, &self.settings.environmental_pin)
                .await?;

            Ok::<_, UploadError>(particulate_ok && environmental_ok)
        })
    }

    async fn post(&self, batch: &UploadBatch, pin: &str) -> Result<bool, UploadError> {
        if batch.is_empty() {
            return Ok(true);
        }

        let response = self
            .http
            .post(&self.settings.endpoint)
            .header("X-PIN", pin)
            .header("X-Sensor", &self.settings.sensor_id)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .json(&batch.payload(&self.settings.software_version))
            .send()
            .await?;

        let status = response.status();
        log::debug!("Luftdaten X-PIN {pin} <- {status}");

        Ok(status.is_success())
    }
}

#[test]
fn test_default_settings() {
    let settings = LuftdatenSettings::default();

    assert_eq!(settings.particulate_pin, "1");
    assert_eq!(settings.environmental_pin, "11");
    assert!(settings.endpoint.starts_with("https://"));
}

#[cfg(test)]
fn local_client(runtime: &tokio::runtime::Runtime, endpoint: String) -> LuftdatenClient {
    let settings = LuftdatenSettings {
        endpoint,
        sensor_id: "raspi-00000000d2a1b3c4".into(),
        ..Default::default()
    };

    let mut client = LuftdatenClient::new(runtime.handle().clone(), settings).unwrap();
    client.http = reqwest::Client::builder().no_proxy().build().unwrap();
    client
}

#[test]
fn test_send_needs_both_posts_accepted() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let (url, server) = crate::upload::serve(vec![(200, "OK"), (500, "")]);
    let client = local_client(&runtime, url);

    let mut batch = UploadBatch::new();
    batch.insert("temperature", "21.50");
    batch.insert("P2", "5.0");
    batch.insert("P1", "7.0");

    assert!(!client.send(&batch).unwrap());

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 2);

    assert!(requests[0].contains("x-pin: 1\r\n"));
    assert!(requests[0].contains("x-sensor: raspi-00000000d2a1b3c4\r\n"));
    assert!(requests[0].contains(r#""value_type":"P2""#));
    assert!(!requests[0].contains("temperature"));

    assert!(requests[1].contains("x-pin: 11\r\n"));
    assert!(requests[1].contains(r#""value_type":"temperature""#));
    assert!(requests[1].contains("cache-control: no-cache\r\n"));
}

#[test]
fn test_send_skips_empty_particulate_part() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let (url, server) = crate::upload::serve(vec![(201, "")]);
    let client = local_client(&runtime, url);

    let mut batch = UploadBatch::new();
    batch.insert("humidity", "40.00");

    assert!(client.send(&batch).unwrap());

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("x-pin: 11\r\n"));
}
