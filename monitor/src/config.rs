use std::path::{Path, PathBuf};
use std::time::Duration;

use enviro_common::persistence::FlushMode;
use enviro_common::upload::LuftdatenSettings;
use serde::{Deserialize, Serialize};

/// Path of the config file, overrides the per-user location.
pub const CONFIG_ENV: &str = "ENVIRO_CONFIG";
pub const SENSOR_ID_ENV: &str = "ENVIRO_SENSOR_ID";
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHAT_ENV: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// What the display shows between uploads.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScreenMode {
    /// One chart per variable plus a Wi-Fi screen, cycled with the proximity sensor.
    #[default]
    Charts,
    /// The Wi-Fi status banner, replaced by the upload banner after each upload.
    Status,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CpuThermometerKind {
    #[default]
    Vcgencmd,
    ThermalZone,
    Fixed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// Whether a PMS5003 particulate sensor is attached.
    pub particulates: bool,
    pub cpu_thermometer: CpuThermometerKind,
    /// Used by [`CpuThermometerKind::Fixed`].
    pub fixed_cpu_temperature: f64,
    pub compensation_factor: f64,
    pub cpuinfo_path: PathBuf,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            particulates: true,
            cpu_thermometer: CpuThermometerKind::default(),
            fixed_cpu_temperature: 45.0,
            compensation_factor: 1.3,
            cpuinfo_path: enviro_common::device::CPUINFO_PATH.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Linux framebuffer of the LCD. Without one the monitor runs headless.
    pub device: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub mode: ScreenMode,
    /// A proximity above this counts as a tap and moves to the next chart.
    pub proximity_threshold: u16,
    pub debounce_secs: f64,
    /// How long startup and upload banners stay on screen.
    pub banner_hold_secs: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: None,
            width: enviro_common::display::DEFAULT_WIDTH,
            height: enviro_common::display::DEFAULT_HEIGHT,
            mode: ScreenMode::default(),
            proximity_threshold: 1500,
            debounce_secs: 0.5,
            banner_hold_secs: 3.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CsvConfig {
    pub path: PathBuf,
    pub mode: FlushMode,
    pub flush_interval_minutes: f64,
    /// Write the buffered readings once more on Ctrl+C.
    pub flush_on_exit: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            path: "/home/pi/datasets/sensor_data.csv".into(),
            mode: FlushMode::default(),
            flush_interval_minutes: 180.0,
            flush_on_exit: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub enabled: bool,
    pub interval_secs: f64,
    #[serde(flatten)]
    pub luftdaten: LuftdatenSettings,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 145.0,
            luftdaten: LuftdatenSettings::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    /// Token and chat id, when both are set.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.token, &self.chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                Some((token.clone(), chat_id.clone()))
            }
            _ => None,
        }
    }
}

/// Every tunable of the monitor. Missing fields take their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_secs: f64,
    pub sensors: SensorConfig,
    pub display: DisplayConfig,
    pub csv: CsvConfig,
    pub upload: UploadConfig,
    pub telegram: TelegramConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1.0,
            sensors: SensorConfig::default(),
            display: DisplayConfig::default(),
            csv: CsvConfig::default(),
            upload: UploadConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

impl MonitorConfig {
    /// Loads `$ENVIRO_CONFIG`, else the per-user config file if there is one, else the
    /// defaults. Environment variables are applied on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match Self::default_path().filter(|path| path.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    log::info!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "enviro-monitor")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Takes secrets and the sensor id from the environment when they are set there.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(sensor_id) = lookup(SENSOR_ID_ENV) {
            self.upload.luftdaten.sensor_id = sensor_id;
        }
        if let Some(token) = lookup(TELEGRAM_TOKEN_ENV) {
            self.telegram.token = Some(token);
        }
        if let Some(chat_id) = lookup(TELEGRAM_CHAT_ENV) {
            self.telegram.chat_id = Some(chat_id);
        }
    }

    pub fn poll_interval(&self) -> Duration {
        seconds(self.poll_interval_secs)
    }

    pub fn upload_interval(&self) -> Duration {
        seconds(self.upload.interval_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        seconds(self.csv.flush_interval_minutes * 60.0)
    }

    pub fn debounce(&self) -> Duration {
        seconds(self.display.debounce_secs)
    }

    pub fn banner_hold(&self) -> Duration {
        seconds(self.display.banner_hold_secs)
    }
}

#[test]
fn test_defaults() {
    let config = MonitorConfig::default();

    assert_eq!(config.upload_interval(), Duration::from_secs(145));
    assert_eq!(config.flush_interval(), Duration::from_secs(180 * 60));
    assert_eq!(config.debounce(), Duration::from_millis(500));
    assert_eq!(config.display.proximity_threshold, 1500);
    assert_eq!(config.csv.mode, FlushMode::Append);
    assert_eq!(config.telegram.credentials(), None);
}

#[test]
fn test_partial_json() {
    let config = MonitorConfig::from_json(
        r#"{
            "display": { "mode": "status", "device": "/dev/fb1" },
            "csv": { "mode": "overwrite" },
            "upload": { "interval_secs": 60, "environmental_pin": "12" }
        }"#,
    )
    .unwrap();

    assert_eq!(config.display.mode, ScreenMode::Status);
    assert_eq!(config.display.device, Some(PathBuf::from("/dev/fb1")));
    assert_eq!(config.display.width, 160);
    assert_eq!(config.csv.mode, FlushMode::Overwrite);
    assert_eq!(config.upload_interval(), Duration::from_secs(60));
    assert_eq!(config.upload.luftdaten.environmental_pin, "12");
    assert_eq!(config.upload.luftdaten.particulate_pin, "1");
}

#[test]
fn test_env_overrides_secrets() {
    let mut config = MonitorConfig::default();
    config.apply_env(|key| match key {
        TELEGRAM_TOKEN_ENV => Some("123:abc".into()),
        TELEGRAM_CHAT_ENV => Some("42".into()),
        SENSOR_ID_ENV => Some("raspi-test".into()),
        _ => None,
    });

    assert_eq!(
        config.telegram.credentials(),
        Some(("123:abc".into(), "42".into()))
    );
    assert_eq!(config.upload.luftdaten.sensor_id, "raspi-test");
}
