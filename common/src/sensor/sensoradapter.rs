// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use enviro_model::{GasReading, ParticulateReading};

/// Failure of a single sensor access.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The sensor did not deliver a frame in time. Only the particulate sensor reports this.
    #[error("timed out reading {0}")]
    ReadTimeout(&'static str),

    #[error("bus error on {sensor}: {message}")]
    Bus {
        sensor: &'static str,
        message: String,
    },

    #[error("could not parse sensor output {0:?}")]
    Parse(String),

    #[error("`{command}` failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SensorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SensorError::ReadTimeout(_))
    }
}

pub type SensorAdapterPointer = Box<dyn SensorAdapter + Send>;

/// Access to the sensors of the Enviro+ board.
///
/// Every call returns the latest instantaneous value of one physical sensor. The drivers
/// behind an implementation are external; see [`super::DummySensorAdapter`] for a
/// simulated board.
pub trait SensorAdapter {
    /// Raw, uncompensated temperature in degrees Celsius.
    fn temperature(&mut self) -> Result<f64, SensorError>;

    /// Pressure in hPa.
    fn pressure(&mut self) -> Result<f64, SensorError>;

    /// Relative humidity in percent.
    fn humidity(&mut self) -> Result<f64, SensorError>;

    /// Ambient light in lux.
    fn lux(&mut self) -> Result<f64, SensorError>;

    /// Raw proximity count, larger is closer.
    fn proximity(&mut self) -> Result<u16, SensorError>;

    fn gas(&mut self) -> Result<GasReading, SensorError>;

    /// May fail with [`SensorError::ReadTimeout`].
    fn particulates(&mut self) -> Result<ParticulateReading, SensorError>;
}
