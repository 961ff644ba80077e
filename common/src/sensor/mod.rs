// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod sensoradapter;
mod dummysensoradapter;
mod cputhermometer;
mod sensorboard;

pub use sensoradapter::SensorAdapter;
pub use sensoradapter::SensorAdapterPointer;
pub use sensoradapter::SensorError;

pub use dummysensoradapter::DummySensorAdapter;

pub use cputhermometer::{
    parse_vcgencmd_output, CpuThermometer, CpuThermometerPointer, FixedThermometer,
    ThermalZoneThermometer, VcgencmdThermometer,
};

pub use sensorboard::SensorBoard;
