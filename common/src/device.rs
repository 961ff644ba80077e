// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::path::Path;

pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Extracts the board serial number from the contents of `/proc/cpuinfo`.
pub fn parse_serial_number(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|line| line.starts_with("Serial"))
        .and_then(|line| line.split(':').nth(1))
        .map(|serial| serial.trim().to_string())
}

/// Reads the board serial number, `None` when the file has no serial line.
pub fn serial_number(cpuinfo_path: impl AsRef<Path>) -> std::io::Result<Option<String>> {
    let cpuinfo = std::fs::read_to_string(cpuinfo_path)?;
    Ok(parse_serial_number(&cpuinfo))
}

/// A trait to tell whether the board is on the network.
///
/// To be implemented for each platform.
pub trait NetworkStatusProvider {
    fn is_connected(&self) -> bool;
}

/// Considers the board connected when it has at least one address.
pub struct HostnameProbe;

#[cfg(target_os = "linux")]
impl NetworkStatusProvider for HostnameProbe {
    fn is_connected(&self) -> bool {
        match std::process::Command::new("hostname").arg("-I").output() {
            Ok(output) => !String::from_utf8_lossy(&output.stdout).trim().is_empty(),
            Err(e) => {
                log::debug!("hostname -I failed: {e}");
                false
            }
        }
    }
}

// Dummy data
#[cfg(not(target_os = "linux"))]
impl NetworkStatusProvider for HostnameProbe {
    fn is_connected(&self) -> bool {
        true
    }
}

#[test]
fn test_parse_serial_number() {
    let cpuinfo = "processor\t: 0\nHardware\t: BCM2835\nRevision\t: a02082\nSerial\t\t: 00000000d2a1b3c4\nModel\t\t: Raspberry Pi 3 Model B Rev 1.2\n";

    assert_eq!(parse_serial_number(cpuinfo).as_deref(), Some("00000000d2a1b3c4"));
    assert_eq!(parse_serial_number("processor\t: 0\n"), None);
}
