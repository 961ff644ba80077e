// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use embedded_graphics::pixelcolor::Rgb888;

const DARK_RED: Rgb888 = Rgb888::new(85, 15, 15);

/// A full-screen status message on a colored background.
#[derive(Clone, Debug, PartialEq)]
pub enum Banner {
    /// Shown once while the monitor starts up.
    Startup,
    WifiStatus { serial: String, connected: bool },
    UploadStatus { ok: bool },
}

impl Banner {
    pub fn background(&self) -> Rgb888 {
        match self {
            Banner::Startup => Rgb888::new(255, 200, 0),
            Banner::WifiStatus { connected: true, .. } => Rgb888::new(0, 170, 170),
            Banner::UploadStatus { ok: true } => Rgb888::new(0, 128, 128),
            Banner::WifiStatus { connected: false, .. } | Banner::UploadStatus { ok: false } => {
                DARK_RED
            }
        }
    }

    pub fn text_color(&self) -> Rgb888 {
        Rgb888::new(255, 255, 255)
    }

    /// The banner text, one line per row on the display.
    pub fn message(&self) -> String {
        match self {
            Banner::Startup => "Enviro+\nstarting".to_string(),
            Banner::WifiStatus { serial, connected } => format!(
                "{serial}\nWi-Fi: {}",
                if *connected { "connected" } else { "disconnected" }
            ),
            Banner::UploadStatus { ok } => {
                format!("Upload\n{}", if *ok { "ok" } else { "failed" })
            }
        }
    }
}

#[test]
fn test_banner_colors() {
    let connected = Banner::WifiStatus {
        serial: "00000000d2a1b3c4".into(),
        connected: true,
    };
    let disconnected = Banner::WifiStatus {
        serial: "00000000d2a1b3c4".into(),
        connected: false,
    };

    assert_eq!(connected.background(), Rgb888::new(0, 170, 170));
    assert_eq!(disconnected.background(), DARK_RED);
    assert_eq!(Banner::UploadStatus { ok: false }.background(), DARK_RED);
    assert_eq!(
        disconnected.message(),
        "00000000d2a1b3c4\nWi-Fi: disconnected"
    );
}
