// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};

use crate::display::framebuffer::FrameBuffer;

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("frame is {actual:?} but the panel is {expected:?}")]
    SizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("display device {path}: {source}")]
    Device {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type DisplayPanelPointer = Box<dyn DisplayPanel + Send>;

/// The physical screen. Every call pushes a complete frame, there are no partial updates.
pub trait DisplayPanel {
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;
}

/// Writes frames to a Linux framebuffer device in RGB565, such as `/dev/fb1` exposed by the
/// fbtft driver for the ST7735.
pub struct FramebufferPanel {
    path: PathBuf,
    device: File,
    width: usize,
    height: usize,
    bytes: Vec<u8>,
}

impl FramebufferPanel {
    pub fn open(path: impl AsRef<Path>, width: usize, height: usize) -> Result<Self, DisplayError> {
        let path = path.as_ref().to_path_buf();
        let device = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|source| DisplayError::Device {
                path: path.clone(),
                source,
            })?;

        log::info!("Opened display {} ({width}x{height})", path.display());

        Ok(Self {
            path,
            device,
            width,
            height,
            bytes: Vec::with_capacity(width * height * 2),
        })
    }

    fn write_frame(&mut self) -> std::io::Result<()> {
        self.device.seek(SeekFrom::Start(0))?;
        self.device.write_all(&self.bytes)?;
        self.device.flush()
    }
}

impl DisplayPanel for FramebufferPanel {
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        if (frame.width(), frame.height()) != (self.width, self.height) {
            return Err(DisplayError::SizeMismatch {
                expected: (self.width, self.height),
                actual: (frame.width(), frame.height()),
            });
        }

        self.bytes.clear();
        for pixel in frame.pixels() {
            let raw: u16 = Rgb565::from(*pixel).into_storage();
            self.bytes.extend_from_slice(&raw.to_le_bytes());
        }

        self.write_frame().map_err(|source| DisplayError::Device {
            path: self.path.clone(),
            source,
        })
    }
}

/// A panel without hardware. Keeps the last frame so it can be inspected.
#[derive(Default)]
pub struct HeadlessPanel {
    last_frame: Option<FrameBuffer>,
    frames_shown: usize,
}

impl HeadlessPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last_frame.as_ref()
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }
}

impl DisplayPanel for HeadlessPanel {
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        self.frames_shown += 1;
        log::debug!("Frame {} pushed to headless panel", self.frames_shown);

        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

#[test]
fn test_framebuffer_panel_writes_rgb565() {
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;

    let path = std::env::temp_dir().join(format!("enviro-fb-{}", std::process::id()));
    std::fs::write(&path, b"").unwrap();

    let mut frame = FrameBuffer::new(2, 1);
    Pixel(Point::new(1, 0), Rgb888::WHITE).draw(&mut frame).unwrap();

    let mut panel = FramebufferPanel::open(&path, 2, 1).unwrap();
    panel.show(&frame).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), vec![0x00, 0x00, 0xff, 0xff]);
    assert!(matches!(
        panel.show(&FrameBuffer::new(3, 1)),
        Err(DisplayError::SizeMismatch { .. })
    ));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_headless_panel_keeps_last_frame() {
    let mut panel = HeadlessPanel::new();
    panel.show(&FrameBuffer::new(4, 4)).unwrap();
    panel.show(&FrameBuffer::new(8, 8)).unwrap();

    assert_eq!(panel.frames_shown(), 2);
    assert_eq!(panel.last_frame().map(FrameBuffer::width), Some(8));
}
