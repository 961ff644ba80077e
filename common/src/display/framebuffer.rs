// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

/// In-memory RGB raster the size of the display.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb888>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb888> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Pixels row by row, starting at the top left corner.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Anything outside the raster is clipped
            if let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) {
                if x < self.width && y < self.height {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }

        Ok(())
    }
}

#[test]
fn test_draw_clips_to_raster() {
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    let mut frame = FrameBuffer::new(4, 2);
    Rectangle::new(Point::new(2, -1), Size::new(5, 5))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
        .draw(&mut frame)
        .unwrap();

    assert_eq!(frame.pixel(1, 0), Some(Rgb888::BLACK));
    assert_eq!(frame.pixel(2, 0), Some(Rgb888::WHITE));
    assert_eq!(frame.pixel(3, 1), Some(Rgb888::WHITE));
    assert_eq!(frame.pixel(4, 0), None);
}
