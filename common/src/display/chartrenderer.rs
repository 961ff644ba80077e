// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::convert::Infallible;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_8X13};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use enviro_model::Variable;
use palette::{FromColor, Hsv, Srgb};

use crate::display::banner::Banner;
use crate::display::framebuffer::FrameBuffer;
use crate::window::SlidingWindow;

/// Scales the samples of `history` into `(0, 1]`, oldest first.
///
/// The +1 in numerator and denominator keeps a flat history finite: all its values map to 1.
pub fn normalize(history: &SlidingWindow) -> Vec<f64> {
    let (min, max) = (history.min(), history.max());

    history
        .iter()
        .map(|value| (value - min + 1.0) / (max - min + 1.0))
        .collect()
}

/// Hue as a fraction of a full turn, from red (1.0) to blue (0.0).
pub fn hue_for(normalized: f64) -> f64 {
    (1.0 - normalized) * 0.6
}

/// Fully saturated color on the red to blue ramp.
pub fn heat_color(normalized: f64) -> Rgb888 {
    let hsv: Hsv = Hsv::new((hue_for(normalized) * 360.0) as f32, 1.0, 1.0);
    let rgb: Srgb<u8> = Srgb::<f32>::from_color(hsv).into_format();

    Rgb888::new(rgb.red, rgb.green, rgb.blue)
}

/// Draws the scrolling charts and the banners into a frame buffer.
pub struct ChartRenderer {
    frame: FrameBuffer,
    histories: HashMap<Variable, SlidingWindow>,
}

impl ChartRenderer {
    /// The chart starts below the label.
    pub const TOP_POS: i32 = 25;

    /// Banner fonts, largest first.
    const BANNER_FONTS: [&'static MonoFont<'static>; 3] = [&FONT_10X20, &FONT_8X13, &FONT_6X10];

    pub fn new(width: usize, height: usize) -> Self {
        let histories = Variable::ALL
            .iter()
            .map(|variable| (*variable, SlidingWindow::filled(width, 1.0)))
            .collect();

        Self {
            frame: FrameBuffer::new(width, height),
            histories,
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn history(&self, variable: Variable) -> Option<&SlidingWindow> {
        self.histories.get(&variable)
    }

    /// Adds `value` to the history of `variable` and draws its chart.
    pub fn render_chart(&mut self, variable: Variable, value: f64) -> &FrameBuffer {
        let history = self
            .histories
            .entry(variable)
            .or_insert_with(|| SlidingWindow::filled(self.frame.width(), 1.0));
        history.push(value);
        let levels = normalize(history);

        let name = variable.name();
        let label = format!(
            "{}: {value:.1} {}",
            name.get(..4).unwrap_or(name),
            variable.unit()
        );
        log::info!("{label}");

        Self::draw_chart(&mut self.frame, &levels, &label).unwrap_or_else(|e| match e {});
        &self.frame
    }

    pub fn render_banner(&mut self, banner: &Banner) -> &FrameBuffer {
        Self::draw_banner(&mut self.frame, banner).unwrap_or_else(|e| match e {});
        &self.frame
    }

    fn draw_chart(frame: &mut FrameBuffer, levels: &[f64], label: &str) -> Result<(), Infallible> {
        let height = frame.height() as i32;
        let chart_height = (height - Self::TOP_POS).max(0) as u32;

        frame.clear(Rgb888::WHITE)?;

        for (x, level) in levels.iter().enumerate() {
            let x = x as i32;

            Rectangle::new(Point::new(x, Self::TOP_POS), Size::new(1, chart_height))
                .into_styled(PrimitiveStyle::with_fill(heat_color(*level)))
                .draw(frame)?;

            let line_y = height as f64 - (Self::TOP_POS as f64 + level * chart_height as f64)
                + Self::TOP_POS as f64;
            let line_y = (line_y as i32).clamp(Self::TOP_POS, height - 1);
            Pixel(Point::new(x, line_y), Rgb888::BLACK).draw(frame)?;
        }

        let style = MonoTextStyle::new(&FONT_10X20, Rgb888::BLACK);
        Text::with_baseline(label, Point::zero(), style, Baseline::Top).draw(frame)?;

        Ok(())
    }

    fn draw_banner(frame: &mut FrameBuffer, banner: &Banner) -> Result<(), Infallible> {
        frame.clear(banner.background())?;

        let message = banner.message();
        let lines = message.lines().collect::<Vec<_>>();
        let font = Self::banner_font(&lines, frame.width());
        let line_height = font.character_size.height as i32;
        let top = (frame.height() as i32 - line_height * lines.len() as i32) / 2;

        let character_style = MonoTextStyle::new(font, banner.text_color());
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();

        for (row, line) in lines.iter().enumerate() {
            let position = Point::new(frame.width() as i32 / 2, top + row as i32 * line_height);
            Text::with_text_style(line, position, character_style, text_style).draw(frame)?;
        }

        Ok(())
    }

    /// The largest font in which every line stays clear of the left and right edge.
    fn banner_font(lines: &[&str], width: usize) -> &'static MonoFont<'static> {
        let longest = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);

        Self::BANNER_FONTS
            .iter()
            .copied()
            .find(|font| longest * (font.character_size.width as usize) < width)
            .unwrap_or(&FONT_6X10)
    }
}

#[test]
fn test_flat_history_has_one_hue() {
    let levels = normalize(&SlidingWindow::filled(4, 1.0));
    assert!(levels.iter().all(|level| level.is_finite()));

    let hues = levels.iter().map(|level| hue_for(*level)).collect::<Vec<_>>();
    assert!(hues.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_normalize_range() {
    let mut history = SlidingWindow::filled(3, 0.0);
    history.push(1.0);
    history.push(3.0);

    let levels = normalize(&history);
    assert_eq!(levels, vec![0.25, 0.5, 1.0]);
}

#[test]
fn test_heat_color_ends() {
    assert_eq!(heat_color(1.0), Rgb888::new(255, 0, 0));

    let coldest = heat_color(0.0);
    assert!(coldest.b() == 255 && coldest.r() == 0);
}

#[test]
fn test_render_chart_scrolls_history() {
    let mut renderer = ChartRenderer::new(160, 80);
    renderer.render_chart(Variable::Temperature, 21.0);
    let frame = renderer.render_chart(Variable::Temperature, 23.0);

    // Newest value is the maximum: red strip in the last column
    assert_eq!(frame.pixel(159, 79), Some(Rgb888::new(255, 0, 0)));
    assert_eq!(frame.pixel(159, 24), Some(Rgb888::WHITE));

    let history = renderer.history(Variable::Temperature).unwrap();
    assert_eq!(history.len(), 160);
    assert_eq!(history.latest(), 23.0);
    assert_eq!(renderer.history(Variable::Pressure).unwrap().latest(), 1.0);
}

#[test]
fn test_render_banner_background() {
    let mut renderer = ChartRenderer::new(160, 80);
    let frame = renderer.render_banner(&Banner::Startup);

    assert_eq!(frame.pixel(0, 0), Some(Banner::Startup.background()));
    assert_eq!(frame.pixel(159, 79), Some(Banner::Startup.background()));
    assert!(frame.pixels().contains(&Rgb888::WHITE));
}

#[test]
fn test_disconnected_banner_fits_panel() {
    let banner = Banner::WifiStatus {
        serial: "00000000d2a1b3c4".into(),
        connected: false,
    };

    let mut renderer = ChartRenderer::new(160, 80);
    let frame = renderer.render_banner(&banner);

    for x in [0, 159] {
        assert!((0..80).all(|y| frame.pixel(x, y) == Some(banner.background())));
    }
    assert!(frame.pixels().contains(&banner.text_color()));
}
