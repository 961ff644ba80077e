// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod framebuffer;
mod banner;
mod chartrenderer;
mod displaypanel;

pub use framebuffer::FrameBuffer;

pub use banner::Banner;

pub use chartrenderer::{heat_color, hue_for, normalize, ChartRenderer};

pub use displaypanel::{
    DisplayError, DisplayPanel, DisplayPanelPointer, FramebufferPanel, HeadlessPanel,
};

/// Width of the 0.96" LCD in landscape orientation.
pub const DEFAULT_WIDTH: usize = 160;

/// Height of the 0.96" LCD in landscape orientation.
pub const DEFAULT_HEIGHT: usize = 80;
