//! Building blocks of the Enviro+ monitor: sensor access, temperature compensation, the
//! chart renderer, the upload clients and the CSV sink.
//!
//! Nothing in here owns global state; the monitor binary keeps every piece in its session.

pub mod compensation;
pub mod device;
pub mod display;
pub mod persistence;
pub mod sensor;
pub mod upload;
pub mod window;

/// Cycles through a fixed number of screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSelector {
    index: usize,
    count: usize,
}

impl ModeSelector {
    /// Starts at the first of `count` screens.
    pub fn new(count: usize) -> Self {
        Self {
            index: 0,
            count: count.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves to the next screen, wrapping around after the last one.
    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.count;
        self.index
    }
}

#[test]
fn test_mode_selector_wraps() {
    let mut selector = ModeSelector::new(7);
    for _ in 0..7 {
        selector.advance();
    }
    assert_eq!(selector.index(), 0);

    selector.advance();
    assert_eq!(selector.index(), 1);
}
