//! Window output and key polling.

use crate::Result;
use log::debug;
use opencv::{
    core::Mat,
    highgui::{self, WINDOW_AUTOSIZE},
};

/// A surface that shows frames and reports key presses
pub trait DisplaySurface {
    /// Present one frame
    fn show(&mut self, frame: &Mat) -> Result<()>;

    /// Wait up to `timeout_ms` for a key; `None` when nothing was pressed
    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>>;

    /// Close every window
    fn destroy_all(&mut self) -> Result<()>;
}

/// Whether `key` (as returned by `poll_key`) is the exit key
#[must_use]
pub fn is_exit_key(key: i32, exit_key: u8) -> bool {
    key & 0xFF == i32::from(exit_key)
}

/// `OpenCV` highgui window
pub struct HighguiDisplay {
    window_name: String,
    window_created: bool,
}

impl HighguiDisplay {
    /// Prepare a window; it is created on the first `show`
    #[must_use]
    pub fn new(window_name: impl Into<String>) -> Self {
        Self {
            window_name: window_name.into(),
            window_created: false,
        }
    }

    /// Title of the window
    #[must_use]
    pub fn window_name(&self) -> &str {
        &self.window_name
    }
}

impl DisplaySurface for HighguiDisplay {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        if !self.window_created {
            highgui::named_window(&self.window_name, WINDOW_AUTOSIZE)?;
            self.window_created = true;
        }
        highgui::imshow(&self.window_name, frame)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>> {
        let key = highgui::wait_key(timeout_ms)?;
        Ok((key >= 0).then_some(key))
    }

    fn destroy_all(&mut self) -> Result<()> {
        debug!("Destroying all windows");
        highgui::destroy_all_windows()?;
        self.window_created = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_key_matches_low_byte() {
        assert!(is_exit_key(i32::from(b'q'), b'q'));
        // Some backends report modifier bits above the low byte
        assert!(is_exit_key(0x10_0000 | i32::from(b'q'), b'q'));
        assert!(!is_exit_key(i32::from(b'Q'), b'q'));
        assert!(!is_exit_key(27, b'q'));
    }

    #[test]
    fn test_window_name() {
        let display = HighguiDisplay::new("Live Emoji Detection");
        assert_eq!(display.window_name(), "Live Emoji Detection");
    }
}
