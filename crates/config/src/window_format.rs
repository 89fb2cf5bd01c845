//! Framebuffer description requested by a script

use crate::format::Format;
use serde::Serialize;

/// Formats and size of the offscreen framebuffer a script renders into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowFormat {
    /// Format of the single color attachment
    pub color_format: &'static Format,
    /// Format of the optional depth/stencil attachment
    pub depth_stencil_format: Option<&'static Format>,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

/// Color format used when a script does not request one
pub const DEFAULT_COLOR_FORMAT: &str = "B8G8R8A8_UNORM";
/// Framebuffer width used when a script does not request one
pub const DEFAULT_WIDTH: usize = 250;
/// Framebuffer height used when a script does not request one
pub const DEFAULT_HEIGHT: usize = 250;

impl Default for WindowFormat {
    fn default() -> Self {
        Self {
            color_format: Format::lookup_by_name(DEFAULT_COLOR_FORMAT).unwrap(),
            depth_stencil_format: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WindowFormat {
    /// Returns true if a window created for `self` can be reused for `other`
    pub fn is_compatible_with(&self, other: &WindowFormat) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_format() {
        let format = WindowFormat::default();
        assert_eq!(format.color_format.name, "B8G8R8A8_UNORM");
        assert!(format.depth_stencil_format.is_none());
        assert_eq!((format.width, format.height), (250, 250));
    }

    #[test]
    fn test_compatibility() {
        let base = WindowFormat::default();
        assert!(base.is_compatible_with(&WindowFormat::default()));

        let depth = WindowFormat {
            depth_stencil_format: Format::lookup_by_name("D24_UNORM_S8_UINT"),
            ..WindowFormat::default()
        };
        assert!(!base.is_compatible_with(&depth));

        let resized = WindowFormat { width: 12, ..WindowFormat::default() };
        assert!(!base.is_compatible_with(&resized));
    }
}
