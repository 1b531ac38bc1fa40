//! Which ANSI color encoding, if any, a render targets.

use lumenwire_core::{ColorSupport, TerminalCapabilities};

/// Whether a color escape applies to the foreground or background cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTarget {
    /// `ESC[38;...m` (or the 256-color equivalent).
    Foreground,
    /// `ESC[48;...m` (or the 256-color equivalent).
    Background,
}

/// The rendering mode for one frame: monochrome, or colored against a
/// specific [`ColorTarget`] at a specific color depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// No color escapes; glyphs only.
    Monochrome,
    /// 256-color palette (`ESC[38;5;Nm` / `ESC[48;5;Nm`), `N` from 6x6x6
    /// cube quantization of the pixel's RGB.
    Color256(ColorTarget),
    /// 24-bit truecolor (`ESC[38;2;R;G;Bm` / `ESC[48;2;R;G;Bm`).
    TrueColor(ColorTarget),
}

impl RenderMode {
    /// Whether this mode emits any color escapes at all.
    #[must_use]
    pub fn is_color(self) -> bool {
        !matches!(self, Self::Monochrome)
    }

    /// Pick the best mode a terminal's reported capabilities support,
    /// rendering to the foreground cell. Terminals with no color support
    /// get [`Self::Monochrome`]; 256-color and truecolor terminals get the
    /// richest mode they report.
    #[must_use]
    pub fn from_terminal_capabilities(caps: &TerminalCapabilities) -> Self {
        match caps.color {
            ColorSupport::None => Self::Monochrome,
            ColorSupport::Ansi256 => Self::Color256(ColorTarget::Foreground),
            ColorSupport::TrueColor => Self::TrueColor(ColorTarget::Foreground),
        }
    }
}
