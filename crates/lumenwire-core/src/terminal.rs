//! Terminal capability record consumed by the ANSI writer.
//!
//! TTY probing itself — querying `$COLORTERM`, `terminfo`, or issuing a
//! `DA1`/`DA2` query — is an external collaborator's job (see `spec.md`
//! §1). This module defines only the record the renderer reads once probing
//! is done.

/// Color depth a terminal has advertised support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSupport {
    /// No color escapes should be emitted; monochrome rendering only.
    #[default]
    None,
    /// 256-color palette (`ESC[38;5;Nm` / `ESC[48;5;Nm`).
    Ansi256,
    /// 24-bit truecolor (`ESC[38;2;R;G;Bm` / `ESC[48;2;R;G;Bm`).
    TrueColor,
}

/// What the connected terminal is known to support, supplied by the
/// (external) TTY-capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    /// Highest color mode the terminal understands.
    pub color: ColorSupport,
    /// Whether the terminal honors `ESC[Nb` run-length repetition. When
    /// `false`, the renderer still produces correct output (it degrades to
    /// repeating glyphs literally) but at higher byte cost.
    pub supports_rle: bool,
}

impl Default for TerminalCapabilities {
    fn default() -> Self {
        Self { color: ColorSupport::None, supports_rle: true }
    }
}

impl TerminalCapabilities {
    /// A capabilities record describing a terminal with no color support
    /// and no RLE support — the most conservative renderer target.
    #[must_use]
    pub const fn plain() -> Self {
        Self { color: ColorSupport::None, supports_rle: false }
    }

    /// A capabilities record describing a modern truecolor terminal.
    #[must_use]
    pub const fn truecolor() -> Self {
        Self { color: ColorSupport::TrueColor, supports_rle: true }
    }
}
