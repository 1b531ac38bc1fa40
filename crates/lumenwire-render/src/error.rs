//! Error type for the rendering pipeline.

use lumenwire_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Everything that can go wrong building or using a palette, cache entry,
/// or render.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The glyph source wasn't valid UTF-8.
    #[error("palette source is not valid UTF-8 at byte offset {offset}")]
    MalformedUtf8 {
        /// Byte offset of the first invalid sequence.
        offset: usize,
    },

    /// A palette must name at least one glyph.
    #[error("palette is empty")]
    EmptyPalette,

    /// A single glyph in the palette encoded to more than 4 UTF-8 bytes,
    /// which the fixed-width glyph slot can't hold. Unreachable for any
    /// palette built from well-formed UTF-8 (`char::len_utf8` never
    /// exceeds 4), kept as a defensive edge so a future multi-codepoint
    /// grapheme palette has somewhere to fail into.
    #[error("glyph at palette index {index} encodes to {len} bytes, more than the 4-byte limit")]
    GlyphTooWide {
        /// Index of the offending glyph within the palette.
        index: usize,
        /// Its encoded length in bytes.
        len: usize,
    },

    /// A cache build for this `(palette, mode)` key failed and the failure
    /// was recorded; this is that recorded failure being replayed to a
    /// later caller without retrying the build.
    #[error("palette cache build failed: {reason}")]
    CacheBuildFailed {
        /// Human-readable reason recorded at build time.
        reason: String,
    },
}

impl HasErrorKind for RenderError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedUtf8 { .. } | Self::EmptyPalette | Self::GlyphTooWide { .. } => {
                ErrorKind::InputInvalid
            },
            Self::CacheBuildFailed { .. } => ErrorKind::Resource,
        }
    }
}
