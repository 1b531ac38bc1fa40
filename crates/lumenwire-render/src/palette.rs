//! A palette is an ordered sequence of glyphs, darkest to lightest, used
//! to map quantized luminance onto a character.

use crate::error::RenderError;

/// One glyph's byte span within a palette's backing UTF-8 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphSpan {
    start: usize,
    len: u8,
}

/// An ordered, non-empty sequence of glyphs. Glyphs may be of mixed byte
/// width (ASCII, 2-byte Latin/Greek, up to 4-byte emoji), but every glyph
/// is exactly one `char` — palettes of multi-codepoint grapheme clusters
/// are out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    source: String,
    spans: Vec<GlyphSpan>,
}

impl Palette {
    /// Parse `source` into an ordered glyph sequence, darkest glyph first.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyPalette`] if `source` contains no
    /// characters, or [`RenderError::GlyphTooWide`] if some glyph encodes
    /// to more than 4 bytes (unreachable for a single `char`, kept for
    /// robustness against future grapheme-cluster palettes).
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        let mut spans = Vec::new();
        for (index, (start, ch)) in source.char_indices().enumerate() {
            let len = ch.len_utf8();
            if len > 4 {
                return Err(RenderError::GlyphTooWide { index, len });
            }
            spans.push(GlyphSpan { start, len: len as u8 });
        }

        if spans.is_empty() {
            return Err(RenderError::EmptyPalette);
        }

        Ok(Self { source: source.to_string(), spans })
    }

    /// Number of glyphs in this palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether this palette has no glyphs. Always `false` for a
    /// successfully parsed palette; kept to satisfy `clippy::len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The backing UTF-8 bytes this palette was parsed from, used verbatim
    /// as the cache key (never normalized).
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    /// The glyph at `index`, as its raw UTF-8 bytes and byte length.
    #[must_use]
    pub fn char_at(&self, index: usize) -> Option<(&[u8], u8)> {
        let span = self.spans.get(index)?;
        let bytes = &self.source.as_bytes()[span.start..span.start + span.len as usize];
        Some((bytes, span.len))
    }

    /// Whether every glyph in this palette is exactly one byte (plain
    /// ASCII), enabling the cache's compact one-byte-per-bucket fast path.
    #[must_use]
    pub fn is_uniform_1byte(&self) -> bool {
        self.spans.iter().all(|span| span.len == 1)
    }

    /// The byte length of the widest glyph in this palette, in `1..=4`.
    #[must_use]
    pub fn max_byte_length(&self) -> u8 {
        self.spans.iter().map(|span| span.len).max().unwrap_or(1)
    }

    /// Every index whose glyph's raw bytes equal `char_bytes`. A palette
    /// with duplicate glyphs maps one character to several indices; this
    /// returns all of them, letting tests measure coverage per index rather
    /// than per distinct character.
    #[must_use]
    pub fn find_all(&self, char_bytes: &[u8], length: u8) -> Vec<usize> {
        self.spans
            .iter()
            .enumerate()
            .filter(|(_, span)| {
                span.len == length && &self.source.as_bytes()[span.start..span.start + span.len as usize] == char_bytes
            })
            .map(|(index, _)| index)
            .collect()
    }
}
