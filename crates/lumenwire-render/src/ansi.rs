//! Writes glyphs and ANSI color escapes into an output buffer, coalescing
//! repeated colors (suppressing a redundant prefix) and repeated glyphs
//! (collapsing a long run into a single `ESC[Kb` repeat-last-character
//! escape).

use crate::mode::{ColorTarget, RenderMode};

/// Minimum run length before a repeated glyph is worth collapsing into
/// `ESC[Kb` instead of writing it out literally. The source names no
/// specific threshold; 3 is the point past which the escape is shorter
/// than the literal repeat for every glyph width up to 4 bytes.
pub const RLE_THRESHOLD: u32 = 3;

const ESC: u8 = 0x1B;

fn cube_index(channel: u8) -> u8 {
    (u16::from(channel) * 6 / 256) as u8
}

/// Map an RGB triple to its 256-color palette index (`16..=231`) via 6x6x6
/// cube quantization.
#[must_use]
pub fn color_256(r: u8, g: u8, b: u8) -> u8 {
    16 + 36 * cube_index(r) + 6 * cube_index(g) + cube_index(b)
}

fn write_decimal(out: &mut Vec<u8>, mut value: u32) {
    if value == 0 {
        out.push(b'0');
        return;
    }
    let start = out.len();
    while value > 0 {
        out.push(b'0' + (value % 10) as u8);
        value /= 10;
    }
    out[start..].reverse();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorState {
    None,
    TrueColor(u8, u8, u8),
    Color256(u8),
}

/// Accumulates one row's glyph and color output, flushing coalesced runs
/// into the caller-owned buffer.
pub struct AnsiWriter<'a> {
    out: &'a mut Vec<u8>,
    mode: RenderMode,
    supports_rle: bool,
    color_state: ColorState,
    pending_glyph: Vec<u8>,
    pending_repeats: u32,
    row_has_output: bool,
}

impl<'a> AnsiWriter<'a> {
    /// Build a writer appending into `out`. `supports_rle` comes from the
    /// target terminal's capabilities: when `false`, runs are always
    /// written out literally even past [`RLE_THRESHOLD`].
    pub fn new(out: &'a mut Vec<u8>, mode: RenderMode, supports_rle: bool) -> Self {
        Self {
            out,
            mode,
            supports_rle,
            color_state: ColorState::None,
            pending_glyph: Vec::new(),
            pending_repeats: 0,
            row_has_output: false,
        }
    }

    /// Write one glyph, with its pixel color if `mode` is a color mode.
    pub fn push(&mut self, glyph: &[u8], color: Option<(u8, u8, u8)>) {
        let prefix_emitted = self.mode.is_color() && self.maybe_write_color_prefix(color);

        if !prefix_emitted && self.row_has_output && glyph == self.pending_glyph.as_slice() {
            self.pending_repeats += 1;
            return;
        }

        self.flush_pending_glyph();
        self.pending_glyph.clear();
        self.pending_glyph.extend_from_slice(glyph);
        self.pending_repeats = 0;
        self.row_has_output = true;
    }

    /// Flush any pending glyph run and, in color modes, emit `ESC[0m`.
    /// Does not write the row separator: the caller pushes `\n` between
    /// rows itself.
    pub fn finish_row(&mut self) {
        self.flush_pending_glyph();
        if self.mode.is_color() {
            self.out.extend_from_slice(&[ESC, b'[', b'0', b'm']);
        }
        self.color_state = ColorState::None;
        self.row_has_output = false;
    }

    fn maybe_write_color_prefix(&mut self, color: Option<(u8, u8, u8)>) -> bool {
        let (r, g, b) = color.unwrap_or((0, 0, 0));

        let target = match self.mode {
            RenderMode::Color256(target) => {
                let state = ColorState::Color256(color_256(r, g, b));
                if state == self.color_state {
                    return false;
                }
                self.color_state = state;
                target
            },
            RenderMode::TrueColor(target) => {
                let state = ColorState::TrueColor(r, g, b);
                if state == self.color_state {
                    return false;
                }
                self.color_state = state;
                target
            },
            RenderMode::Monochrome => return false,
        };

        let target_code: u8 = match target {
            ColorTarget::Foreground => 3,
            ColorTarget::Background => 4,
        };

        self.out.push(ESC);
        self.out.push(b'[');
        write_decimal(self.out, u32::from(target_code));
        match self.mode {
            RenderMode::Color256(_) => {
                self.out.extend_from_slice(b"8;5;");
                write_decimal(self.out, u32::from(color_256(r, g, b)));
            },
            RenderMode::TrueColor(_) => {
                self.out.extend_from_slice(b"8;2;");
                write_decimal(self.out, u32::from(r));
                self.out.push(b';');
                write_decimal(self.out, u32::from(g));
                self.out.push(b';');
                write_decimal(self.out, u32::from(b));
            },
            RenderMode::Monochrome => unreachable!("handled above"),
        }
        self.out.push(b'm');
        true
    }

    fn flush_pending_glyph(&mut self) {
        if self.pending_glyph.is_empty() {
            return;
        }

        self.out.extend_from_slice(&self.pending_glyph);

        if self.supports_rle && self.pending_repeats >= RLE_THRESHOLD {
            self.out.push(ESC);
            self.out.push(b'[');
            write_decimal(self.out, self.pending_repeats);
            self.out.push(b'b');
        } else {
            for _ in 0..self.pending_repeats {
                self.out.extend_from_slice(&self.pending_glyph);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monochrome_without_repeats_writes_glyphs_literally() {
        let mut out = Vec::new();
        {
            let mut writer = AnsiWriter::new(&mut out, RenderMode::Monochrome, true);
            writer.push(b" ", None);
            writer.push(b"@", None);
            writer.finish_row();
        }
        assert_eq!(out, b" @");
    }

    #[test]
    fn repeated_glyph_run_collapses_to_rle_escape() {
        let mut out = Vec::new();
        {
            let mut writer = AnsiWriter::new(&mut out, RenderMode::Monochrome, true);
            for _ in 0..5 {
                writer.push(b"@", None);
            }
            writer.finish_row();
        }
        assert_eq!(out, b"@\x1B[4b");
    }

    #[test]
    fn run_below_threshold_is_written_literally() {
        let mut out = Vec::new();
        {
            let mut writer = AnsiWriter::new(&mut out, RenderMode::Monochrome, true);
            for _ in 0..2 {
                writer.push(b"@", None);
            }
            writer.finish_row();
        }
        assert_eq!(out, b"@@");
    }

    #[test]
    fn rle_disabled_by_capabilities_never_emits_escape() {
        let mut out = Vec::new();
        {
            let mut writer = AnsiWriter::new(&mut out, RenderMode::Monochrome, false);
            for _ in 0..10 {
                writer.push(b"@", None);
            }
            writer.finish_row();
        }
        assert_eq!(out, b"@".repeat(10));
    }

    #[test]
    fn truecolor_emits_prefix_once_per_color_change() {
        let mut out = Vec::new();
        {
            let mut writer =
                AnsiWriter::new(&mut out, RenderMode::TrueColor(ColorTarget::Foreground), true);
            writer.push(b"#", Some((10, 20, 30)));
            writer.finish_row();
        }
        assert_eq!(out, b"\x1B[38;2;10;20;30m#\x1B[0m");
    }

    #[test]
    fn unchanged_color_suppresses_repeated_prefix() {
        let mut out = Vec::new();
        {
            let mut writer =
                AnsiWriter::new(&mut out, RenderMode::TrueColor(ColorTarget::Foreground), true);
            writer.push(b"#", Some((10, 20, 30)));
            writer.push(b"#", Some((10, 20, 30)));
            writer.finish_row();
        }
        assert_eq!(out, b"\x1B[38;2;10;20;30m##\x1B[0m");
    }

    #[test]
    fn color_change_breaks_a_pending_rle_run() {
        let mut out = Vec::new();
        {
            let mut writer =
                AnsiWriter::new(&mut out, RenderMode::TrueColor(ColorTarget::Foreground), true);
            writer.push(b"@", Some((1, 1, 1)));
            writer.push(b"@", Some((1, 1, 1)));
            writer.push(b"@", Some((2, 2, 2)));
            writer.push(b"@", Some((2, 2, 2)));
            writer.finish_row();
        }
        // No run here ever reaches the RLE threshold, so every glyph is
        // written literally; the point under test is that the prefix
        // reappears exactly when the color changes.
        assert_eq!(out, b"\x1B[38;2;1;1;1m@@\x1B[38;2;2;2;2m@@\x1B[0m");
    }

    #[test]
    fn color_256_uses_cube_quantized_index() {
        let mut out = Vec::new();
        {
            let mut writer =
                AnsiWriter::new(&mut out, RenderMode::Color256(ColorTarget::Foreground), true);
            writer.push(b"@", Some((255, 255, 255)));
            writer.finish_row();
        }
        assert_eq!(out, b"\x1B[38;5;231m@\x1B[0m");
    }
}
