//! The scalar renderer: a portable, one-pixel-at-a-time reference
//! implementation. Defines correctness for the vector paths in
//! [`crate::vector`], which must match this output exactly (color modes)
//! or after [`crate::vector::expand_rle`] (monochrome).

use lumenwire_core::Frame;

use crate::ansi::AnsiWriter;
use crate::cache::CacheEntry;
use crate::luminance::LuminanceTable;

/// Render `frame` through `entry`, writing UTF-8 bytes into `out`.
/// Total over any valid frame and cache entry: there is no error path.
pub fn render(frame: &Frame, entry: &CacheEntry, supports_rle: bool, out: &mut Vec<u8>) {
    let rows = frame.rows();
    for y in 0..rows {
        let Some(row) = frame.row(y) else {
            unreachable!("y is bounded by frame.rows() above");
        };

        let mut writer = AnsiWriter::new(out, entry.mode(), supports_rle);
        for pixel in row {
            let bucket = LuminanceTable::quantize(pixel.luminance());
            let (glyph, _len) = entry.glyph(bucket);
            let color = entry.mode().is_color().then_some((pixel.r, pixel.g, pixel.b));
            writer.push(glyph, color);
        }
        writer.finish_row();

        if y + 1 < rows {
            out.push(b'\n');
        }
    }
}
