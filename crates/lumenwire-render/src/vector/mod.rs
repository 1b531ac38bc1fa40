//! Per-ISA SIMD render paths, dispatched once per process and memoized.
//!
//! Every path here must agree with [`crate::scalar::render`]: byte-for-byte
//! in color modes (the index computation is vectorized, but every pixel
//! still goes through the same [`crate::ansi::AnsiWriter`] for color state
//! and run-length coalescing), and byte-for-byte after [`expand_rle`] in
//! monochrome (the vector monochrome paths never emit the `ESC[Kb` escape
//! themselves — they write the literal glyph stream, since the whole-row
//! vectorization that makes them fast has no cheap way to track a
//! cross-lane repeat count).

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod ssse3;
#[cfg(target_arch = "x86_64")]
mod avx2;

use std::sync::OnceLock;

use lumenwire_core::Frame;

use crate::ansi::AnsiWriter;
use crate::cache::CacheEntry;
use crate::luminance::LuminanceTable;

/// Which vector path this process dispatched to. Exposed as a plain,
/// comparable value rather than a hidden function pointer so tests and
/// logging can assert which path a given CPU actually took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedPath {
    /// 256-bit lanes (AVX2), x86_64 only.
    Avx2,
    /// 128-bit lanes (SSSE3), x86_64 only.
    Ssse3,
    /// 128-bit NEON lanes, aarch64 only.
    Neon,
    /// No vector ISA detected; the scalar renderer runs directly.
    Scalar,
}

static SELECTED: OnceLock<SelectedPath> = OnceLock::new();

/// The vector path this process will use for the rest of its lifetime.
/// Detected once on first call and memoized; never re-probed inside a hot
/// loop.
#[must_use]
pub fn selected_path() -> SelectedPath {
    *SELECTED.get_or_init(detect)
}

fn detect() -> SelectedPath {
    #[cfg(target_arch = "x86_64")]
    {
        if std::is_x86_feature_detected!("avx2") {
            return SelectedPath::Avx2;
        }
        if std::is_x86_feature_detected!("ssse3") {
            return SelectedPath::Ssse3;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return SelectedPath::Neon;
        }
    }
    SelectedPath::Scalar
}

/// Expand `ESC[Kb` run-length escapes in `bytes` back into literal glyph
/// repeats. Used to compare a scalar (RLE-compressed) render against a
/// vector (uncompressed) monochrome render byte-for-byte.
#[must_use]
pub fn expand_rle(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let mut last_glyph_start = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1B && bytes.get(i + 1) == Some(&b'[') {
            let mut j = i + 2;
            let digits_start = j;
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            if j > digits_start && bytes.get(j) == Some(&b'b') {
                let count: usize = std::str::from_utf8(&bytes[digits_start..j])
                    .ok()
                    .and_then(|digits| digits.parse().ok())
                    .unwrap_or(0);
                let glyph = &out[last_glyph_start..].to_vec();
                for _ in 0..count {
                    out.extend_from_slice(glyph);
                }
                i = j + 1;
                continue;
            }
        }

        last_glyph_start = out.len();
        out.push(bytes[i]);
        i += 1;
    }

    out
}

/// Render `frame` through `entry` using `path` (or the scalar fallback,
/// for [`SelectedPath::Scalar`]).
pub fn render(
    path: SelectedPath,
    frame: &Frame,
    entry: &CacheEntry,
    supports_rle: bool,
    out: &mut Vec<u8>,
) {
    if path == SelectedPath::Scalar {
        crate::scalar::render(frame, entry, supports_rle, out);
        return;
    }

    if entry.mode().is_color() {
        render_color(path, frame, entry, supports_rle, out);
    } else {
        render_monochrome(path, frame, entry, out);
    }
}

/// Color paths: the bucket index for every pixel is computed through the
/// same vectorized table gather as the monochrome paths, but writing still
/// goes through [`AnsiWriter`] one pixel at a time, so color-state
/// coalescing and RLE behave identically to the scalar renderer.
fn render_color(
    path: SelectedPath,
    frame: &Frame,
    entry: &CacheEntry,
    supports_rle: bool,
    out: &mut Vec<u8>,
) {
    let rows = frame.rows();
    for y in 0..rows {
        let Some(row) = frame.row(y) else {
            unreachable!("y is bounded by frame.rows() above");
        };

        let buckets = quantize_row(path, row);
        let mut writer = AnsiWriter::new(out, entry.mode(), supports_rle);
        for (pixel, bucket) in row.iter().zip(buckets) {
            let (glyph, _len) = entry.glyph(bucket);
            writer.push(glyph, Some((pixel.r, pixel.g, pixel.b)));
        }
        writer.finish_row();

        if y + 1 < rows {
            out.push(b'\n');
        }
    }
}

/// Monochrome paths: the glyph stream is written directly with no ANSI
/// writer and no RLE, since the vectorized gather produces a whole row's
/// glyph bytes at once rather than incrementally tracking a repeat count.
fn render_monochrome(path: SelectedPath, frame: &Frame, entry: &CacheEntry, out: &mut Vec<u8>) {
    let rows = frame.rows();
    for y in 0..rows {
        let Some(row) = frame.row(y) else {
            unreachable!("y is bounded by frame.rows() above");
        };

        if let Some(fast_path) = entry.fast_path() {
            render_fast_path_row(path, row, fast_path, out);
        } else {
            render_mixed_width_row(path, row, entry.glyph_planes(), entry.glyph_lens(), out);
        }

        if y + 1 < rows {
            out.push(b'\n');
        }
    }
}

fn quantize_row(path: SelectedPath, row: &[lumenwire_core::Pixel]) -> Vec<u8> {
    match path {
        #[cfg(target_arch = "x86_64")]
        SelectedPath::Avx2 => unsafe { avx2::quantize_row(row) },
        #[cfg(target_arch = "x86_64")]
        SelectedPath::Ssse3 => unsafe { ssse3::quantize_row(row) },
        #[cfg(target_arch = "aarch64")]
        SelectedPath::Neon => unsafe { neon::quantize_row(row) },
        _ => row.iter().map(|pixel| LuminanceTable::quantize(pixel.luminance())).collect(),
    }
}

fn render_fast_path_row(
    path: SelectedPath,
    row: &[lumenwire_core::Pixel],
    fast_path: &[u8; 64],
    out: &mut Vec<u8>,
) {
    match path {
        #[cfg(target_arch = "x86_64")]
        SelectedPath::Avx2 => unsafe { avx2::render_row(row, fast_path, out) },
        #[cfg(target_arch = "x86_64")]
        SelectedPath::Ssse3 => unsafe { ssse3::render_row(row, fast_path, out) },
        #[cfg(target_arch = "aarch64")]
        SelectedPath::Neon => unsafe { neon::render_row(row, fast_path, out) },
        _ => {
            for pixel in row {
                let bucket = LuminanceTable::quantize(pixel.luminance());
                out.push(fast_path[bucket as usize]);
            }
        },
    }
}

/// Render one row through the 4-plane `glyph_planes` table — the
/// mixed-width counterpart of [`render_fast_path_row`], used whenever the
/// palette has at least one multi-byte glyph. The bucket → glyph-byte
/// lookup is vectorized identically to the fast path, one byte plane at a
/// time; only the final per-pixel compaction to `glyph_lens[bucket]`
/// significant bytes is scalar, since a mixed-width row's total length
/// isn't known until every pixel's glyph length is read.
fn render_mixed_width_row(
    path: SelectedPath,
    row: &[lumenwire_core::Pixel],
    glyph_planes: &[[u8; 64]; 4],
    glyph_lens: &[u8; 64],
    out: &mut Vec<u8>,
) {
    match path {
        #[cfg(target_arch = "x86_64")]
        SelectedPath::Avx2 => unsafe { avx2::render_row_mixed_width(row, glyph_planes, glyph_lens, out) },
        #[cfg(target_arch = "x86_64")]
        SelectedPath::Ssse3 => unsafe { ssse3::render_row_mixed_width(row, glyph_planes, glyph_lens, out) },
        #[cfg(target_arch = "aarch64")]
        SelectedPath::Neon => unsafe { neon::render_row_mixed_width(row, glyph_planes, glyph_lens, out) },
        _ => {
            for pixel in row {
                let bucket = LuminanceTable::quantize(pixel.luminance()) as usize;
                let len = glyph_lens[bucket] as usize;
                out.extend(glyph_planes.iter().take(len).map(|plane| plane[bucket]));
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_rle_reconstructs_the_repeated_run() {
        let compressed = vec![0x40, 0x1B, b'[', b'4', b'b'];
        assert_eq!(expand_rle(&compressed), vec![0x40; 5]);
    }

    #[test]
    fn expand_rle_is_identity_when_there_is_no_escape() {
        let plain = b"abc".to_vec();
        assert_eq!(expand_rle(&plain), plain);
    }

    #[test]
    fn selected_path_is_memoized() {
        assert_eq!(selected_path(), selected_path());
    }

    mod equivalence {
        use lumenwire_core::Pixel;
        use proptest::prelude::*;

        use super::*;
        use crate::cache::{CacheConfig, PaletteCache};
        use crate::mode::{ColorTarget, RenderMode};
        use crate::palette::Palette;

        fn arbitrary_frame(width: u32, height: u32) -> impl Strategy<Value = Frame> {
            proptest::collection::vec(
                (any::<u8>(), any::<u8>(), any::<u8>())
                    .prop_map(|(r, g, b)| Pixel::new(r, g, b)),
                (width * height) as usize,
            )
            .prop_map(move |pixels| Frame::new(width, height, pixels).unwrap())
        }

        proptest! {
            #[test]
            fn monochrome_matches_scalar_after_rle_expansion(
                frame in arbitrary_frame(9, 3),
            ) {
                let palette = Palette::parse(" .:-=+*#%@").unwrap();
                let cache = PaletteCache::new(CacheConfig::default());
                let entry = cache.lookup_or_build(&palette, RenderMode::Monochrome).unwrap();

                let mut scalar_out = Vec::new();
                crate::scalar::render(&frame, &entry, true, &mut scalar_out);

                let mut vector_out = Vec::new();
                render(selected_path(), &frame, &entry, true, &mut vector_out);

                prop_assert_eq!(expand_rle(&scalar_out), vector_out);
            }

            #[test]
            fn mixed_width_monochrome_matches_scalar_after_rle_expansion(
                frame in arbitrary_frame(9, 3),
            ) {
                let palette = Palette::parse(" α♠🌟").unwrap();
                let cache = PaletteCache::new(CacheConfig::default());
                let entry = cache.lookup_or_build(&palette, RenderMode::Monochrome).unwrap();

                let mut scalar_out = Vec::new();
                crate::scalar::render(&frame, &entry, true, &mut scalar_out);

                let mut vector_out = Vec::new();
                render(selected_path(), &frame, &entry, true, &mut vector_out);

                prop_assert_eq!(expand_rle(&scalar_out), vector_out);
            }

            #[test]
            fn color_output_is_byte_identical_to_scalar(
                frame in arbitrary_frame(9, 3),
            ) {
                let palette = Palette::parse(" .:-=+*#%@").unwrap();
                let cache = PaletteCache::new(CacheConfig::default());
                let mode = RenderMode::TrueColor(ColorTarget::Foreground);
                let entry = cache.lookup_or_build(&palette, mode).unwrap();

                let mut scalar_out = Vec::new();
                crate::scalar::render(&frame, &entry, true, &mut scalar_out);

                let mut vector_out = Vec::new();
                render(selected_path(), &frame, &entry, true, &mut vector_out);

                prop_assert_eq!(scalar_out, vector_out);
            }
        }
    }
}
