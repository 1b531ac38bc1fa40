//! 128-bit NEON monochrome vector path: 16 pixels per iteration,
//! aarch64 only.
//!
//! NEON's 8-bit lanes support a direct per-byte shift (`vshrq_n_u8`), so
//! the `>> 2` quantization needs no 16-bit-lane trick the way the x86
//! paths do. NEON also has a native 64-entry table lookup (`vqtbl4q_u8`
//! over a `uint8x16x4_t`), so the fast-path gather needs no manual
//! group-select either — this path is the simplest of the three.
//! Mixed-width palettes run the same `vqtbl4q_u8` gather once per byte
//! plane in [`render_row_mixed_width`].

use std::arch::aarch64::*;

use lumenwire_core::Pixel;

/// Quantized luminance bucket (`0..=63`) for every pixel in `row`, 16
/// lanes per iteration with a scalar remainder.
///
/// # Safety
///
/// Only called on aarch64, where NEON is part of the baseline ISA.
#[target_feature(enable = "neon")]
pub unsafe fn quantize_row(row: &[Pixel]) -> Vec<u8> {
    let mut out = vec![0u8; row.len()];

    let mut i = 0;
    while i + 16 <= row.len() {
        let mut luminance = [0u8; 16];
        for lane in 0..16 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = vld1q_u8(luminance.as_ptr());
        let bucket = vshrq_n_u8(lum, 2);
        vst1q_u8(out[i..].as_mut_ptr(), bucket);
        i += 16;
    }

    for lane in i..row.len() {
        out[lane] = row[lane].luminance() >> 2;
    }

    out
}

/// Render one row of `row` through the 64-entry `fast_path` table
/// (uniform-1-byte palettes only), appending glyph bytes directly to
/// `out` with no ANSI escapes.
///
/// # Safety
///
/// Only called on aarch64, where NEON is part of the baseline ISA.
#[target_feature(enable = "neon")]
pub unsafe fn render_row(row: &[Pixel], fast_path: &[u8; 64], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + row.len(), 0);

    let table = uint8x16x4_t(
        vld1q_u8(fast_path.as_ptr()),
        vld1q_u8(fast_path.as_ptr().add(16)),
        vld1q_u8(fast_path.as_ptr().add(32)),
        vld1q_u8(fast_path.as_ptr().add(48)),
    );

    let mut i = 0;
    while i + 16 <= row.len() {
        let mut luminance = [0u8; 16];
        for lane in 0..16 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = vld1q_u8(luminance.as_ptr());
        let bucket = vshrq_n_u8(lum, 2);
        let glyphs = vqtbl4q_u8(table, bucket);
        vst1q_u8(out[start + i..].as_mut_ptr(), glyphs);
        i += 16;
    }

    for lane in i..row.len() {
        let bucket = row[lane].luminance() >> 2;
        out[start + lane] = fast_path[bucket as usize];
    }
}

/// Render one row through the 4-plane `glyph_planes` table (any palette
/// width), appending each pixel's `glyph_lens[bucket]` significant bytes
/// to `out`.
///
/// # Safety
///
/// Only called on aarch64, where NEON is part of the baseline ISA.
#[target_feature(enable = "neon")]
pub unsafe fn render_row_mixed_width(
    row: &[Pixel],
    glyph_planes: &[[u8; 64]; 4],
    glyph_lens: &[u8; 64],
    out: &mut Vec<u8>,
) {
    let tables: Vec<uint8x16x4_t> = glyph_planes
        .iter()
        .map(|plane| {
            uint8x16x4_t(
                vld1q_u8(plane.as_ptr()),
                vld1q_u8(plane.as_ptr().add(16)),
                vld1q_u8(plane.as_ptr().add(32)),
                vld1q_u8(plane.as_ptr().add(48)),
            )
        })
        .collect();

    let mut i = 0;
    while i + 16 <= row.len() {
        let mut luminance = [0u8; 16];
        for lane in 0..16 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = vld1q_u8(luminance.as_ptr());
        let bucket = vshrq_n_u8(lum, 2);

        let mut buckets = [0u8; 16];
        vst1q_u8(buckets.as_mut_ptr(), bucket);

        let mut gathered = [[0u8; 16]; 4];
        for (plane, table) in tables.iter().enumerate() {
            let g = vqtbl4q_u8(*table, bucket);
            vst1q_u8(gathered[plane].as_mut_ptr(), g);
        }

        for lane in 0..16 {
            let len = glyph_lens[buckets[lane] as usize] as usize;
            out.extend(gathered.iter().take(len).map(|plane| plane[lane]));
        }
        i += 16;
    }

    for lane in i..row.len() {
        let bucket = (row[lane].luminance() >> 2) as usize;
        let len = glyph_lens[bucket] as usize;
        out.extend(glyph_planes.iter().take(len).map(|plane| plane[bucket]));
    }
}
