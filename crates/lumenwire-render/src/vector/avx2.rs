//! 256-bit (AVX2) monochrome vector path: 32 pixels per iteration.
//!
//! AVX2 has no single-instruction 64-entry table lookup, so the 64-byte
//! fast-path table is split into four 16-byte quarters and gathered with
//! `vpshufb`, then selected per-lane by the index's high two bits.
//! Mixed-width (non-uniform-1-byte) palettes run the same per-lane gather
//! once per byte plane ([`render_row_mixed_width`]) instead of the single
//! 1-byte fast-path table: the bucket → glyph-byte lookup is vectorized
//! either way, only the final per-pixel compaction to the glyph's actual
//! length stays scalar.

use std::arch::x86_64::*;

use lumenwire_core::Pixel;

/// Quantized luminance bucket (`0..=63`) for every pixel in `row`, 32
/// lanes per iteration with a scalar remainder.
///
/// # Safety
///
/// Caller must have confirmed `is_x86_feature_detected!("avx2")`.
#[target_feature(enable = "avx2")]
pub unsafe fn quantize_row(row: &[Pixel]) -> Vec<u8> {
    let mut out = vec![0u8; row.len()];
    let mask = _mm256_set1_epi8(0x3F);

    let mut i = 0;
    while i + 32 <= row.len() {
        let mut luminance = [0u8; 32];
        for lane in 0..32 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = _mm256_loadu_si256(luminance.as_ptr().cast());
        // Per-byte `>> 2` done with a 16-bit-lane shift plus a mask: the
        // shift also leaks two bits in from each byte's upper neighbor,
        // and the mask (0x3F, exactly the range of a `u8 >> 2`) clears
        // them back out.
        let shifted = _mm256_srli_epi16(lum, 2);
        let bucket = _mm256_and_si256(shifted, mask);
        _mm256_storeu_si256(out[i..].as_mut_ptr().cast(), bucket);
        i += 32;
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
/// Caller must have confirmed `is_x86_feature_detected!("avx2")`.
#[target_feature(enable = "avx2")]
pub unsafe fn render_row(row: &[Pixel], fast_path: &[u8; 64], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + row.len(), 0);

    let quarters = [
        quarter_broadcast(fast_path, 0),
        quarter_broadcast(fast_path, 16),
        quarter_broadcast(fast_path, 32),
        quarter_broadcast(fast_path, 48),
    ];

    let mut i = 0;
    while i + 32 <= row.len() {
        let mut luminance = [0u8; 32];
        for lane in 0..32 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = _mm256_loadu_si256(luminance.as_ptr().cast());
        let shifted = _mm256_srli_epi16(lum, 2);
        let bucket = _mm256_and_si256(shifted, _mm256_set1_epi8(0x3F));
        let glyphs = lut64_gather(bucket, &quarters);

        _mm256_storeu_si256(out[start + i..].as_mut_ptr().cast(), glyphs);
        i += 32;
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
/// Caller must have confirmed `is_x86_feature_detected!("avx2")`.
#[target_feature(enable = "avx2")]
pub unsafe fn render_row_mixed_width(
    row: &[Pixel],
    glyph_planes: &[[u8; 64]; 4],
    glyph_lens: &[u8; 64],
    out: &mut Vec<u8>,
) {
    let plane_quarters: Vec<[__m256i; 4]> = glyph_planes
        .iter()
        .map(|plane| {
            [
                quarter_broadcast(plane, 0),
                quarter_broadcast(plane, 16),
                quarter_broadcast(plane, 32),
                quarter_broadcast(plane, 48),
            ]
        })
        .collect();

    let mut i = 0;
    while i + 32 <= row.len() {
        let mut luminance = [0u8; 32];
        for lane in 0..32 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = _mm256_loadu_si256(luminance.as_ptr().cast());
        let shifted = _mm256_srli_epi16(lum, 2);
        let bucket = _mm256_and_si256(shifted, _mm256_set1_epi8(0x3F));

        let mut buckets = [0u8; 32];
        _mm256_storeu_si256(buckets.as_mut_ptr().cast(), bucket);

        let mut gathered = [[0u8; 32]; 4];
        for (plane, quarters) in plane_quarters.iter().enumerate() {
            let g = lut64_gather(bucket, quarters);
            _mm256_storeu_si256(gathered[plane].as_mut_ptr().cast(), g);
        }

        for lane in 0..32 {
            let len = glyph_lens[buckets[lane] as usize] as usize;
            out.extend(gathered.iter().take(len).map(|plane| plane[lane]));
        }
        i += 32;
    }

    for lane in i..row.len() {
        let bucket = (row[lane].luminance() >> 2) as usize;
        let len = glyph_lens[bucket] as usize;
        out.extend(glyph_planes.iter().take(len).map(|plane| plane[bucket]));
    }
}

#[target_feature(enable = "avx2")]
unsafe fn quarter_broadcast(table: &[u8; 64], offset: usize) -> __m256i {
    let lane = _mm_loadu_si128(table.as_ptr().add(offset).cast());
    _mm256_broadcastsi128_si256(lane)
}

#[target_feature(enable = "avx2")]
unsafe fn lut64_gather(indices: __m256i, quarters: &[__m256i; 4]) -> __m256i {
    let low_nibble = _mm256_and_si256(indices, _mm256_set1_epi8(0x0F));
    let group = _mm256_and_si256(_mm256_srli_epi16(indices, 4), _mm256_set1_epi8(0x03));

    let r0 = _mm256_shuffle_epi8(quarters[0], low_nibble);
    let r1 = _mm256_shuffle_epi8(quarters[1], low_nibble);
    let r2 = _mm256_shuffle_epi8(quarters[2], low_nibble);
    let r3 = _mm256_shuffle_epi8(quarters[3], low_nibble);

    let is_group_1_or_3 = _mm256_cmpeq_epi8(_mm256_and_si256(group, _mm256_set1_epi8(1)), _mm256_set1_epi8(1));
    let lower_pair = _mm256_blendv_epi8(r0, r1, is_group_1_or_3);
    let upper_pair = _mm256_blendv_epi8(r2, r3, is_group_1_or_3);

    let is_high_group = _mm256_cmpgt_epi8(group, _mm256_set1_epi8(1));
    _mm256_blendv_epi8(lower_pair, upper_pair, is_high_group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_row_matches_scalar_for_arbitrary_lengths() {
        if !std::is_x86_feature_detected!("avx2") {
            return;
        }
        for len in [0usize, 1, 17, 32, 33, 64, 100] {
            let row: Vec<Pixel> =
                (0..len).map(|i| Pixel::new((i * 7) as u8, (i * 13) as u8, (i * 3) as u8)).collect();
            let scalar: Vec<u8> = row.iter().map(|p| p.luminance() >> 2).collect();
            let vectorized = unsafe { quantize_row(&row) };
            assert_eq!(scalar, vectorized);
        }
    }

    #[test]
    fn render_row_matches_fast_path_table_lookup() {
        if !std::is_x86_feature_detected!("avx2") {
            return;
        }
        let mut fast_path = [0u8; 64];
        for (bucket, byte) in fast_path.iter_mut().enumerate() {
            *byte = b'0' + (bucket % 10) as u8;
        }
        let row: Vec<Pixel> =
            (0..40).map(|i| Pixel::new((i * 5) as u8, (i * 5) as u8, (i * 5) as u8)).collect();

        let mut expected = Vec::new();
        for pixel in &row {
            expected.push(fast_path[(pixel.luminance() >> 2) as usize]);
        }

        let mut out = Vec::new();
        unsafe { render_row(&row, &fast_path, &mut out) };

        assert_eq!(out, expected);
    }

    #[test]
    fn render_row_mixed_width_matches_scalar_glyph_gather() {
        if !std::is_x86_feature_detected!("avx2") {
            return;
        }
        use crate::cache::{CacheConfig, PaletteCache};
        use crate::mode::RenderMode;
        use crate::palette::Palette;

        let palette = Palette::parse(" α♠🌟").unwrap();
        let cache = PaletteCache::new(CacheConfig::default());
        let entry = cache.lookup_or_build(&palette, RenderMode::Monochrome).unwrap();

        let row: Vec<Pixel> =
            (0..40).map(|i| Pixel::new((i * 5) as u8, (i * 7) as u8, (i * 3) as u8)).collect();

        let mut expected = Vec::new();
        for pixel in &row {
            let bucket = pixel.luminance() >> 2;
            let (glyph, _len) = entry.glyph(bucket);
            expected.extend_from_slice(glyph);
        }

        let mut out = Vec::new();
        unsafe { render_row_mixed_width(&row, entry.glyph_planes(), entry.glyph_lens(), &mut out) };

        assert_eq!(out, expected);
    }
}
