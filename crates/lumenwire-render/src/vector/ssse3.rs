//! 128-bit (SSSE3) monochrome vector path: 16 pixels per iteration. Used
//! on x86_64 hosts without AVX2, and as the AVX2 path's scalar-sized
//! sibling when a row's tail is shorter than 32 pixels but still at least
//! 16. Mixed-width palettes use [`render_row_mixed_width`], which gathers
//! one byte plane at a time with the same technique as the uniform-1-byte
//! fast path.

use std::arch::x86_64::*;

use lumenwire_core::Pixel;

/// Quantized luminance bucket (`0..=63`) for every pixel in `row`, 16
/// lanes per iteration with a scalar remainder.
///
/// # Safety
///
/// Caller must have confirmed `is_x86_feature_detected!("ssse3")`.
#[target_feature(enable = "ssse3")]
pub unsafe fn quantize_row(row: &[Pixel]) -> Vec<u8> {
    let mut out = vec![0u8; row.len()];
    let mask = _mm_set1_epi8(0x3F);

    let mut i = 0;
    while i + 16 <= row.len() {
        let mut luminance = [0u8; 16];
        for lane in 0..16 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = _mm_loadu_si128(luminance.as_ptr().cast());
        let shifted = _mm_srli_epi16(lum, 2);
        let bucket = _mm_and_si128(shifted, mask);
        _mm_storeu_si128(out[i..].as_mut_ptr().cast(), bucket);
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
/// Caller must have confirmed `is_x86_feature_detected!("ssse3")`.
#[target_feature(enable = "ssse3")]
pub unsafe fn render_row(row: &[Pixel], fast_path: &[u8; 64], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + row.len(), 0);

    let quarters = [
        _mm_loadu_si128(fast_path.as_ptr().cast()),
        _mm_loadu_si128(fast_path.as_ptr().add(16).cast()),
        _mm_loadu_si128(fast_path.as_ptr().add(32).cast()),
        _mm_loadu_si128(fast_path.as_ptr().add(48).cast()),
    ];

    let mut i = 0;
    while i + 16 <= row.len() {
        let mut luminance = [0u8; 16];
        for lane in 0..16 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = _mm_loadu_si128(luminance.as_ptr().cast());
        let shifted = _mm_srli_epi16(lum, 2);
        let bucket = _mm_and_si128(shifted, _mm_set1_epi8(0x3F));
        let glyphs = lut64_gather(bucket, &quarters);

        _mm_storeu_si128(out[start + i..].as_mut_ptr().cast(), glyphs);
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
/// Caller must have confirmed `is_x86_feature_detected!("ssse3")`.
#[target_feature(enable = "ssse3")]
pub unsafe fn render_row_mixed_width(
    row: &[Pixel],
    glyph_planes: &[[u8; 64]; 4],
    glyph_lens: &[u8; 64],
    out: &mut Vec<u8>,
) {
    let plane_quarters: Vec<[__m128i; 4]> = glyph_planes
        .iter()
        .map(|plane| {
            [
                _mm_loadu_si128(plane.as_ptr().cast()),
                _mm_loadu_si128(plane.as_ptr().add(16).cast()),
                _mm_loadu_si128(plane.as_ptr().add(32).cast()),
                _mm_loadu_si128(plane.as_ptr().add(48).cast()),
            ]
        })
        .collect();

    let mut i = 0;
    while i + 16 <= row.len() {
        let mut luminance = [0u8; 16];
        for lane in 0..16 {
            luminance[lane] = row[i + lane].luminance();
        }
        let lum = _mm_loadu_si128(luminance.as_ptr().cast());
        let shifted = _mm_srli_epi16(lum, 2);
        let bucket = _mm_and_si128(shifted, _mm_set1_epi8(0x3F));

        let mut buckets = [0u8; 16];
        _mm_storeu_si128(buckets.as_mut_ptr().cast(), bucket);

        let mut gathered = [[0u8; 16]; 4];
        for (plane, quarters) in plane_quarters.iter().enumerate() {
            let g = lut64_gather(bucket, quarters);
            _mm_storeu_si128(gathered[plane].as_mut_ptr().cast(), g);
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

/// Gather a 64-entry table through four 16-entry `pshufb` lookups,
/// selecting the right quarter per lane with the index's top two bits —
/// the same technique as [`super::avx2::lut64_gather`], at half the lane
/// width and with no cross-128-bit broadcast needed.
#[target_feature(enable = "ssse3")]
unsafe fn lut64_gather(indices: __m128i, quarters: &[__m128i; 4]) -> __m128i {
    let low_nibble = _mm_and_si128(indices, _mm_set1_epi8(0x0F));
    let group = _mm_and_si128(_mm_srli_epi16(indices, 4), _mm_set1_epi8(0x03));

    let r0 = _mm_shuffle_epi8(quarters[0], low_nibble);
    let r1 = _mm_shuffle_epi8(quarters[1], low_nibble);
    let r2 = _mm_shuffle_epi8(quarters[2], low_nibble);
    let r3 = _mm_shuffle_epi8(quarters[3], low_nibble);

    let is_group_1_or_3 = _mm_cmpeq_epi8(_mm_and_si128(group, _mm_set1_epi8(1)), _mm_set1_epi8(1));
    let lower_pair = blend(r0, r1, is_group_1_or_3);
    let upper_pair = blend(r2, r3, is_group_1_or_3);

    let is_high_group = _mm_cmpgt_epi8(group, _mm_set1_epi8(1));
    blend(lower_pair, upper_pair, is_high_group)
}

/// SSSE3 has no `blendv`-style select (that's SSE4.1); emulate it with
/// and/andnot/or over the comparison mask.
#[target_feature(enable = "ssse3")]
unsafe fn blend(a: __m128i, b: __m128i, mask: __m128i) -> __m128i {
    _mm_or_si128(_mm_and_si128(mask, b), _mm_andnot_si128(mask, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_row_matches_scalar_for_arbitrary_lengths() {
        if !std::is_x86_feature_detected!("ssse3") {
            return;
        }
        for len in [0usize, 1, 15, 16, 17, 31, 48] {
            let row: Vec<Pixel> =
                (0..len).map(|i| Pixel::new((i * 7) as u8, (i * 13) as u8, (i * 3) as u8)).collect();
            let scalar: Vec<u8> = row.iter().map(|p| p.luminance() >> 2).collect();
            let vectorized = unsafe { quantize_row(&row) };
            assert_eq!(scalar, vectorized);
        }
    }

    #[test]
    fn render_row_matches_fast_path_table_lookup() {
        if !std::is_x86_feature_detected!("ssse3") {
            return;
        }
        let mut fast_path = [0u8; 64];
        for (bucket, byte) in fast_path.iter_mut().enumerate() {
            *byte = b'a' + (bucket % 26) as u8;
        }
        let row: Vec<Pixel> =
            (0..20).map(|i| Pixel::new((i * 11) as u8, (i * 11) as u8, (i * 11) as u8)).collect();

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
        if !std::is_x86_feature_detected!("ssse3") {
            return;
        }
        use crate::cache::{CacheConfig, PaletteCache};
        use crate::mode::RenderMode;
        use crate::palette::Palette;

        let palette = Palette::parse(" α♠🌟").unwrap();
        let cache = PaletteCache::new(CacheConfig::default());
        let entry = cache.lookup_or_build(&palette, RenderMode::Monochrome).unwrap();

        let row: Vec<Pixel> =
            (0..30).map(|i| Pixel::new((i * 5) as u8, (i * 7) as u8, (i * 3) as u8)).collect();

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
