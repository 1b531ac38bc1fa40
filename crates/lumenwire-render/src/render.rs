//! The top-level render entry point: palette cache lookup, vector/scalar
//! path dispatch, and the `Frame → UTF-8 bytes` contract the rest of the
//! workspace consumes.

use lumenwire_core::{Frame, TerminalCapabilities};

use crate::cache::PaletteCache;
use crate::error::RenderError;
use crate::mode::RenderMode;
use crate::palette::Palette;
use crate::vector::{self, SelectedPath};

/// Render `frame` through `palette` in `mode`, honoring `caps`'s RLE
/// support, using the process's detected vector path when one is
/// available.
///
/// # Errors
///
/// Propagates whatever [`RenderError`] the palette cache build raised.
pub fn render(
    frame: &Frame,
    palette: &Palette,
    mode: RenderMode,
    caps: &TerminalCapabilities,
    cache: &PaletteCache,
) -> Result<Vec<u8>, RenderError> {
    let entry = cache.lookup_or_build(palette, mode)?;
    let pixels = frame.width() as usize * frame.height() as usize;
    let per_pixel = entry.glyph_lens().iter().max().copied().unwrap_or(1) as usize + 19;
    let mut out = Vec::with_capacity(pixels * per_pixel + frame.height() as usize);

    match vector::selected_path() {
        SelectedPath::Scalar => crate::scalar::render(frame, &entry, caps.supports_rle, &mut out),
        path => vector::render(path, frame, &entry, caps.supports_rle, &mut out),
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use lumenwire_core::Pixel;

    use super::*;
    use crate::cache::CacheConfig;
    use crate::mode::ColorTarget;

    #[test]
    fn render_reuses_the_cache_across_calls() {
        let cache = PaletteCache::new(CacheConfig::default());
        let palette = Palette::parse(" .:-=+*#%@").unwrap();
        let frame = Frame::new(2, 1, vec![Pixel::new(0, 0, 0), Pixel::new(255, 255, 255)]).unwrap();
        let caps = TerminalCapabilities::plain();

        render(&frame, &palette, RenderMode::Monochrome, &caps, &cache).unwrap();
        render(&frame, &palette, RenderMode::Monochrome, &caps, &cache).unwrap();

        assert_eq!(cache.stats().builds, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn no_interior_nul_across_modes() {
        let cache = PaletteCache::new(CacheConfig::default());
        let palette = Palette::parse(" α♠🌟").unwrap();
        let frame = Frame::new(
            4,
            1,
            vec![Pixel::new(0, 0, 0), Pixel::new(64, 64, 64), Pixel::new(128, 128, 128), Pixel::new(255, 255, 255)],
        )
        .unwrap();

        for mode in [
            RenderMode::Monochrome,
            RenderMode::Color256(ColorTarget::Foreground),
            RenderMode::TrueColor(ColorTarget::Foreground),
        ] {
            let caps = TerminalCapabilities::truecolor();
            let out = render(&frame, &palette, mode, &caps, &cache).unwrap();
            assert!(!out.contains(&0x00));
        }
    }

    #[test]
    fn size_stays_within_the_documented_bound() {
        let cache = PaletteCache::new(CacheConfig::default());
        let palette = Palette::parse(" α♠🌟").unwrap();
        let caps = TerminalCapabilities::truecolor();
        let width = 10;
        let height = 4;
        let pixels: Vec<Pixel> = (0..width * height)
            .map(|i| Pixel::new((i * 17) as u8, (i * 23) as u8, (i * 29) as u8))
            .collect();
        let frame = Frame::new(width, height, pixels).unwrap();

        let out =
            render(&frame, &palette, RenderMode::TrueColor(ColorTarget::Foreground), &caps, &cache)
                .unwrap();

        let max_glyph_bytes = 4;
        let max_ansi_prefix_bytes = "\x1B[38;2;255;255;255m".len();
        let bound = (width * height) as usize * (max_glyph_bytes + max_ansi_prefix_bytes)
            + height as usize * "\x1B[0m".len()
            + (height as usize - 1);
        assert!(out.len() <= bound);
    }

    /// A frame whose 64 pixels visit every quantized luminance bucket
    /// exactly once, in bucket order — `luminance(pixel) >> 2 == index`.
    fn frame_spanning_every_bucket() -> Frame {
        let pixels: Vec<Pixel> = (0..64u32)
            .map(|bucket| {
                let luminance = (bucket * 4) as u8;
                Pixel::new(luminance, luminance, luminance)
            })
            .collect();
        Frame::new(64, 1, pixels).unwrap()
    }

    proptest::proptest! {
        #[test]
        fn palette_coverage_across_every_bucket(len in 1usize..=64) {
            let source: String = (0..len).map(|i| char::from_u32(u32::from('a') + i as u32 % 26).unwrap()).collect();
            // Distinct glyphs aren't required for coverage, only a
            // well-formed non-empty palette, so repeat the alphabet — this
            // is exactly the duplicate-glyph case `find_all` exists for.
            let palette = Palette::parse(&source).unwrap();
            let cache = PaletteCache::new(CacheConfig::default());
            let frame = frame_spanning_every_bucket();
            let caps = TerminalCapabilities::plain();

            let out = render(&frame, &palette, RenderMode::Monochrome, &caps, &cache).unwrap();
            let text = std::str::from_utf8(&out).unwrap();
            let rendered: Vec<char> = text.chars().collect();
            proptest::prop_assert_eq!(rendered.len(), 64);

            let table = crate::luminance::LuminanceTable::build(len);
            for bucket in 0u8..64 {
                let expected_index = table.index_for_bucket(bucket) as usize;
                let (expected_bytes, expected_len) = palette.char_at(expected_index).unwrap();

                let mut buf = [0u8; 4];
                let observed_bytes = rendered[bucket as usize].encode_utf8(&mut buf).as_bytes();
                let observed_matches = palette.find_all(observed_bytes, observed_bytes.len() as u8);

                proptest::prop_assert!(
                    observed_matches.contains(&expected_index),
                    "bucket {bucket} expected palette index {expected_index} (glyph {:?}), \
                     but the rendered glyph's find_all set was {observed_matches:?}",
                    std::str::from_utf8(expected_bytes).unwrap(),
                );
            }
        }
    }
}
