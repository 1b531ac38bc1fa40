//! Palette cache: amortizes building per-`(palette, mode)` lookup tables
//! across frames.
//!
//! The cache is guarded by a single reader-writer lock over the key→slot
//! map; each slot is its own [`OnceLock`], so at most one thread ever
//! builds a given key, and a thread that loses the race blocks on the
//! winner's build instead of spinning or retrying. A double-check happens
//! naturally on the upgrade from read lock to write lock: `entry().or_insert_with`
//! only creates a fresh slot if one still isn't present once the write
//! lock is held.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::RenderError;
use crate::luminance::LuminanceTable;
use crate::mode::RenderMode;
use crate::palette::Palette;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    palette_bytes: Vec<u8>,
    mode: RenderMode,
}

/// Precomputed per-bucket glyph lookup tables for one `(palette, mode)`
/// pair.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    glyph_bytes: [[u8; 4]; 64],
    glyph_len: [u8; 64],
    fast_path: Option<[u8; 64]>,
    glyph_planes: [[u8; 64]; 4],
    mode: RenderMode,
}

impl CacheEntry {
    fn build(palette: &Palette, mode: RenderMode) -> Result<Self, RenderError> {
        let table = LuminanceTable::build(palette.len());
        let mut glyph_bytes = [[0u8; 4]; 64];
        let mut glyph_len = [0u8; 64];

        for bucket in 0..64u8 {
            let index = table.index_for_bucket(bucket) as usize;
            let Some((bytes, len)) = palette.char_at(index) else {
                unreachable!("the luminance table never returns an index outside the palette");
            };
            glyph_bytes[bucket as usize][..bytes.len()].copy_from_slice(bytes);
            glyph_len[bucket as usize] = len;
        }

        let fast_path = palette.is_uniform_1byte().then(|| {
            let mut fast = [0u8; 64];
            for (bucket, byte) in fast.iter_mut().enumerate() {
                *byte = glyph_bytes[bucket][0];
            }
            fast
        });

        // One 64-entry table per byte position, so a mixed-width palette's
        // bucket → glyph gather can run through the same per-lane table
        // lookup the uniform-1-byte fast path uses, one plane at a time,
        // instead of falling back to a scalar `glyph(bucket)` per pixel.
        let mut glyph_planes = [[0u8; 64]; 4];
        for (bucket, bytes) in glyph_bytes.iter().enumerate() {
            for (plane, byte) in bytes.iter().enumerate() {
                glyph_planes[plane][bucket] = *byte;
            }
        }

        Ok(Self { glyph_bytes, glyph_len, fast_path, glyph_planes, mode })
    }

    /// The glyph bytes and byte length for a quantized luminance bucket.
    #[must_use]
    pub fn glyph(&self, bucket: u8) -> (&[u8], u8) {
        let len = self.glyph_len[bucket as usize & 0x3F];
        (&self.glyph_bytes[bucket as usize & 0x3F][..len as usize], len)
    }

    /// The full 64-entry glyph-byte table, also usable as a vector path's
    /// shuffle-gather source for mixed-width palettes.
    #[must_use]
    pub fn glyph_bytes(&self) -> &[[u8; 4]; 64] {
        &self.glyph_bytes
    }

    /// The full 64-entry glyph-length table.
    #[must_use]
    pub fn glyph_lens(&self) -> &[u8; 64] {
        &self.glyph_len
    }

    /// The compact one-byte-per-bucket table, present only when every
    /// glyph in the palette is a single byte.
    #[must_use]
    pub fn fast_path(&self) -> Option<&[u8; 64]> {
        self.fast_path.as_ref()
    }

    /// The 64-entry glyph-byte table split into four byte-position planes
    /// (`glyph_planes()[plane][bucket] == glyph_bytes()[bucket][plane]`),
    /// so a vector path can gather one plane at a time with the same
    /// table-lookup technique [`Self::fast_path`] uses, regardless of
    /// glyph width.
    #[must_use]
    pub fn glyph_planes(&self) -> &[[u8; 64]; 4] {
        &self.glyph_planes
    }

    /// The rendering mode this entry was built for.
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }
}

type Slot = Arc<OnceLock<Result<Arc<CacheEntry>, RenderError>>>;

/// Tunables for a [`PaletteCache`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheConfig {
    /// Advisory capacity. The cache never evicts on its own (the renderer
    /// names no eviction policy); a caller that wants one can poll
    /// [`PaletteCache::is_at_capacity`] and call [`PaletteCache::drop_all`].
    pub max_entries: Option<usize>,
}

/// Observability counters for a [`PaletteCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of times a build actually ran.
    pub builds: u64,
    /// Number of lookups that reused an already-published entry.
    pub hits: u64,
}

/// Process-wide cache of per-`(palette, mode)` lookup tables. Safe to
/// share across threads; building is synchronous on whichever caller's
/// lookup misses first.
pub struct PaletteCache {
    slots: RwLock<HashMap<CacheKey, Slot>>,
    config: CacheConfig,
    stats: RwLock<CacheStats>,
}

impl PaletteCache {
    /// An empty cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            config,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Look up the entry for `(palette, mode)`, building it if this is the
    /// first request for that key.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`RenderError`] the build raised. If a previous
    /// build for this key failed, the same failure is returned again
    /// without retrying.
    pub fn lookup_or_build(
        &self,
        palette: &Palette,
        mode: RenderMode,
    ) -> Result<Arc<CacheEntry>, RenderError> {
        let key = CacheKey { palette_bytes: palette.bytes().to_vec(), mode };

        let existing = {
            let slots = self.slots.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            slots.get(&key).cloned()
        };
        let slot = existing.unwrap_or_else(|| {
            let mut slots = self.slots.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            slots.entry(key).or_insert_with(|| Arc::new(OnceLock::new())).clone()
        });

        let mut built = false;
        let result = slot.get_or_init(|| {
            built = true;
            CacheEntry::build(palette, mode).map(Arc::new)
        });

        if built {
            tracing::debug!(palette_len = palette.len(), mode = ?mode, "built palette cache entry");
        }

        let mut stats = self.stats.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if built {
            stats.builds += 1;
        } else {
            stats.hits += 1;
        }
        drop(stats);

        result.clone()
    }

    /// Drop every published entry. Only safe to call when no render calls
    /// are in flight against this cache.
    pub fn drop_all(&self) {
        let mut slots = self.slots.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        slots.clear();
    }

    /// Number of distinct `(palette, mode)` keys currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `len()` has reached the configured `max_entries`, if any.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.config.max_entries.is_some_and(|max| self.len() >= max)
    }

    /// Current build/hit counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
