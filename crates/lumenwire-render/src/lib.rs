//! ASCII rendering engine for lumenwire: turns an RGB [`Frame`] into a
//! UTF-8 byte string of glyphs and (optionally) ANSI color escapes.
//!
//! The pipeline is palette → luminance table → cache → scalar or vector
//! renderer → ANSI writer. [`cache::PaletteCache`] is the only piece of
//! process-wide mutable state; every other type here is a plain,
//! synchronous value with no internal thread pool, matching the
//! component's "runs on the calling thread" contract.

#![deny(missing_docs)]

pub mod ansi;
pub mod cache;
pub mod error;
pub mod luminance;
pub mod mode;
pub mod palette;
mod render;
pub mod scalar;
pub mod vector;

pub use cache::{CacheConfig, CacheEntry, CacheStats, PaletteCache};
pub use error::RenderError;
pub use luminance::LuminanceTable;
pub use mode::{ColorTarget, RenderMode};
pub use palette::{GlyphSpan, Palette};
pub use render::render;
pub use vector::SelectedPath;

pub use lumenwire_core::{Frame, FrameError, Pixel, TerminalCapabilities};
