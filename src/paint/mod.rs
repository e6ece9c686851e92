//! Painting and rasterization
//!
//! This module turns laid-out lines and pages into pixels.
//!
//! # Responsibilities
//!
//! - **Glyph streams**: Batch positioned glyphs by baseline and color so
//!   each (y, foreground, background) combination becomes one stream
//! - **Painting**: Fill background spans, then draw glyph streams in
//!   chunks of at most [`MAX_GLYPHS_PER_DRAW`] glyphs per call
//! - **Rasterization**: Execute draw calls against a tiny-skia pixmap
//!
//! # Painting Order
//!
//! Within one paint call the order is fixed:
//!
//! 1. Background spans for every piece on every line
//! 2. Glyph streams, sorted by baseline, then foreground, then background
//!
//! Backgrounds never overdraw a neighbouring piece's glyphs.
//!
//! # Example
//!
//! ```rust,ignore
//! use pageflow::paint::{RasterSurface, SegmentPainter};
//!
//! let mut surface = RasterSurface::new(612, 792)?;
//! let mut painter = SegmentPainter::new(&mut surface);
//! painter.paint_page(stream.arena(), page, content_origin, column_width, gap)?;
//! surface.save_png(std::path::Path::new("page-1.png"))?;
//! ```

pub mod glyph_stream;
pub mod painter;
pub mod raster;

pub use glyph_stream::{GlyphStream, GlyphStreamSet, PaintedGlyph, MAX_GLYPHS_PER_DRAW};
pub use painter::{DrawSurface, SegmentPainter};
pub use raster::{OutlineCacheStats, RasterSurface};
