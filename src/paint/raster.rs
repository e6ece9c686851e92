//! tiny-skia raster surface
//!
//! [`RasterSurface`] implements [`DrawSurface`] on top of a tiny-skia
//! [`Pixmap`]. Glyphs are rasterized from ttf-parser outlines; built paths
//! are kept in an LRU cache keyed by face and glyph id so repeated glyphs
//! (body text) skip outline extraction. Glyphs without an outline (spaces,
//! some control glyphs) are cached as `None`.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;
use tiny_skia::{FillRule, Paint, Pixmap, Transform};

use crate::color::Color;
use crate::error::{RenderError, Result};
use crate::font::FontFace;
use crate::geometry::Rect;
use crate::paint::glyph_stream::PaintedGlyph;
use crate::paint::painter::DrawSurface;

/// Outline cache capacity in glyphs. Body text rarely uses more than a few
/// hundred distinct glyphs per face.
const OUTLINE_CACHE_SIZE: usize = 512;

/// Hit/miss counters for the glyph outline cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutlineCacheStats {
  pub hits: u64,
  pub misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OutlineKey {
  /// Address of the face's data allocation. Stable for the lifetime of the
  /// `Arc`, which every cached glyph's face outlives.
  face_ptr: usize,
  face_index: u32,
  glyph_id: u16,
}

/// A CPU raster target backed by a tiny-skia [`Pixmap`].
pub struct RasterSurface {
  pixmap: Pixmap,
  outlines: LruCache<OutlineKey, Option<tiny_skia::Path>>,
  stats: OutlineCacheStats,
}

impl RasterSurface {
  /// Creates a transparent surface of `width` x `height` pixels.
  pub fn new(width: u32, height: u32) -> Result<RasterSurface> {
    let pixmap = Pixmap::new(width, height)
      .ok_or(RenderError::SurfaceCreationFailed { width, height })?;
    let capacity = NonZeroUsize::new(OUTLINE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
    Ok(RasterSurface {
      pixmap,
      outlines: LruCache::new(capacity),
      stats: OutlineCacheStats::default(),
    })
  }

  pub fn width(&self) -> u32 {
    self.pixmap.width()
  }

  pub fn height(&self) -> u32 {
    self.pixmap.height()
  }

  /// Fills the whole surface with `color`.
  pub fn clear(&mut self, color: Color) {
    self
      .pixmap
      .fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
  }

  pub fn pixmap(&self) -> &Pixmap {
    &self.pixmap
  }

  pub fn into_pixmap(self) -> Pixmap {
    self.pixmap
  }

  pub fn cache_stats(&self) -> OutlineCacheStats {
    self.stats
  }

  /// Encodes the surface as a PNG in memory.
  pub fn encode_png(&self) -> Result<Vec<u8>> {
    self.pixmap.encode_png().map_err(|e| {
      RenderError::EncodeFailed {
        format: "PNG".to_string(),
        reason: e.to_string(),
      }
      .into()
    })
  }

  /// Encodes the surface as a PNG and writes it to `path`.
  pub fn save_png(&self, path: &Path) -> Result<()> {
    let data = self.encode_png()?;
    std::fs::write(path, data)?;
    Ok(())
  }
}

impl DrawSurface for RasterSurface {
  fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
    let Some(sk_rect) =
      tiny_skia::Rect::from_xywh(rect.x(), rect.y(), rect.width(), rect.height())
    else {
      // Degenerate rects paint nothing.
      return Ok(());
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    self
      .pixmap
      .fill_rect(sk_rect, &paint, Transform::identity(), None);
    Ok(())
  }

  fn draw_glyph_run(
    &mut self,
    face: &FontFace,
    font_size: f32,
    glyphs: &[PaintedGlyph],
    color: Color,
  ) -> Result<()> {
    let data = face.data();
    let face_ptr = Arc::as_ptr(&data) as usize;
    let scale = font_size / face.units_per_em() as f32;

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;

    for glyph in glyphs {
      let key = OutlineKey {
        face_ptr,
        face_index: face.index(),
        glyph_id: glyph.id,
      };
      if self.outlines.contains(&key) {
        self.stats.hits += 1;
      } else {
        self.stats.misses += 1;
        self.outlines.put(key, build_outline(face, glyph.id));
      }
      let Some(Some(path)) = self.outlines.get(&key) else {
        continue;
      };
      // Font units are Y-up; the surface is Y-down. Flip around the
      // baseline while scaling.
      let transform = Transform::from_row(scale, 0.0, 0.0, -scale, glyph.x, glyph.y);
      self
        .pixmap
        .fill_path(path, &paint, FillRule::Winding, transform, None);
    }
    Ok(())
  }
}

fn build_outline(face: &FontFace, glyph_id: u16) -> Option<tiny_skia::Path> {
  let mut builder = OutlinePathBuilder::new();
  face
    .shaper()
    .outline_glyph(ttf_parser::GlyphId(glyph_id), &mut builder)?;
  builder.finish()
}

/// Adapts ttf-parser outline callbacks onto a tiny-skia path.
struct OutlinePathBuilder {
  builder: tiny_skia::PathBuilder,
}

impl OutlinePathBuilder {
  fn new() -> OutlinePathBuilder {
    OutlinePathBuilder {
      builder: tiny_skia::PathBuilder::new(),
    }
  }

  fn finish(self) -> Option<tiny_skia::Path> {
    self.builder.finish()
  }
}

impl ttf_parser::OutlineBuilder for OutlinePathBuilder {
  fn move_to(&mut self, x: f32, y: f32) {
    self.builder.move_to(x, y);
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.builder.line_to(x, y);
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.builder.quad_to(x1, y1, x, y);
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.builder.cubic_to(x1, y1, x2, y2, x, y);
  }

  fn close(&mut self) {
    self.builder.close();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::font::{FontCache, FontLibrary};

  fn any_face() -> Option<Arc<FontFace>> {
    let library = FontLibrary::new();
    if library.is_empty() {
      return None;
    }
    let mut cache = FontCache::new(library);
    cache.font_face("sans-serif", false, false).ok()
  }

  #[test]
  fn test_zero_dimension_surface_is_rejected() {
    let result = RasterSurface::new(0, 16);
    assert!(matches!(
      result,
      Err(Error::Render(RenderError::SurfaceCreationFailed { .. }))
    ));
  }

  #[test]
  fn test_fill_rect_writes_pixels() {
    let mut surface = RasterSurface::new(10, 10).unwrap();
    surface.clear(Color::WHITE);
    surface
      .fill_rect(Rect::from_xywh(2.0, 2.0, 4.0, 4.0), Color::rgb(255, 0, 0))
      .unwrap();

    let inside = surface.pixmap().pixel(3, 3).unwrap();
    assert_eq!(inside.red(), 255);
    assert_eq!(inside.green(), 0);

    let outside = surface.pixmap().pixel(0, 0).unwrap();
    assert_eq!(outside.green(), 255);
  }

  #[test]
  fn test_degenerate_rect_is_skipped() {
    let mut surface = RasterSurface::new(10, 10).unwrap();
    surface
      .fill_rect(Rect::from_xywh(2.0, 2.0, 0.0, 4.0), Color::BLACK)
      .unwrap();
    assert!(surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
  }

  #[test]
  fn test_glyph_run_marks_pixels() {
    let Some(face) = any_face() else {
      return;
    };
    let Some(id) = face.glyph_index('H') else {
      return;
    };
    let mut surface = RasterSurface::new(64, 64).unwrap();
    let glyphs = [PaintedGlyph {
      id,
      x: 10.0,
      y: 48.0,
    }];
    surface.draw_glyph_run(&face, 32.0, &glyphs, Color::BLACK).unwrap();

    let inked = surface
      .pixmap()
      .pixels()
      .iter()
      .filter(|p| p.alpha() > 0)
      .count();
    assert!(inked > 0, "glyph left no ink");
  }

  #[test]
  fn test_outline_cache_reuses_paths() {
    let Some(face) = any_face() else {
      return;
    };
    let Some(id) = face.glyph_index('H') else {
      return;
    };
    let mut surface = RasterSurface::new(64, 64).unwrap();
    let glyphs = [PaintedGlyph {
      id,
      x: 10.0,
      y: 48.0,
    }];
    surface.draw_glyph_run(&face, 32.0, &glyphs, Color::BLACK).unwrap();
    assert_eq!(surface.cache_stats(), OutlineCacheStats { hits: 0, misses: 1 });

    surface.draw_glyph_run(&face, 32.0, &glyphs, Color::BLACK).unwrap();
    assert_eq!(surface.cache_stats(), OutlineCacheStats { hits: 1, misses: 1 });
  }

  #[test]
  fn test_png_encoding_starts_with_magic() {
    let mut surface = RasterSurface::new(4, 4).unwrap();
    surface.clear(Color::WHITE);
    let data = surface.encode_png().unwrap();
    assert_eq!(&data[..4], &[0x89, b'P', b'N', b'G']);
  }
}
