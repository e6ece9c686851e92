//! Glyph stream batching
//!
//! Drawing one glyph at a time wastes draw calls. A [`GlyphStreamSet`]
//! groups every glyph submitted for a paint pass into streams keyed by
//! `(face, size, baseline y, foreground, background)`, so each stream can
//! be drawn with one call per chunk. Stream order is deterministic:
//! baseline y ascending, then foreground, then background; glyphs within a
//! stream are sorted by ascending x.
//!
//! Callers must still split a stream into chunks of at most
//! [`MAX_GLYPHS_PER_DRAW`] glyphs per draw call; see
//! `SegmentPainter::paint_page`.

use crate::color::Color;
use crate::font::FontFace;
use crate::text::PositionedGlyph;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Upper bound on glyphs passed to a single [`DrawSurface`] call.
///
/// [`DrawSurface`]: crate::paint::DrawSurface
pub const MAX_GLYPHS_PER_DRAW: usize = 256;

/// One glyph ready to draw, in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintedGlyph {
  pub id: u16,
  pub x: f32,
  /// Device baseline y for this glyph, vertical offset applied.
  pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StreamKey {
  face_ptr: usize,
  face_index: u32,
  size_bits: u32,
  y_bits: u32,
  fore: Color,
  back: Color,
}

/// Glyphs sharing a face, size, baseline, and color pair.
#[derive(Debug)]
pub struct GlyphStream {
  face: Arc<FontFace>,
  font_size: f32,
  pub baseline_y: f32,
  pub fore: Color,
  pub back: Color,
  glyphs: Vec<PaintedGlyph>,
}

impl GlyphStream {
  pub fn face(&self) -> &Arc<FontFace> {
    &self.face
  }

  pub fn font_size(&self) -> f32 {
    self.font_size
  }

  /// Glyphs in ascending x order (after [`GlyphStreamSet::finish`]).
  pub fn glyphs(&self) -> &[PaintedGlyph] {
    &self.glyphs
  }
}

/// Accumulates glyph runs for one paint pass and hands back sorted streams.
#[derive(Debug, Default)]
pub struct GlyphStreamSet {
  streams: Vec<GlyphStream>,
  index: FxHashMap<StreamKey, usize>,
}

impl GlyphStreamSet {
  pub fn new() -> GlyphStreamSet {
    GlyphStreamSet::default()
  }

  pub fn is_empty(&self) -> bool {
    self.streams.is_empty()
  }

  /// Number of distinct streams accumulated so far.
  pub fn stream_count(&self) -> usize {
    self.streams.len()
  }

  /// Adds a shaped run's glyphs at a device position. `origin_x` is the
  /// device x of the run's left edge and `baseline_y` the device baseline.
  pub fn push_run(
    &mut self,
    face: &Arc<FontFace>,
    font_size: f32,
    origin_x: f32,
    baseline_y: f32,
    fore: Color,
    back: Color,
    glyphs: &[PositionedGlyph],
  ) {
    if glyphs.is_empty() {
      return;
    }
    let key = StreamKey {
      face_ptr: Arc::as_ptr(face) as usize,
      face_index: face.index(),
      size_bits: font_size.to_bits(),
      y_bits: baseline_y.to_bits(),
      fore,
      back,
    };
    let slot = *self.index.entry(key).or_insert_with(|| {
      self.streams.push(GlyphStream {
        face: Arc::clone(face),
        font_size,
        baseline_y,
        fore,
        back,
        glyphs: Vec::new(),
      });
      self.streams.len() - 1
    });
    let stream = &mut self.streams[slot];
    stream.glyphs.extend(glyphs.iter().map(|glyph| PaintedGlyph {
      id: glyph.id,
      x: origin_x + glyph.x,
      // Glyph offsets are positive upward; device y grows downward.
      y: baseline_y - glyph.y_offset,
    }));
  }

  /// Sorts and returns the streams in draw order.
  pub fn finish(mut self) -> Vec<GlyphStream> {
    for stream in &mut self.streams {
      stream.glyphs.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    self.streams.sort_by(|a, b| {
      a.baseline_y
        .total_cmp(&b.baseline_y)
        .then(a.fore.cmp(&b.fore))
        .then(a.back.cmp(&b.back))
        .then((Arc::as_ptr(&a.face) as usize).cmp(&(Arc::as_ptr(&b.face) as usize)))
        .then(a.font_size.total_cmp(&b.font_size))
    });
    self.streams
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::font::library::{FontLibrary, FontStyle, FontWeight};

  fn any_face() -> Option<Arc<FontFace>> {
    let library = FontLibrary::new();
    let id = library.query("sans-serif", FontWeight::NORMAL, FontStyle::Normal)?;
    let loaded = library.load(id)?;
    FontFace::parse(loaded.data, loaded.index, loaded.family, false, false)
      .ok()
      .map(Arc::new)
  }

  fn glyph(id: u16, x: f32) -> PositionedGlyph {
    PositionedGlyph {
      id,
      x,
      y_offset: 0.0,
      advance: 8.0,
      cluster_byte: 0,
    }
  }

  #[test]
  fn test_distinct_keys_make_distinct_streams() {
    let Some(face) = any_face() else {
      return;
    };
    let mut set = GlyphStreamSet::new();
    let run = [glyph(1, 0.0), glyph(2, 8.0)];
    // Three distinct (baseline, fore, back) combinations, one repeated.
    set.push_run(&face, 12.0, 0.0, 10.0, Color::BLACK, Color::TRANSPARENT, &run);
    set.push_run(&face, 12.0, 20.0, 10.0, Color::BLACK, Color::TRANSPARENT, &run);
    set.push_run(&face, 12.0, 0.0, 10.0, Color::rgb(255, 0, 0), Color::TRANSPARENT, &run);
    set.push_run(&face, 12.0, 0.0, 20.0, Color::BLACK, Color::TRANSPARENT, &run);

    assert_eq!(set.stream_count(), 3);
    let streams = set.finish();
    assert_eq!(streams.len(), 3);
    // The repeated key merged its glyphs into one stream.
    let merged = streams
      .iter()
      .find(|s| s.baseline_y == 10.0 && s.fore == Color::BLACK)
      .unwrap();
    assert_eq!(merged.glyphs().len(), 4);
  }

  #[test]
  fn test_streams_sorted_by_y_then_colors() {
    let Some(face) = any_face() else {
      return;
    };
    let mut set = GlyphStreamSet::new();
    let run = [glyph(1, 0.0)];
    let red = Color::rgb(255, 0, 0);
    set.push_run(&face, 12.0, 0.0, 30.0, Color::BLACK, Color::TRANSPARENT, &run);
    set.push_run(&face, 12.0, 0.0, 10.0, red, Color::TRANSPARENT, &run);
    set.push_run(&face, 12.0, 0.0, 10.0, Color::BLACK, Color::TRANSPARENT, &run);

    let streams = set.finish();
    assert_eq!(streams.len(), 3);
    assert_eq!(streams[0].baseline_y, 10.0);
    assert_eq!(streams[0].fore, Color::BLACK, "fore ties broken by color order");
    assert_eq!(streams[1].baseline_y, 10.0);
    assert_eq!(streams[1].fore, red);
    assert_eq!(streams[2].baseline_y, 30.0);
  }

  #[test]
  fn test_glyphs_sorted_by_x_within_stream() {
    let Some(face) = any_face() else {
      return;
    };
    let mut set = GlyphStreamSet::new();
    // Two runs pushed right-to-left; the stream must come out left-to-right.
    set.push_run(
      &face,
      12.0,
      50.0,
      10.0,
      Color::BLACK,
      Color::TRANSPARENT,
      &[glyph(3, 0.0), glyph(4, 8.0)],
    );
    set.push_run(
      &face,
      12.0,
      0.0,
      10.0,
      Color::BLACK,
      Color::TRANSPARENT,
      &[glyph(1, 0.0), glyph(2, 8.0)],
    );

    let streams = set.finish();
    assert_eq!(streams.len(), 1);
    let xs: Vec<f32> = streams[0].glyphs().iter().map(|g| g.x).collect();
    assert_eq!(xs, vec![0.0, 8.0, 50.0, 58.0]);
  }

  #[test]
  fn test_vertical_offset_maps_to_device_y() {
    let Some(face) = any_face() else {
      return;
    };
    let mut set = GlyphStreamSet::new();
    let raised = PositionedGlyph {
      id: 9,
      x: 0.0,
      y_offset: 3.0,
      advance: 8.0,
      cluster_byte: 0,
    };
    set.push_run(
      &face,
      12.0,
      0.0,
      100.0,
      Color::BLACK,
      Color::TRANSPARENT,
      &[raised],
    );
    let streams = set.finish();
    assert_eq!(streams[0].glyphs()[0].y, 97.0);
  }

  #[test]
  fn test_empty_runs_are_ignored() {
    let Some(face) = any_face() else {
      return;
    };
    let mut set = GlyphStreamSet::new();
    set.push_run(&face, 12.0, 0.0, 10.0, Color::BLACK, Color::TRANSPARENT, &[]);
    assert!(set.is_empty());
    assert!(set.finish().is_empty());
  }
}
