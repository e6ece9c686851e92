//! Segment and page painting
//!
//! The painter turns laid-out lines into draw calls against a
//! [`DrawSurface`]. Painting is two-phase within one call: every background
//! span and leaf fill is painted first, then the foreground glyph streams
//! are drawn in stream order, so a selection highlight behind one piece
//! never overdraws a neighbouring piece's glyphs.
//!
//! Glyph draw calls are always chunked to [`MAX_GLYPHS_PER_DRAW`].

use crate::color::Color;
use crate::error::Result;
use crate::font::FontFace;
use crate::geometry::{Point, Rect};
use crate::layout::box_tree::{BoxArena, BoxKind};
use crate::layout::page::Page;
use crate::layout::paragraph::Line;
use crate::paint::glyph_stream::{GlyphStreamSet, PaintedGlyph, MAX_GLYPHS_PER_DRAW};

/// Sink for paint operations. Implementations draw filled rectangles and
/// glyph runs; everything above this trait is surface-agnostic.
///
/// `draw_glyph_run` is never called with more than [`MAX_GLYPHS_PER_DRAW`]
/// glyphs.
pub trait DrawSurface {
  fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

  fn draw_glyph_run(
    &mut self,
    face: &FontFace,
    font_size: f32,
    glyphs: &[PaintedGlyph],
    color: Color,
  ) -> Result<()>;
}

/// Paints lines and pages onto a [`DrawSurface`].
pub struct SegmentPainter<'a> {
  surface: &'a mut dyn DrawSurface,
}

impl<'a> SegmentPainter<'a> {
  pub fn new(surface: &'a mut dyn DrawSurface) -> SegmentPainter<'a> {
    SegmentPainter { surface }
  }

  /// Paints one line so its top-left lands at `origin`.
  pub fn paint_line(&mut self, line: &Line, origin: Point) -> Result<()> {
    let mut set = GlyphStreamSet::new();
    let mut backgrounds = Vec::new();
    collect_line(
      line,
      origin.x - line.left,
      origin.y - line.top,
      &mut set,
      &mut backgrounds,
    );
    self.flush(set, backgrounds)
  }

  /// Paints a laid-out page. `content_origin` is the device position of the
  /// page's content rectangle; column slices of the strip are placed left
  /// to right, `column_width` apart plus `column_gap`.
  pub fn paint_page(
    &mut self,
    arena: &BoxArena,
    page: &Page,
    content_origin: Point,
    column_width: f32,
    column_gap: f32,
  ) -> Result<()> {
    let mut set = GlyphStreamSet::new();
    let mut backgrounds = Vec::new();
    for (column_index, column) in page.columns.iter().enumerate() {
      let dx = content_origin.x + column_index as f32 * (column_width + column_gap);
      let dy = content_origin.y - column.ys_start;
      for line_ref in &column.lines {
        let node = arena.get(line_ref.owner)?;
        match &node.kind {
          BoxKind::Paragraph(para) => {
            let line = &para.lines()[line_ref.line_index];
            collect_line(line, dx, dy, &mut set, &mut backgrounds);
          }
          BoxKind::Leaf(leaf) => {
            if !leaf.fill.is_transparent() {
              backgrounds.push((node.rect().translate(dx, dy), leaf.fill));
            }
          }
          // Containers never own lines.
          BoxKind::Pile(_) | BoxKind::Row(_) => {}
        }
      }
    }
    self.flush(set, backgrounds)
  }

  fn flush(&mut self, set: GlyphStreamSet, backgrounds: Vec<(Rect, Color)>) -> Result<()> {
    for (rect, color) in backgrounds {
      self.surface.fill_rect(rect, color)?;
    }
    for stream in set.finish() {
      for chunk in stream.glyphs().chunks(MAX_GLYPHS_PER_DRAW) {
        self
          .surface
          .draw_glyph_run(stream.face(), stream.font_size(), chunk, stream.fore)?;
      }
    }
    Ok(())
  }
}

fn collect_line(
  line: &Line,
  dx: f32,
  dy: f32,
  set: &mut GlyphStreamSet,
  backgrounds: &mut Vec<(Rect, Color)>,
) {
  let top = line.top + dy;
  let baseline = top + line.ascent;
  for piece in &line.pieces {
    let x = piece.x + dx;
    if !piece.back.is_transparent() {
      backgrounds.push((
        Rect::from_xywh(x, top, piece.segment.advance(), line.ascent + line.descent),
        piece.back,
      ));
    }
    set.push_run(
      piece.segment.face(),
      piece.segment.font_size(),
      x,
      baseline,
      piece.fore,
      piece.back,
      piece.segment.glyphs(),
    );
  }
}

#[cfg(test)]
pub(crate) mod recording {
  use super::*;

  #[derive(Debug, Clone, Copy)]
  pub struct GlyphCall {
    pub count: usize,
    pub color: Color,
    pub min_x: f32,
    pub max_x: f32,
  }

  /// Records paint calls for assertions instead of rasterizing.
  #[derive(Debug, Default)]
  pub struct RecordingSurface {
    pub rects: Vec<(Rect, Color)>,
    pub glyph_calls: Vec<GlyphCall>,
    /// Call sequence tags: `'r'` for rects, `'g'` for glyph runs.
    pub order: Vec<char>,
  }

  impl DrawSurface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
      self.rects.push((rect, color));
      self.order.push('r');
      Ok(())
    }

    fn draw_glyph_run(
      &mut self,
      _face: &FontFace,
      _font_size: f32,
      glyphs: &[PaintedGlyph],
      color: Color,
    ) -> Result<()> {
      self.glyph_calls.push(GlyphCall {
        count: glyphs.len(),
        color,
        min_x: glyphs.iter().map(|g| g.x).fold(f32::INFINITY, f32::min),
        max_x: glyphs.iter().map(|g| g.x).fold(f32::NEG_INFINITY, f32::max),
      });
      self.order.push('g');
      Ok(())
    }
  }
}
