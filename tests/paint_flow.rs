//! Painting over real shaped text: stream batching, paint order, chunking,
//! and the tiny-skia surface.
//!
//! A recording surface implements [`DrawSurface`] to capture the exact call
//! sequence the painter emits. Tests return early when the host has no
//! usable fonts.

use pageflow::font::{FontCache, FontFace, FontLibrary};
use pageflow::layout::{
  BoxArena, BoxStyle, LayoutStream, ParagraphBox, ShapeContext, TextRun,
};
use pageflow::paint::{
  DrawSurface, PaintedGlyph, RasterSurface, SegmentPainter, MAX_GLYPHS_PER_DRAW,
};
use pageflow::{Color, Point, Rect, Result};

#[derive(Debug, Default)]
struct RecordingSurface {
  rects: Vec<(Rect, Color)>,
  /// Glyph x positions and color, one entry per draw call.
  glyph_calls: Vec<(Vec<f32>, Color)>,
  order: Vec<char>,
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
    self
      .glyph_calls
      .push((glyphs.iter().map(|g| g.x).collect(), color));
    self.order.push('g');
    Ok(())
  }
}

fn fonts() -> Option<FontCache> {
  let library = FontLibrary::new();
  if library.is_empty() {
    return None;
  }
  Some(FontCache::new(library))
}

fn lay(para: ParagraphBox, width: f32) -> Option<LayoutStream> {
  let mut cache = fonts()?;
  let mut arena = BoxArena::new();
  let id = arena.new_paragraph(para, BoxStyle::default()).ok()?;
  let pile = arena.new_pile(vec![id], BoxStyle::default()).ok()?;
  arena.set_root(pile).ok()?;
  let mut stream = LayoutStream::new(arena);
  let mut ctx = ShapeContext::new(&mut cache);
  stream.layout(width, &mut ctx).ok()?;
  drop(ctx);
  stream.layout_page(100_000.0, 0.0, 1).ok()?;
  Some(stream)
}

fn paint_first_page(stream: &LayoutStream, surface: &mut dyn DrawSurface, width: f32) {
  let page = stream.page(0).unwrap();
  let mut painter = SegmentPainter::new(surface);
  painter
    .paint_page(stream.arena(), page, Point::new(0.0, 0.0), width, 0.0)
    .unwrap();
}

#[test]
fn color_runs_collapse_into_one_stream_each() {
  let red = Color::rgb(200, 0, 0);
  let blue = Color::rgb(0, 0, 200);
  let text = "aaaa bbbb cccc dddd";
  let runs = [(0..5, red), (5..10, blue), (10..15, red), (15..19, blue)]
    .into_iter()
    .map(|(range, fore)| {
      let mut run = TextRun::new(range, "sans-serif", 12.0);
      run.fore = fore;
      run
    })
    .collect();
  let Some(stream) = lay(ParagraphBox::new(text, runs), 10_000.0) else {
    return;
  };

  let mut surface = RecordingSurface::default();
  paint_first_page(&stream, &mut surface, 10_000.0);

  // Two colors on one baseline: exactly two draw calls, one per color,
  // each merging its two runs in ascending x order.
  assert_eq!(surface.glyph_calls.len(), 2);
  let colors: Vec<Color> = surface.glyph_calls.iter().map(|(_, c)| *c).collect();
  assert!(colors.contains(&red));
  assert!(colors.contains(&blue));
  for (xs, _) in &surface.glyph_calls {
    assert!(xs.windows(2).all(|p| p[0] <= p[1]), "stream not x-sorted");
  }
}

#[test]
fn backgrounds_paint_before_all_glyphs() {
  let text = "plain marked plain";
  let mut marked = TextRun::new(6..12, "sans-serif", 12.0);
  marked.back = Color::rgb(255, 255, 0);
  let runs = vec![
    TextRun::new(0..6, "sans-serif", 12.0),
    marked,
    TextRun::new(12..18, "sans-serif", 12.0),
  ];
  let Some(stream) = lay(ParagraphBox::new(text, runs), 10_000.0) else {
    return;
  };

  let mut surface = RecordingSurface::default();
  paint_first_page(&stream, &mut surface, 10_000.0);

  assert_eq!(surface.rects.len(), 1);
  assert!(!surface.glyph_calls.is_empty());
  let last_rect = surface.order.iter().rposition(|&c| c == 'r').unwrap();
  let first_glyphs = surface.order.iter().position(|&c| c == 'g').unwrap();
  assert!(last_rect < first_glyphs);
}

#[test]
fn long_streams_split_into_bounded_draw_calls() {
  let text = "a".repeat(MAX_GLYPHS_PER_DRAW * 2 + 10);
  let Some(stream) = lay(
    ParagraphBox::uniform(text, "sans-serif", 12.0),
    1_000_000.0,
  ) else {
    return;
  };

  let mut surface = RecordingSurface::default();
  paint_first_page(&stream, &mut surface, 1_000_000.0);

  let total: usize = surface.glyph_calls.iter().map(|(xs, _)| xs.len()).sum();
  assert_eq!(total, MAX_GLYPHS_PER_DRAW * 2 + 10);
  assert!(surface.glyph_calls.len() >= 3);
  for (xs, _) in &surface.glyph_calls {
    assert!(xs.len() <= MAX_GLYPHS_PER_DRAW);
  }

  // Chunks are consecutive slices of one sorted stream.
  let all: Vec<f32> = surface
    .glyph_calls
    .iter()
    .flat_map(|(xs, _)| xs.iter().copied())
    .collect();
  assert!(all.windows(2).all(|p| p[0] <= p[1]));
}

#[test]
fn raster_surface_draws_ink_and_reuses_outlines() {
  let Some(stream) = lay(
    ParagraphBox::uniform("Hello pages", "sans-serif", 16.0),
    280.0,
  ) else {
    return;
  };

  let mut surface = RasterSurface::new(300, 100).unwrap();
  surface.clear(Color::WHITE);
  paint_first_page(&stream, &mut surface, 280.0);

  let inked = surface
    .pixmap()
    .pixels()
    .iter()
    .filter(|p| p.red() < 250 || p.green() < 250 || p.blue() < 250)
    .count();
  assert!(inked > 0, "text left no ink");

  let after_first = surface.cache_stats();
  assert!(after_first.misses > 0);

  paint_first_page(&stream, &mut surface, 280.0);
  let after_second = surface.cache_stats();
  assert_eq!(after_second.misses, after_first.misses);
  assert!(after_second.hits > after_first.hits);

  let png = surface.encode_png().unwrap();
  assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
}
