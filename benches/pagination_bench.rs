use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pageflow::font::{FontCache, FontFace, FontLibrary};
use pageflow::layout::{BoxArena, BoxStyle, LayoutStream, ParagraphBox, ShapeContext};
use pageflow::paint::{DrawSurface, PaintedGlyph, SegmentPainter};
use pageflow::{Color, EdgeOffsets, Point, Rect, Result};

struct NullSurface;

impl DrawSurface for NullSurface {
  fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
    black_box((rect, color));
    Ok(())
  }

  fn draw_glyph_run(
    &mut self,
    _face: &FontFace,
    font_size: f32,
    glyphs: &[PaintedGlyph],
    color: Color,
  ) -> Result<()> {
    black_box((font_size, glyphs.len(), color));
    Ok(())
  }
}

fn sample_document(paragraphs: usize) -> BoxArena {
  let mut arena = BoxArena::new();
  let style = BoxStyle {
    margin: EdgeOffsets::new(0.0, 0.0, 6.0, 0.0),
    ..BoxStyle::default()
  };
  let mut children = Vec::with_capacity(paragraphs);
  for i in 0..paragraphs {
    let text = "How vexingly quick daft zebras jump. ".repeat(3 + i % 5);
    let id = arena
      .new_paragraph(ParagraphBox::uniform(text, "sans-serif", 11.0), style.clone())
      .expect("paragraph");
    children.push(id);
  }
  let pile = arena.new_pile(children, BoxStyle::default()).expect("pile");
  arena.set_root(pile).expect("root");
  arena
}

fn paginate_all(stream: &mut LayoutStream, height: f32, columns: usize) -> usize {
  stream.discard_pages();
  let mut start = 0.0_f32;
  let mut pages = 0usize;
  while stream.has_content_after(start) {
    let brk = stream.layout_page(height, start, columns).expect("page");
    start = brk.ys_end;
    pages += 1;
  }
  pages
}

fn bench_pagination(c: &mut Criterion) {
  let library = FontLibrary::new();
  if library.is_empty() {
    eprintln!("skipping pagination benches: no fonts available");
    return;
  }
  let mut cache = FontCache::new(library);

  // Shape once; the pagination benches slice the same laid-out strip.
  let mut stream = LayoutStream::new(sample_document(80));
  {
    let mut ctx = ShapeContext::new(&mut cache);
    stream.layout(468.0, &mut ctx).expect("layout");
  }

  c.bench_function("paginate_single_column", |b| {
    b.iter(|| black_box(paginate_all(&mut stream, 648.0, 1)));
  });

  c.bench_function("paginate_balanced_three_columns", |b| {
    b.iter(|| black_box(paginate_all(&mut stream, 648.0, 3)));
  });

  paginate_all(&mut stream, 648.0, 1);
  c.bench_function("batch_first_page_glyphs", |b| {
    b.iter(|| {
      let page = stream.page(0).expect("page");
      let mut surface = NullSurface;
      let mut painter = SegmentPainter::new(&mut surface);
      painter
        .paint_page(stream.arena(), page, Point::new(0.0, 0.0), 468.0, 18.0)
        .expect("paint");
    });
  });

  c.bench_function("layout_strip", |b| {
    b.iter(|| {
      let mut ctx = ShapeContext::new(&mut cache);
      stream.layout(black_box(468.0), &mut ctx).expect("layout");
    });
  });
}

criterion_group!(pagination_benches, bench_pagination);
criterion_main!(pagination_benches);
