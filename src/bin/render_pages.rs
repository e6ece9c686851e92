//! Render a UTF-8 text file as paginated PNG pages
//!
//! Splits the input on blank lines into paragraphs, lays everything out as
//! one stream, paginates with the requested page geometry, and writes
//! page-<n>.png per printed page. With no input path a built-in sample
//! document is rendered.

use clap::Parser;
use pageflow::font::{FontCache, FontLibrary};
use pageflow::layout::{
  BoxArena, BoxStyle, LayoutStream, PageSetup, ParagraphBox, PrintContext, ShapeContext,
};
use pageflow::paint::{RasterSurface, SegmentPainter};
use pageflow::{Color, EdgeOffsets, Rect, Size};
use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

const SAMPLE: &str = "\
The quick brown fox jumps over the lazy dog, then circles back to do it \
again at a more deliberate pace. Pangrams make convenient filler because \
every letter of the alphabet has to earn its keep at least once.

A paragraph that runs long enough to wrap across several lines gives the \
line breaker something to chew on. Widow and orphan control only becomes \
visible when a paragraph straddles a page boundary, so the sample leans \
on a few paragraphs of respectable length rather than many short ones.

Columns split the same vertical strip into side-by-side slices. Nothing \
moves when a page is carved into columns; each slice simply starts where \
the previous one ended.

Short closing paragraph.";

/// Render a text file as paginated PNG pages
#[derive(Parser, Debug)]
#[command(name = "render_pages", version, about)]
struct Args {
  /// UTF-8 text file; renders a built-in sample when omitted
  input: Option<PathBuf>,

  /// Output directory for page PNGs
  #[arg(long, short, default_value = "pages")]
  out: PathBuf,

  /// Font family for body text
  #[arg(long, default_value = "sans-serif")]
  family: String,

  /// Body font size in points
  #[arg(long, default_value_t = 11.0)]
  font_size: f32,

  /// Page size as WxH in points (612x792 is US Letter)
  #[arg(long, value_parser = parse_page_size, default_value = "612x792")]
  page: (f32, f32),

  /// Margin on all four sides in points
  #[arg(long, default_value_t = 72.0)]
  margin: f32,

  /// Text columns per page
  #[arg(long, default_value_t = 1)]
  columns: usize,

  /// Number printed on the first page
  #[arg(long, default_value_t = 1)]
  first_page: usize,

  /// Pages to write, as 1-based numbers and ranges (e.g. 1-3,7)
  #[arg(long)]
  pages: Option<String>,

  /// Header text; {page} and {pages} are substituted
  #[arg(long)]
  header: Option<String>,

  /// Footer text; {page} and {pages} are substituted
  #[arg(long, default_value = "{page} / {pages}")]
  footer: String,
}

fn parse_page_size(s: &str) -> Result<(f32, f32), String> {
  let (w, h) = s
    .split_once('x')
    .ok_or_else(|| format!("expected WxH, got {:?}", s))?;
  let w: f32 = w.parse().map_err(|_| format!("bad width {:?}", w))?;
  let h: f32 = h.parse().map_err(|_| format!("bad height {:?}", h))?;
  if w <= 0.0 || h <= 0.0 {
    return Err("page dimensions must be positive".to_string());
  }
  Ok((w, h))
}

fn parse_page_ranges(s: &str) -> Result<Vec<RangeInclusive<usize>>, String> {
  let mut ranges = Vec::new();
  for piece in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
    let range = match piece.split_once('-') {
      Some((a, b)) => {
        let a: usize = a.trim().parse().map_err(|_| format!("bad page {:?}", a))?;
        let b: usize = b.trim().parse().map_err(|_| format!("bad page {:?}", b))?;
        if a > b {
          return Err(format!("range {}-{} is reversed", a, b));
        }
        a..=b
      }
      None => {
        let n: usize = piece.parse().map_err(|_| format!("bad page {:?}", piece))?;
        n..=n
      }
    };
    ranges.push(range);
  }
  Ok(ranges)
}

/// Lays out `text` as a single line and paints it at the top-left of `rect`.
fn paint_caption(
  cache: &mut FontCache,
  painter: &mut SegmentPainter,
  text: &str,
  family: &str,
  font_size: f32,
  rect: Rect,
) -> pageflow::Result<()> {
  let mut arena = BoxArena::new();
  let id = arena.new_paragraph(
    ParagraphBox::uniform(text, family, font_size),
    BoxStyle::default(),
  )?;
  let pile = arena.new_pile(vec![id], BoxStyle::default())?;
  arena.set_root(pile)?;
  let mut ctx = ShapeContext::new(cache);
  arena.layout(rect.width(), &mut ctx)?;
  if let Some(line) = arena.paragraph(id)?.lines().first() {
    painter.paint_line(line, rect.origin)?;
  }
  Ok(())
}

fn main() {
  let args = Args::parse();

  let text = match &args.input {
    Some(path) => match fs::read_to_string(path) {
      Ok(text) => text,
      Err(e) => {
        eprintln!("Cannot read {}: {}", path.display(), e);
        process::exit(1);
      }
    },
    None => SAMPLE.to_string(),
  };

  let ranges = match args.pages.as_deref().map(parse_page_ranges).transpose() {
    Ok(ranges) => ranges.unwrap_or_default(),
    Err(e) => {
      eprintln!("Bad --pages: {}", e);
      process::exit(1);
    }
  };

  let library = FontLibrary::new();
  if library.is_empty() {
    eprintln!("No fonts available on this system.");
    process::exit(1);
  }
  let mut cache = FontCache::new(library);

  // One paragraph per blank-line-separated block, with a small gap after
  // each so page breaks have somewhere to land.
  let mut arena = BoxArena::new();
  let mut children = Vec::new();
  let para_style = BoxStyle {
    margin: EdgeOffsets::new(0.0, 0.0, args.font_size * 0.6, 0.0),
    ..BoxStyle::default()
  };
  for block in text.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
    let block = block.replace('\n', " ");
    let id = match arena.new_paragraph(
      ParagraphBox::uniform(block, args.family.as_str(), args.font_size),
      para_style.clone(),
    ) {
      Ok(id) => id,
      Err(e) => {
        eprintln!("Bad paragraph: {}", e);
        process::exit(1);
      }
    };
    children.push(id);
  }
  if children.is_empty() {
    eprintln!("Input has no text.");
    process::exit(1);
  }
  let root = arena
    .new_pile(children, BoxStyle::default())
    .and_then(|pile| arena.set_root(pile).map(|_| pile));
  if let Err(e) = root {
    eprintln!("Cannot build document: {}", e);
    process::exit(1);
  }

  let setup = PageSetup {
    page_size: Size::new(args.page.0, args.page.1),
    margins: EdgeOffsets::all(args.margin),
    first_page_number: args.first_page,
    columns: args.columns,
    header_template: args.header.clone(),
    footer_template: Some(args.footer.clone()),
    ..PageSetup::default()
  };
  let context = PrintContext::new(setup);
  let context = if ranges.is_empty() {
    context
  } else {
    context.with_page_ranges(ranges)
  };

  let mut stream = LayoutStream::new(arena);
  {
    let mut ctx = ShapeContext::new(&mut cache);
    if let Err(e) = stream.layout(context.column_width(), &mut ctx) {
      eprintln!("Layout failed: {}", e);
      process::exit(1);
    }
  }

  let start = Instant::now();
  let breaks = match context.paginate(&mut stream) {
    Ok(breaks) => breaks,
    Err(e) => {
      eprintln!("Pagination failed: {}", e);
      process::exit(1);
    }
  };
  let page_count = breaks.len();

  fs::create_dir_all(&args.out).expect("create output dir");

  let content = context.content_rect();
  let column_width = context.column_width();
  let column_gap = context.setup().column_gap;
  let width_px = args.page.0.ceil() as u32;
  let height_px = args.page.1.ceil() as u32;
  let caption_size = (args.font_size * 0.85).max(6.0);
  let mut written = 0usize;

  for index in 0..page_count {
    let number = context.page_number_for(index);
    if !context.is_page_wanted(number) {
      continue;
    }
    let page = match stream.page(index) {
      Ok(page) => page,
      Err(e) => {
        eprintln!("✗ page {}: {}", number, e);
        process::exit(1);
      }
    };

    let mut surface = match RasterSurface::new(width_px, height_px) {
      Ok(surface) => surface,
      Err(e) => {
        eprintln!("✗ page {}: {}", number, e);
        process::exit(1);
      }
    };
    surface.clear(Color::WHITE);

    let mut painter = SegmentPainter::new(&mut surface);
    let painted = painter
      .paint_page(stream.arena(), page, content.origin, column_width, column_gap)
      .and_then(|_| {
        if let Some(text) = context.header_text(number, page_count) {
          paint_caption(
            &mut cache,
            &mut painter,
            &text,
            &args.family,
            caption_size,
            context.header_rect(),
          )?;
        }
        if let Some(text) = context.footer_text(number, page_count) {
          paint_caption(
            &mut cache,
            &mut painter,
            &text,
            &args.family,
            caption_size,
            context.footer_rect(),
          )?;
        }
        Ok(())
      });
    if let Err(e) = painted {
      eprintln!("✗ page {}: {}", number, e);
      process::exit(1);
    }

    let path = args.out.join(format!("page-{}.png", number));
    if let Err(e) = surface.save_png(&path) {
      eprintln!("✗ page {}: {}", number, e);
      process::exit(1);
    }
    println!("✓ page {} -> {}", number, path.display());
    written += 1;
  }

  println!(
    "\nDone in {:.1}s: {} of {} pages -> {}/",
    start.elapsed().as_secs_f64(),
    written,
    page_count,
    args.out.display()
  );
}

#[cfg(test)]
mod tests {
  use super::{parse_page_ranges, parse_page_size};

  #[test]
  fn parse_page_size_accepts_wxh() {
    assert_eq!(parse_page_size("612x792"), Ok((612.0, 792.0)));
    assert!(parse_page_size("612").is_err());
    assert!(parse_page_size("0x792").is_err());
  }

  #[test]
  fn parse_page_ranges_accepts_mixed_list() {
    let ranges = parse_page_ranges("1-3, 7").unwrap();
    assert_eq!(ranges, vec![1..=3, 7..=7]);
    assert!(parse_page_ranges("5-2").is_err());
    assert!(parse_page_ranges("x").is_err());
  }
}
