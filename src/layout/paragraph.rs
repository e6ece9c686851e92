//! Paragraph line layout
//!
//! Fills a paragraph's lines in two phases. The fill phase walks the text
//! in logical order, one (bidi level run ∩ style run) chunk at a time,
//! asking the shaper for the last break that fits the remaining width. The
//! build phase then reorders each finished line into visual order with
//! [`visual_runs`] and shapes its pieces for real, assigning absolute x
//! positions.
//!
//! Fill-phase segments are measurement scaffolding and are discarded; only
//! the build phase produces what ends up in a [`Line`]. A line that cannot
//! fit even one cluster takes the first cluster anyway, so layout always
//! makes progress.
//!
//! Breaking at a style-run boundary mid-word is accepted when the next
//! chunk cannot start on the line; cross-chunk backtracking is not
//! attempted.

use crate::color::Color;
use crate::error::Result;
use crate::geometry::Point;
use crate::layout::box_tree::{ParagraphBox, TextRun};
use crate::layout::context::ShapeContext;
use crate::layout::profile;
use crate::text::bidi;
use crate::text::{
  is_hard_break_char, BreakKind, BreakOutcome, Segment, TrailingWhitespace, VisualRun,
};
use std::ops::Range;

/// One laid-out line of a paragraph.
#[derive(Debug)]
pub struct Line {
  /// Logical byte range of the rendered content, break trimming applied.
  pub range: Range<usize>,
  /// Where the next line resumes (past the break and its whitespace).
  pub next_start: usize,
  /// Shaped pieces in visual order, left to right.
  pub pieces: Vec<LinePiece>,
  /// Absolute strip y of the line's top.
  pub top: f32,
  pub ascent: f32,
  pub descent: f32,
  /// Vertical advance to the next line's top (includes the line gap).
  pub advance_height: f32,
  /// Absolute x of the line box's left edge.
  pub left: f32,
  /// Total advance of the pieces.
  pub width: f32,
}

impl Line {
  /// Baseline shared by every piece on the line.
  pub fn baseline(&self) -> f32 {
    self.top + self.ascent
  }

  /// Printable bottom of the line.
  pub fn bottom(&self) -> f32 {
    self.top + self.ascent + self.descent
  }
}

/// One shaped run placed on a line.
#[derive(Debug)]
pub struct LinePiece {
  pub segment: Segment,
  /// Absolute strip x of the piece's left edge.
  pub x: f32,
  pub fore: Color,
  pub back: Color,
  /// Index of the [`TextRun`] that styled this piece.
  pub run_index: usize,
}

pub(crate) fn fill_lines(
  para: &ParagraphBox,
  origin: Point,
  width: f32,
  ctx: &mut ShapeContext,
) -> Result<Vec<Line>> {
  let text = para.text.as_str();
  let mut lines = Vec::new();
  let mut y = origin.y;

  if text.is_empty() {
    let line = build_line(para, 0..0, 0, origin.x, y, width, ctx)?;
    lines.push(line);
    return Ok(lines);
  }

  let level_runs = bidi::level_runs(text, para.direction);
  let mut cursor = 0usize;

  while cursor < text.len() {
    let line_start = cursor;
    let mut remaining = width;
    let mut ended = false;

    while cursor < text.len() && !ended {
      let (chunk_end, level, run_index) = chunk_at(cursor, &level_runs, &para.runs);
      let run = &para.runs[run_index];
      let engine = ctx.engine_for(&run.family, run.bold, run.italic, &run.features)?;
      profile::count_segment_shaped();

      // The fill phase always includes trailing whitespace; the paragraph's
      // policy is applied once per line, after the break is chosen.
      let outcome = engine.find_break_point(
        text,
        cursor..chunk_end,
        chunk_end,
        run.font_size,
        level,
        remaining,
        para.preference,
        TrailingWhitespace::Include,
      )?;
      match outcome {
        BreakOutcome::Break(bp) => {
          if bp.kind == BreakKind::RangeEnd {
            // Whole chunk fits; the line continues into the next chunk.
            remaining -= bp.segment.advance();
            cursor = bp.break_offset;
          } else {
            cursor = bp.break_offset;
            ended = true;
          }
        }
        BreakOutcome::NoBreak => {
          if cursor == line_start {
            // Nothing fits on an empty line: force the first cluster so
            // layout cannot stall.
            let probe = engine.shape_range(text, cursor..chunk_end, run.font_size, level)?;
            cursor = probe
              .clusters()
              .first()
              .map(|cluster| cluster.byte_range.end)
              .unwrap_or(chunk_end);
          }
          ended = true;
        }
      }
    }

    let content_end = trim_line_end(text, line_start, cursor, para.trailing);
    let line = build_line(para, line_start..content_end, cursor, origin.x, y, width, ctx)?;
    y += line.advance_height;
    profile::count_line_built();
    lines.push(line);
  }

  Ok(lines)
}

/// The largest chunk starting at `cursor` that stays within one bidi level
/// run and one style run.
fn chunk_at(cursor: usize, level_runs: &[VisualRun], runs: &[TextRun]) -> (usize, u8, usize) {
  let level_run = level_runs
    .iter()
    .find(|run| run.range.contains(&cursor))
    .expect("cursor inside paragraph text");
  let run_index = runs
    .iter()
    .position(|run| run.range.contains(&cursor))
    .expect("runs tile paragraph text");
  let chunk_end = level_run.range.end.min(runs[run_index].range.end);
  (chunk_end, level_run.level, run_index)
}

fn trim_line_end(
  text: &str,
  start: usize,
  break_offset: usize,
  trailing: TrailingWhitespace,
) -> usize {
  let slice = &text[start..break_offset];
  let kept = match trailing {
    TrailingWhitespace::Include => slice.trim_end_matches(is_hard_break_char),
    TrailingWhitespace::Exclude => slice.trim_end(),
  };
  start + kept.len()
}

/// Shapes one line's content in visual order and computes its metrics.
fn build_line(
  para: &ParagraphBox,
  content: Range<usize>,
  next_start: usize,
  line_x: f32,
  top: f32,
  width: f32,
  ctx: &mut ShapeContext,
) -> Result<Line> {
  let text = para.text.as_str();
  let mut shaped: Vec<(Segment, usize)> = Vec::new();

  if !content.is_empty() {
    for visual in bidi::visual_runs(text, para.direction, content.clone()) {
      // Intersect the visual run with the style runs. Within an RTL run the
      // logically-last style chunk sits leftmost.
      let mut overlaps: Vec<(Range<usize>, usize)> = para
        .runs
        .iter()
        .enumerate()
        .filter_map(|(run_index, run)| {
          let start = run.range.start.max(visual.range.start);
          let end = run.range.end.min(visual.range.end);
          (start < end).then_some((start..end, run_index))
        })
        .collect();
      if visual.is_rtl() {
        overlaps.reverse();
      }
      for (piece_range, run_index) in overlaps {
        let run = &para.runs[run_index];
        let engine = ctx.engine_for(&run.family, run.bold, run.italic, &run.features)?;
        profile::count_segment_shaped();
        let segment = engine.shape_range(text, piece_range, run.font_size, visual.level)?;
        shaped.push((segment, run_index));
      }
    }
  }

  // Metrics: the tallest piece wins each of ascent, descent, and advance.
  // An empty line borrows the metrics of the run it starts in.
  let (mut ascent, mut descent, mut advance_height) = (0.0f32, 0.0f32, 0.0f32);
  if shaped.is_empty() {
    let at = content.start.min(text.len().saturating_sub(1));
    let run_index = para
      .runs
      .iter()
      .position(|run| run.range.contains(&at) || run.range.start == content.start)
      .unwrap_or(0);
    let run = &para.runs[run_index];
    let engine = ctx.engine_for(&run.family, run.bold, run.italic, &run.features)?;
    let empty = engine.shape_range(text, content.start..content.start, run.font_size, 0)?;
    let metrics = empty.metrics();
    ascent = metrics.ascent;
    descent = metrics.descent;
    advance_height = metrics.line_height;
  } else {
    for (segment, _) in &shaped {
      let metrics = segment.metrics();
      ascent = ascent.max(metrics.ascent);
      descent = descent.max(metrics.descent);
      advance_height = advance_height.max(metrics.line_height);
    }
  }

  let total: f32 = shaped.iter().map(|(segment, _)| segment.advance()).sum();
  // RTL paragraphs fill lines from the right margin.
  let left = if para.direction.is_rtl() {
    line_x + (width - total)
  } else {
    line_x
  };

  let mut x = left;
  let pieces = shaped
    .into_iter()
    .map(|(segment, run_index)| {
      let run = &para.runs[run_index];
      let piece = LinePiece {
        x,
        fore: run.fore,
        back: run.back,
        run_index,
        segment,
      };
      x += piece.segment.advance();
      piece
    })
    .collect();

  Ok(Line {
    range: content,
    next_start,
    pieces,
    top,
    ascent,
    descent,
    advance_height,
    left,
    width: total,
  })
}
