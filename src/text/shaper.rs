//! Shaping engine and line-break search
//!
//! [`ShapingEngine`] binds one face to a parsed OpenType feature list and
//! turns byte ranges of paragraph text into [`Segment`]s via rustybuzz.
//!
//! [`ShapingEngine::find_break_point`] is the line filler's workhorse: given
//! the unlaid remainder of a paragraph run and an available width, it picks
//! the last legal break that fits. Candidates come from UAX #14; when the
//! caller allows letter breaking, cluster boundaries serve as the fallback.
//! Fit is always measured with trailing whitespace excluded, so a line may
//! end in spaces that overhang the margin. The candidate range is shaped
//! once for measurement and the chosen prefix is reshaped, since dropping
//! text after the break can change contextual forms near it.

use crate::error::{Result, ShapeError};
use crate::font::FontFace;
use crate::text::features::parse_features;
use crate::text::line_break::{break_opportunities, is_hard_break_char};
use crate::text::segment::Segment;
use std::ops::Range;
use std::sync::Arc;

/// Which break candidates `find_break_point` may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakPreference {
  /// UAX #14 opportunities only.
  #[default]
  Word,
  /// UAX #14 opportunities first; any cluster boundary when no word break
  /// fits.
  WordOrLetter,
}

/// What the returned segment does with whitespace before the break.
///
/// Fit measurement always ignores trailing whitespace; this policy only
/// decides whether the whitespace is shaped into the segment (and so gets
/// painted and hit-tested) or dropped from it. The next line starts after
/// the whitespace either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingWhitespace {
  /// Keep trailing whitespace in the segment.
  #[default]
  Include,
  /// End the segment before the trailing whitespace run.
  Exclude,
}

/// How a chosen break point was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
  /// The entire requested range fit.
  RangeEnd,
  /// A UAX #14 allowed opportunity.
  Word,
  /// A cluster boundary taken because no word break fit.
  Letter,
  /// A hard line break character inside the range.
  Mandatory,
}

/// A successful break: the shaped line prefix plus where to resume.
#[derive(Debug)]
pub struct BreakPoint {
  /// The shaped text from the range start up to the break, trailing
  /// whitespace handled per policy.
  pub segment: Segment,
  /// Byte offset where the next line starts. Always greater than the range
  /// start and at most the backtrack limit.
  pub break_offset: usize,
  pub kind: BreakKind,
}

/// Result of a break search.
#[derive(Debug)]
pub enum BreakOutcome {
  Break(BreakPoint),
  /// No candidate at or before the backtrack limit fit the available
  /// width. The caller either retries with a weaker preference or forces
  /// the first cluster onto the line.
  NoBreak,
}

impl BreakOutcome {
  pub fn is_no_break(&self) -> bool {
    matches!(self, BreakOutcome::NoBreak)
  }
}

/// One face bound to a parsed feature list, ready to shape runs.
pub struct ShapingEngine {
  face: Arc<FontFace>,
  features: Vec<rustybuzz::Feature>,
}

impl ShapingEngine {
  /// Binds `face` with features parsed from the `features` string (see
  /// [`parse_features`] for the accepted syntax; empty means defaults).
  ///
  /// Fails with [`ShapeError::UnsupportedFont`] when the face carries
  /// neither GSUB nor GPOS: such fonts cannot shape complex scripts and the
  /// caller is expected to substitute a simpler renderer.
  pub fn new(face: Arc<FontFace>, features: &str) -> Result<ShapingEngine> {
    let tables = face.shaper().tables();
    if tables.gsub.is_none() && tables.gpos.is_none() {
      return Err(
        ShapeError::UnsupportedFont {
          family: face.family().to_string(),
          reason: "face has neither a GSUB nor a GPOS table".to_string(),
        }
        .into(),
      );
    }
    let features = parse_features(features)?;
    Ok(ShapingEngine { face, features })
  }

  pub fn face(&self) -> &Arc<FontFace> {
    &self.face
  }

  pub fn features(&self) -> &[rustybuzz::Feature] {
    &self.features
  }

  /// Shapes `text[range]` at `font_size` with bidi level `level`.
  ///
  /// An empty range yields a valid empty segment. The range must lie inside
  /// `text` on character boundaries.
  pub fn shape_range(
    &self,
    text: &str,
    range: Range<usize>,
    font_size: f32,
    level: u8,
  ) -> Result<Segment> {
    if range.start > range.end
      || range.end > text.len()
      || !text.is_char_boundary(range.start)
      || !text.is_char_boundary(range.end)
    {
      return Err(
        ShapeError::InvalidRange {
          start: range.start,
          end: range.end,
          len: text.len(),
        }
        .into(),
      );
    }

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(&text[range.clone()]);
    buffer.set_direction(if level % 2 == 1 {
      rustybuzz::Direction::RightToLeft
    } else {
      rustybuzz::Direction::LeftToRight
    });
    // Script and language are guessed from the run's content.
    let glyphs = rustybuzz::shape(self.face.shaper(), &self.features, buffer);
    Ok(Segment::assemble(
      self.face.clone(),
      font_size,
      level,
      text,
      range,
      &glyphs,
    ))
  }

  /// Finds the last break at or before `backtrack_limit` whose prefix fits
  /// `available_width`, and shapes that prefix into a segment.
  ///
  /// `text` is the whole paragraph; `range` is the unlaid remainder of one
  /// bidi level run. `backtrack_limit` caps how far the break may sit (the
  /// first call passes `range.end`; a caller rejecting a returned break can
  /// retry with the previous offset to search strictly earlier). A hard
  /// break character inside the range always ends the line there. Returns
  /// [`BreakOutcome::NoBreak`] when not even the first candidate fits.
  #[allow(clippy::too_many_arguments)]
  pub fn find_break_point(
    &self,
    text: &str,
    range: Range<usize>,
    backtrack_limit: usize,
    font_size: f32,
    level: u8,
    available_width: f32,
    preference: BreakPreference,
    trailing: TrailingWhitespace,
  ) -> Result<BreakOutcome> {
    if range.is_empty() {
      let segment = self.shape_range(text, range.clone(), font_size, level)?;
      return Ok(BreakOutcome::Break(BreakPoint {
        segment,
        break_offset: range.end,
        kind: BreakKind::RangeEnd,
      }));
    }

    let limit = backtrack_limit.clamp(range.start, range.end);
    if limit == range.start {
      return Ok(BreakOutcome::NoBreak);
    }

    // Shape the whole candidate range once; prefix advances approximate
    // each candidate's width well enough to choose a break.
    let measure = self.shape_range(text, range.clone(), font_size, level)?;

    // UAX #14 runs over the full paragraph so breaks near the range edges
    // see their real context.
    let opportunities = break_opportunities(text);

    // A hard break inside the range caps the search: nothing after it may
    // land on this line. The end-of-text opportunity is mandatory by
    // definition and is treated as an ordinary range end instead.
    let hard_break = opportunities
      .iter()
      .find(|op| {
        op.is_mandatory()
          && op.byte_offset > range.start
          && op.byte_offset <= limit
          && op.byte_offset < text.len()
      })
      .map(|op| op.byte_offset);
    let effective_limit = hard_break.unwrap_or(limit);

    let word_candidates: Vec<usize> = opportunities
      .iter()
      .map(|op| op.byte_offset)
      .filter(|&off| off > range.start && off <= effective_limit)
      .collect();

    let chosen = self
      .choose_candidate(&measure, &word_candidates, range.start, available_width)
      .map(|offset| {
        let kind = if Some(offset) == hard_break {
          BreakKind::Mandatory
        } else if offset == range.end {
          BreakKind::RangeEnd
        } else {
          BreakKind::Word
        };
        (offset, kind)
      })
      .or_else(|| {
        if preference != BreakPreference::WordOrLetter {
          return None;
        }
        // Letter fallback: every cluster boundary in range is a candidate.
        let mut cluster_candidates: Vec<usize> = measure
          .clusters()
          .iter()
          .skip(1)
          .map(|cluster| cluster.byte_range.start)
          .filter(|&off| off <= effective_limit)
          .collect();
        if effective_limit == range.end {
          cluster_candidates.push(range.end);
        }
        self
          .choose_candidate(&measure, &cluster_candidates, range.start, available_width)
          .map(|offset| {
            let kind = if Some(offset) == hard_break {
              BreakKind::Mandatory
            } else if offset == range.end {
              BreakKind::RangeEnd
            } else {
              BreakKind::Letter
            };
            (offset, kind)
          })
      });

    let Some((break_offset, kind)) = chosen else {
      return Ok(BreakOutcome::NoBreak);
    };

    let segment_end = segment_end_for(text, range.start, break_offset, trailing);
    let segment = self.shape_range(text, range.start..segment_end, font_size, level)?;
    Ok(BreakOutcome::Break(BreakPoint {
      segment,
      break_offset,
      kind,
    }))
  }

  /// Largest candidate whose fit width is within `available_width`.
  /// Candidates must be ascending; non-cluster-boundary offsets are
  /// unbreakable (inside a ligature) and are skipped.
  fn choose_candidate(
    &self,
    measure: &Segment,
    candidates: &[usize],
    range_start: usize,
    available_width: f32,
  ) -> Option<usize> {
    let mut best = None;
    for &candidate in candidates {
      if candidate != measure.text_range().end && !measure.is_cluster_boundary(candidate) {
        continue;
      }
      let width = measure.fit_advance_up_to(candidate);
      if candidate > range_start && width <= available_width {
        best = Some(candidate);
      }
    }
    best
  }
}

impl std::fmt::Debug for ShapingEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ShapingEngine")
      .field("face", &self.face.family())
      .field("features", &self.features.len())
      .finish()
  }
}

/// Where the shaped segment ends for a break at `break_offset`.
///
/// Hard-break control characters never render, so they are stripped under
/// both policies; `Exclude` strips the whole trailing whitespace run.
fn segment_end_for(
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::font::{FontCache, FontLibrary};

  fn engine() -> Option<ShapingEngine> {
    let library = FontLibrary::new();
    if library.is_empty() {
      return None;
    }
    let mut cache = FontCache::new(library);
    let face = cache.font_face("sans-serif", false, false).ok()?;
    ShapingEngine::new(face, "").ok()
  }

  const SIZE: f32 = 16.0;

  #[test]
  fn test_shape_range_builds_glyphs_and_clusters() {
    let Some(engine) = engine() else { return };
    let segment = engine.shape_range("hello", 0..5, SIZE, 0).unwrap();
    assert!(!segment.is_empty());
    assert_eq!(segment.clusters().len(), 5);
    assert!(segment.advance() > 0.0);
    assert_eq!(segment.text_range(), 0..5);
  }

  #[test]
  fn test_shape_empty_range_is_valid() {
    let Some(engine) = engine() else { return };
    let segment = engine.shape_range("hello", 2..2, SIZE, 0).unwrap();
    assert!(segment.is_empty());
    assert_eq!(segment.advance(), 0.0);
  }

  #[test]
  fn test_shape_range_rejects_out_of_bounds() {
    let Some(engine) = engine() else { return };
    assert!(engine.shape_range("hi", 0..5, SIZE, 0).is_err());
  }

  #[test]
  fn test_shape_range_rejects_non_char_boundary() {
    let Some(engine) = engine() else { return };
    // 0xC3 0xA9 is two bytes; offset 1 splits it.
    assert!(engine.shape_range("é", 0..1, SIZE, 0).is_err());
  }

  #[test]
  fn test_whole_range_fits() {
    let Some(engine) = engine() else { return };
    let text = "short line";
    let outcome = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        10_000.0,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = outcome else {
      panic!("expected a break");
    };
    assert_eq!(bp.break_offset, text.len());
    assert_eq!(bp.kind, BreakKind::RangeEnd);
    assert_eq!(bp.segment.text_range(), 0..text.len());
  }

  #[test]
  fn test_breaks_at_word_boundary() {
    let Some(engine) = engine() else { return };
    let text = "hello world again";
    // Width that holds "hello world" but not "hello world again".
    let two_words = engine.shape_range(text, 0..11, SIZE, 0).unwrap();
    let width = two_words.advance() + 0.5;
    let outcome = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        width,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = outcome else {
      panic!("expected a break");
    };
    assert_eq!(bp.break_offset, 12);
    assert_eq!(bp.kind, BreakKind::Word);
    // Include keeps the space in the shaped segment.
    assert_eq!(bp.segment.text_range(), 0..12);
  }

  #[test]
  fn test_exclude_policy_drops_trailing_space() {
    let Some(engine) = engine() else { return };
    let text = "hello world again";
    let two_words = engine.shape_range(text, 0..11, SIZE, 0).unwrap();
    let outcome = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        two_words.advance() + 0.5,
        BreakPreference::Word,
        TrailingWhitespace::Exclude,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = outcome else {
      panic!("expected a break");
    };
    // The next line still starts after the space.
    assert_eq!(bp.break_offset, 12);
    assert_eq!(bp.segment.text_range(), 0..11);
  }

  #[test]
  fn test_hard_break_ends_line_early() {
    let Some(engine) = engine() else { return };
    let text = "one\ntwo three";
    let outcome = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        10_000.0,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = outcome else {
      panic!("expected a break");
    };
    assert_eq!(bp.break_offset, 4);
    assert_eq!(bp.kind, BreakKind::Mandatory);
    // The newline itself is never shaped into the line.
    assert_eq!(bp.segment.text_range(), 0..3);
  }

  #[test]
  fn test_no_break_when_nothing_fits() {
    let Some(engine) = engine() else { return };
    let text = "hello world";
    let outcome = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        0.01,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    assert!(outcome.is_no_break());
  }

  #[test]
  fn test_letter_fallback_breaks_inside_word() {
    let Some(engine) = engine() else { return };
    let text = "abcdef";
    let three = engine.shape_range(text, 0..3, SIZE, 0).unwrap();
    let width = three.advance() + 0.5;

    // Word preference finds nothing: the word has no UAX #14 candidate.
    let word_only = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        width,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    assert!(word_only.is_no_break());

    let fallback = engine
      .find_break_point(
        text,
        0..text.len(),
        text.len(),
        SIZE,
        0,
        width,
        BreakPreference::WordOrLetter,
        TrailingWhitespace::Include,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = fallback else {
      panic!("expected a letter break");
    };
    assert_eq!(bp.kind, BreakKind::Letter);
    assert!(bp.break_offset > 0 && bp.break_offset < text.len());
    let reshaped_width = bp.segment.advance_without_trailing_whitespace();
    assert!(reshaped_width <= width + 1.0);
  }

  #[test]
  fn test_backtrack_limit_caps_the_break() {
    let Some(engine) = engine() else { return };
    let text = "aa bb cc";
    let outcome = engine
      .find_break_point(
        text,
        0..text.len(),
        5,
        SIZE,
        0,
        10_000.0,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = outcome else {
      panic!("expected a break");
    };
    // The only candidate at or before 5 is after "aa ".
    assert_eq!(bp.break_offset, 3);
    assert_eq!(bp.kind, BreakKind::Word);
  }

  #[test]
  fn test_break_offset_always_in_range() {
    let Some(engine) = engine() else { return };
    let text = "the quick brown fox jumps over the lazy dog";
    let full = engine.shape_range(text, 0..text.len(), SIZE, 0).unwrap();
    let full_width = full.advance();
    for fraction in [0.1f32, 0.25, 0.5, 0.75, 1.0] {
      let outcome = engine
        .find_break_point(
          text,
          0..text.len(),
          text.len(),
          SIZE,
          0,
          full_width * fraction,
          BreakPreference::WordOrLetter,
          TrailingWhitespace::Include,
        )
        .unwrap();
      match outcome {
        BreakOutcome::Break(bp) => {
          assert!(bp.break_offset > 0, "break must make progress");
          assert!(bp.break_offset <= text.len());
          assert!(text.is_char_boundary(bp.break_offset));
        }
        BreakOutcome::NoBreak => {
          // Legal only when not even one cluster fits.
          assert!(fraction <= 0.25);
        }
      }
    }
  }

  #[test]
  fn test_empty_range_is_a_range_end_break() {
    let Some(engine) = engine() else { return };
    let outcome = engine
      .find_break_point(
        "abc",
        1..1,
        1,
        SIZE,
        0,
        100.0,
        BreakPreference::Word,
        TrailingWhitespace::Include,
      )
      .unwrap();
    let BreakOutcome::Break(bp) = outcome else {
      panic!("expected an empty break");
    };
    assert_eq!(bp.break_offset, 1);
    assert_eq!(bp.kind, BreakKind::RangeEnd);
    assert!(bp.segment.is_empty());
  }

  #[test]
  fn test_invalid_feature_string_errors() {
    let Some(engine) = engine() else { return };
    let face = engine.face().clone();
    assert!(ShapingEngine::new(face.clone(), "liga=banana").is_err());
    assert!(ShapingEngine::new(face, "this-tag-is-too-long=1").is_err());
  }
}
