//! Bidirectional text analysis (UAX #9)
//!
//! Wraps the `unicode-bidi` crate. Paragraph text is analyzed in logical
//! order; once line breaking has fixed a line's byte range, [`visual_runs`]
//! reorders that range into left-to-right display order. Each run is shaped
//! separately with its embedding level, so RTL runs come back from the shaper
//! already reversed.
//!
//! Levels follow UAX #9: even levels are LTR, odd levels are RTL.
//!
//! Reference: <https://www.unicode.org/reports/tr9/>

use std::ops::Range;
use unicode_bidi::{BidiInfo, Level};

/// Base paragraph direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  /// Left-to-right paragraph flow.
  #[default]
  Ltr,
  /// Right-to-left paragraph flow.
  Rtl,
}

impl Direction {
  /// True for right-to-left.
  #[inline]
  pub fn is_rtl(self) -> bool {
    self == Direction::Rtl
  }

  /// The embedding level this direction starts a paragraph at.
  pub fn to_level(self) -> Level {
    match self {
      Direction::Ltr => Level::ltr(),
      Direction::Rtl => Level::rtl(),
    }
  }

  /// Direction of an embedding level.
  pub fn from_level(level: Level) -> Self {
    if level.is_rtl() {
      Direction::Rtl
    } else {
      Direction::Ltr
    }
  }
}

/// A maximal run of one embedding level, in visual order within its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRun {
  /// Byte range in the paragraph text (logical positions).
  pub range: Range<usize>,
  /// Embedding level. Odd levels read right-to-left.
  pub level: u8,
}

impl VisualRun {
  /// True if this run reads right-to-left.
  #[inline]
  pub fn is_rtl(&self) -> bool {
    self.level % 2 == 1
  }
}

/// Returns true if `text` contains any character that raises an embedding
/// level above the base, i.e. bidi reordering could matter.
pub fn needs_reordering(text: &str, base: Direction) -> bool {
  if text.is_empty() {
    return false;
  }
  let bidi = BidiInfo::new(text, Some(base.to_level()));
  bidi.levels.iter().any(|level| *level != base.to_level())
}

/// Splits the whole paragraph into logical-order level runs.
///
/// Line breaking walks these in logical order; levels only matter again when
/// a finished line is reordered with [`visual_runs`].
pub fn level_runs(text: &str, base: Direction) -> Vec<VisualRun> {
  if text.is_empty() {
    return Vec::new();
  }
  let bidi = BidiInfo::new(text, Some(base.to_level()));
  let mut runs: Vec<VisualRun> = Vec::new();
  for (byte, level) in bidi.levels.iter().enumerate() {
    match runs.last_mut() {
      Some(run) if run.level == level.number() => run.range.end = byte + 1,
      _ => runs.push(VisualRun {
        range: byte..byte + 1,
        level: level.number(),
      }),
    }
  }
  runs
}

/// Splits a line of a paragraph into visual-order runs.
///
/// `text` is the whole paragraph (bidi resolution depends on context outside
/// the line); `line` is the byte range of one laid-out line. Runs come back
/// ordered left to right as they should be displayed.
pub fn visual_runs(text: &str, base: Direction, line: Range<usize>) -> Vec<VisualRun> {
  if line.is_empty() || line.end > text.len() {
    return Vec::new();
  }

  let bidi = BidiInfo::new(text, Some(base.to_level()));
  let para = match bidi
    .paragraphs
    .iter()
    .find(|p| p.range.start <= line.start && line.end <= p.range.end)
  {
    Some(para) => para,
    // A line never spans paragraphs; treat a mismatch as a single base run.
    None => {
      return vec![VisualRun {
        range: line,
        level: base.to_level().number(),
      }];
    }
  };

  let (levels, runs) = bidi.visual_runs(para, line);
  runs
    .into_iter()
    .map(|range| {
      let level = levels[range.start].number();
      VisualRun { range, level }
    })
    .collect()
}
