//! Line groups, break legality, and laid-out pages
//!
//! Pagination never looks at boxes directly; it works on the flat list of
//! [`LineRef`]s the arena collects. Lines are sorted by strip position and
//! clustered into [`LineGroup`]s: lines whose vertical spans overlap (or
//! whose bottoms coincide, as in interlinear rows) always travel to the
//! same page, so a break can never separate aligned cells.
//!
//! Between every pair of adjacent groups there is one potential break,
//! classified once per layout by [`break_decisions`]: forced by an explicit
//! break property, refused by keep or widow/orphan constraints, or allowed.

use crate::layout::box_tree::{BoxArena, BoxId, BoxKind, LineRef};
use std::ops::Range;

/// Tolerance for "equal bottoms" and span-overlap tests, in points.
pub const BOTTOM_EPSILON: f32 = 0.01;

/// A run of lines that must stay on one page, with merged extents.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGroup {
  /// Indices into the sorted line list.
  pub lines: Range<usize>,
  pub top: f32,
  /// Printable bottom: the deepest ink of any member.
  pub bottom: f32,
  /// Where the next group's top lands.
  pub advance_bottom: f32,
}

/// What pagination may do at the boundary after a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
  /// An explicit break property ends the page here.
  Forced,
  Allowed,
  /// Keep or widow/orphan constraints refuse this boundary. Refused
  /// boundaries are overridden only when a page has no legal alternative.
  Refused,
}

/// Sorts lines into strip order: by top, then bottom, then document order.
pub fn sort_lines(mut lines: Vec<LineRef>) -> Vec<LineRef> {
  lines.sort_by(|a, b| {
    a.top
      .total_cmp(&b.top)
      .then(a.bottom.total_cmp(&b.bottom))
      .then(a.owner.cmp(&b.owner))
      .then(a.line_index.cmp(&b.line_index))
  });
  lines
}

/// Clusters sorted lines into groups. A line joins the current group when
/// its span overlaps the group or its bottom matches the group's.
pub fn group_lines(lines: &[LineRef]) -> Vec<LineGroup> {
  let mut groups: Vec<LineGroup> = Vec::new();
  for (index, line) in lines.iter().enumerate() {
    match groups.last_mut() {
      Some(group)
        if line.top < group.bottom - BOTTOM_EPSILON
          || (line.bottom - group.bottom).abs() <= BOTTOM_EPSILON =>
      {
        group.lines.end = index + 1;
        group.top = group.top.min(line.top);
        group.bottom = group.bottom.max(line.bottom);
        group.advance_bottom = group.advance_bottom.max(line.advance_bottom);
      }
      _ => groups.push(LineGroup {
        lines: index..index + 1,
        top: line.top,
        bottom: line.bottom,
        advance_bottom: line.advance_bottom,
      }),
    }
  }
  groups
}

/// Classifies the boundary after each group; entry `i` is the boundary
/// between groups `i` and `i + 1`.
pub fn break_decisions(
  arena: &BoxArena,
  lines: &[LineRef],
  groups: &[LineGroup],
) -> Vec<BreakDecision> {
  let boundaries = groups.len().saturating_sub(1);
  (0..boundaries)
    .map(|i| decide_break_after(arena, lines, groups, i))
    .collect()
}

fn distinct_owners(lines: &[LineRef]) -> Vec<BoxId> {
  let mut owners: Vec<BoxId> = Vec::new();
  for line in lines {
    if !owners.contains(&line.owner) {
      owners.push(line.owner);
    }
  }
  owners
}

fn decide_break_after(
  arena: &BoxArena,
  lines: &[LineRef],
  groups: &[LineGroup],
  boundary: usize,
) -> BreakDecision {
  let before = &lines[groups[boundary].lines.clone()];
  let after = &lines[groups[boundary + 1].lines.clone()];
  let before_owners = distinct_owners(before);
  let after_owners = distinct_owners(after);

  // Explicit break properties win over every keep.
  for &owner in &before_owners {
    for along in arena.ancestors_of(owner) {
      if arena.node(along).style.break_after
        && !after_owners
          .iter()
          .any(|&next| arena.is_ancestor_or_self(along, next))
      {
        return BreakDecision::Forced;
      }
    }
  }
  for &owner in &after_owners {
    for along in arena.ancestors_of(owner) {
      if arena.node(along).style.break_before
        && !before_owners
          .iter()
          .any(|&prev| arena.is_ancestor_or_self(along, prev))
      {
        return BreakDecision::Forced;
      }
    }
  }

  // keep_together: some box spans the boundary.
  for &prev in &before_owners {
    for along in arena.ancestors_of(prev) {
      if arena.node(along).style.keep_together
        && after_owners
          .iter()
          .any(|&next| arena.is_ancestor_or_self(along, next))
      {
        return BreakDecision::Refused;
      }
    }
  }

  // keep_with_next: some box ends exactly at the boundary.
  for &prev in &before_owners {
    for along in arena.ancestors_of(prev) {
      if arena.node(along).style.keep_with_next
        && !after_owners
          .iter()
          .any(|&next| arena.is_ancestor_or_self(along, next))
      {
        return BreakDecision::Refused;
      }
    }
  }

  // Widows and orphans for each paragraph the boundary splits.
  for &owner in &before_owners {
    if !after_owners.contains(&owner) {
      continue;
    }
    let node = arena.node(owner);
    let BoxKind::Paragraph(para) = &node.kind else {
      continue;
    };
    let total = para.lines().len();
    let last_before = before
      .iter()
      .filter(|line| line.owner == owner)
      .map(|line| line.line_index)
      .max()
      .unwrap_or(0);
    let kept_before = last_before + 1;
    let kept_after = total.saturating_sub(kept_before);
    if kept_before < node.style.orphans as usize || kept_after < node.style.widows as usize {
      return BreakDecision::Refused;
    }
  }

  BreakDecision::Allowed
}

/// One column of a laid-out page: a slice of the strip plus the lines that
/// landed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageColumn {
  pub lines: Vec<LineRef>,
  /// Strip offset where this column starts.
  pub ys_start: f32,
  /// Strip offset where the next column (or page) resumes.
  pub ys_end: f32,
}

impl PageColumn {
  /// Printable height actually used by this column.
  pub fn used_height(&self) -> f32 {
    self
      .lines
      .iter()
      .map(|line| line.bottom - self.ys_start)
      .fold(0.0, f32::max)
  }
}

/// A laid-out page: column slices of the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
  pub index: usize,
  pub columns: Vec<PageColumn>,
  /// Strip offset this page started from.
  pub ys_start: f32,
  /// Strip offset the next page resumes from.
  pub ys_end: f32,
  /// Tallest used column height.
  pub used_height: f32,
  /// Content exceeded the page but was placed anyway to guarantee
  /// progress.
  pub overflow: bool,
  /// The page ended at an explicit break property.
  pub forced: bool,
  /// No content remains after this page.
  pub exhausted: bool,
  /// The tree was edited and relaid; this page no longer matches it.
  pub stale: bool,
}

impl Page {
  pub fn line_count(&self) -> usize {
    self.columns.iter().map(|column| column.lines.len()).sum()
  }

  /// Lines of every column in strip order.
  pub fn lines(&self) -> impl Iterator<Item = &LineRef> {
    self.columns.iter().flat_map(|column| column.lines.iter())
  }
}

/// Summary of one `layout_page` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBreak {
  pub page_index: usize,
  pub ys_start: f32,
  pub ys_end: f32,
  pub used_height: f32,
  pub overflow: bool,
  pub forced: bool,
  pub exhausted: bool,
}
