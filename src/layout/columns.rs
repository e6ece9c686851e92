//! Column filling and balancing
//!
//! A page is one or more column slices of the laid-out strip. Filling is
//! sequential: each column takes whole line groups until the next group's
//! printable bottom would pass the column height, preferring the last
//! allowed boundary when the stopping boundary is refused. Keeps are
//! best-effort: with no legal boundary in reach, the column breaks at the
//! last group that fit, and a group too tall for an empty column is placed
//! alone so the caller always advances.
//!
//! Balancing runs on the page that exhausts the content: the smallest
//! achievable column height that still fits everything into the column
//! count wins, ties going to the earlier candidate, which keeps the result
//! deterministic.

use crate::layout::page::{BreakDecision, LineGroup, BOTTOM_EPSILON};
use crate::layout::profile::{self, LayoutKind};

/// One column's worth of groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColumnSlice {
  pub first_group: usize,
  /// Inclusive.
  pub last_group: usize,
  pub ys_start: f32,
  /// Where the next column (or page) resumes.
  pub ys_end: f32,
  /// The first group alone exceeded the column height.
  pub overflow: bool,
}

/// Result of filling up to `column_count` columns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnFill {
  pub columns: Vec<ColumnSlice>,
  /// First group left unconsumed, if any.
  pub next_group: Option<usize>,
  /// The fill stopped at a forced break.
  pub forced: bool,
  pub overflow: bool,
}

impl ColumnFill {
  pub fn consumed_everything(&self) -> bool {
    self.next_group.is_none()
  }
}

pub(crate) fn fill_columns(
  groups: &[LineGroup],
  decisions: &[BreakDecision],
  first_group: usize,
  start: f32,
  column_count: usize,
  column_height: f32,
) -> ColumnFill {
  let mut columns = Vec::new();
  let mut at = first_group;
  let mut column_start = start;
  let mut forced = false;
  let mut any_overflow = false;

  for _ in 0..column_count {
    if at >= groups.len() {
      break;
    }

    let mut last_fit: Option<usize> = None;
    let mut last_legal: Option<usize> = None;
    let mut forced_at: Option<usize> = None;
    let mut index = at;
    while index < groups.len() {
      if groups[index].bottom - column_start > column_height + BOTTOM_EPSILON {
        break;
      }
      last_fit = Some(index);
      if index + 1 < groups.len() {
        match decisions[index] {
          BreakDecision::Forced => {
            forced_at = Some(index);
            break;
          }
          BreakDecision::Allowed => last_legal = Some(index),
          BreakDecision::Refused => {}
        }
      }
      index += 1;
    }

    let (end, overflow) = if let Some(stop) = forced_at {
      (stop, false)
    } else if let Some(fit) = last_fit {
      if fit + 1 >= groups.len() {
        // Consumed the rest of the content.
        (fit, false)
      } else if let Some(legal) = last_legal {
        // Pull back to the last allowed boundary when the natural stop is
        // refused by keeps or widow/orphan rules.
        (legal, false)
      } else {
        (fit, false)
      }
    } else {
      // The first group alone is too tall: place it anyway.
      (at, true)
    };
    any_overflow |= overflow;

    let ys_end = if end + 1 < groups.len() {
      groups[end + 1].top
    } else {
      groups[end].advance_bottom
    };
    columns.push(ColumnSlice {
      first_group: at,
      last_group: end,
      ys_start: column_start,
      ys_end,
      overflow,
    });
    at = end + 1;
    column_start = ys_end;

    if forced_at.is_some() {
      forced = true;
      break;
    }
  }

  ColumnFill {
    next_group: (at < groups.len()).then_some(at),
    columns,
    forced,
    overflow: any_overflow,
  }
}

/// Finds the smallest achievable column height that fits every remaining
/// group into `column_count` columns, and fills at that height. Falls back
/// to `available_height` when no candidate is feasible (oversized group or
/// a forced break on the page).
pub(crate) fn balance_columns(
  groups: &[LineGroup],
  decisions: &[BreakDecision],
  first_group: usize,
  start: f32,
  column_count: usize,
  available_height: f32,
) -> (ColumnFill, f32) {
  let _timer = profile::layout_timer(LayoutKind::Balance);

  // Candidate heights are the extents a column could actually have: some
  // group's bottom measured from some possible column start.
  let mut candidates: Vec<f32> = Vec::new();
  for from in first_group..groups.len() {
    let column_start = if from == first_group {
      start
    } else {
      groups[from].top
    };
    for to in from..groups.len() {
      let height = groups[to].bottom - column_start;
      if height > 0.0 && height <= available_height + BOTTOM_EPSILON {
        candidates.push(height);
      }
    }
  }
  candidates.sort_by(f32::total_cmp);
  candidates.dedup_by(|a, b| (*a - *b).abs() <= BOTTOM_EPSILON);

  for &height in &candidates {
    let fill = fill_columns(groups, decisions, first_group, start, column_count, height);
    if fill.consumed_everything() && !fill.overflow && !fill.forced {
      return (fill, height);
    }
  }

  let fill = fill_columns(
    groups,
    decisions,
    first_group,
    start,
    column_count,
    available_height,
  );
  (fill, available_height)
}
