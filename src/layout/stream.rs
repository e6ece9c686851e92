//! Layout stream: pagination over a laid-out box tree
//!
//! `LayoutStream` owns a `BoxArena`, lays it out into one tall strip, and
//! slices the strip into pages on demand. Pages never move content: each
//! `layout_page` call records the strip interval and the lines the page
//! holds, so a page stays valid for painting until the tree is edited.
//! Relaying out after an edit marks every page whose recorded lines moved
//! as stale; callers lay those pages out again instead of repainting them.
//!
//! Trial pagination uses checkpoints: take one, lay out pages, inspect
//! them, and either roll back to the checkpoint or commit the run.

use rustc_hash::FxHashMap;

use crate::error::{LayoutError, Result};
use crate::geometry::Size;
use crate::layout::box_tree::{BoxArena, BoxId, LineRef};
use crate::layout::columns::{balance_columns, fill_columns, ColumnFill};
use crate::layout::context::ShapeContext;
use crate::layout::page::{
  break_decisions, group_lines, sort_lines, BreakDecision, LineGroup, Page, PageBreak,
  PageColumn, BOTTOM_EPSILON,
};
use crate::layout::profile::{self, LayoutKind};

/// Marker for a position in the page list. See [`LayoutStream::checkpoint`].
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
  pages: usize,
}

/// A box tree plus the pages carved out of its laid-out strip.
#[derive(Debug, Default)]
pub struct LayoutStream {
  arena: BoxArena,
  /// All lines of the strip in reading order.
  lines: Vec<LineRef>,
  /// Lines banded into indivisible groups.
  groups: Vec<LineGroup>,
  /// Boundary legality between consecutive groups.
  decisions: Vec<BreakDecision>,
  pages: Vec<Page>,
  content_size: Size,
  laid_out: bool,
}

impl LayoutStream {
  pub fn new(arena: BoxArena) -> LayoutStream {
    LayoutStream {
      arena,
      lines: Vec::new(),
      groups: Vec::new(),
      decisions: Vec::new(),
      pages: Vec::new(),
      content_size: Size::ZERO,
      laid_out: false,
    }
  }

  pub fn arena(&self) -> &BoxArena {
    &self.arena
  }

  /// Mutable access for edits. Edits do not take effect until the next
  /// [`LayoutStream::layout`] call, which also marks affected pages stale.
  pub fn arena_mut(&mut self) -> &mut BoxArena {
    &mut self.arena
  }

  pub fn is_laid_out(&self) -> bool {
    self.laid_out
  }

  pub fn content_size(&self) -> Size {
    self.content_size
  }

  pub fn content_height(&self) -> f32 {
    self.content_size.height
  }

  /// Lays the tree out as one strip of the given width. Safe to call again
  /// after edits: existing pages whose lines moved become stale, pages whose
  /// lines are unchanged stay valid.
  pub fn layout(&mut self, width: f32, ctx: &mut ShapeContext) -> Result<Size> {
    let size = self.arena.layout(width, ctx)?;
    self.content_size = size;
    self.refresh_after_layout();
    Ok(size)
  }

  fn refresh_after_layout(&mut self) {
    self.lines = sort_lines(self.arena.collect_lines());
    self.groups = group_lines(&self.lines);
    self.decisions = break_decisions(&self.arena, &self.lines, &self.groups);
    self.laid_out = true;
    self.mark_moved_pages_stale();
  }

  /// A page laid out before an edit is only reusable if every line it
  /// recorded still exists at the same position.
  fn mark_moved_pages_stale(&mut self) {
    if self.pages.is_empty() {
      return;
    }
    let current: FxHashMap<(BoxId, usize), LineRef> = self
      .lines
      .iter()
      .map(|line| ((line.owner, line.line_index), *line))
      .collect();
    for page in &mut self.pages {
      if page.stale {
        continue;
      }
      let moved = page
        .lines()
        .any(|recorded| current.get(&(recorded.owner, recorded.line_index)) != Some(recorded));
      if moved {
        page.stale = true;
      }
    }
  }

  /// True if any printable content lies below the given strip offset.
  pub fn has_content_after(&self, start: f32) -> bool {
    self
      .groups
      .iter()
      .any(|group| group.bottom > start + BOTTOM_EPSILON)
  }

  /// Carves the next page out of the strip, starting at strip offset
  /// `start` and holding up to `available_height` of content per column.
  ///
  /// The page always makes progress: a group too tall for the page is
  /// placed alone and reported as overflow. When the remaining content ends
  /// on this page and `column_count > 1`, the columns are balanced to the
  /// smallest height that still fits everything.
  pub fn layout_page(
    &mut self,
    available_height: f32,
    start: f32,
    column_count: usize,
  ) -> Result<PageBreak> {
    let _timer = profile::layout_timer(LayoutKind::Page);
    if !self.laid_out {
      return Err(
        LayoutError::InvalidConstraints {
          message: "layout() must run before layout_page()".to_string(),
        }
        .into(),
      );
    }
    if !available_height.is_finite() || available_height <= 0.0 {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!("Page height must be positive, got {available_height}"),
        }
        .into(),
      );
    }
    if column_count == 0 {
      return Err(
        LayoutError::InvalidConstraints {
          message: "Page must have at least one column".to_string(),
        }
        .into(),
      );
    }
    let Some(first_group) = self
      .groups
      .iter()
      .position(|group| group.bottom > start + BOTTOM_EPSILON)
    else {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!("No content after strip offset {start}"),
        }
        .into(),
      );
    };

    let fill = self.fill_page(first_group, start, column_count, available_height);
    let exhausted = fill.consumed_everything();
    let ys_end = fill.columns.last().map_or(start, |column| column.ys_end);
    let used_height = fill
      .columns
      .iter()
      .map(|column| self.groups[column.last_group].bottom - column.ys_start)
      .fold(0.0, f32::max);

    let columns: Vec<PageColumn> = fill
      .columns
      .iter()
      .map(|column| {
        let first = self.groups[column.first_group].lines.start;
        let last = self.groups[column.last_group].lines.end;
        PageColumn {
          lines: self.lines[first..last].to_vec(),
          ys_start: column.ys_start,
          ys_end: column.ys_end,
        }
      })
      .collect();

    let page = Page {
      index: self.pages.len(),
      columns,
      ys_start: start,
      ys_end,
      used_height,
      overflow: fill.overflow,
      forced: fill.forced,
      exhausted,
      stale: false,
    };
    let summary = PageBreak {
      page_index: page.index,
      ys_start: start,
      ys_end,
      used_height,
      overflow: fill.overflow,
      forced: fill.forced,
      exhausted,
    };
    self.pages.push(page);
    Ok(summary)
  }

  fn fill_page(
    &self,
    first_group: usize,
    start: f32,
    column_count: usize,
    available_height: f32,
  ) -> ColumnFill {
    if column_count == 1 {
      return fill_columns(
        &self.groups,
        &self.decisions,
        first_group,
        start,
        1,
        available_height,
      );
    }
    let probe = fill_columns(
      &self.groups,
      &self.decisions,
      first_group,
      start,
      column_count,
      available_height,
    );
    if probe.consumed_everything() && !probe.forced {
      // Final page: balance instead of front-loading the columns.
      let (fill, _) = balance_columns(
        &self.groups,
        &self.decisions,
        first_group,
        start,
        column_count,
        available_height,
      );
      fill
    } else {
      probe
    }
  }

  /// Marks the current end of the page list, so a trial run of
  /// `layout_page` calls can be undone with [`LayoutStream::rollback`].
  pub fn checkpoint(&self) -> Checkpoint {
    Checkpoint {
      pages: self.pages.len(),
    }
  }

  /// Discards every page laid out since the checkpoint.
  pub fn rollback(&mut self, checkpoint: Checkpoint) {
    self.pages.truncate(checkpoint.pages);
  }

  /// Keeps the pages laid out since the checkpoint; returns how many.
  pub fn commit(&mut self, checkpoint: Checkpoint) -> usize {
    self.pages.len().saturating_sub(checkpoint.pages)
  }

  pub fn pages(&self) -> &[Page] {
    &self.pages
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  /// The page at `index`, refusing stale pages: a stale page must be laid
  /// out again (after [`LayoutStream::layout`]) before it can be used.
  pub fn page(&self, index: usize) -> Result<&Page> {
    let count = self.pages.len();
    let page = self
      .pages
      .get(index)
      .ok_or(LayoutError::PageOutOfRange { index, count })?;
    if page.stale {
      return Err(LayoutError::StalePage { index }.into());
    }
    Ok(page)
  }

  pub fn discard_pages(&mut self) {
    self.pages.clear();
  }

  // Recomputes the pagination indexes from lines already stored in the
  // paragraphs, skipping shaping. Only useful for tests with synthetic
  // lines.
  #[cfg(test)]
  pub(crate) fn refresh_prelaid(&mut self) {
    self.refresh_after_layout();
    self.content_size = Size {
      width: 0.0,
      height: self
        .groups
        .last()
        .map_or(0.0, |group| group.advance_bottom),
    };
  }
}
