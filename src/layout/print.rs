//! Print context: page geometry, numbering, selection, and the outer
//! pagination loop
//!
//! `PrintContext` carries everything a print job knows that the layout
//! stream does not: physical page size, margins, header and footer bands,
//! the first printed page number, which pages the job actually wants, and
//! an abort flag. `paginate` drives `LayoutStream::layout_page` from the
//! top of the strip until the content runs out, the job is past the last
//! wanted page, or an abort is requested. Abort stops further page
//! generation only; it never interrupts a page already being laid out.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{LayoutError, Result};
use crate::geometry::{EdgeOffsets, Rect, Size};
use crate::layout::page::PageBreak;
use crate::layout::stream::LayoutStream;

/// Physical page description for a print job.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
  /// Paper size in points.
  pub page_size: Size,
  /// Unprintable border on each side.
  pub margins: EdgeOffsets,
  /// Height reserved for the header, inside the top margin.
  pub header_band: f32,
  /// Height reserved for the footer, inside the bottom margin.
  pub footer_band: f32,
  /// Printed number of the first page.
  pub first_page_number: usize,
  pub columns: usize,
  /// Gap between adjacent columns.
  pub column_gap: f32,
  /// Header text; `{page}` and `{pages}` are substituted.
  pub header_template: Option<String>,
  /// Footer text; `{page}` and `{pages}` are substituted.
  pub footer_template: Option<String>,
}

impl Default for PageSetup {
  /// US Letter at 72 dpi points with one-inch margins.
  fn default() -> PageSetup {
    PageSetup {
      page_size: Size::new(612.0, 792.0),
      margins: EdgeOffsets::all(72.0),
      header_band: 36.0,
      footer_band: 36.0,
      first_page_number: 1,
      columns: 1,
      column_gap: 18.0,
      header_template: None,
      footer_template: None,
    }
  }
}

/// Which printed page numbers a collation pass keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageParity {
  #[default]
  All,
  /// Even printed numbers only.
  Even,
  /// Odd printed numbers only.
  Odd,
}

/// One print job: geometry plus page selection plus the abort flag.
#[derive(Debug)]
pub struct PrintContext {
  setup: PageSetup,
  /// Wanted ranges of printed page numbers; empty means all.
  ranges: Vec<RangeInclusive<usize>>,
  parity: PageParity,
  abort: AtomicBool,
}

impl PrintContext {
  pub fn new(setup: PageSetup) -> PrintContext {
    PrintContext {
      setup,
      ranges: Vec::new(),
      parity: PageParity::All,
      abort: AtomicBool::new(false),
    }
  }

  pub fn with_page_ranges(mut self, ranges: Vec<RangeInclusive<usize>>) -> PrintContext {
    self.ranges = ranges;
    self
  }

  pub fn with_parity(mut self, parity: PageParity) -> PrintContext {
    self.parity = parity;
    self
  }

  pub fn setup(&self) -> &PageSetup {
    &self.setup
  }

  /// The printable area: the page minus its margins. Headers and footers
  /// live inside the margins, not inside this rectangle.
  pub fn content_rect(&self) -> Rect {
    let margins = self.setup.margins;
    Rect::from_xywh(
      margins.left,
      margins.top,
      self.setup.page_size.width - margins.horizontal(),
      self.setup.page_size.height - margins.vertical(),
    )
  }

  /// Band directly above the content rectangle, clamped to the top margin.
  pub fn header_rect(&self) -> Rect {
    let margins = self.setup.margins;
    let height = self.setup.header_band.min(margins.top).max(0.0);
    Rect::from_xywh(
      margins.left,
      margins.top - height,
      self.setup.page_size.width - margins.horizontal(),
      height,
    )
  }

  /// Band directly below the content rectangle, clamped to the bottom
  /// margin.
  pub fn footer_rect(&self) -> Rect {
    let margins = self.setup.margins;
    let height = self.setup.footer_band.min(margins.bottom).max(0.0);
    Rect::from_xywh(
      margins.left,
      self.setup.page_size.height - margins.bottom,
      self.setup.page_size.width - margins.horizontal(),
      height,
    )
  }

  /// Width of one column of the content rectangle.
  pub fn column_width(&self) -> f32 {
    let columns = self.setup.columns.max(1) as f32;
    let gaps = self.setup.column_gap * (columns - 1.0);
    (self.content_rect().width() - gaps) / columns
  }

  /// Printed number of the page at `index` in the stream.
  pub fn page_number_for(&self, index: usize) -> usize {
    self.setup.first_page_number + index
  }

  /// Whether the job prints the page with this printed number.
  pub fn is_page_wanted(&self, number: usize) -> bool {
    let parity_ok = match self.parity {
      PageParity::All => true,
      PageParity::Even => number % 2 == 0,
      PageParity::Odd => number % 2 == 1,
    };
    if !parity_ok {
      return false;
    }
    self.ranges.is_empty() || self.ranges.iter().any(|range| range.contains(&number))
  }

  /// Header text for a page, with `{page}` and `{pages}` substituted.
  pub fn header_text(&self, page_number: usize, page_count: usize) -> Option<String> {
    self
      .setup
      .header_template
      .as_deref()
      .map(|template| substitute_page_fields(template, page_number, page_count))
  }

  /// Footer text for a page, with `{page}` and `{pages}` substituted.
  pub fn footer_text(&self, page_number: usize, page_count: usize) -> Option<String> {
    self
      .setup
      .footer_template
      .as_deref()
      .map(|template| substitute_page_fields(template, page_number, page_count))
  }

  /// Stops `paginate` before its next page. Safe to call from another
  /// handle to the same context; a page already being laid out completes.
  pub fn request_abort(&self) {
    self.abort.store(true, Ordering::Relaxed);
  }

  pub fn abort_requested(&self) -> bool {
    self.abort.load(Ordering::Relaxed)
  }

  /// Largest printed page number any range wants, or `None` when the job
  /// wants everything.
  fn last_wanted_page(&self) -> Option<usize> {
    if self.ranges.is_empty() {
      return None;
    }
    self.ranges.iter().map(|range| *range.end()).max()
  }

  /// Lays out pages from the top of the strip until no content remains,
  /// every wanted page exists, or an abort arrives. Returns the summaries
  /// of every page generated; selection filters painting, not generation,
  /// except that generation stops once past the last wanted page.
  ///
  /// The stream must already be laid out at [`PrintContext::column_width`].
  pub fn paginate(&self, stream: &mut LayoutStream) -> Result<Vec<PageBreak>> {
    let content = self.content_rect();
    if content.size.is_empty() {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!(
            "Margins leave no printable area on a {} page",
            self.setup.page_size
          ),
        }
        .into(),
      );
    }
    let columns = self.setup.columns.max(1);
    if self.column_width() <= 0.0 {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!("{columns} columns leave no column width"),
        }
        .into(),
      );
    }

    let last_wanted = self.last_wanted_page();
    let mut breaks = Vec::new();
    let mut start = 0.0;
    while stream.has_content_after(start) {
      if self.abort_requested() {
        break;
      }
      if let Some(last) = last_wanted {
        if self.page_number_for(stream.page_count()) > last {
          break;
        }
      }
      let page = stream.layout_page(content.height(), start, columns)?;
      start = page.ys_end;
      breaks.push(page);
    }
    Ok(breaks)
  }
}

fn substitute_page_fields(template: &str, page_number: usize, page_count: usize) -> String {
  template
    .replace("{page}", &page_number.to_string())
    .replace("{pages}", &page_count.to_string())
}
