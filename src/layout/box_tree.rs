//! Box tree arena
//!
//! Layout boxes live in a flat arena and refer to each other through
//! [`BoxId`] handles; no reference counting, no parent back-pointers beyond
//! a plain `Option<BoxId>`. Four kinds cover the documents this engine
//! lays out:
//!
//! - [`ParagraphBox`]: styled text, laid out into [`Line`]s
//! - [`LeafBox`]: a fixed-extent block (picture placeholder, separator rule)
//! - piles: children stacked vertically
//! - rows: cells placed side by side, height of the tallest cell
//!
//! `layout` assigns absolute coordinates in a single strip: every box and
//! every line gets its final `ys` position as if the document were one
//! unbroken column. Pagination and column splitting slice that strip
//! afterwards; they never move boxes.

use crate::error::{LayoutError, Result};
use crate::geometry::{EdgeOffsets, Point, Rect, Size};
use crate::layout::context::ShapeContext;
use crate::layout::paragraph::{self, Line};
use crate::layout::profile::{self, LayoutKind};
use crate::text::{BreakPreference, Direction, TrailingWhitespace};

/// Handle to a box in a [`BoxArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(u32);

impl BoxId {
  pub(crate) fn index(self) -> usize {
    self.0 as usize
  }
}

/// Break and spacing properties attached to every box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
  pub margin: EdgeOffsets,
  /// Never split this box's lines across pages or columns.
  pub keep_together: bool,
  /// Never break between this box's last line and the next box.
  pub keep_with_next: bool,
  /// Force a page break before this box.
  pub break_before: bool,
  /// Force a page break after this box.
  pub break_after: bool,
  /// Minimum lines of a split paragraph kept after the break.
  pub widows: u32,
  /// Minimum lines of a split paragraph kept before the break.
  pub orphans: u32,
}

impl Default for BoxStyle {
  fn default() -> BoxStyle {
    BoxStyle {
      margin: EdgeOffsets::ZERO,
      keep_together: false,
      keep_with_next: false,
      break_before: false,
      break_after: false,
      widows: 2,
      orphans: 2,
    }
  }
}

/// One styled run of a paragraph's text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
  /// Byte range of the paragraph text this run styles.
  pub range: std::ops::Range<usize>,
  pub family: String,
  pub bold: bool,
  pub italic: bool,
  pub font_size: f32,
  /// OpenType feature string, e.g. `"liga=1,smcp=1"`. Empty means defaults.
  pub features: String,
  pub fore: crate::color::Color,
  pub back: crate::color::Color,
}

impl TextRun {
  pub fn new(range: std::ops::Range<usize>, family: impl Into<String>, font_size: f32) -> TextRun {
    TextRun {
      range,
      family: family.into(),
      bold: false,
      italic: false,
      font_size,
      features: String::new(),
      fore: crate::color::Color::BLACK,
      back: crate::color::Color::TRANSPARENT,
    }
  }
}

/// A paragraph: text, its styled runs, and (after layout) its lines.
#[derive(Debug)]
pub struct ParagraphBox {
  pub text: String,
  pub runs: Vec<TextRun>,
  pub direction: Direction,
  pub trailing: TrailingWhitespace,
  pub preference: BreakPreference,
  pub(crate) lines: Vec<Line>,
}

impl ParagraphBox {
  pub fn new(text: impl Into<String>, runs: Vec<TextRun>) -> ParagraphBox {
    ParagraphBox {
      text: text.into(),
      runs,
      direction: Direction::Ltr,
      trailing: TrailingWhitespace::Include,
      preference: BreakPreference::WordOrLetter,
      lines: Vec::new(),
    }
  }

  /// A paragraph styled by a single run.
  pub fn uniform(text: impl Into<String>, family: impl Into<String>, font_size: f32) -> ParagraphBox {
    let text = text.into();
    let run = TextRun::new(0..text.len(), family, font_size);
    ParagraphBox::new(text, vec![run])
  }

  /// Lines produced by the last layout pass.
  pub fn lines(&self) -> &[Line] {
    &self.lines
  }
}

/// A block with a fixed extent and no text: a picture placeholder or a
/// separator rule. Pictures and rules carry their own size; layout places
/// them but never reflows their content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafBox {
  pub size: Size,
  /// Solid fill painted over the leaf's rectangle. A transparent fill
  /// reserves space without painting anything.
  pub fill: crate::color::Color,
}

impl LeafBox {
  pub fn new(size: Size, fill: crate::color::Color) -> LeafBox {
    LeafBox { size, fill }
  }

  /// A horizontal separator rule of the given span and thickness.
  pub fn rule(span: f32, thickness: f32, fill: crate::color::Color) -> LeafBox {
    LeafBox::new(Size::new(span, thickness), fill)
  }
}

#[derive(Debug)]
pub enum BoxKind {
  Paragraph(ParagraphBox),
  Leaf(LeafBox),
  Pile(Vec<BoxId>),
  Row(Vec<BoxId>),
}

#[derive(Debug)]
pub struct BoxNode {
  pub kind: BoxKind,
  pub style: BoxStyle,
  parent: Option<BoxId>,
  rect: Rect,
}

impl BoxNode {
  /// Absolute strip rectangle from the last layout pass.
  pub fn rect(&self) -> Rect {
    self.rect
  }

  pub fn parent(&self) -> Option<BoxId> {
    self.parent
  }
}

/// One laid-out line viewed from outside its paragraph, as pagination sees
/// it. Coordinates are absolute strip positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineRef {
  pub owner: BoxId,
  pub line_index: usize,
  pub top: f32,
  /// Printable (ink) bottom: top + ascent + descent.
  pub bottom: f32,
  /// Where the next line's top lands: top + line advance height.
  pub advance_bottom: f32,
}

/// Arena of layout boxes. See the module docs.
#[derive(Debug, Default)]
pub struct BoxArena {
  nodes: Vec<BoxNode>,
  root: Option<BoxId>,
}

impl BoxArena {
  pub fn new() -> BoxArena {
    BoxArena::default()
  }

  pub fn box_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn root(&self) -> Option<BoxId> {
    self.root
  }

  pub fn get(&self, id: BoxId) -> Result<&BoxNode> {
    self
      .nodes
      .get(id.index())
      .ok_or_else(|| LayoutError::InvalidBoxHandle { id: id.index() }.into())
  }

  /// Direct access for ids produced by tree traversal, which are always
  /// live.
  pub(crate) fn node(&self, id: BoxId) -> &BoxNode {
    &self.nodes[id.index()]
  }

  pub fn get_mut(&mut self, id: BoxId) -> Result<&mut BoxNode> {
    self
      .nodes
      .get_mut(id.index())
      .ok_or_else(|| LayoutError::InvalidBoxHandle { id: id.index() }.into())
  }

  pub fn paragraph(&self, id: BoxId) -> Result<&ParagraphBox> {
    match &self.get(id)?.kind {
      BoxKind::Paragraph(para) => Ok(para),
      _ => Err(
        LayoutError::InvalidConstraints {
          message: format!("box {} is not a paragraph", id.index()),
        }
        .into(),
      ),
    }
  }

  pub fn paragraph_mut(&mut self, id: BoxId) -> Result<&mut ParagraphBox> {
    match &mut self.get_mut(id)?.kind {
      BoxKind::Paragraph(para) => Ok(para),
      _ => Err(
        LayoutError::InvalidConstraints {
          message: format!("box {} is not a paragraph", id.index()),
        }
        .into(),
      ),
    }
  }

  /// Adds a paragraph box. The run table must tile the text exactly:
  /// non-empty, contiguous from 0 to `text.len()`, on character boundaries.
  pub fn new_paragraph(&mut self, para: ParagraphBox, style: BoxStyle) -> Result<BoxId> {
    validate_runs(&para.text, &para.runs)?;
    Ok(self.push(BoxKind::Paragraph(para), style))
  }

  /// Adds a fixed-size leaf box. Its extent must be finite and non-negative.
  pub fn new_leaf(&mut self, leaf: LeafBox, style: BoxStyle) -> Result<BoxId> {
    if !leaf.size.width.is_finite()
      || !leaf.size.height.is_finite()
      || leaf.size.width < 0.0
      || leaf.size.height < 0.0
    {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!("leaf size must be finite and non-negative, got {}", leaf.size),
        }
        .into(),
      );
    }
    Ok(self.push(BoxKind::Leaf(leaf), style))
  }

  /// Adds a pile stacking `children` top to bottom.
  pub fn new_pile(&mut self, children: Vec<BoxId>, style: BoxStyle) -> Result<BoxId> {
    self.claim_children(&children)?;
    let id = self.push(BoxKind::Pile(children.clone()), style);
    self.set_parent(&children, id);
    Ok(id)
  }

  /// Adds a row placing `cells` side by side.
  pub fn new_row(&mut self, cells: Vec<BoxId>, style: BoxStyle) -> Result<BoxId> {
    self.claim_children(&cells)?;
    let id = self.push(BoxKind::Row(cells.clone()), style);
    self.set_parent(&cells, id);
    Ok(id)
  }

  pub fn set_root(&mut self, id: BoxId) -> Result<()> {
    let node = self.get(id)?;
    if node.parent.is_some() {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!("box {} already has a parent and cannot be the root", id.index()),
        }
        .into(),
      );
    }
    self.root = Some(id);
    Ok(())
  }

  fn push(&mut self, kind: BoxKind, style: BoxStyle) -> BoxId {
    let id = BoxId(self.nodes.len() as u32);
    self.nodes.push(BoxNode {
      kind,
      style,
      parent: None,
      rect: Rect::ZERO,
    });
    id
  }

  fn claim_children(&self, children: &[BoxId]) -> Result<()> {
    for &child in children {
      let node = self.get(child)?;
      if node.parent.is_some() {
        return Err(
          LayoutError::InvalidConstraints {
            message: format!("box {} is already attached to a parent", child.index()),
          }
          .into(),
        );
      }
    }
    Ok(())
  }

  fn set_parent(&mut self, children: &[BoxId], parent: BoxId) {
    for &child in children {
      self.nodes[child.index()].parent = Some(parent);
    }
  }

  /// `id` and every box above it, nearest first.
  pub fn ancestors_of(&self, id: BoxId) -> Vec<BoxId> {
    let mut chain = Vec::new();
    let mut at = Some(id);
    while let Some(current) = at {
      chain.push(current);
      at = self.nodes[current.index()].parent;
    }
    chain
  }

  /// True when `ancestor` is `id` or sits above it.
  pub fn is_ancestor_or_self(&self, ancestor: BoxId, id: BoxId) -> bool {
    let mut at = Some(id);
    while let Some(current) = at {
      if current == ancestor {
        return true;
      }
      at = self.nodes[current.index()].parent;
    }
    false
  }

  /// Lays out the whole tree into one absolute strip of width `width`,
  /// returning the strip's size.
  pub fn layout(&mut self, width: f32, ctx: &mut ShapeContext) -> Result<Size> {
    let root = self.root.ok_or_else(|| {
      crate::error::Error::from(LayoutError::InvalidConstraints {
        message: "arena has no root box".to_string(),
      })
    })?;
    if !width.is_finite() || width <= 0.0 {
      return Err(
        LayoutError::InvalidConstraints {
          message: format!("layout width must be positive, got {width}"),
        }
        .into(),
      );
    }
    self.layout_box(root, Point::ZERO, width, ctx)
  }

  fn layout_box(
    &mut self,
    id: BoxId,
    origin: Point,
    width: f32,
    ctx: &mut ShapeContext,
  ) -> Result<Size> {
    enum Plan {
      Paragraph,
      Leaf(Size),
      Pile(Vec<BoxId>),
      Row(Vec<BoxId>),
    }
    let plan = match &self.nodes[id.index()].kind {
      BoxKind::Paragraph(_) => Plan::Paragraph,
      BoxKind::Leaf(leaf) => Plan::Leaf(leaf.size),
      BoxKind::Pile(children) => Plan::Pile(children.clone()),
      BoxKind::Row(cells) => Plan::Row(cells.clone()),
    };

    let size = match plan {
      Plan::Paragraph => {
        let _timer = profile::layout_timer(LayoutKind::Paragraph);
        let lines = {
          let BoxKind::Paragraph(para) = &self.nodes[id.index()].kind else {
            unreachable!()
          };
          paragraph::fill_lines(para, origin, width, ctx)?
        };
        let height = lines
          .last()
          .map_or(0.0, |line| line.top + line.advance_height - origin.y);
        let BoxKind::Paragraph(para) = &mut self.nodes[id.index()].kind else {
          unreachable!()
        };
        para.lines = lines;
        Size::new(width, height)
      }
      // Leaves keep their declared extent; the given width never stretches
      // or clips them.
      Plan::Leaf(size) => size,
      Plan::Pile(children) => {
        let _timer = profile::layout_timer(LayoutKind::Pile);
        let mut y = origin.y;
        for child in children {
          let margin = self.nodes[child.index()].style.margin;
          let child_origin = Point::new(origin.x + margin.left, y + margin.top);
          let child_width = (width - margin.horizontal()).max(0.0);
          let child_size = self.layout_box(child, child_origin, child_width, ctx)?;
          y += margin.top + child_size.height + margin.bottom;
        }
        Size::new(width, y - origin.y)
      }
      Plan::Row(cells) => {
        let _timer = profile::layout_timer(LayoutKind::Row);
        if cells.is_empty() {
          Size::new(width, 0.0)
        } else {
          let cell_width = width / cells.len() as f32;
          let mut row_height = 0.0f32;
          for (index, cell) in cells.iter().enumerate() {
            let margin = self.nodes[cell.index()].style.margin;
            let cell_origin = Point::new(
              origin.x + index as f32 * cell_width + margin.left,
              origin.y + margin.top,
            );
            let inner_width = (cell_width - margin.horizontal()).max(0.0);
            let cell_size = self.layout_box(*cell, cell_origin, inner_width, ctx)?;
            row_height = row_height.max(margin.top + cell_size.height + margin.bottom);
          }
          Size::new(width, row_height)
        }
      }
    };

    self.nodes[id.index()].rect = Rect::new(origin, size);
    Ok(size)
  }

  /// Every line in the tree in document order, with absolute strip
  /// coordinates. Pagination groups and slices this list.
  pub fn collect_lines(&self) -> Vec<LineRef> {
    let mut out = Vec::new();
    if let Some(root) = self.root {
      self.collect_into(root, &mut out);
    }
    out
  }

  fn collect_into(&self, id: BoxId, out: &mut Vec<LineRef>) {
    match &self.nodes[id.index()].kind {
      BoxKind::Paragraph(para) => {
        for (line_index, line) in para.lines.iter().enumerate() {
          out.push(LineRef {
            owner: id,
            line_index,
            top: line.top,
            bottom: line.top + line.ascent + line.descent,
            advance_bottom: line.top + line.advance_height,
          });
        }
      }
      // A leaf is one indivisible "line": page and column boundaries land
      // before or after it, never inside.
      BoxKind::Leaf(leaf) => {
        let rect = self.nodes[id.index()].rect;
        if leaf.size.height > 0.0 {
          out.push(LineRef {
            owner: id,
            line_index: 0,
            top: rect.min_y(),
            bottom: rect.max_y(),
            advance_bottom: rect.max_y(),
          });
        }
      }
      BoxKind::Pile(children) => {
        for &child in children {
          self.collect_into(child, out);
        }
      }
      BoxKind::Row(cells) => {
        for &cell in cells {
          self.collect_into(cell, out);
        }
      }
    }
  }
}

fn validate_runs(text: &str, runs: &[TextRun]) -> Result<()> {
  let bad = |message: String| -> crate::error::Error {
    LayoutError::InvalidConstraints { message }.into()
  };
  if runs.is_empty() {
    return Err(bad("paragraph needs at least one text run".to_string()));
  }
  let mut at = 0usize;
  for run in runs {
    if run.range.start != at {
      return Err(bad(format!(
        "text runs must tile the text: expected start {at}, got {}",
        run.range.start
      )));
    }
    if run.range.end < run.range.start || run.range.end > text.len() {
      return Err(bad(format!(
        "run range {}..{} escapes text of length {}",
        run.range.start,
        run.range.end,
        text.len()
      )));
    }
    if !text.is_char_boundary(run.range.start) || !text.is_char_boundary(run.range.end) {
      return Err(bad(format!(
        "run range {}..{} splits a character",
        run.range.start, run.range.end
      )));
    }
    if !run.font_size.is_finite() || run.font_size <= 0.0 {
      return Err(bad(format!("font size must be positive, got {}", run.font_size)));
    }
    at = run.range.end;
  }
  if at != text.len() {
    return Err(bad(format!(
      "text runs cover only {at} of {} bytes",
      text.len()
    )));
  }
  Ok(())
}
