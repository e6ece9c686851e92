//! Box tree layout and pagination
//!
//! This module turns a tree of paragraph, pile, and row boxes into lines
//! with absolute strip positions, then carves the strip into pages.
//!
//! # Module Organization
//!
//! - `box_tree.rs` - Box arena, styles, and bottom-up layout
//! - `paragraph.rs` - Line filling over bidi runs
//! - `page.rs` - Line groups, break legality, page types
//! - `columns.rs` - Column filling and balancing
//! - `stream.rs` - Pagination over the laid-out strip
//! - `print.rs` - Page geometry, numbering, and the print loop
//! - `context.rs` - Shared font and shaper state during layout
//! - `profile.rs` - Env-gated layout timing counters
//!
//! # Example
//!
//! ```rust,ignore
//! use pageflow::layout::{BoxArena, BoxStyle, LayoutStream, ParagraphBox, ShapeContext};
//!
//! let mut arena = BoxArena::new();
//! let para = arena.new_paragraph(
//!   ParagraphBox::uniform("Hello, world", "sans-serif", 12.0),
//!   BoxStyle::default(),
//! )?;
//! let pile = arena.new_pile(vec![para], BoxStyle::default())?;
//! arena.set_root(pile)?;
//!
//! let mut stream = LayoutStream::new(arena);
//! stream.layout(320.0, &mut ctx)?;
//! let first = stream.layout_page(480.0, 0.0, 1)?;
//! ```

pub mod box_tree;
pub mod columns;
pub mod context;
pub mod page;
pub mod paragraph;
pub mod print;
pub mod profile;
pub mod stream;

// Re-exports
pub use box_tree::{
  BoxArena, BoxId, BoxKind, BoxNode, BoxStyle, LeafBox, LineRef, ParagraphBox, TextRun,
};
pub use context::ShapeContext;
pub use page::{BreakDecision, LineGroup, Page, PageBreak, PageColumn};
pub use paragraph::{Line, LinePiece};
pub use print::{PageParity, PageSetup, PrintContext};
pub use profile::{log_layout_profile, reset_layout_profile};
pub use stream::{Checkpoint, LayoutStream};
