//! Text shaping and line breaking
//!
//! Everything between raw paragraph text and positioned glyphs:
//!
//! - `bidi`: UAX #9 analysis and visual run ordering
//! - `line_break`: UAX #14 break opportunities
//! - `features`: OpenType feature string parsing
//! - `shaper`: the shaping engine and the line-break search
//! - `segment`: shaped runs with logical clusters and visual glyphs
//!
//! The pipeline for one paragraph: analyze bidi once, fill lines by calling
//! [`ShapingEngine::find_break_point`] over the logical text, reorder each
//! line's runs visually, and hand the resulting [`Segment`]s to the painter.

pub mod bidi;
pub mod features;
pub mod line_break;
pub mod segment;
pub mod shaper;

pub use bidi::{level_runs, needs_reordering, visual_runs, Direction, VisualRun};
pub use features::parse_features;
pub use line_break::{
  break_opportunities, first_mandatory_break, interior_opportunities, is_hard_break_char,
  BreakOpportunity, BreakType,
};
pub use segment::{Cluster, PositionedGlyph, Segment};
pub use shaper::{
  BreakKind, BreakOutcome, BreakPoint, BreakPreference, ShapingEngine, TrailingWhitespace,
};
