//! Line break opportunities (UAX #14)
//!
//! Thin wrapper over the `unicode-linebreak` crate. Break positions are byte
//! offsets pointing AFTER the character that permits the break, so breaking
//! at an offset leaves the space (or other break character) on the line
//! being ended.
//!
//! The algorithm always reports an opportunity at end of text; callers that
//! only care about places a line can wrap use
//! [`interior_opportunities`] to drop it.
//!
//! Reference: <https://www.unicode.org/reports/tr14/>

use unicode_linebreak::{linebreaks, BreakOpportunity as RawOpportunity};

/// Whether a break is required or merely permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakType {
  /// The line must end here (newline, paragraph separator).
  Mandatory,
  /// The line may wrap here.
  Allowed,
}

/// A position where a line may or must break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakOpportunity {
  /// Byte offset after the character permitting the break.
  pub byte_offset: usize,
  /// Whether the break is mandatory.
  pub break_type: BreakType,
}

impl BreakOpportunity {
  /// True for hard breaks (newlines and separators).
  #[inline]
  pub fn is_mandatory(&self) -> bool {
    self.break_type == BreakType::Mandatory
  }
}

/// All break opportunities in `text`, sorted by byte offset.
///
/// # Example
///
/// ```
/// use pageflow::text::line_break::{break_opportunities, BreakType};
///
/// let breaks = break_opportunities("one two");
/// assert!(breaks.iter().any(|b| b.byte_offset == 4 && b.break_type == BreakType::Allowed));
/// ```
pub fn break_opportunities(text: &str) -> Vec<BreakOpportunity> {
  linebreaks(text)
    .map(|(byte_offset, raw)| BreakOpportunity {
      byte_offset,
      break_type: match raw {
        RawOpportunity::Mandatory => BreakType::Mandatory,
        RawOpportunity::Allowed => BreakType::Allowed,
      },
    })
    .collect()
}

/// Break opportunities strictly inside `text`, excluding the end-of-text one.
pub fn interior_opportunities(text: &str) -> Vec<BreakOpportunity> {
  let len = text.len();
  break_opportunities(text)
    .into_iter()
    .filter(|b| b.byte_offset < len)
    .collect()
}

/// Byte offset just past the first hard break in `text`, if there is one
/// before the end.
pub fn first_mandatory_break(text: &str) -> Option<usize> {
  let len = text.len();
  linebreaks(text)
    .find(|(offset, raw)| *raw == RawOpportunity::Mandatory && *offset < len)
    .map(|(offset, _)| offset)
}

/// True for characters that force a line break and never render: newline,
/// carriage return, vertical tab, form feed, next line, and the Unicode
/// line/paragraph separators.
pub fn is_hard_break_char(c: char) -> bool {
  matches!(
    c,
    '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
  )
}
