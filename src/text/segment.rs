//! Shaped text segments
//!
//! A [`Segment`] is the output of shaping one run of text with one face at
//! one size and one bidi level. It carries two parallel views of the same
//! glyphs:
//!
//! - `glyphs` in visual order, left to right, with resolved pen positions.
//!   This is the order the painter consumes.
//! - `clusters` in logical order, each mapping a byte range of the source
//!   text to a range of glyph indices. This is the order caret movement and
//!   line measurement consume.
//!
//! For LTR runs the two orders coincide. For RTL runs the shaper emits
//! glyphs visually (already reversed), so cluster groups are reversed once
//! at assembly time to recover logical order.
//!
//! Caret positions land only on cluster boundaries. Offsets inside a
//! cluster (e.g. inside a ligature) snap to the cluster start.

use crate::font::FontFace;
use crate::font::ScaledFaceMetrics;
use std::ops::Range;
use std::sync::Arc;

/// One positioned glyph, in visual order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
  /// Glyph id in the face.
  pub id: u16,
  /// Horizontal pen position within the segment, offsets applied.
  pub x: f32,
  /// Vertical offset from the baseline, positive upward.
  pub y_offset: f32,
  /// Horizontal advance this glyph contributes.
  pub advance: f32,
  /// Byte offset of the cluster this glyph belongs to, in paragraph text.
  pub cluster_byte: usize,
}

/// One cluster: the smallest unit the caret can land beside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
  /// Byte range in the paragraph text.
  pub byte_range: Range<usize>,
  /// Range of indices into the segment's visual glyph vector.
  pub glyph_range: Range<usize>,
  /// True when every character in the cluster is whitespace.
  pub is_whitespace: bool,
}

/// A shaped run of text. See the module docs for ordering guarantees.
pub struct Segment {
  face: Arc<FontFace>,
  font_size: f32,
  level: u8,
  text_range: Range<usize>,
  glyphs: Vec<PositionedGlyph>,
  clusters: Vec<Cluster>,
  cluster_advances: Vec<f32>,
  advance: f32,
  trailing_whitespace_advance: f32,
  metrics: ScaledFaceMetrics,
}

impl Segment {
  /// Builds a segment from shaper output.
  ///
  /// `text` is the whole paragraph; `text_range` is the slice that was
  /// pushed into the shaping buffer, so the buffer's cluster values are
  /// relative to `text_range.start`.
  pub(crate) fn assemble(
    face: Arc<FontFace>,
    font_size: f32,
    level: u8,
    text: &str,
    text_range: Range<usize>,
    buffer: &rustybuzz::GlyphBuffer,
  ) -> Segment {
    let metrics = face.metrics().scale(font_size);
    let scale = font_size / face.units_per_em() as f32;
    let rtl = level % 2 == 1;

    let infos = buffer.glyph_infos();
    let positions = buffer.glyph_positions();

    let mut glyphs = Vec::with_capacity(infos.len());
    // (relative cluster byte, glyph range, advance), in visual order.
    let mut groups: Vec<(usize, Range<usize>, f32)> = Vec::new();
    let mut pen_x = 0.0f32;

    for (i, (info, pos)) in infos.iter().zip(positions.iter()).enumerate() {
      let advance = pos.x_advance as f32 * scale;
      let cluster_rel = info.cluster as usize;
      glyphs.push(PositionedGlyph {
        id: info.glyph_id as u16,
        x: pen_x + pos.x_offset as f32 * scale,
        y_offset: pos.y_offset as f32 * scale,
        advance,
        cluster_byte: text_range.start + cluster_rel,
      });
      match groups.last_mut() {
        Some((byte, range, total)) if *byte == cluster_rel => {
          range.end = i + 1;
          *total += advance;
        }
        _ => groups.push((cluster_rel, i..i + 1, advance)),
      }
      pen_x += advance;
    }

    // Visual order for RTL runs is the reverse of logical order.
    if rtl {
      groups.reverse();
    }

    let slice_len = text_range.len();
    let mut clusters = Vec::with_capacity(groups.len());
    let mut cluster_advances = Vec::with_capacity(groups.len());
    for (idx, (rel_byte, glyph_range, advance)) in groups.iter().enumerate() {
      let rel_end = groups.get(idx + 1).map_or(slice_len, |next| next.0);
      let byte_range = text_range.start + rel_byte..text_range.start + rel_end;
      let chunk = &text[byte_range.clone()];
      clusters.push(Cluster {
        byte_range,
        glyph_range: glyph_range.clone(),
        is_whitespace: !chunk.is_empty() && chunk.chars().all(char::is_whitespace),
      });
      cluster_advances.push(*advance);
    }

    let trailing_whitespace_advance = clusters
      .iter()
      .zip(cluster_advances.iter())
      .rev()
      .take_while(|(cluster, _)| cluster.is_whitespace)
      .map(|(_, advance)| advance)
      .sum();

    Segment {
      face,
      font_size,
      level,
      text_range,
      glyphs,
      clusters,
      cluster_advances,
      advance: pen_x,
      trailing_whitespace_advance,
      metrics,
    }
  }

  /// The face this segment was shaped with.
  pub fn face(&self) -> &Arc<FontFace> {
    &self.face
  }

  /// Font size in points.
  pub fn font_size(&self) -> f32 {
    self.font_size
  }

  /// Bidi embedding level. Odd levels read right-to-left.
  pub fn level(&self) -> u8 {
    self.level
  }

  /// True if this segment reads right-to-left.
  pub fn is_rtl(&self) -> bool {
    self.level % 2 == 1
  }

  /// Byte range of the paragraph text this segment covers.
  pub fn text_range(&self) -> Range<usize> {
    self.text_range.clone()
  }

  /// Glyphs in visual order.
  pub fn glyphs(&self) -> &[PositionedGlyph] {
    &self.glyphs
  }

  /// Clusters in logical order.
  pub fn clusters(&self) -> &[Cluster] {
    &self.clusters
  }

  /// Advance of the cluster at `index` (logical order).
  pub fn cluster_advance(&self, index: usize) -> f32 {
    self.cluster_advances[index]
  }

  /// Total advance width, trailing whitespace included.
  pub fn advance(&self) -> f32 {
    self.advance
  }

  /// Advance width with trailing whitespace stripped.
  ///
  /// Trailing means logically-final clusters, which for RTL segments sit at
  /// the visual left edge. Line fitting measures this width so a line may
  /// end in spaces that overhang the available width.
  pub fn advance_without_trailing_whitespace(&self) -> f32 {
    self.advance - self.trailing_whitespace_advance
  }

  /// Scaled vertical metrics of the face at this segment's size.
  pub fn metrics(&self) -> ScaledFaceMetrics {
    self.metrics
  }

  /// Advance of the logical prefix ending at `offset`, with the whitespace
  /// run immediately before `offset` excluded. This is the width line
  /// fitting compares against the available space: spaces before a break
  /// may overhang the margin.
  pub(crate) fn fit_advance_up_to(&self, offset: usize) -> f32 {
    let mut total = 0.0f32;
    let mut whitespace_run = 0.0f32;
    for (cluster, advance) in self.clusters.iter().zip(self.cluster_advances.iter()) {
      if cluster.byte_range.end > offset {
        break;
      }
      total += advance;
      if cluster.is_whitespace {
        whitespace_run += advance;
      } else {
        whitespace_run = 0.0;
      }
    }
    total - whitespace_run
  }

  pub fn is_empty(&self) -> bool {
    self.glyphs.is_empty()
  }

  /// True if `offset` is a valid caret stop: the start of a cluster or the
  /// end of the segment.
  pub fn is_cluster_boundary(&self, offset: usize) -> bool {
    offset == self.text_range.end
      || self
        .clusters
        .iter()
        .any(|cluster| cluster.byte_range.start == offset)
  }

  /// Caret x for a byte offset, measured from the segment's left edge.
  ///
  /// Offsets inside a cluster snap to the cluster start. Out-of-range
  /// offsets clamp to the segment ends.
  pub fn caret_x_for_byte(&self, offset: usize) -> f32 {
    caret_x_for_byte(
      &self.clusters,
      &self.cluster_advances,
      self.advance,
      self.is_rtl(),
      self.text_range.clone(),
      offset,
    )
  }

  /// Byte offset for a caret x, measured from the segment's left edge.
  ///
  /// Positions inside a cluster snap to the nearer boundary. Positions
  /// outside the segment clamp to its edges.
  pub fn byte_for_caret_x(&self, x: f32) -> usize {
    byte_for_caret_x(
      &self.clusters,
      &self.cluster_advances,
      self.advance,
      self.is_rtl(),
      self.text_range.clone(),
      x,
    )
  }
}

impl std::fmt::Debug for Segment {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Segment")
      .field("face", &self.face.family())
      .field("font_size", &self.font_size)
      .field("level", &self.level)
      .field("text_range", &self.text_range)
      .field("glyphs", &self.glyphs.len())
      .field("clusters", &self.clusters.len())
      .field("advance", &self.advance)
      .finish()
  }
}

/// Shared caret math, kept free of font handles so it can be tested against
/// synthetic cluster tables.
fn caret_x_for_byte(
  clusters: &[Cluster],
  advances: &[f32],
  total_advance: f32,
  rtl: bool,
  text_range: Range<usize>,
  offset: usize,
) -> f32 {
  let offset = offset.clamp(text_range.start, text_range.end);
  // Advance of clusters logically before the one containing `offset`.
  let mut prefix = 0.0f32;
  if offset >= text_range.end {
    prefix = total_advance;
  } else {
    for (cluster, advance) in clusters.iter().zip(advances.iter()) {
      if cluster.byte_range.contains(&offset) || cluster.byte_range.start >= offset {
        break;
      }
      prefix += advance;
    }
  }
  if rtl {
    total_advance - prefix
  } else {
    prefix
  }
}

fn byte_for_caret_x(
  clusters: &[Cluster],
  advances: &[f32],
  total_advance: f32,
  rtl: bool,
  text_range: Range<usize>,
  x: f32,
) -> usize {
  if clusters.is_empty() {
    return text_range.start;
  }
  let logical_start = text_range.start;
  let logical_end = text_range.end;
  if x <= 0.0 {
    return if rtl { logical_end } else { logical_start };
  }
  if x >= total_advance {
    return if rtl { logical_start } else { logical_end };
  }

  // Walk clusters in visual order, left to right. Zero-advance clusters
  // never contain an x and fall through to their neighbors.
  let mut left = 0.0f32;
  let order: Box<dyn Iterator<Item = usize>> = if rtl {
    Box::new((0..clusters.len()).rev())
  } else {
    Box::new(0..clusters.len())
  };
  for idx in order {
    let advance = advances[idx];
    let right = left + advance;
    if x < right {
      let cluster = &clusters[idx];
      // Midpoint rule: snap to the nearer visual edge.
      let leading = x - left <= right - x;
      return match (rtl, leading) {
        // LTR: left edge is the cluster start, right edge its end.
        (false, true) => cluster.byte_range.start,
        (false, false) => cluster.byte_range.end,
        // RTL: left edge is the cluster end, right edge its start.
        (true, true) => cluster.byte_range.end,
        (true, false) => cluster.byte_range.start,
      };
    }
    left = right;
  }
  if rtl {
    logical_start
  } else {
    logical_end
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // Synthetic three-cluster table over bytes 0..6, two bytes per cluster,
  // advances 10, 20, 30.
  fn fixture() -> (Vec<Cluster>, Vec<f32>) {
    let clusters = vec![
      Cluster {
        byte_range: 0..2,
        glyph_range: 0..1,
        is_whitespace: false,
      },
      Cluster {
        byte_range: 2..4,
        glyph_range: 1..2,
        is_whitespace: false,
      },
      Cluster {
        byte_range: 4..6,
        glyph_range: 2..3,
        is_whitespace: false,
      },
    ];
    (clusters, vec![10.0, 20.0, 30.0])
  }

  #[test]
  fn test_caret_x_ltr_boundaries() {
    let (clusters, advances) = fixture();
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 0), 0.0);
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 2), 10.0);
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 4), 30.0);
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 6), 60.0);
  }

  #[test]
  fn test_caret_x_snaps_inside_cluster_to_start() {
    let (clusters, advances) = fixture();
    // Offset 3 is inside the second cluster; caret lands at its start.
    assert_eq!(
      caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 3),
      caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 2),
    );
  }

  #[test]
  fn test_caret_x_rtl_mirrors() {
    let (clusters, advances) = fixture();
    // RTL: logical start sits at the right edge, logical end at x = 0.
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, true, 0..6, 0), 60.0);
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, true, 0..6, 2), 50.0);
    assert_eq!(caret_x_for_byte(&clusters, &advances, 60.0, true, 0..6, 6), 0.0);
  }

  #[test]
  fn test_byte_for_x_ltr_midpoint_snap() {
    let (clusters, advances) = fixture();
    // First cluster spans x 0..10; 4.0 is left of the midpoint.
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, 4.0), 0);
    // 6.0 is right of the midpoint, snaps to the trailing edge.
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, 6.0), 2);
    // Second cluster spans 10..30.
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, 29.0), 4);
  }

  #[test]
  fn test_byte_for_x_clamps_outside() {
    let (clusters, advances) = fixture();
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, -5.0), 0);
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, 99.0), 6);
    // RTL edges are mirrored.
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, true, 0..6, -5.0), 6);
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, true, 0..6, 99.0), 0);
  }

  #[test]
  fn test_byte_for_x_rtl_walks_visual_order() {
    let (clusters, advances) = fixture();
    // Visual order for RTL is the logical reverse: the third cluster
    // (advance 30) occupies x 0..30, so x = 5 sits in its right half
    // measured from that cluster's leading (right) edge at x = 30.
    let byte = byte_for_caret_x(&clusters, &advances, 60.0, true, 0..6, 5.0);
    assert_eq!(byte, 6);
    // Near that cluster's right edge the caret snaps to its start.
    let byte = byte_for_caret_x(&clusters, &advances, 60.0, true, 0..6, 28.0);
    assert_eq!(byte, 4);
  }

  #[test]
  fn test_caret_roundtrip_on_boundaries() {
    let (clusters, advances) = fixture();
    // Nudge right off the exact edge so the hit lands in the cluster the
    // boundary leads, then expect the leading-edge snap to return it.
    for offset in [0usize, 2, 4] {
      let x = caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, offset);
      assert_eq!(
        byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, x + 0.5),
        offset
      );
    }
    let end = caret_x_for_byte(&clusters, &advances, 60.0, false, 0..6, 6);
    assert_eq!(byte_for_caret_x(&clusters, &advances, 60.0, false, 0..6, end), 6);
  }

  #[test]
  fn test_zero_advance_cluster_is_skipped_in_hit_testing() {
    // A mark cluster with no advance between two letter clusters.
    let clusters = vec![
      Cluster {
        byte_range: 0..1,
        glyph_range: 0..1,
        is_whitespace: false,
      },
      Cluster {
        byte_range: 1..3,
        glyph_range: 1..2,
        is_whitespace: false,
      },
      Cluster {
        byte_range: 3..4,
        glyph_range: 2..3,
        is_whitespace: false,
      },
    ];
    let advances = vec![10.0, 0.0, 10.0];
    // The third cluster spans x 10..20; hits there never land in the
    // zero-width cluster that also starts at x = 10.
    assert_eq!(byte_for_caret_x(&clusters, &advances, 20.0, false, 0..4, 12.0), 3);
    assert_eq!(byte_for_caret_x(&clusters, &advances, 20.0, false, 0..4, 18.0), 4);
  }
}
