//! Parsed font faces and their metrics
//!
//! A [`FontFace`] bundles the raw face bytes with a parsed face handle ready
//! for shaping and outline extraction. Parsing happens once per face; the
//! parsed handle is shared behind `Arc` by the cache so every segment shaped
//! with the same face reuses the same tables.

use crate::error::{FontError, Result};
use std::sync::Arc;

/// Design-space metrics read from the face's tables.
///
/// All values are in font units and must be scaled by size / units_per_em.
#[derive(Debug, Clone, Copy)]
pub struct FaceMetrics {
  /// Units per em (typically 1000 or 2048).
  pub units_per_em: u16,
  /// Distance from baseline to top, positive.
  pub ascender: i16,
  /// Distance from baseline to bottom, typically negative.
  pub descender: i16,
  /// Additional spacing between lines.
  pub line_gap: i16,
}

impl FaceMetrics {
  fn from_face(face: &ttf_parser::Face) -> Self {
    Self {
      units_per_em: face.units_per_em(),
      ascender: face.ascender(),
      descender: face.descender(),
      line_gap: face.line_gap(),
    }
  }

  /// Scales the metrics to a font size in points.
  pub fn scale(&self, font_size: f32) -> ScaledFaceMetrics {
    let scale = font_size / f32::from(self.units_per_em);
    let ascent = f32::from(self.ascender) * scale;
    let descent = -f32::from(self.descender) * scale;
    let line_gap = f32::from(self.line_gap) * scale;

    ScaledFaceMetrics {
      font_size,
      scale,
      ascent,
      descent,
      line_gap,
      line_height: ascent + descent + line_gap,
    }
  }
}

/// Face metrics scaled to a specific font size, in points.
#[derive(Debug, Clone, Copy)]
pub struct ScaledFaceMetrics {
  /// The font size these metrics were scaled to.
  pub font_size: f32,
  /// Scale factor (font_size / units_per_em).
  pub scale: f32,
  /// Ascent above the baseline, positive.
  pub ascent: f32,
  /// Descent below the baseline, positive.
  pub descent: f32,
  /// Line gap.
  pub line_gap: f32,
  /// Default line height (ascent + descent + line_gap).
  pub line_height: f32,
}

/// A parsed font face, ready for shaping.
///
/// Identity is the (family, bold, italic) triple the face was requested
/// under, which may differ from the face's own names when a fallback face
/// stands in for a missing family. The cache keys entries by the requested
/// identity so repeated lookups are stable.
pub struct FontFace {
  data: Arc<Vec<u8>>,
  index: u32,
  family: String,
  bold: bool,
  italic: bool,
  face: rustybuzz::Face<'static>,
  metrics: FaceMetrics,
}

impl FontFace {
  /// Parses face data into a shaping-ready face.
  ///
  /// # Errors
  ///
  /// Returns [`FontError::FaceParseFailed`] if the bytes cannot be parsed.
  pub fn parse(
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
    bold: bool,
    italic: bool,
  ) -> Result<Self> {
    // SAFETY: the Arc keeps the face data alive for the lifetime of this
    // struct, and the parsed face never leaves it.
    let static_data: &'static [u8] =
      unsafe { std::mem::transmute::<&[u8], &'static [u8]>(&*data) };

    let face =
      rustybuzz::Face::from_slice(static_data, index).ok_or_else(|| FontError::FaceParseFailed {
        family: family.clone(),
        reason: "unreadable face tables".to_string(),
      })?;
    let metrics = FaceMetrics::from_face(&face);

    Ok(Self {
      data,
      index,
      family,
      bold,
      italic,
      face,
      metrics,
    })
  }

  /// The family name this face was requested under.
  #[inline]
  pub fn family(&self) -> &str {
    &self.family
  }

  /// Whether this face stands for the bold style of the family.
  #[inline]
  pub fn is_bold(&self) -> bool {
    self.bold
  }

  /// Whether this face stands for the italic style of the family.
  #[inline]
  pub fn is_italic(&self) -> bool {
    self.italic
  }

  /// The parsed face handle used for shaping and glyph queries.
  #[inline]
  pub fn shaper(&self) -> &rustybuzz::Face<'static> {
    &self.face
  }

  /// Units per em from the face header.
  #[inline]
  pub fn units_per_em(&self) -> u16 {
    self.metrics.units_per_em
  }

  /// Design-space metrics.
  #[inline]
  pub fn metrics(&self) -> FaceMetrics {
    self.metrics
  }

  /// Glyph ID for a character, if the face maps it.
  #[inline]
  pub fn glyph_index(&self, c: char) -> Option<u16> {
    self.face.glyph_index(c).map(|id| id.0)
  }

  /// The raw face bytes backing this face.
  #[inline]
  pub fn data(&self) -> Arc<Vec<u8>> {
    Arc::clone(&self.data)
  }

  /// Face index within the file (for TTC collections).
  #[inline]
  pub fn index(&self) -> u32 {
    self.index
  }
}

impl std::fmt::Debug for FontFace {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FontFace")
      .field("family", &self.family)
      .field("bold", &self.bold)
      .field("italic", &self.italic)
      .field("index", &self.index)
      .field("units_per_em", &self.metrics.units_per_em)
      .finish()
  }
}
