//! Color type for text and background painting
//!
//! Colors are 8-bit RGBA. Alpha is stored as a byte rather than a float so
//! colors can key hash maps and sort deterministically; glyph batching groups
//! runs by exact (foreground, background) color pairs.

use std::fmt;

/// An RGBA color with 8-bit components.
///
/// # Examples
///
/// ```
/// use pageflow::Color;
///
/// let ink = Color::BLACK;
/// let highlight = Color::rgb(255, 255, 0);
/// assert!(Color::TRANSPARENT.is_transparent());
/// assert!(ink.is_opaque());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color {
  /// Red component (0-255).
  pub r: u8,
  /// Green component (0-255).
  pub g: u8,
  /// Blue component (0-255).
  pub b: u8,
  /// Alpha component (0 transparent, 255 opaque).
  pub a: u8,
}

impl Color {
  /// Fully transparent black.
  pub const TRANSPARENT: Self = Self {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
  };

  /// Opaque black.
  pub const BLACK: Self = Self {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
  };

  /// Opaque white.
  pub const WHITE: Self = Self {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
  };

  /// Creates a color from all four components.
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  /// Creates an opaque color from RGB components.
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  /// Returns true if the alpha channel is zero.
  ///
  /// Transparent backgrounds are skipped when painting glyph runs.
  pub fn is_transparent(self) -> bool {
    self.a == 0
  }

  /// Returns true if the alpha channel is 255.
  pub fn is_opaque(self) -> bool {
    self.a == 255
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.a == 255 {
      write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    } else {
      write!(
        f,
        "#{:02x}{:02x}{:02x}{:02x}",
        self.r, self.g, self.b, self.a
      )
    }
  }
}
