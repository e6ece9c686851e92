//! Core geometry types for layout and painting
//!
//! All units are typographic points (1/72 inch) in an abstract page space
//! unless a function documents otherwise. Rasterization maps points to device
//! pixels at the very end of the pipeline; everything before that stays in
//! point space so layout results are resolution-independent.
//!
//! # Coordinate System
//!
//! The origin is the top-left corner of the page or surface:
//! - Positive X extends to the right
//! - Positive Y extends downward
//!
//! Vertical offsets measured from the top of the document are called `ys`
//! throughout the crate (page start/end offsets, line tops and bottoms).

use std::fmt;

/// A 2D point in page space.
///
/// # Examples
///
/// ```
/// use pageflow::Point;
///
/// let p = Point::new(10.0, 20.0);
/// assert_eq!(p.x, 10.0);
/// assert_eq!(Point::ZERO, Point::new(0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
  /// Horizontal position, increases to the right.
  pub x: f32,
  /// Vertical position, increases downward.
  pub y: f32,
}

impl Point {
  /// The origin (0, 0).
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new point.
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  /// Returns this point shifted by `dx`/`dy`.
  pub fn offset(self, dx: f32, dy: f32) -> Self {
    Self {
      x: self.x + dx,
      y: self.y + dy,
    }
  }
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// A 2D size in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
  /// Horizontal extent.
  pub width: f32,
  /// Vertical extent.
  pub height: f32,
}

impl Size {
  /// A size with zero width and height.
  pub const ZERO: Self = Self {
    width: 0.0,
    height: 0.0,
  };

  /// Creates a new size.
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }

  /// Returns true if either dimension is zero or negative.
  pub fn is_empty(self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }
}

impl fmt::Display for Size {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}×{}", self.width, self.height)
  }
}

/// An axis-aligned rectangle in page space.
///
/// # Examples
///
/// ```
/// use pageflow::Rect;
///
/// let r = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
/// assert_eq!(r.max_x(), 110.0);
/// assert_eq!(r.max_y(), 70.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
  /// Top-left corner.
  pub origin: Point,
  /// Width and height.
  pub size: Size,
}

impl Rect {
  /// A zero-sized rectangle at the origin.
  pub const ZERO: Self = Self {
    origin: Point::ZERO,
    size: Size::ZERO,
  };

  /// Creates a rectangle from an origin point and size.
  pub const fn new(origin: Point, size: Size) -> Self {
    Self { origin, size }
  }

  /// Creates a rectangle from x, y, width, height components.
  pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      origin: Point::new(x, y),
      size: Size::new(width, height),
    }
  }

  /// X coordinate of the left edge.
  pub fn x(self) -> f32 {
    self.origin.x
  }

  /// Y coordinate of the top edge.
  pub fn y(self) -> f32 {
    self.origin.y
  }

  /// Width of the rectangle.
  pub fn width(self) -> f32 {
    self.size.width
  }

  /// Height of the rectangle.
  pub fn height(self) -> f32 {
    self.size.height
  }

  /// X coordinate of the left edge.
  pub fn min_x(self) -> f32 {
    self.origin.x
  }

  /// X coordinate of the right edge.
  pub fn max_x(self) -> f32 {
    self.origin.x + self.size.width
  }

  /// Y coordinate of the top edge.
  pub fn min_y(self) -> f32 {
    self.origin.y
  }

  /// Y coordinate of the bottom edge.
  pub fn max_y(self) -> f32 {
    self.origin.y + self.size.height
  }

  /// Returns true if this rectangle overlaps `other`.
  ///
  /// Rectangles that only touch at an edge or corner count as overlapping.
  pub fn intersects(self, other: Rect) -> bool {
    self.min_x() <= other.max_x()
      && self.max_x() >= other.min_x()
      && self.min_y() <= other.max_y()
      && self.max_y() >= other.min_y()
  }

  /// Smallest rectangle containing both `self` and `other`.
  pub fn union(self, other: Rect) -> Rect {
    let min_x = self.min_x().min(other.min_x());
    let min_y = self.min_y().min(other.min_y());
    let max_x = self.max_x().max(other.max_x());
    let max_y = self.max_y().max(other.max_y());
    Rect::from_xywh(min_x, min_y, max_x - min_x, max_y - min_y)
  }

  /// Returns this rectangle shifted by `dx`/`dy`.
  pub fn translate(self, dx: f32, dy: f32) -> Rect {
    Rect {
      origin: self.origin.offset(dx, dy),
      size: self.size,
    }
  }
}

/// Offsets on all four sides, in points.
///
/// Used for page margins. Follows top, right, bottom, left order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeOffsets {
  /// Top edge offset.
  pub top: f32,
  /// Right edge offset.
  pub right: f32,
  /// Bottom edge offset.
  pub bottom: f32,
  /// Left edge offset.
  pub left: f32,
}

impl EdgeOffsets {
  /// Zero offsets on all sides.
  pub const ZERO: Self = Self {
    top: 0.0,
    right: 0.0,
    bottom: 0.0,
    left: 0.0,
  };

  /// Creates offsets with the same value on all sides.
  pub const fn all(value: f32) -> Self {
    Self {
      top: value,
      right: value,
      bottom: value,
      left: value,
    }
  }

  /// Creates offsets with individual values per side.
  pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
    Self {
      top,
      right,
      bottom,
      left,
    }
  }

  /// Sum of left and right offsets.
  pub fn horizontal(self) -> f32 {
    self.left + self.right
  }

  /// Sum of top and bottom offsets.
  pub fn vertical(self) -> f32 {
    self.top + self.bottom
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_point_offset() {
    let p = Point::new(10.0, 20.0).offset(5.0, -3.0);
    assert_eq!(p, Point::new(15.0, 17.0));
  }

  #[test]
  fn test_size_is_empty() {
    assert!(Size::ZERO.is_empty());
    assert!(Size::new(0.0, 10.0).is_empty());
    assert!(Size::new(10.0, -1.0).is_empty());
    assert!(!Size::new(10.0, 10.0).is_empty());
  }

  #[test]
  fn test_rect_edges() {
    let r = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
    assert_eq!(r.min_x(), 10.0);
    assert_eq!(r.max_x(), 110.0);
    assert_eq!(r.min_y(), 20.0);
    assert_eq!(r.max_y(), 70.0);
  }

  #[test]
  fn test_rect_intersects() {
    let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
    let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0);
    let c = Rect::from_xywh(20.0, 20.0, 10.0, 10.0);
    let corner = Rect::from_xywh(10.0, 10.0, 10.0, 10.0);

    assert!(a.intersects(b));
    assert!(b.intersects(a));
    assert!(!a.intersects(c));
    assert!(a.intersects(corner));
  }

  #[test]
  fn test_rect_union() {
    let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
    let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0);
    assert_eq!(a.union(b), Rect::from_xywh(0.0, 0.0, 15.0, 15.0));
  }

  #[test]
  fn test_rect_translate() {
    let r = Rect::from_xywh(10.0, 10.0, 20.0, 20.0).translate(5.0, 3.0);
    assert_eq!(r, Rect::from_xywh(15.0, 13.0, 20.0, 20.0));
  }

  #[test]
  fn test_edge_offsets_sums() {
    let e = EdgeOffsets::new(5.0, 10.0, 15.0, 20.0);
    assert_eq!(e.horizontal(), 30.0);
    assert_eq!(e.vertical(), 20.0);
    assert_eq!(EdgeOffsets::all(4.0).horizontal(), 8.0);
  }
}
