//! Error types for pageflow
//!
//! This module provides error types for all subsystems:
//! - Font errors (lookup, face parsing, cache misuse)
//! - Shaping errors (segment construction, feature parsing)
//! - Layout errors (pagination constraints, stale pages)
//! - Render errors (surface creation, painting, encoding)
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.

use thiserror::Error;

/// Result type alias for pageflow operations
///
/// # Examples
///
/// ```
/// use pageflow::Result;
///
/// fn lay_out() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for pageflow
///
/// Each variant wraps a more specific error type for that subsystem, so
/// callers can match on the broad category or drill into the detail.
#[derive(Error, Debug)]
pub enum Error {
  /// Font lookup, parsing, or cache error
  #[error("Font error: {0}")]
  Font(#[from] FontError),

  /// Text shaping or segment construction error
  #[error("Shaping error: {0}")]
  Shape(#[from] ShapeError),

  /// Pagination or layout stream error
  #[error("Layout error: {0}")]
  Layout(#[from] LayoutError),

  /// Painting or rasterization error
  #[error("Render error: {0}")]
  Render(#[from] RenderError),

  /// I/O error (font files, output files)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur during font lookup and face parsing
///
/// # Examples
///
/// ```
/// use pageflow::error::FontError;
///
/// let error = FontError::FamilyNotFound {
///     family: "Charis SIL".to_string(),
/// };
/// assert!(error.to_string().contains("Charis SIL"));
/// ```
#[derive(Error, Debug, Clone)]
pub enum FontError {
  /// No face matched the requested family, and fallback failed too
  #[error("Font family not found: '{family}'")]
  FamilyNotFound { family: String },

  /// The font database is empty (not even fallback fonts)
  #[error("No fonts available on system")]
  NoFontsAvailable,

  /// Face data exists but could not be parsed as a usable font
  #[error("Failed to parse face for '{family}': {reason}")]
  FaceParseFailed { family: String, reason: String },

  /// A face file could not be read from disk
  #[error("Failed to load font from '{path}': {reason}")]
  LoadFailed { path: String, reason: String },

  /// Release called more times than the face was handed out
  #[error("Unbalanced release of face '{family}'")]
  UnbalancedRelease { family: String },
}

/// Errors that occur during text shaping and segment construction
#[derive(Error, Debug, Clone)]
pub enum ShapeError {
  /// The shaper produced no output for a non-empty range
  #[error("Shaping failed for text '{text}': {reason}")]
  ShapingFailed { text: String, reason: String },

  /// The face lacks tables required for shaping
  #[error("Font '{family}' cannot be shaped: {reason}")]
  UnsupportedFont { family: String, reason: String },

  /// A font feature string could not be parsed
  #[error("Invalid font feature '{feature}': {reason}")]
  InvalidFeature { feature: String, reason: String },

  /// A segment range does not lie on character boundaries of the text
  #[error("Invalid segment range {start}..{end} for text of length {len}")]
  InvalidRange {
    start: usize,
    end: usize,
    len: usize,
  },
}

/// Errors that occur during pagination and layout
///
/// # Examples
///
/// ```
/// use pageflow::error::LayoutError;
///
/// let error = LayoutError::InvalidConstraints {
///     message: "Page height must be positive".to_string(),
/// };
/// println!("{}", error);
/// ```
#[derive(Error, Debug, Clone)]
pub enum LayoutError {
  /// Page or column constraints cannot be satisfied
  #[error("Invalid layout constraints: {message}")]
  InvalidConstraints { message: String },

  /// A page index is outside the stream's page list
  #[error("Page index {index} out of range: stream has {count} pages")]
  PageOutOfRange { index: usize, count: usize },

  /// An operation required a laid-out page but found a stale one
  #[error("Page {index} is stale after an edit and must be laid out again")]
  StalePage { index: usize },

  /// A box handle does not refer to a live arena entry
  #[error("Box handle {id} is not valid in this arena")]
  InvalidBoxHandle { id: usize },
}

/// Errors that occur during painting and rasterization
#[derive(Error, Debug, Clone)]
pub enum RenderError {
  /// Pixmap allocation failed or dimensions were degenerate
  #[error("Failed to create surface: {width}x{height}")]
  SurfaceCreationFailed { width: u32, height: u32 },

  /// A paint operation failed
  #[error("Paint operation failed: {operation}")]
  PaintFailed { operation: String },

  /// Output encoding failed
  #[error("Failed to encode output as {format}: {reason}")]
  EncodeFailed { format: String, reason: String },
}
