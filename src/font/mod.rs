//! Font discovery, face parsing, and the style-keyed face cache
//!
//! This module handles everything between "a family name and style flags"
//! and "a parsed face ready for shaping":
//! - **Discovery**: find installed fonts via `fontdb`, with disk fallbacks
//!   for minimal systems
//! - **Parsing**: parse face data once and share it behind `Arc`
//! - **Caching**: `FontCache` keys faces by (family, bold, italic) and
//!   tracks per-face reference counts so callers can release what they
//!   requested without tearing down faces still in use elsewhere
//!
//! # Example
//!
//! ```rust,ignore
//! use pageflow::font::{FontCache, FontLibrary};
//!
//! let mut cache = FontCache::new(FontLibrary::new());
//! let face = cache.font_face("serif", false, false)?;
//! println!("{} upem {}", face.family(), face.units_per_em());
//! cache.release("serif", false, false, false)?;
//! ```

pub mod cache;
pub mod face;
pub mod library;

pub use cache::{FlushMode, FontCache};
pub use face::{FaceMetrics, FontFace, ScaledFaceMetrics};
pub use library::{FontLibrary, FontStyle, FontWeight, LoadedFaceData};
