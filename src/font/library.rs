//! Font library - discovery and loading of installed fonts
//!
//! Wraps the `fontdb` crate for font discovery and matching. The library
//! answers "which face file implements this family in this style" and hands
//! out the raw face bytes; parsing and caching happen in [`crate::font::face`]
//! and [`crate::font::cache`].
//!
//! Face data is shared via `Arc` so the same bytes back every parsed face and
//! every shaping call without copying.

use crate::error::{FontError, Result};
use fontdb::{Database, Family, Query, ID};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Font weight (100-900).
///
/// Only two weights matter for cache keying (normal and bold), but queries
/// accept the full numeric range so callers can request intermediate weights
/// when a family provides them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
  /// Normal/Regular (400)
  pub const NORMAL: Self = Self(400);
  /// Bold (700)
  pub const BOLD: Self = Self(700);

  /// Creates a new font weight, clamping to the valid range [100, 900].
  #[inline]
  pub fn new(weight: u16) -> Self {
    Self(weight.clamp(100, 900))
  }

  /// Returns the numeric weight value.
  #[inline]
  pub fn value(self) -> u16 {
    self.0
  }

  /// Weight for a boolean bold flag.
  #[inline]
  pub fn from_bold(bold: bool) -> Self {
    if bold {
      Self::BOLD
    } else {
      Self::NORMAL
    }
  }
}

impl Default for FontWeight {
  fn default() -> Self {
    Self::NORMAL
  }
}

/// Font style (normal or italic).
///
/// Oblique faces match as italic; the cache does not distinguish them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
  /// Normal upright text
  #[default]
  Normal,
  /// Italic or oblique text
  Italic,
}

impl FontStyle {
  /// Style for a boolean italic flag.
  #[inline]
  pub fn from_italic(italic: bool) -> Self {
    if italic {
      Self::Italic
    } else {
      Self::Normal
    }
  }
}

impl From<FontStyle> for fontdb::Style {
  fn from(style: FontStyle) -> Self {
    match style {
      FontStyle::Normal => fontdb::Style::Normal,
      FontStyle::Italic => fontdb::Style::Italic,
    }
  }
}

impl From<fontdb::Style> for FontStyle {
  fn from(style: fontdb::Style) -> Self {
    match style {
      fontdb::Style::Normal => FontStyle::Normal,
      fontdb::Style::Italic | fontdb::Style::Oblique => FontStyle::Italic,
    }
  }
}

/// Raw face data handed out by the library.
///
/// The bytes are shared via `Arc`; `index` selects the face within TTC
/// collections.
#[derive(Debug, Clone)]
pub struct LoadedFaceData {
  /// Face binary data, shared between all users of this face.
  pub data: Arc<Vec<u8>>,
  /// Face index within the file (for TTC font collections).
  pub index: u32,
  /// Family name recorded in the face.
  pub family: String,
  /// Weight recorded in the face.
  pub weight: FontWeight,
  /// Style recorded in the face.
  pub style: FontStyle,
}

/// Face files tried when system font discovery comes up empty.
///
/// Keeps shaping usable on stripped-down machines and CI runners.
const FALLBACK_FONT_FILES: &[&str] = &[
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
  "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
];

/// Query family lists tried for each generic name.
///
/// fontdb resolves a generic family to one configured literal name ("Arial"
/// for sans-serif), which many systems do not have. Concrete candidates
/// follow the generic in the query so the lookup still lands on whatever
/// implementation is installed.
fn generic_candidates(name: &str) -> Option<&'static [Family<'static>]> {
  match name.to_ascii_lowercase().as_str() {
    "serif" => Some(&[
      Family::Serif,
      Family::Name("Times New Roman"),
      Family::Name("Georgia"),
      Family::Name("DejaVu Serif"),
      Family::Name("Liberation Serif"),
      Family::Name("Noto Serif"),
      Family::Name("FreeSerif"),
    ]),
    "sans-serif" => Some(&[
      Family::SansSerif,
      Family::Name("Arial"),
      Family::Name("Helvetica"),
      Family::Name("Verdana"),
      Family::Name("DejaVu Sans"),
      Family::Name("Liberation Sans"),
      Family::Name("Noto Sans"),
      Family::Name("FreeSans"),
      Family::Name("Roboto"),
    ]),
    "monospace" => Some(&[
      Family::Monospace,
      Family::Name("Courier New"),
      Family::Name("Consolas"),
      Family::Name("DejaVu Sans Mono"),
      Family::Name("Liberation Mono"),
      Family::Name("Noto Sans Mono"),
      Family::Name("FreeMono"),
    ]),
    "cursive" => Some(&[Family::Cursive, Family::Name("Comic Sans MS")]),
    "fantasy" => Some(&[Family::Fantasy, Family::Name("Impact")]),
    _ => None,
  }
}

/// Font library
///
/// Owns the `fontdb` database and a byte cache so repeated loads of the same
/// face share one allocation.
///
/// # Example
///
/// ```rust,ignore
/// use pageflow::font::{FontLibrary, FontWeight, FontStyle};
///
/// let library = FontLibrary::new();
/// if let Some(id) = library.query("serif", FontWeight::NORMAL, FontStyle::Normal) {
///     let face = library.load(id).expect("face should load");
///     println!("{} ({} bytes)", face.family, face.data.len());
/// }
/// ```
pub struct FontLibrary {
  db: Database,
  data_cache: RwLock<HashMap<ID, Arc<Vec<u8>>>>,
}

impl FontLibrary {
  /// Creates a library populated with system fonts.
  ///
  /// If discovery finds nothing, well-known face files are tried so minimal
  /// environments still get a usable face.
  pub fn new() -> Self {
    let mut db = Database::new();
    db.load_system_fonts();

    if db.is_empty() {
      for path in FALLBACK_FONT_FILES {
        if let Ok(data) = std::fs::read(path) {
          db.load_font_data(data);
        }
      }
    }

    Self {
      db,
      data_cache: RwLock::new(HashMap::new()),
    }
  }

  /// Creates an empty library without scanning system fonts.
  ///
  /// Useful for tests that load specific faces.
  pub fn empty() -> Self {
    Self {
      db: Database::new(),
      data_cache: RwLock::new(HashMap::new()),
    }
  }

  /// Loads every face file under a directory, recursively.
  pub fn load_fonts_dir<P: AsRef<Path>>(&mut self, path: P) {
    self.db.load_fonts_dir(path);
  }

  /// Loads a face from raw bytes.
  ///
  /// # Errors
  ///
  /// Returns an error if the bytes are not a parseable face.
  pub fn load_font_data(&mut self, data: Vec<u8>) -> Result<()> {
    ttf_parser::Face::parse(&data, 0).map_err(|e| FontError::FaceParseFailed {
      family: "(memory)".to_string(),
      reason: format!("{:?}", e),
    })?;

    self.db.load_font_data(data);
    Ok(())
  }

  /// Finds the face best matching a family and style.
  ///
  /// `family` may be a concrete family name or a generic name like
  /// "sans-serif". Matching is fuzzy: the nearest weight and style win when
  /// there is no exact face.
  pub fn query(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<ID> {
    let families: Vec<Family> = match generic_candidates(family) {
      Some(candidates) => candidates.to_vec(),
      None => vec![Family::Name(family)],
    };

    let query = Query {
      families: &families,
      weight: fontdb::Weight(weight.0),
      style: style.into(),
      stretch: fontdb::Stretch::Normal,
    };

    self.db.query(&query)
  }

  /// Tries each family in order, then sans-serif, then any face at all.
  ///
  /// Returns `None` only when the library is empty.
  pub fn resolve(&self, families: &[&str], weight: FontWeight, style: FontStyle) -> Option<ID> {
    for family in families {
      if let Some(id) = self.query(family, weight, style) {
        return Some(id);
      }
    }

    self
      .query("sans-serif", weight, style)
      .or_else(|| self.db.faces().next().map(|info| info.id))
  }

  /// Loads face data for a query result.
  ///
  /// The bytes are cached per face ID, so every load of the same face shares
  /// one `Arc` allocation.
  pub fn load(&self, id: ID) -> Option<LoadedFaceData> {
    {
      let cache = self.data_cache.read().ok()?;
      if let Some(data) = cache.get(&id) {
        return self.describe(id, Arc::clone(data));
      }
    }

    let mut loaded: Option<Arc<Vec<u8>>> = None;
    self.db.with_face_data(id, |bytes, _index| {
      loaded = Some(Arc::new(bytes.to_vec()));
    });
    let data = loaded?;

    if let Ok(mut cache) = self.data_cache.write() {
      cache.insert(id, Arc::clone(&data));
    }

    self.describe(id, data)
  }

  fn describe(&self, id: ID, data: Arc<Vec<u8>>) -> Option<LoadedFaceData> {
    let info = self.db.face(id)?;
    Some(LoadedFaceData {
      data,
      index: info.index,
      family: info
        .families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "Unknown".to_string()),
      weight: FontWeight(info.weight.0),
      style: info.style.into(),
    })
  }

  /// Number of faces known to the library.
  #[inline]
  pub fn face_count(&self) -> usize {
    self.db.len()
  }

  /// Returns true if no faces are available at all.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.db.is_empty()
  }

  /// Loads the first face in the library, if any.
  pub fn first_face(&self) -> Option<LoadedFaceData> {
    let id = self.db.faces().next().map(|info| info.id)?;
    self.load(id)
  }
}

impl Default for FontLibrary {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_font_weight_clamping() {
    assert_eq!(FontWeight::new(0).value(), 100);
    assert_eq!(FontWeight::new(1000).value(), 900);
    assert_eq!(FontWeight::new(550).value(), 550);
  }

  #[test]
  fn test_font_weight_from_bold() {
    assert_eq!(FontWeight::from_bold(false), FontWeight::NORMAL);
    assert_eq!(FontWeight::from_bold(true), FontWeight::BOLD);
  }

  #[test]
  fn test_font_style_from_italic() {
    assert_eq!(FontStyle::from_italic(false), FontStyle::Normal);
    assert_eq!(FontStyle::from_italic(true), FontStyle::Italic);
  }

  #[test]
  fn test_oblique_matches_italic() {
    assert_eq!(FontStyle::from(fontdb::Style::Oblique), FontStyle::Italic);
  }

  #[test]
  fn test_generic_family_names() {
    assert!(generic_candidates("serif").is_some());
    assert!(generic_candidates("SANS-SERIF").is_some());
    assert!(generic_candidates("monospace").is_some());
    assert!(generic_candidates("Liberation Sans").is_none());
  }

  #[test]
  fn test_empty_library() {
    let library = FontLibrary::empty();
    assert!(library.is_empty());
    assert_eq!(library.face_count(), 0);
    assert!(library.first_face().is_none());
  }

  #[test]
  fn test_query_and_load_share_data() {
    let library = FontLibrary::new();
    if library.is_empty() {
      return;
    }

    if let Some(id) = library.query("sans-serif", FontWeight::NORMAL, FontStyle::Normal) {
      let first = library.load(id).expect("face should load");
      let second = library.load(id).expect("face should load");
      assert!(!first.data.is_empty());
      assert!(Arc::ptr_eq(&first.data, &second.data));
    }
  }

  #[test]
  fn test_resolve_falls_back() {
    let library = FontLibrary::new();
    if library.is_empty() {
      return;
    }

    let id = library.resolve(
      &["NoSuchFamily12345", "sans-serif"],
      FontWeight::NORMAL,
      FontStyle::Normal,
    );
    assert!(id.is_some());

    // Even a list with no match resolves to something.
    let id = library.resolve(&["NoSuchFamily12345"], FontWeight::NORMAL, FontStyle::Normal);
    assert!(id.is_some());
  }
}
