//! Style-keyed font cache with reference counting
//!
//! The cache hands out `Arc<FontFace>` keyed by (family, bold, italic) and
//! counts how many times each face was requested. Callers release what they
//! requested; the flush mode decides what happens when a face's count reaches
//! zero. In [`FlushMode::Auto`] the slot is reclaimed immediately, so the next
//! lookup of that key misses and reloads rather than ever seeing a stale
//! entry. [`FlushMode::Manual`] keeps zero-count faces warm until an explicit
//! [`flush`](FontCache::flush), trading memory for re-parse cost.
//!
//! Family names match case-insensitively. A family the library cannot find
//! resolves to a fallback face, cached under the requested name so repeated
//! lookups of the missing family stay cheap.

use crate::error::{FontError, Result};
use crate::font::face::FontFace;
use crate::font::library::{FontLibrary, FontStyle, FontWeight};
use std::sync::Arc;

/// One slot per (bold, italic) combination.
const STYLE_SLOTS: usize = 4;

#[inline]
fn slot_index(bold: bool, italic: bool) -> usize {
  usize::from(bold) | (usize::from(italic) << 1)
}

/// Policy for faces whose reference count reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
  /// Reclaim a face as soon as its last reference is released.
  #[default]
  Auto,
  /// Keep zero-reference faces cached until [`FontCache::flush`].
  Manual,
}

struct SlotEntry {
  face: Arc<FontFace>,
  refs: usize,
}

struct FamilyEntry {
  family: String,
  slots: [Option<SlotEntry>; STYLE_SLOTS],
}

impl FamilyEntry {
  fn new(family: String) -> Self {
    Self {
      family,
      slots: [None, None, None, None],
    }
  }

  fn is_empty(&self) -> bool {
    self.slots.iter().all(Option::is_none)
  }
}

/// Reference-counted cache of parsed faces.
///
/// # Example
///
/// ```rust,ignore
/// use pageflow::font::{FontCache, FontLibrary};
///
/// let mut cache = FontCache::new(FontLibrary::new());
/// let regular = cache.font_face("serif", false, false)?;
/// let bold = cache.font_face("serif", true, false)?;
/// cache.release("serif", false, false, false)?;
/// cache.release("serif", true, false, false)?;
/// ```
pub struct FontCache {
  library: FontLibrary,
  // TODO: switch to a hash map if font variety grows; linear scan is fine
  // for the handful of families a document typically uses.
  entries: Vec<FamilyEntry>,
  flush_mode: FlushMode,
}

impl FontCache {
  /// Creates a cache over a font library, in [`FlushMode::Auto`].
  pub fn new(library: FontLibrary) -> Self {
    Self {
      library,
      entries: Vec::new(),
      flush_mode: FlushMode::Auto,
    }
  }

  /// The underlying font library.
  #[inline]
  pub fn library(&self) -> &FontLibrary {
    &self.library
  }

  /// Returns the face for (family, bold, italic), loading it on first use.
  ///
  /// Every call bumps the face's reference count and must be balanced by a
  /// [`release`](Self::release). While any reference is live, repeated calls
  /// with the same key return the same `Arc`.
  ///
  /// # Errors
  ///
  /// Returns [`FontError::NoFontsAvailable`] when the library has no faces at
  /// all, or [`FontError::FaceParseFailed`] when the matched face cannot be
  /// parsed.
  pub fn font_face(&mut self, family: &str, bold: bool, italic: bool) -> Result<Arc<FontFace>> {
    let key = normalize_family(family);
    let slot = slot_index(bold, italic);

    if let Some(entry) = self.entries.iter_mut().find(|e| e.family == key) {
      if let Some(slot_entry) = entry.slots[slot].as_mut() {
        slot_entry.refs += 1;
        return Ok(Arc::clone(&slot_entry.face));
      }
    }

    let face = self.cache_font_face(family, bold, italic)?;
    let idx = match self.entries.iter().position(|e| e.family == key) {
      Some(idx) => idx,
      None => {
        self.entries.push(FamilyEntry::new(key));
        self.entries.len() - 1
      }
    };
    self.entries[idx].slots[slot] = Some(SlotEntry {
      face: Arc::clone(&face),
      refs: 1,
    });

    Ok(face)
  }

  /// Releases one reference to the face for (family, bold, italic).
  ///
  /// When the count reaches zero the slot is reclaimed if `zap` is true or
  /// the cache is in [`FlushMode::Auto`]; in [`FlushMode::Manual`] (and
  /// without `zap`) the face stays cached until [`flush`](Self::flush).
  ///
  /// # Errors
  ///
  /// Returns [`FontError::UnbalancedRelease`] if the face is not cached or
  /// its count is already zero.
  pub fn release(&mut self, family: &str, bold: bool, italic: bool, zap: bool) -> Result<()> {
    let key = normalize_family(family);
    let slot = slot_index(bold, italic);

    let entry_idx = self
      .entries
      .iter()
      .position(|e| e.family == key)
      .ok_or_else(|| FontError::UnbalancedRelease {
        family: family.to_string(),
      })?;
    let entry = &mut self.entries[entry_idx];
    let slot_entry = entry.slots[slot]
      .as_mut()
      .ok_or_else(|| FontError::UnbalancedRelease {
        family: family.to_string(),
      })?;

    if slot_entry.refs == 0 {
      return Err(
        FontError::UnbalancedRelease {
          family: family.to_string(),
        }
        .into(),
      );
    }

    slot_entry.refs -= 1;

    if slot_entry.refs == 0 && (zap || self.flush_mode == FlushMode::Auto) {
      entry.slots[slot] = None;
      if entry.is_empty() {
        self.entries.remove(entry_idx);
      }
    }

    Ok(())
  }

  /// Current flush mode.
  #[inline]
  pub fn flush_mode(&self) -> FlushMode {
    self.flush_mode
  }

  /// Sets the flush mode.
  ///
  /// Switching back to [`FlushMode::Auto`] reclaims every face whose
  /// reference count is already zero.
  pub fn set_flush_mode(&mut self, mode: FlushMode) {
    let entering_auto = mode == FlushMode::Auto && self.flush_mode != mode;
    self.flush_mode = mode;
    if entering_auto {
      self.flush();
    }
  }

  /// Reclaims every face with a zero reference count.
  ///
  /// Returns the number of faces reclaimed.
  pub fn flush(&mut self) -> usize {
    let mut reclaimed = 0;
    self.entries.retain_mut(|entry| {
      for slot in entry.slots.iter_mut() {
        if slot.as_ref().is_some_and(|s| s.refs == 0) {
          *slot = None;
          reclaimed += 1;
        }
      }
      !entry.is_empty()
    });
    reclaimed
  }

  /// Number of faces currently cached, referenced or not.
  pub fn cached_face_count(&self) -> usize {
    self
      .entries
      .iter()
      .map(|entry| entry.slots.iter().flatten().count())
      .sum()
  }

  /// Reference count for a cached face, or zero if not cached.
  pub fn reference_count(&self, family: &str, bold: bool, italic: bool) -> usize {
    let key = normalize_family(family);
    self
      .entries
      .iter()
      .find(|e| e.family == key)
      .and_then(|entry| entry.slots[slot_index(bold, italic)].as_ref())
      .map_or(0, |slot| slot.refs)
  }

  fn cache_font_face(&self, family: &str, bold: bool, italic: bool) -> Result<Arc<FontFace>> {
    if self.library.is_empty() {
      return Err(FontError::NoFontsAvailable.into());
    }

    let weight = FontWeight::from_bold(bold);
    let style = FontStyle::from_italic(italic);
    let id = self
      .library
      .resolve(&[family], weight, style)
      .ok_or_else(|| FontError::FamilyNotFound {
        family: family.to_string(),
      })?;
    let loaded = self.library.load(id).ok_or(FontError::NoFontsAvailable)?;

    let face = FontFace::parse(
      loaded.data,
      loaded.index,
      family.to_string(),
      bold,
      italic,
    )?;
    Ok(Arc::new(face))
  }
}

fn normalize_family(family: &str) -> String {
  family.trim().to_lowercase()
}
