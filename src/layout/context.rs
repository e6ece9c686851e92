//! Shaping services for a layout pass
//!
//! Layout borrows the process-wide [`FontCache`] for its whole pass and
//! memoizes one [`ShapingEngine`] per distinct (family, bold, italic,
//! features) combination, so paragraphs re-shaping line after line do not
//! re-parse feature strings or re-query the cache. Every face reference the
//! context takes is released back to the cache when the context drops.

use crate::error::Result;
use crate::font::FontCache;
use crate::text::ShapingEngine;
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EngineKey {
  family: String,
  bold: bool,
  italic: bool,
  features: String,
}

/// Borrowed font cache plus per-pass engine memo.
pub struct ShapeContext<'a> {
  fonts: &'a mut FontCache,
  engines: FxHashMap<EngineKey, Arc<ShapingEngine>>,
}

impl<'a> ShapeContext<'a> {
  pub fn new(fonts: &'a mut FontCache) -> ShapeContext<'a> {
    ShapeContext {
      fonts,
      engines: FxHashMap::default(),
    }
  }

  /// The engine for one styled run, building and caching it on first use.
  pub fn engine_for(
    &mut self,
    family: &str,
    bold: bool,
    italic: bool,
    features: &str,
  ) -> Result<Arc<ShapingEngine>> {
    let key = EngineKey {
      family: family.to_string(),
      bold,
      italic,
      features: features.to_string(),
    };
    if let Some(engine) = self.engines.get(&key) {
      return Ok(engine.clone());
    }
    let face = self.fonts.font_face(family, bold, italic)?;
    let engine = match ShapingEngine::new(face, features) {
      Ok(engine) => Arc::new(engine),
      Err(err) => {
        // The face reference was taken above; give it back on failure.
        let _ = self.fonts.release(family, bold, italic, false);
        return Err(err);
      }
    };
    self.engines.insert(key, engine.clone());
    Ok(engine)
  }

  pub fn fonts(&mut self) -> &mut FontCache {
    self.fonts
  }
}

impl Drop for ShapeContext<'_> {
  fn drop(&mut self) {
    for key in self.engines.keys() {
      let _ = self.fonts.release(&key.family, key.bold, key.italic, false);
    }
  }
}

impl std::fmt::Debug for ShapeContext<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ShapeContext")
      .field("engines", &self.engines.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::font::FontLibrary;

  fn cache() -> Option<FontCache> {
    let library = FontLibrary::new();
    if library.is_empty() {
      return None;
    }
    Some(FontCache::new(library))
  }

  #[test]
  fn test_engine_for_memoizes() {
    let Some(mut fonts) = cache() else { return };
    let mut ctx = ShapeContext::new(&mut fonts);
    let a = ctx.engine_for("sans-serif", false, false, "").unwrap();
    let b = ctx.engine_for("sans-serif", false, false, "").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
  }

  #[test]
  fn test_distinct_styles_get_distinct_engines() {
    let Some(mut fonts) = cache() else { return };
    let mut ctx = ShapeContext::new(&mut fonts);
    let regular = ctx.engine_for("sans-serif", false, false, "").unwrap();
    let bold = ctx.engine_for("sans-serif", true, false, "").unwrap();
    assert!(!Arc::ptr_eq(&regular, &bold));
  }

  #[test]
  fn test_drop_releases_cache_references() {
    let Some(mut fonts) = cache() else { return };
    {
      let mut ctx = ShapeContext::new(&mut fonts);
      ctx.engine_for("sans-serif", false, false, "").unwrap();
    }
    // Auto flush mode reclaims the slot once the context released it.
    assert_eq!(fonts.cached_face_count(), 0);
  }
}
