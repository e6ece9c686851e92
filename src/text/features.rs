//! Font feature string parsing
//!
//! Shaping engines accept OpenType feature overrides as a compact string,
//! e.g. `"liga=0, smcp, -dlig"`. Items are comma separated; each item is a
//! feature tag with an optional value:
//!
//! - `tag=N` sets the feature to N
//! - `tag` or `+tag` enables the feature (value 1)
//! - `-tag` disables the feature (value 0)
//!
//! Tags are 1-4 ASCII characters, padded with spaces to the four bytes
//! OpenType requires.

use crate::error::{Result, ShapeError};
use rustybuzz::Feature;
use ttf_parser::Tag;

/// Parses a feature string into shaping features.
///
/// Returns an empty list for an empty or all-whitespace string. Later items
/// override earlier ones with the same tag.
///
/// # Errors
///
/// Returns [`ShapeError::InvalidFeature`] naming the offending item when a
/// tag or value does not parse.
pub fn parse_features(input: &str) -> Result<Vec<Feature>> {
  let mut features: Vec<Feature> = Vec::new();

  for raw_item in input.split(',') {
    let item = raw_item.trim();
    if item.is_empty() {
      continue;
    }

    let (tag_str, value) = parse_item(item)?;
    let tag = parse_tag(item, tag_str)?;

    // Last setting for a tag wins.
    features.retain(|f| f.tag != tag);
    features.push(Feature {
      tag,
      value,
      start: 0,
      end: u32::MAX,
    });
  }

  Ok(features)
}

fn parse_item(item: &str) -> Result<(&str, u32)> {
  if let Some(rest) = item.strip_prefix('-') {
    return Ok((rest.trim(), 0));
  }
  let item = item.strip_prefix('+').unwrap_or(item);

  match item.split_once('=') {
    Some((tag, value)) => {
      let value = value
        .trim()
        .parse::<u32>()
        .map_err(|_| ShapeError::InvalidFeature {
          feature: item.to_string(),
          reason: "value is not an unsigned integer".to_string(),
        })?;
      Ok((tag.trim(), value))
    }
    None => Ok((item, 1)),
  }
}

fn parse_tag(item: &str, tag: &str) -> Result<Tag> {
  if tag.is_empty() || tag.len() > 4 || !tag.bytes().all(|b| b.is_ascii_graphic()) {
    return Err(
      ShapeError::InvalidFeature {
        feature: item.to_string(),
        reason: "tag must be 1-4 printable ASCII characters".to_string(),
      }
      .into(),
    );
  }

  let mut bytes = [b' '; 4];
  bytes[..tag.len()].copy_from_slice(tag.as_bytes());
  Ok(Tag::from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn feature_value(features: &[Feature], tag: &[u8; 4]) -> Option<u32> {
    let tag = Tag::from_bytes(tag);
    features.iter().find(|f| f.tag == tag).map(|f| f.value)
  }

  #[test]
  fn test_empty_spec() {
    assert!(parse_features("").unwrap().is_empty());
    assert!(parse_features("  ,  ,").unwrap().is_empty());
  }

  #[test]
  fn test_bare_tag_enables() {
    let features = parse_features("smcp").unwrap();
    assert_eq!(feature_value(&features, b"smcp"), Some(1));
  }

  #[test]
  fn test_minus_disables() {
    let features = parse_features("-liga").unwrap();
    assert_eq!(feature_value(&features, b"liga"), Some(0));
  }

  #[test]
  fn test_explicit_value() {
    let features = parse_features("liga=0, salt=3").unwrap();
    assert_eq!(feature_value(&features, b"liga"), Some(0));
    assert_eq!(feature_value(&features, b"salt"), Some(3));
  }

  #[test]
  fn test_short_tags_are_padded() {
    let features = parse_features("cv1=2").unwrap();
    assert_eq!(feature_value(&features, b"cv1 "), Some(2));
  }

  #[test]
  fn test_last_setting_wins() {
    let features = parse_features("liga=1, -liga").unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(feature_value(&features, b"liga"), Some(0));
  }

  #[test]
  fn test_whole_text_range() {
    let features = parse_features("kern").unwrap();
    assert_eq!(features[0].start, 0);
    assert_eq!(features[0].end, u32::MAX);
  }

  #[test]
  fn test_bad_value_is_an_error() {
    assert!(parse_features("liga=x").is_err());
    assert!(parse_features("liga=-1").is_err());
  }

  #[test]
  fn test_bad_tag_is_an_error() {
    assert!(parse_features("toolong").is_err());
    assert!(parse_features("=1").is_err());
    assert!(parse_features("lig\u{e9}").is_err());
  }
}
