//! Exception value parsing and expansion (spec.md §3.4).

use crate::coords::{self, Coords, Segment};
use crate::make_error;
use eyre::Report;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The two exception value shapes an alert's `exc_key` may carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExcType {
  /// A bare coords string: "this alert is tolerated at these coordinates."
  CoordsOnly,
  /// A comma-separated list of `segment:value` tokens: per-position thresholds.
  CoordsValue,
}

/// A parsed exception value, in the shape matching its [`ExcType`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExceptionValue {
  CoordsOnly(Coords),
  CoordsValue(Vec<(Segment, String)>),
}

/// Parses a raw `<key>_exc` value per its declared `exc_type`.
pub fn parse_exception(raw: &str, exc_type: ExcType) -> Result<ExceptionValue, Report> {
  match exc_type {
    ExcType::CoordsOnly => Ok(ExceptionValue::CoordsOnly(coords::parse(raw)?)),
    ExcType::CoordsValue => Ok(ExceptionValue::CoordsValue(parse_coords_value(raw)?)),
  }
}

fn parse_coords_value(raw: &str) -> Result<Vec<(Segment, String)>, Report> {
  let mut pairs = Vec::new();
  for token in raw.split(',') {
    let mut parts = token.rsplitn(2, ':');
    let value = parts.next().ok_or_else(|| eyre::eyre!("Empty coords-value token in '{raw}'"))?;
    let segment_text = parts
      .next()
      .ok_or_else(|| eyre::eyre!("coords-value token '{token}' is missing a `segment:value` separator"))?;
    let segment: Segment = segment_text
      .parse()
      .map_err(|err: Report| err.wrap_err(format!("Parsing segment in coords-value token '{token}'")))?;
    pairs.push((segment, value.to_owned()));
  }

  for i in 0..pairs.len() {
    for j in (i + 1)..pairs.len() {
      if coords::overlap(&pairs[i].0, &pairs[j].0).is_some() {
        return make_error!("coords-value segments must be pairwise non-overlapping, but '{}' overlaps '{}'", pairs[i].0, pairs[j].0);
      }
    }
  }

  Ok(pairs)
}

/// Expands a coords-only exception string into the set of positions it covers.
pub fn exception_segments(raw: &str, exc_type: ExcType) -> Result<ExceptionValue, Report> {
  parse_exception(raw, exc_type)
}

/// Expands any parsed exception value into a per-position map. For
/// `coords-only`, every covered position maps to `()`-equivalent presence
/// (represented here as an empty string); for `coords-value`, each position
/// maps to its segment's value.
pub fn exception_positions(value: &ExceptionValue) -> IndexMap<usize, String> {
  let mut positions = IndexMap::new();
  match value {
    ExceptionValue::CoordsOnly(coords) => {
      for segment in coords.segments() {
        for pos in segment_positions(segment) {
          positions.insert(pos, String::new());
        }
      }
    }
    ExceptionValue::CoordsValue(pairs) => {
      for (segment, value) in pairs {
        for pos in segment_positions(segment) {
          positions.insert(pos, value.clone());
        }
      }
    }
  }
  positions
}

fn segment_positions(segment: &Segment) -> Vec<usize> {
  let (lo, hi) = segment.lo_hi();
  (lo..=hi).collect()
}
