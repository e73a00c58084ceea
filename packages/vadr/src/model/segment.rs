use super::feature::Feature;
use crate::coords::Strand;
use serde::{Deserialize, Serialize};

/// One span of one feature's coords, in global segment order across the whole
/// model (spec.md §3.2: `(start, stop, strand, map_ftr, is_5p, is_3p)`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
  pub start: usize,
  pub stop: usize,
  pub strand: Strand,
  /// Index of the owning feature within [`super::FeatureTable::features`].
  pub map_ftr: usize,
  /// `true` for the first segment of its feature.
  pub is_5p: bool,
  /// `true` for the last segment of its feature.
  pub is_3p: bool,
}

/// Walks `features` in index order, expands each feature's coords into
/// [`SegmentInfo`]s in order, and records each feature's `sgm_5p_idx`/`sgm_3p_idx`.
pub(super) fn derive_segments(features: &mut [Feature]) -> Vec<SegmentInfo> {
  let mut segments = Vec::new();
  for (ftr_idx, feature) in features.iter_mut().enumerate() {
    let ftr_segments = feature.coords.segments();
    let first_global_idx = segments.len();
    let last_local_idx = ftr_segments.len() - 1;
    for (local_idx, seg) in ftr_segments.iter().enumerate() {
      segments.push(SegmentInfo {
        start: seg.start,
        stop: seg.stop,
        strand: seg.strand,
        map_ftr: ftr_idx,
        is_5p: local_idx == 0,
        is_3p: local_idx == last_local_idx,
      });
    }
    feature.sgm_5p_idx = Some(first_global_idx);
    feature.sgm_3p_idx = Some(segments.len() - 1);
  }
  segments
}
