//! Derived, side-effect-free queries over a built [`super::FeatureTable`]
//! (spec.md §4.2 "Derived queries").

use super::feature::Feature;
use super::segment::SegmentInfo;
use crate::coords::{self, Coords, Strand};
use crate::make_internal_report;
use eyre::Report;

pub(super) fn num_segments(ftr: &Feature) -> Option<usize> {
  Some(ftr.sgm_3p_idx? - ftr.sgm_5p_idx? + 1)
}

pub(super) fn relative_segment_index(ftr: &Feature, sgm_idx: usize) -> Option<usize> {
  sgm_idx.checked_sub(ftr.sgm_5p_idx?)
}

/// The most 5' position of `ftr`'s coords, per the strand of its first segment.
pub fn five_prime_most_position(ftr: &Feature) -> usize {
  ftr.coords.segments()[0].start
}

/// The most 3' position of `ftr`'s coords, per the strand of its last segment.
pub fn three_prime_most_position(ftr: &Feature) -> usize {
  ftr.coords.segments().last().expect("coords is non-empty").stop
}

pub(super) fn children(features: &[Feature], ftr_idx: usize, ftr_type: Option<&str>) -> Vec<usize> {
  features
    .iter()
    .enumerate()
    .filter(|(_, f)| f.parent_idx == Some(ftr_idx))
    .filter(|(_, f)| ftr_type.is_none_or(|t| f.ftr_type == t))
    .map(|(idx, _)| idx)
    .collect()
}

pub(super) fn count_type(features: &[Feature], ftr_type: &str) -> usize {
  features.iter().filter(|f| f.ftr_type == ftr_type).count()
}

/// The 5' and 3' codon coordinates of a CDS feature, in absolute (reference
/// model) coordinates: `rel_to_abs` of `1..3:+` and `(L-2)..L:+` against the
/// feature's own coords used as the `abs` reference.
pub(super) fn cds_startstop_codon_coords(ftr: &Feature) -> Result<(Coords, Coords), Report> {
  let length = ftr.length();
  if length < 3 {
    return make_internal_report!("CDS feature is shorter than one codon (length={length})");
  }
  let start_codon_rel = Coords::from_segment(coords::seg(1, 3, Strand::Plus)?);
  let stop_codon_rel = Coords::from_segment(coords::seg(length - 2, length, Strand::Plus)?);
  let start_codon_abs = coords::rel_to_abs(&ftr.coords, &start_codon_rel)?;
  let stop_codon_abs = coords::rel_to_abs(&ftr.coords, &stop_codon_rel)?;
  Ok((start_codon_abs, stop_codon_abs))
}

pub(super) fn max_num_cds_segments(features: &[Feature]) -> usize {
  features
    .iter()
    .filter(|f| f.is_cds())
    .map(|f| f.coords.segments().len())
    .max()
    .unwrap_or(0)
}

/// The gap length on the model between two adjacent segments of `ftr`, signed
/// by strand (positive on `+`, negative on `-`). Fails if the two segments
/// don't share a strand.
pub(super) fn length_between_adjacent_segments(
  ftr: &Feature,
  all_segments: &[SegmentInfo],
  rel_sgm_idx: usize,
) -> Result<isize, Report> {
  let sgm_5p_idx = ftr
    .sgm_5p_idx
    .ok_or_else(|| eyre::eyre!("Feature has no derived segments yet"))?;
  let a = &all_segments[sgm_5p_idx + rel_sgm_idx];
  let b = &all_segments[sgm_5p_idx + rel_sgm_idx + 1];
  if a.strand != b.strand {
    return make_internal_report!("length_between_adjacent_segments: segments have differing strands");
  }
  Ok(match a.strand {
    Strand::Plus => b.start as isize - a.stop as isize - 1,
    Strand::Minus => a.stop as isize - b.start as isize - 1,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::impute::run_pipeline;
  use crate::model::segment::derive_segments;
  use crate::model::RawFeature;
  use indexmap::IndexMap;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn raw(ftr_type: &str, location: &str) -> RawFeature {
    RawFeature {
      ftr_type: ftr_type.to_owned(),
      location: location.to_owned(),
      qualifiers: IndexMap::new(),
    }
  }

  #[rstest]
  fn cds_startstop_codon_coords_at_ends() -> Result<(), Report> {
    let mut features = run_pipeline(vec![raw("CDS", "11..40")], &[])?;
    derive_segments(&mut features);
    let (start, stop) = cds_startstop_codon_coords(&features[0])?;
    assert_eq!(start.to_string(), "11..13:+");
    assert_eq!(stop.to_string(), "38..40:+");
    Ok(())
  }

  #[rstest]
  fn children_filters_by_parent_and_type() -> Result<(), Report> {
    let raws = vec![raw("gene", "1..100"), raw("CDS", "1..50"), raw("mat_peptide", "1..20")];
    let mut features = run_pipeline(raws, &[])?;
    features[1].parent_idx = Some(0);
    features[2].parent_idx = Some(0);
    derive_segments(&mut features);
    assert_eq!(children(&features, 0, None), vec![1, 2]);
    assert_eq!(children(&features, 0, Some("CDS")), vec![1]);
    Ok(())
  }

  #[rstest]
  fn length_between_adjacent_segments_on_plus_strand() -> Result<(), Report> {
    let mut features = run_pipeline(vec![raw("CDS", "join(1..10,20..30)")], &[])?;
    let segments = derive_segments(&mut features);
    assert_eq!(length_between_adjacent_segments(&features[0], &segments, 0)?, 9);
    Ok(())
  }
}
