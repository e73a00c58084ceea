//! Per-model feature/segment table (spec.md component C2 "FeatureInfo / SegmentInfo").
//!
//! A [`FeatureTable`] owns every [`Feature`] and derived [`SegmentInfo`] for one
//! reference model. It is built once from raw, GenBank-flavored input via
//! [`FeatureTable::build`] (the imputation pipeline), then frozen: nothing under
//! `vadr::model` mutates a table after construction.

mod feature;
mod impute;
mod merge;
mod query;
mod segment;
mod validate;

pub use feature::{AltSetSubn, Feature, RawFeature};
pub use impute::ImputeOverlapRule;
pub use segment::SegmentInfo;

use crate::coords::Coords;
use eyre::Report;

/// The per-model table of features and their derived segments, frozen after
/// [`FeatureTable::build`] returns.
#[derive(Clone, Debug)]
pub struct FeatureTable {
  model_length: usize,
  features: Vec<Feature>,
  segments: Vec<SegmentInfo>,
}

impl FeatureTable {
  /// Runs the full imputation pipeline (spec.md §4.2 steps 1-7) over `raw`,
  /// derives segments, and validates the result.
  pub fn build(raw: Vec<RawFeature>, model_length: usize, overlap_rules: &[ImputeOverlapRule]) -> Result<Self, Report> {
    let features = impute::run_pipeline(raw, overlap_rules)?;
    let mut table = Self {
      model_length,
      features,
      segments: Vec::new(),
    };
    table.segments = segment::derive_segments(&mut table.features);
    validate::validate(&table, None)?;
    Ok(table)
  }

  #[must_use]
  pub fn model_length(&self) -> usize {
    self.model_length
  }

  #[must_use]
  pub fn features(&self) -> &[Feature] {
    &self.features
  }

  #[must_use]
  pub fn segments(&self) -> &[SegmentInfo] {
    &self.segments
  }

  #[must_use]
  pub fn feature(&self, idx: usize) -> Option<&Feature> {
    self.features.get(idx)
  }

  /// Re-runs validation against an alert registry, additionally checking that
  /// every `<key>_exc` on every feature is registered and well-formed.
  pub fn validate_with_registry(&self, registry: &crate::alerts::AlertRegistry) -> Result<(), Report> {
    validate::validate(self, Some(registry))
  }

  /// Merges `other`'s feature qualifiers into `self`'s matching features (spec.md
  /// §4.2 "Merging two feature tables").
  pub fn merge_from(&mut self, other: &Self) -> Result<(), Report> {
    merge::merge_from(&mut self.features, &other.features)
  }

  #[must_use]
  pub fn num_segments(&self, ftr_idx: usize) -> Option<usize> {
    query::num_segments(&self.features[ftr_idx])
  }

  #[must_use]
  pub fn relative_segment_index(&self, ftr_idx: usize, sgm_idx: usize) -> Option<usize> {
    query::relative_segment_index(&self.features[ftr_idx], sgm_idx)
  }

  #[must_use]
  pub fn feature_summary_strand(&self, ftr_idx: usize) -> crate::coords::StrandSummary {
    self.features[ftr_idx].coords.strand_summary()
  }

  #[must_use]
  pub fn five_prime_most_position(&self, ftr_idx: usize) -> usize {
    query::five_prime_most_position(&self.features[ftr_idx])
  }

  #[must_use]
  pub fn three_prime_most_position(&self, ftr_idx: usize) -> usize {
    query::three_prime_most_position(&self.features[ftr_idx])
  }

  #[must_use]
  pub fn children(&self, ftr_idx: usize, ftr_type: Option<&str>) -> Vec<usize> {
    query::children(&self.features, ftr_idx, ftr_type)
  }

  #[must_use]
  pub fn count_type(&self, ftr_type: &str) -> usize {
    query::count_type(&self.features, ftr_type)
  }

  pub fn cds_startstop_codon_coords(&self, ftr_idx: usize) -> Result<(Coords, Coords), Report> {
    query::cds_startstop_codon_coords(&self.features[ftr_idx])
  }

  #[must_use]
  pub fn max_num_cds_segments(&self) -> usize {
    query::max_num_cds_segments(&self.features)
  }

  pub fn length_between_adjacent_segments(&self, ftr_idx: usize, rel_sgm_idx: usize) -> Result<isize, Report> {
    query::length_between_adjacent_segments(&self.features[ftr_idx], &self.segments, rel_sgm_idx)
  }
}
