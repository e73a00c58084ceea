use super::exception::ExcType;
use serde::{Deserialize, Serialize};

/// Whether an alert is raised against a whole sequence or against one feature
/// of a sequence's annotation (spec.md §3.3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerType {
  Sequence,
  Feature,
}

/// A static alert-kind record (spec.md §3.3), keyed by its short `code`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertKind {
  pub code: String,
  pub per_type: PerType,
  pub short_desc: String,
  pub long_desc: String,
  pub always_fails: bool,
  pub causes_failure: bool,
  pub prevents_annot: bool,
  pub misc_not_failure: bool,
  pub exc_key: Option<String>,
  pub exc_type: Option<ExcType>,
  pub ftbl_invalid_by: Vec<String>,
  /// Monotonically increasing registration order; preserves stable output
  /// ordering (spec.md §9 "Alert registry globals").
  pub order: usize,
}
