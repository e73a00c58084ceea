//! Static alert-kind catalog and per-feature exception engine (spec.md
//! component C3 "AlertRegistry").

mod catalog;
mod exception;
mod kind;

pub use exception::{exception_positions, exception_segments, parse_exception, ExcType, ExceptionValue};
pub use kind::{AlertKind, PerType};

use crate::make_error;
use eyre::Report;
use indexmap::IndexMap;

/// The process-wide, read-only registry of [`AlertKind`]s, built once at
/// startup (spec.md §3.7, §9 "Alert registry globals").
#[derive(Clone, Debug, Default)]
pub struct AlertRegistry {
  kinds: IndexMap<String, AlertKind>,
  /// `exc_key -> (code, exc_type)`, kept so feature-load validation is
  /// `O(fields)` rather than `O(fields * codes)` (spec.md §9 "Exception keys
  /// as open set").
  exc_key_index: IndexMap<String, ExcType>,
}

impl AlertRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// The full catalog described in spec.md §4.3 (a representative subset of
  /// the ~60-entry original spanning every named category and every
  /// specifically-named code).
  pub fn build_default() -> Result<Self, Report> {
    let mut registry = Self::new();
    catalog::populate(&mut registry)?;
    Ok(registry)
  }

  /// Registers one alert kind. Fails on a duplicate code or on any of §3.3's
  /// invariants. Assigns the next `order`.
  pub fn add(&mut self, kind: AlertKind) -> Result<(), Report> {
    if self.kinds.contains_key(&kind.code) {
      return make_error!("Duplicate alert code '{}'", kind.code);
    }
    check_invariants(&kind)?;

    if let Some(exc_key) = &kind.exc_key {
      if let Some(existing_type) = self.exc_key_index.get(exc_key) {
        if *existing_type != kind.exc_type.expect("exc_key implies exc_type") {
          return make_error!(
            "Alert code '{}' shares exc_key '{exc_key}' with a different exc_type than an earlier registration",
            kind.code
          );
        }
      } else {
        self.exc_key_index.insert(exc_key.clone(), kind.exc_type.expect("exc_key implies exc_type"));
      }
    }

    let mut kind = kind;
    kind.order = self.kinds.len();
    self.kinds.insert(kind.code.clone(), kind);
    Ok(())
  }

  /// Registers a one-sided invalidation relation: when `invalidator` is
  /// present, `code` is hidden from feature-table output. Each invalidator
  /// must exist, differ from `code`, and itself cause failure.
  pub fn set_invalidated_by(&mut self, code: &str, invalidators: &[&str]) -> Result<(), Report> {
    for invalidator in invalidators {
      if *invalidator == code {
        return make_error!("Alert code '{code}' cannot be invalidated by itself");
      }
      let inv_kind = self
        .kinds
        .get(*invalidator)
        .ok_or_else(|| eyre::eyre!("Unknown invalidator code '{invalidator}' for '{code}'"))?;
      if !inv_kind.causes_failure {
        return make_error!("Invalidator '{invalidator}' for '{code}' must itself cause failure");
      }
    }
    let invalidators = invalidators.iter().map(|s| (*s).to_owned()).collect();
    let kind = self.kinds.get_mut(code).ok_or_else(|| eyre::eyre!("Unknown alert code '{code}'"))?;
    kind.ftbl_invalid_by = invalidators;
    Ok(())
  }

  pub fn set_causes_failure(&mut self, code: &str, value: bool) -> Result<(), Report> {
    let kind = self.kinds.get_mut(code).ok_or_else(|| eyre::eyre!("Unknown alert code '{code}'"))?;
    if kind.always_fails && !value {
      return make_error!("Cannot unset causes_failure on '{code}': it is declared always_fails");
    }
    kind.causes_failure = value;
    Ok(())
  }

  pub fn set_misc_not_failure(&mut self, code: &str, value: bool) -> Result<(), Report> {
    let kind = self.kinds.get_mut(code).ok_or_else(|| eyre::eyre!("Unknown alert code '{code}'"))?;
    if kind.per_type != PerType::Feature {
      return make_error!("misc_not_failure only applies to per-feature alert '{code}'");
    }
    if kind.always_fails && value {
      return make_error!("Cannot set misc_not_failure on '{code}': it is declared always_fails");
    }
    kind.misc_not_failure = value;
    Ok(())
  }

  #[must_use]
  pub fn get(&self, code: &str) -> Option<&AlertKind> {
    self.kinds.get(code)
  }

  #[must_use]
  pub fn codes(&self) -> impl Iterator<Item = &str> {
    self.kinds.keys().map(String::as_str)
  }

  #[must_use]
  pub fn exc_type_for(&self, exc_key: &str) -> Option<ExcType> {
    self.exc_key_index.get(exc_key).copied()
  }

  /// `true` iff `code.causes_failure` and the feature's `misc_not_failure`
  /// doesn't demote it (spec.md §4.3).
  #[must_use]
  pub fn feature_alert_causes_failure(&self, ftr_misc_not_failure: bool, code: &str) -> bool {
    self.kinds.get(code).is_some_and(|kind| kind.causes_failure && !(ftr_misc_not_failure && kind.misc_not_failure))
  }

  /// The codes that, when present, hide `code` from feature-table output.
  #[must_use]
  pub fn ftbl_invalid_by(&self, code: &str) -> &[String] {
    self.kinds.get(code).map_or(&[], |kind| kind.ftbl_invalid_by.as_slice())
  }

  /// Checks that `ftbl_invalid_by` induces no cycles across the whole registry.
  pub fn check_ftbl_invalid_by_acyclic(&self) -> Result<(), Report> {
    for code in self.kinds.keys() {
      let mut visited = std::collections::HashSet::new();
      let mut stack = vec![code.as_str()];
      while let Some(current) = stack.pop() {
        if !visited.insert(current) {
          return make_error!("ftbl_invalid_by relation contains a cycle through '{code}'");
        }
        if let Some(kind) = self.kinds.get(current) {
          stack.extend(kind.ftbl_invalid_by.iter().map(String::as_str));
        }
      }
    }
    Ok(())
  }

  /// Given a sequence's raised alert codes (in any order), returns the subset
  /// that survives `ftbl_invalid_by` suppression for feature-table output
  /// (spec.md §8 scenario 4).
  #[must_use]
  pub fn suppress_invalidated<'a>(&self, raised: &'a [String]) -> Vec<&'a str> {
    let raised_set: std::collections::HashSet<&str> = raised.iter().map(String::as_str).collect();
    raised
      .iter()
      .map(String::as_str)
      .filter(|code| !self.ftbl_invalid_by(code).iter().any(|inv| raised_set.contains(inv.as_str())))
      .collect()
  }
}

fn check_invariants(kind: &AlertKind) -> Result<(), Report> {
  if kind.always_fails && (!kind.causes_failure || kind.misc_not_failure) {
    return make_error!("Alert '{}': always_fails requires causes_failure and !misc_not_failure", kind.code);
  }
  if kind.prevents_annot && kind.per_type != PerType::Sequence {
    return make_error!("Alert '{}': prevents_annot is only legal for per_type=sequence", kind.code);
  }
  if kind.misc_not_failure && kind.per_type != PerType::Feature {
    return make_error!("Alert '{}': misc_not_failure is only legal for per_type=feature", kind.code);
  }
  if kind.exc_key.is_some() != kind.exc_type.is_some() {
    return make_error!("Alert '{}': exc_key and exc_type must be set together", kind.code);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn basic_kind(code: &str) -> AlertKind {
    AlertKind {
      code: code.to_owned(),
      per_type: PerType::Feature,
      short_desc: "test".to_owned(),
      long_desc: "test alert".to_owned(),
      always_fails: false,
      causes_failure: true,
      prevents_annot: false,
      misc_not_failure: false,
      exc_key: None,
      exc_type: None,
      ftbl_invalid_by: Vec::new(),
      order: 0,
    }
  }

  #[rstest]
  fn rejects_duplicate_code() -> Result<(), Report> {
    let mut registry = AlertRegistry::new();
    registry.add(basic_kind("cdsstopn"))?;
    assert!(registry.add(basic_kind("cdsstopn")).is_err());
    Ok(())
  }

  #[rstest]
  fn always_fails_requires_causes_failure() {
    let mut kind = basic_kind("x");
    kind.always_fails = true;
    kind.causes_failure = false;
    let mut registry = AlertRegistry::new();
    assert!(registry.add(kind).is_err());
  }

  #[rstest]
  fn feature_alert_causes_failure_demoted_by_misc_not_failure() -> Result<(), Report> {
    let mut kind = basic_kind("indf5gap");
    kind.misc_not_failure = true;
    let mut registry = AlertRegistry::new();
    registry.add(kind)?;
    assert!(registry.feature_alert_causes_failure(false, "indf5gap"));
    assert!(!registry.feature_alert_causes_failure(true, "indf5gap"));
    Ok(())
  }

  #[rstest]
  fn invalidation_suppresses_in_feature_table() -> Result<(), Report> {
    let mut registry = AlertRegistry::new();
    registry.add(basic_kind("mutendcd"))?;
    registry.add(basic_kind("cdsstopn"))?;
    registry.set_invalidated_by("mutendcd", &["cdsstopn"])?;

    let raised = vec!["mutendcd".to_owned(), "cdsstopn".to_owned()];
    let visible = registry.suppress_invalidated(&raised);
    assert_eq!(visible, vec!["cdsstopn"]);
    Ok(())
  }

  #[rstest]
  fn invalidator_must_cause_failure() -> Result<(), Report> {
    let mut registry = AlertRegistry::new();
    let mut soft = basic_kind("ambgntrp");
    soft.causes_failure = false;
    registry.add(basic_kind("mutendcd"))?;
    registry.add(soft)?;
    assert!(registry.set_invalidated_by("mutendcd", &["ambgntrp"]).is_err());
    Ok(())
  }

  #[rstest]
  fn default_catalog_has_acyclic_invalidation() -> Result<(), Report> {
    let registry = AlertRegistry::build_default()?;
    registry.check_ftbl_invalid_by_acyclic()?;
    assert!(registry.get("cdsstopn").is_some());
    assert!(registry.get("indf5gap").is_some());
    assert!(registry.get("fst").is_some());
    Ok(())
  }
}
