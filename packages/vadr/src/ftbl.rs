//! Feature-table (`.ftbl`) writer.
//!
//! A supplemented feature (`SPEC_FULL.md` §2): spec.md §1 names "a feature table
//! suitable for database submission" as a required output but only specifies the
//! alert-suppression rule that governs its contents (§3.3 `ftbl_invalid_by`, §7
//! "User-visible failure"). This module is the direct consumer of that rule: it
//! turns a sequence's raised alerts into a pass/fail [`Verdict`], then renders a
//! model's [`FeatureTable`] under that verdict into the flat NCBI feature-table
//! text format (start, stop, type, then indented qualifier lines).
//!
//! Coordinate projection from model to query is a collaborator's job (the
//! classifier/aligner pipeline named out of scope in spec.md §1): callers pass in
//! a [`FeatureTable`] whose `coords` already reflect whatever the caller wants
//! rendered (model coords for a smoke test, query-projected coords in the real
//! pipeline).

use crate::alerts::AlertRegistry;
use crate::model::{Feature, FeatureTable};
use std::collections::HashSet;
use std::fmt::Write as _;

/// One alert raised against a sequence (spec.md §3.3). Sequence-level alerts
/// (`per_type = sequence`) carry `ftr_idx: None`; feature-level alerts carry the
/// index of the feature that raised them, so [`verdict`] can look up that
/// feature's `misc_not_failure` flag.
#[derive(Clone, Debug)]
pub struct RaisedAlert {
  pub code: String,
  pub ftr_idx: Option<usize>,
}

/// A sequence's pass/fail and annotation-suppression disposition (spec.md §7),
/// plus the alert codes that survive `ftbl_invalid_by` suppression for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
  pub passes: bool,
  pub annotation_suppressed: bool,
  pub visible_codes: Vec<String>,
}

/// Computes a sequence's verdict from its raised alerts.
///
/// Spec.md §7: "A sequence fails iff it carries ≥1 alert whose effective
/// `causes_failure` is true after applying `misc_not_failure` demotion and
/// `ftbl_invalid_by` suppression in feature-table view." Alerts invalidated by
/// another raised alert are dropped first; of what remains, a per-feature
/// alert's fatality is demoted when that feature has `misc_not_failure` set and
/// the alert kind allows the demotion. "A sequence's annotation is suppressed
/// iff it carries ≥1 alert with `prevents_annot`" — that check is independent
/// of suppression, since `prevents_annot` only ever appears on sequence-level
/// alerts (spec.md §3.3), which `ftbl_invalid_by` does not target here.
#[must_use]
pub fn verdict(registry: &AlertRegistry, features: &[Feature], alerts: &[RaisedAlert]) -> Verdict {
  let annotation_suppressed = alerts.iter().any(|alert| registry.get(&alert.code).is_some_and(|kind| kind.prevents_annot));

  let codes: Vec<String> = alerts.iter().map(|alert| alert.code.clone()).collect();
  let visible: HashSet<String> = registry.suppress_invalidated(&codes).into_iter().map(ToOwned::to_owned).collect();

  let passes = !alerts.iter().any(|alert| {
    visible.contains(alert.code.as_str()) && {
      let ftr_misc_not_failure = alert.ftr_idx.and_then(|idx| features.get(idx)).is_some_and(|ftr| ftr.misc_not_failure);
      registry.feature_alert_causes_failure(ftr_misc_not_failure, &alert.code)
    }
  });

  Verdict {
    passes,
    annotation_suppressed,
    visible_codes: codes.into_iter().filter(|code| visible.contains(code.as_str())).collect(),
  }
}

/// Renders `table`'s features under `seqid` into NCBI flat feature-table text.
/// Returns an empty string when `verdict.annotation_suppressed` — per spec.md §7,
/// a sequence carrying a `prevents_annot` alert gets no annotation at all.
#[must_use]
pub fn write_feature_table(seqid: &str, table: &FeatureTable, verdict: &Verdict) -> String {
  let mut out = String::new();
  if verdict.annotation_suppressed {
    return out;
  }
  let _ = writeln!(out, ">Feature {seqid}");
  for feature in table.features() {
    write_feature(&mut out, feature);
  }
  out
}

fn write_feature(out: &mut String, feature: &Feature) {
  for (idx, seg) in feature.coords.segments().iter().enumerate() {
    if idx == 0 {
      let _ = writeln!(out, "{}\t{}\t{}", seg.start, seg.stop, feature.ftr_type);
    } else {
      let _ = writeln!(out, "{}\t{}", seg.start, seg.stop);
    }
  }
  if feature.outname != feature.ftr_type {
    let qualifier_key = if feature.ftr_type == "CDS" || feature.ftr_type == "mat_peptide" { "product" } else { "gene" };
    if !feature.qualifiers.contains_key(qualifier_key) && !feature.qualifiers.contains_key("product") && !feature.qualifiers.contains_key("gene") {
      let _ = writeln!(out, "\t\t\t{qualifier_key}\t{}", feature.outname);
    }
  }
  for (key, value) in &feature.qualifiers {
    let _ = writeln!(out, "\t\t\t{key}\t{value}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alerts::{AlertKind, PerType};
  use crate::model::{FeatureTable, RawFeature};
  use indexmap::IndexMap;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn raw(ftr_type: &str, location: &str, qualifiers: &[(&str, &str)]) -> RawFeature {
    RawFeature {
      ftr_type: ftr_type.to_owned(),
      location: location.to_owned(),
      qualifiers: qualifiers.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect::<IndexMap<_, _>>(),
    }
  }

  fn kind(code: &str, per_type: PerType, causes_failure: bool, misc_not_failure: bool, prevents_annot: bool) -> AlertKind {
    AlertKind {
      code: code.to_owned(),
      per_type,
      short_desc: "test".to_owned(),
      long_desc: "test alert".to_owned(),
      always_fails: false,
      causes_failure,
      prevents_annot,
      misc_not_failure,
      exc_key: None,
      exc_type: None,
      ftbl_invalid_by: Vec::new(),
      order: 0,
    }
  }

  #[rstest]
  fn passes_with_no_alerts() {
    let registry = AlertRegistry::new();
    let v = verdict(&registry, &[], &[]);
    assert!(v.passes);
    assert!(!v.annotation_suppressed);
    assert!(v.visible_codes.is_empty());
  }

  #[rstest]
  fn fatal_alert_fails_sequence() -> Result<(), eyre::Report> {
    let mut registry = AlertRegistry::new();
    registry.add(kind("cdsstopn", PerType::Feature, true, false, false))?;
    let alerts = vec![RaisedAlert { code: "cdsstopn".to_owned(), ftr_idx: Some(0) }];
    let v = verdict(&registry, &[], &alerts);
    assert!(!v.passes);
    assert_eq!(v.visible_codes, vec!["cdsstopn".to_owned()]);
    Ok(())
  }

  #[rstest]
  fn misc_not_failure_demotes_feature_alert() -> Result<(), eyre::Report> {
    let mut registry = AlertRegistry::new();
    registry.add(kind("indf5gap", PerType::Feature, true, true, false))?;
    let features = vec![demoted_feature()];
    let alerts = vec![RaisedAlert { code: "indf5gap".to_owned(), ftr_idx: Some(0) }];
    let v = verdict(&registry, &features, &alerts);
    assert!(v.passes, "demoted alert must not fail the sequence");
    Ok(())
  }

  #[rstest]
  fn invalidated_alert_does_not_fail_and_is_hidden() -> Result<(), eyre::Report> {
    let mut registry = AlertRegistry::new();
    registry.add(kind("cdsstopn", PerType::Feature, true, false, false))?;
    registry.add(kind("mutendcd", PerType::Feature, true, false, false))?;
    registry.set_invalidated_by("mutendcd", &["cdsstopn"])?;
    let alerts = vec![
      RaisedAlert { code: "mutendcd".to_owned(), ftr_idx: Some(0) },
      RaisedAlert { code: "cdsstopn".to_owned(), ftr_idx: Some(0) },
    ];
    let v = verdict(&registry, &[], &alerts);
    assert!(!v.passes, "surviving cdsstopn still fails the sequence");
    assert_eq!(v.visible_codes, vec!["cdsstopn".to_owned()]);
    Ok(())
  }

  #[rstest]
  fn prevents_annot_suppresses_output() -> Result<(), eyre::Report> {
    let mut registry = AlertRegistry::new();
    registry.add(kind("noannotn", PerType::Sequence, true, false, true))?;
    let alerts = vec![RaisedAlert { code: "noannotn".to_owned(), ftr_idx: None }];
    let v = verdict(&registry, &[], &alerts);
    assert!(v.annotation_suppressed);

    let table = FeatureTable::build(vec![raw("CDS", "1..30", &[])], 30, &[])?;
    let text = write_feature_table("seq1", &table, &v);
    assert!(text.is_empty());
    Ok(())
  }

  #[rstest]
  fn renders_segments_and_qualifiers() -> Result<(), eyre::Report> {
    let table = FeatureTable::build(vec![raw("CDS", "join(1..10,20..33)", &[("product", "spike protein")])], 33, &[])?;
    let registry = AlertRegistry::new();
    let v = verdict(&registry, table.features(), &[]);
    let text = write_feature_table("seq1", &table, &v);
    assert_eq!(
      text,
      ">Feature seq1\n1\t10\tCDS\n20\t33\n\t\t\tproduct\tspike protein\n"
    );
    Ok(())
  }

  fn demoted_feature() -> Feature {
    let table = FeatureTable::build(vec![raw("CDS", "1..30", &[("misc_not_failure", "1")])], 30, &[]).expect("builds");
    table.features()[0].clone()
  }
}
