//! Merging two feature tables (spec.md §4.2 "Merging two feature tables").

use super::feature::Feature;
use crate::make_error;
use eyre::Report;

/// For each feature of `source`, finds the unique feature of `dest` that is
/// "consistent" with it (every qualifier key present in both has the same
/// value), then copies `source`'s qualifier-only keys into it.
pub(super) fn merge_from(dest: &mut [Feature], source: &[Feature]) -> Result<(), Report> {
  for (src_idx, src_ftr) in source.iter().enumerate() {
    let consistent: Vec<usize> = dest
      .iter()
      .enumerate()
      .filter(|(_, d)| is_consistent(d, src_ftr))
      .map(|(idx, _)| idx)
      .collect();

    let dest_idx = match consistent.as_slice() {
      [] => return make_error!("merge_from: source feature #{src_idx} has no consistent partner in destination"),
      [only] => *only,
      _ => {
        return make_error!(
          "merge_from: source feature #{src_idx} matches {} destination features (ambiguous)",
          consistent.len()
        )
      }
    };

    for (key, value) in &src_ftr.qualifiers {
      dest[dest_idx].qualifiers.entry(key.clone()).or_insert_with(|| value.clone());
    }
    for (code, value) in &src_ftr.exceptions {
      dest[dest_idx].exceptions.entry(code.clone()).or_insert_with(|| value.clone());
    }
  }
  Ok(())
}

fn is_consistent(a: &Feature, b: &Feature) -> bool {
  if a.ftr_type != b.ftr_type {
    return false;
  }
  a.qualifiers
    .iter()
    .filter_map(|(k, v)| b.qualifiers.get(k).map(|bv| (v, bv)))
    .all(|(v, bv)| v == bv)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::FeatureTable;
  use crate::model::RawFeature;
  use indexmap::IndexMap;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn raw(ftr_type: &str, location: &str, qualifiers: &[(&str, &str)]) -> RawFeature {
    RawFeature {
      ftr_type: ftr_type.to_owned(),
      location: location.to_owned(),
      qualifiers: qualifiers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect::<IndexMap<_, _>>(),
    }
  }

  #[rstest]
  fn merges_source_only_keys_into_consistent_destination() -> Result<(), Report> {
    let mut dest = FeatureTable::build(vec![raw("CDS", "1..30", &[("gene", "orf1")])], 1000, &[])?;
    let source = FeatureTable::build(vec![raw("CDS", "1..30", &[("gene", "orf1"), ("product", "polyprotein")])], 1000, &[])?;

    dest.merge_from(&source)?;
    assert_eq!(dest.features()[0].qualifiers.get("product").map(String::as_str), Some("polyprotein"));
    Ok(())
  }

  #[rstest]
  fn fails_when_no_consistent_partner_exists() -> Result<(), Report> {
    let mut dest = FeatureTable::build(vec![raw("CDS", "1..30", &[("gene", "orf1")])], 1000, &[])?;
    let source = FeatureTable::build(vec![raw("CDS", "1..30", &[("gene", "orf2")])], 1000, &[])?;
    assert!(dest.merge_from(&source).is_err());
    Ok(())
  }
}
