//! The imputation pipeline (spec.md §4.2): turns [`RawFeature`]s into fully
//! populated [`Feature`]s. Idempotent — running it again over its own output
//! (by round-tripping through `RawFeature`) reproduces the same table, since
//! every derived field is recomputed from the qualifiers rather than carried
//! forward mutably.

use super::feature::{parse_bool_qualifier, AltSetSubn, Feature, RawFeature};
use crate::coords::{self, Strand};
use crate::make_error;
use eyre::Report;
use std::collections::HashMap;

/// One `impute_by_overlap` rule (spec.md §4.2 step 6): for each feature of
/// `dst_type` lacking `dst_key`, find the shortest `src_type` feature that
/// spans it and carries `src_key`, and copy that qualifier across.
#[derive(Clone, Debug)]
pub struct ImputeOverlapRule {
  pub src_type: String,
  pub src_key: String,
  pub dst_type: String,
  pub dst_key: String,
}

pub(super) fn run_pipeline(raw: Vec<RawFeature>, overlap_rules: &[ImputeOverlapRule]) -> Result<Vec<Feature>, Report> {
  // Steps 1-4: coords, length (derived, no field), parent_idx, outname.
  let mut type_counts: HashMap<String, usize> = HashMap::new();
  let mut features = raw
    .into_iter()
    .map(|r| build_one(r, &mut type_counts))
    .collect::<Result<Vec<_>, _>>()?;

  impute_threepa(&mut features)?;
  for rule in overlap_rules {
    impute_by_overlap(&mut features, rule)?;
  }

  Ok(features)
}

fn build_one(raw: RawFeature, type_counts: &mut HashMap<String, usize>) -> Result<Feature, Report> {
  let coords = coords::from_location(&raw.location)
    .map_err(|err| err.wrap_err(format!("Parsing location for feature of type '{}'", raw.ftr_type)))?;

  let parent_idx = raw
    .qualifiers
    .get("parent_idx")
    .map(|s| s.parse::<usize>())
    .transpose()
    .map_err(|_| eyre::eyre!("Invalid parent_idx qualifier"))?;

  let named_outname = raw.qualifiers.get("product").or_else(|| raw.qualifiers.get("gene")).cloned();

  let outname = named_outname.unwrap_or_else(|| {
    let count = type_counts.entry(raw.ftr_type.clone()).or_insert(0);
    *count += 1;
    format!("{}.{count}", raw.ftr_type)
  });

  let misc_not_failure = parse_bool_qualifier(&raw.qualifiers, "misc_not_failure")?;
  let is_deletable = parse_bool_qualifier(&raw.qualifiers, "is_deletable")?;
  let canon_splice_sites = parse_bool_qualifier(&raw.qualifiers, "canon_splice_sites")?;

  let alternative_ftr_set = raw.qualifiers.get("alternative_ftr_set").cloned();
  let alternative_ftr_set_subn = raw
    .qualifiers
    .get("alternative_ftr_set_subn")
    .map(|s| AltSetSubn::parse(s))
    .transpose()?;

  let mut exceptions = indexmap::IndexMap::new();
  let mut qualifiers = indexmap::IndexMap::new();
  for (key, value) in raw.qualifiers {
    if let Some(code) = key.strip_suffix("_exc") {
      exceptions.insert(code.to_owned(), value);
    } else if !matches!(
      key.as_str(),
      "parent_idx"
        | "misc_not_failure"
        | "is_deletable"
        | "canon_splice_sites"
        | "alternative_ftr_set"
        | "alternative_ftr_set_subn"
    ) {
      qualifiers.insert(key, value);
    }
  }

  Ok(Feature {
    ftr_type: raw.ftr_type,
    coords,
    parent_idx,
    qualifiers,
    outname,
    threepa_ftr_idx: None,
    sgm_5p_idx: None,
    sgm_3p_idx: None,
    misc_not_failure,
    is_deletable,
    alternative_ftr_set,
    alternative_ftr_set_subn,
    canon_splice_sites,
    exceptions,
  })
}

/// Step 5: for each mat_peptide, find the unique other mat_peptide on the same
/// strand whose 5'-most position is adjacent to this feature's 3'-most
/// position. Keeps the first qualifying peer in index order.
fn impute_threepa(features: &mut [Feature]) -> Result<(), Report> {
  let candidates: Vec<(usize, Strand, usize)> = features
    .iter()
    .enumerate()
    .filter(|(_, f)| f.ftr_type == "mat_peptide")
    .map(|(idx, f)| (idx, f.coords.strand_summary().as_strand().unwrap_or(Strand::Plus), five_prime_most(&f.coords)))
    .collect();

  let mut resolved = Vec::with_capacity(features.len());
  for (idx, f) in features.iter().enumerate() {
    if f.ftr_type != "mat_peptide" {
      resolved.push(None);
      continue;
    }
    let strand = f.coords.strand_summary().as_strand().unwrap_or(Strand::Plus);
    let three_prime = three_prime_most(&f.coords);
    let found = candidates.iter().find(|(other_idx, other_strand, other_5p)| {
      *other_idx != idx && *other_strand == strand && adjacent(three_prime, *other_5p, strand)
    });
    resolved.push(found.map(|(other_idx, ..)| *other_idx));
  }

  for (f, r) in features.iter_mut().zip(resolved) {
    f.threepa_ftr_idx = r;
  }
  Ok(())
}

fn adjacent(three_prime: usize, candidate_5p: usize, strand: Strand) -> bool {
  match strand {
    Strand::Plus => candidate_5p == three_prime + 1,
    Strand::Minus => candidate_5p + 1 == three_prime,
  }
}

fn five_prime_most(coords: &coords::Coords) -> usize {
  coords.segments()[0].start
}

fn three_prime_most(coords: &coords::Coords) -> usize {
  let last = *coords.segments().last().expect("coords is non-empty");
  last.stop
}

/// Step 6: propagate `src_key` from the shortest spanning `src_type` feature
/// onto each `dst_type` feature lacking `dst_key`.
fn impute_by_overlap(features: &mut [Feature], rule: &ImputeOverlapRule) -> Result<(), Report> {
  let sources: Vec<(usize, coords::Coords, Option<String>)> = features
    .iter()
    .enumerate()
    .filter(|(_, f)| f.ftr_type == rule.src_type)
    .map(|(idx, f)| (idx, f.coords.clone(), f.qualifiers.get(&rule.src_key).cloned()))
    .collect();

  let targets: Vec<usize> = features
    .iter()
    .enumerate()
    .filter(|(_, f)| f.ftr_type == rule.dst_type && !f.qualifiers.contains_key(&rule.dst_key))
    .map(|(idx, _)| idx)
    .collect();

  for dst_idx in targets {
    let dst_coords = features[dst_idx].coords.clone();
    let mut best: Option<(usize, usize, &str)> = None; // (length, src_idx, value)
    for (src_idx, src_coords, src_value) in &sources {
      let Some(value) = src_value.as_deref() else { continue };
      if !coords::spans(src_coords, &dst_coords) {
        continue;
      }
      let len = src_coords.length();
      match &best {
        None => best = Some((len, *src_idx, value)),
        Some((best_len, _, _)) if len < *best_len => best = Some((len, *src_idx, value)),
        Some((best_len, _, _)) if len == *best_len => {
          return make_error!(
            "impute_by_overlap({}, {}): ambiguous shortest spanning '{}' feature for feature #{dst_idx} (identical-coords tie)",
            rule.src_type,
            rule.src_key,
            rule.src_type
          );
        }
        _ => {}
      }
    }
    if let Some((_, _, value)) = best {
      features[dst_idx].qualifiers.insert(rule.dst_key.clone(), value.to_owned());
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
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
  fn outname_prefers_product_then_gene_then_typeindex() -> Result<(), Report> {
    let raws = vec![
      raw("CDS", "1..30", &[("product", "spike")]),
      raw("CDS", "40..70", &[("gene", "orf2")]),
      raw("CDS", "80..100", &[]),
    ];
    let features = run_pipeline(raws, &[])?;
    assert_eq!(features[0].outname, "spike");
    assert_eq!(features[1].outname, "orf2");
    assert_eq!(features[2].outname, "CDS.2");
    Ok(())
  }

  #[rstest]
  fn threepa_finds_adjacent_mat_peptide() -> Result<(), Report> {
    let raws = vec![raw("mat_peptide", "1..30", &[]), raw("mat_peptide", "31..60", &[])];
    let features = run_pipeline(raws, &[])?;
    assert_eq!(features[0].threepa_ftr_idx, Some(1));
    assert_eq!(features[1].threepa_ftr_idx, None);
    Ok(())
  }

  #[rstest]
  fn impute_by_overlap_picks_shortest_spanning_source() -> Result<(), Report> {
    let raws = vec![
      raw("gene", "1..1000", &[("gene", "long")]),
      raw("gene", "10..50", &[("gene", "short")]),
      raw("CDS", "20..30", &[]),
    ];
    let rule = ImputeOverlapRule {
      src_type: "gene".to_owned(),
      src_key: "gene".to_owned(),
      dst_type: "CDS".to_owned(),
      dst_key: "gene".to_owned(),
    };
    let features = run_pipeline(raws, &[rule])?;
    assert_eq!(features[2].qualifiers.get("gene").map(String::as_str), Some("short"));
    Ok(())
  }
}
