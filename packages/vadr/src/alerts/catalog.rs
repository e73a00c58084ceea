//! Seeds [`super::AlertRegistry`] with a representative subset of the ~60-entry
//! catalog spec.md §4.3 describes, spanning its six named categories
//! (classification, feature-structural, protein-vs-nt, similarity, ambiguity,
//! frameshift) and covering every code spec.md names explicitly.

use super::exception::ExcType;
use super::kind::{AlertKind, PerType};
use super::AlertRegistry;
use eyre::Report;

struct Seed {
  code: &'static str,
  per_type: PerType,
  short_desc: &'static str,
  long_desc: &'static str,
  always_fails: bool,
  causes_failure: bool,
  prevents_annot: bool,
  misc_not_failure: bool,
  exc_key: Option<(&'static str, ExcType)>,
}

const fn seq(code: &'static str, short: &'static str, long: &'static str, causes_failure: bool, prevents_annot: bool) -> Seed {
  Seed {
    code,
    per_type: PerType::Sequence,
    short_desc: short,
    long_desc: long,
    always_fails: false,
    causes_failure,
    prevents_annot,
    misc_not_failure: false,
    exc_key: None,
  }
}

const fn ftr(code: &'static str, short: &'static str, long: &'static str, causes_failure: bool) -> Seed {
  Seed {
    code,
    per_type: PerType::Feature,
    short_desc: short,
    long_desc: long,
    always_fails: false,
    causes_failure,
    prevents_annot: false,
    misc_not_failure: false,
    exc_key: None,
  }
}

const fn ftr_with_exc(
  code: &'static str,
  short: &'static str,
  long: &'static str,
  causes_failure: bool,
  exc_key: &'static str,
  exc_type: ExcType,
) -> Seed {
  Seed {
    code,
    per_type: PerType::Feature,
    short_desc: short,
    long_desc: long,
    always_fails: false,
    causes_failure,
    prevents_annot: false,
    misc_not_failure: false,
    exc_key: Some((exc_key, exc_type)),
  }
}

/// Every seed carries `misc_not_failure: false` out of `seq`/`ftr`/`ftr_with_exc`;
/// the handful that need it (or `always_fails`) are patched after construction
/// in [`populate`].
const SEEDS: &[Seed] = &[
  // --- classification (per_type = sequence) ---
  seq("noannotn", "no annotation", "sequence could not be annotated against any model", true, true),
  seq("qstsbgrp", "questionable subgroup", "sequence best-matches a model outside its expected subgroup", false, false),
  seq("lowsimis", "low similarity", "sequence has unusually low overall similarity to its best-matching model", true, false),
  // --- feature-structural ---
  ftr("indf5gap", "indefinite 5' end due to gap", "alignment has a gap at the feature's 5' boundary", true),
  ftr("indf3gap", "indefinite 3' end due to gap", "alignment has a gap at the feature's 3' boundary", true),
  // Modern code name; the model-info backward-compat pass (spec.md §4.4)
  // rewrites the legacy `indfstrn_exc` qualifier key to `indfstr_exc`, so the
  // registered code matches the post-rewrite key.
  ftr("indfstr", "indefinite strand", "feature strand could not be unambiguously determined", true),
  ftr("unjoinbl", "unjoinable segments", "feature's segments could not be joined into one coding span", false),
  // --- protein-vs-nt ---
  ftr("cdsstopn", "CDS stop codon", "in-frame stop codon exists prior to the predicted stop", true),
  ftr("mutendcd", "mutation at end of CDS", "expected stop codon is mutated", true),
  ftr_with_exc("nmaxins", "too many inserted nt", "number of inserted nucleotides exceeds the maximum allowed", true, "nmaxins", ExcType::CoordsValue),
  ftr_with_exc("nmaxdel", "too many deleted nt", "number of deleted nucleotides exceeds the maximum allowed", true, "nmaxdel", ExcType::CoordsValue),
  ftr_with_exc("xmaxins", "too many inserted aa", "number of inserted amino acids exceeds the maximum allowed", true, "xmaxins", ExcType::CoordsValue),
  ftr_with_exc("xmaxdel", "too many deleted aa", "number of deleted amino acids exceeds the maximum allowed", true, "xmaxdel", ExcType::CoordsValue),
  // --- similarity ---
  ftr("indfantn", "indefinite annotation", "feature's annotation is not well supported by the alignment", true),
  // --- ambiguity ---
  ftr("ambgntrp", "ambiguous nucleotide in region of possible translation", "feature region contains ambiguous nucleotide(s) overlapping a CDS", false),
  // --- frameshift ---
  ftr("fst", "possible frameshift", "predicted frameshift in coding sequence", true),
];

pub(super) fn populate(registry: &mut AlertRegistry) -> Result<(), Report> {
  for seed in SEEDS {
    let kind = AlertKind {
      code: seed.code.to_owned(),
      per_type: seed.per_type,
      short_desc: seed.short_desc.to_owned(),
      long_desc: seed.long_desc.to_owned(),
      always_fails: seed.always_fails,
      causes_failure: seed.causes_failure,
      prevents_annot: seed.prevents_annot,
      misc_not_failure: seed.misc_not_failure,
      exc_key: seed.exc_key.map(|(k, _)| k.to_owned()),
      exc_type: seed.exc_key.map(|(_, t)| t),
      ftbl_invalid_by: Vec::new(),
      order: 0,
    };
    registry.add(kind)?;
  }

  // spec.md §9 (iii): ambgntrp and unjoinbl are informational (causes_failure=0)
  // by design; already seeded that way above. `mutendcd` is invalidated by
  // `cdsstopn` (spec.md §8 scenario 4): when both are raised, the stop-codon
  // alert is the more specific explanation.
  registry.set_invalidated_by("mutendcd", &["cdsstopn"])?;

  registry.check_ftbl_invalid_by_acyclic()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn seeds_every_named_code() -> Result<(), Report> {
    let registry = AlertRegistry::build_default()?;
    for code in [
      "cdsstopn", "indf5gap", "indfstr", "mutendcd", "nmaxins", "nmaxdel", "xmaxins", "xmaxdel", "fst", "ambgntrp", "unjoinbl",
    ] {
      assert!(registry.get(code).is_some(), "missing seeded code '{code}'");
    }
    Ok(())
  }

  #[rstest]
  fn informational_codes_do_not_cause_failure() -> Result<(), Report> {
    let registry = AlertRegistry::build_default()?;
    assert!(!registry.get("ambgntrp").expect("seeded").causes_failure);
    assert!(!registry.get("unjoinbl").expect("seeded").causes_failure);
    Ok(())
  }
}
