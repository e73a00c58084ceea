use crate::coords::Coords;
use crate::make_error;
use eyre::Report;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Un-imputed input to [`super::FeatureTable::build`]: one GenBank-flavored
/// feature as read off a model-info file, before any derived field is filled in.
#[derive(Clone, Debug)]
pub struct RawFeature {
  pub ftr_type: String,
  /// GenBank `location` string, consumed by [`crate::coords::from_location`].
  pub location: String,
  /// Everything else: `product`, `gene`, `note`, `parent_idx`, `*_exc`, the
  /// boolean-like and alternative-set keys — all as raw strings, resolved
  /// during imputation.
  pub qualifiers: IndexMap<String, String>,
}

/// Resolved target of an `alternative_ftr_set_subn` qualifier (spec.md §3.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AltSetSubn {
  /// `setname.k`: the `k`-th (1-based) feature of alternative set `set_name`.
  Literal { set_name: String, k: usize },
  /// A bare feature index.
  Index(usize),
}

impl AltSetSubn {
  pub fn parse(raw: &str) -> Result<Self, Report> {
    if let Ok(idx) = raw.parse::<usize>() {
      return Ok(Self::Index(idx));
    }
    let (set_name, k) = raw
      .rsplit_once('.')
      .ok_or_else(|| eyre::eyre!("Invalid alternative_ftr_set_subn value (expected integer or `setname.k`): '{raw}'"))?;
    let k: usize = k
      .parse()
      .map_err(|_| eyre::eyre!("Invalid 1-based index in alternative_ftr_set_subn value '{raw}'"))?;
    if k == 0 {
      return make_error!("alternative_ftr_set_subn index must be 1-based (>=1), got '{raw}'");
    }
    Ok(Self::Literal {
      set_name: set_name.to_owned(),
      k,
    })
  }
}

/// One feature record (spec.md §3.2), after the imputation pipeline has run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
  pub ftr_type: String,
  pub coords: Coords,
  pub parent_idx: Option<usize>,
  pub qualifiers: IndexMap<String, String>,
  pub outname: String,
  pub threepa_ftr_idx: Option<usize>,
  pub sgm_5p_idx: Option<usize>,
  pub sgm_3p_idx: Option<usize>,
  pub misc_not_failure: bool,
  pub is_deletable: bool,
  pub alternative_ftr_set: Option<String>,
  pub alternative_ftr_set_subn: Option<AltSetSubn>,
  pub canon_splice_sites: bool,
  /// `<alertkey>_exc` qualifiers, keyed by alert code (without the `_exc` suffix).
  pub exceptions: IndexMap<String, String>,
}

impl Feature {
  /// Sum of segment lengths; derived, never stored.
  #[must_use]
  pub fn length(&self) -> usize {
    self.coords.length()
  }

  #[must_use]
  pub fn is_cds(&self) -> bool {
    self.ftr_type == "CDS"
  }

  #[must_use]
  pub fn is_cds_or_mat_peptide_or_id_startstop(&self) -> bool {
    matches!(self.ftr_type.as_str(), "CDS" | "mat_peptide" | "idx_startstop")
  }
}

pub(super) fn parse_bool_qualifier(qualifiers: &IndexMap<String, String>, key: &str) -> Result<bool, Report> {
  match qualifiers.get(key).map(String::as_str) {
    None | Some("0") => Ok(false),
    Some("1") => Ok(true),
    Some(other) => make_error!("Qualifier '{key}' must be '0' or '1', got '{other}'"),
  }
}
