//! Backward-compatibility rewrites applied to a feature's qualifier map when
//! reading an older `.minfo` file (spec.md §4.4):
//!
//! 1. `;` is rewritten to `,` inside any `*_exc` value (the legacy separator).
//! 2. `indfstrn_exc` is renamed to `indfstr_exc`.
//! 3. `frameshift_exc` is renamed to `fst_exc`.
//! 4. `nmaxins_exc`/`nmaxdel_exc`/`xmaxins_exc`/`xmaxdel_exc` legacy
//!    `pos:value` lists are rewritten to modern `coords-segment:value` lists;
//!    the `x*` (protein) variants are additionally converted to nucleotide
//!    coordinates via the feature's own coords.

use crate::coords::{self, Coords, Segment, Strand};
use crate::make_error;
use eyre::Report;
use indexmap::IndexMap;

const NT_POSITION_KEYS: &[&str] = &["nmaxins_exc", "nmaxdel_exc"];
const PROTEIN_POSITION_KEYS: &[&str] = &["xmaxins_exc", "xmaxdel_exc"];

/// Applies every backward-compat rewrite to one feature's qualifier map.
/// `ftr_coords` is required only if a legacy `xmaxins_exc`/`xmaxdel_exc` key
/// is present, since converting a protein position to nucleotide coordinates
/// needs the feature's own coords as the `abs` reference.
pub fn rewrite_backward_compat(fields: &mut IndexMap<String, String>, ftr_coords: Option<&Coords>) -> Result<(), Report> {
  rewrite_legacy_separator(fields);
  rename_key(fields, "indfstrn_exc", "indfstr_exc")?;
  rename_key(fields, "frameshift_exc", "fst_exc")?;

  for &key in NT_POSITION_KEYS {
    if let Some(raw) = fields.shift_remove(&key.to_owned()) {
      fields.insert(key.to_owned(), rewrite_nt_position_list(&raw)?);
    }
  }
  for &key in PROTEIN_POSITION_KEYS {
    if let Some(raw) = fields.shift_remove(&key.to_owned()) {
      let coords = ftr_coords.ok_or_else(|| eyre::eyre!("Legacy key '{key}' needs the feature's coords to convert protein positions"))?;
      fields.insert(key.to_owned(), rewrite_protein_position_list(&raw, coords)?);
    }
  }
  Ok(())
}

fn rewrite_legacy_separator(fields: &mut IndexMap<String, String>) {
  for (key, value) in fields.iter_mut() {
    if key.ends_with("_exc") && value.contains(';') {
      *value = value.replace(';', ",");
    }
  }
}

fn rename_key(fields: &mut IndexMap<String, String>, old_key: &str, new_key: &str) -> Result<(), Report> {
  let Some(value) = fields.shift_remove(old_key) else {
    return Ok(());
  };
  if fields.contains_key(new_key) {
    return make_error!("Both legacy key '{old_key}' and modern key '{new_key}' are present");
  }
  fields.insert(new_key.to_owned(), value);
  Ok(())
}

/// Legacy `pos:value,pos:value` (bare nucleotide positions) to modern
/// `segment:value,...` where each legacy position becomes a single-position
/// plus-strand segment.
fn rewrite_nt_position_list(raw: &str) -> Result<String, Report> {
  let mut tokens = Vec::new();
  for token in raw.split(',') {
    let (pos_text, value) = token
      .rsplit_once(':')
      .ok_or_else(|| eyre::eyre!("Legacy position-value token '{token}' is missing a ':'"))?;
    let pos: usize = pos_text
      .parse()
      .map_err(|_| eyre::eyre!("Legacy position '{pos_text}' in token '{token}' is not a valid integer"))?;
    tokens.push(format!("{pos}..{pos}:+:{value}"));
  }
  Ok(tokens.join(","))
}

/// Legacy `pos:value,...` (bare amino-acid positions) to modern
/// `segment:value,...` in nucleotide coordinates, via [`coords::protein_rel_to_nuc_abs`]
/// against the feature's own coords.
fn rewrite_protein_position_list(raw: &str, ftr_coords: &Coords) -> Result<String, Report> {
  let mut tokens = Vec::new();
  for token in raw.split(',') {
    let (pos_text, value) = token
      .rsplit_once(':')
      .ok_or_else(|| eyre::eyre!("Legacy position-value token '{token}' is missing a ':'"))?;
    let pos: usize = pos_text
      .parse()
      .map_err(|_| eyre::eyre!("Legacy position '{pos_text}' in token '{token}' is not a valid integer"))?;
    let protein_rel = Coords::from_segment(Segment {
      start: pos,
      stop: pos,
      strand: Strand::Plus,
      start_trunc: false,
      stop_trunc: false,
    });
    let nt_abs = coords::protein_rel_to_nuc_abs(ftr_coords, &protein_rel)?;
    for segment in nt_abs.segments() {
      tokens.push(format!("{segment}:{value}"));
    }
  }
  Ok(tokens.join(","))
}
