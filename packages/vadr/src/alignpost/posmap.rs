//! Position-map construction (spec.md §3.6): `map[m]` for model position `m`
//! is the aligned sequence position (positive), a gap encoded as the negated
//! 5'-most sequence position seen before it (or `0` if none seen yet), built
//! from the same CIGAR walk as [`super::cigar::decode_cigar`].

use super::cigar::walk;
use crate::make_error;
use eyre::Report;

/// `map[m]` for `m` in `1..=mdl_len`; index `0` is unused padding so the
/// vector can be indexed directly by 1-based model position.
#[must_use]
pub struct PositionMap {
  map: Vec<isize>,
}

impl PositionMap {
  /// `map[m] > 0`: aligned sequence position. `map[m] < 0`: gap, magnitude is
  /// the 5'-most sequence position seen before the gap. `map[m] == 0`: gap
  /// with no sequence position seen yet.
  #[must_use]
  pub fn at(&self, mdl_pos: usize) -> isize {
    self.map[mdl_pos]
  }

  #[must_use]
  pub fn mdl_len(&self) -> usize {
    self.map.len() - 1
  }
}

/// Builds the position map for one CIGAR-aligned query. Requires the walk's
/// consumed model and sequence lengths to equal `mdl_len`/`seq_len` exactly
/// (spec.md §4.5 "Position map").
pub fn build_position_map(cigar: &str, mdl_start: usize, seq_start: usize, mdl_len: usize, seq_len: usize) -> Result<PositionMap, Report> {
  let walked = walk(cigar, mdl_start, seq_start, mdl_len)?;
  if walked.model_consumed != mdl_len {
    return make_error!(
      "CIGAR '{cigar}' consumes {} model positions, expected mdl_len={mdl_len}",
      walked.model_consumed
    );
  }
  if walked.seq_consumed != seq_len {
    return make_error!(
      "CIGAR '{cigar}' consumes {} sequence positions, expected seq_len={seq_len}",
      walked.seq_consumed
    );
  }
  Ok(PositionMap { map: walked.position_map })
}
