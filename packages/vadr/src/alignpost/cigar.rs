//! CIGAR decoding (spec.md §4.5, §6.5): the alphabet is `M`/`I`/`D` only, with
//! meanings specific to this system (note: swapped relative to SAM's usual
//! `I`/`D`). `M` consumes both sequence and model. `I` consumes model only
//! (a gap in the sequence: a deletion relative to the model). `D` consumes
//! sequence only (unaligned query bases inserted relative to the model).
//!
//! The worked example in spec.md §8 scenario 3 pins down a detail the prose
//! alone under-determines: `mdlpos_after` for a run of consecutive `D`s is
//! computed from a position counter that (unlike the "true" model coordinate
//! used for `spos`/`epos` and the position map) also advances across prior
//! `D` runs, not just `M`/`I`. The two counters coincide whenever no `I`
//! appears before the point in question; they're tracked separately below so
//! CIGARs that also contain `I` still decode core lengths correctly.

use super::insert::{InsertEntry, InsertTuple};
use crate::make_error;
use eyre::Report;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CigarOp {
  Match(usize),
  Insert(usize),
  Delete(usize),
}

fn cigar_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(\d+)([MID])").expect("valid regex"))
}

/// Parses a `(count[MID])+` string. Fails if any character falls outside the
/// matched runs (so `2M3X` is rejected, not silently truncated).
pub fn parse_cigar(cigar: &str) -> Result<Vec<CigarOp>, Report> {
  if cigar.is_empty() {
    return make_error!("CIGAR string is empty");
  }
  let mut ops = Vec::new();
  let mut consumed = 0usize;
  for caps in cigar_regex().captures_iter(cigar) {
    let whole = caps.get(0).expect("group 0 always matches");
    if whole.start() != consumed {
      return make_error!("CIGAR '{cigar}' has an unparseable token at byte {consumed}");
    }
    let count: usize = caps[1].parse().map_err(|_| eyre::eyre!("CIGAR '{cigar}' has a non-numeric run length"))?;
    if count == 0 {
      return make_error!("CIGAR '{cigar}' has a zero-length run");
    }
    let op = match &caps[2] {
      "M" => CigarOp::Match(count),
      "I" => CigarOp::Insert(count),
      "D" => CigarOp::Delete(count),
      other => return make_error!("CIGAR '{cigar}' has an unknown operator '{other}'"),
    };
    ops.push(op);
    consumed = whole.end();
  }
  if consumed != cigar.len() {
    return make_error!("CIGAR '{cigar}' has trailing unparseable characters");
  }
  Ok(ops)
}

pub(crate) struct CigarWalk {
  pub spos: usize,
  pub epos: usize,
  pub model_consumed: usize,
  pub seq_consumed: usize,
  pub ins: Vec<InsertTuple>,
  /// `position_map[m]` for `m` in `mdl_start..=epos`; unset entries (outside
  /// that range) are left at `0`.
  pub position_map: Vec<isize>,
  pub mdl_start: usize,
}

pub(crate) fn walk(cigar: &str, mdl_start: usize, seq_start: usize, mdl_len: usize) -> Result<CigarWalk, Report> {
  let ops = parse_cigar(cigar)?;

  let mut consensus_pos = mdl_start - 1;
  let mut running_pos = mdl_start - 1;
  let mut seq_pos = seq_start - 1;
  let mut ins = Vec::new();
  let mut position_map = vec![0isize; mdl_len + 1];

  for op in ops {
    match op {
      CigarOp::Match(count) => {
        for _ in 0..count {
          consensus_pos += 1;
          seq_pos += 1;
          if consensus_pos > mdl_len {
            return make_error!("CIGAR '{cigar}' consumes model position {consensus_pos}, beyond mdl_len={mdl_len}");
          }
          position_map[consensus_pos] = seq_pos as isize;
        }
        running_pos += count;
      }
      CigarOp::Insert(count) => {
        let gap_magnitude = seq_pos; // 0 if nothing seen yet, per spec.md §3.6
        for _ in 0..count {
          consensus_pos += 1;
          if consensus_pos > mdl_len {
            return make_error!("CIGAR '{cigar}' consumes model position {consensus_pos}, beyond mdl_len={mdl_len}");
          }
          position_map[consensus_pos] = -(gap_magnitude as isize);
        }
        running_pos += count;
      }
      CigarOp::Delete(count) => {
        ins.push(InsertTuple {
          mdlpos_after: running_pos,
          ua_seq_pos: seq_pos + 1,
          len: count,
        });
        running_pos += count;
        seq_pos += count;
      }
    }
  }

  Ok(CigarWalk {
    spos: mdl_start,
    epos: consensus_pos,
    model_consumed: consensus_pos - (mdl_start - 1),
    seq_consumed: seq_pos - (seq_start - 1),
    ins,
    position_map,
    mdl_start,
  })
}

/// Decodes a CIGAR into an [`InsertEntry`]. Fails unless the walk's consumed
/// model and sequence lengths exactly equal `mdl_len`/`seq_len`.
pub fn decode_cigar(cigar: &str, mdl_start: usize, seq_start: usize, mdl_len: usize, seq_len: usize) -> Result<InsertEntry, Report> {
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
  Ok(InsertEntry {
    spos: walked.spos,
    epos: walked.epos,
    ins: walked.ins,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  /// spec.md §8 scenario 3.
  #[rstest]
  fn decodes_worked_example() -> Result<(), Report> {
    let mdl_len = 2949 + 5129 + 2162;
    let seq_len = 2949 + 1 + 5129 + 7 + 2162;
    let entry = decode_cigar("2949M1D5129M7D2162M", 1, 1, mdl_len, seq_len)?;
    assert_eq!(entry.spos, 1);
    assert_eq!(entry.epos, mdl_len);
    assert_eq!(
      entry.ins,
      vec![
        InsertTuple { mdlpos_after: 2949, ua_seq_pos: 2950, len: 1 },
        InsertTuple { mdlpos_after: 8079, ua_seq_pos: 8080, len: 7 },
      ]
    );
    Ok(())
  }

  #[rstest]
  fn rejects_length_mismatch() {
    assert!(decode_cigar("10M", 1, 1, 11, 10).is_err());
    assert!(decode_cigar("10M", 1, 1, 10, 11).is_err());
  }

  #[rstest]
  fn rejects_unknown_operator() {
    assert!(parse_cigar("3M2X").is_err());
  }

  #[rstest]
  fn rejects_zero_length_run() {
    assert!(parse_cigar("0M5I").is_err());
  }

  #[rstest]
  fn pure_match_has_no_inserts() -> Result<(), Report> {
    let entry = decode_cigar("100M", 1, 1, 100, 100)?;
    assert!(entry.ins.is_empty());
    Ok(())
  }
}
