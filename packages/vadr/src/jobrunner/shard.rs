//! Shard fan-out sizing and split-listing validation (spec.md §4.6 "Shard
//! fan-out"). Invoking the external fasta splitter is the caller's job; this
//! module owns the arithmetic and the listing it parses (via
//! [`crate::miscops::parse_split_listing`]).

use crate::make_error;
use crate::miscops::{parse_split_listing, total_sequences, SplitFileEntry};
use eyre::Report;

/// `min(maxjobs, floor(total_len / (kb * 1000)))`, floored at 1.
#[must_use]
pub fn determine_shard_count(total_len: usize, kb: usize, maxjobs: usize) -> usize {
  let bytes_per_shard = kb.max(1) * 1000;
  let by_size = total_len / bytes_per_shard;
  by_size.clamp(1, maxjobs.max(1))
}

/// Parses the splitter's stdout and checks its reported sequence total
/// against the caller's expected count.
pub fn parse_and_validate_split(output: &str, expected_total_seqs: usize) -> Result<Vec<SplitFileEntry>, Report> {
  let entries = parse_split_listing(output)?;
  let got = total_sequences(&entries);
  if got != expected_total_seqs {
    return make_error!("Split produced {got} sequences across {} shards, expected {expected_total_seqs}", entries.len());
  }
  Ok(entries)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  #[case(500_000, 10, 8, 8)] // by-size would be 50, capped at maxjobs
  #[case(5_000, 10, 8, 1)] // by-size is 0, floored to 1
  #[case(45_000, 10, 8, 4)]
  fn computes_shard_count(#[case] total_len: usize, #[case] kb: usize, #[case] maxjobs: usize, #[case] expected: usize) {
    assert_eq!(determine_shard_count(total_len, kb, maxjobs), expected);
  }

  #[rstest]
  fn validates_matching_total() -> Result<(), Report> {
    let entries = parse_and_validate_split("shard.1.fa 3\nshard.2.fa 2\n", 5)?;
    assert_eq!(entries.len(), 2);
    Ok(())
  }

  #[rstest]
  fn rejects_mismatched_total() {
    assert!(parse_and_validate_split("shard.1.fa 3\n", 5).is_err());
  }
}
