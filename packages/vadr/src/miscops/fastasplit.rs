//! Parses the external fasta-splitter's stdout contract: one line per created
//! shard file, naming the file and how many sequences it holds (spec.md §4.6
//! "Shard fan-out"). Invoking the splitter binary itself is the caller's job;
//! this module only owns the output grammar.

use crate::make_error;
use eyre::Report;

/// One line of the splitter's listing: a created shard file and its sequence
/// count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitFileEntry {
  pub path: String,
  pub num_seqs: usize,
}

/// Parses the splitter's full stdout. Each non-blank line is `<path> <nseq>`,
/// whitespace-delimited, where `path` itself may contain no whitespace.
pub fn parse_split_listing(output: &str) -> Result<Vec<SplitFileEntry>, Report> {
  output
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(parse_line)
    .collect()
}

fn parse_line(line: &str) -> Result<SplitFileEntry, Report> {
  let mut parts = line.split_whitespace();
  let path = parts.next().ok_or_else(|| eyre::eyre!("Empty split-listing line"))?;
  let count_str = parts
    .next()
    .ok_or_else(|| eyre::eyre!("Split-listing line '{line}' is missing its sequence count"))?;
  if parts.next().is_some() {
    return make_error!("Split-listing line '{line}' has more than two fields");
  }
  let num_seqs: usize = count_str
    .parse()
    .map_err(|_| eyre::eyre!("Split-listing line '{line}' has a non-numeric sequence count '{count_str}'"))?;
  Ok(SplitFileEntry {
    path: path.to_owned(),
    num_seqs,
  })
}

/// Total sequences across every shard (used to sanity-check a split against
/// the input's known record count).
#[must_use]
pub fn total_sequences(entries: &[SplitFileEntry]) -> usize {
  entries.iter().map(|e| e.num_seqs).sum()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_listing_lines() -> Result<(), Report> {
    let listing = "shard.1.fa 120\nshard.2.fa 80\n";
    let entries = parse_split_listing(listing)?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], SplitFileEntry { path: "shard.1.fa".to_owned(), num_seqs: 120 });
    assert_eq!(total_sequences(&entries), 200);
    Ok(())
  }

  #[rstest]
  fn skips_blank_lines() -> Result<(), Report> {
    let entries = parse_split_listing("shard.1.fa 5\n\n  \nshard.2.fa 6\n")?;
    assert_eq!(entries.len(), 2);
    Ok(())
  }

  #[rstest]
  fn rejects_non_numeric_count() {
    assert!(parse_split_listing("shard.1.fa many").is_err());
  }

  #[rstest]
  fn rejects_extra_fields() {
    assert!(parse_split_listing("shard.1.fa 5 extra").is_err());
  }
}
