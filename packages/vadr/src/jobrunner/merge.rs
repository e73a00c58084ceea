//! Shard output merging (spec.md §4.6 "Merging"). Three shapes: byte
//! concatenation, spacing-preserving table concatenation, and summary-table
//! merge with additive columns.
//!
//! Alignment merge (Stockholm + optional AFA) lives in
//! [`crate::alignpost::merge_alignment`]; §4.6 just calls it once per model.

use crate::make_error;
use eyre::Report;
use std::collections::BTreeMap;

/// Shape 1: byte-concatenate shard files in shard order.
#[must_use]
pub fn concatenate_only(shards: &[String]) -> String {
  shards.concat()
}

/// Finds the byte offset just past the end of the `n`th (1-indexed)
/// whitespace-delimited token, or `None` if the line has fewer tokens.
fn nth_token_end(line: &str, n: usize) -> Option<usize> {
  let mut count = 0;
  let mut in_token = false;
  let mut end = None;
  for (i, c) in line.char_indices() {
    if c.is_whitespace() {
      if in_token {
        in_token = false;
        count += 1;
        if count == n {
          end = Some(i);
          break;
        }
      }
    } else {
      in_token = true;
    }
  }
  if count == n {
    end
  } else if in_token {
    count += 1;
    if count == n {
      Some(line.len())
    } else {
      None
    }
  } else {
    None
  }
}

/// Re-emits a table row, preserving the source spacing of its leading
/// `fixed_cols` columns verbatim and collapsing everything after into
/// single-space-joined tokens (spec.md's "column formatter").
#[must_use]
pub fn reformat_row(line: &str, fixed_cols: usize) -> String {
  match nth_token_end(line, fixed_cols) {
    Some(end) => {
      let lead = &line[..end];
      let rest: Vec<&str> = line[end..].split_whitespace().collect();
      if rest.is_empty() {
        lead.to_owned()
      } else {
        format!("{lead} {}", rest.join(" "))
      }
    }
    None => line.split_whitespace().collect::<Vec<_>>().join(" "),
  }
}

/// Shape 2: concatenate tabular shard files, keeping the first shard's
/// leading `header_lines` verbatim (this is where any column header and
/// separator row live), dropping every subsequent shard's `header_lines`,
/// and reformatting remaining body rows through [`reformat_row`].
#[must_use]
pub fn concatenate_preserving_spacing(shards: &[&str], header_lines: usize, fixed_cols: usize) -> String {
  let mut out = String::new();
  for (shard_idx, shard) in shards.iter().enumerate() {
    for (line_idx, line) in shard.lines().enumerate() {
      if shard_idx > 0 && line_idx < header_lines {
        continue;
      }
      if shard_idx == 0 && line_idx < header_lines {
        out.push_str(line);
      } else {
        out.push_str(&reformat_row(line, fixed_cols));
      }
      out.push('\n');
    }
  }
  out
}

/// One row of a model/alert summary table: a name, a run of invariant
/// (non-additive) fields, and a run of additive numeric counts.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
  pub name: String,
  pub invariant: Vec<String>,
  pub counts: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryTable {
  pub header: Vec<String>,
  pub rows: Vec<SummaryRow>,
}

/// Parses a whitespace-delimited summary table: first line is the header,
/// each subsequent line is `name invariant... counts...` per the caller's
/// column split.
pub fn parse_summary_table(text: &str, num_invariant_cols: usize) -> Result<SummaryTable, Report> {
  let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
  let header: Vec<String> = lines
    .next()
    .ok_or_else(|| eyre::eyre!("Summary table is empty"))?
    .split_whitespace()
    .map(str::to_owned)
    .collect();
  let mut rows = Vec::new();
  for line in lines {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < num_invariant_cols + 2 {
      return make_error!("Summary row '{line}' has too few columns for {num_invariant_cols} invariant + name + >=1 count column(s)");
    }
    let name = fields[0].to_owned();
    let invariant = fields[1..=num_invariant_cols].iter().map(|s| (*s).to_owned()).collect();
    let counts = fields[num_invariant_cols + 1..]
      .iter()
      .map(|s| s.parse::<u64>().map_err(|_| eyre::eyre!("Summary row '{line}' has a non-numeric count column '{s}'")))
      .collect::<Result<Vec<_>, _>>()?;
    rows.push(SummaryRow { name, invariant, counts });
  }
  Ok(SummaryTable { header, rows })
}

/// Shape 3: sums additive count columns across shards per row name,
/// verifying invariant columns agree, then re-sorts by primary count
/// descending and name ascending. `*all*`/`*none*` rows are ordinary named
/// rows here and are never dropped, even at zero count.
pub fn merge_summary_tables(tables: &[SummaryTable]) -> Result<SummaryTable, Report> {
  let Some(first) = tables.first() else {
    return make_error!("No summary tables to merge");
  };
  let header = first.header.clone();

  let mut merged: BTreeMap<String, SummaryRow> = BTreeMap::new();
  let mut order: Vec<String> = Vec::new();
  for table in tables {
    if table.header != header {
      return make_error!("Summary table headers disagree across shards");
    }
    for row in &table.rows {
      match merged.get_mut(&row.name) {
        Some(existing) => {
          if existing.invariant != row.invariant {
            return make_error!("Invariant columns for '{}' disagree across shards", row.name);
          }
          if existing.counts.len() != row.counts.len() {
            return make_error!("Count-column shape for '{}' disagrees across shards", row.name);
          }
          for (a, b) in existing.counts.iter_mut().zip(&row.counts) {
            *a += b;
          }
        }
        None => {
          order.push(row.name.clone());
          merged.insert(row.name.clone(), row.clone());
        }
      }
    }
  }

  let mut rows: Vec<SummaryRow> = order.into_iter().map(|name| merged.remove(&name).expect("just inserted")).collect();
  rows.sort_by(|a, b| b.counts.first().cmp(&a.counts.first()).then_with(|| a.name.cmp(&b.name)));
  Ok(SummaryTable { header, rows })
}

#[must_use]
pub fn format_summary_table(table: &SummaryTable) -> String {
  let mut out = table.header.join(" ");
  out.push('\n');
  for row in &table.rows {
    out.push_str(&row.name);
    for v in &row.invariant {
      out.push(' ');
      out.push_str(v);
    }
    for c in &row.counts {
      out.push(' ');
      out.push_str(&c.to_string());
    }
    out.push('\n');
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn concatenates_byte_for_byte() {
    assert_eq!(concatenate_only(&["a\n".to_owned(), "b\n".to_owned()]), "a\nb\n");
  }

  #[rstest]
  fn reformat_row_preserves_leading_spacing() {
    // 2 fixed cols preserved verbatim (including the odd internal spacing),
    // the rest collapsed to single spaces.
    assert_eq!(reformat_row("seq1    12   3   4    5", 2), "seq1    12 3 4 5");
  }

  #[rstest]
  fn spacing_preserving_concat_keeps_first_header_only() {
    let shard1 = "name  count\nseq1  3\n";
    let shard2 = "name  count\nseq2  4\n";
    let merged = concatenate_preserving_spacing(&[shard1, shard2], 1, 1);
    assert_eq!(merged, "name  count\nseq1 3\nseq2 4\n");
  }

  #[rstest]
  fn merges_and_sums_summary_tables() -> Result<(), Report> {
    let t1 = parse_summary_table("name grp count\nfeatA g1 3\n*all* - 3\n", 1)?;
    let t2 = parse_summary_table("name grp count\nfeatA g1 5\n*all* - 5\n", 1)?;
    let merged = merge_summary_tables(&[t1, t2])?;
    let all_row = merged.rows.iter().find(|r| r.name == "*all*").expect("present");
    assert_eq!(all_row.counts, vec![8]);
    let feat_row = merged.rows.iter().find(|r| r.name == "featA").expect("present");
    assert_eq!(feat_row.counts, vec![8]);
    // sorted by count descending
    assert_eq!(merged.rows[0].name, "*all*");
    Ok(())
  }

  #[rstest]
  fn rejects_disagreeing_invariant_columns() -> Result<(), Report> {
    let t1 = parse_summary_table("name grp count\nfeatA g1 3\n", 1)?;
    let t2 = parse_summary_table("name grp count\nfeatA g2 5\n", 1)?;
    assert!(merge_summary_tables(&[t1, t2]).is_err());
    Ok(())
  }
}
