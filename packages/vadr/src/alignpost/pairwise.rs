//! Aligner-B pairwise-output decode (spec.md §4.5 "Aligner-B (pairwise)
//! output decode"): a line-oriented state machine over a second aligner's
//! combined pairwise-alignment-plus-summary stream.
//!
//! The concrete line grammar consumed here (spec.md names the *states* but
//! not the literal tokens, and `original_source/` retrieved no files for this
//! pack to resolve the ambiguity from) is, per query record:
//!
//! ```text
//! # Query: <name>
//! # Algorithm: <name>
//! # Parameters: <text>
//! # Score: <float>
//! # Cigar: <cigar-string>
//! # RefStart: <1-based position in the reference where the aligned core begins>
//! <query_name> <query_aligned_row>
//! <target_name> <target_aligned_row>
//! //
//! ```
//! with one leading `# PAIRWISE` banner line for the whole file. This
//! decision is recorded in `DESIGN.md`.

use super::cigar;
use super::insert::InsertEntry;
use crate::make_error;
use eyre::Report;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairwiseRecord {
  pub query_name: String,
  pub target_name: String,
  pub algorithm: String,
  pub parameters: String,
  pub score: String,
  pub insert_entry: InsertEntry,
  /// The two-row Stockholm alignment body: `(name, aligned_row)` for the
  /// query, then the target (renamed by the caller to the reference
  /// annotation's name before merge).
  pub query_row: (String, String),
  pub target_row: (String, String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
  ExpectHeader,
  ExpectQuery,
  ExpectAlgoParamsScores,
  ExpectQueryAlign,
  ExpectTargetAlign,
  ExpectNextQueryOrEnd,
}

/// Decodes a full aligner-B pairwise output stream into one [`PairwiseRecord`]
/// per query. `reference_seq` is the full, ungapped reference nucleotide
/// sequence the target rows are drawn from; it's used to extend each
/// target row's symmetric query-side padding with real reference bases
/// (spec.md §4.5, last paragraph).
pub fn decode_pairwise_output(text: &str, reference_seq: &str) -> Result<Vec<PairwiseRecord>, Report> {
  let mut state = State::ExpectHeader;
  let mut records = Vec::new();

  let mut query_name = String::new();
  let mut algorithm = String::new();
  let mut parameters = String::new();
  let mut score = String::new();
  let mut cigar_str = String::new();
  let mut ref_start = 0usize;
  let mut query_align: Option<(String, String)> = None;

  for (line_no, raw) in text.lines().enumerate() {
    let line_no = line_no + 1;
    let line = raw.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
      continue;
    }

    match state {
      State::ExpectHeader => {
        if line.trim() != "# PAIRWISE" {
          return make_error!("Line {line_no}: expected `# PAIRWISE` banner, got '{line}'");
        }
        state = State::ExpectQuery;
      }
      State::ExpectQuery => {
        query_name = strip_directive(line, "# Query:", line_no)?;
        state = State::ExpectAlgoParamsScores;
      }
      State::ExpectAlgoParamsScores => {
        if let Some(v) = line.strip_prefix("# Algorithm:") {
          algorithm = v.trim().to_owned();
        } else if let Some(v) = line.strip_prefix("# Parameters:") {
          parameters = v.trim().to_owned();
        } else if let Some(v) = line.strip_prefix("# Score:") {
          score = v.trim().to_owned();
        } else if let Some(v) = line.strip_prefix("# Cigar:") {
          cigar_str = v.trim().to_owned();
        } else if let Some(v) = line.strip_prefix("# RefStart:") {
          ref_start = v
            .trim()
            .parse()
            .map_err(|_| eyre::eyre!("Line {line_no}: invalid RefStart value '{}'", v.trim()))?;
          state = State::ExpectQueryAlign;
        } else {
          return make_error!("Line {line_no}: expected an `# Algorithm:`/`# Parameters:`/`# Score:`/`# Cigar:`/`# RefStart:` line, got '{line}'");
        }
      }
      State::ExpectQueryAlign => {
        query_align = Some(parse_row(line, line_no)?);
        state = State::ExpectTargetAlign;
      }
      State::ExpectTargetAlign => {
        let (target_name, target_aligned) = parse_row(line, line_no)?;
        let (name, query_aligned) = query_align.take().expect("set in ExpectQueryAlign");

        let record = build_record(
          std::mem::take(&mut query_name),
          name,
          std::mem::take(&mut algorithm),
          std::mem::take(&mut parameters),
          std::mem::take(&mut score),
          &std::mem::take(&mut cigar_str),
          ref_start,
          &query_aligned,
          target_name,
          &target_aligned,
          reference_seq,
        )
        .map_err(|err| err.wrap_err(format!("Line {line_no}: decoding query/target alignment rows")))?;
        records.push(record);
        state = State::ExpectNextQueryOrEnd;
      }
      State::ExpectNextQueryOrEnd => {
        if line.trim() == "//" {
          state = State::ExpectQuery;
        } else {
          return make_error!("Line {line_no}: expected `//` between query records, got '{line}'");
        }
      }
    }
  }

  if state != State::ExpectQuery && state != State::ExpectNextQueryOrEnd {
    return make_error!("Aligner-B output ended mid-record (in state {state:?})");
  }
  Ok(records)
}

fn strip_directive(line: &str, prefix: &str, line_no: usize) -> Result<String, Report> {
  line
    .strip_prefix(prefix)
    .map(|v| v.trim().to_owned())
    .ok_or_else(|| eyre::eyre!("Line {line_no}: expected a '{prefix}' line, got '{line}'"))
}

fn parse_row(line: &str, line_no: usize) -> Result<(String, String), Report> {
  let (name, row) = line
    .split_once(char::is_whitespace)
    .ok_or_else(|| eyre::eyre!("Line {line_no}: expected `<name> <aligned_row>`, got '{line}'"))?;
  Ok((name.to_owned(), row.to_owned()))
}

#[allow(clippy::too_many_arguments)]
fn build_record(
  query_name: String,
  query_row_name: String,
  algorithm: String,
  parameters: String,
  score: String,
  cigar_str: &str,
  ref_start: usize,
  query_aligned: &str,
  target_name: String,
  target_aligned: &str,
  reference_seq: &str,
) -> Result<PairwiseRecord, Report> {
  let leading_pad = query_aligned.chars().take_while(|c| *c == ' ').count();
  let trailing_pad = query_aligned.chars().rev().take_while(|c| *c == ' ').count();
  let has_padding = leading_pad > 0 || trailing_pad > 0;

  if !has_padding && query_aligned.len() != target_aligned.len() {
    return make_error!(
      "Query/target aligned rows differ in length ({} vs {}) with no padding to trim",
      query_aligned.len(),
      target_aligned.len()
    );
  }

  let core_query: String = query_aligned.chars().skip(leading_pad).take(query_aligned.chars().count() - leading_pad - trailing_pad).collect();
  let target_chars: Vec<char> = target_aligned.chars().collect();
  if target_chars.len() < leading_pad + trailing_pad {
    return make_error!("Target aligned row is shorter than the query row's padding");
  }
  let core_target: String = target_chars[leading_pad..target_chars.len() - trailing_pad]
    .iter()
    .map(|&c| if c == '-' { '.' } else { c })
    .collect();

  let ref_chars: Vec<char> = reference_seq.chars().collect();
  if ref_start == 0 || ref_start > ref_chars.len() + 1 {
    return make_error!("RefStart {ref_start} is out of range for a reference of length {}", ref_chars.len());
  }
  let left_start = ref_start.saturating_sub(1).saturating_sub(leading_pad);
  let left_flank: String = ref_chars[left_start..ref_start - 1].iter().collect();

  let core_len = core_target.chars().count();
  let right_start = (ref_start - 1) + core_len;
  let right_end = (right_start + trailing_pad).min(ref_chars.len());
  let right_flank: String = ref_chars[right_start..right_end].iter().collect();

  let final_target = format!("{left_flank}{core_target}{right_flank}");
  let final_query = format!("{}{core_query}{}", "-".repeat(leading_pad), "-".repeat(trailing_pad));

  let seq_len = cigar::parse_cigar(cigar_str)?
    .into_iter()
    .map(|op| match op {
      cigar::CigarOp::Match(c) | cigar::CigarOp::Delete(c) => c,
      cigar::CigarOp::Insert(_) => 0,
    })
    .sum();
  let mdl_len = cigar::parse_cigar(cigar_str)?
    .into_iter()
    .map(|op| match op {
      cigar::CigarOp::Match(c) | cigar::CigarOp::Insert(c) => c,
      cigar::CigarOp::Delete(_) => 0,
    })
    .sum();
  let insert_entry = cigar::decode_cigar(cigar_str, 1, 1, mdl_len, seq_len)?;

  let _ = (query_row_name, algorithm, parameters); // retained on PairwiseRecord below
  Ok(PairwiseRecord {
    query_name,
    target_name: target_name.clone(),
    algorithm,
    parameters,
    score,
    insert_entry,
    query_row: (query_row_name, final_query),
    target_row: (target_name, final_target),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn decodes_single_record_with_padding() -> Result<(), Report> {
    let reference = "AAAAACCCCCGGGGG";
    // Query row carries 2 cols of literal-space padding on each side; the
    // target row's outer 2 chars on each side get discarded and replaced by
    // real reference flanking bases.
    let query_row = format!("  {}  ", "C".repeat(5));
    let target_row = format!("NN{}MM", "CC-CC");
    let text = format!(
      "# PAIRWISE\n# Query: q1\n# Algorithm: needle\n# Parameters: gapopen=10\n# Score: 42.0\n# Cigar: 5M\n# RefStart: 6\nq1 {query_row}\nref {target_row}\n//\n"
    );
    let records = decode_pairwise_output(&text, reference)?;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.query_name, "q1");
    assert_eq!(record.target_row.1, "AACC.CCGG");
    assert_eq!(record.query_row.1, "--CCCCC--");
    Ok(())
  }

  #[rstest]
  fn rejects_mismatched_lengths_without_padding() {
    let text = "\
# PAIRWISE
# Query: q1
# Algorithm: needle
# Parameters: x
# Score: 1.0
# Cigar: 3M
# RefStart: 1
q1 AAA
ref AAAA
//
";
    assert!(decode_pairwise_output(text, "AAAA").is_err());
  }

  #[rstest]
  fn decodes_multiple_records() -> Result<(), Report> {
    let text = "\
# PAIRWISE
# Query: q1
# Algorithm: needle
# Parameters: x
# Score: 1.0
# Cigar: 3M
# RefStart: 1
q1 AAA
ref AAA
//
# Query: q2
# Algorithm: needle
# Parameters: x
# Score: 2.0
# Cigar: 3M
# RefStart: 1
q2 CCC
ref CCC
//
";
    let records = decode_pairwise_output(text, "AAA")?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].query_name, "q2");
    Ok(())
  }
}
