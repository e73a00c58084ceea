//! Insert records (spec.md §3.5) and the insert side-file grammar (§4.5,
//! §6.2).

use crate::make_error;
use eyre::Report;
use serde::{Deserialize, Serialize};

/// One unaligned-nucleotide run: `len` query bases starting at `ua_seq_pos`
/// are inserted immediately after model position `mdlpos_after` (`0` means
/// "before position 1").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTuple {
  pub mdlpos_after: usize,
  pub ua_seq_pos: usize,
  pub len: usize,
}

/// Per-query-sequence alignment summary against one model (spec.md §3.5).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InsertEntry {
  pub spos: usize,
  pub epos: usize,
  pub ins: Vec<InsertTuple>,
}

impl InsertEntry {
  #[must_use]
  pub fn seq_len(&self) -> usize {
    self.ins.iter().map(|t| t.len).sum()
  }
}

/// One `MODEL <name> <len>` block of an insert side-file and the sequences
/// recorded under it, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelInsertBlock {
  pub model_name: String,
  pub model_len: usize,
  pub sequences: Vec<(String, InsertEntry)>,
}

/// Parses a full insert side-file (spec.md §6.2): a sequence of two-column
/// model header lines, each followed by `seqname seqlen spos epos [triples]*`
/// sequence lines, terminated by a bare `//` line.
///
/// A model name re-appearing with a different declared length is an error;
/// re-appearing with the same length simply continues appending sequences to
/// that model's block.
pub fn parse_insert_file(text: &str) -> Result<Vec<ModelInsertBlock>, Report> {
  let mut blocks: Vec<ModelInsertBlock> = Vec::new();
  let mut current: Option<usize> = None; // index into `blocks`

  for (line_no, raw) in text.lines().enumerate() {
    let line_no = line_no + 1;
    let line = raw.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }
    if trimmed == "//" {
      return Ok(blocks);
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() == 2 {
      let model_name = fields[0].to_owned();
      let model_len: usize = fields[1]
        .parse()
        .map_err(|_| eyre::eyre!("Line {line_no}: model length '{}' is not a number", fields[1]))?;
      if let Some(idx) = blocks.iter().position(|b| b.model_name == model_name) {
        if blocks[idx].model_len != model_len {
          return make_error!(
            "Line {line_no}: model '{model_name}' re-declared with length {model_len}, previously {}",
            blocks[idx].model_len
          );
        }
        current = Some(idx);
      } else {
        blocks.push(ModelInsertBlock {
          model_name,
          model_len,
          sequences: Vec::new(),
        });
        current = Some(blocks.len() - 1);
      }
      continue;
    }

    if fields.len() < 4 {
      return make_error!("Line {line_no}: sequence line needs at least 4 fields, got {}", fields.len());
    }
    if (fields.len() - 4) % 3 != 0 {
      return make_error!("Line {line_no}: trailing insert tuples must come in multiples of three, got {} extra fields", fields.len() - 4);
    }
    let Some(idx) = current else {
      return make_error!("Line {line_no}: sequence line appears before any MODEL header");
    };

    let seq_name = fields[0].to_owned();
    let seq_len: usize = fields[1].parse().map_err(|_| eyre::eyre!("Line {line_no}: invalid seqlen '{}'", fields[1]))?;
    let spos: usize = fields[2].parse().map_err(|_| eyre::eyre!("Line {line_no}: invalid spos '{}'", fields[2]))?;
    let epos: usize = fields[3].parse().map_err(|_| eyre::eyre!("Line {line_no}: invalid epos '{}'", fields[3]))?;

    let mut ins = Vec::new();
    for triple in fields[4..].chunks_exact(3) {
      let mdlpos_after: usize = triple[0].parse().map_err(|_| eyre::eyre!("Line {line_no}: invalid mdlpos_after '{}'", triple[0]))?;
      let ua_seq_pos: usize = triple[1].parse().map_err(|_| eyre::eyre!("Line {line_no}: invalid ua_seqpos '{}'", triple[1]))?;
      let len: usize = triple[2].parse().map_err(|_| eyre::eyre!("Line {line_no}: invalid inslen '{}'", triple[2]))?;
      ins.push(InsertTuple { mdlpos_after, ua_seq_pos, len });
    }
    let _ = seq_len; // recorded on the line, not retained on InsertEntry (spec.md §3.5)

    blocks[idx].sequences.push((seq_name, InsertEntry { spos, epos, ins }));
  }

  make_error!("Insert file is missing its terminating `//` line")
}

/// Writes an insert side-file (spec.md §4.5 "Insert-file write"). `append`
/// omits the file-level `//` terminator so shards can be concatenated and
/// terminated once by the caller (spec.md §4.6 "Merging").
#[must_use]
pub fn write_insert_file(blocks: &[ModelInsertBlock], append: bool) -> String {
  let mut out = String::new();
  for block in blocks {
    out.push_str(&format!("{} {}\n", block.model_name, block.model_len));
    for (seq_name, entry) in &block.sequences {
      out.push_str(&format!("{} {} {} {}", seq_name, entry.seq_len(), entry.spos, entry.epos));
      for tuple in &entry.ins {
        out.push_str(&format!("  {} {} {}", tuple.mdlpos_after, tuple.ua_seq_pos, tuple.len));
      }
      out.push('\n');
    }
  }
  if !append {
    out.push_str("//\n");
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn sample_block() -> ModelInsertBlock {
    ModelInsertBlock {
      model_name: "NC_045512".to_owned(),
      model_len: 29903,
      sequences: vec![(
        "seq1".to_owned(),
        InsertEntry {
          spos: 1,
          epos: 29903,
          ins: vec![InsertTuple { mdlpos_after: 100, ua_seq_pos: 101, len: 3 }],
        },
      )],
    }
  }

  #[rstest]
  fn round_trips_write_then_parse() -> Result<(), Report> {
    let blocks = vec![sample_block()];
    let text = write_insert_file(&blocks, false);
    assert!(text.ends_with("//\n"));
    let parsed = parse_insert_file(&text)?;
    assert_eq!(parsed, blocks);
    Ok(())
  }

  #[rstest]
  fn append_mode_omits_terminator() {
    let text = write_insert_file(&[sample_block()], true);
    assert!(!text.contains("//"));
  }

  #[rstest]
  fn rejects_duplicate_model_with_differing_length() {
    let text = "m1 100\nseq1 10 1 10\nm1 200\n//\n";
    assert!(parse_insert_file(text).is_err());
  }

  #[rstest]
  fn duplicate_model_same_length_appends() -> Result<(), Report> {
    let text = "m1 100\nseq1 10 1 10\nm1 100\nseq2 5 1 5\n//\n";
    let blocks = parse_insert_file(text)?;
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].sequences.len(), 2);
    Ok(())
  }

  #[rstest]
  fn rejects_missing_terminator() {
    assert!(parse_insert_file("m1 100\nseq1 10 1 10\n").is_err());
  }

  #[rstest]
  fn rejects_non_multiple_of_three_trailing_fields() {
    assert!(parse_insert_file("m1 100\nseq1 10 1 10 5 6\n//\n").is_err());
  }

  #[rstest]
  fn ignores_comments() -> Result<(), Report> {
    let text = "# a comment\nm1 100\n# another\nseq1 10 1 10\n//\n";
    let blocks = parse_insert_file(text)?;
    assert_eq!(blocks[0].sequences.len(), 1);
    Ok(())
  }
}
