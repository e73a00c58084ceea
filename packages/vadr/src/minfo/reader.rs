//! `.minfo` file parsing (spec.md §4.4, §6.1): turns a sequence of
//! [`super::grammar::Line`]s into one [`ModelEntry`] per `MODEL` block.

use super::grammar::{parse_line, Line};
use crate::make_error;
use eyre::Report;
use indexmap::IndexMap;

/// One model's worth of parsed `.minfo` content: the `MODEL` line's own
/// fields, plus its `FEATURE` lines' fields in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelEntry {
  pub name: String,
  pub model_fields: IndexMap<String, String>,
  pub features: Vec<IndexMap<String, String>>,
}

/// Parses a whole `.minfo` file's text into one [`ModelEntry`] per model.
///
/// A `FEATURE <name>` line must reference a model already introduced earlier
/// in the file by a `MODEL <name>` line. `required_model_keys` and
/// `required_feature_keys` are checked per model/per feature once parsing
/// completes; unknown keys are retained verbatim in the returned fields maps.
pub fn parse_model_info(text: &str, required_model_keys: &[&str], required_feature_keys: &[&str]) -> Result<Vec<ModelEntry>, Report> {
  let mut entries: Vec<ModelEntry> = Vec::new();
  let mut index_by_name: IndexMap<String, usize> = IndexMap::new();

  for (line_no, raw) in text.lines().enumerate() {
    let Some(line) = parse_line(raw, line_no + 1)? else {
      continue;
    };
    match line {
      Line::Model { name, fields } => {
        if index_by_name.contains_key(&name) {
          return make_error!("Line {}: duplicate MODEL block for '{name}'", line_no + 1);
        }
        index_by_name.insert(name.clone(), entries.len());
        entries.push(ModelEntry {
          name,
          model_fields: fields,
          features: Vec::new(),
        });
      }
      Line::Feature { model_name, fields } => {
        let &index = index_by_name
          .get(&model_name)
          .ok_or_else(|| eyre::eyre!("Line {}: FEATURE line references model '{model_name}' before its MODEL line", line_no + 1))?;
        entries[index].features.push(fields);
      }
    }
  }

  for entry in &entries {
    for &key in required_model_keys {
      if !entry.model_fields.contains_key(key) {
        return make_error!("Model '{}' is missing required key '{key}'", entry.name);
      }
    }
    for (ftr_index, ftr_fields) in entry.features.iter().enumerate() {
      for &key in required_feature_keys {
        if !ftr_fields.contains_key(key) {
          return make_error!("Model '{}' feature #{ftr_index} is missing required key '{key}'", entry.name);
        }
      }
    }
  }

  Ok(entries)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_model_with_features() -> Result<(), Report> {
    let text = "\
#comment
MODEL NC_045512 length:\"29903\"
FEATURE NC_045512 type:\"CDS\" coords:\"1..100:+\"
FEATURE NC_045512 type:\"gene\" coords:\"1..100:+\"
";
    let entries = parse_model_info(text, &["length"], &["type", "coords"])?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "NC_045512");
    assert_eq!(entries[0].features.len(), 2);
    Ok(())
  }

  #[rstest]
  fn rejects_feature_before_its_model() {
    let text = "FEATURE NC_045512 type:\"CDS\"\nMODEL NC_045512 length:\"1\"\n";
    assert!(parse_model_info(text, &[], &[]).is_err());
  }

  #[rstest]
  fn rejects_duplicate_model_block() {
    let text = "MODEL m length:\"1\"\nMODEL m length:\"2\"\n";
    assert!(parse_model_info(text, &[], &[]).is_err());
  }

  #[rstest]
  fn enforces_required_keys() {
    let text = "MODEL m length:\"1\"\nFEATURE m type:\"CDS\"\n";
    assert!(parse_model_info(text, &[], &["type", "coords"]).is_err());
    assert!(parse_model_info(text, &["length", "subgroup"], &[]).is_err());
  }

  #[rstest]
  fn multiple_models_in_one_file() -> Result<(), Report> {
    let text = "MODEL a length:\"1\"\nMODEL b length:\"2\"\nFEATURE b type:\"CDS\"\n";
    let entries = parse_model_info(text, &["length"], &[])?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].features.len(), 0);
    assert_eq!(entries[1].features.len(), 1);
    Ok(())
  }
}
