//! Line grammar (spec.md §4.4, §6.1): `MODEL <name>` / `FEATURE <modelname>`
//! lines, each followed by zero or more `key:"value"` tokens, with `#`
//! comments and a `:GBSEP:` multi-value sentinel.

use crate::make_error;
use eyre::Report;
use indexmap::IndexMap;

/// Joins multiple qualifier values for one key, per spec.md §4.4.
pub const GBSEP: &str = ":GBSEP:";

/// One non-comment, non-blank line of a `.minfo` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
  Model { name: String, fields: IndexMap<String, String> },
  Feature { model_name: String, fields: IndexMap<String, String> },
}

/// Parses one raw line into a [`Line`]. Returns `Ok(None)` for comment or
/// blank lines.
pub fn parse_line(raw: &str, line_no: usize) -> Result<Option<Line>, Report> {
  let raw = raw.trim_end_matches(['\r', '\n']);
  if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
    return Ok(None);
  }

  let mut tokens = tokenize(raw, line_no)?.into_iter();
  let head = tokens.next().ok_or_else(|| eyre::eyre!("Line {line_no}: empty line after trim"))?;

  let fields = parse_fields(tokens, line_no)?;

  if let Some(name) = head.strip_prefix("MODEL ") {
    Ok(Some(Line::Model {
      name: name.trim().to_owned(),
      fields,
    }))
  } else if let Some(model_name) = head.strip_prefix("FEATURE ") {
    Ok(Some(Line::Feature {
      model_name: model_name.trim().to_owned(),
      fields,
    }))
  } else {
    make_error!("Line {line_no}: expected a line starting with `MODEL ` or `FEATURE `, got '{head}'")
  }
}

/// Splits a line into its leading `MODEL <name>`/`FEATURE <name>` head token
/// and its trailing `key:"value"` tokens, respecting quoted values that may
/// themselves contain whitespace.
fn tokenize(raw: &str, line_no: usize) -> Result<Vec<String>, Report> {
  let Some((prefix, name, rest)) = split_head(raw) else {
    return make_error!("Line {line_no}: does not start with `MODEL ` or `FEATURE `");
  };
  let mut tokens = vec![format!("{prefix} {name}")];
  tokens.extend(split_key_value_tokens(rest, line_no)?);
  Ok(tokens)
}

fn split_head(raw: &str) -> Option<(&'static str, &str, &str)> {
  if let Some(rest) = raw.strip_prefix("MODEL ") {
    let (name, rest) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Some(("MODEL", name, rest))
  } else if let Some(rest) = raw.strip_prefix("FEATURE ") {
    let (name, rest) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Some(("FEATURE", name, rest))
  } else {
    None
  }
}

fn split_key_value_tokens(rest: &str, line_no: usize) -> Result<Vec<String>, Report> {
  let mut tokens = Vec::new();
  let mut chars = rest.trim().chars().peekable();
  while chars.peek().is_some() {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
      chars.next();
    }
    if chars.peek().is_none() {
      break;
    }
    let mut token = String::new();
    let mut in_quotes = false;
    for c in chars.by_ref() {
      token.push(c);
      if c == '"' {
        in_quotes = !in_quotes;
      }
      if !in_quotes && token.chars().last().is_some_and(char::is_whitespace) {
        break;
      }
    }
    let trimmed = token.trim().to_owned();
    if !trimmed.is_empty() {
      tokens.push(trimmed);
    }
    if in_quotes {
      return make_error!("Line {line_no}: unterminated quoted value");
    }
  }
  Ok(tokens)
}

fn parse_fields(tokens: impl Iterator<Item = String>, line_no: usize) -> Result<IndexMap<String, String>, Report> {
  let mut fields = IndexMap::new();
  for token in tokens {
    let (key, value) = token
      .split_once(':')
      .ok_or_else(|| eyre::eyre!("Line {line_no}: token '{token}' is not `key:\"value\"`"))?;
    if key.is_empty() || key.contains(char::is_whitespace) {
      return make_error!("Line {line_no}: key '{key}' must be non-empty and contain no whitespace or ':'");
    }
    let value = value
      .strip_prefix('"')
      .and_then(|v| v.strip_suffix('"'))
      .ok_or_else(|| eyre::eyre!("Line {line_no}: value for key '{key}' must be double-quoted"))?;
    if value.contains('"') {
      return make_error!("Line {line_no}: value for key '{key}' contains an inner double quote");
    }
    if fields.insert(key.to_owned(), value.to_owned()).is_some() {
      return make_error!("Line {line_no}: duplicate key '{key}' on one line");
    }
  }
  Ok(fields)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_model_line() -> Result<(), Report> {
    let line = parse_line(r#"MODEL NC_045512 length:"29903""#, 1)?.expect("non-comment line");
    let Line::Model { name, fields } = line else { panic!("expected Model") };
    assert_eq!(name, "NC_045512");
    assert_eq!(fields.get("length").map(String::as_str), Some("29903"));
    Ok(())
  }

  #[rstest]
  fn parses_feature_line_with_multiple_fields() -> Result<(), Report> {
    let line = parse_line(r#"FEATURE NC_045512 type:"CDS" coords:"1..100:+""#, 1)?.expect("non-comment line");
    let Line::Feature { model_name, fields } = line else { panic!("expected Feature") };
    assert_eq!(model_name, "NC_045512");
    assert_eq!(fields.get("type").map(String::as_str), Some("CDS"));
    assert_eq!(fields.get("coords").map(String::as_str), Some("1..100:+"));
    Ok(())
  }

  #[rstest]
  fn skips_comments_and_blank_lines() -> Result<(), Report> {
    assert!(parse_line("# a comment", 1)?.is_none());
    assert!(parse_line("", 2)?.is_none());
    Ok(())
  }

  #[rstest]
  fn rejects_duplicate_key_on_one_line() {
    assert!(parse_line(r#"MODEL m length:"1" length:"2""#, 1).is_err());
  }

  #[rstest]
  fn rejects_unquoted_value() {
    assert!(parse_line(r#"MODEL m length:29903"#, 1).is_err());
  }
}
