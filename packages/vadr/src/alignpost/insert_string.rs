//! Insert-string token update (spec.md §4.5 "Insert-string token update"): an
//! insert-string is a `;`-separated list of `mdlpos:uapos:len` tokens; update
//! rewrites exactly one token matched by a caller-supplied predicate.

use crate::make_error;
use eyre::Report;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InsertToken {
  pub mdlpos: usize,
  pub uapos: usize,
  pub len: usize,
}

impl fmt::Display for InsertToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.mdlpos, self.uapos, self.len)
  }
}

fn token_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^(\d+):(\d+):(\d+)$").expect("valid regex"))
}

/// Parses a `;`-separated insert-string into its tokens. A trailing `;` (or
/// an entirely empty string) produces no trailing empty token.
pub fn parse_insert_string(s: &str) -> Result<Vec<InsertToken>, Report> {
  s.split(';')
    .filter(|tok| !tok.is_empty())
    .map(|tok| {
      let caps = token_regex().captures(tok).ok_or_else(|| eyre::eyre!("Malformed insert-string token '{tok}'"))?;
      Ok(InsertToken {
        mdlpos: caps[1].parse().expect("regex guarantees digits"),
        uapos: caps[2].parse().expect("regex guarantees digits"),
        len: caps[3].parse().expect("regex guarantees digits"),
      })
    })
    .collect()
}

#[must_use]
pub fn format_insert_string(tokens: &[InsertToken]) -> String {
  tokens.iter().map(InsertToken::to_string).collect::<Vec<_>>().join(";")
}

/// Replaces the single token matched by `matches` with `replacement`. Fails
/// if zero or more than one token match.
pub fn update_insert_string_token(s: &str, matches: impl Fn(&InsertToken) -> bool, replacement: InsertToken) -> Result<String, Report> {
  let mut tokens = parse_insert_string(s)?;
  let hits: Vec<usize> = tokens.iter().enumerate().filter(|(_, t)| matches(t)).map(|(i, _)| i).collect();
  match hits.as_slice() {
    [] => make_error!("Insert-string '{s}' has no token matching the update predicate"),
    [idx] => {
      tokens[*idx] = replacement;
      Ok(format_insert_string(&tokens))
    }
    _ => make_error!("Insert-string '{s}' has {} tokens matching the update predicate, expected exactly one", hits.len()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_and_formats_round_trip() -> Result<(), Report> {
    let s = "10:11:2;50:52:1";
    let tokens = parse_insert_string(s)?;
    assert_eq!(tokens, vec![InsertToken { mdlpos: 10, uapos: 11, len: 2 }, InsertToken { mdlpos: 50, uapos: 52, len: 1 }]);
    assert_eq!(format_insert_string(&tokens), s);
    Ok(())
  }

  #[rstest]
  fn empty_string_has_no_tokens() -> Result<(), Report> {
    assert!(parse_insert_string("")?.is_empty());
    Ok(())
  }

  #[rstest]
  fn rejects_malformed_token() {
    assert!(parse_insert_string("10:11").is_err());
    assert!(parse_insert_string("a:b:c").is_err());
  }

  #[rstest]
  fn updates_the_single_matching_token() -> Result<(), Report> {
    let s = "10:11:2;50:52:1";
    let updated = update_insert_string_token(s, |t| t.mdlpos == 50, InsertToken { mdlpos: 50, uapos: 52, len: 3 })?;
    assert_eq!(updated, "10:11:2;50:52:3");
    Ok(())
  }

  #[rstest]
  fn fails_with_no_match() {
    let s = "10:11:2";
    assert!(update_insert_string_token(s, |t| t.mdlpos == 999, InsertToken { mdlpos: 999, uapos: 1, len: 1 }).is_err());
  }

  #[rstest]
  fn fails_with_multiple_matches() {
    let s = "10:11:2;10:99:3";
    assert!(update_insert_string_token(s, |t| t.mdlpos == 10, InsertToken { mdlpos: 10, uapos: 1, len: 1 }).is_err());
  }
}
