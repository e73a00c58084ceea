//! Pseudo-coords codec (spec.md §4.7, GLOSSARY "Pseudo-coords"): a compact,
//! semicolon-terminated audit record used when reporting N-replacement
//! decisions. Grammar per token:
//! `[S:a..b,M:a..b,D:d[!],N:k/m,E:x/y,F:{5p|3p|-},R:{Y|N}];`

use crate::make_error;
use eyre::Report;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::sync::OnceLock;

/// The `F:` field: which end of the feature the replacement sits at, if either.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flank {
  FivePrime,
  ThreePrime,
  Neither,
}

impl Display for Flank {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::FivePrime => "5p",
      Self::ThreePrime => "3p",
      Self::Neither => "-",
    };
    write!(f, "{s}")
  }
}

impl Flank {
  fn parse(raw: &str) -> Result<Self, Report> {
    match raw {
      "5p" => Ok(Self::FivePrime),
      "3p" => Ok(Self::ThreePrime),
      "-" => Ok(Self::Neither),
      other => make_error!("Invalid pseudo-coords F field (expected 5p|3p|-), got '{other}'"),
    }
  }
}

/// One token of a pseudo-coords string: one N-replacement audit record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PseudoCoordsEntry {
  pub seq_start: usize,
  pub seq_stop: usize,
  pub mdl_start: usize,
  pub mdl_stop: usize,
  /// `D:d`, the signed length difference between the sequence and model spans.
  pub delta: isize,
  /// The `!` suffix on `D`: the two spans are asymmetric in a way that matters
  /// downstream (e.g. the replacement couldn't be made length-preserving).
  pub delta_asymmetric: bool,
  /// `N:k/m`: `k` ambiguous (N) positions out of `m` total positions replaced.
  pub n_count: usize,
  pub n_total: usize,
  /// `E:x/y`: the expected-vs-observed run-length pair backing the replacement
  /// decision.
  pub e_x: usize,
  pub e_y: usize,
  pub flank: Flank,
  pub replaced: bool,
}

impl Display for PseudoCoordsEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[S:{}..{},M:{}..{},D:{}{},N:{}/{},E:{}/{},F:{},R:{}];",
      self.seq_start,
      self.seq_stop,
      self.mdl_start,
      self.mdl_stop,
      self.delta,
      if self.delta_asymmetric { "!" } else { "" },
      self.n_count,
      self.n_total,
      self.e_x,
      self.e_y,
      self.flank,
      if self.replaced { "Y" } else { "N" },
    )
  }
}

fn token_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^\[S:(\d+)\.\.(\d+),M:(\d+)\.\.(\d+),D:(-?\d+)(!)?,N:(\d+)/(\d+),E:(\d+)/(\d+),F:(5p|3p|-),R:(Y|N)\]$",
    )
    .expect("valid regex")
  })
}

/// Builds one token from its components (mirrors [`Display`]; kept as a
/// free function for symmetry with [`parse`]).
#[must_use]
pub fn construct(entry: &PseudoCoordsEntry) -> String {
  entry.to_string()
}

/// Parses a full pseudo-coords string (a concatenation of `;`-terminated
/// bracketed tokens) into its component entries. Fails on any token that
/// does not match the grammar.
pub fn parse(s: &str) -> Result<Vec<PseudoCoordsEntry>, Report> {
  let trimmed = s.trim();
  if trimmed.is_empty() {
    return Ok(Vec::new());
  }
  trimmed
    .split(';')
    .filter(|tok| !tok.trim().is_empty())
    .map(|tok| parse_token(&format!("{};", tok.trim())))
    .collect()
}

fn parse_token(token: &str) -> Result<PseudoCoordsEntry, Report> {
  let without_semi = token.strip_suffix(';').unwrap_or(token);
  let caps = token_regex()
    .captures(without_semi)
    .ok_or_else(|| eyre::eyre!("Invalid pseudo-coords token (does not match the S/M/D/N/E/F/R grammar): '{token}'"))?;

  let parse_usize = |i: usize| -> Result<usize, Report> {
    caps[i].parse().map_err(|_| eyre::eyre!("Invalid integer in pseudo-coords token '{token}'"))
  };
  let parse_isize = |i: usize| -> Result<isize, Report> {
    caps[i].parse().map_err(|_| eyre::eyre!("Invalid integer in pseudo-coords token '{token}'"))
  };

  Ok(PseudoCoordsEntry {
    seq_start: parse_usize(1)?,
    seq_stop: parse_usize(2)?,
    mdl_start: parse_usize(3)?,
    mdl_stop: parse_usize(4)?,
    delta: parse_isize(5)?,
    delta_asymmetric: caps.get(6).is_some(),
    n_count: parse_usize(7)?,
    n_total: parse_usize(8)?,
    e_x: parse_usize(9)?,
    e_y: parse_usize(10)?,
    flank: Flank::parse(&caps[11])?,
    replaced: &caps[12] == "Y",
  })
}
