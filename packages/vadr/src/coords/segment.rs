use crate::coords::strand::{Strand, StrandSummary};
use crate::{make_error, make_internal_report};
use eyre::Report;
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::OnceLock;

/// One span of a coords string: `(start, stop, strand)` plus two independent
/// truncation markers. `start`/`stop` are 1-based, per spec.md §3.1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
  pub start: usize,
  pub stop: usize,
  pub strand: Strand,
  /// `<` before `start`: "extends beyond the observed boundary" on the 5' side.
  pub start_trunc: bool,
  /// `>` before `stop`: same, on the 3' side.
  pub stop_trunc: bool,
}

impl Segment {
  /// A segment is forward if `start <= stop` on `+`, or `start >= stop` on `-`.
  #[must_use]
  pub fn is_forward(&self) -> bool {
    match self.strand {
      Strand::Plus => self.start <= self.stop,
      Strand::Minus => self.start >= self.stop,
    }
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.start.abs_diff(self.stop) + 1
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    false // a segment always covers at least one position
  }

  /// The lower and upper genomic coordinate, irrespective of strand direction.
  #[must_use]
  pub fn lo_hi(&self) -> (usize, usize) {
    (self.start.min(self.stop), self.start.max(self.stop))
  }

  #[must_use]
  pub fn without_truncation(&self) -> Self {
    Self {
      start_trunc: false,
      stop_trunc: false,
      ..*self
    }
  }
}

fn segment_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^(<)?(\d+)\.\.(>)?(\d+):([+-])$").expect("valid regex"))
}

impl FromStr for Segment {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Report> {
    let caps = segment_regex()
      .captures(s.trim())
      .ok_or_else(|| eyre::eyre!("Invalid coords segment (expected `[<]start..[>]stop:strand`): '{s}'"))?;

    let start: usize = caps[2].parse().map_err(|_| eyre::eyre!("Invalid start position in segment '{s}'"))?;
    let stop: usize = caps[4].parse().map_err(|_| eyre::eyre!("Invalid stop position in segment '{s}'"))?;
    if start == 0 || stop == 0 {
      return make_error!("Coords segment positions are 1-based, got 0 in '{s}'");
    }
    let strand = match &caps[5] {
      "+" => Strand::Plus,
      "-" => Strand::Minus,
      other => return make_internal_report!("Regex matched unknown strand symbol '{other}'"),
    };

    Ok(Self {
      start,
      stop,
      strand,
      start_trunc: caps.get(1).is_some(),
      stop_trunc: caps.get(3).is_some(),
    })
  }
}

impl Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.start_trunc {
      write!(f, "<")?;
    }
    write!(f, "{}..", self.start)?;
    if self.stop_trunc {
      write!(f, ">")?;
    }
    write!(f, "{}:{}", self.stop, self.strand)
  }
}

/// Builds a single segment, rejecting degenerate inputs (zero positions).
pub fn seg(start: usize, stop: usize, strand: Strand) -> Result<Segment, Report> {
  if start == 0 || stop == 0 {
    return make_error!("Coords segment positions must be >= 1, got start={start}, stop={stop}");
  }
  Ok(Segment {
    start,
    stop,
    strand,
    start_trunc: false,
    stop_trunc: false,
  })
}

/// Builds a one-position segment.
pub fn single(pos: usize, strand: Strand) -> Result<Segment, Report> {
  seg(pos, pos, strand)
}

/// An ordered, non-empty sequence of segments: a parsed "coords string"
/// (spec.md §3.1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coords {
  segments: Vec<Segment>,
}

impl Coords {
  /// Fails if `segments` is empty: a coords string always has at least one segment.
  pub fn new(segments: Vec<Segment>) -> Result<Self, Report> {
    if segments.is_empty() {
      return make_error!("A coords string must contain at least one segment");
    }
    Ok(Self { segments })
  }

  #[must_use]
  pub fn from_segment(segment: Segment) -> Self {
    Self {
      segments: vec![segment],
    }
  }

  #[must_use]
  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub fn into_segments(self) -> Vec<Segment> {
    self.segments
  }

  #[must_use]
  pub fn length(&self) -> usize {
    self.segments.iter().map(Segment::len).sum()
  }

  #[must_use]
  pub fn min(&self) -> usize {
    self
      .segments
      .iter()
      .map(|s| s.lo_hi().0)
      .min()
      .expect("non-empty by construction")
  }

  #[must_use]
  pub fn max(&self) -> usize {
    self
      .segments
      .iter()
      .map(|s| s.lo_hi().1)
      .max()
      .expect("non-empty by construction")
  }

  #[must_use]
  pub fn strand_summary(&self) -> StrandSummary {
    let mut plus = false;
    let mut minus = false;
    for s in &self.segments {
      match s.strand {
        Strand::Plus => plus = true,
        Strand::Minus => minus = true,
      }
    }
    match (plus, minus) {
      (true, true) => StrandSummary::Mixed,
      (true, false) => StrandSummary::Plus,
      (false, true) => StrandSummary::Minus,
      (false, false) => unreachable!("Coords is never empty"),
    }
  }

  /// Requires a uniform strand; used by operations that spec.md disallows mixed
  /// coords for (e.g. `rel_to_abs`).
  pub fn uniform_strand(&self) -> Result<Strand, Report> {
    self
      .strand_summary()
      .as_strand()
      .ok_or_else(|| eyre::eyre!("Expected a coords string with uniform strand, got mixed: '{self}'"))
  }
}

impl Display for Coords {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.segments.iter().join(","))
  }
}

impl FromStr for Coords {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Report> {
    let segments = s
      .split(',')
      .map(Segment::from_str)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|err| eyre::eyre!("{err}").wrap_err(format!("When parsing coords string '{s}'")))?;
    Self::new(segments)
  }
}

/// Total function: `true` iff `s` parses as a valid coords string.
#[must_use]
pub fn validate(s: &str) -> bool {
  Coords::from_str(s).is_ok()
}

/// Parses a coords string, failing on any deviation from the canonical grammar.
pub fn parse(s: &str) -> Result<Coords, Report> {
  Coords::from_str(s)
}

/// Builds a coords string from three parallel arrays, failing if lengths differ.
pub fn from_triples(starts: &[usize], stops: &[usize], strands: &[Strand]) -> Result<Coords, Report> {
  if starts.len() != stops.len() || starts.len() != strands.len() {
    return make_error!(
      "from_triples: parallel arrays must have equal length, got starts={}, stops={}, strands={}",
      starts.len(),
      stops.len(),
      strands.len()
    );
  }
  let segments = starts
    .iter()
    .zip(stops)
    .zip(strands)
    .map(|((&start, &stop), &strand)| seg(start, stop, strand))
    .collect::<Result<Vec<_>, _>>()?;
  Coords::new(segments)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_simple_segment() -> Result<(), Report> {
    let c = parse("1..200:+")?;
    assert_eq!(c.length(), 200);
    assert_eq!(c.segments()[0].strand, Strand::Plus);
    Ok(())
  }

  #[rstest]
  fn parses_truncation_markers() -> Result<(), Report> {
    let c = parse("<1..>200:+")?;
    let s = c.segments()[0];
    assert!(s.start_trunc);
    assert!(s.stop_trunc);
    Ok(())
  }

  #[rstest]
  fn parses_backward_minus_segment() -> Result<(), Report> {
    let c = parse("200..1:-")?;
    assert!(c.segments()[0].is_forward());
    assert_eq!(c.length(), 200);
    Ok(())
  }

  #[rstest]
  fn rejects_malformed_strand() {
    assert!(parse("1..200:x").is_err());
    assert!(!validate("1..200:x"));
  }

  #[rstest]
  fn rejects_zero_position() {
    assert!(parse("0..200:+").is_err());
  }

  #[rstest]
  fn length_sums_segments() -> Result<(), Report> {
    let c = parse("1..10:+,20..25:+")?;
    assert_eq!(c.length(), 16);
    Ok(())
  }

  #[rstest]
  fn strand_summary_detects_mixed() -> Result<(), Report> {
    let c = parse("1..10:+,20..25:-")?;
    assert_eq!(c.strand_summary(), StrandSummary::Mixed);
    Ok(())
  }

  #[rstest]
  fn display_round_trips() -> Result<(), Report> {
    let text = "<1..>200:+,5..1:-";
    let c = parse(text)?;
    assert_eq!(c.to_string(), text);
    Ok(())
  }

  #[rstest]
  fn from_triples_checks_length() {
    let strands = [Strand::Plus];
    assert!(from_triples(&[1, 2], &[10, 20], &strands).is_err());
  }
}
