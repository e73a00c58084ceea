//! Parses GenBank `location` strings (`join(...)`, `complement(...)`, bare spans
//! and single positions) into a [`Coords`] value, per spec.md §3.3.

use crate::coords::segment::{seg, single, Coords, Segment};
use crate::coords::strand::Strand;
use crate::make_error;
use eyre::Report;
use regex::Regex;
use std::sync::OnceLock;

fn span_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^(<)?(\d+)(?:\.\.(>)?(\d+))?$").expect("valid regex"))
}

/// Parses one comma-separated element of a `join(...)` list (or a bare, unjoined
/// location): either `start..stop` or a single position, each with optional `<`/`>`
/// truncation markers, under the given strand.
///
/// On the minus strand the written `first..second` is complemented: the element's
/// own 5' end is `second`, not `first`, so the position values (and whichever
/// truncation marker travels with each) swap along with the strand flip. A single
/// position has nothing to swap.
fn parse_element(elem: &str, strand: Strand) -> Result<Segment, Report> {
  let elem = elem.trim();
  let caps = span_regex()
    .captures(elem)
    .ok_or_else(|| eyre::eyre!("Invalid GenBank location element: '{elem}'"))?;

  let first: usize = caps[2].parse().map_err(|_| eyre::eyre!("Invalid position in location element '{elem}'"))?;
  let first_trunc = caps.get(1).is_some();

  let segment = if let Some(stop_cap) = caps.get(4) {
    let second: usize = stop_cap.parse().map_err(|_| eyre::eyre!("Invalid stop position in '{elem}'"))?;
    let second_trunc = caps.get(3).is_some();
    if strand == Strand::Minus {
      let mut s = seg(second, first, strand)?;
      s.start_trunc = second_trunc;
      s.stop_trunc = first_trunc;
      s
    } else {
      let mut s = seg(first, second, strand)?;
      s.start_trunc = first_trunc;
      s.stop_trunc = second_trunc;
      s
    }
  } else {
    let mut s = single(first, strand)?;
    s.start_trunc = first_trunc;
    s
  };

  Ok(segment)
}

/// Parses a full GenBank location string into [`Coords`].
///
/// Grammar (spec.md §3.3): `location := complement(inner) | join(element,...) | element`,
/// where `complement(...)` may wrap a `join(...)` or a bare element, and `join(...)`
/// is never nested inside another `join(...)`. An individual `join(...)` element may
/// itself be wrapped in `complement(...)` (a trans-spliced, mixed-strand feature);
/// that per-element wrapping is independent of an outer `complement(...)` around the
/// whole location and does not reorder its siblings.
pub fn from_location(location: &str) -> Result<Coords, Report> {
  let location = location.trim();

  if let Some(inner) = strip_wrapper(location, "complement(") {
    let coords = from_location_strand(inner, Strand::Minus)?;
    // GenBank lists complement() segments 5'->3' on the minus strand, which is
    // the reverse of their appearance order under join(); spec.md's canonical
    // form preserves documented order, so we reverse back to genomic order here.
    let mut segments = coords.into_segments();
    segments.reverse();
    return Coords::new(segments);
  }

  from_location_strand(location, Strand::Plus)
}

fn from_location_strand(location: &str, strand: Strand) -> Result<Coords, Report> {
  if let Some(inner) = strip_wrapper(location, "join(") {
    let segments = inner
      .split(',')
      .map(|elem| parse_join_element(elem, strand))
      .collect::<Result<Vec<_>, _>>()?;
    return Coords::new(segments);
  }
  if location.contains('(') {
    return make_error!("Unsupported GenBank location syntax: '{location}'");
  }
  Ok(Coords::from_segment(parse_element(location, strand)?))
}

/// Parses one `join(...)` element, honoring a per-element `complement(...)` wrapper
/// that flips that element's strand independent of the join's outer strand.
fn parse_join_element(elem: &str, outer_strand: Strand) -> Result<Segment, Report> {
  let elem = elem.trim();
  if let Some(inner) = strip_wrapper(elem, "complement(") {
    return parse_element(inner, outer_strand.flip());
  }
  parse_element(elem, outer_strand)
}

fn strip_wrapper<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
  let rest = s.strip_prefix(prefix)?;
  rest.strip_suffix(')')
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_bare_span() -> Result<(), Report> {
    let c = from_location("1..100")?;
    assert_eq!(c.to_string(), "1..100:+");
    Ok(())
  }

  #[rstest]
  fn parses_single_position() -> Result<(), Report> {
    let c = from_location("42")?;
    assert_eq!(c.to_string(), "42..42:+");
    Ok(())
  }

  #[rstest]
  fn parses_join() -> Result<(), Report> {
    let c = from_location("join(1..10,20..30)")?;
    assert_eq!(c.to_string(), "1..10:+,20..30:+");
    Ok(())
  }

  #[rstest]
  fn parses_complement_of_span() -> Result<(), Report> {
    let c = from_location("complement(1..100)")?;
    assert_eq!(c.to_string(), "100..1:-");
    Ok(())
  }

  #[rstest]
  fn parses_complement_of_join_reverses_order() -> Result<(), Report> {
    let c = from_location("complement(join(1..10,20..30))")?;
    assert_eq!(c.to_string(), "30..20:-,10..1:-");
    Ok(())
  }

  #[rstest]
  fn complement_swaps_truncation_markers() -> Result<(), Report> {
    let c = from_location("complement(<1..100)")?;
    let s = c.segments()[0];
    // written `<1..100` puts `<` on the 100-end once complemented.
    assert!(s.start_trunc);
    assert!(!s.stop_trunc);
    Ok(())
  }

  #[rstest]
  fn parses_mixed_strand_join_with_per_element_complement() -> Result<(), Report> {
    // spec.md §8 scenario 1, carrots on.
    let c = from_location("join(complement(300..>400),<1..>200)")?;
    assert_eq!(c.to_string(), "<400..300:-,<1..>200:+");
    Ok(())
  }

  #[rstest]
  fn rejects_unsupported_nesting() {
    assert!(from_location("join(join(1..10))").is_err());
  }
}
