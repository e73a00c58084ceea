//! Fractional <-> actual position conversion for a single segment (spec.md §4.1).
//!
//! Not fully pinned down by spec.md; the convention adopted here (documented as
//! an Open Question decision in DESIGN.md) treats each of a segment's `len()`
//! positions as occupying an equal-width slice of the `[0, 1)` fractional range,
//! and maps a fraction to the slice it falls into.

use crate::coords::segment::Segment;
use crate::make_error;
use eyre::Report;

/// Returns the fractional position (in `[0, 1]`) of `pos` within `segment`,
/// measured from the segment's 5' end in its own strand direction.
///
/// Fails if `pos` does not lie within `segment`.
pub fn fractional(segment: &Segment, pos: usize) -> Result<f64, Report> {
  let (lo, hi) = segment.lo_hi();
  if pos < lo || pos > hi {
    return make_error!("Position {pos} is outside segment '{segment}' (range {lo}..{hi})");
  }
  let len = segment.len();
  if len == 1 {
    return Ok(0.0);
  }
  let offset_from_5prime = match segment.strand {
    crate::coords::strand::Strand::Plus => pos - lo,
    crate::coords::strand::Strand::Minus => hi - pos,
  };
  Ok(offset_from_5prime as f64 / (len - 1) as f64)
}

/// Inverse of [`fractional`]: recovers the actual position in `segment` closest
/// to fraction `frac`, clamping `frac` to `[0, 1]` first.
pub fn actual_from_fractional(segment: &Segment, frac: f64) -> Result<usize, Report> {
  if !frac.is_finite() {
    return make_error!("Fractional position must be finite, got {frac}");
  }
  let frac = frac.clamp(0.0, 1.0);
  let len = segment.len();
  let (lo, hi) = segment.lo_hi();
  let offset = (frac * (len - 1) as f64).round() as usize;
  let offset = offset.min(len - 1);
  let pos = match segment.strand {
    crate::coords::strand::Strand::Plus => lo + offset,
    crate::coords::strand::Strand::Minus => hi - offset,
  };
  Ok(pos)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::segment::seg;
  use crate::coords::strand::Strand;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn fractional_endpoints_on_plus_strand() -> Result<(), Report> {
    let s = seg(10, 19, Strand::Plus)?;
    assert_eq!(fractional(&s, 10)?, 0.0);
    assert_eq!(fractional(&s, 19)?, 1.0);
    Ok(())
  }

  #[rstest]
  fn fractional_endpoints_on_minus_strand() -> Result<(), Report> {
    let s = seg(19, 10, Strand::Minus)?;
    assert_eq!(fractional(&s, 19)?, 0.0);
    assert_eq!(fractional(&s, 10)?, 1.0);
    Ok(())
  }

  #[rstest]
  fn round_trips_through_actual_from_fractional() -> Result<(), Report> {
    let s = seg(100, 109, Strand::Plus)?;
    for pos in 100..=109 {
      let f = fractional(&s, pos)?;
      assert_eq!(actual_from_fractional(&s, f)?, pos);
    }
    Ok(())
  }

  #[rstest]
  fn rejects_out_of_range_position() {
    let s = seg(10, 19, Strand::Plus).expect("valid segment");
    assert!(fractional(&s, 5).is_err());
  }

  #[rstest]
  fn single_position_segment_is_always_zero() -> Result<(), Report> {
    let s = seg(5, 5, Strand::Plus)?;
    assert_eq!(fractional(&s, 5)?, 0.0);
    Ok(())
  }
}
