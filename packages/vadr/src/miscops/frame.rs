//! Frame arithmetic (spec.md §4.7).

use crate::make_error;
use eyre::Report;

/// Adjusts a codon frame (1, 2, or 3) by a signed nucleotide offset:
/// `((orig - diff - 1) mod 3) + 1`, using a Euclidean modulus so negative
/// offsets wrap the same way the source's `%`-then-normalize idiom does.
pub fn adjust_frame(orig_frame: u8, diff: isize) -> Result<u8, Report> {
  if !(1..=3).contains(&orig_frame) {
    return make_error!("Frame must be 1, 2, or 3, got {orig_frame}");
  }
  let orig = isize::from(orig_frame);
  let adjusted = (orig - diff - 1).rem_euclid(3) + 1;
  Ok(adjusted as u8)
}
