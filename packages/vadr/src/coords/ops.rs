//! Free functions over [`Coords`]/[`Segment`] (spec.md §4: overlap, spans,
//! merge_all, max_length_segment, missing, reverse_complement, and the
//! rel_to_abs family).

use crate::coords::segment::{seg, Coords, Segment};
use crate::coords::strand::Strand;
use crate::make_error;
use eyre::Report;

/// The overlapping region of two same-strand segments, oriented like `a`.
/// Returns `None` if the strands differ or the ranges don't intersect.
#[must_use]
pub fn overlap(a: &Segment, b: &Segment) -> Option<Segment> {
  if a.strand != b.strand {
    return None;
  }
  let (a_lo, a_hi) = a.lo_hi();
  let (b_lo, b_hi) = b.lo_hi();
  let lo = a_lo.max(b_lo);
  let hi = a_hi.min(b_hi);
  if lo > hi {
    return None;
  }
  let (start, stop) = if a.strand == Strand::Plus { (lo, hi) } else { (hi, lo) };
  Some(Segment {
    start,
    stop,
    strand: a.strand,
    start_trunc: false,
    stop_trunc: false,
  })
}

/// `true` iff every position of every segment of `b` lies within some segment
/// of `a` on the matching strand.
#[must_use]
pub fn spans(a: &Coords, b: &Coords) -> bool {
  b.segments().iter().all(|b_seg| {
    let (b_lo, b_hi) = b_seg.lo_hi();
    a.segments()
      .iter()
      .filter(|a_seg| a_seg.strand == b_seg.strand)
      .any(|a_seg| {
        let (a_lo, a_hi) = a_seg.lo_hi();
        a_lo <= b_lo && b_hi <= a_hi
      })
  })
}

/// Greedily merges segments that are adjacent (touching, same strand) in the
/// order they appear in `coords`. Does not reorder or merge non-adjacent
/// segments even when they would abut after sorting.
#[must_use]
pub fn merge_all(coords: &Coords) -> Coords {
  let mut merged: Vec<Segment> = Vec::with_capacity(coords.segments().len());
  for &next in coords.segments() {
    if let Some(last) = merged.last_mut() {
      if let Some(joined) = try_join_adjacent(last, &next) {
        *last = joined;
        continue;
      }
    }
    merged.push(next);
  }
  Coords::new(merged).expect("input was non-empty, so is the merged output")
}

fn try_join_adjacent(a: &Segment, b: &Segment) -> Option<Segment> {
  if a.strand != b.strand {
    return None;
  }
  let touching = match a.strand {
    Strand::Plus => a.stop + 1 == b.start,
    Strand::Minus => a.stop == b.start + 1,
  };
  if !touching {
    return None;
  }
  Some(Segment {
    start: a.start,
    stop: b.stop,
    strand: a.strand,
    start_trunc: a.start_trunc,
    stop_trunc: b.stop_trunc,
  })
}

/// The longest segment in `coords`. On a length tie, the first occurrence wins.
#[must_use]
pub fn max_length_segment(coords: &Coords) -> Segment {
  let mut best = coords.segments()[0];
  for &candidate in &coords.segments()[1..] {
    if candidate.len() > best.len() {
      best = candidate;
    }
  }
  best
}

/// The positions in `1..=total_len` on `strand` not covered by any segment of
/// `coords` that is itself on `strand` (segments on the other strand don't
/// count as coverage). Returns `None` if nothing is missing.
pub fn missing(coords: &Coords, strand: Strand, total_len: usize) -> Result<Option<Coords>, Report> {
  let mut ranges: Vec<(usize, usize)> = coords
    .segments()
    .iter()
    .filter(|s| s.strand == strand)
    .map(Segment::lo_hi)
    .collect();
  for &(_, hi) in &ranges {
    if hi > total_len {
      return make_error!("Coords '{coords}' extend to position {hi}, beyond total_len={total_len}");
    }
  }
  ranges.sort_unstable();

  let mut gaps = Vec::new();
  let mut cursor = 1usize;
  for (lo, hi) in ranges {
    if lo > cursor {
      gaps.push((cursor, lo - 1));
    }
    cursor = cursor.max(hi + 1);
  }
  if cursor <= total_len {
    gaps.push((cursor, total_len));
  }

  if gaps.is_empty() {
    return Ok(None);
  }
  let segments = gaps
    .into_iter()
    .map(|(lo, hi)| {
      let (start, stop) = if strand == Strand::Plus { (lo, hi) } else { (hi, lo) };
      seg(start, stop, strand)
    })
    .collect::<Result<Vec<_>, _>>()?;
  Ok(Some(Coords::new(segments)?))
}

/// The reverse complement of an already-assembled list of absolute-coordinate
/// segments: reverses segment order, and within each segment swaps start/stop
/// (and the two truncation flags) and flips the strand. No sequence length is
/// needed since the coordinates are already absolute.
#[must_use]
fn reverse_complement_segments(mut segments: Vec<Segment>) -> Vec<Segment> {
  segments.reverse();
  for s in &mut segments {
    std::mem::swap(&mut s.start, &mut s.stop);
    std::mem::swap(&mut s.start_trunc, &mut s.stop_trunc);
    s.strand = s.strand.flip();
  }
  segments
}

/// The reverse complement of `coords` expressed in absolute coordinates.
#[must_use]
pub fn reverse_complement(coords: &Coords) -> Coords {
  let segments = reverse_complement_segments(coords.segments().to_vec());
  Coords::new(segments).expect("reverse complement preserves segment count")
}

/// One entry of the flattened "virtual sequence" position table used by
/// [`rel_to_abs`]: for virtual position `i` (0-based), `table[i]` gives the
/// absolute coordinate it corresponds to, the strand of the abs segment it
/// came from, and that abs segment's index within `abs`.
struct AbsTableEntry {
  abs_coord: usize,
  abs_strand: Strand,
  abs_segment_index: usize,
}

fn abs_position_table(abs: &Coords) -> Vec<AbsTableEntry> {
  let mut table = Vec::with_capacity(abs.length());
  for (index, segment) in abs.segments().iter().enumerate() {
    let mut pos = segment.start as isize;
    let step = segment.strand.step();
    for _ in 0..segment.len() {
      table.push(AbsTableEntry {
        abs_coord: pos as usize,
        abs_strand: segment.strand,
        abs_segment_index: index,
      });
      pos += step;
    }
  }
  table
}

/// Projects a single relative (virtual-sequence) position onto its absolute
/// coordinate via `abs`.
pub fn rel_to_abs_single(abs: &Coords, rel_pos: usize) -> Result<usize, Report> {
  let table = abs_position_table(abs);
  if rel_pos == 0 || rel_pos > table.len() {
    return make_error!("Relative position {rel_pos} is out of range for abs coords of length {}", table.len());
  }
  Ok(table[rel_pos - 1].abs_coord)
}

/// Projects spliced relative coordinates `rel` (positions into the virtual
/// sequence described by `abs`) onto absolute genomic coordinates.
///
/// `rel` must have a uniform strand. Each rel segment is walked low-to-high
/// through the abs position table and split into runs wherever the
/// corresponding abs segment changes; each run becomes one output segment,
/// oriented per that abs segment's own strand. If `rel`'s strand is `Minus`,
/// the fully assembled output is reverse-complemented. The result is always
/// passed through [`merge_all`].
pub fn rel_to_abs(abs: &Coords, rel: &Coords) -> Result<Coords, Report> {
  let rel_strand = rel.uniform_strand()?;
  let table = abs_position_table(abs);
  let total_len = table.len();

  let mut output = Vec::new();
  for rel_segment in rel.segments() {
    let (lo, hi) = rel_segment.lo_hi();
    if lo == 0 || hi > total_len {
      return make_error!("Relative segment '{rel_segment}' is out of range for abs coords of length {total_len}");
    }

    let mut run_start_coord = table[lo - 1].abs_coord;
    let mut run_strand = table[lo - 1].abs_strand;
    let mut run_segment_index = table[lo - 1].abs_segment_index;
    let mut run_last_coord = run_start_coord;

    for p in (lo + 1)..=hi {
      let entry = &table[p - 1];
      if entry.abs_segment_index == run_segment_index {
        run_last_coord = entry.abs_coord;
        continue;
      }
      output.push(finish_run(run_start_coord, run_last_coord, run_strand));
      run_start_coord = entry.abs_coord;
      run_last_coord = entry.abs_coord;
      run_strand = entry.abs_strand;
      run_segment_index = entry.abs_segment_index;
    }
    output.push(finish_run(run_start_coord, run_last_coord, run_strand));
  }

  if let Some(first) = output.first_mut() {
    first.start_trunc = rel.segments()[0].start_trunc;
  }
  if let Some(last) = output.last_mut() {
    last.stop_trunc = rel.segments()[rel.segments().len() - 1].stop_trunc;
  }

  if rel_strand == Strand::Minus {
    output = reverse_complement_segments(output);
  }

  Ok(merge_all(&Coords::new(output)?))
}

fn finish_run(start: usize, stop: usize, strand: Strand) -> Segment {
  match strand {
    Strand::Plus => Segment {
      start,
      stop,
      strand,
      start_trunc: false,
      stop_trunc: false,
    },
    Strand::Minus => Segment {
      start: stop,
      stop: start,
      strand,
      start_trunc: false,
      stop_trunc: false,
    },
  }
}

/// Converts protein-space relative coordinates (1-based amino-acid positions)
/// into nucleotide-space relative coordinates via the `start' = 3p - 2`,
/// `stop' = 3p` transform, then projects them onto `abs` via [`rel_to_abs`].
pub fn protein_rel_to_nuc_abs(abs: &Coords, protein_rel: &Coords) -> Result<Coords, Report> {
  let nt_segments = protein_rel
    .segments()
    .iter()
    .map(|s| {
      let (lo, hi) = s.lo_hi();
      let nt_start = 3 * lo - 2;
      let nt_stop = 3 * hi;
      let (start, stop) = if s.strand == Strand::Plus { (nt_start, nt_stop) } else { (nt_stop, nt_start) };
      seg(start, stop, s.strand)
    })
    .collect::<Result<Vec<_>, _>>()?;
  rel_to_abs(abs, &Coords::new(nt_segments)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::segment::parse;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn overlap_of_disjoint_segments_is_none() -> Result<(), Report> {
    let a = seg(1, 10, Strand::Plus)?;
    let b = seg(20, 30, Strand::Plus)?;
    assert_eq!(overlap(&a, &b), None);
    Ok(())
  }

  #[rstest]
  fn overlap_of_overlapping_segments() -> Result<(), Report> {
    let a = seg(1, 10, Strand::Plus)?;
    let b = seg(5, 15, Strand::Plus)?;
    assert_eq!(overlap(&a, &b), Some(seg(5, 10, Strand::Plus)?));
    Ok(())
  }

  #[rstest]
  fn overlap_requires_same_strand() -> Result<(), Report> {
    let a = seg(1, 10, Strand::Plus)?;
    let b = seg(10, 1, Strand::Minus)?;
    assert_eq!(overlap(&a, &b), None);
    Ok(())
  }

  #[rstest]
  fn merge_all_joins_adjacent_segments() -> Result<(), Report> {
    let c = parse("1..10:+,11..20:+,30..40:+")?;
    let merged = merge_all(&c);
    assert_eq!(merged.to_string(), "1..20:+,30..40:+");
    Ok(())
  }

  #[rstest]
  fn merge_all_does_not_join_across_strand() -> Result<(), Report> {
    let c = parse("1..10:+,11..20:-")?;
    let merged = merge_all(&c);
    assert_eq!(merged.to_string(), "1..10:+,11..20:-");
    Ok(())
  }

  #[rstest]
  fn max_length_segment_breaks_ties_by_first_occurrence() -> Result<(), Report> {
    let c = parse("1..5:+,10..14:+,20..21:+")?;
    assert_eq!(max_length_segment(&c), seg(1, 5, Strand::Plus)?);
    Ok(())
  }

  #[rstest]
  fn missing_finds_gaps() -> Result<(), Report> {
    let c = parse("1..10:+,20..30:+")?;
    let gaps = missing(&c, Strand::Plus, 35)?.expect("gaps exist");
    assert_eq!(gaps.to_string(), "11..19:+,31..35:+");
    Ok(())
  }

  #[rstest]
  fn missing_is_none_when_fully_covered() -> Result<(), Report> {
    let c = parse("1..10:+")?;
    assert_eq!(missing(&c, Strand::Plus, 10)?, None);
    Ok(())
  }

  #[rstest]
  fn missing_ignores_other_strand_segments() -> Result<(), Report> {
    let c = parse("1..10:-")?;
    let gaps = missing(&c, Strand::Plus, 10)?.expect("whole range missing on +");
    assert_eq!(gaps.to_string(), "1..10:+");
    Ok(())
  }

  #[rstest]
  fn spans_checks_strand_and_containment() -> Result<(), Report> {
    let a = parse("1..100:+")?;
    let b = parse("10..20:+")?;
    assert!(spans(&a, &b));
    let c = parse("10..20:-")?;
    assert!(!spans(&a, &c));
    Ok(())
  }

  #[rstest]
  fn reverse_complement_reverses_order_and_flips_strand() -> Result<(), Report> {
    let c = parse("1..10:+,20..30:+")?;
    let rc = reverse_complement(&c);
    assert_eq!(rc.to_string(), "30..20:-,10..1:-");
    Ok(())
  }

  #[rstest]
  fn rel_to_abs_single_segment() -> Result<(), Report> {
    let abs = parse("11..40:+")?;
    assert_eq!(rel_to_abs_single(&abs, 1)?, 11);
    assert_eq!(rel_to_abs_single(&abs, 30)?, 40);
    Ok(())
  }

  /// Worked example from the coordinate-algebra specification: a spliced
  /// absolute region made of two exons, with protein-space relative
  /// coordinates spanning the splice junction.
  #[rstest]
  fn protein_rel_to_nuc_abs_across_splice_junction() -> Result<(), Report> {
    let abs = parse("11..40:+,42..101:+")?;
    let protein_rel = parse("2..3:+,5..11:+")?;
    let result = protein_rel_to_nuc_abs(&abs, &protein_rel)?;
    assert_eq!(result.to_string(), "14..19:+,23..40:+,42..44:+");
    Ok(())
  }

  #[rstest]
  fn rel_to_abs_rejects_mixed_strand_rel() -> Result<(), Report> {
    let abs = parse("1..100:+")?;
    let rel = parse("1..10:+,20..30:-")?;
    assert!(rel_to_abs(&abs, &rel).is_err());
    Ok(())
  }
}
