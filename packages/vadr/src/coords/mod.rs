//! Segmented, stranded genomic interval algebra (spec.md component C1 "Coords").
//!
//! Every other subsystem in this crate is expressed in terms of the types and
//! operations defined here: [`Segment`], [`Coords`] (an ordered, non-empty sequence
//! of segments, i.e. a parsed "coords string"), and the free functions operating
//! on them.

mod fractional;
mod genbank;
mod ops;
mod segment;
mod strand;

pub use fractional::{actual_from_fractional, fractional};
pub use genbank::from_location;
pub use ops::{
  max_length_segment, merge_all, missing, overlap, protein_rel_to_nuc_abs, rel_to_abs, rel_to_abs_single,
  reverse_complement, spans,
};
pub use segment::{from_triples, parse, seg, single, validate, Coords, Segment};
pub use strand::{Strand, StrandSummary};
