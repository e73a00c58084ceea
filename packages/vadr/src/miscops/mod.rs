//! Small, otherwise-homeless arithmetic and text codecs (spec.md component
//! C7 "MiscOps"): frame adjustment, the pseudo-coords string codec used for
//! N-replacement reporting, and the external fasta-splitter's output contract.

mod fastasplit;
mod frame;
mod pseudocoords;

pub use fastasplit::{parse_split_listing, SplitFileEntry};
pub use frame::adjust_frame;
pub use pseudocoords::{parse as parse_pseudo_coords, Flank, PseudoCoordsEntry};
