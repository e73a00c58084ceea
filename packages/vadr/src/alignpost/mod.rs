//! Post-alignment processing (spec.md component C5 "AlignPost"): insert-file
//! parse/write, CIGAR decode, position maps, the aligner-B pairwise-output
//! decode, Stockholm merge, and insert-string token update.

mod cigar;
mod insert;
mod insert_string;
mod pairwise;
mod posmap;
mod stockholm;

pub use cigar::{decode_cigar, parse_cigar, CigarOp};
pub use insert::{parse_insert_file, write_insert_file, InsertEntry, InsertTuple, ModelInsertBlock};
pub use insert_string::{format_insert_string, parse_insert_string, update_insert_string_token, InsertToken};
pub use pairwise::{decode_pairwise_output, PairwiseRecord};
pub use posmap::{build_position_map, PositionMap};
pub use stockholm::{merge_alignment, merge_stockholm, parse_stockholm, to_afa, write_stockholm, ExternalMerger, FirstShardAnnotator, ReferenceAnnotator, StockholmAlignment, UnionMerger};
