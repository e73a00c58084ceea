//! External-process dispatch (spec.md component C6 "JobRunner"): shard
//! fan-out sizing, submission, polling, and merging. The core never spawns
//! processes itself; callers own dispatch and feed results back through
//! this module's pure parsing/decision functions (spec.md §5 "Scheduling
//! model").

mod merge;
mod poll;
mod shard;
mod submit;

pub mod testing;

pub use merge::{concatenate_only, concatenate_preserving_spacing, format_summary_table, merge_summary_tables, parse_summary_table, reformat_row, SummaryRow, SummaryTable};
pub use poll::{classify, finalize, poll_shards, JobOutcome, PollMode, ShardProbe};
pub use shard::{determine_shard_count, parse_and_validate_split};
pub use submit::{build_submission, SubmissionMode, SubmitTemplate};
