//! Model-info file reader/writer (spec.md component C4 "ModelInfoFile"): the
//! text format that ties the coordinate algebra, feature model, and alert
//! exceptions together between build and annotate stages.

mod compat;
mod grammar;
mod reader;
mod writer;

pub use compat::rewrite_backward_compat;
pub use grammar::{Line, GBSEP};
pub use reader::{parse_model_info, ModelEntry};
pub use writer::write_model_info;
