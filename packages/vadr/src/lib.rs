//! Viral sequence annotation and validation: coordinate algebra, feature-table
//! construction, the alert catalog, model-info file I/O, post-alignment
//! processing, and the external-job coordination layer that ties a pipeline
//! run together.
//!
//! Modules mirror the system's components: [`coords`] (segment/coordinate
//! algebra), [`model`] (feature tables built from a model-info file plus a
//! GenBank-derived feature blueprint), [`alerts`] (the alert kind catalog and
//! exception engine), [`minfo`] (the `.minfo` text format), [`alignpost`]
//! (insert files, CIGAR decode, Stockholm merge), [`jobrunner`] (shard
//! fan-out, submission, polling, merging), [`miscops`] (the small leftover
//! arithmetic/codecs that don't belong to any one component above), and
//! [`ftbl`] (the pass/fail verdict and feature-table text this whole pipeline
//! is built to produce).

pub mod alerts;
pub mod alignpost;
pub mod coords;
pub mod error;
pub mod ftbl;
pub mod jobrunner;
pub mod minfo;
pub mod miscops;
pub mod model;
pub mod utils;

pub use error::report_to_string;
