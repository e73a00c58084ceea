//! Error reporting conventions shared by every module.
//!
//! The crate uses `eyre::Report` uniformly rather than a per-module error enum,
//! matching the teacher's convention of `Result<T, Report>` plus `.wrap_err(...)`
//! at call boundaries. Two macros distinguish the two fatal error kinds named in
//! the design (parse/format and invariant violations) from "this should be
//! impossible given earlier validation" internal bugs.

/// A user-facing error: malformed input file, invalid coords string, a model-info
/// invariant violation, etc. Returns from the calling function.
#[macro_export]
macro_rules! make_error {
  ($($arg:tt)*) => {
    Err(eyre::eyre!($($arg)*))
  };
}

/// An internal invariant breach: an index or key that earlier validation was
/// supposed to guarantee is present/consistent. Kept distinct from `make_error!`
/// so these are grep-able separately from ordinary user-facing messages.
#[macro_export]
macro_rules! make_internal_report {
  ($($arg:tt)*) => {
    Err(eyre::eyre!("Internal error: {}", format!($($arg)*)))
  };
}

pub fn report_to_string(report: &eyre::Report) -> String {
  report.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ")
}
