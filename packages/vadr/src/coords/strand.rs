use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The strand of a single [`crate::coords::Segment`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
  Plus,
  Minus,
}

impl Strand {
  #[must_use]
  pub fn flip(self) -> Self {
    match self {
      Self::Plus => Self::Minus,
      Self::Minus => Self::Plus,
    }
  }

  /// +1 for `Plus`, -1 for `Minus`: the direction positions move in when walking
  /// forward along a segment on this strand.
  #[must_use]
  pub fn step(self) -> isize {
    match self {
      Self::Plus => 1,
      Self::Minus => -1,
    }
  }
}

impl Display for Strand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Plus => write!(f, "+"),
      Self::Minus => write!(f, "-"),
    }
  }
}

/// The strand summary of a whole [`crate::coords::Coords`]: uniform `+`, uniform
/// `-`, or `Mixed` when segments disagree. Mixed is only legal in the subset of
/// operations that spec.md §4.1 documents as accepting it (overlap, spans,
/// merge_all); `rel_to_abs` and friends reject it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrandSummary {
  Plus,
  Minus,
  Mixed,
}

impl Display for StrandSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Plus => write!(f, "+"),
      Self::Minus => write!(f, "-"),
      Self::Mixed => write!(f, "mixed"),
    }
  }
}

impl StrandSummary {
  #[must_use]
  pub fn is_uniform(self) -> bool {
    !matches!(self, Self::Mixed)
  }

  #[must_use]
  pub fn as_strand(self) -> Option<Strand> {
    match self {
      Self::Plus => Some(Strand::Plus),
      Self::Minus => Some(Strand::Minus),
      Self::Mixed => None,
    }
  }
}
