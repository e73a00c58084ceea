//! A minimal test double standing in for real subprocess dispatch, so
//! [`super::poll::ShardProbe`] implementations can be exercised without
//! spawning anything.

use super::poll::ShardProbe;
use eyre::Report;
use std::cell::RefCell;

/// Records, per shard index, a scripted sequence of `(stdout, stderr)`
/// snapshots: each call to [`ExternalProcessSpy::advance`] moves every
/// shard to its next snapshot (or holds at the last one once exhausted),
/// modeling a real process's output growing between polls.
pub struct ExternalProcessSpy {
  snapshots: Vec<Vec<(String, String)>>,
  cursor: RefCell<usize>,
}

impl ExternalProcessSpy {
  #[must_use]
  pub fn new(snapshots: Vec<Vec<(String, String)>>) -> Self {
    Self {
      snapshots,
      cursor: RefCell::new(0),
    }
  }

  /// Advances every shard to its next scripted snapshot, if one remains.
  pub fn advance(&self) {
    let mut cursor = self.cursor.borrow_mut();
    if *cursor + 1 < self.snapshots.len() {
      *cursor += 1;
    }
  }

  #[must_use]
  pub fn poll_count(&self) -> usize {
    *self.cursor.borrow()
  }
}

impl ShardProbe for ExternalProcessSpy {
  fn stdout(&self, shard: usize) -> Result<String, Report> {
    let cursor = *self.cursor.borrow();
    Ok(self.snapshots[cursor][shard].0.clone())
  }

  fn stderr(&self, shard: usize) -> Result<String, Report> {
    let cursor = *self.cursor.borrow();
    Ok(self.snapshots[cursor][shard].1.clone())
  }

  fn stdout_path(&self, shard: usize) -> String {
    format!("shard.{shard}.stdout")
  }

  fn stderr_path(&self, shard: usize) -> String {
    format!("shard.{shard}.stderr")
  }
}

#[cfg(test)]
mod tests {
  use super::super::poll::{classify, JobOutcome, PollMode};
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn advances_through_scripted_snapshots() {
    let spy = ExternalProcessSpy::new(vec![
      vec![("running".to_owned(), String::new())],
      vec![("# CPU time 1s".to_owned(), String::new())],
    ]);
    assert_eq!(classify(&spy.stdout(0).unwrap(), "", &PollMode::Aligner, true), JobOutcome::Pending);
    spy.advance();
    assert_eq!(classify(&spy.stdout(0).unwrap(), "", &PollMode::Aligner, true), JobOutcome::Finished);
    spy.advance(); // no more snapshots: holds at the last one
    assert_eq!(spy.poll_count(), 1);
  }
}
