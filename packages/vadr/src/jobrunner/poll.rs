//! Polling (spec.md §4.6 "Polling", §6.7 "External process contracts").
//!
//! Shard I/O is abstracted behind [`ShardProbe`] so the backoff/completion
//! logic can be exercised without spawning real subprocesses; see
//! [`super::testing::ExternalProcessSpy`] for the test double.

use crate::make_error;
use eyre::Report;
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Per-shard completion state. `SoftFail` and `HardFail` are both terminal
/// failures from the poller's point of view; `SoftFail` additionally
/// records the matrix size an aligner reported needing, so the caller may
/// retry with a larger one (spec.md §7 "recoverable" matrix overflow).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum JobOutcome {
  Finished,
  SoftFail { mx_size: f64 },
  HardFail,
  Pending,
}

impl JobOutcome {
  #[must_use]
  pub fn is_terminal(self) -> bool {
    !matches!(self, JobOutcome::Pending)
  }
}

/// How a shard's stdout is interpreted to detect completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollMode {
  /// Final stdout line matches `# CPU time` (success) or
  /// `Error: ... mxes need <N>` (soft failure).
  Aligner,
  /// Final stdout line equals the given sentinel.
  Generic { finished_str: String },
}

fn mx_error_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^Error:.*mxes need ([0-9.]+)").expect("valid regex"))
}

fn last_nonblank_line(text: &str) -> Option<&str> {
  text.lines().rev().find(|l| !l.trim().is_empty())
}

/// Classifies one shard from its current stdout/stderr contents.
#[must_use]
pub fn classify(stdout: &str, stderr: &str, mode: &PollMode, error_checking: bool) -> JobOutcome {
  if error_checking && !stderr.trim().is_empty() {
    return JobOutcome::HardFail;
  }
  let Some(last) = last_nonblank_line(stdout) else {
    return JobOutcome::Pending;
  };
  match mode {
    PollMode::Aligner => {
      if last.starts_with("# CPU time") {
        JobOutcome::Finished
      } else if let Some(caps) = mx_error_regex().captures(last) {
        let mx_size: f64 = caps[1].parse().unwrap_or(0.0);
        JobOutcome::SoftFail { mx_size }
      } else {
        JobOutcome::Pending
      }
    }
    PollMode::Generic { finished_str } => {
      if last == finished_str {
        JobOutcome::Finished
      } else {
        JobOutcome::Pending
      }
    }
  }
}

/// Per-shard stdout/stderr access and filenames, abstracted so the poller
/// can be driven without real subprocesses.
pub trait ShardProbe {
  fn stdout(&self, shard: usize) -> Result<String, Report>;
  fn stderr(&self, shard: usize) -> Result<String, Report>;
  fn stdout_path(&self, shard: usize) -> String;
  fn stderr_path(&self, shard: usize) -> String;
}

/// Polls every shard until all are terminal or the wall-clock budget
/// elapses, at which point one last sweep is taken before returning.
/// `sleep` is injected so tests can drive the loop without real waiting.
pub fn poll_shards(
  probe: &dyn ShardProbe,
  num_shards: usize,
  mode: &PollMode,
  error_checking: bool,
  initial_delay: Duration,
  budget: Duration,
  mut sleep: impl FnMut(Duration),
) -> Result<Vec<JobOutcome>, Report> {
  let mut outcomes = vec![JobOutcome::Pending; num_shards];
  let deadline = Instant::now() + budget;
  let mut delay = initial_delay;

  loop {
    for (idx, outcome) in outcomes.iter_mut().enumerate() {
      if outcome.is_terminal() {
        continue;
      }
      let stdout = probe.stdout(idx)?;
      let stderr = probe.stderr(idx)?;
      *outcome = classify(&stdout, &stderr, mode, error_checking);
    }
    if outcomes.iter().all(|o| o.is_terminal()) || Instant::now() >= deadline {
      break;
    }
    sleep(delay);
    delay = (delay * 2).min(Duration::from_secs(120));
  }

  Ok(outcomes)
}

/// Fails if any shard is non-`Finished`, reporting every such shard's
/// stdout/stderr filenames (spec.md §4.6 "Polling", last paragraph).
pub fn finalize(outcomes: &[JobOutcome], probe: &dyn ShardProbe) -> Result<(), Report> {
  let failed: Vec<String> = outcomes
    .iter()
    .enumerate()
    .filter(|(_, o)| !matches!(o, JobOutcome::Finished))
    .map(|(idx, o)| format!("shard {idx} ({o:?}): stdout={}, stderr={}", probe.stdout_path(idx), probe.stderr_path(idx)))
    .collect();
  if failed.is_empty() {
    Ok(())
  } else {
    make_error!("{} shard(s) did not finish successfully:\n{}", failed.len(), failed.join("\n"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;
  use std::cell::RefCell;

  struct ScriptedProbe {
    // one Vec<(stdout, stderr)> per shard, consumed one entry per poll round
    rounds: RefCell<Vec<Vec<(String, String)>>>,
  }

  impl ShardProbe for ScriptedProbe {
    fn stdout(&self, shard: usize) -> Result<String, Report> {
      let rounds = self.rounds.borrow();
      let round = rounds.first().expect("at least one round queued");
      Ok(round[shard].0.clone())
    }
    fn stderr(&self, shard: usize) -> Result<String, Report> {
      let rounds = self.rounds.borrow();
      let round = rounds.first().expect("at least one round queued");
      Ok(round[shard].1.clone())
    }
    fn stdout_path(&self, shard: usize) -> String {
      format!("shard.{shard}.out")
    }
    fn stderr_path(&self, shard: usize) -> String {
      format!("shard.{shard}.err")
    }
  }

  #[rstest]
  fn classifies_aligner_success() {
    assert_eq!(classify("aligning...\n# CPU time  0.5s\n", "", &PollMode::Aligner, true), JobOutcome::Finished);
  }

  #[rstest]
  fn classifies_aligner_soft_failure() {
    let outcome = classify("Error: DP matrix mxes need 12.5 Gb\n", "", &PollMode::Aligner, true);
    assert_eq!(outcome, JobOutcome::SoftFail { mx_size: 12.5 });
  }

  #[rstest]
  fn classifies_generic_sentinel() {
    assert_eq!(classify("working\n[ok]\n", "", &PollMode::Generic { finished_str: "[ok]".to_owned() }, true), JobOutcome::Finished);
    assert_eq!(classify("working\n", "", &PollMode::Generic { finished_str: "[ok]".to_owned() }, true), JobOutcome::Pending);
  }

  #[rstest]
  fn nonempty_stderr_hard_fails_when_error_checking() {
    assert_eq!(classify("# CPU time 1s\n", "segfault\n", &PollMode::Aligner, true), JobOutcome::HardFail);
  }

  #[rstest]
  fn poll_loop_converges_once_all_shards_finish() -> Result<(), Report> {
    let probe = ScriptedProbe {
      rounds: RefCell::new(vec![vec![("running".to_owned(), String::new()), ("# CPU time 1s".to_owned(), String::new())], vec![
        ("# CPU time 2s".to_owned(), String::new()),
        ("# CPU time 1s".to_owned(), String::new()),
      ]]),
    };
    // advance to the next scripted round after each sleep call
    let mut sleeps = 0;
    let outcomes = poll_shards(&probe, 2, &PollMode::Aligner, true, Duration::from_secs(1), Duration::from_secs(60), |_| {
      sleeps += 1;
      let mut rounds = probe.rounds.borrow_mut();
      if rounds.len() > 1 {
        rounds.remove(0);
      }
    })?;
    assert_eq!(sleeps, 1);
    assert!(outcomes.iter().all(|o| matches!(o, JobOutcome::Finished)));
    finalize(&outcomes, &probe)?;
    Ok(())
  }

  #[rstest]
  fn finalize_reports_unfinished_shards() {
    let probe = ScriptedProbe {
      rounds: RefCell::new(vec![vec![(String::new(), String::new())]]),
    };
    let outcomes = vec![JobOutcome::Pending];
    assert!(finalize(&outcomes, &probe).is_err());
  }
}
