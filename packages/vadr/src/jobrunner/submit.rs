//! Job submission (spec.md §4.6 "Submission", §6.6 "Submit templates").

use crate::make_error;
use eyre::Report;

/// A parsed two-line submit template: a prefix and suffix wrapped around the
/// job body at submit time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitTemplate {
  pub prefix: String,
  pub suffix: String,
}

impl SubmitTemplate {
  /// Parses a submit-template file: everything after `#` on a line is a
  /// comment; exactly two non-comment, non-blank lines must remain.
  pub fn parse(text: &str) -> Result<Self, Report> {
    let lines: Vec<&str> = text
      .lines()
      .map(|line| line.split('#').next().unwrap_or("").trim())
      .filter(|line| !line.is_empty())
      .collect();
    match lines.as_slice() {
      [prefix, suffix] => Ok(SubmitTemplate {
        prefix: (*prefix).to_owned(),
        suffix: (*suffix).to_owned(),
      }),
      other => make_error!("Submit template must have exactly 2 non-comment lines, found {}", other.len()),
    }
  }

  /// Substitutes `![jobname]!`/`![errfile]!`/`![memgb]!`/`![nsecs]!` into
  /// both halves and wraps `body` between them.
  #[must_use]
  pub fn render(&self, jobname: &str, errfile: &str, memgb: f64, nsecs: u64, body: &str) -> String {
    let prefix = substitute(&self.prefix, jobname, errfile, memgb, nsecs);
    let suffix = substitute(&self.suffix, jobname, errfile, memgb, nsecs);
    format!("{prefix} {body} {suffix}").trim().to_owned()
  }
}

fn substitute(template: &str, jobname: &str, errfile: &str, memgb: f64, nsecs: u64) -> String {
  template
    .replace("![jobname]!", jobname)
    .replace("![errfile]!", errfile)
    .replace("![memgb]!", &memgb.to_string())
    .replace("![nsecs]!", &nsecs.to_string())
}

/// How the job body itself is dispatched: either as a direct command, or as
/// a shell wrapper file written to disk and invoked by path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionMode {
  Direct(String),
  ShellWrapper(String),
}

impl SubmissionMode {
  fn body(&self) -> String {
    match self {
      SubmissionMode::Direct(cmd) => cmd.clone(),
      SubmissionMode::ShellWrapper(path) => format!("bash {path}"),
    }
  }
}

/// Builds the full command line to execute for one shard's submission.
#[must_use]
pub fn build_submission(template: &SubmitTemplate, mode: &SubmissionMode, jobname: &str, errfile: &str, memgb: f64, nsecs: u64) -> String {
  template.render(jobname, errfile, memgb, nsecs, &mode.body())
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn parses_two_line_template_ignoring_comments() -> Result<(), Report> {
    let text = "# cluster submit wrapper\nqsub -N ![jobname]! -e ![errfile]!\n-l mem=![memgb]!G,time=![nsecs]!s # trailing comment\n";
    let template = SubmitTemplate::parse(text)?;
    assert_eq!(template.prefix, "qsub -N ![jobname]! -e ![errfile]!");
    assert_eq!(template.suffix, "-l mem=![memgb]!G,time=![nsecs]!s");
    Ok(())
  }

  #[rstest]
  fn rejects_wrong_line_count() {
    assert!(SubmitTemplate::parse("only one line\n").is_err());
    assert!(SubmitTemplate::parse("one\ntwo\nthree\n").is_err());
  }

  #[rstest]
  fn substitutes_placeholders_in_direct_mode() -> Result<(), Report> {
    let template = SubmitTemplate::parse("qsub -N ![jobname]!\n-l mem=![memgb]!G,time=![nsecs]!s -e ![errfile]!\n")?;
    let cmd = build_submission(&template, &SubmissionMode::Direct("vadr-align shard.1.fa".to_owned()), "job.1", "job.1.err", 4.0, 3600);
    assert_eq!(cmd, "qsub -N job.1 vadr-align shard.1.fa -l mem=4G,time=3600s -e job.1.err");
    Ok(())
  }

  #[rstest]
  fn shell_wrapper_mode_invokes_by_path() -> Result<(), Report> {
    let template = SubmitTemplate::parse("qsub -N ![jobname]!\n# suffix\n-e ![errfile]!\n")?;
    let cmd = build_submission(&template, &SubmissionMode::ShellWrapper("job.1.sh".to_owned()), "job.1", "job.1.err", 2.0, 60);
    assert_eq!(cmd, "qsub -N job.1 bash job.1.sh -e job.1.err");
    Ok(())
  }
}
