//! Thin command-line front-end over the `vadr` library: model-info
//! inspection and job-runner smoke utilities. The full annotation pipeline
//! (classification, alignment dispatch, reporting) is an external
//! collaborator this crate doesn't reimplement.

mod cli;

use clap::Parser;
use cli::{VadrArgs, VadrCommand};
use eyre::{Result, WrapErr};
use vadr::jobrunner::{build_submission, determine_shard_count, SubmissionMode, SubmitTemplate};
use vadr::minfo::parse_model_info;
use vadr::utils::global_init::setup_logger;

fn main() -> Result<()> {
  let args = VadrArgs::parse();
  setup_logger(args.log_level());

  match args.command {
    VadrCommand::Completions { shell } => {
      cli::print_completions(shell);
      Ok(())
    }
    VadrCommand::MinfoDump { input } => run_minfo_dump(&input),
    VadrCommand::Shard { input_fasta, kb, maxjobs } => run_shard(&input_fasta, kb, maxjobs),
    VadrCommand::SubmitPreview {
      template,
      command,
      jobname,
      errfile,
      memgb,
      nsecs,
    } => run_submit_preview(&template, &command, &jobname, &errfile, memgb, nsecs),
  }
}

fn run_minfo_dump(input: &std::path::Path) -> Result<()> {
  let text = std::fs::read_to_string(input).wrap_err_with(|| format!("Reading model-info file '{}'", input.display()))?;
  let entries = parse_model_info(&text, &[], &[])?;
  for entry in &entries {
    println!("{}: {} feature(s)", entry.name, entry.features.len());
  }
  Ok(())
}

fn run_shard(input_fasta: &std::path::Path, kb: usize, maxjobs: usize) -> Result<()> {
  let metadata = std::fs::metadata(input_fasta).wrap_err_with(|| format!("Reading '{}'", input_fasta.display()))?;
  let total_len = metadata.len() as usize;
  let shard_count = determine_shard_count(total_len, kb, maxjobs);
  println!("{shard_count}");
  Ok(())
}

fn run_submit_preview(template_path: &std::path::Path, command: &str, jobname: &str, errfile: &str, memgb: f64, nsecs: u64) -> Result<()> {
  let text = std::fs::read_to_string(template_path).wrap_err_with(|| format!("Reading submit template '{}'", template_path.display()))?;
  let template = SubmitTemplate::parse(&text)?;
  let rendered = build_submission(&template, &SubmissionMode::Direct(command.to_owned()), jobname, errfile, memgb, nsecs);
  println!("{rendered}");
  Ok(())
}
