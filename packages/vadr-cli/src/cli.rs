//! Argument parsing, adapted from the teacher's `NextalignArgs` pattern: a
//! top-level flag set plus subcommands, with hand-rolled `-v`/`-q` verbosity
//! counting (no `clap_verbosity_flag` dependency in this workspace).

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vadr", author, version)]
#[command(about = "Viral sequence annotation and validation: library-backed inspection and job-runner utilities.")]
pub struct VadrArgs {
  #[command(subcommand)]
  pub command: VadrCommand,

  /// Increase verbosity (-v info, -vv debug, -vvv trace).
  #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
  pub verbose: u8,

  /// Decrease verbosity (-q error, -qq off).
  #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count, global = true, conflicts_with = "verbose")]
  pub quiet: u8,

  /// Set verbosity level explicitly, overriding -v/-q.
  #[arg(long, global = true, conflicts_with_all = ["verbose", "quiet", "silent"])]
  pub verbosity: Option<LevelFilter>,

  /// Disable all console output. Same as `--verbosity=off`.
  #[arg(long, global = true, conflicts_with_all = ["verbose", "quiet", "verbosity"])]
  pub silent: bool,
}

impl VadrArgs {
  /// Base level is `Warn`; each `-v` raises one step, each `-q` lowers one.
  #[must_use]
  pub fn log_level(&self) -> LevelFilter {
    if self.silent {
      return LevelFilter::Off;
    }
    if let Some(level) = self.verbosity {
      return level;
    }
    shift_level(LevelFilter::Warn, i64::from(self.verbose) - i64::from(self.quiet))
  }
}

fn shift_level(base: LevelFilter, steps: i64) -> LevelFilter {
  const LEVELS: [LevelFilter; 6] = [LevelFilter::Off, LevelFilter::Error, LevelFilter::Warn, LevelFilter::Info, LevelFilter::Debug, LevelFilter::Trace];
  let base_idx = LEVELS.iter().position(|l| *l == base).expect("base is in LEVELS") as i64;
  let idx = (base_idx + steps).clamp(0, LEVELS.len() as i64 - 1);
  LEVELS[idx as usize]
}

#[derive(Subcommand, Debug)]
pub enum VadrCommand {
  /// Generate shell completions.
  Completions {
    #[arg(value_enum)]
    shell: Shell,
  },

  /// Parse a `.minfo` file and print a one-line summary per model.
  MinfoDump {
    /// Path to a model-info file.
    #[arg(long, short = 'i')]
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
  },

  /// Compute the shard count an input FASTA file would be split into.
  Shard {
    /// Path to the input FASTA file.
    #[arg(long, short = 'i')]
    #[arg(value_hint = ValueHint::FilePath)]
    input_fasta: PathBuf,

    /// Target shard size, in kb of input sequence.
    #[arg(long, default_value_t = 50)]
    kb: usize,

    /// Maximum number of shards.
    #[arg(long, default_value_t = num_cpus::get())]
    maxjobs: usize,
  },

  /// Render one shard's submission command from a submit template.
  SubmitPreview {
    /// Path to a two-line submit-template file.
    #[arg(long)]
    #[arg(value_hint = ValueHint::FilePath)]
    template: PathBuf,

    /// The command to submit.
    #[arg(long)]
    command: String,

    /// Job name substituted for `![jobname]!`.
    #[arg(long)]
    jobname: String,

    /// Error-file path substituted for `![errfile]!`.
    #[arg(long)]
    errfile: String,

    /// Memory request in GB, substituted for `![memgb]!`.
    #[arg(long, default_value_t = 4.0)]
    memgb: f64,

    /// Wall-clock seconds, substituted for `![nsecs]!`.
    #[arg(long, default_value_t = 3600)]
    nsecs: u64,
  },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Shell {
  Bash,
  Elvish,
  Fish,
  Powershell,
  Zsh,
}

impl From<Shell> for clap_complete::Shell {
  fn from(shell: Shell) -> Self {
    match shell {
      Shell::Bash => clap_complete::Shell::Bash,
      Shell::Elvish => clap_complete::Shell::Elvish,
      Shell::Fish => clap_complete::Shell::Fish,
      Shell::Powershell => clap_complete::Shell::PowerShell,
      Shell::Zsh => clap_complete::Shell::Zsh,
    }
  }
}

pub fn print_completions(shell: Shell) {
  let mut cmd = VadrArgs::command();
  let name = cmd.get_name().to_owned();
  clap_complete::generate(clap_complete::Shell::from(shell), &mut cmd, name, &mut std::io::stdout());
}
