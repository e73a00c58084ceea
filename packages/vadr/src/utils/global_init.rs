use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

/// Configures the process-wide logger exactly once. Safe to call from multiple
/// entry points (library tests, CLI, job-runner worker threads).
pub fn setup_logger(filter_level: LevelFilter) {
  LOGGER_INIT.call_once(|| {
    env_logger::Builder::new()
      .filter_level(filter_level)
      .format(|buf, record| writeln!(buf, "{:>5} | {}", record.level(), record.args()))
      .init();
  });
}
