use std::{io, path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use question_ids::{config, Config};

/// Replace the `subjects` and `chapters` of every question with the ids of the
/// subject and chapter folders it is stored in.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
  /// Subject and chapter id mappings
  #[arg(long, default_value = config::DEFAULT_MAPPINGS_PATH)]
  mappings: PathBuf,

  /// Question tree laid out as <subject>/<chapter>/*.json
  #[arg(long, default_value = config::DEFAULT_QUESTIONS_ROOT)]
  root: PathBuf,

  /// Exit with status 1 if any file was skipped or failed
  #[arg(long)]
  strict: bool,
}

fn main() -> Result<ExitCode> {
  env_logger::init();

  let args = Args::parse();
  let config = Config {
    mappings_path: args.mappings,
    questions_root: args.root,
    strict: args.strict,
  };

  let summary = question_ids::run(&config, io::stdout().lock())?;
  if summary.failed(&config) {
    return Ok(ExitCode::FAILURE);
  }
  Ok(ExitCode::SUCCESS)
}
