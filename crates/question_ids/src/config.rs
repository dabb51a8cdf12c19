use std::path::PathBuf;

pub const DEFAULT_MAPPINGS_PATH: &str = "data/idMappings.json";
pub const DEFAULT_QUESTIONS_ROOT: &str = "Questions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// JSON file with `subjects` and `chapters` name-to-id tables.
  pub mappings_path: PathBuf,
  /// Root of the `<subject>/<chapter>/*.json` tree, rewritten in place.
  pub questions_root: PathBuf,
  /// Treat any warning or error as a failed run.
  pub strict: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      mappings_path: PathBuf::from(DEFAULT_MAPPINGS_PATH),
      questions_root: PathBuf::from(DEFAULT_QUESTIONS_ROOT),
      strict: false,
    }
  }
}
