use std::io::Write;

use anyhow::Result;

use crate::{mappings::IdMappings, outcome::Reporter, tree::QuestionTree};

pub mod config;
pub mod mappings;
pub mod outcome;
pub mod record;
pub mod tree;

pub use config::Config;
pub use outcome::{Outcome, Summary};

#[macro_export]
macro_rules! time {
  ($name:literal, $e:expr) => {{
    let start = std::time::Instant::now();
    let t = $e;
    log::debug!("{}: {:.2}s", $name, start.elapsed().as_secs_f32());
    t
  }};
}

/// Rewrites every question under `config.questions_root`, printing one line per file to `out`.
///
/// Only a bad mapping file or an unlistable directory stops the run; per-file problems are
/// reported and counted in the returned [`Summary`].
pub fn run(config: &Config, out: impl Write) -> Result<Summary> {
  let mappings = time!("load_mappings", IdMappings::load(&config.mappings_path)?);
  log::debug!(
    "Loaded {} subjects and {} chapters",
    mappings.subjects.len(),
    mappings.chapters.len()
  );

  let mut reporter = Reporter::new(out);
  time!("rewrite", {
    for file in QuestionTree::new(&config.questions_root)? {
      let outcome = record::rewrite(&file?, &mappings);
      reporter.report(&outcome)?;
    }
  });

  let summary = reporter.finish()?;
  log::info!(
    "{} updated, {} warnings, {} errors",
    summary.updated,
    summary.warnings,
    summary.errors
  );
  Ok(summary)
}

#[cfg(test)]
mod fixtures {
  use std::{fs, path::Path};

  use crate::Config;

  pub const MAPPINGS: &str = r#"{"subjects": {"Math": 3}, "chapters": {"Algebra": 12}}"#;

  pub fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  pub fn config(root: &Path) -> Config {
    write(&root.join("data/idMappings.json"), MAPPINGS);
    Config {
      mappings_path: root.join("data/idMappings.json"),
      questions_root: root.join("Questions"),
      strict: false,
    }
  }
}

#[test]
fn test_run_end_to_end() {
  use std::fs;

  let dir = tempfile::tempdir().unwrap();
  let config = fixtures::config(dir.path());
  let q1 = config.questions_root.join("Math/Algebra/q1.json");
  let q2 = config.questions_root.join("Math/Geometry/q2.json");
  let q2_contents = r#"{"subjects": [1], "chapters": [7], "text": "Area of a unit square?"}"#;
  fixtures::write(
    &q1,
    r#"{"subjects": [1], "chapters": [5], "text": "What is 2+2?", "answer": "4"}"#,
  );
  fixtures::write(&q2, q2_contents);
  fs::create_dir_all(config.questions_root.join("Math/Empty")).unwrap();

  let mut out = Vec::new();
  let summary = run(&config, &mut out).unwrap();

  assert_eq!(
    fs::read_to_string(&q1).unwrap(),
    r#"{
  "subjects": [
    3
  ],
  "chapters": [
    12
  ],
  "text": "What is 2+2?",
  "answer": "4"
}"#
  );
  assert_eq!(fs::read_to_string(&q2).unwrap(), q2_contents);

  let out = String::from_utf8(out).unwrap();
  assert_eq!(
    out.lines().collect::<Vec<_>>(),
    vec![
      format!("Updated {}", q1.display()),
      "Warning: Chapter 'Geometry' not found in mappings".to_string(),
    ]
  );
  assert_eq!(summary, Summary {
    updated: 1,
    warnings: 1,
    errors: 0
  });
}

#[test]
fn test_run_reports_errors_and_continues() {
  let dir = tempfile::tempdir().unwrap();
  let config = fixtures::config(dir.path());
  fixtures::write(&config.questions_root.join("Math/Algebra/a.json"), "{oops");
  std::fs::create_dir_all(config.questions_root.join("Math/Algebra/archive.json")).unwrap();
  fixtures::write(
    &config.questions_root.join("Math/Algebra/b.json"),
    r#"{"text": "?"}"#,
  );

  let mut out = Vec::new();
  let summary = run(&config, &mut out).unwrap();
  let out = String::from_utf8(out).unwrap();
  let lines = out.lines().collect::<Vec<_>>();

  assert_eq!(lines.len(), 3);
  assert!(lines[0].starts_with("Error processing "), "{out}");
  assert!(lines[0].contains("a.json: "), "{out}");
  assert!(lines[1].starts_with("Error processing "), "{out}");
  assert!(lines[1].contains("archive.json: "), "{out}");
  assert!(lines[2].starts_with("Updated "), "{out}");
  assert_eq!(summary.errors, 2);
  assert_eq!(summary.updated, 1);
  assert!(!summary.is_clean());
}

#[test]
fn test_run_empty_tree() {
  let dir = tempfile::tempdir().unwrap();
  let config = fixtures::config(dir.path());
  std::fs::create_dir_all(config.questions_root.join("Math/Algebra")).unwrap();

  let mut out = Vec::new();
  let summary = run(&config, &mut out).unwrap();
  assert!(out.is_empty());
  assert!(summary.is_clean());
}

#[test]
fn test_run_fails_without_mappings() {
  let dir = tempfile::tempdir().unwrap();
  let config = Config {
    mappings_path: dir.path().join("data/idMappings.json"),
    questions_root: dir.path().join("Questions"),
    strict: false,
  };
  fixtures::write(
    &config.questions_root.join("Math/Algebra/q1.json"),
    r#"{"text": "?"}"#,
  );

  assert!(run(&config, Vec::new()).is_err());
  assert_eq!(
    std::fs::read_to_string(config.questions_root.join("Math/Algebra/q1.json")).unwrap(),
    r#"{"text": "?"}"#
  );
}
