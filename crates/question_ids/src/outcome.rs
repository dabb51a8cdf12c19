use std::{
  fmt,
  io::{self, Write},
  path::PathBuf,
};

use crate::Config;

/// Result of processing one question file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Success(PathBuf),
  Warning(Warning),
  Error { path: PathBuf, message: String },
}

/// Why a file was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
  MissingSubject(String),
  MissingChapter(String),
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Warning::MissingSubject(name) => write!(f, "Subject '{name}' not found in mappings"),
      Warning::MissingChapter(name) => write!(f, "Chapter '{name}' not found in mappings"),
    }
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Outcome::Success(path) => write!(f, "Updated {}", path.display()),
      Outcome::Warning(warning) => write!(f, "Warning: {warning}"),
      Outcome::Error { path, message } => {
        write!(f, "Error processing {}: {message}", path.display())
      }
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
  pub updated: usize,
  pub warnings: usize,
  pub errors: usize,
}

impl Summary {
  pub fn is_clean(&self) -> bool {
    self.warnings == 0 && self.errors == 0
  }

  /// Whether the run should exit with a failure status under `config`.
  pub fn failed(&self, config: &Config) -> bool {
    config.strict && !self.is_clean()
  }
}

/// Prints one line per outcome and keeps a tally.
pub struct Reporter<W> {
  out: W,
  summary: Summary,
}

impl<W: Write> Reporter<W> {
  pub fn new(out: W) -> Self {
    Reporter {
      out,
      summary: Summary::default(),
    }
  }

  pub fn report(&mut self, outcome: &Outcome) -> io::Result<()> {
    match outcome {
      Outcome::Success(_) => self.summary.updated += 1,
      Outcome::Warning(_) => self.summary.warnings += 1,
      Outcome::Error { .. } => self.summary.errors += 1,
    }
    writeln!(self.out, "{outcome}")
  }

  pub fn finish(mut self) -> io::Result<Summary> {
    self.out.flush()?;
    Ok(self.summary)
  }
}

#[test]
fn test_report_lines() {
  let mut reporter = Reporter::new(Vec::new());
  let outcomes = [
    Outcome::Success(PathBuf::from("Questions/Math/Algebra/q1.json")),
    Outcome::Warning(Warning::MissingSubject("Physics".into())),
    Outcome::Warning(Warning::MissingChapter("Geometry".into())),
    Outcome::Error {
      path: PathBuf::from("Questions/Math/Algebra/bad.json"),
      message: "EOF while parsing an object at line 1 column 1".into(),
    },
  ];
  for outcome in &outcomes {
    reporter.report(outcome).unwrap();
  }

  let Reporter { out, summary } = reporter;
  assert_eq!(
    String::from_utf8(out).unwrap(),
    "Updated Questions/Math/Algebra/q1.json\n\
     Warning: Subject 'Physics' not found in mappings\n\
     Warning: Chapter 'Geometry' not found in mappings\n\
     Error processing Questions/Math/Algebra/bad.json: EOF while parsing an object at line 1 column 1\n"
  );
  assert_eq!(summary, Summary {
    updated: 1,
    warnings: 2,
    errors: 1
  });
  assert!(!summary.is_clean());
}

#[test]
fn test_summary_failed_only_when_strict() {
  let clean = Summary {
    updated: 4,
    ..Summary::default()
  };
  let dirty = Summary {
    updated: 4,
    warnings: 1,
    errors: 0,
  };
  let lenient = Config::default();
  let strict = Config {
    strict: true,
    ..Config::default()
  };

  assert!(!clean.failed(&lenient));
  assert!(!clean.failed(&strict));
  assert!(!dirty.failed(&lenient));
  assert!(dirty.failed(&strict));
}
