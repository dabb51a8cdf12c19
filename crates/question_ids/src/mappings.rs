use std::{fs, path::Path};

use anyhow::{Context, Result};
use fxhash::FxHashMap as HashMap;
use serde::Deserialize;

pub type SubjectId = i64;
pub type ChapterId = i64;

/// Subject and chapter names mapped to their canonical numeric ids.
///
/// Loaded once per run and only read afterwards. Any other top-level keys in the
/// mapping file are ignored.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct IdMappings {
  pub subjects: HashMap<String, SubjectId>,
  pub chapters: HashMap<String, ChapterId>,
}

impl IdMappings {
  pub fn load(path: &Path) -> Result<Self> {
    let s = fs::read_to_string(path)
      .with_context(|| format!("Failed to read id mappings from {}", path.display()))?;
    Self::parse(&s).with_context(|| format!("Failed to parse id mappings in {}", path.display()))
  }

  pub fn parse(s: &str) -> Result<Self> {
    Ok(serde_json::from_str(s)?)
  }

  pub fn subject(&self, name: &str) -> Option<SubjectId> {
    self.subjects.get(name).copied()
  }

  pub fn chapter(&self, name: &str) -> Option<ChapterId> {
    self.chapters.get(name).copied()
  }
}

#[test]
fn test_parse_mappings() {
  let mappings = IdMappings::parse(
    r#"{"subjects": {"Math": 3, "Física": 7}, "chapters": {"Algebra": 12}, "version": 2}"#,
  )
  .unwrap();
  assert_eq!(mappings.subject("Math"), Some(3));
  assert_eq!(mappings.subject("Física"), Some(7));
  assert_eq!(mappings.subject("math"), None);
  assert_eq!(mappings.chapter("Algebra"), Some(12));
  assert_eq!(mappings.chapter("Geometry"), None);
}

#[test]
fn test_parse_mappings_rejects_bad_input() {
  assert!(IdMappings::parse(r#"{"subjects": {}}"#).is_err());
  assert!(IdMappings::parse(r#"{"subjects": {"Math": "3"}, "chapters": {}}"#).is_err());
  assert!(IdMappings::parse("not json").is_err());
}

#[test]
fn test_load_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let err = IdMappings::load(&dir.path().join("idMappings.json")).unwrap_err();
  assert!(err.to_string().contains("idMappings.json"), "{err}");
}
