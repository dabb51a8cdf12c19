use std::fs;

use anyhow::{bail, Result};
use serde_json::{json, Map, Value};

use crate::{
  mappings::{ChapterId, IdMappings, SubjectId},
  outcome::{Outcome, Warning},
  tree::QuestionFile,
};

const SUBJECTS: &str = "subjects";
const CHAPTERS: &str = "chapters";

/// A question as stored on disk: a JSON object whose field order is kept as read.
///
/// Only `subjects` and `chapters` are interpreted, everything else is carried through
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
  fields: Map<String, Value>,
}

impl QuestionRecord {
  pub fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Object(fields) => Ok(QuestionRecord { fields }),
      other => bail!("expected a JSON object, found {}", kind(&other)),
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_value(serde_json::from_str(s)?)
  }

  pub fn subjects(&self) -> Option<&Value> {
    self.fields.get(SUBJECTS)
  }

  pub fn chapters(&self) -> Option<&Value> {
    self.fields.get(CHAPTERS)
  }

  /// Fields other than `subjects` and `chapters`, in their original order.
  pub fn payload(&self) -> impl Iterator<Item = (&String, &Value)> {
    self
      .fields
      .iter()
      .filter(|(key, _)| !is_id_field(key))
  }

  /// Replaces both id lists with the single given id and moves them to the front.
  pub fn with_ids(self, subject: SubjectId, chapter: ChapterId) -> Self {
    let mut fields = Map::new();
    fields.insert(SUBJECTS.to_string(), json!([subject]));
    fields.insert(CHAPTERS.to_string(), json!([chapter]));
    fields.extend(
      self
        .fields
        .into_iter()
        .filter(|(key, _)| !is_id_field(key)),
    );
    QuestionRecord { fields }
  }

  pub fn to_pretty_string(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(&self.fields)?)
  }
}

fn is_id_field(key: &str) -> bool {
  key == SUBJECTS || key == CHAPTERS
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// Rewrites one question file in place with the ids of its subject and chapter.
///
/// Never fails: read, parse and write errors become [`Outcome::Error`], and a name
/// missing from `mappings` becomes [`Outcome::Warning`] without touching the file.
/// The subject is resolved first, so a file missing both only warns about the subject.
pub fn rewrite(file: &QuestionFile, mappings: &IdMappings) -> Outcome {
  match try_rewrite(file, mappings) {
    Ok(outcome) => outcome,
    Err(e) => Outcome::Error {
      path: file.path.clone(),
      message: e.to_string(),
    },
  }
}

fn try_rewrite(file: &QuestionFile, mappings: &IdMappings) -> Result<Outcome> {
  let value: Value = serde_json::from_str(&fs::read_to_string(&file.path)?)?;

  let Some(subject_id) = mappings.subject(&file.subject) else {
    return Ok(Outcome::Warning(Warning::MissingSubject(file.subject.clone())));
  };
  let Some(chapter_id) = mappings.chapter(&file.chapter) else {
    return Ok(Outcome::Warning(Warning::MissingChapter(file.chapter.clone())));
  };

  let record = QuestionRecord::from_value(value)?.with_ids(subject_id, chapter_id);
  fs::write(&file.path, record.to_pretty_string()?)?;
  log::debug!("{}: subject {subject_id}, chapter {chapter_id}", file.path.display());

  Ok(Outcome::Success(file.path.clone()))
}

#[cfg(test)]
mod fixtures {
  use super::*;
  use std::path::Path;

  pub fn mappings() -> IdMappings {
    IdMappings::parse(
      r#"{"subjects": {"Math": 3, "Química": 9}, "chapters": {"Algebra": 12, "Ácidos": 40}}"#,
    )
    .unwrap()
  }

  pub fn question(root: &Path, subject: &str, chapter: &str, contents: &str) -> QuestionFile {
    let dir = root.join(subject).join(chapter);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("q1.json");
    fs::write(&path, contents).unwrap();
    QuestionFile {
      path,
      subject: subject.to_string(),
      chapter: chapter.to_string(),
    }
  }
}

#[test]
fn test_with_ids_orders_fields() {
  let record = QuestionRecord::parse(
    r#"{"text": "What is 2+2?", "subjects": [1, 2], "answer": "4", "chapters": [5], "meta": {"b": 1, "a": [true, null]}}"#,
  )
  .unwrap();
  let payload_before = record
    .payload()
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect::<Vec<_>>();

  let record = record.with_ids(3, 12);
  assert_eq!(record.subjects(), Some(&json!([3])));
  assert_eq!(record.chapters(), Some(&json!([12])));
  assert_eq!(
    record
      .payload()
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect::<Vec<_>>(),
    payload_before
  );
  assert_eq!(
    record.to_pretty_string().unwrap(),
    r#"{
  "subjects": [
    3
  ],
  "chapters": [
    12
  ],
  "text": "What is 2+2?",
  "answer": "4",
  "meta": {
    "b": 1,
    "a": [
      true,
      null
    ]
  }
}"#
  );
}

#[test]
fn test_with_ids_injects_missing_fields() {
  let record = QuestionRecord::parse(r#"{"text": "?"}"#).unwrap();
  assert_eq!(record.subjects(), None);
  let record = record.with_ids(1, 2);
  assert_eq!(
    record.fields.keys().collect::<Vec<_>>(),
    vec!["subjects", "chapters", "text"]
  );
}

#[test]
fn test_rewrite_updates_file() {
  let dir = tempfile::tempdir().unwrap();
  let file = fixtures::question(
    dir.path(),
    "Math",
    "Algebra",
    r#"{"subjects": [1], "chapters": [5], "text": "What is 2+2?", "answer": "4"}"#,
  );

  let outcome = rewrite(&file, &fixtures::mappings());
  assert_eq!(outcome, Outcome::Success(file.path.clone()));

  let record = QuestionRecord::parse(&fs::read_to_string(&file.path).unwrap()).unwrap();
  assert_eq!(
    record.fields,
    json!({"subjects": [3], "chapters": [12], "text": "What is 2+2?", "answer": "4"})
      .as_object()
      .unwrap()
      .clone()
  );
  assert_eq!(
    record.fields.keys().collect::<Vec<_>>(),
    vec!["subjects", "chapters", "text", "answer"]
  );
}

#[test]
fn test_rewrite_is_idempotent() {
  let dir = tempfile::tempdir().unwrap();
  let file = fixtures::question(
    dir.path(),
    "Math",
    "Algebra",
    r#"{"answer": "4", "chapters": [5, 6], "text": "What is 2+2?"}"#,
  );
  let mappings = fixtures::mappings();

  rewrite(&file, &mappings);
  let first = fs::read(&file.path).unwrap();
  rewrite(&file, &mappings);
  assert_eq!(fs::read(&file.path).unwrap(), first);
}

#[test]
fn test_rewrite_missing_subject_leaves_file() {
  let dir = tempfile::tempdir().unwrap();
  let contents = r#"{"subjects": [1], "chapters": [5], "text": "?"}"#;
  let file = fixtures::question(dir.path(), "Physics", "Optics", contents);

  let outcome = rewrite(&file, &fixtures::mappings());
  assert_eq!(
    outcome,
    Outcome::Warning(Warning::MissingSubject("Physics".into()))
  );
  assert!(outcome.to_string().contains("Physics"));
  assert_eq!(fs::read_to_string(&file.path).unwrap(), contents);
}

#[test]
fn test_rewrite_missing_chapter_leaves_file() {
  let dir = tempfile::tempdir().unwrap();
  let contents = r#"{"subjects": [1], "chapters": [5], "text": "?"}"#;
  let file = fixtures::question(dir.path(), "Math", "Geometry", contents);

  let outcome = rewrite(&file, &fixtures::mappings());
  assert_eq!(
    outcome,
    Outcome::Warning(Warning::MissingChapter("Geometry".into()))
  );
  assert!(outcome.to_string().contains("Geometry"));
  assert_eq!(fs::read_to_string(&file.path).unwrap(), contents);
}

#[test]
fn test_rewrite_keeps_non_ascii() {
  let dir = tempfile::tempdir().unwrap();
  let file = fixtures::question(
    dir.path(),
    "Química",
    "Ácidos",
    r#"{"text": "¿Cuál es el pH del ácido clorhídrico?", "tags": ["química", "ácido"]}"#,
  );

  assert_eq!(
    rewrite(&file, &fixtures::mappings()),
    Outcome::Success(file.path.clone())
  );
  let written = fs::read_to_string(&file.path).unwrap();
  assert!(written.contains("¿Cuál es el pH del ácido clorhídrico?"), "{written}");
  assert!(written.contains("\"química\""), "{written}");
  assert!(!written.contains("\\u"), "{written}");
  assert!(written.contains("\"subjects\": [\n    9\n  ]"), "{written}");
}

#[test]
fn test_rewrite_malformed_json() {
  let dir = tempfile::tempdir().unwrap();
  let contents = r#"{"subjects": [1], "#;
  let file = fixtures::question(dir.path(), "Math", "Algebra", contents);

  let Outcome::Error { path, .. } = rewrite(&file, &fixtures::mappings()) else {
    panic!("expected an error outcome");
  };
  assert_eq!(path, file.path);
  assert_eq!(fs::read_to_string(&file.path).unwrap(), contents);
}

#[test]
fn test_rewrite_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let file = QuestionFile {
    path: dir.path().join("Math/Algebra/gone.json"),
    subject: "Math".into(),
    chapter: "Algebra".into(),
  };
  assert!(matches!(
    rewrite(&file, &fixtures::mappings()),
    Outcome::Error { .. }
  ));
}

#[test]
fn test_rewrite_non_object() {
  let dir = tempfile::tempdir().unwrap();
  let mappings = fixtures::mappings();

  let file = fixtures::question(dir.path(), "Math", "Algebra", "[1, 2]");
  let Outcome::Error { message, .. } = rewrite(&file, &mappings) else {
    panic!("expected an error outcome");
  };
  assert_eq!(message, "expected a JSON object, found an array");
  assert_eq!(fs::read_to_string(&file.path).unwrap(), "[1, 2]");

  // Lookups happen before the shape check.
  let file = fixtures::question(dir.path(), "Math", "Geometry", "[1, 2]");
  assert_eq!(
    rewrite(&file, &mappings),
    Outcome::Warning(Warning::MissingChapter("Geometry".into()))
  );
}

#[test]
fn test_rewrite_keeps_number_literals() {
  let dir = tempfile::tempdir().unwrap();
  let file = fixtures::question(
    dir.path(),
    "Math",
    "Algebra",
    r#"{"big": 12345678901234567890123, "wide": 100000000000000000000, "ratio": 0.1, "exp": 1.5e300}"#,
  );

  assert_eq!(
    rewrite(&file, &fixtures::mappings()),
    Outcome::Success(file.path.clone())
  );
  let written = fs::read_to_string(&file.path).unwrap();
  assert!(written.contains("\"big\": 12345678901234567890123,"), "{written}");
  assert!(written.contains("\"wide\": 100000000000000000000,"), "{written}");
  assert!(written.contains("\"ratio\": 0.1,"), "{written}");
  assert!(written.contains("\"exp\": 1.5e300\n"), "{written}");
}
