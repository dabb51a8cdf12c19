use std::{
  fs, io,
  path::{Path, PathBuf},
  vec,
};

use anyhow::{Context, Result};
use itertools::Itertools;

/// A question file together with the subject and chapter directories it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFile {
  pub path: PathBuf,
  pub subject: String,
  pub chapter: String,
}

/// Lazily walks `<root>/<subject>/<chapter>/*.json`.
///
/// Each directory is listed when the walk reaches it, so files created in a directory
/// that was already visited are not seen. Non-directories at the subject and chapter
/// levels are skipped. Listings are sorted by name.
pub struct QuestionTree {
  subjects: vec::IntoIter<PathBuf>,
  chapters: Option<(String, vec::IntoIter<PathBuf>)>,
  files: Option<(String, String, vec::IntoIter<PathBuf>)>,
}

impl QuestionTree {
  pub fn new(root: &Path) -> Result<Self> {
    Ok(QuestionTree {
      subjects: sorted_entries(root)?,
      chapters: None,
      files: None,
    })
  }
}

impl Iterator for QuestionTree {
  type Item = Result<QuestionFile>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if let Some((subject, chapter, files)) = &mut self.files {
        if let Some(path) = files.find(|path| is_question_file(path)) {
          return Some(Ok(QuestionFile {
            path,
            subject: subject.clone(),
            chapter: chapter.clone(),
          }));
        }
        self.files = None;
      }

      if let Some((subject, chapters)) = &mut self.chapters {
        if let Some(dir) = chapters.find(|path| is_dir_or_skip(path)) {
          match sorted_entries(&dir) {
            Ok(files) => self.files = Some((subject.clone(), dir_name(&dir), files)),
            Err(e) => return Some(Err(e)),
          }
          continue;
        }
        self.chapters = None;
      }

      let dir = self.subjects.find(|path| is_dir_or_skip(path))?;
      match sorted_entries(&dir) {
        Ok(chapters) => self.chapters = Some((dir_name(&dir), chapters)),
        Err(e) => return Some(Err(e)),
      }
    }
  }
}

fn sorted_entries(dir: &Path) -> Result<vec::IntoIter<PathBuf>> {
  let paths = fs::read_dir(dir)
    .and_then(|entries| {
      entries
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()
    })
    .with_context(|| format!("Failed to list directory {}", dir.display()))?;
  Ok(paths.into_iter().sorted())
}

fn is_dir_or_skip(path: &Path) -> bool {
  let is_dir = path.is_dir();
  if !is_dir {
    log::debug!("Skipping non-directory {}", path.display());
  }
  is_dir
}

// Same filter as a `*.json` glob, so a directory with that suffix is yielded too and
// fails when read.
fn is_question_file(path: &Path) -> bool {
  path
    .file_name()
    .map_or(false, |name| name.to_string_lossy().ends_with(".json"))
}

fn dir_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}

#[cfg(test)]
fn touch(path: &Path) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, "{}").unwrap();
}

#[test]
fn test_walk_two_levels() {
  let dir = tempfile::tempdir().unwrap();
  let root = dir.path();
  touch(&root.join("Math/Algebra/q2.json"));
  touch(&root.join("Math/Algebra/q1.json"));
  touch(&root.join("Math/Algebra/notes.txt"));
  touch(&root.join("Math/Geometry/q3.json"));
  touch(&root.join("Math/README.md"));
  touch(&root.join("Química/Ácidos/q4.json"));
  touch(&root.join("index.json"));
  fs::create_dir_all(root.join("Math/Empty")).unwrap();
  fs::create_dir_all(root.join("Math/Algebra/nested.json")).unwrap();
  touch(&root.join("Math/Algebra/deeper/q5.json"));

  let files = QuestionTree::new(root)
    .unwrap()
    .collect::<Result<Vec<_>>>()
    .unwrap();

  let triple = |path: &str, subject: &str, chapter: &str| QuestionFile {
    path: root.join(path),
    subject: subject.to_string(),
    chapter: chapter.to_string(),
  };
  assert_eq!(files, vec![
    triple("Math/Algebra/nested.json", "Math", "Algebra"),
    triple("Math/Algebra/q1.json", "Math", "Algebra"),
    triple("Math/Algebra/q2.json", "Math", "Algebra"),
    triple("Math/Geometry/q3.json", "Math", "Geometry"),
    triple("Química/Ácidos/q4.json", "Química", "Ácidos"),
  ]);
}

#[test]
fn test_walk_empty_tree() {
  let dir = tempfile::tempdir().unwrap();
  fs::create_dir_all(dir.path().join("Math/Algebra")).unwrap();
  assert_eq!(QuestionTree::new(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_walk_missing_root() {
  let dir = tempfile::tempdir().unwrap();
  assert!(QuestionTree::new(&dir.path().join("Questions")).is_err());
}
