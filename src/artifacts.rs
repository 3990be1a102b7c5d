use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::ArtifactPaths;
use crate::error::ArtifactLoadError;
use crate::inference::ArtifactLoader;
use crate::model::LinearSvm;
use crate::preprocessing::TfidfVectorizer;

/// Reads one bincode artifact, keeping missing files apart from unreadable ones
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactLoadError> {
  let bytes: Vec<u8> = std::fs::read(path).map_err(|e| match e.kind() {
    ErrorKind::NotFound => ArtifactLoadError::Missing { path: path.to_path_buf() },
    _ => ArtifactLoadError::Io { path: path.to_path_buf(), message: e.to_string() },
  })?;
  bincode::deserialize::<T>(&bytes)
    .map_err(|e| ArtifactLoadError::Corrupt { path: path.to_path_buf(), message: e.to_string() })
}

/// Save Artifact
/// Writes a fitted artifact in the format `read_artifact` expects
pub fn save_artifact<T: Serialize>(path: &Path, artifact: &T) -> std::io::Result<()> {
  let bytes: Vec<u8> = bincode::serialize(artifact)
    .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, bytes)
}

/// Loads the vectorizer and classifier files from the configured model directory
#[derive(Debug, Clone)]
pub struct FsArtifactLoader {
  pub vectorizer_path: PathBuf,
  pub classifier_path: PathBuf,
}

impl FsArtifactLoader {
  pub fn new(vectorizer_path: impl Into<PathBuf>, classifier_path: impl Into<PathBuf>) -> Self {
    Self { vectorizer_path: vectorizer_path.into(), classifier_path: classifier_path.into() }
  }

  pub fn from_paths(paths: &ArtifactPaths) -> Self {
    Self::new(paths.vectorizer_path(), paths.classifier_path())
  }
}

impl ArtifactLoader for FsArtifactLoader {
  type Vectorizer = TfidfVectorizer;
  type Classifier = LinearSvm;

  fn load(&self) -> Result<(TfidfVectorizer, LinearSvm), ArtifactLoadError> {
    let vectorizer: TfidfVectorizer = read_artifact(&self.vectorizer_path)?;
    vectorizer
      .validate()
      .map_err(|message| ArtifactLoadError::Invalid { path: self.vectorizer_path.clone(), message })?;

    let classifier: LinearSvm = read_artifact(&self.classifier_path)?;
    classifier
      .validate()
      .map_err(|message| ArtifactLoadError::Invalid { path: self.classifier_path.clone(), message })?;

    info!(
      vectorizer = %self.vectorizer_path.display(),
      classifier = %self.classifier_path.display(),
      features = vectorizer.dimension(),
      classes = ?classifier.classes,
      "loaded model artifacts"
    );
    Ok((vectorizer, classifier))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_loads_saved_artifacts() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let loader: FsArtifactLoader = fixtures::write_to(dir.path());

    let (vectorizer, classifier) = loader.load().unwrap();
    assert_eq!(vectorizer, fixtures::vectorizer());
    assert_eq!(classifier, fixtures::classifier());
  }

  #[test]
  fn it_reports_missing_artifacts() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let loader: FsArtifactLoader = FsArtifactLoader::new(dir.path().join("vectorizer.bin"), dir.path().join("svm_model.bin"));

    let err: ArtifactLoadError = loader.load().unwrap_err();
    assert_eq!(err, ArtifactLoadError::Missing { path: dir.path().join("vectorizer.bin") });
  }

  #[test]
  fn it_reports_corrupt_artifacts() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let loader: FsArtifactLoader = fixtures::write_to(dir.path());
    std::fs::write(&loader.classifier_path, b"not bincode").unwrap();

    match loader.load() {
      Err(ArtifactLoadError::Corrupt { path, .. }) => assert_eq!(path, loader.classifier_path),
      other => panic!("expected corrupt artifact, got {:?}", other),
    }
  }

  #[test]
  fn it_rejects_artifacts_that_fail_validation() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let loader: FsArtifactLoader = fixtures::write_to(dir.path());
    let mut broken: LinearSvm = fixtures::classifier();
    broken.classes.push("netral".to_string());
    save_artifact(&loader.classifier_path, &broken).unwrap();

    assert!(matches!(loader.load(), Err(ArtifactLoadError::Invalid { .. })));
  }
}
