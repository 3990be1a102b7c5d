use std::path::PathBuf;

use thiserror::Error;

/// Artifact Load Error
/// Either fitted artifact could not be read, decoded or paired with the other one.
/// Clone so the failed outcome can be memoized alongside a successful one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactLoadError {
  #[error("artifact not found: {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed reading artifact {}: {message}", path.display())]
  Io { path: PathBuf, message: String },

  #[error("failed decoding artifact {}: {message}", path.display())]
  Corrupt { path: PathBuf, message: String },

  #[error("invalid artifact {}: {message}", path.display())]
  Invalid { path: PathBuf, message: String },

  #[error("vectorizer emits {vectorizer} features but classifier expects {classifier}")]
  Incompatible { vectorizer: usize, classifier: usize },
}

#[derive(Error, Debug)]
pub enum DatasetLoadError {
  #[error("dataset not found: {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed reading dataset {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed parsing dataset {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("row {row}: malformed token list in `stemming` column: {message}")]
  MalformedTokens { row: usize, message: String },
}

#[derive(Error, Debug)]
pub enum AssetMissingError {
  #[error("image not found: {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed reading image {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("not a PNG image: {}", path.display())]
  NotPng { path: PathBuf },
}

/// Classification Error
/// Wraps any failure of the vectorizer or the classifier; the underlying message is kept verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
  #[error("model artifacts are not initialized")]
  NotInitialized,

  #[error("model artifacts unavailable: {0}")]
  Unavailable(String),

  #[error("vectorizer failed: {0}")]
  Vectorizer(String),

  #[error("classifier failed: {0}")]
  Classifier(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
  #[error("review text is empty")]
  EmptyInput,

  #[error(transparent)]
  Classification(#[from] ClassificationError),
}

#[derive(Error, Debug)]
pub enum ExportError {
  #[error("no dataset to export: {0}")]
  Unavailable(String),

  #[error("failed writing export {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("failed reading config file {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed parsing TOML config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid config value for `{key}`: {message}")]
  Invalid { key: &'static str, message: String },
}
