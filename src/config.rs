use serde::Deserialize;
use tracing::Level;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "JKN_SENTIMENT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "jkn_sentiment.toml";

/// Where the two fitted artifacts live
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
  pub model_dir: PathBuf,
  pub vectorizer_file: String,
  pub classifier_file: String,
}

impl ArtifactPaths {
  pub fn vectorizer_path(&self) -> PathBuf {
    self.model_dir.join(&self.vectorizer_file)
  }

  pub fn classifier_path(&self) -> PathBuf {
    self.model_dir.join(&self.classifier_file)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub artifacts: ArtifactPaths,
  pub dataset_path: PathBuf,
  pub images_dir: PathBuf,
  pub export_file_name: String,
  pub preview_rows: usize,
  pub log_level: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      artifacts: ArtifactPaths {
        model_dir: PathBuf::from("model"),
        vectorizer_file: "vectorizer.bin".to_string(),
        classifier_file: "svm_model.bin".to_string(),
      },
      dataset_path: PathBuf::from("data/hasil_preprocessing_mobile_jkn.csv"),
      images_dir: PathBuf::from("images"),
      export_file_name: "mobile_jkn_dataset.csv".to_string(),
      preview_rows: 10,
      log_level: "info".to_string(),
    }
  }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
  artifacts: Option<FileArtifactsConfig>,
  dataset: Option<FileDatasetConfig>,
  assets: Option<FileAssetsConfig>,
  ui: Option<FileUiConfig>,
  logging: Option<FileLoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct FileArtifactsConfig {
  model_dir: Option<PathBuf>,
  vectorizer: Option<String>,
  classifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileDatasetConfig {
  path: Option<PathBuf>,
  export_file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileAssetsConfig {
  images_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct FileUiConfig {
  preview_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FileLoggingConfig {
  level: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
  /// Load
  /// Defaults, then the TOML file (explicit path, `JKN_SENTIMENT_CONFIG`, or `./jkn_sentiment.toml` if present),
  /// then `JKN_SENTIMENT_*` environment overrides
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let mut cfg: AppConfig = Self::default();
    if let Some(path) = resolve_config_path(explicit) {
      cfg.apply_file(&path)?;
    }
    cfg.apply_env_overrides(|key| std::env::var(key).ok());
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
    let raw: String = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    self.apply_toml(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
  }

  fn apply_toml(&mut self, raw: &str) -> Result<(), toml::de::Error> {
    let file_cfg: FileConfig = toml::from_str(raw)?;

    if let Some(artifacts) = file_cfg.artifacts {
      if let Some(v) = artifacts.model_dir {
        self.artifacts.model_dir = v;
      }
      if let Some(v) = non_empty(artifacts.vectorizer) {
        self.artifacts.vectorizer_file = v;
      }
      if let Some(v) = non_empty(artifacts.classifier) {
        self.artifacts.classifier_file = v;
      }
    }
    if let Some(dataset) = file_cfg.dataset {
      if let Some(v) = dataset.path {
        self.dataset_path = v;
      }
      if let Some(v) = non_empty(dataset.export_file_name) {
        self.export_file_name = v;
      }
    }
    if let Some(v) = file_cfg.assets.and_then(|assets| assets.images_dir) {
      self.images_dir = v;
    }
    if let Some(v) = file_cfg.ui.and_then(|ui| ui.preview_rows) {
      self.preview_rows = v;
    }
    if let Some(v) = non_empty(file_cfg.logging.and_then(|logging| logging.level)) {
      self.log_level = v;
    }
    Ok(())
  }

  /// Applies `JKN_SENTIMENT_*` variables read through `lookup`; unparsable numbers are ignored
  pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let env = |key: &str| non_empty(lookup(key));

    if let Some(v) = env("JKN_SENTIMENT_MODEL_DIR") {
      self.artifacts.model_dir = PathBuf::from(v);
    }
    if let Some(v) = env("JKN_SENTIMENT_VECTORIZER") {
      self.artifacts.vectorizer_file = v;
    }
    if let Some(v) = env("JKN_SENTIMENT_CLASSIFIER") {
      self.artifacts.classifier_file = v;
    }
    if let Some(v) = env("JKN_SENTIMENT_DATASET") {
      self.dataset_path = PathBuf::from(v);
    }
    if let Some(v) = env("JKN_SENTIMENT_IMAGES_DIR") {
      self.images_dir = PathBuf::from(v);
    }
    if let Some(v) = env("JKN_SENTIMENT_EXPORT_FILE") {
      self.export_file_name = v;
    }
    if let Some(v) = env("JKN_SENTIMENT_PREVIEW_ROWS") {
      if let Ok(parsed) = v.parse::<usize>() {
        self.preview_rows = parsed;
      }
    }
    if let Some(v) = env("JKN_SENTIMENT_LOG_LEVEL") {
      self.log_level = v;
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.preview_rows == 0 {
      return Err(ConfigError::Invalid { key: "ui.preview_rows", message: "must be greater than 0".to_string() });
    }
    parse_level(&self.log_level)?;
    Ok(())
  }

  pub fn level(&self) -> Result<Level, ConfigError> {
    parse_level(&self.log_level)
  }
}

pub fn parse_level(raw: &str) -> Result<Level, ConfigError> {
  match raw.to_ascii_lowercase().as_str() {
    "trace" => Ok(Level::TRACE),
    "debug" => Ok(Level::DEBUG),
    "info" => Ok(Level::INFO),
    "warn" => Ok(Level::WARN),
    "error" => Ok(Level::ERROR),
    other => Err(ConfigError::Invalid { key: "logging.level", message: format!("unknown level `{}`", other) }),
  }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(path.to_path_buf());
  }
  if let Some(path) = non_empty(std::env::var(CONFIG_ENV).ok()) {
    return Some(PathBuf::from(path));
  }
  let fallback: PathBuf = PathBuf::from(DEFAULT_CONFIG_FILE);
  fallback.is_file().then_some(fallback)
}
