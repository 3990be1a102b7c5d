use tracing::{debug, warn};

use std::fmt::Display;
use std::sync::OnceLock;

use crate::error::{ArtifactLoadError, ClassificationError, PredictError};
use crate::model::{LinearSvm, ModelError};
use crate::preprocessing::{FeatureVector, TfidfVectorizer, VectorizeError};

/// Turns review text into a feature vector
pub trait Vectorizer {
  type Error: Display;

  fn dimension(&self) -> usize;
  fn transform(&self, text: &str) -> Result<FeatureVector, Self::Error>;
}

/// Maps a feature vector to one label and a signed margin
pub trait Classifier {
  type Error: Display;

  fn n_features(&self) -> usize;
  fn predict(&self, x: &FeatureVector) -> Result<String, Self::Error>;
  fn score(&self, x: &FeatureVector) -> Result<f64, Self::Error>;
}

/// Produces the fitted artifact pair; called at most once per service
pub trait ArtifactLoader {
  type Vectorizer: Vectorizer;
  type Classifier: Classifier;

  fn load(&self) -> Result<(Self::Vectorizer, Self::Classifier), ArtifactLoadError>;
}

impl Vectorizer for TfidfVectorizer {
  type Error = VectorizeError;

  fn dimension(&self) -> usize {
    TfidfVectorizer::dimension(self)
  }

  fn transform(&self, text: &str) -> Result<FeatureVector, VectorizeError> {
    TfidfVectorizer::transform(self, text)
  }
}

impl Classifier for LinearSvm {
  type Error = ModelError;

  fn n_features(&self) -> usize {
    LinearSvm::n_features(self)
  }

  fn predict(&self, x: &FeatureVector) -> Result<String, ModelError> {
    LinearSvm::predict(self, x)
  }

  fn score(&self, x: &FeatureVector) -> Result<f64, ModelError> {
    LinearSvm::score(self, x)
  }
}

/// Presentation bucket for a predicted label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentCategory {
  Positive,
  Negative,
  Neutral,
}

impl SentimentCategory {
  /// Case-insensitive; any label other than `positif` or `negatif` is neutral
  pub fn from_label(label: &str) -> Self {
    match label.to_lowercase().as_str() {
      "positif" => SentimentCategory::Positive,
      "negatif" => SentimentCategory::Negative,
      _ => SentimentCategory::Neutral,
    }
  }

  pub fn emoji(&self) -> &'static str {
    match self {
      SentimentCategory::Positive => "😊",
      SentimentCategory::Negative => "😞",
      SentimentCategory::Neutral => "😐",
    }
  }

  pub fn color(&self) -> &'static str {
    match self {
      SentimentCategory::Positive => "#4CAF50",
      SentimentCategory::Negative => "#F44336",
      SentimentCategory::Neutral => "#FF9800",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
  pub label: String,
  /// Absolute decision margin; a relative strength, not a probability
  pub confidence: f64,
}

impl Prediction {
  pub fn category(&self) -> SentimentCategory {
    SentimentCategory::from_label(&self.label)
  }
}

/// The loaded, immutable artifact pair
#[derive(Debug)]
pub struct Artifacts<V, C> {
  pub vectorizer: V,
  pub classifier: C,
}

/// Inference Service
/// Owns the fitted artifacts for the life of the process and classifies review text with them.
/// Loading happens once; every later `classify` only reads.
pub struct InferenceService<L: ArtifactLoader> {
  loader: L,
  artifacts: OnceLock<Result<Artifacts<L::Vectorizer, L::Classifier>, ArtifactLoadError>>,
}

impl<L: ArtifactLoader> InferenceService<L> {
  pub fn new(loader: L) -> Self {
    Self { loader, artifacts: OnceLock::new() }
  }

  /// Initialize
  /// Loads the artifacts on the first call and memoizes the outcome, failure included
  pub fn initialize(&self) -> Result<&Artifacts<L::Vectorizer, L::Classifier>, ArtifactLoadError> {
    self
      .artifacts
      .get_or_init(|| {
        let (vectorizer, classifier) = self.loader.load()?;
        if vectorizer.dimension() != classifier.n_features() {
          return Err(ArtifactLoadError::Incompatible {
            vectorizer: vectorizer.dimension(),
            classifier: classifier.n_features(),
          });
        }
        Ok(Artifacts { vectorizer, classifier })
      })
      .as_ref()
      .map_err(|e| {
        warn!(error = %e, "model artifacts unavailable, manual prediction disabled");
        e.clone()
      })
  }

  pub fn is_ready(&self) -> bool {
    matches!(self.artifacts.get(), Some(Ok(_)))
  }

  /// The memoized load failure, if initialization was attempted and failed
  pub fn load_error(&self) -> Option<&ArtifactLoadError> {
    match self.artifacts.get() {
      Some(Err(e)) => Some(e),
      _ => None,
    }
  }

  /// Classify
  /// Label and absolute margin for one review. Blank text is rejected before any artifact is touched.
  pub fn classify(&self, text: &str) -> Result<Prediction, PredictError> {
    if text.trim().is_empty() {
      return Err(PredictError::EmptyInput);
    }

    let artifacts: &Artifacts<L::Vectorizer, L::Classifier> = match self.artifacts.get() {
      None => return Err(ClassificationError::NotInitialized.into()),
      Some(Err(e)) => return Err(ClassificationError::Unavailable(e.to_string()).into()),
      Some(Ok(artifacts)) => artifacts,
    };

    let x: FeatureVector = artifacts
      .vectorizer
      .transform(text)
      .map_err(|e| ClassificationError::Vectorizer(e.to_string()))?;
    let label: String = artifacts
      .classifier
      .predict(&x)
      .map_err(|e| ClassificationError::Classifier(e.to_string()))?;
    let margin: f64 = artifacts
      .classifier
      .score(&x)
      .map_err(|e| ClassificationError::Classifier(e.to_string()))?;

    debug!(%label, margin, "classified review");
    Ok(Prediction { label, confidence: margin.abs() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::artifacts::{fixtures, FsArtifactLoader};
  use ndarray::Array1;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  #[derive(Debug)]
  struct CountingVectorizer {
    dimension: usize,
    calls: Arc<AtomicUsize>,
  }

  impl Vectorizer for CountingVectorizer {
    type Error = String;

    fn dimension(&self) -> usize {
      self.dimension
    }

    fn transform(&self, _text: &str) -> Result<FeatureVector, String> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(Array1::zeros(self.dimension))
    }
  }

  /// Emits a fixed label and margin, or a fixed failure
  #[derive(Debug)]
  struct FixedClassifier {
    n_features: usize,
    label: String,
    margin: f64,
    failure: Option<String>,
  }

  impl Classifier for FixedClassifier {
    type Error = String;

    fn n_features(&self) -> usize {
      self.n_features
    }

    fn predict(&self, _x: &FeatureVector) -> Result<String, String> {
      match &self.failure {
        Some(message) => Err(message.clone()),
        None => Ok(self.label.clone()),
      }
    }

    fn score(&self, _x: &FeatureVector) -> Result<f64, String> {
      Ok(self.margin)
    }
  }

  struct MockLoader {
    loads: Arc<AtomicUsize>,
    transforms: Arc<AtomicUsize>,
    label: &'static str,
    margin: f64,
    failure: Option<String>,
    classifier_features: usize,
  }

  impl MockLoader {
    fn new(label: &'static str, margin: f64) -> Self {
      Self {
        loads: Arc::new(AtomicUsize::new(0)),
        transforms: Arc::new(AtomicUsize::new(0)),
        label,
        margin,
        failure: None,
        classifier_features: 3,
      }
    }
  }

  impl ArtifactLoader for MockLoader {
    type Vectorizer = CountingVectorizer;
    type Classifier = FixedClassifier;

    fn load(&self) -> Result<(CountingVectorizer, FixedClassifier), ArtifactLoadError> {
      self.loads.fetch_add(1, Ordering::SeqCst);
      Ok((
        CountingVectorizer { dimension: 3, calls: self.transforms.clone() },
        FixedClassifier {
          n_features: self.classifier_features,
          label: self.label.to_string(),
          margin: self.margin,
          failure: self.failure.clone(),
        },
      ))
    }
  }

  #[test]
  fn it_loads_artifacts_once() {
    let loader: MockLoader = MockLoader::new("positif", 1.25);
    let loads: Arc<AtomicUsize> = loader.loads.clone();
    let service: InferenceService<MockLoader> = InferenceService::new(loader);

    service.initialize().unwrap();
    service.initialize().unwrap();
    for _ in 0..5 {
      service.classify("Aplikasi ini sangat membantu").unwrap();
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(service.is_ready());
  }

  #[test]
  fn it_loads_artifacts_once_across_racing_threads() {
    let loader: MockLoader = MockLoader::new("positif", 1.25);
    let loads: Arc<AtomicUsize> = loader.loads.clone();
    let service: InferenceService<MockLoader> = InferenceService::new(loader);

    std::thread::scope(|scope| {
      for _ in 0..8 {
        scope.spawn(|| {
          service.initialize().unwrap();
        });
      }
    });
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(service.is_ready());
  }

  #[test]
  fn it_rejects_blank_input_without_vectorizing() {
    let loader: MockLoader = MockLoader::new("positif", 1.25);
    let transforms: Arc<AtomicUsize> = loader.transforms.clone();
    let service: InferenceService<MockLoader> = InferenceService::new(loader);
    service.initialize().unwrap();

    assert_eq!(service.classify(""), Err(PredictError::EmptyInput));
    assert_eq!(service.classify("   "), Err(PredictError::EmptyInput));
    assert_eq!(service.classify("\n\t "), Err(PredictError::EmptyInput));
    assert_eq!(transforms.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn it_rejects_blank_input_before_initialization() {
    let service: InferenceService<MockLoader> = InferenceService::new(MockLoader::new("positif", 1.0));
    assert_eq!(service.classify(" "), Err(PredictError::EmptyInput));
  }

  #[test]
  fn it_fails_fast_when_uninitialized() {
    let loader: MockLoader = MockLoader::new("positif", 1.0);
    let loads: Arc<AtomicUsize> = loader.loads.clone();
    let service: InferenceService<MockLoader> = InferenceService::new(loader);

    assert_eq!(
      service.classify("bagus"),
      Err(PredictError::Classification(ClassificationError::NotInitialized))
    );
    assert_eq!(loads.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn it_surfaces_absolute_margin() {
    let service: InferenceService<MockLoader> = InferenceService::new(MockLoader::new("negatif", -2.75));
    service.initialize().unwrap();

    let prediction: Prediction = service.classify("aplikasi sering error").unwrap();
    assert_eq!(prediction.label, "negatif");
    assert_eq!(prediction.confidence, 2.75);
    assert_eq!(prediction.category(), SentimentCategory::Negative);
  }

  #[test]
  fn it_keeps_the_underlying_failure_message() {
    let mut loader: MockLoader = MockLoader::new("positif", 1.0);
    loader.failure = Some("shape (1, 7) vs (3,)".to_string());
    let service: InferenceService<MockLoader> = InferenceService::new(loader);
    service.initialize().unwrap();

    let err: PredictError = service.classify("bagus").unwrap_err();
    assert_eq!(err, PredictError::Classification(ClassificationError::Classifier("shape (1, 7) vs (3,)".to_string())));
    assert!(err.to_string().contains("shape (1, 7) vs (3,)"));
  }

  #[test]
  fn it_refuses_mismatched_artifact_pairs() {
    let mut loader: MockLoader = MockLoader::new("positif", 1.0);
    loader.classifier_features = 5;
    let service: InferenceService<MockLoader> = InferenceService::new(loader);

    let err: ArtifactLoadError = service.initialize().unwrap_err();
    assert_eq!(err, ArtifactLoadError::Incompatible { vectorizer: 3, classifier: 5 });
    assert_eq!(service.load_error(), Some(&err));
    assert!(!service.is_ready());
  }

  #[test]
  fn it_memoizes_load_failures() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let service: InferenceService<FsArtifactLoader> =
      InferenceService::new(FsArtifactLoader::new(dir.path().join("vectorizer.bin"), dir.path().join("svm_model.bin")));

    assert!(matches!(service.initialize(), Err(ArtifactLoadError::Missing { .. })));

    // supplying the files later does not revive a failed service
    fixtures::write_to(dir.path());
    assert!(service.initialize().is_err());
    match service.classify("bagus") {
      Err(PredictError::Classification(ClassificationError::Unavailable(message))) => {
        assert!(message.contains("vectorizer.bin"))
      }
      other => panic!("expected unavailable, got {:?}", other),
    }
  }

  #[test]
  fn it_classifies_with_fixture_artifacts() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let service: InferenceService<FsArtifactLoader> = InferenceService::new(fixtures::write_to(dir.path()));
    service.initialize().unwrap();

    let prediction: Prediction = service.classify("Aplikasi ini sangat membantu").unwrap();
    assert_eq!(prediction.label, "positif");
    assert!(prediction.confidence >= 0.0);
    assert_eq!(prediction.category(), SentimentCategory::Positive);

    let prediction: Prediction = service.classify("aplikasi error dan lambat").unwrap();
    assert_eq!(prediction.label, "negatif");
    assert!(prediction.confidence > 0.0);
  }

  #[test]
  fn it_is_idempotent() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let service: InferenceService<FsArtifactLoader> = InferenceService::new(fixtures::write_to(dir.path()));
    service.initialize().unwrap();

    let first: Prediction = service.classify("Aplikasi ini sangat membantu").unwrap();
    for _ in 0..10 {
      assert_eq!(service.classify("Aplikasi ini sangat membantu").unwrap(), first);
    }
  }

  #[test]
  fn it_classifies_from_many_threads() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let service: InferenceService<FsArtifactLoader> = InferenceService::new(fixtures::write_to(dir.path()));
    service.initialize().unwrap();
    let expected: Prediction = service.classify("sangat membantu").unwrap();

    std::thread::scope(|scope| {
      for _ in 0..4 {
        scope.spawn(|| {
          for _ in 0..25 {
            assert_eq!(service.classify("sangat membantu").unwrap(), expected);
          }
        });
      }
    });
  }

  #[test]
  fn it_maps_labels_case_insensitively() {
    for label in ["positif", "POSITIF", "Positif", "pOsItIf"] {
      assert_eq!(SentimentCategory::from_label(label), SentimentCategory::Positive);
    }
    for label in ["negatif", "NEGATIF", "Negatif"] {
      assert_eq!(SentimentCategory::from_label(label), SentimentCategory::Negative);
    }
    for label in ["netral", "", "positive", " positif"] {
      assert_eq!(SentimentCategory::from_label(label), SentimentCategory::Neutral);
    }
  }

  #[test]
  fn it_treats_unknown_labels_as_neutral() {
    let service: InferenceService<MockLoader> = InferenceService::new(MockLoader::new("netral", 0.4));
    service.initialize().unwrap();

    let prediction: Prediction = service.classify("biasa saja").unwrap();
    assert_eq!(prediction.category(), SentimentCategory::Neutral);
    assert_eq!(prediction.category().emoji(), "😐");
    assert_eq!(prediction.category().color(), "#FF9800");
  }
}
