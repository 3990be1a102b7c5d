pub mod artifacts;
pub mod assets;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod model;
pub mod preprocessing;

pub use artifacts::FsArtifactLoader;
pub use config::AppConfig;
pub use dashboard::{Dashboard, View, VisualizationTab};
pub use error::{ArtifactLoadError, ClassificationError, PredictError};
pub use inference::{InferenceService, Prediction, SentimentCategory};

/// Sentiment Service
/// Builds an inference service for the configured artifacts and loads them eagerly
pub fn sentiment_service(config: &AppConfig) -> Result<InferenceService<FsArtifactLoader>, ArtifactLoadError> {
    let service: InferenceService<FsArtifactLoader> = InferenceService::new(FsArtifactLoader::from_paths(&config.artifacts));
    service.initialize()?;
    Ok(service)
}
