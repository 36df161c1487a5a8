use futures::StreamExt;
use futures::stream;
use shared::{ClassificationResult, MAX_SIMILAR_SPECIES, SimilarSpecies, SpeciesPrediction};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::catalog::{SpeciesCatalog, SpeciesInfo};
use crate::config::InferenceConfig;
use crate::inference::{ImagePayload, InferenceError, InferenceProvider, ProviderOutput, ScoredLabel};
use crate::storage::{ImageStore, StorageError, content_type_for, sanitize_filename};

const NO_BUTTERFLY_MESSAGE: &str = "No butterfly detected. Please upload a butterfly image.";

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub confidence_threshold: f32,
    pub top_n: usize,
    pub max_concurrency: usize,
    pub allowed_extensions: Vec<String>,
}

impl From<&InferenceConfig> for ClassifierSettings {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            top_n: config.top_n,
            max_concurrency: config.max_concurrency,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Inference provider is unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Debug, thiserror::Error)]
enum ItemError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Inference(#[from] InferenceError),
    #[error("Model returned out-of-range confidence {0}")]
    ConfidenceOutOfRange(f32),
}

struct ItemFailure {
    error: ItemError,
    uploaded_image_url: Option<String>,
}

impl ItemFailure {
    fn new(error: impl Into<ItemError>, uploaded_image_url: Option<String>) -> Self {
        Self {
            error: error.into(),
            uploaded_image_url,
        }
    }
}

/// Classifies a batch of uploads. Output is index-aligned with the input;
/// a failing item becomes a failure slot and never aborts its siblings.
#[derive(Clone)]
pub struct BatchClassifier {
    provider: Arc<dyn InferenceProvider>,
    images: Arc<dyn ImageStore>,
    catalog: Arc<SpeciesCatalog>,
    settings: Arc<ClassifierSettings>,
}

impl BatchClassifier {
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        images: Arc<dyn ImageStore>,
        catalog: SpeciesCatalog,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            provider,
            images,
            catalog: Arc::new(catalog),
            settings: Arc::new(settings),
        }
    }

    /// `top_n` overrides the configured number of similar species; it is
    /// clamped to `1..=3`.
    pub async fn classify(
        &self,
        batch: &[ImagePayload],
        top_n: Option<usize>,
    ) -> Result<Vec<ClassificationResult>, BatchError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let top_n = top_n
            .unwrap_or(self.settings.top_n)
            .clamp(1, MAX_SIMILAR_SPECIES);
        log::info!("Classifying batch of {} image(s), top_n={}", batch.len(), top_n);

        // `buffered` yields in input order regardless of completion order.
        let outcomes: Vec<Result<SpeciesPrediction, ItemFailure>> = stream::iter(batch)
            .map(|image| self.classify_one(image, top_n))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let all_unavailable = outcomes.iter().all(|outcome| {
            matches!(outcome, Err(ItemFailure { error: ItemError::Inference(e), .. }) if e.is_unavailable())
        });
        if all_unavailable {
            let reason = outcomes
                .iter()
                .find_map(|o| o.as_ref().err().map(|f| f.error.to_string()))
                .unwrap_or_default();
            log::error!("Every item in the batch hit an unavailable model server");
            return Err(BatchError::ProviderUnavailable(reason));
        }

        Ok(outcomes
            .into_iter()
            .zip(batch)
            .map(|(outcome, image)| match outcome {
                Ok(prediction) => ClassificationResult::Success(prediction),
                Err(failure) => {
                    log::error!("Failed to classify {}: {}", image.file_name, failure.error);
                    ClassificationResult::failure(
                        format!("Error processing file {}: {}", image.file_name, failure.error),
                        failure.uploaded_image_url,
                    )
                }
            })
            .collect())
    }

    async fn classify_one(&self, image: &ImagePayload, top_n: usize) -> Result<SpeciesPrediction, ItemFailure> {
        let extension = image
            .extension()
            .filter(|ext| self.settings.allowed_extensions.contains(ext))
            .ok_or_else(|| ItemFailure::new(ItemError::InvalidFileType(image.file_name.clone()), None))?;

        let key = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(&image.file_name));
        let url = self
            .images
            .put(&key, &image.data, content_type_for(&extension))
            .await
            .map_err(|e| ItemFailure::new(e, None))?;

        let started = Instant::now();
        let output = self
            .provider
            .infer(image)
            .await
            .map_err(|e| ItemFailure::new(e, Some(url.clone())))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.build_prediction(output, url, top_n, elapsed_ms)
    }

    fn build_prediction(
        &self,
        output: ProviderOutput,
        url: String,
        top_n: usize,
        elapsed_ms: u64,
    ) -> Result<SpeciesPrediction, ItemFailure> {
        if let Some(bad) = std::iter::once(output.confidence)
            .chain(output.alternatives.iter().map(|a| a.confidence))
            .find(|c| !is_probability(*c))
        {
            return Err(ItemFailure::new(ItemError::ConfidenceOutOfRange(bad), Some(url)));
        }

        if output.confidence < self.settings.confidence_threshold {
            log::info!(
                "Rejected low-confidence prediction {} ({:.2})",
                output.label,
                output.confidence
            );
            let info = SpeciesInfo::unknown("Unknown");
            return Ok(SpeciesPrediction {
                species_name: info.species_name,
                scientific_name: info.scientific_name,
                taxonomy: info.taxonomy,
                status: info.status,
                confidence: output.confidence,
                uploaded_image_url: url,
                similar_species: Vec::new(),
                message: Some(NO_BUTTERFLY_MESSAGE.to_string()),
                inference_time_ms: Some(elapsed_ms),
            });
        }

        let info = self.catalog.lookup(&output.label);
        Ok(SpeciesPrediction {
            species_name: info.species_name,
            scientific_name: info.scientific_name,
            taxonomy: info.taxonomy,
            status: info.status,
            confidence: output.confidence,
            uploaded_image_url: url,
            similar_species: rank_similar(output.alternatives, top_n),
            message: None,
            inference_time_ms: Some(elapsed_ms),
        })
    }
}

fn is_probability(value: f32) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Stable descending sort by confidence; ties keep provider order.
pub fn rank_similar(mut alternatives: Vec<ScoredLabel>, top_n: usize) -> Vec<SimilarSpecies> {
    alternatives.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    alternatives
        .into_iter()
        .take(top_n.min(MAX_SIMILAR_SPECIES))
        .map(|alt| SimilarSpecies {
            species_name: alt.label,
            confidence: alt.confidence,
        })
        .collect()
}
