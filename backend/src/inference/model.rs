use actix_web::web;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::preprocess::{preprocess, to_instance};
use super::{ImagePayload, InferenceError, InferenceProvider, ProviderOutput, ScoredLabel};
use crate::catalog::ClassIndex;
use crate::config::InferenceConfig;

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<[f32; 3]>>>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Classifier backed by a model server speaking the TensorFlow Serving REST
/// predict API.
#[derive(Clone)]
pub struct RemoteModelProvider {
    client: reqwest::Client,
    predict_url: String,
    class_index: Arc<ClassIndex>,
    image_dims: (u32, u32),
}

impl RemoteModelProvider {
    pub fn new(config: &InferenceConfig, class_index: ClassIndex) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::Model(format!("Failed to build HTTP client: {}", e)))?;
        let predict_url = format!(
            "{}/v1/models/{}:predict",
            config.model_server_url.trim_end_matches('/'),
            config.model_name
        );
        log::info!(
            "Using model server at {} ({} classes)",
            predict_url,
            class_index.len()
        );
        Ok(Self {
            client,
            predict_url,
            class_index: Arc::new(class_index),
            image_dims: config.image_dims(),
        })
    }

    async fn predict(&self, request: &PredictRequest) -> Result<Vec<f32>, InferenceError> {
        let response = self
            .client
            .post(&self.predict_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    InferenceError::Unavailable(e.to_string())
                } else {
                    InferenceError::Model(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(InferenceError::Unavailable(format!("model server returned {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Model(format!(
                "model server returned {}: {}",
                status, body
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Model(format!("Invalid predict response: {}", e)))?;
        parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::Model("Empty predictions".to_string()))
    }
}

#[async_trait]
impl InferenceProvider for RemoteModelProvider {
    async fn infer(&self, image: &ImagePayload) -> Result<ProviderOutput, InferenceError> {
        let data = image.data.clone();
        let dims = self.image_dims;
        let instance = web::block(move || preprocess(&data, dims).map(|t| to_instance(&t)))
            .await
            .map_err(|e| InferenceError::Model(format!("Preprocessing task failed: {}", e)))??;

        let scores = self
            .predict(&PredictRequest {
                instances: vec![instance],
            })
            .await?;
        scores_to_output(&scores, &self.class_index)
    }
}

/// Turns one probability row into a provider output. The top label is the
/// first maximal score; indices without a label are dropped from the
/// alternatives.
pub fn scores_to_output(scores: &[f32], class_index: &ClassIndex) -> Result<ProviderOutput, InferenceError> {
    let (best_idx, best) = scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |acc: Option<(usize, f32)>, (idx, score)| match acc {
            Some((_, top)) if top >= score => acc,
            _ => Some((idx, score)),
        })
        .ok_or_else(|| InferenceError::Model("Model returned no scores".to_string()))?;

    let alternatives = scores
        .iter()
        .enumerate()
        .filter_map(|(idx, score)| class_index.label(idx).map(|label| ScoredLabel::new(label, *score)))
        .collect();

    Ok(ProviderOutput {
        label: class_index.label(best_idx).unwrap_or("Unknown").to_string(),
        confidence: best,
        alternatives,
    })
}
