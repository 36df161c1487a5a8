pub mod model;
pub mod preprocess;

use async_trait::async_trait;

use self::preprocess::PreprocessError;

/// Raw upload as received from the client. Lives for one batch request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Lower-cased extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabel {
    pub label: String,
    pub confidence: f32,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// What a provider hands back for one image. `alternatives` stay in the
/// provider's own order; ranking happens in the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput {
    pub label: String,
    pub confidence: f32,
    pub alternatives: Vec<ScoredLabel>,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),
    #[error("Model error: {0}")]
    Model(String),
    #[error("Model server unavailable: {0}")]
    Unavailable(String),
}

impl InferenceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, InferenceError::Unavailable(_))
    }
}

impl From<PreprocessError> for InferenceError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::UnsupportedFormat => {
                InferenceError::UnsupportedFormat("could not detect image format".to_string())
            }
            PreprocessError::Decode(msg) => InferenceError::UnreadableImage(msg),
        }
    }
}

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn infer(&self, image: &ImagePayload) -> Result<ProviderOutput, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lower_cased() {
        assert_eq!(ImagePayload::new("wing.JPG", vec![]).extension().as_deref(), Some("jpg"));
        assert_eq!(ImagePayload::new("archive.tar.gz", vec![]).extension().as_deref(), Some("gz"));
        assert_eq!(ImagePayload::new("noext", vec![]).extension(), None);
        assert_eq!(ImagePayload::new("trailing.", vec![]).extension(), None);
    }
}
