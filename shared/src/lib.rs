use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub mod quiz;

pub use quiz::{Quiz, QuizQuestion, QuizState, ScoreReporter, Transition, QUESTION_BANK};

/// Maximum number of ranked alternatives carried by a prediction.
pub const MAX_SIMILAR_SPECIES: usize = 3;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimilarSpecies {
    pub species_name: String,
    pub confidence: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpeciesPrediction {
    pub species_name: String,
    pub scientific_name: String,
    pub taxonomy: String,
    pub status: String,
    pub confidence: f32,
    pub uploaded_image_url: String,
    pub similar_species: Vec<SimilarSpecies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_time_ms: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassificationFailure {
    pub error: String,
    /// Present when the file itself was accepted and stored, so the client can
    /// still show which image failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_image_url: Option<String>,
}

/// One slot of a batch response. Serialized untagged so a success is the flat
/// prediction object and a failure is `{"error": ...}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ClassificationResult {
    Success(SpeciesPrediction),
    Failure(ClassificationFailure),
}

impl ClassificationResult {
    pub fn failure(error: impl Into<String>, uploaded_image_url: Option<String>) -> Self {
        ClassificationResult::Failure(ClassificationFailure {
            error: error.into(),
            uploaded_image_url,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ClassificationResult::Success(_))
    }

    pub fn uploaded_image_url(&self) -> Option<&str> {
        match self {
            ClassificationResult::Success(p) => Some(&p.uploaded_image_url),
            ClassificationResult::Failure(f) => f.uploaded_image_url.as_deref(),
        }
    }
}

/// Reduced response of the single-image endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SingleClassification {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
}

impl From<&SpeciesPrediction> for SingleClassification {
    fn from(prediction: &SpeciesPrediction) -> Self {
        Self {
            class_name: prediction.species_name.clone(),
            confidence: prediction.confidence,
        }
    }
}

/// Body posted by the client after the user answers "was this prediction correct?".
/// A missing `correctedSpecies`, or one naming the original species, means the
/// user confirmed the prediction. Confidence is kept at the client's precision.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub original_species: String,
    #[serde(default)]
    pub corrected_species: Option<String>,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedbackKind {
    Confirmation,
    Correction,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizAttempt {
    pub score: i64,
    pub total: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prediction() -> SpeciesPrediction {
        SpeciesPrediction {
            species_name: "Common Jezebel".into(),
            scientific_name: "Delias eucharis".into(),
            taxonomy: "Pieridae".into(),
            status: "Least Concern".into(),
            confidence: 0.92,
            uploaded_image_url: "http://localhost/uploads/a.jpg".into(),
            similar_species: vec![SimilarSpecies {
                species_name: "Common Jezebel".into(),
                confidence: 0.92,
            }],
            message: None,
            inference_time_ms: None,
        }
    }

    #[test]
    fn failure_serializes_as_error_object() {
        let failure = ClassificationResult::failure("bad file", None);
        assert_eq!(serde_json::to_value(&failure).unwrap(), json!({ "error": "bad file" }));
    }

    #[test]
    fn success_serializes_flat_without_optional_fields() {
        let value = serde_json::to_value(ClassificationResult::Success(prediction())).unwrap();
        assert_eq!(value["species_name"], "Common Jezebel");
        assert!(value.get("message").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn untagged_result_reads_back_the_right_variant() {
        let failure: ClassificationResult =
            serde_json::from_value(json!({ "error": "x", "uploaded_image_url": "u" })).unwrap();
        assert_eq!(failure.uploaded_image_url(), Some("u"));
        assert!(!failure.is_success());

        let success: ClassificationResult =
            serde_json::from_value(serde_json::to_value(prediction()).unwrap()).unwrap();
        assert!(success.is_success());
    }

    #[test]
    fn single_classification_renames_species_to_class() {
        let single = SingleClassification::from(&prediction());
        assert_eq!(
            serde_json::to_value(single).unwrap(),
            json!({ "class": "Common Jezebel", "confidence": 0.92f32 })
        );
    }

    #[test]
    fn feedback_submission_uses_camel_case() {
        let submission: FeedbackSubmission = serde_json::from_value(json!({
            "originalSpecies": "Common Jezebel",
            "confidence": 0.92
        }))
        .unwrap();
        assert_eq!(submission.corrected_species, None);
        assert_eq!(FeedbackKind::Correction.to_string(), "correction");
    }
}
