use shared::{FeedbackKind, FeedbackSubmission};
use std::sync::Arc;

use crate::db::{FeedbackRecord, RecordError, RecordSink};

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("missing corrected species")]
    MissingCorrectedSpecies,
    #[error("missing original species")]
    MissingOriginalSpecies,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("Failed to record feedback: {0}")]
    Sink(#[from] RecordError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackIntent {
    /// The prediction was right.
    Confirm,
    /// The prediction was wrong; the user supplied the right species.
    Correct { corrected_species: String },
}

/// The parts of a prior classification that feedback refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRef {
    pub species_name: String,
    pub confidence: f64,
}

/// Splits a wire submission. A `correctedSpecies` that is absent or names the
/// original species (ignoring surrounding whitespace) is a confirmation.
pub fn split_submission(submission: FeedbackSubmission) -> (FeedbackIntent, PredictionRef) {
    let intent = match submission.corrected_species {
        Some(corrected) if corrected.trim() == submission.original_species.trim() => {
            FeedbackIntent::Confirm
        }
        Some(corrected_species) => FeedbackIntent::Correct { corrected_species },
        None => FeedbackIntent::Confirm,
    };
    let prediction = PredictionRef {
        species_name: submission.original_species,
        confidence: submission.confidence,
    };
    (intent, prediction)
}

#[derive(Clone)]
pub struct FeedbackRecorder {
    sink: Arc<dyn RecordSink>,
}

impl FeedbackRecorder {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink }
    }

    /// Validates and appends one feedback record. Nothing is written when
    /// validation fails; a failed write is returned, never swallowed.
    pub async fn record(
        &self,
        intent: FeedbackIntent,
        prediction: &PredictionRef,
    ) -> Result<FeedbackRecord, FeedbackError> {
        let original = prediction.species_name.trim();
        if original.is_empty() {
            return Err(FeedbackError::MissingOriginalSpecies);
        }
        if !prediction.confidence.is_finite() || !(0.0..=1.0).contains(&prediction.confidence) {
            return Err(FeedbackError::ConfidenceOutOfRange(prediction.confidence));
        }

        let (kind, corrected) = match &intent {
            FeedbackIntent::Confirm => (FeedbackKind::Confirmation, original),
            FeedbackIntent::Correct { corrected_species } => {
                let corrected = corrected_species.trim();
                if corrected.is_empty() {
                    return Err(FeedbackError::MissingCorrectedSpecies);
                }
                (FeedbackKind::Correction, corrected)
            }
        };

        let record = FeedbackRecord::new(
            kind,
            original.to_string(),
            corrected.to_string(),
            prediction.confidence,
        );
        self.sink.append_feedback(&record).await?;
        log::info!(
            "Recorded {} feedback {}: {} -> {}",
            record.kind,
            record.id,
            record.original_species,
            record.corrected_species
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemorySink;
    use crate::testing::BrokenSink;

    fn jezebel() -> PredictionRef {
        PredictionRef {
            species_name: "Common Jezebel".into(),
            confidence: 0.92,
        }
    }

    #[actix_web::test]
    async fn confirmation_copies_original_species() {
        let sink = Arc::new(MemorySink::new());
        let recorder = FeedbackRecorder::new(sink.clone());

        recorder.record(FeedbackIntent::Confirm, &jezebel()).await.unwrap();

        let records = sink.feedback();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, FeedbackKind::Confirmation);
        assert_eq!(records[0].original_species, "Common Jezebel");
        assert_eq!(records[0].corrected_species, "Common Jezebel");
        assert_eq!(records[0].confidence, 0.92);
    }

    #[actix_web::test]
    async fn correction_keeps_both_names_and_original_confidence() {
        let sink = Arc::new(MemorySink::new());
        let recorder = FeedbackRecorder::new(sink.clone());

        let intent = FeedbackIntent::Correct {
            corrected_species: "Crimson Rose".into(),
        };
        let record = recorder.record(intent, &jezebel()).await.unwrap();

        assert_eq!(record.kind, FeedbackKind::Correction);
        assert_eq!(record.original_species, "Common Jezebel");
        assert_eq!(record.corrected_species, "Crimson Rose");
        assert_eq!(record.confidence, 0.92);
        assert_eq!(sink.feedback(), vec![record]);
    }

    #[actix_web::test]
    async fn blank_correction_is_rejected_and_not_recorded() {
        let sink = Arc::new(MemorySink::new());
        let recorder = FeedbackRecorder::new(sink.clone());

        for blank in ["", "   "] {
            let intent = FeedbackIntent::Correct {
                corrected_species: blank.into(),
            };
            let err = recorder.record(intent, &jezebel()).await.unwrap_err();
            assert!(matches!(err, FeedbackError::MissingCorrectedSpecies));
            assert_eq!(err.to_string(), "missing corrected species");
        }
        assert!(sink.feedback().is_empty());
    }

    #[actix_web::test]
    async fn duplicate_confirmations_create_two_records() {
        let sink = Arc::new(MemorySink::new());
        let recorder = FeedbackRecorder::new(sink.clone());

        let first = recorder.record(FeedbackIntent::Confirm, &jezebel()).await.unwrap();
        let second = recorder.record(FeedbackIntent::Confirm, &jezebel()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(sink.feedback().len(), 2);
    }

    #[actix_web::test]
    async fn out_of_range_confidence_is_rejected() {
        let sink = Arc::new(MemorySink::new());
        let recorder = FeedbackRecorder::new(sink.clone());
        let prediction = PredictionRef {
            species_name: "Common Jezebel".into(),
            confidence: 92.0,
        };
        let err = recorder.record(FeedbackIntent::Confirm, &prediction).await.unwrap_err();
        assert!(matches!(err, FeedbackError::ConfidenceOutOfRange(_)));
        assert!(sink.feedback().is_empty());
    }

    #[actix_web::test]
    async fn sink_failure_is_reported() {
        let recorder = FeedbackRecorder::new(Arc::new(BrokenSink));
        let err = recorder.record(FeedbackIntent::Confirm, &jezebel()).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Sink(_)));
    }

    #[test]
    fn submission_without_correction_is_a_confirmation() {
        let (intent, prediction) = split_submission(FeedbackSubmission {
            original_species: "Common Jezebel".into(),
            corrected_species: None,
            confidence: 0.92,
        });
        assert_eq!(intent, FeedbackIntent::Confirm);
        assert_eq!(prediction, jezebel());
    }

    #[actix_web::test]
    async fn correction_naming_the_original_species_is_a_confirmation() {
        let sink = Arc::new(MemorySink::new());
        let recorder = FeedbackRecorder::new(sink.clone());
        let submission: FeedbackSubmission = serde_json::from_value(serde_json::json!({
            "originalSpecies": "Common Jezebel",
            "correctedSpecies": " Common Jezebel ",
            "confidence": 0.92
        }))
        .unwrap();

        let (intent, prediction) = split_submission(submission);
        assert_eq!(intent, FeedbackIntent::Confirm);
        let record = recorder.record(intent, &prediction).await.unwrap();

        assert_eq!(record.kind, FeedbackKind::Confirmation);
        assert_eq!(record.corrected_species, "Common Jezebel");
        assert_eq!(sink.feedback(), vec![record]);
    }

    #[test]
    fn different_corrected_species_is_a_correction() {
        let (intent, _) = split_submission(FeedbackSubmission {
            original_species: "Common Jezebel".into(),
            corrected_species: Some("Crimson Rose".into()),
            confidence: 0.92,
        });
        assert_eq!(
            intent,
            FeedbackIntent::Correct {
                corrected_species: "Crimson Rose".into()
            }
        );
    }

    #[test]
    fn confidence_keeps_client_precision() {
        let (_, prediction) = split_submission(FeedbackSubmission {
            original_species: "Common Jezebel".into(),
            corrected_species: None,
            confidence: 0.123456789,
        });
        assert_eq!(prediction.confidence, 0.123456789);
    }
}
