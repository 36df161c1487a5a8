pub mod dynamodb_repository;
pub mod jsonl;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{FeedbackKind, QuizAttempt};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub kind: FeedbackKind,
    pub original_species: String,
    pub corrected_species: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(
        kind: FeedbackKind,
        original_species: String,
        corrected_species: String,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            original_species,
            corrected_species,
            confidence,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizRecord {
    pub id: Uuid,
    pub score: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl From<QuizAttempt> for QuizRecord {
    fn from(attempt: QuizAttempt) -> Self {
        Self {
            id: Uuid::new_v4(),
            score: attempt.score,
            total: attempt.total,
            created_at: Utc::now(),
        }
    }
}

/// Append-only destination for user-submitted records. Records are never
/// updated or deleted through this interface.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), RecordError>;
    async fn append_quiz_attempt(&self, record: &QuizRecord) -> Result<(), RecordError>;
}
