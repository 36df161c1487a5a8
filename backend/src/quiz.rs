use shared::QuizAttempt;
use std::sync::Arc;

use crate::db::{QuizRecord, RecordError, RecordSink};

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Quiz total {got} does not match the question set size {expected}")]
    TotalMismatch { expected: i64, got: i64 },
    #[error("Quiz score {score} is outside [0, {total}]")]
    ScoreOutOfRange { score: i64, total: i64 },
    #[error("Failed to record quiz result: {0}")]
    Sink(#[from] RecordError),
}

#[derive(Clone)]
pub struct QuizScorer {
    sink: Arc<dyn RecordSink>,
    question_count: i64,
}

impl QuizScorer {
    pub fn new(sink: Arc<dyn RecordSink>, question_count: usize) -> Self {
        Self {
            sink,
            question_count: question_count as i64,
        }
    }

    pub async fn record(&self, attempt: QuizAttempt) -> Result<QuizRecord, QuizError> {
        if attempt.total != self.question_count {
            log::warn!(
                "Quiz desync: client reported total {} but the question set has {}",
                attempt.total,
                self.question_count
            );
            return Err(QuizError::TotalMismatch {
                expected: self.question_count,
                got: attempt.total,
            });
        }
        if attempt.score < 0 || attempt.score > attempt.total {
            log::warn!("Quiz desync: score {} out of {}", attempt.score, attempt.total);
            return Err(QuizError::ScoreOutOfRange {
                score: attempt.score,
                total: attempt.total,
            });
        }

        let record = QuizRecord::from(attempt);
        self.sink.append_quiz_attempt(&record).await?;
        log::info!("Quiz score: {}/{}", record.score, record.total);
        Ok(record)
    }
}
