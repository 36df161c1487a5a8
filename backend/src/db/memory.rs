use async_trait::async_trait;
use std::sync::Mutex;

use super::{FeedbackRecord, QuizRecord, RecordError, RecordSink};

/// Keeps records in process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemorySink {
    feedback: Mutex<Vec<FeedbackRecord>>,
    quiz_attempts: Mutex<Vec<QuizRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feedback(&self) -> Vec<FeedbackRecord> {
        self.feedback.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn quiz_attempts(&self) -> Vec<QuizRecord> {
        self.quiz_attempts.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), RecordError> {
        self.feedback
            .lock()
            .map_err(|_| RecordError::Io(std::io::Error::other("feedback store poisoned")))?
            .push(record.clone());
        Ok(())
    }

    async fn append_quiz_attempt(&self, record: &QuizRecord) -> Result<(), RecordError> {
        self.quiz_attempts
            .lock()
            .map_err(|_| RecordError::Io(std::io::Error::other("quiz store poisoned")))?
            .push(record.clone());
        Ok(())
    }
}
