use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use super::{FeedbackRecord, QuizRecord, RecordError, RecordSink};

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Line<'a> {
    Feedback(&'a FeedbackRecord),
    QuizAttempt(&'a QuizRecord),
}

/// Appends one JSON object per line to a local file.
#[derive(Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn append(&self, line: &Line<'_>) -> Result<(), RecordError> {
        let mut buf = serde_json::to_vec(line)?;
        buf.push(b'\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), RecordError> {
        self.append(&Line::Feedback(record)).await
    }

    async fn append_quiz_attempt(&self, record: &QuizRecord) -> Result<(), RecordError> {
        self.append(&Line::QuizAttempt(record)).await
    }
}
