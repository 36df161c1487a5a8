//! Test doubles for the service seams.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::db::{FeedbackRecord, QuizRecord, RecordError, RecordSink};
use crate::inference::{ImagePayload, InferenceError, InferenceProvider, ProviderOutput};
use crate::storage::{ImageStore, StorageError};

pub fn payload(file_name: &str) -> ImagePayload {
    ImagePayload::new(file_name, format!("bytes of {}", file_name).into_bytes())
}

#[derive(Clone)]
pub enum Outcome {
    Output(ProviderOutput),
    Fail(fn() -> InferenceError),
}

/// Answers per file name after an optional delay; unknown names fail.
#[derive(Default)]
pub struct ScriptedProvider {
    script: HashMap<String, (Outcome, u64)>,
}

impl ScriptedProvider {
    pub fn with(mut self, file_name: &str, outcome: Outcome, delay_ms: u64) -> Self {
        self.script.insert(file_name.to_string(), (outcome, delay_ms));
        self
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    async fn infer(&self, image: &ImagePayload) -> Result<ProviderOutput, InferenceError> {
        let Some((outcome, delay_ms)) = self.script.get(&image.file_name).cloned() else {
            return Err(InferenceError::Model(format!("no script for {}", image.file_name)));
        };
        if delay_ms > 0 {
            actix_web::rt::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        match outcome {
            Outcome::Output(output) => Ok(output),
            Outcome::Fail(make) => Err(make()),
        }
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    stored: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, key: &str, _data: &[u8], _content_type: &str) -> Result<String, StorageError> {
        self.stored.lock().unwrap().push(key.to_string());
        Ok(format!("memory://uploads/{}", key))
    }
}

/// Sink whose writes always fail.
pub struct BrokenSink;

#[async_trait]
impl RecordSink for BrokenSink {
    async fn append_feedback(&self, _record: &FeedbackRecord) -> Result<(), RecordError> {
        Err(RecordError::DynamoDb("table unavailable".to_string()))
    }

    async fn append_quiz_attempt(&self, _record: &QuizRecord) -> Result<(), RecordError> {
        Err(RecordError::DynamoDb("table unavailable".to_string()))
    }
}
