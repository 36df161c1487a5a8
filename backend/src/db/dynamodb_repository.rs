use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use super::{FeedbackRecord, QuizRecord, RecordError, RecordSink};

#[derive(Clone)]
pub struct DynamoDbSink {
    client: Client,
    feedback_table: String,
    quiz_table: String,
}

impl DynamoDbSink {
    pub fn new(client: Client, feedback_table: String, quiz_table: String) -> Self {
        Self {
            client,
            feedback_table,
            quiz_table,
        }
    }

    /// Fails early when a configured table does not exist or is not reachable.
    pub async fn verify_tables(&self) -> Result<(), RecordError> {
        for table in [&self.feedback_table, &self.quiz_table] {
            match self.client.describe_table().table_name(table).send().await {
                Ok(response) => {
                    log::info!(
                        "DynamoDB table '{}' exists with status: {:?}",
                        table,
                        response.table().and_then(|t| t.table_status())
                    );
                }
                Err(e) => {
                    log::error!("DynamoDB table '{}' is not accessible: {:?}", table, e);
                    return Err(RecordError::DynamoDb(format!(
                        "Table '{}' not accessible: {}",
                        table, e
                    )));
                }
            }
        }
        Ok(())
    }

    async fn put(&self, table: &str, item: HashMap<String, AttributeValue>) -> Result<(), RecordError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            // Records are append-only; never overwrite an existing id.
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                log::error!("DynamoDB put_item failed for table {}: {:?}", table, e);
                RecordError::DynamoDb(e.to_string())
            })?;
        Ok(())
    }
}

pub fn feedback_to_item(record: &FeedbackRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("id".to_string(), AttributeValue::S(record.id.to_string()));
    item.insert("kind".to_string(), AttributeValue::S(record.kind.to_string()));
    item.insert(
        "original_species".to_string(),
        AttributeValue::S(record.original_species.clone()),
    );
    item.insert(
        "corrected_species".to_string(),
        AttributeValue::S(record.corrected_species.clone()),
    );
    item.insert(
        "confidence".to_string(),
        AttributeValue::N(record.confidence.to_string()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(record.created_at.to_rfc3339()),
    );
    item
}

pub fn quiz_to_item(record: &QuizRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("id".to_string(), AttributeValue::S(record.id.to_string()));
    item.insert("score".to_string(), AttributeValue::N(record.score.to_string()));
    item.insert("total".to_string(), AttributeValue::N(record.total.to_string()));
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(record.created_at.to_rfc3339()),
    );
    item
}

#[async_trait]
impl RecordSink for DynamoDbSink {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), RecordError> {
        log::info!(
            "Writing {} feedback {} to DynamoDB table '{}'",
            record.kind,
            record.id,
            self.feedback_table
        );
        self.put(&self.feedback_table, feedback_to_item(record)).await
    }

    async fn append_quiz_attempt(&self, record: &QuizRecord) -> Result<(), RecordError> {
        log::info!(
            "Writing quiz attempt {} to DynamoDB table '{}'",
            record.id,
            self.quiz_table
        );
        self.put(&self.quiz_table, quiz_to_item(record)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{FeedbackKind, QuizAttempt};

    #[test]
    fn feedback_item_keeps_both_names_and_confidence() {
        let record = FeedbackRecord::new(
            FeedbackKind::Confirmation,
            "Common Jezebel".into(),
            "Common Jezebel".into(),
            0.92,
        );
        let item = feedback_to_item(&record);
        assert_eq!(item["id"], AttributeValue::S(record.id.to_string()));
        assert_eq!(item["kind"], AttributeValue::S("confirmation".to_string()));
        assert_eq!(item["corrected_species"], AttributeValue::S("Common Jezebel".to_string()));
        assert_eq!(item["confidence"], AttributeValue::N("0.92".to_string()));
    }

    #[test]
    fn quiz_item_stores_numbers() {
        let record: QuizRecord = QuizAttempt { score: 3, total: 5 }.into();
        let item = quiz_to_item(&record);
        assert_eq!(item["score"], AttributeValue::N("3".to_string()));
        assert_eq!(item["total"], AttributeValue::N("5".to_string()));
        assert!(item.contains_key("created_at"));
    }
}
