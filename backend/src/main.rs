mod catalog;
mod classifier;
mod config;
mod db;
mod feedback;
mod inference;
mod quiz;
mod routes;
mod storage;
mod upload;

#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use catalog::{ClassIndex, SpeciesCatalog};
use classifier::{BatchClassifier, ClassifierSettings};
use config::{AppConfig, ImageStorageConfig, RecordStorageConfig};
use db::RecordSink;
use db::dynamodb_repository::DynamoDbSink;
use db::jsonl::JsonLinesSink;
use db::memory::MemorySink;
use feedback::FeedbackRecorder;
use inference::model::RemoteModelProvider;
use quiz::QuizScorer;
use routes::{RouteConfig, configure_routes};
use std::sync::Arc;
use storage::ImageStore;
use storage::local::LocalImageStore;
use storage::s3_service::S3ImageStore;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;

    let class_index = ClassIndex::load(&config.catalog.class_indices)
        .map_err(|e| startup_error("Failed to load class indices", e))?;
    let catalog = SpeciesCatalog::load(&config.catalog.species_info)
        .map_err(|e| startup_error("Failed to load species info", e))?;
    let provider = RemoteModelProvider::new(&config.inference, class_index)
        .map_err(|e| startup_error("Failed to create inference provider", e))?;

    let mut uploads_dir = None;
    let image_store: Arc<dyn ImageStore> = match &config.storage.images {
        ImageStorageConfig::Local { dir } => {
            let store = LocalImageStore::new(dir.clone(), &config.server.base_url)
                .map_err(|e| startup_error("Failed to prepare uploads directory", e))?;
            uploads_dir = Some(store.dir().clone());
            log::info!("Storing uploads in {}", dir.display());
            Arc::new(store)
        }
        ImageStorageConfig::S3 { bucket } => {
            log::info!("Storing uploads in S3 bucket {}", bucket);
            let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
            Arc::new(S3ImageStore::new(
                S3Client::new(&aws),
                bucket.clone(),
                config.server.max_upload_bytes,
            ))
        }
    };

    let sink: Arc<dyn RecordSink> = match &config.storage.records {
        RecordStorageConfig::Jsonl { path } => {
            log::info!("Appending feedback records to {}", path.display());
            Arc::new(JsonLinesSink::new(path.clone()))
        }
        RecordStorageConfig::Dynamodb {
            feedback_table,
            quiz_table,
        } => {
            let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
            let sink = DynamoDbSink::new(
                DynamoDbClient::new(&aws),
                feedback_table.clone(),
                quiz_table.clone(),
            );
            sink.verify_tables()
                .await
                .map_err(|e| startup_error("DynamoDB tables are not usable", e))?;
            Arc::new(sink)
        }
        RecordStorageConfig::Memory => {
            log::warn!("Feedback and quiz records are kept in memory only");
            Arc::new(MemorySink::new())
        }
    };

    let classifier = web::Data::new(BatchClassifier::new(
        Arc::new(provider),
        image_store,
        catalog,
        ClassifierSettings::from(&config.inference),
    ));
    let feedback = web::Data::new(FeedbackRecorder::new(sink.clone()));
    let quiz = web::Data::new(QuizScorer::new(sink, shared::QUESTION_BANK.len()));

    let route_config = RouteConfig {
        max_upload_bytes: config.server.max_upload_bytes,
        uploads_dir,
        static_dir: config.server.static_dir.clone(),
    };

    let bind_address = format!("0.0.0.0:{}", config.server.port);
    log::info!("Starting server on {} (public URL {})", bind_address, config.server.base_url);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(classifier.clone())
            .app_data(feedback.clone())
            .app_data(quiz.clone())
            .configure(|cfg| configure_routes(cfg, route_config.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
