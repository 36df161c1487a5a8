use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use log::{error, info, warn};
use serde::Deserialize;
use shared::{
    ClassificationResult, ErrorResponse, FeedbackSubmission, MessageResponse, QUESTION_BANK,
    QuizAttempt, SingleClassification,
};
use std::path::PathBuf;

use crate::classifier::{BatchClassifier, BatchError};
use crate::feedback::{FeedbackError, FeedbackRecorder, split_submission};
use crate::quiz::{QuizError, QuizScorer};
use crate::upload::{UploadError, read_upload};

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub max_upload_bytes: usize,
    pub uploads_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("{0}")]
    Classification(String),
}

impl ApiError {
    fn client_message(&self) -> String {
        match self {
            ApiError::Batch(_) => {
                "The classifier is currently unavailable. Please try again later.".to_string()
            }
            ApiError::Feedback(FeedbackError::Sink(_)) => "Feedback was not recorded".to_string(),
            ApiError::Quiz(QuizError::Sink(_)) => "Quiz result was not recorded".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upload(UploadError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Batch(BatchError::ProviderUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Feedback(FeedbackError::Sink(_)) | ApiError::Quiz(QuizError::Sink(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Feedback(_) | ApiError::Quiz(_) | ApiError::Classification(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.client_message(),
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, routes: RouteConfig) {
    cfg.app_data(web::Data::new(routes.clone()))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/classify").route(web::post().to(classify_single)))
        .service(web::resource("/feedback").route(web::post().to(submit_feedback)))
        .service(web::resource("/api/quiz-result").route(web::post().to(quiz_result)))
        .service(web::resource("/api/quiz/questions").route(web::get().to(quiz_questions)))
        .service(web::resource("/health").route(web::get().to(health)));

    if let Some(uploads_dir) = routes.uploads_dir {
        cfg.service(Files::new("/uploads", uploads_dir));
    }
    if let Some(static_dir) = routes.static_dir {
        cfg.service(Files::new("/static", static_dir).show_files_listing());
    }
}

async fn predict(
    classifier: web::Data<BatchClassifier>,
    routes: web::Data<RouteConfig>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_upload(payload, "files", routes.max_upload_bytes).await?;
    info!("Received {} file(s) for prediction", form.images.len());

    let results = classifier.classify(&form.images, form.top_n).await?;
    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        warn!("{} of {} file(s) failed to classify", failed, results.len());
    }
    Ok(HttpResponse::Ok().json(results))
}

async fn classify_single(
    classifier: web::Data<BatchClassifier>,
    routes: web::Data<RouteConfig>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = read_upload(payload, "file", routes.max_upload_bytes).await?;
    form.images.truncate(1);

    let result = classifier
        .classify(&form.images, None)
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::Upload(UploadError::NoFiles))?;
    match result {
        ClassificationResult::Success(prediction) => {
            Ok(HttpResponse::Ok().json(SingleClassification::from(&prediction)))
        }
        ClassificationResult::Failure(failure) => Err(ApiError::Classification(failure.error)),
    }
}

async fn submit_feedback(
    recorder: web::Data<FeedbackRecorder>,
    body: web::Json<FeedbackSubmission>,
) -> Result<HttpResponse, ApiError> {
    let (intent, prediction) = split_submission(body.into_inner());
    recorder.record(intent, &prediction).await.map_err(|e| {
        match &e {
            FeedbackError::Sink(_) => error!("{}", e),
            _ => warn!("Feedback rejected: {}", e),
        }
        e
    })?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Feedback received successfully!".to_string(),
    }))
}

#[derive(Deserialize)]
struct QuizResultBody {
    score: i64,
    total: i64,
}

async fn quiz_result(
    scorer: web::Data<QuizScorer>,
    body: web::Json<QuizResultBody>,
) -> Result<HttpResponse, ApiError> {
    let QuizResultBody { score, total } = body.into_inner();
    scorer.record(QuizAttempt { score, total }).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Score received!".to_string(),
    }))
}

async fn quiz_questions() -> HttpResponse {
    HttpResponse::Ok().json(QUESTION_BANK)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
