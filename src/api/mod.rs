use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::answer::{AnswerResponse, Candidate};
use crate::document::DocumentError;
use crate::pipeline::{IngestReport, PipelineError, QaPipeline};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<QaPipeline>,
}

#[derive(Deserialize, Validate)]
pub struct DocumentRequest {
    /// Local file path. Exactly one of path or url must be set.
    pub path: Option<String>,
    /// Remote document URL.
    #[validate(url)]
    pub url: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    pub top_k: Option<usize>,
}

#[derive(Deserialize, Validate)]
pub struct BulkRequest {
    #[validate(length(min = 1, max = 50))]
    pub questions: Vec<String>,
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub source: String,
    pub text: String,
    pub characters: usize,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub candidates: Vec<Candidate>,
}

#[derive(Serialize)]
pub struct BulkAnswer {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct BulkResponse {
    pub answers: Vec<BulkAnswer>,
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse { status: message })).into_response()
}

fn pipeline_error_response(e: PipelineError) -> Response {
    let status = match &e {
        PipelineError::Document(DocumentError::UnsupportedFormat(_))
        | PipelineError::Document(DocumentError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
        PipelineError::Document(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::EmptyDocument | PipelineError::NoChunks => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    log::error!("Request failed: {}", e);
    error_response(status, e.to_string())
}

/// Create and configure the API router.
pub fn create_api(pipeline: Arc<QaPipeline>) -> Router {
    let state = AppState { pipeline };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .route("/extract", post(extract_handler))
        .route("/vectorize", post(vectorize_handler))
        .route("/query", post(query_handler))
        .route("/answer", post(answer_handler))
        .route("/bulk", post(bulk_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Response {
    Json(ApiResponse {
        status: "Server is running and healthy".to_string(),
    })
    .into_response()
}

async fn extract_handler(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    let path = match &request.path {
        Some(path) => PathBuf::from(path),
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "path is required for extraction".to_string(),
            )
        }
    };

    match state.pipeline.extract(&path).await {
        Ok(text) => Json(ExtractResponse {
            source: path.display().to_string(),
            characters: text.chars().count(),
            text,
        })
        .into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

async fn vectorize_handler(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let result: Result<IngestReport, PipelineError> = match (&request.path, &request.url) {
        (Some(path), None) => state.pipeline.process_document(&PathBuf::from(path)).await,
        (None, Some(url)) => state.pipeline.process_url(url).await,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "exactly one of path or url is required".to_string(),
            )
        }
    };

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state.pipeline.query(&request.question, request.top_k).await {
        Ok(candidates) => Json(QueryResponse {
            question: request.question,
            candidates,
        })
        .into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

async fn answer_handler(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state
        .pipeline
        .answer_question(&request.question, request.top_k)
        .await
    {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

async fn bulk_handler(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let results = state
        .pipeline
        .answer_all(&request.questions, request.top_k)
        .await;

    let answers = request
        .questions
        .into_iter()
        .zip(results)
        .map(|(question, result)| match result {
            Ok(answer) => BulkAnswer {
                question,
                answer: Some(answer),
                error: None,
            },
            Err(e) => BulkAnswer {
                question,
                answer: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Json(BulkResponse { answers }).into_response()
}
