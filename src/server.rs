//! HTTP front end: `POST /predict` and `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use crate::engine::Predictor;
use crate::error::{InferenceError, PredictError};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub fen: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub mv: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub vocabulary_size: usize,
    pub backend: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Body missing, not JSON, or without a `fen` string
    BadRequest(String),
    Predict(PredictError),
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        ApiError::Predict(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Predict(PredictError::InvalidPosition(_)) => StatusCode::BAD_REQUEST,
            ApiError::Predict(PredictError::NoLegalMove(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Predict(PredictError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(detail) => ErrorResponse {
                error: "invalid_request".to_string(),
                detail: detail.clone(),
            },
            ApiError::Predict(e) => ErrorResponse {
                error: e.kind().to_string(),
                detail: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "prediction failed");
        } else {
            warn!(error = ?self, "rejected request");
        }
        (status, Json(self.body())).into_response()
    }
}

async fn predict_move(
    State(predictor): State<Arc<Predictor>>,
    request: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    let Json(MoveRequest { fen }) = request.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    // Inference blocks; keep it off the async workers
    let selected = tokio::task::spawn_blocking(move || predictor.predict(&fen))
        .await
        .map_err(|e| PredictError::from(InferenceError::Backend(format!("prediction task failed: {}", e))))??;

    Ok(Json(MoveResponse { mv: selected.mv }))
}

async fn health(State(predictor): State<Arc<Predictor>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        vocabulary_size: predictor.vocabulary().len(),
        backend: predictor.scorer().describe(),
    })
}

/// Any origin, method and header may call the API.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(predictor: Arc<Predictor>) -> Router {
    Router::new()
        .route("/predict", post(predict_move))
        .route("/health", get(health))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(predictor)
}

pub async fn serve(address: SocketAddr, predictor: Arc<Predictor>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, router(predictor))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
