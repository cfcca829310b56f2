/// HTTP API для моделей

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::dataset::DatasetKind;
use crate::error::HealthError;
use crate::models::Pipeline;
use crate::types::{DiabetesInput, HeartDiseaseInput, PredictionResponse};

#[derive(Clone)]
pub struct AppState {
    pub heart_disease: Arc<Pipeline>,
    pub diabetes: Arc<Pipeline>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        let pipeline = |kind| {
            Arc::new(Pipeline::new(
                kind,
                config.pipeline(kind).clone(),
                config.training.clone(),
            ))
        };
        Self {
            heart_disease: pipeline(DatasetKind::HeartDisease),
            diabetes: pipeline(DatasetKind::Diabetes),
        }
    }

    pub fn pipeline(&self, kind: DatasetKind) -> Arc<Pipeline> {
        match kind {
            DatasetKind::HeartDisease => self.heart_disease.clone(),
            DatasetKind::Diabetes => self.diabetes.clone(),
        }
    }
}

pub struct ApiError(HealthError);

impl From<HealthError> for ApiError {
    fn from(error: HealthError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            HealthError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("Request failed: {}", self.0);
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/predict/heart-disease", post(predict_heart_disease))
        .route("/api/predict/diabetes", post(predict_diabetes))
        .route("/predict/heart-disease", post(predict_heart_disease_form))
        .route("/predict/diabetes", post(predict_diabetes_form))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Health ML API (Rust)",
        "version": env!("CARGO_PKG_VERSION"),
        "models": DatasetKind::ALL.iter().map(|k| k.name()).collect::<Vec<_>>(),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn predict_heart_disease(
    State(state): State<AppState>,
    Json(input): Json<HeartDiseaseInput>,
) -> Result<Json<PredictionResponse>, ApiError> {
    tracing::info!("Heart disease prediction request");
    run_prediction(state.heart_disease, input.to_row()).await.map(Json)
}

async fn predict_diabetes(
    State(state): State<AppState>,
    Json(input): Json<DiabetesInput>,
) -> Result<Json<PredictionResponse>, ApiError> {
    tracing::info!("Diabetes prediction request");
    run_prediction(state.diabetes, input.to_row()).await.map(Json)
}

async fn predict_heart_disease_form(
    State(state): State<AppState>,
    Form(input): Form<HeartDiseaseInput>,
) -> Result<Json<PredictionResponse>, ApiError> {
    tracing::info!("Heart disease prediction request (form)");
    run_prediction(state.heart_disease, input.to_row()).await.map(Json)
}

async fn predict_diabetes_form(
    State(state): State<AppState>,
    Form(input): Form<DiabetesInput>,
) -> Result<Json<PredictionResponse>, ApiError> {
    tracing::info!("Diabetes prediction request (form)");
    run_prediction(state.diabetes, input.to_row()).await.map(Json)
}

/// Обучение при холодном старте может занять время, поэтому blocking-пул
async fn run_prediction(pipeline: Arc<Pipeline>, row: Vec<f64>) -> Result<PredictionResponse, ApiError> {
    let kind = pipeline.kind();
    let result = tokio::task::spawn_blocking(move || pipeline.predict(&row))
        .await
        .map_err(|e| HealthError::Model(format!("Prediction task failed: {e}")))??;
    Ok(PredictionResponse::new(kind, result))
}
