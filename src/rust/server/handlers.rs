//! HTTP handlers

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use log::{debug, info, warn};
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::danger::Assessment;

/// Number of predictions returned and scanned for danger keywords
pub const TOP_K: usize = 5;

/// Multipart field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model: String,
    service: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.predictor.model_name().to_string(),
        service: state.service_name.to_string(),
    })
}

/// Returns the bytes of the first `image` field, skipping any others.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Option<Vec<u8>>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field.bytes().await?;
            debug!("Received image field: {} bytes", bytes.len());
            return Ok(Some(bytes.to_vec()));
        }
    }
    Ok(None)
}

pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Assessment>> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Rejected non-multipart request: {}", rejection);
        ApiError::MissingImage
    })?;
    let image = read_image_field(&mut multipart)
        .await?
        .ok_or(ApiError::MissingImage)?;

    let predictor = Arc::clone(&state.predictor);
    let predictions = tokio::task::spawn_blocking(move || predictor.predict_top(&image, TOP_K))
        .await
        .map_err(|e| ApiError::Internal(format!("Inference task failed: {}", e)))??;

    if let Some(top) = predictions.first() {
        info!("Top prediction: {} ({:.2}%)", top.label, top.confidence * 100.0);
    }

    let assessment = Assessment::from_predictions(predictions);
    if let Some(category) = assessment.detected_category {
        warn!("Threat detected: {} ({:.2}%)", category, assessment.confidence * 100.0);
    }

    Ok(Json(assessment))
}
