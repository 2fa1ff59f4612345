mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use swifttrust_vision::classifier::preprocess::image_to_tensor;
use swifttrust_vision::server::{create_router, AppState};
use swifttrust_vision::{ClassifierError, ImagePredictor, ModelCharacteristics, Prediction};

use common::{
    health_request, json_body, multipart_body, multipart_content_type, predict_request, solid_red_png,
};

const LIMIT: usize = 10 * 1024 * 1024;

/// Decodes the upload like the real classifier, then returns canned scores.
struct StubPredictor {
    scores: Vec<(&'static str, f32)>,
}

impl ImagePredictor for StubPredictor {
    fn model_name(&self) -> &str {
        "StubNet"
    }

    fn predict_top(&self, image: &[u8], k: usize) -> Result<Vec<Prediction>, ClassifierError> {
        image_to_tensor(image, &ModelCharacteristics::default())?;
        Ok(self
            .scores
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, (label, confidence))| Prediction::new(i.to_string(), *label, *confidence))
            .collect())
    }
}

fn router_with(scores: Vec<(&'static str, f32)>) -> axum::Router {
    let state = AppState::new(Arc::new(StubPredictor { scores }));
    create_router(state, LIMIT)
}

fn calm_router() -> axum::Router {
    router_with(vec![
        ("tabby", 0.40),
        ("tiger_cat", 0.20),
        ("Egyptian_cat", 0.10),
        ("lynx", 0.05),
        ("Persian_cat", 0.01),
        ("tench", 0.005),
    ])
}

#[tokio::test]
async fn test_health_reports_identity() {
    let response = calm_router().oneshot(health_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "StubNet");
    assert_eq!(json["service"], "SwiftTrust Vision");
}

#[tokio::test]
async fn test_missing_image_field() {
    let response = calm_router()
        .oneshot(predict_request("photo", &solid_red_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn test_request_without_multipart_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .body(Body::empty())
        .unwrap();
    let response = calm_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn test_empty_multipart_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::empty())
        .unwrap();
    let response = calm_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn test_truncated_multipart_body() {
    let mut body = multipart_body("image", "report.png", &solid_red_png());
    body.truncate(body.len() / 2);
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap();
    let response = calm_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn test_non_image_payload_is_server_error() {
    let response = calm_router()
        .oneshot(predict_request("image", b"this is plain text, not a picture"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());
}

#[tokio::test]
async fn test_unverified_result_shape() {
    let response = calm_router()
        .oneshot(predict_request("image", &solid_red_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["verified"], false);
    assert!(json["detected_category"].is_null());
    assert_eq!(json["confidence"], 0.0);

    let detections = json["raw_detections"].as_array().unwrap();
    assert_eq!(detections.len(), 5);
    assert_eq!(detections[0]["label"], "tabby");
    let confidences: Vec<f64> = detections.iter().map(|d| d["confidence"].as_f64().unwrap()).collect();
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_verified_picks_highest_confidence_match() {
    let router = router_with(vec![
        ("tabby", 0.5),
        ("lakeside", 0.25),
        ("volcano", 0.125),
        ("revolver", 0.0625),
        ("ambulance", 0.03125),
    ]);
    let response = router.oneshot(predict_request("image", &solid_red_png())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["verified"], true);
    assert_eq!(json["detected_category"], "flood");
    assert_eq!(json["confidence"], 0.25);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let state = AppState::new(Arc::new(StubPredictor { scores: vec![] }));
    let router = create_router(state, 1024);
    let big = common::solid_png(512, 512, [1, 2, 3]);
    let payload: Vec<u8> = big.iter().chain(vec![0u8; 4096].iter()).cloned().collect();

    let response = router.oneshot(predict_request("image", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health_unaffected_by_failures() {
    let router = calm_router();
    let _ = router.clone().oneshot(predict_request("image", b"garbage")).await.unwrap();
    let _ = router.clone().oneshot(predict_request("other", b"garbage")).await.unwrap();

    let response = router.oneshot(health_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_same_image_twice_is_identical() {
    let router = calm_router();
    let first = json_body(router.clone().oneshot(predict_request("image", &solid_red_png())).await.unwrap()).await;
    let second = json_body(router.oneshot(predict_request("image", &solid_red_png())).await.unwrap()).await;
    assert_eq!(first["raw_detections"], second["raw_detections"]);
}
