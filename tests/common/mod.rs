#![allow(dead_code)]

use std::io::Cursor;

use axum::body::Body;
use axum::http::{header, Request};
use image::{ImageFormat, Rgb, RgbImage};

const BOUNDARY: &str = "swifttrust-test-boundary";

pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

pub fn solid_red_png() -> Vec<u8> {
    solid_png(224, 224, [255, 0, 0])
}

/// Builds a `multipart/form-data` body with a single file field.
pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn predict_request(field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(field, "report.png", bytes)))
        .unwrap()
}

pub fn health_request() -> Request<Body> {
    Request::builder().uri("/health").body(Body::empty()).unwrap()
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
