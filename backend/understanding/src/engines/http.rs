//! Remote OCR engine reached over HTTP.
//!
//! Posts the image as multipart (`image` part plus a `side` hint) and
//! expects a JSON body listing text boxes:
//!
//! ```json
//! { "regions": [ { "text": "DOB: 12/08/1990", "confidence": 0.94,
//!                  "box": [[10,60],[130,60],[130,80],[10,80]] } ] }
//! ```
//!
//! `boxes` is accepted for `regions` and `score` for `confidence`.

use std::time::Instant;

use async_trait::async_trait;
use docintake_core::{BoundingBox, EngineError, OcrEngine, TextRegion, UploadedImage};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

pub struct HttpOcrEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOcrEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Deserialize)]
struct EngineResponse {
    #[serde(alias = "boxes")]
    regions: Vec<WireRegion>,
}

#[derive(Deserialize)]
struct WireRegion {
    text: String,
    #[serde(alias = "score")]
    confidence: f32,
    /// Corner points `[[x, y], ...]`.
    #[serde(default, rename = "box")]
    polygon: Option<Vec<[f32; 2]>>,
}

impl WireRegion {
    fn into_region(self) -> TextRegion {
        let bbox = self.polygon.as_deref().and_then(polygon_bounds);
        TextRegion {
            text: self.text,
            confidence: self.confidence.into(),
            bbox,
        }
    }
}

/// Smallest axis-aligned box containing every corner point.
fn polygon_bounds(points: &[[f32; 2]]) -> Option<BoundingBox> {
    if points.is_empty() {
        return None;
    }
    let (mut x_min, mut y_min) = (f32::INFINITY, f32::INFINITY);
    let (mut x_max, mut y_max) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for [x, y] in points {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    Some(BoundingBox {
        x: x_min,
        y: y_min,
        width: x_max - x_min,
        height: y_max - y_min,
    })
}

fn classify_status(status: StatusCode, body: &str) -> EngineError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        EngineError::Unavailable(format!("engine answered {status}"))
    } else {
        EngineError::Rejected(format!("engine answered {status}: {}", truncate(body, 200)))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn recognize(&self, image: &UploadedImage) -> Result<Vec<TextRegion>, EngineError> {
        let start = Instant::now();

        let part = Part::stream_with_length(image.data.clone(), image.len() as u64)
            .file_name(format!("{}.img", image.side))
            .mime_str(&image.content_type)
            .map_err(|e| EngineError::Rejected(format!("invalid content type: {e}")))?;
        let form = Form::new()
            .part("image", part)
            .text("side", image.side.to_string());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(|e| {
            warn!(endpoint = %self.endpoint, error = %e, "OCR engine request failed");
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::Unavailable(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: EngineResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Malformed(e.to_string()))?;

        debug!(
            side = %image.side,
            regions = parsed.regions.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "OCR engine responded"
        );
        Ok(parsed.regions.into_iter().map(WireRegion::into_region).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_regions_with_aliases() {
        let body = r#"{"boxes":[{"text":"MALE","score":1.4,"box":[[10,40],[50,40],[50,52],[10,52]]}]}"#;
        let parsed: EngineResponse = serde_json::from_str(body).unwrap();
        let region = parsed.regions.into_iter().next().unwrap().into_region();
        assert_eq!(region.text, "MALE");
        assert_eq!(region.confidence.value(), 1.0);
        let bbox = region.bbox.unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (10.0, 40.0, 40.0, 12.0));
    }

    #[test]
    fn region_without_box_has_no_position() {
        let body = r#"{"regions":[{"text":"Asha Rao","confidence":0.9}]}"#;
        let parsed: EngineResponse = serde_json::from_str(body).unwrap();
        let region = parsed.regions.into_iter().next().unwrap().into_region();
        assert!(region.bbox.is_none());
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            EngineError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            EngineError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad image"),
            EngineError::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments.
        let engine = HttpOcrEngine::new("http://127.0.0.1:9/ocr");
        let image = UploadedImage::new(docintake_core::Side::Front, "image/png", vec![0x89, b'P']);
        let err = engine.recognize(&image).await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
    }
}
