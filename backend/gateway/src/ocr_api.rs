//! `POST /api/ocr/process`: two card images in, one document record out.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docintake_core::{
    DocumentRecord, FieldName, IntakeError, RecordFields, RecordStatus, RejectionReason, Side,
    UploadedImage, ValidationIssue, Warning, describe_size,
};
use docintake_logging::{EventLogger, IntakeEvent};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::RequireApiKey;
use crate::server::GatewayState;

const FAILED_RECORD_MESSAGE: &str =
    "Could not read the name or Aadhaar number. Please upload clearer images.";

/// Response envelope shared by every outcome of the process route.
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub success: bool,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RecordFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub warnings: Vec<Warning>,
}

impl IntakeResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: RecordStatus::Failed,
            data: None,
            message: Some(message.into()),
            warnings: Vec::new(),
        }
    }

    /// Envelope and HTTP status for a pipeline outcome.
    pub fn from_outcome(outcome: Result<DocumentRecord, IntakeError>) -> (StatusCode, Self) {
        match outcome {
            Ok(record) if record.status == RecordStatus::Failed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Self {
                    success: false,
                    status: RecordStatus::Failed,
                    data: Some(record.fields),
                    message: Some(FAILED_RECORD_MESSAGE.to_string()),
                    warnings: record.warnings,
                },
            ),
            Ok(record) => (
                StatusCode::OK,
                Self {
                    success: true,
                    status: record.status,
                    data: Some(record.fields),
                    message: None,
                    warnings: record.warnings,
                },
            ),
            Err(err) => (status_for(&err), Self::failure(err.user_message())),
        }
    }
}

fn status_for(err: &IntakeError) -> StatusCode {
    match err {
        IntakeError::ValidationFailed(_) if err.exceeds_size_limit() => StatusCode::PAYLOAD_TOO_LARGE,
        IntakeError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        IntakeError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        IntakeError::EngineUnavailable(_) | IntakeError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Failures raised before the pipeline sees the request.
#[derive(Debug)]
pub enum UploadError {
    /// The body is over the gateway limit. Carries the per-image limit.
    TooLarge { limit: usize },
    /// Not a readable multipart body.
    Malformed(String),
    Intake(IntakeError),
}

impl UploadError {
    fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge { limit }
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            UploadError::TooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                IntakeResponse::failure(format!(
                    "Upload exceeds {} per image. Please upload smaller files.",
                    describe_size(limit)
                )),
            ),
            UploadError::Malformed(_) => (
                StatusCode::BAD_REQUEST,
                IntakeResponse::failure(
                    "Could not read the upload. Please submit the front and back images again.",
                ),
            ),
            UploadError::Intake(err) => IntakeResponse::from_outcome(Err(err)),
        };
        (status, Json(body)).into_response()
    }
}

/// Handler for `POST /api/ocr/process`
pub async fn process_document(
    State(state): State<GatewayState>,
    _auth: RequireApiKey,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    let max_bytes = state.orchestrator.validator().max_bytes();
    let (front, back) = match read_images(multipart, max_bytes).await {
        Ok(images) => images,
        Err(err) => {
            let reasons = match &err {
                UploadError::Intake(IntakeError::ValidationFailed(issues)) => {
                    issues.iter().map(ToString::to_string).collect()
                }
                UploadError::TooLarge { .. } => vec!["request body too large".to_string()],
                UploadError::Malformed(detail) => vec![detail.clone()],
                UploadError::Intake(other) => vec![other.to_string()],
            };
            warn!(request_id = %request_id, "Upload rejected before processing");
            EventLogger::log_event(&request_id, IntakeEvent::Rejected { reasons });
            return err.into_response();
        }
    };

    EventLogger::log_event(
        &request_id,
        IntakeEvent::Received {
            front_bytes: front.len(),
            back_bytes: back.len(),
        },
    );

    let outcome = state.orchestrator.process(front, back).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match &outcome {
        Ok(record) => {
            info!(
                request_id = %request_id,
                status = %record.status,
                latency_ms,
                "Document processed"
            );
            EventLogger::log_event(
                &request_id,
                IntakeEvent::Completed {
                    status: record.status.to_string(),
                    fields: record.fields.iter().map(|(name, _)| name.key().to_string()).collect(),
                    id_number: record
                        .get(&FieldName::AadhaarNumber)
                        .map(|field| field.value.clone()),
                    warnings: record.warnings.len(),
                    latency_ms,
                },
            );
        }
        Err(IntakeError::ValidationFailed(issues)) => {
            EventLogger::log_event(
                &request_id,
                IntakeEvent::Rejected {
                    reasons: issues.iter().map(ToString::to_string).collect(),
                },
            );
        }
        Err(err) => {
            error!(request_id = %request_id, kind = err.kind(), error = %err, "Document processing failed");
            EventLogger::log_event(
                &request_id,
                IntakeEvent::Failed {
                    kind: err.kind().to_string(),
                    error_msg: err.to_string(),
                    latency_ms,
                },
            );
        }
    }

    let (status, body) = IntakeResponse::from_outcome(outcome);
    (status, Json(body)).into_response()
}

/// Pull the `frontImage` and `backImage` parts out of the body.
/// Unknown parts are skipped; a repeated part replaces the earlier one.
async fn read_images(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<(UploadedImage, UploadedImage), UploadError> {
    let mut multipart =
        multipart.map_err(|rejection| UploadError::Malformed(rejection.body_text()))?;

    let mut images: HashMap<Side, UploadedImage> = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multipart(e, max_bytes))?
    {
        let Some(side) = field.name().and_then(Side::from_form_field) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadError::from_multipart(e, max_bytes))?;
        images.insert(side, UploadedImage::new(side, content_type, data));
    }

    match (images.remove(&Side::Front), images.remove(&Side::Back)) {
        (Some(front), Some(back)) => Ok((front, back)),
        (front, back) => {
            let issues = [(Side::Front, front.is_none()), (Side::Back, back.is_none())]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(side, _)| ValidationIssue::new(side, RejectionReason::Missing))
                .collect();
            Err(UploadError::Intake(IntakeError::ValidationFailed(issues)))
        }
    }
}
