use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::Side;

/// Why an uploaded image was refused before any OCR work ran.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum RejectionReason {
    #[error("unsupported content type '{declared}'")]
    UnsupportedType { declared: String },

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("image bytes are corrupt or do not match the declared type")]
    CorruptOrMismatchedSignature,

    /// The request carried no image for this side.
    #[error("image is missing")]
    Missing,
}

impl RejectionReason {
    /// Message suitable for the person who picked the file.
    pub fn user_message(&self) -> String {
        match self {
            RejectionReason::UnsupportedType { .. } => {
                "Invalid file type. Please upload JPG, JPEG, or PNG files only.".to_string()
            }
            RejectionReason::TooLarge { limit, .. } => format!(
                "File size exceeds {}. Please upload a smaller file.",
                describe_size(*limit)
            ),
            RejectionReason::CorruptOrMismatchedSignature => {
                "The file is not a valid JPG or PNG image.".to_string()
            }
            RejectionReason::Missing => "Both front and back images are required.".to_string(),
        }
    }
}

/// `5242880` -> `5MB`, `1536` -> `1.5KB`, small values in bytes.
pub fn describe_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    match bytes {
        b if b >= MB && b % MB == 0 => format!("{}MB", b / MB),
        b if b >= MB => format!("{:.1}MB", b as f64 / MB as f64),
        b if b >= KB && b % KB == 0 => format!("{}KB", b / KB),
        b if b >= KB => format!("{:.1}KB", b as f64 / KB as f64),
        b => format!("{b} bytes"),
    }
}

/// A rejection tied to the side it was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub side: Side,
    #[serde(flatten)]
    pub reason: RejectionReason,
}

impl ValidationIssue {
    pub fn new(side: Side, reason: RejectionReason) -> Self {
        Self { side, reason }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} image: {}", self.side.label(), self.reason)
    }
}

/// Failure of a single OCR engine call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("OCR engine call timed out")]
    Timeout,

    #[error("OCR engine rejected the image: {0}")]
    Rejected(String),

    #[error("OCR engine returned a malformed response: {0}")]
    Malformed(String),
}

impl EngineError {
    /// Only outages are worth another attempt within the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_))
    }
}

/// Request-level failure surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntakeError {
    #[error("validation failed: {}", join_issues(.0))]
    ValidationFailed(Vec<ValidationIssue>),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("request budget exceeded")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    /// Stable identifier for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::ValidationFailed(_) => "validation_failed",
            IntakeError::EngineUnavailable(_) => "engine_unavailable",
            IntakeError::Timeout => "timeout",
            IntakeError::Internal(_) => "internal_error",
        }
    }

    /// Whether any rejected part was over the size limit.
    pub fn exceeds_size_limit(&self) -> bool {
        match self {
            IntakeError::ValidationFailed(issues) => issues
                .iter()
                .any(|issue| matches!(issue.reason, RejectionReason::TooLarge { .. })),
            _ => false,
        }
    }

    /// One concise message for the caller. Never includes internal causes.
    pub fn user_message(&self) -> String {
        match self {
            IntakeError::ValidationFailed(issues) => issues
                .iter()
                .map(|issue| format!("{} image: {}", issue.side.label(), issue.reason.user_message()))
                .collect::<Vec<_>>()
                .join(" "),
            IntakeError::EngineUnavailable(_) => {
                "OCR service is temporarily unavailable. Please try again later.".to_string()
            }
            IntakeError::Timeout => {
                "Processing took too long. Please try again with clearer images.".to_string()
            }
            IntakeError::Internal(_) => "Server error. Please try again later.".to_string(),
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_reports_every_side() {
        let err = IntakeError::ValidationFailed(vec![
            ValidationIssue::new(Side::Front, RejectionReason::UnsupportedType { declared: "image/gif".into() }),
            ValidationIssue::new(Side::Back, RejectionReason::TooLarge { size: 6_000_000, limit: 5_242_880 }),
        ]);
        let msg = err.user_message();
        assert!(msg.contains("Front image: Invalid file type"));
        assert!(msg.contains("Back image: File size exceeds 5MB"));
        assert!(err.exceeds_size_limit());
        assert!(err.to_string().contains("image/gif"));
    }

    #[test]
    fn size_message_follows_the_configured_limit() {
        let reason = RejectionReason::TooLarge { size: 3_000_000, limit: 2 * 1024 * 1024 };
        assert_eq!(reason.user_message(), "File size exceeds 2MB. Please upload a smaller file.");
        assert_eq!(describe_size(1536), "1.5KB");
        assert_eq!(describe_size(1024), "1KB");
        assert_eq!(describe_size(300), "300 bytes");
        assert_eq!(describe_size(3 * 1024 * 1024 / 2), "1.5MB");
    }

    #[test]
    fn internal_causes_stay_out_of_user_message() {
        let err = IntakeError::Internal("task panicked at src/foo.rs:12".into());
        assert!(!err.user_message().contains("panicked"));
        let err = IntakeError::EngineUnavailable("connection refused 10.0.0.4:9000".into());
        assert!(!err.user_message().contains("10.0.0.4"));
    }

    #[test]
    fn only_outages_are_retryable() {
        assert!(EngineError::Unavailable("503".into()).is_retryable());
        assert!(!EngineError::Timeout.is_retryable());
        assert!(!EngineError::Malformed("not json".into()).is_retryable());
    }
}
