//! Intake service configuration schema.
//!
//! Every section and field is optional in the file; `apply_all_defaults`
//! fills the gaps and the accessors below fall back to the same defaults.

use serde::{Deserialize, Serialize};

use crate::defaults::*;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeConfig {
    /// HTTP listener, CORS, auth and rate limiting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Upload limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadConfig>,

    /// OCR engine selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,

    /// Deadlines, retries and extraction policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Allowed browser origins; empty means any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors_origins: Vec<String>,
    /// When set, callers must present this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// Per-image limit in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Remote OCR service reached over HTTP.
    #[default]
    Http,
    /// Canned regions loaded from a JSON file.
    Fixture,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EngineKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Cap on a single engine call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Whole-request deadline shared by both sides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_budget_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_checksum: Option<bool>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling NDJSON files; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

// ---------------------------------------------------------------------------
// Effective values
// ---------------------------------------------------------------------------

impl IntakeConfig {
    pub fn bind(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn cors_origins(&self) -> &[String] {
        self.server.as_ref().map(|s| s.cors_origins.as_slice()).unwrap_or(&[])
    }

    pub fn api_key(&self) -> Option<&str> {
        self.server
            .as_ref()
            .and_then(|s| s.api_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    pub fn rate_limit(&self) -> (u32, u64) {
        let rl = self.server.as_ref().and_then(|s| s.rate_limit.as_ref());
        (
            rl.and_then(|r| r.max_requests).unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
            rl.and_then(|r| r.window_secs).unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        )
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.upload
            .as_ref()
            .and_then(|u| u.max_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.as_ref().and_then(|e| e.kind).unwrap_or_default()
    }

    pub fn engine_timeout_ms(&self) -> u64 {
        self.engine
            .as_ref()
            .and_then(|e| e.timeout_ms)
            .unwrap_or(DEFAULT_ENGINE_TIMEOUT_MS)
    }

    pub fn request_budget_ms(&self) -> u64 {
        self.pipeline
            .as_ref()
            .and_then(|p| p.request_budget_ms)
            .unwrap_or(DEFAULT_REQUEST_BUDGET_MS)
    }

    pub fn max_retries(&self) -> u32 {
        self.pipeline
            .as_ref()
            .and_then(|p| p.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn retry_backoff_ms(&self) -> u64 {
        self.pipeline
            .as_ref()
            .and_then(|p| p.retry_backoff_ms)
            .unwrap_or(DEFAULT_RETRY_BACKOFF_MS)
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.pipeline
            .as_ref()
            .and_then(|p| p.confidence_threshold)
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    pub fn verify_checksum(&self) -> bool {
        self.pipeline
            .as_ref()
            .and_then(|p| p.verify_checksum)
            .unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}
