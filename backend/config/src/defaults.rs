//! Config defaults: fills every unset value so a prepared config is explicit.

use crate::schema::{
    EngineConfig, IntakeConfig, LoggingConfig, PipelineConfig, RateLimitConfig, ServerConfig,
    UploadConfig,
};

pub const DEFAULT_BIND: &str = "0.0.0.0";

/// The port the browser form posts to.
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// 5 MiB per image.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_ENGINE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_BUDGET_MS: u64 = 15_000;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: IntakeConfig) -> IntakeConfig {
    let config = apply_server_defaults(config);
    let config = apply_upload_defaults(config);
    let config = apply_engine_defaults(config);
    let config = apply_pipeline_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: IntakeConfig) -> IntakeConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);

    let rate_limit = server.rate_limit.get_or_insert_with(RateLimitConfig::default);
    rate_limit.max_requests.get_or_insert(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    rate_limit.window_secs.get_or_insert(DEFAULT_RATE_LIMIT_WINDOW_SECS);
    config
}

fn apply_upload_defaults(mut config: IntakeConfig) -> IntakeConfig {
    let upload = config.upload.get_or_insert_with(UploadConfig::default);
    upload.max_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
}

fn apply_engine_defaults(mut config: IntakeConfig) -> IntakeConfig {
    let engine = config.engine.get_or_insert_with(EngineConfig::default);
    engine.kind.get_or_insert_with(Default::default);
    engine.timeout_ms.get_or_insert(DEFAULT_ENGINE_TIMEOUT_MS);
    config
}

fn apply_pipeline_defaults(mut config: IntakeConfig) -> IntakeConfig {
    let pipeline = config.pipeline.get_or_insert_with(PipelineConfig::default);
    pipeline.request_budget_ms.get_or_insert(DEFAULT_REQUEST_BUDGET_MS);
    pipeline.max_retries.get_or_insert(DEFAULT_MAX_RETRIES);
    pipeline.retry_backoff_ms.get_or_insert(DEFAULT_RETRY_BACKOFF_MS);
    pipeline.confidence_threshold.get_or_insert(DEFAULT_CONFIDENCE_THRESHOLD);
    pipeline.verify_checksum.get_or_insert(true);
    config
}

fn apply_logging_defaults(mut config: IntakeConfig) -> IntakeConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}
