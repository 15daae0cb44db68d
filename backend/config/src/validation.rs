//! Config validation: checks with field paths and user-friendly messages.

use crate::schema::{EngineKind, IntakeConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &IntakeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_upload(config, &mut report);
    validate_engine(config, &mut report);
    validate_pipeline(config, &mut report);
    report
}

fn validate_server(config: &IntakeConfig, report: &mut ValidationReport) {
    let port = config.port();
    if port == 0 {
        report.error("server.port", "Port must be > 0");
    } else if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
    if config.bind().parse::<std::net::IpAddr>().is_err() {
        report.error(
            "server.bind",
            format!("'{}' is not an IP address", config.bind()),
        );
    }
    let (max_requests, window_secs) = config.rate_limit();
    if max_requests == 0 {
        report.error("server.rateLimit.maxRequests", "maxRequests must be >= 1");
    }
    if window_secs == 0 {
        report.error("server.rateLimit.windowSecs", "windowSecs must be >= 1");
    }
}

fn validate_upload(config: &IntakeConfig, report: &mut ValidationReport) {
    if config.max_upload_bytes() == 0 {
        report.error("upload.maxBytes", "maxBytes must be > 0");
    }
}

fn validate_engine(config: &IntakeConfig, report: &mut ValidationReport) {
    let engine = config.engine.as_ref();
    match config.engine_kind() {
        EngineKind::Http => {
            let url = engine.and_then(|e| e.url.as_deref()).unwrap_or("");
            if url.is_empty() {
                report.error("engine.url", "An http engine needs a url");
            } else if !(url.starts_with("http://") || url.starts_with("https://")) {
                report.error("engine.url", format!("'{url}' is not an http(s) URL"));
            }
        }
        EngineKind::Fixture => {
            if engine.and_then(|e| e.fixture_path.as_deref()).is_none_or(str::is_empty) {
                report.error("engine.fixturePath", "A fixture engine needs a fixturePath");
            }
        }
    }
    if config.engine_timeout_ms() == 0 {
        report.error("engine.timeoutMs", "timeoutMs must be > 0");
    }
}

fn validate_pipeline(config: &IntakeConfig, report: &mut ValidationReport) {
    let budget = config.request_budget_ms();
    if budget == 0 {
        report.error("pipeline.requestBudgetMs", "requestBudgetMs must be > 0");
    } else if config.engine_timeout_ms() > budget {
        report.warn(
            "engine.timeoutMs",
            format!("timeoutMs exceeds the {budget} ms request budget; the budget will cut calls short"),
        );
    }
    let threshold = config.confidence_threshold();
    if !(0.0..=1.0).contains(&threshold) {
        report.error(
            "pipeline.confidenceThreshold",
            format!("confidenceThreshold {threshold} must be within [0, 1]"),
        );
    }
}
