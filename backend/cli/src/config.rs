//! Turns a prepared `IntakeConfig` into running components.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use docintake_config::{
    config_dir, config_file_path, load_and_prepare, load_resolved, EngineKind, IntakeConfig,
};
use docintake_core::OcrEngine;
use docintake_gateway::GatewayOptions;
use docintake_media::ImageValidator;
use docintake_pipeline::{IntakeOrchestrator, PipelinePolicy, ResultAggregator};
use docintake_understanding::{FieldExtractor, HttpOcrEngine, MockOcrEngine, OcrAdapter};
use tracing::info;

fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path(&config_dir()),
    }
}

/// Resolve the config path (`--config` wins over the default location)
/// and load it, failing on any validation error.
pub async fn load(explicit: Option<&Path>) -> Result<IntakeConfig> {
    load_and_prepare(&config_path(explicit)).await
}

/// Load without validation, for commands that never build the pipeline.
pub async fn load_lenient(explicit: Option<&Path>) -> Result<IntakeConfig> {
    load_resolved(&config_path(explicit)).await
}

pub fn status_port(config: &IntakeConfig, port: Option<u16>) -> u16 {
    port.unwrap_or_else(|| config.port())
}

pub fn listen_addr(config: &IntakeConfig, port: Option<u16>) -> Result<SocketAddr> {
    let port = port.unwrap_or_else(|| config.port());
    format!("{}:{}", config.bind(), port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.bind(), port))
}

pub fn policy(config: &IntakeConfig) -> PipelinePolicy {
    PipelinePolicy {
        request_budget: Duration::from_millis(config.request_budget_ms()),
        engine_timeout: Duration::from_millis(config.engine_timeout_ms()),
        max_retries: config.max_retries(),
        retry_backoff: Duration::from_millis(config.retry_backoff_ms()),
    }
}

pub fn gateway_options(config: &IntakeConfig) -> GatewayOptions {
    let (max_requests, window_secs) = config.rate_limit();
    GatewayOptions {
        api_key: config.api_key().map(str::to_string),
        cors_origins: config.cors_origins().to_vec(),
        rate_limit_max_requests: max_requests,
        rate_limit_window: Duration::from_secs(window_secs),
    }
}

async fn build_engine(config: &IntakeConfig) -> Result<Arc<dyn OcrEngine>> {
    let section = config.engine.clone().unwrap_or_default();
    match config.engine_kind() {
        EngineKind::Http => {
            let Some(url) = section.url.filter(|u| !u.trim().is_empty()) else {
                bail!("engine.url is required for the http engine");
            };
            let mut engine = HttpOcrEngine::new(url.clone());
            if let Some(key) = section.api_key.filter(|k| !k.is_empty()) {
                engine = engine.with_api_key(key);
            }
            info!(url = %url, "Using HTTP OCR engine");
            Ok(Arc::new(engine))
        }
        EngineKind::Fixture => {
            let Some(path) = section.fixture_path else {
                bail!("engine.fixturePath is required for the fixture engine");
            };
            let engine = MockOcrEngine::from_fixture_file(Path::new(&path)).await?;
            Ok(Arc::new(engine))
        }
    }
}

pub async fn build_orchestrator(config: &IntakeConfig) -> Result<IntakeOrchestrator> {
    let engine = build_engine(config).await?;
    Ok(IntakeOrchestrator::new(
        ImageValidator::new(config.max_upload_bytes()),
        OcrAdapter::new(engine),
        FieldExtractor::new(config.verify_checksum()),
        ResultAggregator::new(config.confidence_threshold()),
        policy(config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintake_config::parse_config;

    #[test]
    fn policy_and_options_follow_config() {
        let config = parse_config(
            r#"
server:
  apiKey: secret
  rateLimit:
    maxRequests: 5
    windowSecs: 10
engine:
  timeoutMs: 2000
pipeline:
  requestBudgetMs: 4000
  maxRetries: 0
"#,
        )
        .unwrap();

        let policy = policy(&config);
        assert_eq!(policy.request_budget, Duration::from_millis(4000));
        assert_eq!(policy.engine_timeout, Duration::from_millis(2000));
        assert_eq!(policy.max_retries, 0);

        let options = gateway_options(&config);
        assert_eq!(options.api_key.as_deref(), Some("secret"));
        assert_eq!(options.rate_limit_max_requests, 5);
        assert_eq!(options.rate_limit_window, Duration::from_secs(10));
    }

    #[test]
    fn listen_addr_prefers_flag() {
        let config = parse_config("server:\n  bind: 127.0.0.1\n  port: 4000\n").unwrap();
        assert_eq!(listen_addr(&config, None).unwrap().port(), 4000);
        assert_eq!(listen_addr(&config, Some(5000)).unwrap().port(), 5000);
    }

    #[tokio::test]
    async fn status_config_loads_without_an_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = load_lenient(Some(&path)).await.unwrap();
        assert_eq!(status_port(&config, None), config.port());
        assert_eq!(status_port(&IntakeConfig::default(), Some(4100)), 4100);

        let err = load(Some(&path)).await.err().unwrap();
        assert!(err.to_string().contains("engine.url"));
    }

    #[tokio::test]
    async fn http_engine_needs_url() {
        let config = parse_config("engine:\n  kind: http\n").unwrap();
        let err = build_orchestrator(&config).await.err().unwrap();
        assert!(err.to_string().contains("engine.url"));
    }

    #[tokio::test]
    async fn fixture_engine_is_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("card.json");
        std::fs::write(
            &fixture,
            r#"{"front":[{"text":"Asha Rao","confidence":0.9}],"back":[]}"#,
        )
        .unwrap();
        let config = parse_config(&format!(
            "engine:\n  kind: fixture\n  fixturePath: {}\n",
            fixture.display()
        ))
        .unwrap();

        let orchestrator = build_orchestrator(&config).await.unwrap();
        assert_eq!(orchestrator.engine_name(), "fixture");
    }
}
