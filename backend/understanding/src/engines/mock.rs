use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use docintake_core::{EngineError, OcrEngine, Side, TextRegion, UploadedImage};
use serde::Deserialize;
use tracing::info;

/// An engine that returns canned regions per side.
///
/// Used by tests and for offline demos via a fixture file. Delays and
/// failures can be scripted per side.
pub struct MockOcrEngine {
    name: String,
    scripts: HashMap<Side, Script>,
    calls: Mutex<HashMap<Side, usize>>,
}

#[derive(Default)]
struct Script {
    regions: Vec<TextRegion>,
    delay: Option<Duration>,
    failure: Option<EngineError>,
    /// Fail only this many calls, then succeed. `None` fails every call.
    failing_calls: Option<usize>,
}

/// On-disk fixture: regions for each side.
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    front: Vec<TextRegion>,
    #[serde(default)]
    back: Vec<TextRegion>,
}

impl MockOcrEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Load `{ "front": [regions], "back": [regions] }` from a JSON file.
    pub async fn from_fixture_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read OCR fixture: {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse OCR fixture: {}", path.display()))?;

        info!(
            path = %path.display(),
            front = fixture.front.len(),
            back = fixture.back.len(),
            "Loaded OCR fixture"
        );
        Ok(Self::new("fixture")
            .with_regions(Side::Front, fixture.front)
            .with_regions(Side::Back, fixture.back))
    }

    pub fn with_regions(mut self, side: Side, regions: Vec<TextRegion>) -> Self {
        self.scripts.entry(side).or_default().regions = regions;
        self
    }

    pub fn with_delay(mut self, side: Side, delay: Duration) -> Self {
        self.scripts.entry(side).or_default().delay = Some(delay);
        self
    }

    /// Fail every call for this side.
    pub fn with_failure(mut self, side: Side, error: EngineError) -> Self {
        let script = self.scripts.entry(side).or_default();
        script.failure = Some(error);
        script.failing_calls = None;
        self
    }

    /// Fail the first `times` calls for this side, then succeed.
    pub fn with_transient_failure(mut self, side: Side, error: EngineError, times: usize) -> Self {
        let script = self.scripts.entry(side).or_default();
        script.failure = Some(error);
        script.failing_calls = Some(times);
        self
    }

    /// Number of `recognize` calls made for a side so far.
    pub fn calls(&self, side: Side) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&side).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record_call(&self, side: Side) -> usize {
        match self.calls.lock() {
            Ok(mut calls) => {
                let count = calls.entry(side).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn recognize(&self, image: &UploadedImage) -> Result<Vec<TextRegion>, EngineError> {
        let call = self.record_call(image.side);
        let Some(script) = self.scripts.get(&image.side) else {
            return Ok(Vec::new());
        };

        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &script.failure {
            let still_failing = script.failing_calls.is_none_or(|limit| call <= limit);
            if still_failing {
                return Err(error.clone());
            }
        }

        Ok(script.regions.clone())
    }
}
