//! Optical Character Recognition (OCR) adapter.
//!
//! Wraps exactly one pluggable [`OcrEngine`] and gives callers a uniform
//! contract: a hard per-call timeout, no internal retries, and regions
//! cleaned up and put into reading order when position data allows.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docintake_core::{EngineError, OcrEngine, TextRegion, UploadedImage};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct OcrAdapter {
    engine: Arc<dyn OcrEngine>,
}

impl OcrAdapter {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run the engine on one image, giving up after `timeout`.
    ///
    /// On timeout the engine future is dropped (cancelled) and
    /// [`EngineError::Timeout`] is returned.
    pub async fn extract(
        &self,
        image: &UploadedImage,
        timeout: Duration,
    ) -> Result<Vec<TextRegion>, EngineError> {
        let start = Instant::now();
        debug!(
            engine = self.engine.name(),
            side = %image.side,
            bytes = image.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Running OCR"
        );

        let raw = match tokio::time::timeout(timeout, self.engine.recognize(image)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(engine = self.engine.name(), side = %image.side, "OCR call timed out");
                return Err(EngineError::Timeout);
            }
        };

        let regions = normalize_regions(raw);
        info!(
            engine = self.engine.name(),
            side = %image.side,
            regions = regions.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "OCR complete"
        );
        Ok(regions)
    }
}

/// Collapse whitespace, drop empty regions, and order by reading position.
///
/// Ordering only happens when every region carries a bounding box;
/// otherwise the engine's order is kept.
pub fn normalize_regions(regions: Vec<TextRegion>) -> Vec<TextRegion> {
    let mut regions: Vec<TextRegion> = regions
        .into_iter()
        .filter_map(|mut region| {
            region.text = collapse_whitespace(&region.text);
            (!region.text.is_empty()).then_some(region)
        })
        .collect();

    if regions.iter().all(|r| r.bbox.is_some()) {
        regions = reading_order(regions);
    }
    regions
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Top-to-bottom lines, left-to-right within a line.
///
/// Two regions share a line when their vertical centres are closer than
/// half the line's first region height.
fn reading_order(mut regions: Vec<TextRegion>) -> Vec<TextRegion> {
    let center = |r: &TextRegion| r.bbox.map(|b| b.center_y()).unwrap_or(0.0);
    let left = |r: &TextRegion| r.bbox.map(|b| b.x).unwrap_or(0.0);

    regions.sort_by(|a, b| center(a).partial_cmp(&center(b)).unwrap_or(Ordering::Equal));

    let mut lines: Vec<Vec<TextRegion>> = Vec::new();
    for region in regions {
        let joins_last = lines.last().and_then(|line| line.first()).is_some_and(|first| {
            let tolerance = first.bbox.map(|b| (b.height / 2.0).max(1.0)).unwrap_or(1.0);
            (center(&region) - center(first)).abs() <= tolerance
        });
        match lines.last_mut() {
            Some(line) if joins_last => line.push(region),
            _ => lines.push(vec![region]),
        }
    }

    lines
        .into_iter()
        .flat_map(|mut line| {
            line.sort_by(|a, b| left(a).partial_cmp(&left(b)).unwrap_or(Ordering::Equal));
            line
        })
        .collect()
}
