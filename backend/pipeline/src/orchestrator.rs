use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use docintake_core::{
    DocumentRecord, EngineError, IntakeError, RecordStatus, Side, TextRegion, UploadedImage,
    ValidationIssue, Warning, WarningCode,
};
use docintake_media::ImageValidator;
use docintake_understanding::{FieldExtractor, OcrAdapter, SideExtraction};

use crate::aggregator::ResultAggregator;

/// Time and retry budget for one intake request.
#[derive(Debug, Clone)]
pub struct PipelinePolicy {
    /// Shared by both sides, retries included.
    pub request_budget: Duration,
    /// Cap on a single engine call.
    pub engine_timeout: Duration,
    /// Extra attempts for a side whose engine was unavailable.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            request_budget: Duration::from_secs(15),
            engine_timeout: Duration::from_secs(10),
            max_retries: 1,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// How one side's OCR ended when it did not produce regions.
#[derive(Debug, Clone)]
enum SideFailure {
    Engine(EngineError),
    Crashed,
}

impl SideFailure {
    /// Short description safe to show the caller.
    fn summary(&self) -> &'static str {
        match self {
            SideFailure::Engine(EngineError::Timeout) => "timed out",
            SideFailure::Engine(EngineError::Unavailable(_)) => "OCR engine unavailable",
            SideFailure::Engine(EngineError::Rejected(_)) => "rejected by the OCR engine",
            SideFailure::Engine(EngineError::Malformed(_)) => "unreadable OCR response",
            SideFailure::Crashed => "internal error",
        }
    }

    fn is_timeout(&self) -> bool {
        matches!(self, SideFailure::Engine(EngineError::Timeout))
    }

    fn is_unavailable(&self) -> bool {
        matches!(self, SideFailure::Engine(EngineError::Unavailable(_)))
    }
}

type SideOutcome = Result<Vec<TextRegion>, SideFailure>;

/// Runs one intake request end to end: validate, OCR both sides
/// concurrently under a shared deadline, extract fields, merge.
pub struct IntakeOrchestrator {
    validator: ImageValidator,
    adapter: OcrAdapter,
    extractor: FieldExtractor,
    aggregator: ResultAggregator,
    policy: PipelinePolicy,
}

impl IntakeOrchestrator {
    pub fn new(
        validator: ImageValidator,
        adapter: OcrAdapter,
        extractor: FieldExtractor,
        aggregator: ResultAggregator,
        policy: PipelinePolicy,
    ) -> Self {
        Self {
            validator,
            adapter,
            extractor,
            aggregator,
            policy,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.adapter.engine_name()
    }

    pub fn policy(&self) -> &PipelinePolicy {
        &self.policy
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    pub async fn process(
        &self,
        front: UploadedImage,
        back: UploadedImage,
    ) -> Result<DocumentRecord, IntakeError> {
        self.validate(&front, &back)?;

        let mut outcomes = self.recognize_both(front, back).await;
        let front_outcome = outcomes
            .remove(&Side::Front)
            .unwrap_or(Err(SideFailure::Engine(EngineError::Timeout)));
        let back_outcome = outcomes
            .remove(&Side::Back)
            .unwrap_or(Err(SideFailure::Engine(EngineError::Timeout)));

        if let (Err(front_err), Err(back_err)) = (&front_outcome, &back_outcome) {
            return Err(both_failed(front_err, back_err));
        }

        // Both outcomes are settled; only now do extraction and merging run.
        let mut failed = Vec::new();
        let mut extract = |side: Side, outcome: SideOutcome| match outcome {
            Ok(regions) => self.extractor.parse(&regions, side),
            Err(failure) => {
                failed.push((side, failure));
                SideExtraction::empty(side)
            }
        };
        let front_fields = extract(Side::Front, front_outcome);
        let back_fields = extract(Side::Back, back_outcome);

        let mut record = self.aggregator.merge(&front_fields, &back_fields);
        for (side, failure) in &failed {
            record.warnings.push(Warning::new(
                WarningCode::SideFailed,
                format!(
                    "{} image could not be read ({}); the record is built from the {} image only",
                    side.label(),
                    failure.summary(),
                    side.other()
                ),
            ));
        }
        if !failed.is_empty() {
            record.status = RecordStatus::Partial;
        }

        info!(
            status = %record.status,
            fields = record.fields.len(),
            warnings = record.warnings.len(),
            failed_sides = failed.len(),
            "Intake request processed"
        );
        Ok(record)
    }

    /// Check both images, reporting every problem rather than the first.
    fn validate(&self, front: &UploadedImage, back: &UploadedImage) -> Result<(), IntakeError> {
        let issues: Vec<ValidationIssue> = [front, back]
            .into_iter()
            .filter_map(|image| self.validator.validate_image(image).err())
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            for issue in &issues {
                warn!(side = %issue.side, reason = %issue.reason, "Image rejected");
            }
            Err(IntakeError::ValidationFailed(issues))
        }
    }

    /// Fork one task per side and join them against the request deadline.
    /// Sides still running at the deadline are cancelled and left out.
    async fn recognize_both(
        &self,
        front: UploadedImage,
        back: UploadedImage,
    ) -> HashMap<Side, SideOutcome> {
        let deadline = Instant::now() + self.policy.request_budget;
        let mut join_set = JoinSet::new();
        let mut task_sides = HashMap::new();

        for image in [front, back] {
            let side = image.side;
            let adapter = self.adapter.clone();
            let policy = self.policy.clone();
            let handle = join_set.spawn(async move {
                let result = extract_with_retry(&adapter, &image, &policy, deadline).await;
                (side, result)
            });
            task_sides.insert(handle.id(), side);
        }

        let mut outcomes = HashMap::new();
        loop {
            match tokio::time::timeout_at(deadline, join_set.join_next_with_id()).await {
                Ok(Some(Ok((_, (side, result))))) => {
                    if let Err(e) = &result {
                        warn!(side = %side, error = %e, "OCR failed for side");
                    }
                    outcomes.insert(side, result.map_err(SideFailure::Engine));
                }
                Ok(Some(Err(e))) => {
                    error!(error = %e, "OCR task panicked");
                    if let Some(side) = task_sides.get(&e.id()) {
                        outcomes.insert(*side, Err(SideFailure::Crashed));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        pending = join_set.len(),
                        "Request budget exhausted, cancelling remaining OCR calls"
                    );
                    join_set.abort_all();
                    break;
                }
            }
        }
        outcomes
    }
}

/// Call the engine for one side, retrying outages while budget remains.
async fn extract_with_retry(
    adapter: &OcrAdapter,
    image: &UploadedImage,
    policy: &PipelinePolicy,
    deadline: Instant,
) -> Result<Vec<TextRegion>, EngineError> {
    let mut attempt = 0;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(EngineError::Timeout);
        }

        match adapter
            .extract(image, remaining.min(policy.engine_timeout))
            .await
        {
            Ok(regions) => return Ok(regions),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                if Instant::now() + policy.retry_backoff >= deadline {
                    return Err(e);
                }
                attempt += 1;
                debug!(side = %image.side, attempt, error = %e, "Retrying OCR call");
                tokio::time::sleep(policy.retry_backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// An outage wins over a timeout; a timeout wins over any other failure.
fn both_failed(front: &SideFailure, back: &SideFailure) -> IntakeError {
    let detail = format!("front: {}, back: {}", front.summary(), back.summary());
    if front.is_unavailable() || back.is_unavailable() {
        IntakeError::EngineUnavailable(detail)
    } else if front.is_timeout() || back.is_timeout() {
        debug!(%detail, "No side completed within the budget");
        IntakeError::Timeout
    } else {
        IntakeError::Internal(detail)
    }
}
