//! `docintake process`: run one card through the pipeline locally and
//! print the same envelope the HTTP endpoint returns.

use std::path::Path;

use anyhow::{Context, Result};
use docintake_core::{Side, UploadedImage};
use docintake_gateway::IntakeResponse;
use docintake_media::detect_mime_type;
use docintake_pipeline::IntakeOrchestrator;

use crate::terminal_output::{note_error, note_success, paint_status};

pub struct ProcessArgs<'a> {
    pub front: &'a Path,
    pub back: &'a Path,
    pub front_type: Option<&'a str>,
    pub back_type: Option<&'a str>,
}

async fn read_image(side: Side, path: &Path, declared: Option<&str>) -> Result<UploadedImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {} image: {}", side, path.display()))?;
    let content_type = declared.unwrap_or_else(|| detect_mime_type(path));
    Ok(UploadedImage::new(side, content_type, data))
}

/// Returns the envelope and whether it reports success.
pub async fn process(
    orchestrator: &IntakeOrchestrator,
    args: &ProcessArgs<'_>,
) -> Result<(IntakeResponse, bool)> {
    let front = read_image(Side::Front, args.front, args.front_type).await?;
    let back = read_image(Side::Back, args.back, args.back_type).await?;

    let (status, response) = IntakeResponse::from_outcome(orchestrator.process(front, back).await);
    Ok((response, status.is_success()))
}

pub async fn run(orchestrator: &IntakeOrchestrator, args: ProcessArgs<'_>) -> Result<bool> {
    let (response, ok) = process(orchestrator, &args).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if ok {
        note_success(&format!("Record {}", paint_status(&response.status.to_string())));
    } else {
        note_error(response.message.as_deref().unwrap_or("Document could not be processed"));
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use docintake_core::TextRegion;
    use docintake_media::ImageValidator;
    use docintake_pipeline::{PipelinePolicy, ResultAggregator};
    use docintake_understanding::{FieldExtractor, MockOcrEngine, OcrAdapter};

    fn png() -> Vec<u8> {
        let img = image::RgbImage::new(4, 4);
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn orchestrator() -> IntakeOrchestrator {
        let engine = MockOcrEngine::new("mock")
            .with_regions(
                Side::Front,
                vec![
                    TextRegion::new("Asha Rao", 0.92),
                    TextRegion::new("2341 2341 2346", 0.95),
                ],
            )
            .with_regions(Side::Back, vec![TextRegion::new("Address: 12 MG Road, Pune 411001", 0.9)]);
        IntakeOrchestrator::new(
            ImageValidator::new(1024 * 1024),
            OcrAdapter::new(Arc::new(engine)),
            FieldExtractor::default(),
            ResultAggregator::default(),
            PipelinePolicy::default(),
        )
    }

    #[tokio::test]
    async fn infers_content_type_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let front = dir.path().join("front.png");
        let back = dir.path().join("back.PNG");
        std::fs::write(&front, png()).unwrap();
        std::fs::write(&back, png()).unwrap();

        let args = ProcessArgs {
            front: &front,
            back: &back,
            front_type: None,
            back_type: None,
        };
        let (response, ok) = process(&orchestrator(), &args).await.unwrap();
        assert!(ok);
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(
            data.get(&docintake_core::FieldName::AadhaarNumber).unwrap().value,
            "234123412346"
        );
    }

    #[tokio::test]
    async fn declared_type_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let front = dir.path().join("front.png");
        let back = dir.path().join("back.png");
        std::fs::write(&front, png()).unwrap();
        std::fs::write(&back, png()).unwrap();

        let args = ProcessArgs {
            front: &front,
            back: &back,
            front_type: Some("application/pdf"),
            back_type: None,
        };
        let (response, ok) = process(&orchestrator(), &args).await.unwrap();
        assert!(!ok);
        assert!(!response.success);
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let front = dir.path().join("missing.jpg");
        let args = ProcessArgs {
            front: &front,
            back: &front,
            front_type: None,
            back_type: None,
        };
        let err = process(&orchestrator(), &args).await.err().unwrap();
        assert!(err.to_string().contains("front image"));
    }
}
