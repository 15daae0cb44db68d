use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::{TextRegion, UploadedImage};

/// A text-extraction backend: image bytes in, located text regions out.
///
/// Implementations must not retry internally; retry policy belongs to the
/// caller, which knows the overall request budget.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name (e.g., "http", "fixture").
    fn name(&self) -> &str;

    /// Recognise text in the image. Region order is a hint, not a guarantee.
    async fn recognize(&self, image: &UploadedImage) -> Result<Vec<TextRegion>, EngineError>;
}
