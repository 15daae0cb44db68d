pub mod error;
pub mod id_number;
pub mod traits;
pub mod types;

pub use error::{describe_size, EngineError, IntakeError, RejectionReason, ValidationIssue};
pub use id_number::{format_id_number, is_plausible_id_number, normalize_id_number, ID_NUMBER_DIGITS};
pub use traits::OcrEngine;
pub use types::{
    BoundingBox, Confidence, DocumentRecord, ExtractedField, FieldName, KnownFields,
    RecordFields, RecordStatus, ResolvedField, Side, TextRegion, UploadedImage, Warning,
    WarningCode,
};
