//! Image intake checks: what the service accepts before spending OCR time.

pub mod mime_detect;
pub mod validator;

pub use mime_detect::{AcceptedFormat, declared_format, detect_mime_type, sniff_format};
pub use validator::{DEFAULT_MAX_BYTES, ImageInfo, ImageValidator};
