//! Document understanding: OCR engines, the adapter that drives them, and
//! field extraction from recognised text.

pub mod engines;
pub mod fields;
pub mod ocr;

pub use engines::{HttpOcrEngine, MockOcrEngine};
pub use fields::{FieldExtractor, SideExtraction};
pub use ocr::{OcrAdapter, normalize_regions};
