//! Concrete OCR engines behind the [`docintake_core::OcrEngine`] trait.

pub mod http;
pub mod mock;

pub use http::HttpOcrEngine;
pub use mock::MockOcrEngine;
