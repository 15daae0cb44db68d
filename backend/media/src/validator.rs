//! Upload validation: runs before any OCR work is spent on an image.
//!
//! Checks, in order: declared type, size, byte signature, readable header.
//! The checks are pure; nothing is stored or decoded past the header.

use std::io::Cursor;

use docintake_core::{RejectionReason, UploadedImage, ValidationIssue};
use serde::Serialize;
use tracing::debug;

use crate::mime_detect::{AcceptedFormat, declared_format, sniff_format};

/// Default per-image size limit (5 MiB).
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// What the validator learned about an accepted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub format: AcceptedFormat,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_bytes: usize,
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

impl ImageValidator {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate raw bytes against the type the client declared.
    pub fn validate(&self, data: &[u8], declared_type: &str) -> Result<ImageInfo, RejectionReason> {
        let declared = declared_format(declared_type).ok_or_else(|| {
            RejectionReason::UnsupportedType {
                declared: declared_type.to_string(),
            }
        })?;

        if data.len() > self.max_bytes {
            return Err(RejectionReason::TooLarge {
                size: data.len(),
                limit: self.max_bytes,
            });
        }

        if sniff_format(data) != Some(declared) {
            debug!(declared = ?declared, "Byte signature does not match declared type");
            return Err(RejectionReason::CorruptOrMismatchedSignature);
        }

        let (width, height) = read_dimensions(data, declared)
            .ok_or(RejectionReason::CorruptOrMismatchedSignature)?;

        Ok(ImageInfo {
            format: declared,
            width,
            height,
            size_bytes: data.len(),
        })
    }

    /// Validate an uploaded image, tagging any rejection with its side.
    pub fn validate_image(&self, image: &UploadedImage) -> Result<ImageInfo, ValidationIssue> {
        self.validate(&image.data, &image.content_type)
            .map_err(|reason| ValidationIssue::new(image.side, reason))
    }
}

/// Decode only the image header. Zero-sized images count as unreadable.
fn read_dimensions(data: &[u8], format: AcceptedFormat) -> Option<(u32, u32)> {
    let reader = image::ImageReader::with_format(Cursor::new(data), format.image_format());
    match reader.into_dimensions() {
        Ok((0, _)) | Ok((_, 0)) => None,
        Ok(dims) => Some(dims),
        Err(e) => {
            debug!(error = %e, "Image header unreadable");
            None
        }
    }
}
