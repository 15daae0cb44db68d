//! MIME and format detection for uploaded images.
//!
//! Declared types come from the client and are only a claim; the byte
//! signature is what the validator trusts.

use std::path::Path;

use serde::Serialize;

/// Image formats the intake service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptedFormat {
    Jpeg,
    Png,
}

impl AcceptedFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            AcceptedFormat::Jpeg => "image/jpeg",
            AcceptedFormat::Png => "image/png",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            AcceptedFormat::Jpeg => image::ImageFormat::Jpeg,
            AcceptedFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Map a declared content type to an accepted format.
///
/// Case and parameters (`; charset=...`) are ignored; `image/jpg` is a
/// common browser alias for `image/jpeg`.
pub fn declared_format(content_type: &str) -> Option<AcceptedFormat> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(AcceptedFormat::Jpeg),
        "image/png" => Some(AcceptedFormat::Png),
        _ => None,
    }
}

/// Identify the format from the leading magic bytes.
pub fn sniff_format(data: &[u8]) -> Option<AcceptedFormat> {
    match image::guess_format(data).ok()? {
        image::ImageFormat::Jpeg => Some(AcceptedFormat::Jpeg),
        image::ImageFormat::Png => Some(AcceptedFormat::Png),
        _ => None,
    }
}

/// Guess a content type from a file extension (used for local files).
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "pdf"          => "application/pdf",
        _              => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn declared_type_aliases() {
        assert_eq!(declared_format("image/jpeg"), Some(AcceptedFormat::Jpeg));
        assert_eq!(declared_format("IMAGE/JPG"), Some(AcceptedFormat::Jpeg));
        assert_eq!(declared_format("image/png; charset=binary"), Some(AcceptedFormat::Png));
        assert_eq!(declared_format("image/gif"), None);
        assert_eq!(declared_format(""), None);
    }

    #[test]
    fn sniffs_magic_numbers() {
        assert_eq!(sniff_format(b"\xFF\xD8\xFF\xE0rest"), Some(AcceptedFormat::Jpeg));
        assert_eq!(sniff_format(b"\x89PNG\r\n\x1a\nrest"), Some(AcceptedFormat::Png));
        assert_eq!(sniff_format(b"GIF89a......"), None);
        assert_eq!(sniff_format(b""), None);
    }

    #[test]
    fn detects_jpeg_extension() {
        assert_eq!(detect_mime_type(&PathBuf::from("front.JPG")), "image/jpeg");
        assert_eq!(detect_mime_type(&PathBuf::from("card.xyz")), "application/octet-stream");
    }
}
