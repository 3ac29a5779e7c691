use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ImportError;

/// Broad file categories we handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Pdf,
    Image,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetection {
    /// MIME type derived from the content itself.
    pub mime_type: String,
    pub category: FileCategory,
    /// What the browser (or the file extension) claimed, if anything.
    pub declared_mime: Option<String>,
    pub file_size_bytes: u64,
}

/// Detect file format from magic bytes (NOT file extensions).
///
/// The declared type is only kept for logging: a `.pdf` that is really a
/// JPEG is treated as a JPEG.
pub fn detect_format(bytes: &[u8], declared_mime: Option<&str>) -> FormatDetection {
    let (mime_type, category) = match bytes {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => ("application/pdf", FileCategory::Pdf),
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg", FileCategory::Image),
        // PNG: full 8-byte signature
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => ("image/png", FileCategory::Image),
        // Recognized but not accepted, so the error can name them
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => {
            ("image/tiff", FileCategory::Unsupported)
        }
        [0x47, 0x49, 0x46, 0x38, ..] => ("image/gif", FileCategory::Unsupported),
        [0x50, 0x4B, 0x03, 0x04, ..] => ("application/zip", FileCategory::Unsupported),
        _ if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" => ("image/heic", FileCategory::Unsupported),
        _ => ("application/octet-stream", FileCategory::Unsupported),
    };

    let declared_mime = declared_mime
        .map(str::trim)
        .filter(|m| !m.is_empty() && *m != "application/octet-stream")
        .map(str::to_string);

    if let Some(declared) = &declared_mime {
        if category.is_supported() && !declared.eq_ignore_ascii_case(mime_type) {
            tracing::warn!(
                declared = %declared,
                detected = mime_type,
                "Declared content type does not match file content"
            );
        }
    }

    FormatDetection {
        mime_type: mime_type.to_string(),
        category,
        declared_mime,
        file_size_bytes: bytes.len() as u64,
    }
}

/// Best guess at a MIME type from the file name alone.
pub fn guess_mime_from_name(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Reject uploads that are empty, oversized or of an unaccepted type.
pub fn validate_upload(format: &FormatDetection, max_bytes: usize) -> Result<(), ImportError> {
    if format.file_size_bytes == 0 {
        return Err(ImportError::EmptyUpload);
    }

    if format.file_size_bytes > max_bytes as u64 {
        return Err(ImportError::FileTooLarge {
            size_mb: format.file_size_bytes as f64 / (1024.0 * 1024.0),
            max_mb: (max_bytes / (1024 * 1024)) as u64,
        });
    }

    if !format.category.is_supported() {
        let shown = format.declared_mime.as_deref().unwrap_or(&format.mime_type);
        return Err(ImportError::UnsupportedFormat(shown.to_string()));
    }

    Ok(())
}

/// Sanitize a filename: strip path components, limit length
pub fn sanitize_filename(original: &str) -> String {
    // Browsers on Windows may send full paths
    let last = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let name = Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let clean: String = name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | ':'))
        .take(128)
        .collect();

    let clean = clean.trim_start_matches('.');
    if clean.trim().is_empty() {
        "upload".to_string()
    } else {
        clean.to_string()
    }
}
