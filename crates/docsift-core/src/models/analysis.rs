use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Maximum characters kept in an analysis description.
pub const DESCRIPTION_MAX_CHARS: usize = 300;
/// Maximum characters kept in an analysis summary.
pub const SUMMARY_MAX_CHARS: usize = 150;

/// Content to analyze. Lives only for the duration of one orchestration call.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub content: Vec<u8>,
    pub content_type: String,
    pub display_name: String,
}

impl AnalysisRequest {
    pub fn new(
        content: Vec<u8>,
        content_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            content,
            content_type: content_type.into(),
            display_name: display_name.into(),
        }
    }
}

/// Outcome of analyzing a piece of content, either from the model or the
/// local fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub description: String,
    pub summary: String,
    #[serde(default)]
    pub is_fallback: bool,
}

/// Caps applied to model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimits {
    pub description_max_chars: usize,
    pub summary_max_chars: usize,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            description_max_chars: DESCRIPTION_MAX_CHARS,
            summary_max_chars: SUMMARY_MAX_CHARS,
        }
    }
}

/// Broad content category used to shape the prompt and the fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Document,
}

impl ContentKind {
    /// Detect the content kind from the declared type, falling back to magic
    /// numbers when the declared type is generic or missing.
    pub fn detect(content_type: &str, data: &[u8]) -> Self {
        let declared = content_type.trim().to_lowercase();
        if declared.starts_with("image/") {
            return ContentKind::Image;
        }
        if !declared.is_empty() && declared != "application/octet-stream" {
            return ContentKind::Document;
        }
        if sniff_image_type(data).is_some() {
            ContentKind::Image
        } else {
            ContentKind::Document
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContentKind::Image => write!(f, "image"),
            ContentKind::Document => write!(f, "document"),
        }
    }
}

/// Detect an image media type from magic numbers.
pub fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47
    if data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47 {
        return Some("image/png");
    }

    // GIF: 47 49 46
    if data[0] == 0x47 && data[1] == 0x49 && data[2] == 0x46 {
        return Some("image/gif");
    }

    // WebP: RIFF ... WEBP
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_declared_type() {
        assert_eq!(ContentKind::detect("image/png", b""), ContentKind::Image);
        assert_eq!(
            ContentKind::detect("application/pdf", b"%PDF-1.7"),
            ContentKind::Document
        );
    }

    #[test]
    fn test_detect_from_magic_numbers() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        assert_eq!(
            ContentKind::detect("application/octet-stream", &png),
            ContentKind::Image
        );
        assert_eq!(ContentKind::detect("", b"hello world"), ContentKind::Document);
    }

    #[test]
    fn test_sniff_webp() {
        let webp = b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        assert_eq!(sniff_image_type(webp), Some("image/webp"));
        assert_eq!(sniff_image_type(b"abc"), None);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnalysisResult {
            description: "d".to_string(),
            summary: "s".to_string(),
            is_fallback: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isFallback"], true);
    }
}
