use docsift_core::models::{AnalysisResult, ContentKind, OutputLimits};

use crate::validator::clean_field;

const MAX_NAME_CHARS: usize = 80;

/// Generic result used whenever the model cannot produce one. Pure and
/// deterministic for a given name and kind.
pub fn build(display_name: &str, kind: ContentKind, limits: OutputLimits) -> AnalysisResult {
    let name = clean_field(display_name, MAX_NAME_CHARS).replace(['\n', '\t'], " ");
    let name = if name.is_empty() {
        "untitled".to_string()
    } else {
        name
    };

    let (description, summary) = match kind {
        ContentKind::Image => (
            format!(
                "Image \"{}\". An automatic description is not available for this file right now.",
                name
            ),
            format!("Image: {}", name),
        ),
        ContentKind::Document => (
            format!(
                "Document \"{}\". An automatic summary is not available for this file right now.",
                name
            ),
            format!("Document: {}", name),
        ),
    };

    AnalysisResult {
        description: clean_field(&description, limits.description_max_chars),
        summary: clean_field(&summary, limits.summary_max_chars),
        is_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_deterministic() {
        let a = build("scan.png", ContentKind::Image, OutputLimits::default());
        let b = build("scan.png", ContentKind::Image, OutputLimits::default());
        assert_eq!(a, b);
        assert!(a.is_fallback);
        assert!(a.description.contains("scan.png"));
        assert_eq!(a.summary, "Image: scan.png");
    }

    #[test]
    fn test_fallback_respects_caps() {
        let limits = OutputLimits {
            description_max_chars: 20,
            summary_max_chars: 10,
        };
        let result = build(&"x".repeat(500), ContentKind::Document, limits);
        assert!(result.description.chars().count() <= 20);
        assert!(result.summary.chars().count() <= 10);
    }

    #[test]
    fn test_fallback_handles_empty_and_hostile_names() {
        let result = build("", ContentKind::Document, OutputLimits::default());
        assert_eq!(result.summary, "Document: untitled");

        let result = build("a\u{0000}b\nc", ContentKind::Document, OutputLimits::default());
        assert_eq!(result.summary, "Document: ab c");
    }
}
