use crate::config::Config;
use anyhow::Context;
use regex::Regex;

/// Looks for attachment-referencing words in the body of a message that has
/// no attachments.
pub struct MissingAttachmentDetector {
    pattern: Option<Regex>,
}

impl MissingAttachmentDetector {
    pub fn new(keywords: &[String]) -> anyhow::Result<Self> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            log::warn!("No missing-attachment keywords configured, detector disabled");
            return Ok(Self { pattern: None });
        }

        let source = format!("(?i){}", alternatives.join("|"));
        let pattern = Regex::new(&source)
            .with_context(|| format!("Failed to compile attachment keywords: {source}"))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.missing_attachment.keywords)
    }

    /// The first keyword occurrence in `body`, if any.
    pub fn detect<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.pattern
            .as_ref()
            .and_then(|pattern| pattern.find(body))
            .map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> MissingAttachmentDetector {
        MissingAttachmentDetector::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_flags_attachment_reference() {
        assert_eq!(detector().detect("Please see ATTACHED file"), Some("ATTACHED"));
        assert!(detector().detect("see attachment").is_some());
        assert!(detector().detect("詳如附件，謝謝").is_some());
    }

    #[test]
    fn test_ignores_unrelated_body() {
        assert!(detector().detect("Meeting moved to Thursday").is_none());
        assert!(detector().detect("").is_none());
    }

    #[test]
    fn test_keywords_are_literal() {
        let d = MissingAttachmentDetector::new(&["file(s)".to_string()]).unwrap();
        assert!(d.detect("the FILE(S) you wanted").is_some());
        assert!(d.detect("files").is_none());
    }

    #[test]
    fn test_empty_keyword_list_never_flags() {
        let d = MissingAttachmentDetector::new(&[" ".to_string()]).unwrap();
        assert!(d.detect("attached").is_none());
    }
}
