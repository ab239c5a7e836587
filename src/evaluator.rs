//! Pre-send compliance evaluation.
//!
//! One call to [`ComplianceEvaluator::evaluate`] scans a whole message and
//! folds every check outcome into a single [`Verdict`]. Warning state lives in
//! a per-call accumulator, so the evaluator itself is immutable and can be
//! shared across threads.

use crate::checks::encryption::EncryptionDetector;
use crate::checks::missing_attachment::MissingAttachmentDetector;
use crate::checks::naming::NamingConventionValidator;
use crate::checks::recipients::RecipientDomainMatcher;
use crate::checks::{AttachmentCheck, CheckContext, CheckResult, WarningCategory};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, MessagesConfig};
use crate::error::EvaluationError;
use crate::filename::FilenameClassifier;
use crate::message::Message;
use crate::registry::ProjectDomainRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub has_issues: bool,
    /// Empty when there are no issues.
    pub message: String,
    /// Triggered categories in first-trigger order.
    pub categories: Vec<WarningCategory>,
}

impl Verdict {
    pub fn clean() -> Self {
        Self {
            has_issues: false,
            message: String::new(),
            categories: Vec::new(),
        }
    }
}

/// Categories and their detail lines gathered during one evaluation.
#[derive(Debug, Default)]
struct Findings {
    order: Vec<WarningCategory>,
    details: HashMap<WarningCategory, Vec<String>>,
}

impl Findings {
    fn record(&mut self, category: WarningCategory, details: Vec<String>) {
        if !self.order.contains(&category) {
            self.order.push(category);
        }
        let entry = self.details.entry(category).or_default();
        for line in details {
            if !entry.contains(&line) {
                entry.push(line);
            }
        }
    }

    fn absorb(&mut self, result: CheckResult) {
        if result.triggered {
            self.record(result.category, result.details);
        }
    }

    fn into_verdict(self, messages: &MessagesConfig) -> Verdict {
        if self.order.is_empty() {
            return Verdict::clean();
        }

        let mut lines = Vec::new();
        for category in &self.order {
            lines.push(category_line(messages, *category).to_string());
            if let Some(details) = self.details.get(category) {
                lines.extend(details.iter().cloned());
            }
        }
        lines.push(messages.confirmation.clone());

        Verdict {
            has_issues: true,
            message: lines.join("\n"),
            categories: self.order,
        }
    }
}

fn category_line(messages: &MessagesConfig, category: WarningCategory) -> &str {
    match category {
        WarningCategory::NotMatchRecipients => &messages.not_match_recipients,
        WarningCategory::Encrypted => &messages.encrypted,
        WarningCategory::NamingViolation => &messages.naming_violation,
        WarningCategory::MissingAttachment => &messages.missing_attachment,
    }
}

pub struct ComplianceEvaluator {
    classifier: FilenameClassifier,
    checks: Vec<Box<dyn AttachmentCheck>>,
    missing_attachment: MissingAttachmentDetector,
    messages: MessagesConfig,
    clock: Arc<dyn Clock>,
}

impl ComplianceEvaluator {
    pub fn new(
        config: &Config,
        registry: Arc<ProjectDomainRegistry>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        // Run order decides category order within a single attachment.
        let checks: Vec<Box<dyn AttachmentCheck>> = vec![
            Box::new(RecipientDomainMatcher::from_config(config, registry)),
            Box::new(EncryptionDetector::from_config(config)?),
            Box::new(NamingConventionValidator::from_config(config)),
        ];

        Ok(Self {
            classifier: FilenameClassifier::new(&config.attachments.image_extensions),
            checks,
            missing_attachment: MissingAttachmentDetector::from_config(config)?,
            messages: config.messages.clone(),
            clock,
        })
    }

    /// Registry from `config.projects`, wall-clock dates.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = ProjectDomainRegistry::from_config(&config.projects);
        log::info!(
            "Loaded project registry with {} projects",
            registry.project_count()
        );
        Self::new(config, Arc::new(registry), Arc::new(SystemClock))
    }

    pub fn title(&self) -> &str {
        &self.messages.title
    }

    pub fn evaluate(&self, message: &Message) -> Result<Verdict, EvaluationError> {
        let mut findings = Findings::default();

        if message.attachments.is_empty() {
            if let Some(keyword) = self.missing_attachment.detect(&message.body_text) {
                log::debug!("Body mentions '{keyword}' but message has no attachments");
                findings.record(WarningCategory::MissingAttachment, Vec::new());
            }
        } else {
            for attachment in &message.attachments {
                let parts = self
                    .classifier
                    .classify(&attachment.display_name, self.clock.as_ref());
                if parts.is_image {
                    log::debug!("Skipping image attachment {}", attachment.display_name);
                    continue;
                }

                let context = CheckContext {
                    message,
                    attachment,
                    parts: &parts,
                    clock: self.clock.as_ref(),
                };
                for check in &self.checks {
                    let result = check.check(&context)?;
                    log::debug!(
                        "{} on {}: triggered={}",
                        result.check_name,
                        attachment.display_name,
                        result.triggered
                    );
                    findings.absorb(result);
                }
            }
        }

        let verdict = findings.into_verdict(&self.messages);
        log::info!(
            "Evaluated message with {} attachments and {} recipients: {:?}",
            message.attachments.len(),
            message.recipients.len(),
            verdict.categories
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::message::Attachment;

    const ENCRYPTED: &[u8] = b"\x00\x01OSR__DS_FILE_HDR\xff\xfe payload";

    fn evaluator() -> ComplianceEvaluator {
        let mut config = Config::default();
        config.recipients.ignored_domains = vec!["mycompany.com".to_string()];
        let registry = ProjectDomainRegistry::from_pairs([
            ("N20200861", "unihancorp.com"),
            ("N20200861", "pegatroncorp.com"),
        ]);
        let clock = FixedClock::ymd(2020, 4, 9).unwrap();
        ComplianceEvaluator::new(&config, Arc::new(registry), Arc::new(clock)).unwrap()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_clean_message() {
        let message = Message::new()
            .with_recipient("a@unihancorp.com")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_Q_0409.pptx",
                ENCRYPTED.to_vec(),
            ));
        assert_eq!(evaluator().evaluate(&message).unwrap(), Verdict::clean());
    }

    #[test]
    fn test_forgotten_attachment_reported_once() {
        let message = Message::new()
            .with_recipient("a@unihancorp.com")
            .with_body("see attachment, and the attached notes");
        let verdict = evaluator().evaluate(&message).unwrap();

        assert!(verdict.has_issues);
        assert_eq!(verdict.categories, vec![WarningCategory::MissingAttachment]);
        assert_eq!(
            count(&verdict.message, "You may have forgotten to attach a file"),
            1
        );
        assert!(verdict.message.ends_with("Send the message anyway?"));
    }

    #[test]
    fn test_no_attachments_and_plain_body() {
        let message = Message::new().with_body("Lunch at noon?");
        assert!(!evaluator().evaluate(&message).unwrap().has_issues);
    }

    #[test]
    fn test_body_keywords_ignored_when_attachments_present() {
        let message = Message::new()
            .with_recipient("a@unihancorp.com")
            .with_body("please see attached file")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_Q_0409.pptx",
                ENCRYPTED.to_vec(),
            ));
        let verdict = evaluator().evaluate(&message).unwrap();
        assert!(!verdict.categories.contains(&WarningCategory::MissingAttachment));
    }

    #[test]
    fn test_image_attachment_bypasses_checks() {
        let message = Message::new()
            .with_recipient("b@evil.com")
            .with_attachment(Attachment::from_bytes("N0861_photo.png", b"\x89PNG".to_vec()));
        let verdict = evaluator().evaluate(&message).unwrap();
        assert!(!verdict.has_issues);
        assert!(verdict.message.is_empty());
    }

    #[test]
    fn test_categories_in_first_trigger_order_without_duplicates() {
        let message = Message::new()
            .with_recipient("a@unihancorp.com")
            .with_recipient("b@evil.com")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_X_0409.pptx",
                ENCRYPTED.to_vec(),
            ))
            .with_attachment(Attachment::from_bytes(
                "N0861_Spec_Q_0409.docx",
                b"plain".to_vec(),
            ))
            .with_attachment(Attachment::from_bytes(
                "N0861_Test_X_0409.xlsx",
                b"plain".to_vec(),
            ));
        let verdict = evaluator().evaluate(&message).unwrap();

        assert_eq!(
            verdict.categories,
            vec![
                WarningCategory::NotMatchRecipients,
                WarningCategory::NamingViolation,
                WarningCategory::Encrypted,
            ]
        );
        assert_eq!(count(&verdict.message, "Attachment has not been encrypted"), 1);
        assert_eq!(
            count(&verdict.message, "<b@evil.com> is not on the recipient list for N20200861"),
            1
        );
        assert_eq!(
            count(&verdict.message, "Some recipients are not cleared"),
            1
        );
    }

    #[test]
    fn test_message_layout() {
        let message = Message::new()
            .with_recipient("b@evil.com")
            .with_recipient("colleague@mycompany.com")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_Q_0409.pptx",
                b"plain".to_vec(),
            ));
        let verdict = evaluator().evaluate(&message).unwrap();

        let expected = [
            "Some recipients are not cleared for the attached project files",
            "<b@evil.com> is not on the recipient list for N20200861",
            "Attachment has not been encrypted",
            "Send the message anyway?",
        ]
        .join("\n");
        assert_eq!(verdict.message, expected);
    }

    #[test]
    fn test_repeated_evaluation_does_not_leak_state() {
        let evaluator = evaluator();
        let bad = Message::new()
            .with_recipient("b@evil.com")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_Q_0409.pptx",
                ENCRYPTED.to_vec(),
            ));
        let good = Message::new()
            .with_recipient("a@unihancorp.com")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_Q_0409.pptx",
                ENCRYPTED.to_vec(),
            ));

        let first = evaluator.evaluate(&bad).unwrap();
        assert!(first.has_issues);
        assert!(!evaluator.evaluate(&good).unwrap().has_issues);
        assert_eq!(evaluator.evaluate(&bad).unwrap(), first);
    }

    #[test]
    fn test_accessor_failure_aborts_evaluation() {
        let message = Message::new()
            .with_recipient("a@unihancorp.com")
            .with_attachment(Attachment::new(
                "N0861_Chip_Q_0409.pptx",
                100,
                Box::new(|| Err(anyhow::anyhow!("attachment not materialized"))),
            ));
        assert!(matches!(
            evaluator().evaluate(&message),
            Err(EvaluationError::AttachmentContent { .. })
        ));
    }

    #[test]
    fn test_later_accessor_failure_discards_earlier_findings() {
        let message = Message::new()
            .with_recipient("b@evil.com")
            .with_attachment(Attachment::from_bytes(
                "N0861_Chip_X_0409.pptx",
                b"plain".to_vec(),
            ))
            .with_attachment(Attachment::new(
                "N0861_Spec_Q_0409.docx",
                100,
                Box::new(|| Err(anyhow::anyhow!("attachment not materialized"))),
            ));
        match evaluator().evaluate(&message) {
            Err(EvaluationError::AttachmentContent { name, .. }) => {
                assert_eq!(name, "N0861_Spec_Q_0409.docx")
            }
            other => panic!("Expected content accessor failure, got {other:?}"),
        }
    }

    #[test]
    fn test_from_config_uses_configured_registry() {
        let evaluator = ComplianceEvaluator::from_config(&Config::default()).unwrap();
        assert_eq!(evaluator.title(), "Attachment reminder");
        assert!(!evaluator.evaluate(&Message::new()).unwrap().has_issues);
    }

    #[test]
    fn test_evaluator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ComplianceEvaluator>();
    }
}
