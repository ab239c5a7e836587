use crate::checks::{AttachmentCheck, CheckContext, CheckResult, WarningCategory};
use crate::config::Config;
use crate::domain_utils::DomainUtils;
use crate::error::EvaluationError;
use crate::message::Recipient;
use crate::registry::ProjectDomainRegistry;
use std::sync::Arc;

/// Offending recipients for one attachment's project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientMismatch {
    pub project: String,
    pub offending: Vec<String>,
}

impl RecipientMismatch {
    pub fn has_error(&self) -> bool {
        !self.offending.is_empty()
    }
}

pub struct RecipientDomainMatcher {
    registry: Arc<ProjectDomainRegistry>,
    ignored_domains: Vec<String>,
    detail_template: String,
}

impl RecipientDomainMatcher {
    pub fn from_config(config: &Config, registry: Arc<ProjectDomainRegistry>) -> Self {
        Self {
            registry,
            ignored_domains: config.recipients.ignored_domains.clone(),
            detail_template: config.messages.recipient_detail.clone(),
        }
    }

    /// Recipients that are not cleared for `project`.
    ///
    /// Malformed addresses always offend. Recipients on ignored domains never
    /// do. A project without registry entries places no constraint; otherwise
    /// a recipient passes if its domain matches any registered domain.
    pub fn find_mismatches(&self, project: &str, recipients: &[Recipient]) -> RecipientMismatch {
        let mut offending = Vec::new();

        for recipient in recipients {
            let Some(address) = recipient.address() else {
                log::debug!(
                    "Malformed recipient address '{}' treated as mismatch",
                    recipient.smtp_address
                );
                offending.push(recipient.smtp_address.clone());
                continue;
            };

            if DomainUtils::matches_domain_list(address.domain, &self.ignored_domains) {
                log::debug!("Recipient {} on ignored domain, skipping", recipient.smtp_address);
                continue;
            }

            match self.registry.permits(project, address.domain) {
                Some(false) => {
                    log::debug!(
                        "Recipient {} not permitted for project {project}",
                        recipient.smtp_address
                    );
                    offending.push(recipient.smtp_address.clone());
                }
                Some(true) | None => {}
            }
        }

        RecipientMismatch {
            project: project.to_string(),
            offending,
        }
    }

    fn detail_line(&self, address: &str, project: &str) -> String {
        self.detail_template
            .replace("{address}", address)
            .replace("{project}", project)
    }
}

impl AttachmentCheck for RecipientDomainMatcher {
    fn check(&self, context: &CheckContext<'_>) -> Result<CheckResult, EvaluationError> {
        // Codes too short to normalize are reported by the naming check. The raw
        // code has no registry entry, so only malformed recipients offend here.
        let project = context
            .parts
            .normalized_project_code
            .as_deref()
            .unwrap_or(context.parts.project_code_raw.as_str());

        let mismatch = self.find_mismatches(project, &context.message.recipients);
        Ok(self.to_result(&mismatch))
    }

    fn name(&self) -> &str {
        "recipient_domain_match"
    }

    fn category(&self) -> WarningCategory {
        WarningCategory::NotMatchRecipients
    }
}

impl RecipientDomainMatcher {
    fn to_result(&self, mismatch: &RecipientMismatch) -> CheckResult {
        if !mismatch.has_error() {
            return CheckResult::pass(self.name(), self.category());
        }
        let details = mismatch
            .offending
            .iter()
            .map(|address| self.detail_line(address, &mismatch.project))
            .collect();
        CheckResult::triggered(self.name(), self.category(), details)
    }
}
