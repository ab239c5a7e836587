use crate::checks::{AttachmentCheck, CheckContext, CheckResult, WarningCategory};
use crate::config::Config;
use crate::domain_utils::DomainUtils;
use crate::error::EvaluationError;
use crate::message::{Attachment, Recipient};
use anyhow::Context;
use regex::Regex;

/// Flags attachments whose leading bytes lack the encryption header signature.
pub struct EncryptionDetector {
    marker: Regex,
    probe_length: usize,
    exempt_domains: Vec<String>,
    partner_overrides: Vec<String>,
}

impl EncryptionDetector {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let marker = Regex::new(&config.encryption.marker).with_context(|| {
            format!("Invalid encryption marker pattern: {}", config.encryption.marker)
        })?;

        Ok(Self {
            marker,
            probe_length: config.attachments.content_probe_length,
            exempt_domains: config.encryption.exempt_domains.clone(),
            partner_overrides: config.encryption.partner_overrides.clone(),
        })
    }

    /// First recipient whose presence disables the check, if any.
    ///
    /// A recipient on an exempt domain qualifies unless their local part is a
    /// listed partner override.
    pub fn exempting_recipient<'a>(&self, recipients: &'a [Recipient]) -> Option<&'a Recipient> {
        recipients.iter().find(|recipient| {
            recipient.address().is_some_and(|address| {
                DomainUtils::matches_domain_list(address.domain, &self.exempt_domains)
                    && !self
                        .partner_overrides
                        .iter()
                        .any(|user| user.eq_ignore_ascii_case(address.user))
            })
        })
    }

    pub fn is_not_yet_encrypted(
        &self,
        attachment: &Attachment,
        recipients: &[Recipient],
    ) -> Result<bool, EvaluationError> {
        if let Some(recipient) = self.exempting_recipient(recipients) {
            log::debug!(
                "Encryption check skipped for {}: exempt recipient {}",
                attachment.display_name,
                recipient.smtp_address
            );
            return Ok(false);
        }

        let bytes = attachment.read_prefix(self.probe_length)?;
        Ok(!self.contains_marker(&bytes))
    }

    /// Whether the marker survives in the filtered text form of `bytes`.
    pub fn contains_marker(&self, bytes: &[u8]) -> bool {
        let text = retain_marker_chars(&String::from_utf8_lossy(bytes));
        self.marker.is_match(&text)
    }
}

/// Keep only ASCII alphanumerics, `.` and `_`.
pub fn retain_marker_chars(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect()
}

impl AttachmentCheck for EncryptionDetector {
    fn check(&self, context: &CheckContext<'_>) -> Result<CheckResult, EvaluationError> {
        if self.is_not_yet_encrypted(context.attachment, &context.message.recipients)? {
            log::debug!("Attachment {} is not encrypted", context.attachment.display_name);
            Ok(CheckResult::triggered(self.name(), self.category(), Vec::new()))
        } else {
            Ok(CheckResult::pass(self.name(), self.category()))
        }
    }

    fn name(&self) -> &str {
        "encryption_marker"
    }

    fn category(&self) -> WarningCategory {
        WarningCategory::Encrypted
    }
}
