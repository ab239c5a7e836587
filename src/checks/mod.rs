pub mod encryption;
pub mod missing_attachment;
pub mod naming;
pub mod recipients;

use crate::clock::Clock;
use crate::error::EvaluationError;
use crate::filename::FilenameParts;
use crate::message::{Attachment, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    NotMatchRecipients,
    Encrypted,
    NamingViolation,
    MissingAttachment,
}

/// Everything an attachment-level check may look at.
pub struct CheckContext<'a> {
    pub message: &'a Message,
    pub attachment: &'a Attachment,
    pub parts: &'a FilenameParts,
    pub clock: &'a dyn Clock,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub check_name: String,
    pub category: WarningCategory,
    pub triggered: bool,
    /// Lines rendered under the category line in the prompt.
    pub details: Vec<String>,
}

impl CheckResult {
    pub fn pass(check_name: &str, category: WarningCategory) -> Self {
        Self {
            check_name: check_name.to_string(),
            category,
            triggered: false,
            details: Vec::new(),
        }
    }

    pub fn triggered(check_name: &str, category: WarningCategory, details: Vec<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            category,
            triggered: true,
            details,
        }
    }
}

/// A rule applied to each non-image attachment.
pub trait AttachmentCheck: Send + Sync {
    fn check(&self, context: &CheckContext<'_>) -> Result<CheckResult, EvaluationError>;
    fn name(&self) -> &str;
    fn category(&self) -> WarningCategory;
}
