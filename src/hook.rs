use crate::error::EvaluationError;
use crate::evaluator::{ComplianceEvaluator, Verdict};
use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Yes/no dialog supplied by the host.
pub trait ConfirmPrompt {
    /// `true` lets the send proceed.
    fn confirm(&self, title: &str, message: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendDecision {
    Send,
    Cancel,
}

/// Runs at the host's pre-send event. The user always has the final say; the
/// prompt is only shown when the verdict carries warnings.
pub fn pre_send(
    evaluator: &ComplianceEvaluator,
    message: &Message,
    prompt: &dyn ConfirmPrompt,
) -> Result<(SendDecision, Verdict), EvaluationError> {
    let verdict = evaluator.evaluate(message)?;
    if !verdict.has_issues {
        return Ok((SendDecision::Send, verdict));
    }

    let decision = if prompt.confirm(evaluator.title(), &verdict.message) {
        SendDecision::Send
    } else {
        log::info!("User cancelled send after warnings: {:?}", verdict.categories);
        SendDecision::Cancel
    };
    Ok((decision, verdict))
}
