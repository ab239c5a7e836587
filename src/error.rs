/// Failures raised while reading host data during an evaluation.
///
/// Policy ambiguities (malformed addresses, short project codes) never show up
/// here; they fail closed into warning categories instead.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Failed to read content of attachment '{name}': {source}")]
    AttachmentContent {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to resolve address of recipient #{index}: {source}")]
    RecipientAddress {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to read message body: {0}")]
    MessageBody(#[source] anyhow::Error),
}
