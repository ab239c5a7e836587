use crate::domain_utils::DomainUtils;
use crate::error::EvaluationError;
use std::fmt;

/// Reads raw attachment bytes from the host. May block while the host
/// materializes the item.
pub type ContentAccessor = Box<dyn Fn() -> anyhow::Result<Vec<u8>> + Send + Sync>;

pub struct Attachment {
    pub display_name: String,
    pub size_bytes: u64,
    content: ContentAccessor,
}

impl Attachment {
    pub fn new(display_name: impl Into<String>, size_bytes: u64, content: ContentAccessor) -> Self {
        Self {
            display_name: display_name.into(),
            size_bytes,
            content,
        }
    }

    pub fn from_bytes(display_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self::new(display_name, size_bytes, Box::new(move || Ok::<_, anyhow::Error>(bytes.clone())))
    }

    /// At most `limit` leading bytes of the content.
    pub fn read_prefix(&self, limit: usize) -> Result<Vec<u8>, EvaluationError> {
        let mut bytes = (self.content)().map_err(|source| EvaluationError::AttachmentContent {
            name: self.display_name.clone(),
            source,
        })?;
        let wanted = usize::try_from(self.size_bytes)
            .unwrap_or(usize::MAX)
            .min(limit);
        bytes.truncate(wanted);
        Ok(bytes)
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("display_name", &self.display_name)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub smtp_address: String,
}

/// Parsed form of a well-formed recipient address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailAddress<'a> {
    pub user: &'a str,
    pub domain: &'a str,
}

impl Recipient {
    pub fn new(smtp_address: impl Into<String>) -> Self {
        Self {
            smtp_address: smtp_address.into(),
        }
    }

    /// `None` when the address does not contain exactly one `@`.
    pub fn address(&self) -> Option<MailAddress<'_>> {
        DomainUtils::split_address(&self.smtp_address).map(|(user, domain)| MailAddress { user, domain })
    }
}

#[derive(Debug, Default)]
pub struct Message {
    pub attachments: Vec<Attachment>,
    pub recipients: Vec<Recipient>,
    pub body_text: String,
}

/// Host object model for an outgoing item.
pub trait MailItem {
    fn attachments(&self) -> Vec<Attachment>;
    fn recipient_count(&self) -> usize;
    fn recipient_address(&self, index: usize) -> anyhow::Result<String>;
    fn body(&self) -> anyhow::Result<String>;
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipient(mut self, address: &str) -> Self {
        self.recipients.push(Recipient::new(address));
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body_text = body.to_string();
        self
    }

    /// Snapshot a host item. The first failing accessor aborts the snapshot.
    pub fn from_mail_item(item: &dyn MailItem) -> Result<Self, EvaluationError> {
        let recipients = (0..item.recipient_count())
            .map(|index| {
                item.recipient_address(index)
                    .map(Recipient::new)
                    .map_err(|source| EvaluationError::RecipientAddress { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let body_text = item.body().map_err(EvaluationError::MessageBody)?;

        Ok(Self {
            attachments: item.attachments(),
            recipients,
            body_text,
        })
    }
}
