//! YAML description of an outgoing message, used by the command-line tool to
//! run the evaluator without a mail client.
//!
//! ```yaml
//! recipients: [a@unihancorp.com, b@evil.com]
//! body: see attached
//! attachments:
//!   - name: N0861_Chip_Q_0409.pptx
//!     content: "OSR__DS_FILE_HDR ..."
//!   - name: N0861_Spec_Q_0409.docx
//!     content_base64: UEsDBBQ=
//!   - name: N0861_Plan_Q_0409.xlsx
//!     path: plan.xlsx
//! ```

use crate::message::{Attachment, Message, Recipient};
use anyhow::Context;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageFile {
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentEntry {
    pub name: String,
    /// Reported size; defaults to the content length.
    pub size: Option<u64>,
    pub content: Option<String>,
    pub content_base64: Option<String>,
    /// Read lazily, relative to the message file.
    pub path: Option<PathBuf>,
}

impl MessageFile {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message file: {path}"))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse message file: {path}"))
    }

    /// Build the message; `base_dir` anchors relative attachment paths.
    pub fn into_message(self, base_dir: &Path) -> anyhow::Result<Message> {
        let attachments = self
            .attachments
            .into_iter()
            .map(|entry| entry.into_attachment(base_dir))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Message {
            attachments,
            recipients: self.recipients.into_iter().map(Recipient::new).collect(),
            body_text: self.body,
        })
    }
}

impl AttachmentEntry {
    fn into_attachment(self, base_dir: &Path) -> anyhow::Result<Attachment> {
        if let Some(encoded) = &self.content_base64 {
            let bytes = BASE64_STANDARD
                .decode(encoded.trim())
                .with_context(|| format!("Invalid base64 content for attachment {}", self.name))?;
            return Ok(self.with_bytes(bytes));
        }

        if let Some(text) = &self.content {
            let bytes = text.as_bytes().to_vec();
            return Ok(self.with_bytes(bytes));
        }

        if let Some(relative) = &self.path {
            let full = base_dir.join(relative);
            let size = match self.size {
                Some(size) => size,
                None => std::fs::metadata(&full)
                    .with_context(|| format!("Failed to stat attachment: {}", full.display()))?
                    .len(),
            };
            return Ok(Attachment::new(
                self.name,
                size,
                Box::new(move || {
                    std::fs::read(&full)
                        .with_context(|| format!("Failed to read attachment: {}", full.display()))
                }),
            ));
        }

        Ok(self.with_bytes(Vec::new()))
    }

    fn with_bytes(self, bytes: Vec<u8>) -> Attachment {
        let size = self.size.unwrap_or(bytes.len() as u64);
        Attachment::new(
            self.name,
            size,
            Box::new(move || Ok::<_, anyhow::Error>(bytes.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_and_base64_attachments() {
        let yaml = r#"
recipients: [a@unihancorp.com, b@evil.com]
body: hello
attachments:
  - name: N0861_Chip_Q_0409.pptx
    content: "OSR__DS_FILE_HDR"
  - name: N0861_Spec_Q_0409.docx
    content_base64: UEsDBA==
"#;
        let file: MessageFile = serde_yaml::from_str(yaml).unwrap();
        let message = file.into_message(Path::new(".")).unwrap();

        assert_eq!(message.recipients.len(), 2);
        assert_eq!(message.body_text, "hello");
        assert_eq!(message.attachments[0].read_prefix(2048).unwrap(), b"OSR__DS_FILE_HDR");
        assert_eq!(message.attachments[1].read_prefix(2048).unwrap(), b"PK\x03\x04");
        assert_eq!(message.attachments[1].size_bytes, 4);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let file = MessageFile {
            attachments: vec![AttachmentEntry {
                name: "x.docx".to_string(),
                size: None,
                content: None,
                content_base64: Some("!!!".to_string()),
                path: None,
            }],
            ..Default::default()
        };
        assert!(file.into_message(Path::new(".")).is_err());
    }

    #[test]
    fn test_path_attachment_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan.xlsx"), b"plain bytes").unwrap();
        std::fs::write(
            dir.path().join("message.yaml"),
            "attachments:\n  - name: N0861_Plan_Q_0409.xlsx\n    path: plan.xlsx\n",
        )
        .unwrap();

        let path = dir.path().join("message.yaml");
        let file = MessageFile::from_file(path.to_str().unwrap()).unwrap();
        let message = file.into_message(dir.path()).unwrap();

        let attachment = &message.attachments[0];
        assert_eq!(attachment.size_bytes, 11);
        assert_eq!(attachment.read_prefix(2048).unwrap(), b"plain bytes");
    }

    #[test]
    fn test_missing_path_attachment_fails() {
        let file = MessageFile {
            attachments: vec![AttachmentEntry {
                name: "gone.docx".to_string(),
                size: None,
                content: None,
                content_base64: None,
                path: Some(PathBuf::from("gone.docx")),
            }],
            ..Default::default()
        };
        assert!(file.into_message(Path::new("/nonexistent")).is_err());
    }
}
