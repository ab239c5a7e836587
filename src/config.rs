use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub attachments: AttachmentConfig,
    #[serde(default)]
    pub recipients: RecipientConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub missing_attachment: MissingAttachmentConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    /// Project code to permitted recipient domains.
    #[serde(default)]
    pub projects: BTreeMap<String, Vec<String>>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Extensions (without the dot) that bypass every filename-based check.
    pub image_extensions: Vec<String>,
    /// Upper bound on bytes inspected for the encryption marker.
    pub content_probe_length: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientConfig {
    /// Recipients on these domains are never checked against the registry.
    pub ignored_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Header signature of an encrypted file. Compiled as a regular expression.
    pub marker: String,
    /// A recipient on one of these domains disables the check for the attachment...
    pub exempt_domains: Vec<String>,
    /// ...unless their mailbox local part is listed here.
    pub partner_overrides: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub allowed_prefixes: Vec<char>,
    pub marker_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingAttachmentConfig {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub title: String,
    pub not_match_recipients: String,
    /// `{address}` and `{project}` are substituted per offending recipient.
    pub recipient_detail: String,
    pub encrypted: String,
    pub naming_violation: String,
    pub missing_attachment: String,
    pub confirmation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            image_extensions: ["jpg", "jpeg", "gif", "ico", "png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_probe_length: 2048,
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            marker: "OSR__DS_FILE_HDR".to_string(),
            exempt_domains: Vec::new(),
            partner_overrides: Vec::new(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec!['N', 'R', 'F'],
            marker_token: "Q".to_string(),
        }
    }
}

impl Default for MissingAttachmentConfig {
    fn default() -> Self {
        Self {
            keywords: ["attachment", "attached", "enclosed", "附件", "附檔", "檢附"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            title: "Attachment reminder".to_string(),
            not_match_recipients: "Some recipients are not cleared for the attached project files"
                .to_string(),
            recipient_detail: "<{address}> is not on the recipient list for {project}".to_string(),
            encrypted: "Attachment has not been encrypted".to_string(),
            naming_violation:
                "Attachment may be an untranslated document or its file name breaks the naming rule"
                    .to_string(),
            missing_attachment: "You may have forgotten to attach a file".to_string(),
            confirmation: "Send the message anyway?".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut projects = BTreeMap::new();
        projects.insert(
            "N20200861".to_string(),
            vec![
                "unihancorp.com".to_string(),
                "pegatroncorp.com".to_string(),
                "hotmail.com".to_string(),
            ],
        );
        projects.insert("N20200862".to_string(), vec!["gmail.com".to_string()]);
        projects.insert("N20200863".to_string(), vec!["gmail.com".to_string()]);

        Config {
            attachments: AttachmentConfig::default(),
            recipients: RecipientConfig::default(),
            encryption: EncryptionConfig::default(),
            naming: NamingConfig::default(),
            missing_attachment: MissingAttachmentConfig::default(),
            messages: MessagesConfig::default(),
            projects,
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {path}"))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path}"))?;
        Ok(())
    }

    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            let config = Self::from_file(path)?;
            log::info!("Loaded configuration from: {path}");
            Ok(config)
        } else {
            log::warn!("Configuration file '{path}' not found, using default configuration");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Regex::new(&self.encryption.marker).with_context(|| {
            format!("Invalid encryption marker pattern: {}", self.encryption.marker)
        })?;
        if self.naming.allowed_prefixes.is_empty() {
            anyhow::bail!("naming.allowed_prefixes must not be empty");
        }
        for (project, domains) in &self.projects {
            if domains.is_empty() {
                anyhow::bail!("Project {project} has no permitted domains");
            }
        }
        Ok(())
    }
}
