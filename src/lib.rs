pub mod checks;
pub mod clock;
pub mod config;
pub mod domain_utils;
pub mod error;
pub mod evaluator;
pub mod filename;
pub mod hook;
pub mod message;
pub mod message_file;
pub mod registry;

pub use checks::WarningCategory;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::EvaluationError;
pub use evaluator::{ComplianceEvaluator, Verdict};
pub use hook::{pre_send, ConfirmPrompt, SendDecision};
pub use message::{Attachment, MailItem, Message, Recipient};
pub use registry::ProjectDomainRegistry;
