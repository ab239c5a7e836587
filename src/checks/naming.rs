use crate::checks::{AttachmentCheck, CheckContext, CheckResult, WarningCategory};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::EvaluationError;
use crate::filename::FilenameParts;
use std::fmt;

/// Tokens in `{project}_{description}_{marker}_{date}`.
pub const NAMING_TOKEN_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingViolation {
    TokenCount(usize),
    ShortProjectCode(String),
    ProjectPrefix(Option<char>),
    MarkerToken(String),
    DateToken { found: String, expected: String },
}

impl fmt::Display for NamingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingViolation::TokenCount(count) => {
                write!(f, "expected {NAMING_TOKEN_COUNT} tokens, found {count}")
            }
            NamingViolation::ShortProjectCode(code) => {
                write!(f, "project code '{code}' is too short")
            }
            NamingViolation::ProjectPrefix(Some(c)) => write!(f, "project prefix '{c}' not allowed"),
            NamingViolation::ProjectPrefix(None) => write!(f, "empty project code"),
            NamingViolation::MarkerToken(token) => write!(f, "unexpected marker token '{token}'"),
            NamingViolation::DateToken { found, expected } => {
                write!(f, "date token '{found}' is not today's '{expected}'")
            }
        }
    }
}

pub struct NamingConventionValidator {
    allowed_prefixes: Vec<char>,
    marker_token: String,
}

impl NamingConventionValidator {
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_prefixes: config.naming.allowed_prefixes.clone(),
            marker_token: config.naming.marker_token.clone(),
        }
    }

    /// First rule the name breaks, checked in grammar order.
    ///
    /// The date token is compared with the evaluation-time date, so a name
    /// prepared before midnight fails after it.
    pub fn violation(&self, parts: &FilenameParts, clock: &dyn Clock) -> Option<NamingViolation> {
        if parts.tokens.len() != NAMING_TOKEN_COUNT {
            return Some(NamingViolation::TokenCount(parts.tokens.len()));
        }

        if parts.normalized_project_code.is_none() {
            return Some(NamingViolation::ShortProjectCode(parts.project_code_raw.clone()));
        }

        let prefix = parts.tokens[0].chars().next();
        if !prefix.is_some_and(|c| self.allowed_prefixes.contains(&c)) {
            return Some(NamingViolation::ProjectPrefix(prefix));
        }

        if parts.tokens[2] != self.marker_token {
            return Some(NamingViolation::MarkerToken(parts.tokens[2].clone()));
        }

        let expected = clock.month_day();
        if parts.tokens[3] != expected {
            return Some(NamingViolation::DateToken {
                found: parts.tokens[3].clone(),
                expected,
            });
        }

        None
    }
}

impl AttachmentCheck for NamingConventionValidator {
    fn check(&self, context: &CheckContext<'_>) -> Result<CheckResult, EvaluationError> {
        match self.violation(context.parts, context.clock) {
            Some(violation) => {
                log::debug!(
                    "Attachment {} breaks naming convention: {violation}",
                    context.attachment.display_name
                );
                Ok(CheckResult::triggered(self.name(), self.category(), Vec::new()))
            }
            None => Ok(CheckResult::pass(self.name(), self.category())),
        }
    }

    fn name(&self) -> &str {
        "naming_convention"
    }

    fn category(&self) -> WarningCategory {
        WarningCategory::NamingViolation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::filename::FilenameClassifier;

    fn parts(name: &str, clock: &FixedClock) -> FilenameParts {
        FilenameClassifier::new(&[]).classify(name, clock)
    }

    fn validator() -> NamingConventionValidator {
        NamingConventionValidator::from_config(&Config::default())
    }

    #[test]
    fn test_valid_name_passes() {
        let clock = FixedClock::ymd(2020, 12, 31).unwrap();
        assert_eq!(validator().violation(&parts("N0861_Chip_Q_1231.pptx", &clock), &clock), None);
        assert_eq!(validator().violation(&parts("F20200861_Chip_Q_1231.xlsx", &clock), &clock), None);
    }

    #[test]
    fn test_wrong_marker_token() {
        let clock = FixedClock::ymd(2020, 12, 31).unwrap();
        assert_eq!(
            validator().violation(&parts("N0861_Chip_X_1231.pptx", &clock), &clock),
            Some(NamingViolation::MarkerToken("X".to_string()))
        );
    }

    #[test]
    fn test_token_count() {
        let clock = FixedClock::ymd(2020, 4, 9).unwrap();
        assert_eq!(
            validator().violation(&parts("N0861_Hairpin_Chip_R2_Q_0409.pptx", &clock), &clock),
            Some(NamingViolation::TokenCount(6))
        );
        assert_eq!(
            validator().violation(&parts("report.pdf", &clock), &clock),
            Some(NamingViolation::TokenCount(1))
        );
    }

    #[test]
    fn test_disallowed_prefix() {
        let clock = FixedClock::ymd(2020, 4, 9).unwrap();
        assert_eq!(
            validator().violation(&parts("X0861_Chip_Q_0409.pptx", &clock), &clock),
            Some(NamingViolation::ProjectPrefix(Some('X')))
        );
    }

    #[test]
    fn test_stale_date_token() {
        let clock = FixedClock::ymd(2021, 1, 1).unwrap();
        let violation = validator().violation(&parts("N0861_Chip_Q_1231.pptx", &clock), &clock);
        assert_eq!(
            violation,
            Some(NamingViolation::DateToken {
                found: "1231".to_string(),
                expected: "0101".to_string()
            })
        );
    }

    #[test]
    fn test_short_project_code_fails_closed() {
        let clock = FixedClock::ymd(2020, 4, 9).unwrap();
        assert_eq!(
            validator().violation(&parts("N1_Chip_Q_0409.pptx", &clock), &clock),
            Some(NamingViolation::ShortProjectCode("N1".to_string()))
        );
    }
}
