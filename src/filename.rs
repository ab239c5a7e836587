//! Attachment display-name classification.
//!
//! A display name like `N0861_Chip_Q_0409.pptx` is split into its extension,
//! the underscore-delimited stem tokens, and the project code carried by the
//! first token. Legacy short codes (`N0861`) are expanded with the current
//! year (`N20200861`) so they line up with registry keys.

use crate::clock::Clock;

/// Number of characters taken from the legacy code after its prefix letter.
const LEGACY_CODE_DIGITS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameParts {
    pub raw_stem: String,
    pub extension: String,
    pub tokens: Vec<String>,
    pub project_code_raw: String,
    /// `None` when the raw code is too short to expand.
    pub normalized_project_code: Option<String>,
    pub is_image: bool,
}

pub struct FilenameClassifier {
    image_extensions: Vec<String>,
}

impl FilenameClassifier {
    pub fn new(image_extensions: &[String]) -> Self {
        Self {
            image_extensions: image_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, display_name: &str, clock: &dyn Clock) -> FilenameParts {
        let (stem, extension) = split_extension(display_name);
        let is_image = !extension.is_empty()
            && self
                .image_extensions
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(extension));

        let tokens: Vec<String> = stem.split('_').map(str::to_string).collect();
        let project_code_raw = tokens.first().cloned().unwrap_or_default();
        let normalized_project_code = normalize_project_code(&project_code_raw, &clock.year());

        FilenameParts {
            raw_stem: stem.to_string(),
            extension: extension.to_lowercase(),
            tokens,
            project_code_raw,
            normalized_project_code,
            is_image,
        }
    }
}

/// Split off the text after the last `.`. A leading dot is part of the stem.
fn split_extension(display_name: &str) -> (&str, &str) {
    match display_name.rfind('.') {
        Some(pos) if pos > 0 => (&display_name[..pos], &display_name[pos + 1..]),
        _ => (display_name, ""),
    }
}

/// Expand a legacy code to `<prefix><year><next four chars>`.
///
/// Codes that already contain `year` are returned unchanged. Codes with fewer
/// than five characters cannot be expanded and yield `None`.
pub fn normalize_project_code(raw: &str, year: &str) -> Option<String> {
    if raw.contains(year) {
        return Some(raw.to_string());
    }

    let mut chars = raw.chars();
    let prefix = chars.next()?;
    let digits: String = chars.take(LEGACY_CODE_DIGITS).collect();
    if digits.chars().count() < LEGACY_CODE_DIGITS {
        return None;
    }

    Some(format!("{prefix}{year}{digits}"))
}
