//! GitHub profile names as accepted by the roast frame.

use thiserror::Error;

const MAX_PROFILE_LEN: usize = 39;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileNameError {
    #[error("profile name is empty")]
    Empty,
    #[error("profile name exceeds {MAX_PROFILE_LEN} characters")]
    TooLong,
    #[error("profile name `{0}` contains characters GitHub does not allow")]
    Invalid(String),
}

/// A syntactically valid GitHub username.
///
/// Alphanumerics and single inner hyphens only; never starts or ends with a
/// hyphen. Case is preserved for display, comparisons go through
/// [`ProfileName::eq_ignore_case`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileName(String);

impl ProfileName {
    pub fn parse(input: &str) -> Result<Self, ProfileNameError> {
        let trimmed = input.trim().trim_start_matches('@');
        if trimmed.is_empty() {
            return Err(ProfileNameError::Empty);
        }
        if trimmed.chars().count() > MAX_PROFILE_LEN {
            return Err(ProfileNameError::TooLong);
        }

        let valid_chars = trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        let valid_shape =
            !trimmed.starts_with('-') && !trimmed.ends_with('-') && !trimmed.contains("--");
        if !valid_chars || !valid_shape {
            return Err(ProfileNameError::Invalid(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl std::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
