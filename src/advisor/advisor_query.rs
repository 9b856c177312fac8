use super::advisor_error::AdvisorError;

/// A validated free-text question for the mission advisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorQuery(String);

impl AdvisorQuery {
    pub const MAX_CHARS: usize = 1000;

    /// Trims `text` and checks it is non-empty and at most [`Self::MAX_CHARS`] characters.
    pub fn new(text: &str) -> Result<Self, AdvisorError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AdvisorError::Validation(String::from("query is empty")));
        }
        let len = trimmed.chars().count();
        if len > Self::MAX_CHARS {
            return Err(AdvisorError::Validation(format!(
                "query has {len} characters, at most {} allowed",
                Self::MAX_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn text(&self) -> &str { &self.0 }
}
