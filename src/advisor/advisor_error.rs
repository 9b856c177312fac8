use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    /// The query text was rejected before any request was made.
    Validation(String),
    /// No advisor endpoint is configured.
    MissingConfiguration,
    /// The endpoint failed, answered with an error or sent an unreadable body.
    Upstream { error: String, details: Option<String> },
}

impl AdvisorError {
    pub(super) fn upstream(error: impl Into<String>, details: Option<String>) -> Self {
        AdvisorError::Upstream { error: error.into(), details }
    }
}

impl Display for AdvisorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvisorError::Validation(msg) => write!(f, "Invalid advisor query: {msg}"),
            AdvisorError::MissingConfiguration => write!(f, "No advisor endpoint configured"),
            AdvisorError::Upstream { error, details: Some(details) } => {
                write!(f, "Advisor request failed: {error} ({details})")
            }
            AdvisorError::Upstream { error, details: None } => {
                write!(f, "Advisor request failed: {error}")
            }
        }
    }
}

impl std::error::Error for AdvisorError {}

impl From<reqwest::Error> for AdvisorError {
    fn from(value: reqwest::Error) -> Self {
        let error = if value.is_timeout() {
            "Request timed out"
        } else if value.is_connect() {
            "Cannot connect to advisor"
        } else if value.is_decode() {
            "Invalid response format from advisor"
        } else {
            "Transport error"
        };
        AdvisorError::upstream(error, Some(value.to_string()))
    }
}
