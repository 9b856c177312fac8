use super::{advisor_error::AdvisorError, advisor_query::AdvisorQuery};
use crate::{config::AdvisorConfig, event};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answers mission questions in natural language.
#[async_trait]
pub trait MissionAdvisor: Send + Sync {
    async fn ask(&self, query: &AdvisorQuery) -> Result<String, AdvisorError>;
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct AdvisorReply {
    response: String,
}

#[derive(Deserialize)]
struct AdvisorFailure {
    error: String,
    details: Option<String>,
}

/// JSON-over-HTTP client for the advisor proxy endpoint.
#[derive(Debug)]
pub struct HttpAdvisor {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpAdvisor {
    pub const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self::with_client(client, config.url.clone()))
    }

    pub(crate) fn with_client(client: reqwest::Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    async fn read_reply(response: reqwest::Response) -> Result<String, AdvisorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<AdvisorReply>().await?.response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(AdvisorError::upstream("Advisor endpoint not found", None));
        }
        match response.json::<AdvisorFailure>().await {
            Ok(failure) => Err(AdvisorError::upstream(failure.error, failure.details)),
            Err(_) => Err(AdvisorError::upstream(format!("Server error: {status}"), None)),
        }
    }
}

#[async_trait]
impl MissionAdvisor for HttpAdvisor {
    async fn ask(&self, query: &AdvisorQuery) -> Result<String, AdvisorError> {
        let url = self.url.as_deref().ok_or(AdvisorError::MissingConfiguration)?;
        event!("Forwarding advisor query to {url}");
        let response = self.client.post(url).json(&QueryBody { query: query.text() }).send().await?;
        Self::read_reply(response).await
    }
}
