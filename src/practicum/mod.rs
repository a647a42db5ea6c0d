use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::PollError;

pub mod model;

pub use model::check_response;

/// Source of homework status updates.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetch every status change since `from_date` (Unix seconds) as raw JSON.
    async fn fetch(&self, from_date: i64) -> Result<Value, PollError>;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    pub fn new(token: String, endpoint: Url) -> Result<Self, PollError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let endpoint = cfg.endpoint()?;
        Ok(Self::new(cfg.credentials.practicum_token.clone(), endpoint)?)
    }

    pub fn build_request(&self, from_date: i64) -> Result<reqwest::Request, PollError> {
        Ok(self
            .http
            .get(self.endpoint.clone())
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()?)
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, PollError> {
        let request = self.build_request(from_date)?;
        debug!(url = %request.url(), "requesting homework statuses");

        let res = self.http.execute(request).await.map_err(|err| {
            error!(?err, "homework API is unreachable");
            PollError::Transport(err)
        })?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            error!(%status, %body, "homework API returned non-200 status");
            return Err(PollError::UnexpectedStatus(status));
        }

        let body = res.json::<Value>().await.map_err(|err| {
            error!(?err, "homework API returned an unreadable body");
            PollError::Transport(err)
        })?;
        debug!("homework API request succeeded");
        Ok(body)
    }
}
