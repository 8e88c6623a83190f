use std::time::Duration;

use fake_user_agent::get_chrome_rua;
use reqwest::{header::USER_AGENT, Client, StatusCode};

use crate::configuration::ScraperSettings;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("empty response body")]
    EmptyBody,
}

/// One shared outbound HTTP client for campaign page fetches. Built once at
/// startup and handed to the routes through `web::Data`.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    user_agent: Option<String>,
}

impl PageFetcher {
    pub fn new(settings: &ScraperSettings) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .expect("Failed to build the http client.");

        PageFetcher {
            client,
            user_agent: settings.user_agent.clone(),
        }
    }

    /// Issues a single GET and returns the body as text. Campaign hosts tend
    /// to block obvious bots, so every request goes out with a browser
    /// user-agent. One shot only: no retry, no partial result.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let user_agent = match &self.user_agent {
            Some(pinned) => pinned.clone(),
            None => get_chrome_rua().to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        match body.is_empty() {
            true => Err(FetchError::EmptyBody),
            false => Ok(body),
        }
    }
}
