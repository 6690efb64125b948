use crate::core::error::UpstreamError;
use crate::core::quote::{Quote, QuoteProvider, pair_key};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, instrument};

/// Rate source client for the AwesomeAPI `json/last/{PAIR}` endpoint.
pub struct AwesomeApiProvider {
    client: reqwest::Client,
    base_url: String,
    pair: String,
}

impl AwesomeApiProvider {
    pub fn new(base_url: &str, pair: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("cotacao/0.1").build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pair: pair.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/json/last/{}", self.base_url, self.pair)
    }
}

#[async_trait]
impl QuoteProvider for AwesomeApiProvider {
    #[instrument(name = "AwesomeApiFetch", skip(self), fields(pair = %self.pair))]
    async fn fetch_quote(&self) -> Result<Quote, UpstreamError> {
        let url = self.url();
        debug!("Requesting quote from {}", url);

        let transport = |e: reqwest::Error| UpstreamError::Transport(format!("{e} for URL: {url}"));
        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        debug!(%status, bytes = body.len(), "Received rate source response");

        Quote::from_response(&body, &pair_key(&self.pair)).map_err(|e| {
            error!(
                error = %e,
                %status,
                response = %String::from_utf8_lossy(&body),
                "Failed to parse rate source response"
            );
            match e {
                UpstreamError::Decode(msg) => UpstreamError::Decode(format!("{msg} (HTTP {status})")),
                other => other,
            }
        })
    }
}
