use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use crate::config::{ClientConfig, MAX_BATCH};
use crate::error::{ICiteError, Result};
use crate::icite::models::Record;
use crate::icite::responses::{PubsResponse, WireRecord};
use crate::icite::service::CitationService;
use crate::rate_limit::RateLimiter;
use crate::retry::with_retry;

/// Client for the NIH iCite `pubs` API
#[derive(Clone)]
pub struct ICiteClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl ICiteClient {
    /// Create a new iCite client with default configuration
    ///
    /// # Example
    ///
    /// ```
    /// use icite_client::ICiteClient;
    ///
    /// let client = ICiteClient::new();
    /// ```
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a new iCite client with custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use icite_client::{ClientConfig, ICiteClient};
    ///
    /// let config = ClientConfig::new()
    ///     .with_rate_limit(2.0)
    ///     .with_user_agent("citation-survey/0.3");
    ///
    /// let client = ICiteClient::with_config(config);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();

        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(Duration::from_secs(config.timeout.as_secs()))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            rate_limiter,
            config,
        }
    }

    /// Create a new iCite client around an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        let config = ClientConfig::new();
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();

        Self {
            client,
            base_url,
            rate_limiter,
            config,
        }
    }

    /// Issue a GET with rate limiting and retry; non-success statuses become `ApiError`
    async fn make_request(&self, url: &str) -> Result<Response> {
        let response = with_retry(
            || async {
                self.rate_limiter.acquire().await?;
                debug!("Making API request to: {}", url);
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(ICiteError::from)?;

                if response.status().as_u16() == 429 {
                    return Err(ICiteError::RateLimitExceeded);
                }
                if response.status().is_server_error() {
                    return Err(ICiteError::ApiError {
                        status: response.status().as_u16(),
                        message: response
                            .status()
                            .canonical_reason()
                            .unwrap_or("Unknown error")
                            .to_string(),
                    });
                }

                Ok(response)
            },
            &self.config.retry_config,
            "iCite API request",
        )
        .await?;

        if !response.status().is_success() {
            warn!("API request failed with status: {}", response.status());
            return Err(ICiteError::ApiError {
                status: response.status().as_u16(),
                message: response
                    .status()
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CitationService for ICiteClient {
    #[instrument(skip(self))]
    async fn fetch_one(&self, pmid: u32) -> Result<Record> {
        let url = format!("{}/pubs/{}", self.base_url, pmid);

        let response = match self.make_request(&url).await {
            Err(ICiteError::ApiError { status: 404, .. }) => {
                return Err(ICiteError::ArticleNotFound { pmid });
            }
            other => other?,
        };

        let wire: WireRecord = response.json().await?;
        Ok(Record::from_wire(wire))
    }

    #[instrument(skip(self, pmids), fields(pmids_count = pmids.len()))]
    async fn fetch_batch(&self, pmids: &[u32]) -> Result<Vec<Record>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }
        if pmids.len() > MAX_BATCH {
            return Err(ICiteError::BatchTooLarge {
                requested: pmids.len(),
                maximum: MAX_BATCH,
            });
        }

        let id_list = pmids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let url = format!(
            "{}/pubs?pmids={}&format=json",
            self.base_url,
            urlencoding::encode(&id_list)
        );

        debug!(batch_size = pmids.len(), "Making batch pubs API request");
        let response = self.make_request(&url).await?;
        let body: PubsResponse = response.json().await?;

        let records: Vec<Record> = body
            .into_wire_records()
            .into_iter()
            .map(Record::from_wire)
            .collect();
        info!(
            requested = pmids.len(),
            received = records.len(),
            "Batch pubs request completed"
        );
        Ok(records)
    }
}

impl Default for ICiteClient {
    fn default() -> Self {
        Self::new()
    }
}
