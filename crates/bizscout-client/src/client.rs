//! HTTP client for the listing search API.
//!
//! Wraps `reqwest` with bearer-token auth, error-envelope detection, retry
//! on transient failures and per-listing decode. Implements
//! [`bizscout_core::SearchApi`] so the session can drive it.

use std::time::Duration;

use async_trait::async_trait;
use bizscout_core::{AppConfig, ItemId, PageQuery, Review, SearchApi, SearchPage};
use reqwest::{Client, StatusCode, Url};

use crate::decode::{decode_page, decode_review};
use crate::error::SearchError;
use crate::retry::retry_with_backoff;
use crate::types::{ApiErrorBody, BusinessResponse, SearchResponse};

const DEFAULT_BASE_URL: &str = "https://api.yelp.com/v2/";
const DEFAULT_USER_AGENT: &str = "bizscout/0.1 (listing-browser)";

/// Client for the listing search API.
///
/// Use [`SearchClient::from_config`] in the binary or
/// [`SearchClient::with_base_url`] to point at a mock server in tests.
pub struct SearchClient {
    client: Client,
    api_key: String,
    base_url: Url,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SearchClient {
    /// Creates a client pointed at the production API with no retries.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL, DEFAULT_USER_AGENT)
    }

    /// Creates a client from application configuration, including its
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SearchError::InvalidBaseUrl`] if the configured URL is unusable.
    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        Ok(Self::with_base_url(
            &config.api_key,
            config.request_timeout_secs,
            &config.api_base_url,
            &config.user_agent,
        )?
        .with_retry_policy(config.max_retries, config.retry_backoff_base_ms))
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SearchError::InvalidBaseUrl`] if `base_url` does not parse or
    /// cannot carry path segments.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
        user_agent: &str,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so endpoint segments append to the
        // base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| SearchError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(SearchError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Sets how many times transient failures are retried and the base
    /// back-off delay.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches one page of listings.
    ///
    /// Malformed listings are dropped from the page; see
    /// [`crate::decode::decode_page`].
    ///
    /// # Errors
    ///
    /// - [`SearchError::Api`] if the API returns an error envelope.
    /// - [`SearchError::RateLimited`] / [`SearchError::Http`] once retries
    ///   are exhausted.
    /// - [`SearchError::UnexpectedStatus`] on other non-2xx statuses.
    /// - [`SearchError::Deserialize`] if the body is not a search response.
    pub async fn search_page(&self, query: &PageQuery) -> Result<SearchPage, SearchError> {
        let url = self.search_url(query)?;
        let body = self.request_json(&url).await?;

        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| SearchError::Deserialize {
                context: format!(
                    "search(term={}, offset={})",
                    query.criteria.term, query.offset
                ),
                source: e,
            })?;

        let page = decode_page(response);
        tracing::debug!(
            term = %query.criteria.term,
            offset = query.offset,
            raw_count = page.raw_count,
            decoded = page.items.len(),
            total = ?page.total,
            "fetched search page"
        );
        Ok(page)
    }

    /// Fetches the reviews embedded in a business detail response.
    ///
    /// # Errors
    ///
    /// Same as [`Self::search_page`].
    pub async fn business_reviews(&self, id: &ItemId) -> Result<Vec<Review>, SearchError> {
        let url = self.endpoint(&["business", id.as_str()])?;
        let body = self.request_json(&url).await?;

        let response: BusinessResponse =
            serde_json::from_value(body).map_err(|e| SearchError::Deserialize {
                context: format!("business(id={id})"),
                source: e,
            })?;

        let reviews = response
            .reviews
            .into_iter()
            .filter_map(|value| match decode_review(value) {
                Ok(review) => Some(review),
                Err(error) => {
                    tracing::warn!(business_id = %id, %error, "dropping malformed review");
                    None
                }
            })
            .collect();
        Ok(reviews)
    }

    /// Builds the `search` URL with every criteria field as a query pair.
    fn search_url(&self, query: &PageQuery) -> Result<Url, SearchError> {
        let criteria = &query.criteria;
        let mut url = self.endpoint(&["search"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("term", &criteria.term);
            pairs.append_pair("ll", &criteria.location.to_string());
            pairs.append_pair("offset", &query.offset.to_string());
            pairs.append_pair("limit", &query.limit.to_string());
            if let Some(sort) = criteria.sort {
                pairs.append_pair("sort", &sort.wire_value().to_string());
            }
            if !criteria.categories.is_empty() {
                pairs.append_pair("category_filter", &criteria.categories.join(","));
            }
            if criteria.deals_only {
                pairs.append_pair("deals_filter", "true");
            }
            if let Some(radius) = criteria.radius_meters {
                pairs.append_pair("radius_filter", &radius.to_string());
            }
        }
        Ok(url)
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SearchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SearchError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated GET, classifies the status, and parses the
    /// body as JSON, retrying transient failures.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, SearchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .bearer_auth(&self.api_key)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());
                    return Err(SearchError::RateLimited { retry_after_secs });
                }

                let body = response.text().await?;

                if !status.is_success() {
                    if let Some(err) = parse_error_envelope(&body) {
                        return Err(err);
                    }
                    return Err(SearchError::UnexpectedStatus {
                        status: status.as_u16(),
                        path: url.path().to_owned(),
                    });
                }

                let value: serde_json::Value =
                    serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
                        context: url.path().to_owned(),
                        source: e,
                    })?;
                if let Some(err) = error_from_value(&value) {
                    return Err(err);
                }
                Ok(value)
            }
        })
        .await
    }
}

/// Parses an `{"error": {...}}` envelope out of a raw body, if it is one.
fn parse_error_envelope(body: &str) -> Option<SearchError> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(error_from_value)
}

/// Any non-null `error` member makes the body an API failure, whatever its
/// shape.
fn error_from_value(value: &serde_json::Value) -> Option<SearchError> {
    let error = value.get("error").filter(|e| !e.is_null())?;
    let (id, text) = match serde_json::from_value::<ApiErrorBody>(error.clone()) {
        Ok(body) => (body.id, body.text),
        Err(_) => {
            let text = error
                .as_str()
                .map_or_else(|| error.to_string(), str::to_owned);
            (None, Some(text))
        }
    };
    Some(SearchError::Api {
        id: id.unwrap_or_else(|| "UNKNOWN".to_owned()),
        text: text.unwrap_or_else(|| "unknown error".to_owned()),
    })
}

#[async_trait]
impl SearchApi for SearchClient {
    type Error = SearchError;

    async fn search(&self, query: &PageQuery) -> Result<SearchPage, SearchError> {
        self.search_page(query).await
    }

    async fn reviews(&self, id: &ItemId) -> Result<Vec<Review>, SearchError> {
        self.business_reviews(id).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
