// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenCage reverse-geocoding API.
//!
//! Provides [`OpenCageClient`] which builds the request URL, maps quota
//! responses to [`TriplogError::RateLimitExceeded`] and retries once on
//! transient server errors.

use std::time::Duration;

use tracing::{debug, warn};
use triplog_core::TriplogError;
use url::Url;

use crate::types::GeocodeResponse;

/// HTTP client for OpenCage API communication.
#[derive(Debug, Clone)]
pub struct OpenCageClient {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    max_retries: u32,
}

impl OpenCageClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `api_key` - OpenCage API key
    /// * `language` - IETF language tag for formatted addresses (e.g. "fr")
    /// * `base_url` - geocoding endpoint
    /// * `timeout` - per-request timeout
    pub fn new(
        api_key: String,
        language: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, TriplogError> {
        Url::parse(&base_url)
            .map_err(|e| TriplogError::Config(format!("invalid geocode base_url `{base_url}`: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriplogError::ResolutionFailed {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            language,
            base_url,
            max_retries: 1,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn request_url(&self, latitude: f64, longitude: f64) -> Result<Url, TriplogError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("q", format!("{latitude},{longitude}")),
                ("key", self.api_key.clone()),
                ("language", self.language.clone()),
                ("no_annotations", "1".to_string()),
                ("limit", "1".to_string()),
            ],
        )
        .map_err(|e| TriplogError::Config(format!("invalid geocode base_url: {e}")))
    }

    /// Returns the formatted address of the best match for a coordinate.
    ///
    /// On transient errors (500, 503), retries once after a 1-second delay.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, TriplogError> {
        let url = self.request_url(latitude, longitude)?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying geocoding request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response =
                self.client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| TriplogError::ResolutionFailed {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    })?;

            let status = response.status();
            debug!(status = %status, attempt, "geocoding response received");

            if is_quota_error(status) {
                warn!(status = %status, "geocoding quota exhausted");
                return Err(TriplogError::RateLimitExceeded);
            }

            if status.is_success() {
                let body = response
                    .text()
                    .await
                    .map_err(|e| TriplogError::ResolutionFailed {
                        message: format!("failed to read response body: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                let parsed: GeocodeResponse =
                    serde_json::from_str(&body).map_err(|e| TriplogError::ResolutionFailed {
                        message: format!("failed to parse geocoding response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                if let Some(rate) = &parsed.rate {
                    debug!(
                        remaining = rate.remaining,
                        limit = rate.limit,
                        "geocoding quota"
                    );
                }
                return parsed
                    .results
                    .into_iter()
                    .next()
                    .map(|result| result.formatted)
                    .ok_or_else(|| TriplogError::ResolutionFailed {
                        message: format!("no address found for ({latitude}, {longitude})"),
                        source: None,
                    });
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<GeocodeResponse>(&body) {
                Ok(GeocodeResponse {
                    status: Some(api_status),
                    ..
                }) => format!(
                    "OpenCage API error ({}): {}",
                    api_status.code, api_status.message
                ),
                _ => format!("API returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(TriplogError::ResolutionFailed {
                    message,
                    source: None,
                });
                continue;
            }

            return Err(TriplogError::ResolutionFailed {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| TriplogError::ResolutionFailed {
            message: "geocoding request failed after retries".into(),
            source: None,
        }))
    }
}

/// 402 is OpenCage's "quota exceeded", 429 its "too many requests".
fn is_quota_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 402 | 429)
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503)
}
