//! Paper metadata lookup by DOI
//!
//! Provides a trait so the admin import can be driven by Crossref in
//! production and by canned data in tests.

use crate::config::CrossrefConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::models::UNKNOWN;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Metadata needed to add a paper and connect it to the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    /// First author's family name
    pub author: String,
    /// Principal investigator's family name
    pub pi: String,
    pub year: String,
    pub url: String,
    /// DOIs listed in the reference section
    pub references: Vec<String>,
    /// "Given Family" for every author
    pub all_authors: Vec<String>,
}

/// Trait for metadata providers
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for a DOI
    async fn fetch(&self, doi: &str) -> Result<PaperMetadata>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}

/// Crossref REST client
pub struct CrossrefClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

#[derive(Deserialize)]
struct WorkEnvelope {
    message: Value,
}

impl CrossrefClient {
    /// Create a new client from configuration
    pub fn new(config: &CrossrefConfig) -> Result<Self> {
        let user_agent = match &config.mailto {
            Some(mailto) => format!("Citagraph/{} (mailto:{})", crate::VERSION, mailto),
            None => format!("Citagraph/{}", crate::VERSION),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
        })
    }

    async fn request_with_retry(&self, doi: &str) -> Result<PaperMetadata> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(200 * 2_u64.pow(attempt));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(doi).await {
                Ok(metadata) => return Ok(metadata),
                Err(e @ AppError::MetadataNotFound { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        doi = %doi,
                        error = %e,
                        "Crossref request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::MetadataError {
            message: "Unknown error after retries".to_string(),
        }))
    }

    /// Works endpoint for a DOI; the DOI is a single encoded path segment
    fn work_url(&self, doi: &str) -> String {
        format!("{}/works/{}", self.base_url, urlencoding::encode(doi))
    }

    async fn make_request(&self, doi: &str) -> Result<PaperMetadata> {
        let url = self.work_url(doi);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::MetadataError {
                message: format!("Request failed: {}", e),
            }
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::MetadataNotFound { doi: doi.to_string() });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MetadataError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let envelope: WorkEnvelope = response.json().await.map_err(|e| {
            AppError::MetadataError {
                message: format!("Failed to parse response: {}", e),
            }
        })?;

        Ok(parse_work(doi, &envelope.message))
    }
}

#[async_trait]
impl MetadataSource for CrossrefClient {
    async fn fetch(&self, doi: &str) -> Result<PaperMetadata> {
        let start = Instant::now();
        let result = self.request_with_retry(doi).await;
        metrics::record_metadata_lookup(start.elapsed().as_secs_f64(), self.name(), result.is_ok());
        result
    }

    fn name(&self) -> &str {
        "crossref"
    }
}

/// Extract [`PaperMetadata`] from a Crossref `work` message
pub fn parse_work(doi: &str, work: &Value) -> PaperMetadata {
    let authors = work
        .get("author")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let family = |author: &Value| -> String {
        author
            .get("family")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_string()
    };

    let author = authors.first().map(family).unwrap_or_else(|| UNKNOWN.to_string());

    // Last author, unless a corresponding co-author is flagged
    let mut pi = UNKNOWN.to_string();
    if authors.len() > 1 {
        pi = authors.last().map(family).unwrap_or(pi);
        let corresponding = authors.iter().find(|a| {
            a.get("sequence").and_then(Value::as_str) == Some("additional")
                && a.get("corresponding").and_then(Value::as_bool).unwrap_or(false)
        });
        if let Some(a) = corresponding {
            if let Some(name) = a.get("family").and_then(Value::as_str) {
                pi = name.to_string();
            }
        }
    }

    let title = work
        .get("title")
        .and_then(Value::as_array)
        .and_then(|t| t.first())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let year = ["published-print", "published-online", "issued"]
        .iter()
        .find_map(|key| {
            work.get(*key)?
                .get("date-parts")?
                .get(0)?
                .get(0)?
                .as_i64()
        })
        .map(|y| y.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let references = work
        .get("reference")
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .filter_map(|r| r.get("DOI").and_then(Value::as_str))
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let all_authors = authors
        .iter()
        .map(|a| {
            let given = a.get("given").and_then(Value::as_str).unwrap_or_default();
            let family = a.get("family").and_then(Value::as_str).unwrap_or_default();
            format!("{} {}", given, family).trim().to_string()
        })
        .collect();

    PaperMetadata {
        title,
        author,
        pi,
        year,
        url: format!("https://doi.org/{}", doi),
        references,
        all_authors,
    }
}
