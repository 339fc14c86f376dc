use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
const SEARCH_ATTEMPTS: u32 = 3;
const SEARCH_RETRY_BASE: Duration = Duration::from_millis(500);

/// One web search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}

/// Tavily web search adapter.
pub struct TavilySearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest {
    api_key: String,
    query: String,
    max_results: usize,
    include_raw_content: bool,
    search_depth: String,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilySearcher {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { api_key, client }
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let request = TavilySearchRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            max_results,
            include_raw_content: false,
            search_depth: "basic".to_string(),
        };

        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&request)
            .send()
            .await
            .context("Tavily request failed")?;

        if !response.status().is_success() {
            bail!("Tavily returned HTTP {}", response.status());
        }

        let parsed: TavilySearchResponse = response
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        Ok(parsed
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .map(|r| SearchResult {
                url: r.url,
                title: r.title,
                snippet: r.content,
            })
            .collect())
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let mut last_err = None;

        for attempt in 0..SEARCH_ATTEMPTS {
            if attempt > 0 {
                let backoff = SEARCH_RETRY_BASE * 3u32.pow(attempt - 1);
                let jitter = Duration::from_millis(rand::rng().random_range(0..500));
                tokio::time::sleep(backoff + jitter).await;
            }

            match self.try_search(query, max_results).await {
                Ok(results) => return Ok(results),
                Err(err) => {
                    warn!(query, attempt, error = %err, "Search attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("search failed for query {query}")))
    }
}
