//! Mock adapters and fixture builders for tests. Compiled only for tests
//! and the `test-support` feature.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use biopulse_common::{Candidate, Confidence, VerificationVerdict, VerifiedCandidate};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::dates::capture_date_evidence;
use crate::domains::{classify, extract_domain, is_primary, sanitize_url};
use crate::fetch::{page_from_html, FetchedPage, PageFetcher, RetrievalError, RetrievalResult};
use crate::search::{SearchResult, WebSearcher};

// ---------------------------------------------------------------------------
// Mock adapters
// ---------------------------------------------------------------------------

/// In-memory searcher. Unregistered queries return no hits, so planner
/// output can grow without breaking tests; registered failures simulate a
/// provider outage for that query.
#[derive(Default, Clone)]
pub struct MockSearcher {
    results: HashMap<String, Vec<SearchResult>>,
    failures: HashSet<String>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failures.insert(query.to_string());
        self
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        if self.failures.contains(query) {
            bail!("MockSearcher: simulated failure for {query}");
        }
        Ok(self
            .results
            .get(query)
            .map(|results| results.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }
}

/// In-memory page fetcher. Unregistered URLs return HTTP 404; registered
/// failures return HTTP 503. An optional delay simulates slow origins for
/// budget tests.
#[derive(Default, Clone)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    failures: HashSet<String>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> RetrievalResult<FetchedPage> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.contains(url) {
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        match self.pages.get(url) {
            Some(html) => Ok(page_from_html(url, html.clone())),
            None => Err(RetrievalError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

pub fn search_result(title: &str, url: &str, snippet: &str) -> SearchResult {
    SearchResult {
        url: url.to_string(),
        title: title.to_string(),
        snippet: snippet.to_string(),
    }
}

/// Candidate built the way the collector builds one, with evidence captured
/// from the URL and snippet.
pub fn candidate(title: &str, url: &str, snippet: &str) -> Candidate {
    candidate_from(title, url, snippet, "test query")
}

pub fn candidate_from(title: &str, url: &str, snippet: &str, origin: &str) -> Candidate {
    let url = sanitize_url(url);
    Candidate {
        id: Uuid::new_v4(),
        query_origin: origin.to_string(),
        title: title.to_string(),
        snippet_or_body: snippet.to_string(),
        domain: extract_domain(&url),
        raw_date_evidence: capture_date_evidence(&url, snippet),
        url,
    }
}

/// Verdict consistent with the candidate's URL classification.
pub fn verdict_for(
    candidate: &Candidate,
    resolved_date: Option<NaiveDate>,
    confidence: Confidence,
) -> VerificationVerdict {
    let source_type = classify(&candidate.url);
    VerificationVerdict {
        candidate_id: candidate.id,
        resolved_date,
        source_type,
        is_primary_source: is_primary(source_type),
        confidence,
        date_pattern: None,
    }
}

pub fn verified(
    candidate: Candidate,
    resolved_date: Option<NaiveDate>,
    confidence: Confidence,
) -> VerifiedCandidate {
    let verdict = verdict_for(&candidate, resolved_date, confidence);
    VerifiedCandidate { candidate, verdict }
}

/// Stable id for assertions that depend on candidate ordering.
pub fn fixed_id(n: u8) -> Uuid {
    Uuid::parse_str(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_searcher_returns_registered_results() {
        let searcher = MockSearcher::new().on_search(
            "gene therapy",
            vec![search_result("Hit", "https://example.com/a", "text")],
        );
        let results = searcher.search("gene therapy", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Hit");
    }

    #[tokio::test]
    async fn mock_searcher_truncates_to_max_results() {
        let hits = (0..10)
            .map(|i| search_result("Hit", &format!("https://example.com/{i}"), ""))
            .collect();
        let searcher = MockSearcher::new().on_search("q", hits);
        let results = searcher.search("q", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn mock_searcher_fails_on_registered_failures() {
        let searcher = MockSearcher::new().failing("bad query");
        assert!(searcher.search("bad query", 5).await.is_err());
    }

    #[tokio::test]
    async fn mock_fetcher_serves_registered_pages() {
        let fetcher =
            MockFetcher::new().on_page("https://example.com/a", "<title>Hello</title><p>Body</p>");
        let page = fetcher.fetch("https://example.com/a").await.unwrap();
        assert_eq!(page.title, Some("Hello".to_string()));
        assert!(page.text.contains("Body"));
    }

    #[tokio::test]
    async fn mock_fetcher_404s_unregistered_urls() {
        let err = MockFetcher::new()
            .fetch("https://example.com/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Status { status: 404, .. }));
    }

    #[test]
    fn candidate_builder_captures_evidence() {
        let c = candidate(
            "Title",
            "https://example.com/2025/01/29/story",
            "published January 29, 2025",
        );
        assert_eq!(c.domain, "example.com");
        assert!(c.raw_date_evidence.contains("/2025/01/29/"));
    }

    #[test]
    fn fixed_ids_are_distinct_and_stable() {
        assert_eq!(fixed_id(1), fixed_id(1));
        assert_ne!(fixed_id(1), fixed_id(2));
    }
}
