use std::sync::Arc;

use biopulse_common::Candidate;
use futures::{stream, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dates::capture_date_evidence;
use crate::domains::{extract_domain, sanitize_url};
use crate::search::{SearchResult, WebSearcher};

/// Fans queries out to the searcher and folds the hits into candidates.
/// A failing query is logged and dropped; untitled hits are skipped.
pub struct CandidateCollector {
    searcher: Arc<dyn WebSearcher>,
    results_per_query: usize,
    concurrency: usize,
}

impl CandidateCollector {
    pub fn new(searcher: Arc<dyn WebSearcher>, results_per_query: usize, concurrency: usize) -> Self {
        Self {
            searcher,
            results_per_query,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn collect(&self, queries: &[String]) -> Vec<Candidate> {
        let outcomes: Vec<_> = stream::iter(queries.iter().cloned().map(|query| {
            let searcher = Arc::clone(&self.searcher);
            let limit = self.results_per_query;
            async move {
                let outcome = searcher.search(&query, limit).await;
                (query, outcome)
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let mut candidates = Vec::new();
        for (query, outcome) in outcomes {
            match outcome {
                Ok(results) => {
                    debug!(query = %query, hits = results.len(), "Search complete");
                    for result in results {
                        if result.title.trim().is_empty() {
                            continue;
                        }
                        candidates.push(candidate_from_hit(&query, result));
                    }
                }
                Err(err) => {
                    warn!(query = %query, error = %err, "Search failed, dropping query");
                }
            }
        }

        dedup_candidates(candidates)
    }
}

/// Build a candidate from one search hit, capturing date evidence from the
/// sanitized URL and snippet.
pub fn candidate_from_hit(query: &str, hit: SearchResult) -> Candidate {
    let url = sanitize_url(&hit.url);
    Candidate {
        id: Uuid::new_v4(),
        query_origin: query.to_string(),
        raw_date_evidence: capture_date_evidence(&url, &hit.snippet),
        domain: extract_domain(&url),
        title: hit.title,
        snippet_or_body: hit.snippet,
        url,
    }
}

/// Collapse URL-identical candidates, whatever channel produced them. The
/// survivor is chosen by URL-then-id order so merge results do not depend on
/// arrival order.
pub fn dedup_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| a.url.cmp(&b.url).then(a.id.cmp(&b.id)));
    candidates.dedup_by(|a, b| a.url == b.url);
    candidates
}
