use std::time::Duration;

use anyhow::{bail, Context, Result};
use biopulse_common::{AdmissibilityWindow, Candidate};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dates::capture_date_evidence;
use crate::domains::{extract_domain, sanitize_url};
use crate::fetch::html_to_text;

const FEED_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ENTRIES_PER_FEED: usize = 30;
const USER_AGENT: &str = "BioPulseBot/1.0";

/// RSS/Atom channel. Entries already stamped outside the window are skipped
/// early; undated entries pass through for the verifier to judge.
pub struct FeedCollector {
    client: reqwest::Client,
    window: AdmissibilityWindow,
}

impl FeedCollector {
    pub fn new(window: AdmissibilityWindow) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { client, window }
    }

    pub async fn collect(&self, feed_urls: &[String]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for feed_url in feed_urls {
            match self.fetch_feed(feed_url).await {
                Ok(mut found) => {
                    debug!(feed = %feed_url, entries = found.len(), "Feed fetched");
                    candidates.append(&mut found);
                }
                Err(err) => {
                    warn!(feed = %feed_url, error = %err, "Feed fetch failed, skipping");
                }
            }
        }
        candidates
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Candidate>> {
        let response = self
            .client
            .get(feed_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .with_context(|| format!("failed to fetch feed {feed_url}"))?;

        if !response.status().is_success() {
            bail!("feed {feed_url} returned HTTP {}", response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read feed body from {feed_url}"))?;

        let feed = feed_rs::parser::parse(&bytes[..])
            .with_context(|| format!("failed to parse feed {feed_url}"))?;

        Ok(candidates_from_feed(feed, feed_url, &self.window))
    }
}

fn candidates_from_feed(
    feed: feed_rs::model::Feed,
    feed_url: &str,
    window: &AdmissibilityWindow,
) -> Vec<Candidate> {
    let origin = format!("feed:{feed_url}");
    let mut candidates = Vec::new();

    for entry in feed.entries.into_iter().take(MAX_ENTRIES_PER_FEED) {
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()));
        let Some(link) = link else { continue };

        let title = entry.title.map(|t| t.content).unwrap_or_default();
        if title.trim().is_empty() {
            continue;
        }

        let published = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&chrono::Utc));
        if let Some(stamp) = published {
            if !window.admits_date(stamp.date_naive()) {
                continue;
            }
        }

        let snippet = entry
            .summary
            .map(|t| html_to_text(&t.content))
            .unwrap_or_default();
        let url = sanitize_url(&link);

        let mut evidence = capture_date_evidence(&url, &snippet);
        if let Some(stamp) = published {
            let iso = stamp.date_naive().format("%Y-%m-%d").to_string();
            evidence = if evidence.is_empty() {
                iso
            } else {
                format!("{iso} {evidence}")
            };
        }

        candidates.push(Candidate {
            id: Uuid::new_v4(),
            query_origin: origin.clone(),
            title,
            snippet_or_body: snippet,
            domain: extract_domain(&url),
            raw_date_evidence: evidence,
            url,
        });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use biopulse_common::RunClock;
    use chrono::NaiveDate;

    const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Biotech Wire</title>
    <item>
      <title>Zevaskyn wins approval</title>
      <link>https://www.fiercebiotech.com/biotech/zevaskyn-approval</link>
      <description>&lt;p&gt;The therapy was approved this week.&lt;/p&gt;</description>
      <pubDate>Wed, 29 Jan 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Old platform deal</title>
      <link>https://www.fiercebiotech.com/biotech/platform-deal</link>
      <pubDate>Mon, 06 Jan 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated preprint note</title>
      <link>https://www.biorxiv.org/content/10.1101/2025.01.29.634001</link>
    </item>
    <item>
      <description>no title on this one</description>
      <link>https://www.fiercebiotech.com/biotech/untitled</link>
    </item>
  </channel>
</rss>"#;

    fn window() -> AdmissibilityWindow {
        RunClock::for_date(NaiveDate::from_ymd_opt(2025, 1, 30).unwrap()).window()
    }

    fn parse_fixture() -> Vec<Candidate> {
        let feed = feed_rs::parser::parse(FEED_XML.as_bytes()).unwrap();
        candidates_from_feed(feed, "https://www.fiercebiotech.com/rss", &window())
    }

    #[test]
    fn stamped_in_window_entry_becomes_a_candidate() {
        let candidates = parse_fixture();
        let hit = candidates
            .iter()
            .find(|c| c.title == "Zevaskyn wins approval")
            .unwrap();
        assert_eq!(hit.query_origin, "feed:https://www.fiercebiotech.com/rss");
        assert_eq!(hit.domain, "www.fiercebiotech.com");
        assert!(hit.raw_date_evidence.starts_with("2025-01-29"));
        assert_eq!(hit.snippet_or_body, "The therapy was approved this week.");
    }

    #[test]
    fn stale_stamped_entry_is_skipped_early() {
        let candidates = parse_fixture();
        assert!(!candidates.iter().any(|c| c.title == "Old platform deal"));
    }

    #[test]
    fn undated_entry_passes_through_for_verification() {
        let candidates = parse_fixture();
        assert!(candidates
            .iter()
            .any(|c| c.title == "Undated preprint note"));
    }

    #[test]
    fn untitled_entry_is_dropped() {
        let candidates = parse_fixture();
        assert_eq!(candidates.len(), 2);
    }
}
