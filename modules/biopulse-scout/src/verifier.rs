use std::sync::{Arc, LazyLock};

use biopulse_common::{Candidate, Confidence, DatePattern, SourceType, VerificationVerdict};
use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use crate::dates::parse_date_evidence;
use crate::domains::{classify, is_primary};
use crate::fetch::{FetchedPage, PageFetcher, MIN_ARTICLE_CHARS};

/// Resolves each candidate to a dated, classified verdict.
///
/// Verification never fails: a fetch error or missing date degrades the
/// verdict instead of erroring, so one bad page cannot sink a run.
pub struct SourceVerifier {
    fetcher: Option<Arc<dyn PageFetcher>>,
}

impl SourceVerifier {
    /// Snippet-only mode: judge from URL and captured evidence alone.
    pub fn snippet_only() -> Self {
        Self { fetcher: None }
    }

    /// Full-fetch mode: retrieve each page and prefer its explicit dates.
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher: Some(fetcher),
        }
    }

    pub async fn verify(&self, candidate: &Candidate) -> VerificationVerdict {
        let source_type = classify(&candidate.url);
        let primary = is_primary(source_type);

        match &self.fetcher {
            Some(fetcher) => {
                self.verify_fetched(candidate, source_type, primary, fetcher.as_ref())
                    .await
            }
            None => self.verify_snippet(candidate, source_type, primary),
        }
    }

    fn verify_snippet(
        &self,
        candidate: &Candidate,
        source_type: SourceType,
        primary: bool,
    ) -> VerificationVerdict {
        match parse_date_evidence(&candidate.raw_date_evidence) {
            Some((date, pattern)) => VerificationVerdict {
                candidate_id: candidate.id,
                resolved_date: Some(date),
                source_type,
                is_primary_source: primary,
                confidence: Confidence::Medium,
                date_pattern: Some(pattern),
            },
            None => VerificationVerdict {
                candidate_id: candidate.id,
                resolved_date: None,
                source_type,
                is_primary_source: primary,
                confidence: Confidence::Low,
                date_pattern: None,
            },
        }
    }

    async fn verify_fetched(
        &self,
        candidate: &Candidate,
        source_type: SourceType,
        primary: bool,
        fetcher: &dyn PageFetcher,
    ) -> VerificationVerdict {
        let page = match fetcher.fetch(&candidate.url).await {
            Ok(page) => page,
            Err(err) => {
                warn!(url = %candidate.url, error = %err, "Page fetch failed, falling back to snippet evidence");
                let mut verdict = self.verify_snippet(candidate, source_type, primary);
                verdict.confidence = Confidence::Low;
                return verdict;
            }
        };

        if let Some((date, pattern)) = extract_page_date(&page) {
            return VerificationVerdict {
                candidate_id: candidate.id,
                resolved_date: Some(date),
                source_type,
                is_primary_source: primary,
                confidence: Confidence::High,
                date_pattern: Some(pattern),
            };
        }

        // No explicit field on the page; fall back to the snippet grammar.
        // Thin pages cannot corroborate, so they cap confidence at low.
        let mut verdict = self.verify_snippet(candidate, source_type, primary);
        if page.text.chars().count() < MIN_ARTICLE_CHARS {
            verdict.confidence = Confidence::Low;
        }
        verdict
    }
}

// ---------------------------------------------------------------------------
// Explicit page dates
// ---------------------------------------------------------------------------

static META_NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta[^>]*?(?:property|name|itemprop)\s*=\s*["'](?:article:published_time|og:published_time|datepublished|date|dc\.date(?:\.issued)?|pubdate)["'][^>]*?content\s*=\s*["']([^"']+)["']"#,
    )
    .unwrap()
});

static META_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta[^>]*?content\s*=\s*["']([^"']+)["'][^>]*?(?:property|name|itemprop)\s*=\s*["'](?:article:published_time|og:published_time|datepublished|date|dc\.date(?:\.issued)?|pubdate)["']"#,
    )
    .unwrap()
});

static JSON_LD_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""datePublished"\s*:\s*"([^"]+)""#).unwrap());

static TIME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<time[^>]*?datetime\s*=\s*["']([^"']+)["']"#).unwrap());

static DATE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\b(?:published|posted|issued|released|release date|publication date)\b[:\s]")
        .unwrap()
});

/// Explicit machine-readable or labeled dates on the page itself. These are
/// the only evidence that earns high confidence.
fn extract_page_date(page: &FetchedPage) -> Option<(NaiveDate, DatePattern)> {
    for re in [&META_NAME_FIRST, &META_CONTENT_FIRST, &JSON_LD_DATE, &TIME_TAG] {
        for caps in re.captures_iter(&page.html) {
            if let Some(parsed) = parse_date_evidence(&caps[1]) {
                return Some(parsed);
            }
        }
    }

    for label in DATE_LABEL.find_iter(&page.text) {
        let tail: String = page.text[label.end()..].chars().take(48).collect();
        if let Some(parsed) = parse_date_evidence(&tail) {
            return Some(parsed);
        }
    }

    None
}
