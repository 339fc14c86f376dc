use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::warn;

/// Page text shorter than this is treated as non-substantive (login walls,
/// redirect stubs) and cannot raise verification confidence.
pub const MIN_ARTICLE_CHARS: usize = 800;
/// Page text is cut here before date scanning.
pub const MAX_ARTICLE_CHARS: usize = 12_000;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const FETCH_ATTEMPTS: u32 = 3;
const FETCH_RETRY_BASE: Duration = Duration::from_millis(500);
const MAX_CONCURRENT_FETCHES: usize = 8;
const USER_AGENT: &str = "BioPulseBot/1.0";

/// A recoverable retrieval failure. The pipeline logs these and moves on;
/// they never abort a run.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("fetch timed out for {url}")]
    Timeout { url: String },

    #[error("fetcher is shut down")]
    Closed,
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// A fetched page, with both the raw HTML (for metadata scanning) and the
/// visible text (for substance checks and labeled dates).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> RetrievalResult<FetchedPage>;
}

/// Plain HTTP fetcher with bounded concurrency and retry.
pub struct HttpFetcher {
    client: reqwest::Client,
    semaphore: Semaphore,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            semaphore: Semaphore::new(MAX_CONCURRENT_FETCHES),
        }
    }

    async fn try_fetch(&self, url: &str) -> RetrievalResult<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    RetrievalError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    RetrievalError::Fetch {
                        url: url.to_string(),
                        source,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|source| RetrievalError::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(page_from_html(url, html))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> RetrievalResult<FetchedPage> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RetrievalError::Closed)?;

        let mut last_err = None;

        for attempt in 0..FETCH_ATTEMPTS {
            if attempt > 0 {
                let backoff = FETCH_RETRY_BASE * 3u32.pow(attempt - 1);
                let jitter = Duration::from_millis(rand::rng().random_range(0..500));
                tokio::time::sleep(backoff + jitter).await;
            }

            match self.try_fetch(url).await {
                Ok(page) => return Ok(page),
                Err(err) => {
                    // Client errors other than rate limiting will not heal on
                    // retry.
                    if let RetrievalError::Status { status, .. } = &err {
                        if (400..500).contains(status) && *status != 429 {
                            return Err(err);
                        }
                    }
                    warn!(url, attempt, error = %err, "Fetch attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(RetrievalError::Timeout {
            url: url.to_string(),
        }))
    }
}

/// Build a `FetchedPage` from raw HTML, extracting title and visible text.
pub fn page_from_html(url: &str, html: String) -> FetchedPage {
    let title = extract_title(&html);
    let mut text = html_to_text(&html);
    if text.chars().count() > MAX_ARTICLE_CHARS {
        text = text.chars().take(MAX_ARTICLE_CHARS).collect();
    }
    FetchedPage {
        url: url.to_string(),
        title,
        html,
        text,
    }
}

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p>|</div>|</h[1-6]>|</li>|<br\s*/?>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Convert HTML to visible text (simplified).
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, " ");
    let text = decode_entities(&text);
    let text = SPACE_RE.replace_all(&text, " ");
    let text = NEWLINE_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Extract the document title, if any.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
