use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BriefError;

/// How candidate sources are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMode {
    /// Date and classification from the snippet and URL alone.
    SnippetOnly,
    /// Fetch each candidate page and prefer its explicit date fields.
    FullFetch,
}

/// Named run profile selecting retrieval behavior and item budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Full retrieval with page fetches, up to 3 items.
    Standard,
    /// Retrieval without page fetches, up to 3 items.
    Snippet,
    /// No retrieval; candidates are supplied as input, up to 5 items.
    Summarize,
}

impl FromStr for Preset {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Preset::Standard),
            "snippet" => Ok(Preset::Snippet),
            "summarize" => Ok(Preset::Summarize),
            other => Err(BriefError::Config(format!(
                "unknown preset {other:?}, expected standard, snippet or summarize"
            ))),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Preset::Standard => "standard",
            Preset::Snippet => "snippet",
            Preset::Summarize => "summarize",
        };
        write!(f, "{s}")
    }
}

/// Run configuration. Built from a preset, then adjusted from the
/// environment; the CLI applies its own overrides on top.
#[derive(Debug, Clone)]
pub struct BriefingConfig {
    pub preset: Preset,
    /// Absent key disables the search channel rather than failing the run.
    pub tavily_api_key: Option<String>,
    pub max_items: usize,
    pub verification: VerificationMode,
    pub results_per_query: usize,
    pub search_concurrency: usize,
    pub verify_concurrency: usize,
    /// Wall-clock budget for the whole run, in seconds.
    pub run_budget_secs: u64,
    /// Events scoring below this are dropped before ranking. Zero disables
    /// the gate.
    pub min_relevance_score: i32,
    pub feed_urls: Vec<String>,
    pub out_dir: PathBuf,
}

impl BriefingConfig {
    pub fn standard() -> Self {
        BriefingConfig {
            preset: Preset::Standard,
            tavily_api_key: None,
            max_items: 3,
            verification: VerificationMode::FullFetch,
            results_per_query: 5,
            search_concurrency: 5,
            verify_concurrency: 8,
            run_budget_secs: 120,
            min_relevance_score: 0,
            feed_urls: Vec::new(),
            out_dir: PathBuf::from("briefings"),
        }
    }

    pub fn snippet() -> Self {
        BriefingConfig {
            verification: VerificationMode::SnippetOnly,
            run_budget_secs: 60,
            preset: Preset::Snippet,
            ..Self::standard()
        }
    }

    pub fn summarize() -> Self {
        BriefingConfig {
            verification: VerificationMode::SnippetOnly,
            max_items: 5,
            run_budget_secs: 30,
            preset: Preset::Summarize,
            ..Self::standard()
        }
    }

    pub fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Standard => Self::standard(),
            Preset::Snippet => Self::snippet(),
            Preset::Summarize => Self::summarize(),
        }
    }

    /// Reads `BRIEFING_PRESET` plus per-field overrides. Malformed values
    /// fail here, before any network traffic.
    pub fn from_env() -> Result<Self, BriefError> {
        Self::from_env_with(None)
    }

    /// [`Self::from_env`] with the preset forced, for callers that take it
    /// as an argument instead of from the environment.
    pub fn from_env_with(preset: Option<Preset>) -> Result<Self, BriefError> {
        let preset = match preset {
            Some(preset) => preset,
            None => match env::var("BRIEFING_PRESET") {
                Ok(value) => value.parse()?,
                Err(_) => Preset::Standard,
            },
        };
        let mut config = Self::for_preset(preset);

        config.tavily_api_key = env::var("TAVILY_API_KEY").ok().filter(|k| !k.is_empty());

        if let Ok(value) = env::var("BRIEFING_MAX_ITEMS") {
            config.max_items = parse_env("BRIEFING_MAX_ITEMS", &value)?;
        }
        if let Ok(value) = env::var("BRIEFING_RUN_BUDGET_SECS") {
            config.run_budget_secs = parse_env("BRIEFING_RUN_BUDGET_SECS", &value)?;
        }
        if let Ok(value) = env::var("BRIEFING_MIN_SCORE") {
            config.min_relevance_score = parse_env("BRIEFING_MIN_SCORE", &value)?;
        }
        if let Ok(value) = env::var("BRIEFING_FEEDS") {
            config.feed_urls = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(value) = env::var("BRIEFING_OUT_DIR") {
            config.out_dir = PathBuf::from(value);
        }

        Ok(config)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, BriefError> {
    value
        .trim()
        .parse()
        .map_err(|_| BriefError::Config(format!("{key} must be a number, got {value:?}")))
}
