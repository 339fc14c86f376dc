use std::fmt;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Source classification
// ---------------------------------------------------------------------------

/// Where a disclosure lives on the web, ordered by editorial weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Peer-reviewed journal or preprint server.
    Paper,
    /// Regulatory agency (FDA, EMA, national agencies).
    Regulator,
    /// Clinical trial registry entry.
    TrialRegistry,
    /// Company-owned domain carrying its own press release.
    Company,
    /// Secondary press coverage.
    News,
    /// Domain could not be classified; never emitted.
    Unverifiable,
}

impl SourceType {
    /// Ranking priority. Lower sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            SourceType::Regulator => 0,
            SourceType::TrialRegistry => 1,
            SourceType::Paper => 2,
            SourceType::Company => 3,
            SourceType::News => 4,
            SourceType::Unverifiable => 5,
        }
    }

    /// Whether this type may appear in a published briefing.
    pub fn is_emittable(&self) -> bool {
        !matches!(self, SourceType::Unverifiable)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::Paper => "paper",
            SourceType::Regulator => "regulator",
            SourceType::TrialRegistry => "trial_registry",
            SourceType::Company => "company",
            SourceType::News => "news",
            SourceType::Unverifiable => "unverifiable",
        };
        write!(f, "{s}")
    }
}

/// How much we trust a resolved date.
///
/// Ordering is derived, so `Low < Medium < High` holds for comparisons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Which textual shape a date was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    /// Full `YYYY-MM-DD`, the only shape trusted at low confidence.
    Iso,
    /// `/YYYY/MM/DD/` URL path segments.
    UrlPath,
    /// `YYYYMMDD` run inside a filename or slug.
    Compact,
    /// Spelled-out month, e.g. `January 29, 2025`.
    MonthName,
}

// ---------------------------------------------------------------------------
// Pipeline units
// ---------------------------------------------------------------------------

/// A single retrieval hit. Immutable once constructed; downstream stages
/// attach verdicts rather than editing candidates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// The query text or `feed:<url>` channel that produced this hit.
    pub query_origin: String,
    pub title: String,
    #[serde(default)]
    pub snippet_or_body: String,
    pub url: String,
    /// Registrable domain extracted from the URL, lowercased.
    #[serde(default)]
    pub domain: String,
    /// Date-looking substrings captured verbatim from the URL and snippet.
    #[serde(default)]
    pub raw_date_evidence: String,
}

/// Outcome of verifying one candidate. A verdict always exists, even when
/// verification failed; absence of a date is expressed as `resolved_date: None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub candidate_id: Uuid,
    pub resolved_date: Option<NaiveDate>,
    pub source_type: SourceType,
    pub is_primary_source: bool,
    pub confidence: Confidence,
    /// Which grammar produced `resolved_date`, when one did.
    pub date_pattern: Option<DatePattern>,
}

/// A candidate paired with its verdict, the unit flowing from the
/// verification barrier onward.
#[derive(Debug, Clone)]
pub struct VerifiedCandidate {
    pub candidate: Candidate,
    pub verdict: VerificationVerdict,
}

/// A cluster of candidates judged to describe the same real-world
/// development. `members` always contains the representative and is sorted
/// by candidate id so cluster output is stable across runs.
#[derive(Debug, Clone)]
pub struct Event {
    pub representative: VerifiedCandidate,
    pub members: Vec<VerifiedCandidate>,
}

impl Event {
    pub fn verified_date(&self) -> Option<NaiveDate> {
        self.representative.verdict.resolved_date
    }

    pub fn source_type(&self) -> SourceType {
        self.representative.verdict.source_type
    }

    pub fn confidence(&self) -> Confidence {
        self.representative.verdict.confidence
    }
}

// ---------------------------------------------------------------------------
// Published artifact
// ---------------------------------------------------------------------------

/// One attributed source behind a briefing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Calendar date the disclosure was verified to, `YYYY-MM-DD`.
    pub verified_date: String,
}

/// One item of the daily briefing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BriefingItem {
    /// Sequential decimal id, `"1"` upward, assigned at compose time.
    pub id: String,
    pub headline: String,
    pub preview: String,
    /// Multi-paragraph body. Paragraphs are joined with the literal
    /// two-character sequence `\n`; the string never contains a real newline.
    pub article: String,
    pub sources: Vec<SourceRef>,
}

/// The complete artifact for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Briefing {
    /// Reference date of the run, `YYYY-MM-DD`.
    pub date: String,
    pub items: Vec<BriefingItem>,
}

impl Briefing {
    /// The degraded artifact: correct shape, no items.
    pub fn empty(date: NaiveDate) -> Self {
        Briefing {
            date: date.format("%Y-%m-%d").to_string(),
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_priority_orders_regulator_first() {
        assert!(SourceType::Regulator.priority() < SourceType::TrialRegistry.priority());
        assert!(SourceType::TrialRegistry.priority() < SourceType::Paper.priority());
        assert!(SourceType::Paper.priority() < SourceType::Company.priority());
        assert!(SourceType::Company.priority() < SourceType::News.priority());
        assert!(SourceType::News.priority() < SourceType::Unverifiable.priority());
    }

    #[test]
    fn unverifiable_is_not_emittable() {
        assert!(!SourceType::Unverifiable.is_emittable());
        assert!(SourceType::News.is_emittable());
        assert!(SourceType::Regulator.is_emittable());
    }

    #[test]
    fn confidence_ordering_is_low_to_high() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn source_type_serializes_snake_case() {
        let json = serde_json::to_string(&SourceType::TrialRegistry).unwrap();
        assert_eq!(json, "\"trial_registry\"");
    }

    #[test]
    fn source_ref_renames_type_field() {
        let source = SourceRef {
            name: "fda.gov".into(),
            url: "https://fda.gov/news/x".into(),
            source_type: SourceType::Regulator,
            verified_date: "2025-01-29".into(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "regulator");
        assert!(json.get("source_type").is_none());
    }

    #[test]
    fn candidate_deserializes_with_defaults() {
        let json = r#"{
            "query_origin": "gene therapy approval",
            "title": "FDA approves new gene therapy",
            "url": "https://www.fda.gov/news/2025/01/29/approval"
        }"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.title, "FDA approves new gene therapy");
        assert!(candidate.snippet_or_body.is_empty());
        assert!(candidate.domain.is_empty());
        assert!(!candidate.id.is_nil());
    }

    #[test]
    fn empty_briefing_has_date_and_no_items() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let briefing = Briefing::empty(date);
        assert_eq!(briefing.date, "2025-01-30");
        assert!(briefing.items.is_empty());
    }
}
