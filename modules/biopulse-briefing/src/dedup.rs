use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use biopulse_common::{Event, VerifiedCandidate};
use chrono::NaiveDate;
use regex::Regex;

/// Jaccard similarity over title tokens at or above which two candidates
/// describe the same development.
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Maximum verified-date distance for any merge. Cross-outlet coverage of
/// one disclosure lands within a day; anything further apart is a different
/// development even when the wording matches.
const MAX_DATE_SKEW_DAYS: i64 = 1;

static TRIAL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(NCT\d{8}|ISRCTN\d{6,8}|EUCTR\d{4}-\d{6}-\d{2})\b").unwrap()
});

static DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b10\.\d{4,9}/[-._;()/:A-Za-z0-9]+").unwrap());

static PROGRAM_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}-\d{2,5}\b").unwrap());

static INN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z]{3,}(?:mab|cel|gene|vec|tide|siran|parvovec)\b").unwrap()
});

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "its", "with", "from", "after", "into", "over", "about", "amid",
    "this", "that", "are", "has", "have", "was", "were", "will", "new",
];

/// Words that never identify a drug or program, including month names that
/// would otherwise link unrelated same-day announcements.
const GENERIC_WORDS: &[&str] = &[
    "gene", "cell", "therapy", "therapies", "treatment", "approves", "approval", "approved",
    "grants", "granted", "announces", "announced", "clinical", "trial", "trials", "phase",
    "patients", "patient", "results", "data", "study", "studies", "first", "human", "drug",
    "drugs", "biotech", "pharma", "medicine", "medicines", "agency", "european", "commission",
    "breakthrough", "designation", "priority", "review", "submission", "accepts", "accepted",
    "update", "news", "wins", "receives", "received", "company", "january", "february", "march",
    "april", "august", "september", "october", "november", "december",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    ClinicalHold,
    Designation,
    Approval,
    Filing,
    Readout,
    Publication,
}

/// Everything the matcher needs about one candidate, extracted once.
struct Signature {
    trial_ids: BTreeSet<String>,
    dois: BTreeSet<String>,
    markers: BTreeSet<String>,
    action: Option<ActionKind>,
    title_tokens: BTreeSet<String>,
}

fn signature(vc: &VerifiedCandidate) -> Signature {
    let candidate = &vc.candidate;
    let combined = format!(
        "{} {} {}",
        candidate.title, candidate.snippet_or_body, candidate.url
    );

    let mut trial_ids = BTreeSet::new();
    for caps in TRIAL_ID.captures_iter(&combined) {
        trial_ids.insert(caps[1].to_uppercase());
    }

    let mut dois = BTreeSet::new();
    for m in DOI.find_iter(&combined) {
        let doi = m.as_str().trim_end_matches(['.', ',', ';', ')']);
        dois.insert(doi.to_lowercase());
    }

    let text_tokens = tokens(&format!("{} {}", candidate.title, candidate.snippet_or_body));
    let action = action_kind(&combined.to_lowercase(), &text_tokens);

    Signature {
        trial_ids,
        dois,
        markers: program_markers(&candidate.title),
        action,
        title_tokens: tokens(&candidate.title),
    }
}

fn tokens(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Tokens that plausibly name a drug or program: development codes like
/// AB-123, INN-suffixed names, and capitalized coined words.
fn program_markers(title: &str) -> BTreeSet<String> {
    let mut markers = BTreeSet::new();
    for m in PROGRAM_CODE.find_iter(title) {
        markers.insert(m.as_str().to_uppercase());
    }
    for m in INN_SUFFIX.find_iter(title) {
        markers.insert(m.as_str().to_lowercase());
    }
    for word in title.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() >= 5 && word.chars().next().is_some_and(|c| c.is_uppercase()) {
            let lower = word.to_lowercase();
            if !GENERIC_WORDS.contains(&lower.as_str()) && !STOPWORDS.contains(&lower.as_str()) {
                markers.insert(lower);
            }
        }
    }
    markers
}

fn action_kind(lower: &str, tokens: &BTreeSet<String>) -> Option<ActionKind> {
    if lower.contains("clinical hold") {
        return Some(ActionKind::ClinicalHold);
    }
    for phrase in [
        "fast track",
        "breakthrough therapy",
        "orphan drug",
        "priority review",
        "rmat designation",
    ] {
        if lower.contains(phrase) {
            return Some(ActionKind::Designation);
        }
    }
    for word in [
        "approval",
        "approves",
        "approved",
        "authorization",
        "authorisation",
        "clearance",
        "cleared",
    ] {
        if tokens.contains(word) {
            return Some(ActionKind::Approval);
        }
    }
    for word in ["bla", "nda", "maa", "ind"] {
        if tokens.contains(word) {
            return Some(ActionKind::Filing);
        }
    }
    for phrase in ["primary endpoint", "interim analysis", "topline"] {
        if lower.contains(phrase) {
            return Some(ActionKind::Readout);
        }
    }
    for word in ["readout", "results", "data"] {
        if tokens.contains(word) {
            return Some(ActionKind::Readout);
        }
    }
    for word in ["published", "publication"] {
        if tokens.contains(word) {
            return Some(ActionKind::Publication);
        }
    }
    None
}

fn title_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Merge decision for one pair. Dates must be close for any rule to apply;
/// then a shared registry id or DOI merges outright, a shared program
/// marker merges when the action type agrees, and near-identical titles
/// merge on wording alone.
fn same_event(
    a: &VerifiedCandidate,
    sig_a: &Signature,
    b: &VerifiedCandidate,
    sig_b: &Signature,
) -> bool {
    let (Some(date_a), Some(date_b)) = (a.verdict.resolved_date, b.verdict.resolved_date) else {
        return false;
    };
    if (date_a - date_b).num_days().abs() > MAX_DATE_SKEW_DAYS {
        return false;
    }

    if sig_a.trial_ids.intersection(&sig_b.trial_ids).next().is_some() {
        return true;
    }
    if sig_a.dois.intersection(&sig_b.dois).next().is_some() {
        return true;
    }
    if let (Some(action_a), Some(action_b)) = (sig_a.action, sig_b.action) {
        if action_a == action_b && sig_a.markers.intersection(&sig_b.markers).next().is_some() {
            return true;
        }
    }

    title_similarity(&sig_a.title_tokens, &sig_b.title_tokens) >= TITLE_SIMILARITY_THRESHOLD
}

/// Group candidates into events. Input order does not matter: candidates
/// are id-sorted first and merging is transitive, so any permutation of the
/// same input yields the same clusters.
pub fn cluster(mut verified: Vec<VerifiedCandidate>) -> Vec<Event> {
    verified.sort_by_key(|vc| vc.candidate.id);
    let signatures: Vec<Signature> = verified.iter().map(signature).collect();

    let mut parent: Vec<usize> = (0..verified.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..verified.len() {
        for j in (i + 1)..verified.len() {
            if same_event(&verified[i], &signatures[i], &verified[j], &signatures[j]) {
                let root_i = find(&mut parent, i);
                let root_j = find(&mut parent, j);
                if root_i != root_j {
                    parent[root_j.max(root_i)] = root_j.min(root_i);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..verified.len() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }

    let mut events = Vec::new();
    for indices in groups.into_values() {
        let members: Vec<VerifiedCandidate> =
            indices.into_iter().map(|i| verified[i].clone()).collect();
        let Some(representative) = select_representative(&members) else {
            continue;
        };
        events.push(Event {
            representative,
            members,
        });
    }
    events.sort_by_key(|event| event.representative.candidate.id);
    events
}

/// The member that speaks for the cluster: best source type, then the
/// earliest verified date (first disclosure), then the strongest
/// confidence, then the smallest id to settle exact ties.
fn select_representative(members: &[VerifiedCandidate]) -> Option<VerifiedCandidate> {
    members
        .iter()
        .min_by_key(|vc| {
            (
                vc.verdict.source_type.priority(),
                vc.verdict.resolved_date.unwrap_or(NaiveDate::MAX),
                std::cmp::Reverse(vc.verdict.confidence),
                vc.candidate.id,
            )
        })
        .cloned()
}
