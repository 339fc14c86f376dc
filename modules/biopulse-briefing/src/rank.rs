use biopulse_common::{Event, VerifiedCandidate};
use biopulse_scout::domains::domain_matches;
use chrono::NaiveDate;

/// Phrases that mark a development as squarely on-beat. Matched against
/// lowercased title plus snippet.
const KEYWORDS_MODALITY: &[&str] = &[
    "gene therapy",
    "cell therapy",
    "car-t",
    "aav",
    "crispr",
    "base editing",
    "prime editing",
    "in vivo",
];

const KEYWORDS_CLINICAL: &[&str] = &[
    "clinical trial",
    "phase i",
    "phase ii",
    "first-in-human",
    "patients",
];

/// Outlets whose coverage is worth surfacing even when the wording is dry.
const HIGH_VALUE_DOMAINS: &[&str] = &[
    "nature.com",
    "cell.com",
    "nejm.org",
    "science.org",
    "ema.europa.eu",
    "fda.gov",
];

const MODALITY_POINTS: i32 = 3;
const CLINICAL_POINTS: i32 = 2;
const DOMAIN_POINTS: i32 = 3;

pub fn relevance_score(vc: &VerifiedCandidate, reference: NaiveDate) -> i32 {
    let text = format!("{} {}", vc.candidate.title, vc.candidate.snippet_or_body).to_lowercase();
    let mut score = 0;

    for keyword in KEYWORDS_MODALITY {
        if text.contains(keyword) {
            score += MODALITY_POINTS;
        }
    }
    for keyword in KEYWORDS_CLINICAL {
        if text.contains(keyword) {
            score += CLINICAL_POINTS;
        }
    }
    if HIGH_VALUE_DOMAINS
        .iter()
        .any(|d| domain_matches(&vc.candidate.domain, d))
    {
        score += DOMAIN_POINTS;
    }
    if let Some(date) = vc.verdict.resolved_date {
        match (reference - date).num_days() {
            0 => score += 2,
            1 => score += 1,
            _ => {}
        }
    }

    score
}

/// An event scores as well as its best member does.
pub fn event_score(event: &Event, reference: NaiveDate) -> i32 {
    event
        .members
        .iter()
        .map(|vc| relevance_score(vc, reference))
        .max()
        .unwrap_or(0)
}

/// Order events for emission: authoritative source types first, then
/// stronger date confidence, then newer dates, then higher relevance.
/// Representative id settles exact ties so the order is total.
pub fn order_events(events: &mut [Event], reference: NaiveDate) {
    events.sort_by_cached_key(|event| {
        (
            event.source_type().priority(),
            std::cmp::Reverse(event.confidence()),
            std::cmp::Reverse(event.verified_date().unwrap_or(NaiveDate::MIN)),
            std::cmp::Reverse(event_score(event, reference)),
            event.representative.candidate.id,
        )
    });
}

/// Drop events below the configured relevance floor. A floor at or below
/// zero admits everything.
pub fn apply_relevance_gate(events: Vec<Event>, min_score: i32, reference: NaiveDate) -> Vec<Event> {
    if min_score <= 0 {
        return events;
    }
    events
        .into_iter()
        .filter(|event| event_score(event, reference) >= min_score)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use biopulse_common::Confidence;
    use biopulse_scout::testing::{candidate, verified};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 30).unwrap()
    }

    fn scored(title: &str, url: &str, snippet: &str, day: u32) -> VerifiedCandidate {
        verified(
            candidate(title, url, snippet),
            NaiveDate::from_ymd_opt(2025, 1, day),
            Confidence::Medium,
        )
    }

    fn event_of(members: Vec<VerifiedCandidate>) -> Event {
        let representative = members[0].clone();
        Event {
            representative,
            members,
        }
    }

    #[test]
    fn modality_keywords_outscore_generic_coverage() {
        let on_beat = scored(
            "CRISPR gene therapy clears phase i hurdle",
            "https://www.statnews.com/2025/01/30/crispr",
            "an in vivo base editing approach",
            30,
        );
        let generic = scored(
            "Biotech stock moves on analyst note",
            "https://finance.example.com/stock-note",
            "shares rose in early trading",
            30,
        );
        assert!(relevance_score(&on_beat, reference()) > relevance_score(&generic, reference()));
    }

    #[test]
    fn high_value_domain_adds_points() {
        let journal = scored(
            "New study on durable editing",
            "https://www.nature.com/articles/s41586",
            "",
            30,
        );
        let blog = scored(
            "New study on durable editing",
            "https://www.randomblog.com/editing",
            "",
            30,
        );
        assert_eq!(
            relevance_score(&journal, reference()) - relevance_score(&blog, reference()),
            DOMAIN_POINTS
        );
    }

    #[test]
    fn fresher_dates_score_higher() {
        let today = scored("Gene therapy readout", "https://example.com/a", "", 30);
        let yesterday = scored("Gene therapy readout", "https://example.com/b", "", 29);
        let older = scored("Gene therapy readout", "https://example.com/c", "", 28);
        let r = reference();
        assert!(relevance_score(&today, r) > relevance_score(&yesterday, r));
        assert!(relevance_score(&yesterday, r) > relevance_score(&older, r));
    }

    #[test]
    fn event_takes_its_best_member_score() {
        let weak = scored("Company update", "https://example.com/weak", "", 29);
        let strong = scored(
            "CRISPR cell therapy clinical trial update",
            "https://www.nejm.org/doi/full/10.1056/x",
            "first-in-human data in patients",
            30,
        );
        let solo_strong = event_of(vec![strong.clone()]);
        let mixed = event_of(vec![weak, strong]);
        assert_eq!(
            event_score(&mixed, reference()),
            event_score(&solo_strong, reference())
        );
    }

    #[test]
    fn regulator_events_sort_before_news() {
        let news = event_of(vec![scored(
            "Zevaskyn approval covered",
            "https://www.statnews.com/2025/01/30/zevaskyn",
            "",
            30,
        )]);
        let regulator = event_of(vec![scored(
            "FDA approves Zevaskyn",
            "https://www.fda.gov/news-events/zevaskyn",
            "",
            29,
        )]);
        let mut events = vec![news, regulator];
        order_events(&mut events, reference());
        assert_eq!(
            events[0].representative.candidate.domain,
            "www.fda.gov".to_string()
        );
    }

    #[test]
    fn higher_confidence_sorts_first_within_a_type() {
        let low = event_of(vec![verified(
            candidate("Story one", "https://www.reuters.com/a", ""),
            NaiveDate::from_ymd_opt(2025, 1, 30),
            Confidence::Low,
        )]);
        let high = event_of(vec![verified(
            candidate("Story two", "https://www.statnews.com/b", ""),
            NaiveDate::from_ymd_opt(2025, 1, 30),
            Confidence::High,
        )]);
        let mut events = vec![low, high];
        order_events(&mut events, reference());
        assert_eq!(events[0].confidence(), Confidence::High);
        assert_eq!(events[1].confidence(), Confidence::Low);
    }

    #[test]
    fn newer_dates_sort_first_when_type_and_confidence_tie() {
        let older = event_of(vec![scored(
            "Readout one",
            "https://www.statnews.com/one",
            "",
            28,
        )]);
        let newer = event_of(vec![scored(
            "Readout two",
            "https://www.statnews.com/two",
            "",
            30,
        )]);
        let mut events = vec![older, newer];
        order_events(&mut events, reference());
        assert_eq!(
            events[0].verified_date(),
            NaiveDate::from_ymd_opt(2025, 1, 30)
        );
    }

    #[test]
    fn relevance_gate_drops_low_scorers() {
        let on_beat = event_of(vec![scored(
            "CRISPR gene therapy trial doses patients",
            "https://www.statnews.com/2025/01/30/crispr",
            "a phase i clinical trial",
            30,
        )]);
        let off_beat = event_of(vec![scored(
            "Quarterly earnings call scheduled",
            "https://ir.example.com/earnings",
            "webcast details",
            28,
        )]);
        let kept = apply_relevance_gate(vec![on_beat, off_beat], 3, reference());
        assert_eq!(kept.len(), 1);
        assert!(kept[0].representative.candidate.title.contains("CRISPR"));
    }

    #[test]
    fn zero_floor_disables_the_gate() {
        let off_beat = event_of(vec![scored(
            "Quarterly earnings call scheduled",
            "https://ir.example.com/earnings",
            "webcast details",
            28,
        )]);
        let kept = apply_relevance_gate(vec![off_beat], 0, reference());
        assert_eq!(kept.len(), 1);
    }
}
