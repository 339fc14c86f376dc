use std::sync::LazyLock;

use biopulse_common::{Briefing, BriefingItem, Event, SourceRef, SourceType, VerifiedCandidate};
use biopulse_scout::domains::is_primary;
use chrono::NaiveDate;
use regex::Regex;

use crate::rank::order_events;

pub const MAX_HEADLINE_CHARS: usize = 100;
pub const MAX_SOURCES_PER_ITEM: usize = 4;

/// The article closer. Source text sometimes carries the same phrase, so
/// incoming copies get their colon softened before composition.
static WHY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(why this matters):").unwrap());

pub struct BriefingComposer {
    max_items: usize,
}

impl BriefingComposer {
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    /// Turn ranked events into the final briefing. Items are numbered from
    /// one in emission order; every text field is single-line with article
    /// paragraphs joined by a literal backslash-n marker.
    pub fn compose(&self, mut events: Vec<Event>, reference: NaiveDate) -> Briefing {
        order_events(&mut events, reference);
        events.truncate(self.max_items);

        let items = events
            .iter()
            .enumerate()
            .map(|(idx, event)| self.item_for(event, idx + 1, reference))
            .collect();

        Briefing {
            date: reference.format("%Y-%m-%d").to_string(),
            items,
        }
    }

    fn item_for(&self, event: &Event, number: usize, reference: NaiveDate) -> BriefingItem {
        let sources = attributed_sources(event);
        let headline = compose_headline(&event.representative.candidate.title);
        let lead = lead_paragraph(&event.representative);
        let preview = {
            let p = first_sentences(&lead, 2);
            if p.is_empty() { headline.clone() } else { p }
        };

        let mut paragraphs = vec![lead];
        if sources.len() > 1 {
            paragraphs.push(corroboration_paragraph(&sources));
        }
        paragraphs.push(provenance_paragraph(event, &sources, reference));
        paragraphs.push(why_paragraph(event.source_type()));

        BriefingItem {
            id: number.to_string(),
            headline,
            preview,
            article: paragraphs.join("\\n"),
            sources,
        }
    }
}

/// Representative first, remaining members by source quality, capped.
/// Members the verifier could not date carry nothing citable and are left
/// out of the attribution list.
fn attributed_sources(event: &Event) -> Vec<SourceRef> {
    let rep_id = event.representative.candidate.id;
    let mut rest: Vec<&VerifiedCandidate> = event
        .members
        .iter()
        .filter(|vc| vc.candidate.id != rep_id)
        .collect();
    rest.sort_by_key(|vc| (vc.verdict.source_type.priority(), vc.candidate.id));

    std::iter::once(&event.representative)
        .chain(rest.into_iter())
        .filter_map(source_ref)
        .take(MAX_SOURCES_PER_ITEM)
        .collect()
}

fn source_ref(vc: &VerifiedCandidate) -> Option<SourceRef> {
    let date = vc.verdict.resolved_date?;
    Some(SourceRef {
        name: display_name(&vc.candidate.domain),
        url: vc.candidate.url.clone(),
        source_type: vc.verdict.source_type,
        verified_date: date.format("%Y-%m-%d").to_string(),
    })
}

fn display_name(domain: &str) -> String {
    domain.trim_start_matches("www.").to_string()
}

fn compose_headline(title: &str) -> String {
    let clean = sanitize_line(&strip_emphasis(title));
    truncate_words(&clean, MAX_HEADLINE_CHARS)
}

fn lead_paragraph(vc: &VerifiedCandidate) -> String {
    let raw = if vc.candidate.snippet_or_body.trim().is_empty() {
        &vc.candidate.title
    } else {
        &vc.candidate.snippet_or_body
    };
    let softened = WHY_MARKER.replace_all(raw, "$1,");
    sanitize_line(&strip_emphasis(&softened))
}

fn corroboration_paragraph(sources: &[SourceRef]) -> String {
    let extra = sources.len() - 1;
    let plural = if extra == 1 { "source" } else { "sources" };
    format!(
        "Corroborated by {extra} additional {plural}, including {}.",
        sources[1].name
    )
}

fn provenance_paragraph(event: &Event, sources: &[SourceRef], reference: NaiveDate) -> String {
    let first_disclosed = event.verified_date().unwrap_or(reference);
    let primary = sources.iter().filter(|s| is_primary(s.source_type)).count();
    format!(
        "First disclosed by {} on {}. {primary} of {} attributed sources are primary.",
        display_name(&event.representative.candidate.domain),
        first_disclosed.format("%Y-%m-%d"),
        sources.len()
    )
}

fn why_paragraph(source_type: SourceType) -> String {
    let reason = match source_type {
        SourceType::Regulator => {
            "a regulatory decision changes what clinicians can offer and sets precedent for every program behind it"
        }
        SourceType::TrialRegistry => {
            "registry activity is often the earliest public signal of where a program is headed"
        }
        SourceType::Paper => {
            "peer-reviewed data is the strongest evidence the field gets that an approach holds up"
        }
        SourceType::Company => {
            "primary disclosures move partnering, financing, and the competitive map before commentary catches up"
        }
        SourceType::News | SourceType::Unverifiable => {
            "independent coverage at this level usually marks a development the field is actively watching"
        }
    };
    format!("Why this matters: {reason}.")
}

/// First `n` sentences of `text`, staying on one line. Periods inside
/// numbers or abbreviations without trailing whitespace do not end a
/// sentence.
fn first_sentences(text: &str, n: usize) -> String {
    let mut out = String::new();
    let mut count = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if matches!(c, '.' | '!' | '?') {
            match chars.peek() {
                Some(next) if next.is_whitespace() => {
                    count += 1;
                    if count == n {
                        break;
                    }
                }
                None => break,
                _ => {}
            }
        }
    }
    out.trim().to_string()
}

fn strip_emphasis(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '#' | '`'))
        .collect()
}

/// Collapse control characters and runs of whitespace into single spaces.
fn sanitize_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        let c = if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c };
        if c == ' ' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

/// Truncate to `limit` characters at a word boundary, appending an
/// ellipsis when anything was dropped.
fn truncate_words(text: &str, limit: usize) -> String {
    const ELLIPSIS: &str = "...";
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let budget = limit - ELLIPSIS.len();
    let mut kept = String::new();
    for word in text.split_whitespace() {
        let next_len = if kept.is_empty() {
            word.chars().count()
        } else {
            kept.chars().count() + 1 + word.chars().count()
        };
        if next_len > budget {
            break;
        }
        if !kept.is_empty() {
            kept.push(' ');
        }
        kept.push_str(word);
    }
    if kept.is_empty() {
        kept = text.chars().take(budget).collect();
    }
    kept.push_str(ELLIPSIS);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use biopulse_common::Confidence;
    use biopulse_scout::testing::{candidate, verified};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 30).unwrap()
    }

    fn member(title: &str, url: &str, snippet: &str, day: u32) -> VerifiedCandidate {
        verified(
            candidate(title, url, snippet),
            NaiveDate::from_ymd_opt(2025, 1, day),
            Confidence::High,
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
    fn items_are_numbered_in_emission_order() {
        let composer = BriefingComposer::new(3);
        let events = vec![
            event_of(vec![member(
                "FDA approves Zevaskyn",
                "https://www.fda.gov/news-events/zevaskyn",
                "The agency granted full approval.",
                30,
            )]),
            event_of(vec![member(
                "Readout covered",
                "https://www.statnews.com/2025/01/30/readout",
                "Topline data landed this morning.",
                30,
            )]),
        ];
        let briefing = composer.compose(events, reference());
        assert_eq!(briefing.date, "2025-01-30");
        assert_eq!(briefing.items.len(), 2);
        assert_eq!(briefing.items[0].id, "1");
        assert_eq!(briefing.items[1].id, "2");
        // regulator outranks news coverage
        assert!(briefing.items[0].headline.contains("Zevaskyn"));
    }

    #[test]
    fn max_items_caps_the_briefing() {
        let composer = BriefingComposer::new(1);
        let events = vec![
            event_of(vec![member("One", "https://example.com/a", "First story.", 30)]),
            event_of(vec![member("Two", "https://example.com/b", "Second story.", 30)]),
        ];
        let briefing = composer.compose(events, reference());
        assert_eq!(briefing.items.len(), 1);
    }

    #[test]
    fn long_headlines_truncate_at_a_word_boundary() {
        let title = "Regulators in three regions simultaneously clear a first in class genome editing treatment for a rare inherited metabolic disorder";
        let composer = BriefingComposer::new(1);
        let events = vec![event_of(vec![member(
            title,
            "https://www.fda.gov/news-events/clearance",
            "",
            30,
        )])];
        let briefing = composer.compose(events, reference());
        let headline = &briefing.items[0].headline;
        assert!(headline.chars().count() <= MAX_HEADLINE_CHARS);
        assert!(headline.ends_with("..."));
        let stem = headline.trim_end_matches("...").trim_end();
        assert!(title.starts_with(stem));
        assert!(title[stem.len()..].starts_with(' '));
    }

    #[test]
    fn article_uses_the_literal_paragraph_marker() {
        let composer = BriefingComposer::new(1);
        let events = vec![event_of(vec![member(
            "FDA approves Zevaskyn",
            "https://www.fda.gov/news-events/zevaskyn",
            "The agency granted full approval.\nDetails followed in a press call.",
            30,
        )])];
        let briefing = composer.compose(events, reference());
        let article = &briefing.items[0].article;
        assert!(article.contains("\\n"));
        assert!(!article.contains('\n'));
        assert!(!article.contains('\r'));
    }

    #[test]
    fn article_carries_exactly_one_why_marker() {
        let composer = BriefingComposer::new(1);
        let events = vec![event_of(vec![member(
            "FDA approves Zevaskyn",
            "https://www.fda.gov/news-events/zevaskyn",
            "Why this matters: the company already said so in its own framing.",
            30,
        )])];
        let briefing = composer.compose(events, reference());
        let article = &briefing.items[0].article;
        assert_eq!(article.matches("Why this matters:").count(), 1);
        assert!(article.ends_with('.'));
    }

    #[test]
    fn sources_are_capped_with_the_representative_first() {
        let members = vec![
            member(
                "FDA approves Zevaskyn",
                "https://www.fda.gov/news-events/zevaskyn",
                "Approval notice.",
                29,
            ),
            member("Coverage A", "https://www.statnews.com/a", "", 30),
            member("Coverage B", "https://www.reuters.com/b", "", 30),
            member("Coverage C", "https://www.endpts.com/c", "", 30),
            member("Coverage D", "https://www.fiercebiotech.com/d", "", 30),
        ];
        let composer = BriefingComposer::new(1);
        let briefing = composer.compose(vec![event_of(members)], reference());
        let sources = &briefing.items[0].sources;
        assert_eq!(sources.len(), MAX_SOURCES_PER_ITEM);
        assert_eq!(sources[0].name, "fda.gov");
        assert_eq!(sources[0].verified_date, "2025-01-29");
    }

    #[test]
    fn provenance_counts_primary_sources() {
        let members = vec![
            member(
                "FDA approves Zevaskyn",
                "https://www.fda.gov/news-events/zevaskyn",
                "Approval notice.",
                29,
            ),
            member(
                "Company statement",
                "https://ir.examplebio.com/news/zevaskyn",
                "",
                29,
            ),
            member("Coverage", "https://www.statnews.com/a", "", 30),
        ];
        let composer = BriefingComposer::new(1);
        let briefing = composer.compose(vec![event_of(members)], reference());
        let article = &briefing.items[0].article;
        assert!(article.contains("First disclosed by fda.gov on 2025-01-29."));
        assert!(article.contains("2 of 3 attributed sources are primary."));
    }

    #[test]
    fn preview_is_the_first_two_sentences() {
        let composer = BriefingComposer::new(1);
        let events = vec![event_of(vec![member(
            "Readout lands",
            "https://www.statnews.com/2025/01/30/readout",
            "Topline data landed this morning. The primary endpoint was met. Analysts expect a filing next quarter.",
            30,
        )])];
        let briefing = composer.compose(events, reference());
        assert_eq!(
            briefing.items[0].preview,
            "Topline data landed this morning. The primary endpoint was met."
        );
    }

    #[test]
    fn preview_falls_back_to_the_headline_for_bare_titles() {
        let composer = BriefingComposer::new(1);
        let events = vec![event_of(vec![member(
            "Readout lands",
            "https://www.statnews.com/2025/01/30/readout",
            "",
            30,
        )])];
        let briefing = composer.compose(events, reference());
        assert_eq!(briefing.items[0].preview, "Readout lands");
    }

    #[test]
    fn no_events_compose_to_an_empty_briefing() {
        let composer = BriefingComposer::new(3);
        let briefing = composer.compose(Vec::new(), reference());
        assert_eq!(briefing.date, "2025-01-30");
        assert!(briefing.items.is_empty());
    }
}
