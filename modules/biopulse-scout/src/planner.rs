use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::taxonomy::TopicBranch;

/// Floor on planned queries per run.
pub const MIN_QUERIES: usize = 8;
/// Ceiling, to keep search spend bounded.
pub const MAX_QUERIES: usize = 24;

/// Deterministic query plan for one run: branch coverage first, then
/// `site:` scoped probes of primary domains, then dated variants anchored to
/// the reference date. Same date and domain list, same plan.
pub fn plan(reference: NaiveDate, site_domains: &[&str]) -> Vec<String> {
    let branches = TopicBranch::ALL;
    let mut queries = Vec::new();

    for branch in branches {
        let quoted: Vec<String> = branch
            .phrases()
            .iter()
            .map(|phrase| format!("\"{phrase}\""))
            .collect();
        queries.push(quoted.join(" OR "));
    }

    for (i, domain) in site_domains.iter().enumerate() {
        let branch = branches[i % branches.len()];
        let phrase = branch.phrases()[0];
        queries.push(format!("site:{domain} {phrase}"));
    }

    let anchor = format!(
        "\"{} {}, {}\"",
        month_name(reference),
        reference.day(),
        reference.year()
    );
    for branch in branches.iter().take(3) {
        queries.push(format!("{} {anchor}", branch.phrases()[0]));
    }

    let mut seen = HashSet::new();
    queries.retain(|q| seen.insert(q.clone()));
    queries.truncate(MAX_QUERIES);
    queries
}

fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}
