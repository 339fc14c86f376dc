use biopulse_common::SourceType;
use url::Url;

// ---------------------------------------------------------------------------
// Domain tables
// ---------------------------------------------------------------------------

/// Peer-reviewed journals and preprint servers.
pub const PUBLISHER_DOMAINS: &[&str] = &[
    "nature.com",
    "cell.com",
    "nejm.org",
    "science.org",
    "thelancet.com",
    "sciencedirect.com",
    "pnas.org",
    "jamanetwork.com",
    "biorxiv.org",
    "medrxiv.org",
];

/// Drug regulators.
pub const REGULATOR_DOMAINS: &[&str] = &[
    "fda.gov",
    "ema.europa.eu",
    "mhra.gov.uk",
    "swissmedic.ch",
    "tga.gov.au",
    "pmda.go.jp",
];

/// Clinical trial registries. Checked before regulators so that
/// clinicaltrials.gov does not classify as a generic .gov site.
pub const REGISTRY_DOMAINS: &[&str] = &[
    "clinicaltrials.gov",
    "clinicaltrialsregister.eu",
    "isrctn.com",
    "anzctr.org.au",
];

/// Re-posting platforms. Classified as news and never primary.
pub const AGGREGATOR_DOMAINS: &[&str] = &[
    "news.google.com",
    "finance.yahoo.com",
    "msn.com",
    "apple.news",
    "flipboard.com",
    "newsbreak.com",
];

const COMPANY_HOST_HINTS: &[&str] = &["ir.", "investor.", "investors."];

const PRESS_PATH_HINTS: &[&str] = &[
    "/press-release",
    "/news-release",
    "/press/",
    "/newsroom",
    "/media/",
    "/investors/news",
];

const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
    "ref",
];

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// Lowercased host part of a URL, with or without a scheme.
pub fn extract_domain(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Strip tracking parameters and trailing slashes so that the same article
/// reached through different channels dedups by URL equality.
pub fn sanitize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let filtered: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            if filtered.is_empty() {
                parsed.set_query(None);
            } else {
                let query = filtered
                    .iter()
                    .map(|(k, v)| {
                        if v.is_empty() {
                            k.clone()
                        } else {
                            format!("{k}={v}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("&");
                parsed.set_query(Some(&query));
            }
            parsed.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// True when `domain` is `entry` or a subdomain of it.
pub fn domain_matches(domain: &str, entry: &str) -> bool {
    domain == entry || domain.ends_with(&format!(".{entry}"))
}

fn matches_any(domain: &str, entries: &[&str]) -> bool {
    entries.iter().any(|entry| domain_matches(domain, entry))
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a URL by its domain and path shape alone. No network access;
/// this must hold up in snippet-only runs.
pub fn classify(url: &str) -> SourceType {
    let domain = extract_domain(url);
    if domain.is_empty() || !domain.contains('.') || domain.contains(char::is_whitespace) {
        return SourceType::Unverifiable;
    }
    if matches_any(&domain, REGISTRY_DOMAINS) {
        return SourceType::TrialRegistry;
    }
    if matches_any(&domain, REGULATOR_DOMAINS) {
        return SourceType::Regulator;
    }
    if matches_any(&domain, PUBLISHER_DOMAINS) {
        return SourceType::Paper;
    }
    if matches_any(&domain, AGGREGATOR_DOMAINS) {
        return SourceType::News;
    }
    let path = url_path(url);
    if COMPANY_HOST_HINTS.iter().any(|hint| domain.starts_with(hint))
        || PRESS_PATH_HINTS.iter().any(|hint| path.contains(hint))
    {
        return SourceType::Company;
    }
    SourceType::News
}

/// Whether a source of this type speaks for itself rather than reporting on
/// someone else's disclosure.
pub fn is_primary(source_type: SourceType) -> bool {
    matches!(
        source_type,
        SourceType::Paper | SourceType::Regulator | SourceType::TrialRegistry | SourceType::Company
    )
}

fn url_path(url: &str) -> String {
    let after_scheme = url.split("://").nth(1).unwrap_or(url);
    match after_scheme.find('/') {
        Some(idx) => after_scheme[idx..].to_lowercase(),
        None => String::new(),
    }
}
