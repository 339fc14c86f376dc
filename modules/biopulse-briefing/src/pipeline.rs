use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use biopulse_common::{
    Briefing, BriefingConfig, Candidate, RunClock, VerificationMode, VerifiedCandidate,
};
use biopulse_scout::collector::{dedup_candidates, CandidateCollector};
use biopulse_scout::dates::capture_date_evidence;
use biopulse_scout::domains::extract_domain;
use biopulse_scout::feeds::FeedCollector;
use biopulse_scout::fetch::PageFetcher;
use biopulse_scout::planner;
use biopulse_scout::search::WebSearcher;
use biopulse_scout::taxonomy::SITE_SCOPED_DOMAINS;
use biopulse_scout::verifier::SourceVerifier;
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use tokio::time::{self, Instant};
use tracing::{info, warn};

use crate::compose::BriefingComposer;
use crate::dedup;
use crate::rank;
use crate::recency::{Admission, RecencyFilter};
use crate::schema::SchemaValidator;

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub queries_planned: usize,
    pub search_candidates: usize,
    pub feed_candidates: usize,
    pub duplicates_dropped: usize,
    pub verified: usize,
    pub verifications_abandoned: usize,
    pub admitted: usize,
    pub rejected_unverifiable: usize,
    pub rejected_undated: usize,
    pub rejected_stale: usize,
    pub rejected_low_confidence: usize,
    pub events: usize,
    pub rejected_low_relevance: usize,
    pub items_emitted: usize,
    pub degraded: bool,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Briefing Run Complete ===")?;
        writeln!(f, "Queries planned:    {}", self.queries_planned)?;
        writeln!(f, "Search candidates:  {}", self.search_candidates)?;
        writeln!(f, "Feed candidates:    {}", self.feed_candidates)?;
        writeln!(f, "Duplicates dropped: {}", self.duplicates_dropped)?;
        writeln!(f, "Verified:           {}", self.verified)?;
        writeln!(f, "Abandoned (budget): {}", self.verifications_abandoned)?;
        writeln!(f, "\nAdmission:")?;
        writeln!(f, "  Admitted:       {}", self.admitted)?;
        writeln!(f, "  Unverifiable:   {}", self.rejected_unverifiable)?;
        writeln!(f, "  Undated:        {}", self.rejected_undated)?;
        writeln!(f, "  Stale:          {}", self.rejected_stale)?;
        writeln!(f, "  Low confidence: {}", self.rejected_low_confidence)?;
        writeln!(f, "\nEvents:             {}", self.events)?;
        writeln!(f, "Below relevance:    {}", self.rejected_low_relevance)?;
        writeln!(f, "Items emitted:      {}", self.items_emitted)?;
        if self.degraded {
            writeln!(f, "Degraded: validation failed, emitted empty briefing")?;
        }
        Ok(())
    }
}

/// End-to-end run: plan queries, collect candidates, verify dates, filter
/// to the admissibility window, cluster, rank, compose, validate, and
/// hand back the briefing with its run accounting.
pub struct BriefingPipeline {
    config: BriefingConfig,
    searcher: Option<Arc<dyn WebSearcher>>,
    fetcher: Option<Arc<dyn PageFetcher>>,
}

impl BriefingPipeline {
    pub fn new(config: BriefingConfig) -> Self {
        Self {
            config,
            searcher: None,
            fetcher: None,
        }
    }

    pub fn with_searcher(mut self, searcher: Arc<dyn WebSearcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Full discovery run for one briefing date.
    pub async fn run(&self, reference: NaiveDate) -> Result<(Briefing, RunStats)> {
        let clock = RunClock::for_date(reference);
        let deadline = Instant::now() + Duration::from_secs(self.config.run_budget_secs);
        let mut stats = RunStats::default();

        let queries = planner::plan(reference, SITE_SCOPED_DOMAINS);
        stats.queries_planned = queries.len();

        let mut candidates = Vec::new();
        match &self.searcher {
            Some(searcher) => {
                let collector = CandidateCollector::new(
                    Arc::clone(searcher),
                    self.config.results_per_query,
                    self.config.search_concurrency,
                );
                let found = collector.collect(&queries).await;
                stats.search_candidates = found.len();
                candidates.extend(found);
            }
            None => warn!("No search backend configured, search channel disabled"),
        }

        if !self.config.feed_urls.is_empty() {
            let feeds = FeedCollector::new(clock.window());
            let found = feeds.collect(&self.config.feed_urls).await;
            stats.feed_candidates = found.len();
            candidates.extend(found);
        }

        self.finish(candidates, &clock, deadline, stats).await
    }

    /// Run the back half of the pipeline over candidates supplied by the
    /// caller instead of discovered live. Partial records are tolerated:
    /// missing domains and date evidence are derived from the URL and text,
    /// and untitled records are skipped.
    pub async fn run_with_candidates(
        &self,
        reference: NaiveDate,
        supplied: Vec<Candidate>,
    ) -> Result<(Briefing, RunStats)> {
        let clock = RunClock::for_date(reference);
        let deadline = Instant::now() + Duration::from_secs(self.config.run_budget_secs);
        let mut stats = RunStats::default();

        let candidates: Vec<Candidate> = supplied
            .into_iter()
            .filter(|candidate| !candidate.title.trim().is_empty())
            .map(normalize_candidate)
            .collect();
        stats.search_candidates = candidates.len();

        self.finish(candidates, &clock, deadline, stats).await
    }

    async fn finish(
        &self,
        candidates: Vec<Candidate>,
        clock: &RunClock,
        deadline: Instant,
        mut stats: RunStats,
    ) -> Result<(Briefing, RunStats)> {
        let collected = candidates.len();
        let deduped = dedup_candidates(candidates);
        stats.duplicates_dropped = collected - deduped.len();
        let planned = deduped.len();

        let verifier = self.verifier();
        let mut verified: Vec<VerifiedCandidate> = Vec::new();
        {
            let verifier = &verifier;
            let mut in_flight = stream::iter(deduped)
                .map(move |candidate| async move {
                    let verdict = verifier.verify(&candidate).await;
                    VerifiedCandidate { candidate, verdict }
                })
                .buffer_unordered(self.config.verify_concurrency.max(1));

            loop {
                tokio::select! {
                    next = in_flight.next() => match next {
                        Some(vc) => verified.push(vc),
                        None => break,
                    },
                    _ = time::sleep_until(deadline) => {
                        warn!(
                            completed = verified.len(),
                            planned,
                            "Run budget exhausted, abandoning remaining verifications"
                        );
                        break;
                    }
                }
            }
        }
        stats.verified = verified.len();
        stats.verifications_abandoned = planned - verified.len();

        // concurrency must not leak into output order
        verified.sort_by_key(|vc| vc.candidate.id);

        let filter = RecencyFilter::new(clock.window());
        let mut admitted = Vec::new();
        for vc in verified {
            match filter.assess(&vc.verdict) {
                Admission::Admitted => admitted.push(vc),
                Admission::Unverifiable => stats.rejected_unverifiable += 1,
                Admission::Undated => stats.rejected_undated += 1,
                Admission::Stale => stats.rejected_stale += 1,
                Admission::LowConfidence => stats.rejected_low_confidence += 1,
            }
        }
        stats.admitted = admitted.len();

        let events = dedup::cluster(admitted);
        stats.events = events.len();

        let gated = rank::apply_relevance_gate(
            events,
            self.config.min_relevance_score,
            clock.reference_date(),
        );
        stats.rejected_low_relevance = stats.events - gated.len();

        let composer = BriefingComposer::new(self.config.max_items);
        let briefing = composer.compose(gated, clock.reference_date());

        let validator = SchemaValidator::new(self.config.max_items);
        let briefing = match validator.validate(&briefing) {
            Ok(()) => briefing,
            Err(err) => {
                warn!(error = %err, "Briefing failed validation, emitting empty briefing");
                stats.degraded = true;
                Briefing::empty(clock.reference_date())
            }
        };
        stats.items_emitted = briefing.items.len();

        info!("{stats}");
        Ok((briefing, stats))
    }

    fn verifier(&self) -> SourceVerifier {
        match (self.config.verification, &self.fetcher) {
            (VerificationMode::FullFetch, Some(fetcher)) => {
                SourceVerifier::with_fetcher(Arc::clone(fetcher))
            }
            (VerificationMode::FullFetch, None) => {
                warn!("Full-fetch verification requested without a fetcher, using snippet checks");
                SourceVerifier::snippet_only()
            }
            (VerificationMode::SnippetOnly, _) => SourceVerifier::snippet_only(),
        }
    }
}

/// Supplied candidates often arrive as bare title/url/snippet records.
fn normalize_candidate(mut candidate: Candidate) -> Candidate {
    if candidate.domain.is_empty() {
        candidate.domain = extract_domain(&candidate.url);
    }
    if candidate.raw_date_evidence.is_empty() {
        candidate.raw_date_evidence =
            capture_date_evidence(&candidate.url, &candidate.snippet_or_body);
    }
    candidate
}
