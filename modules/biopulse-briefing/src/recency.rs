use biopulse_common::{AdmissibilityWindow, Confidence, DatePattern, VerificationVerdict};

/// Outcome of the admission gate, one reason per rejection for run
/// accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Source type can never be published.
    Unverifiable,
    /// No date could be resolved.
    Undated,
    /// Resolved date falls outside the window.
    Stale,
    /// Low-confidence date without an unambiguous full ISO form.
    LowConfidence,
}

/// The only gate between verification and clustering. Everything admitted
/// here carries a resolved date inside the window.
pub struct RecencyFilter {
    window: AdmissibilityWindow,
}

impl RecencyFilter {
    pub fn new(window: AdmissibilityWindow) -> Self {
        Self { window }
    }

    pub fn assess(&self, verdict: &VerificationVerdict) -> Admission {
        if !verdict.source_type.is_emittable() {
            return Admission::Unverifiable;
        }
        let Some(date) = verdict.resolved_date else {
            return Admission::Undated;
        };
        if !self.window.admits_date(date) {
            return Admission::Stale;
        }
        if verdict.confidence == Confidence::Low
            && verdict.date_pattern != Some(DatePattern::Iso)
        {
            return Admission::LowConfidence;
        }
        Admission::Admitted
    }

    pub fn admits(&self, verdict: &VerificationVerdict) -> bool {
        self.assess(verdict) == Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biopulse_common::{RunClock, SourceType};
    use biopulse_scout::testing::fixed_id;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filter() -> RecencyFilter {
        RecencyFilter::new(RunClock::for_date(date(2025, 1, 30)).window())
    }

    fn verdict(
        resolved: Option<NaiveDate>,
        confidence: Confidence,
        pattern: Option<DatePattern>,
    ) -> VerificationVerdict {
        VerificationVerdict {
            candidate_id: fixed_id(1),
            resolved_date: resolved,
            source_type: SourceType::News,
            is_primary_source: false,
            confidence,
            date_pattern: pattern,
        }
    }

    #[test]
    fn dated_in_window_is_admitted() {
        let v = verdict(
            Some(date(2025, 1, 29)),
            Confidence::Medium,
            Some(DatePattern::UrlPath),
        );
        assert_eq!(filter().assess(&v), Admission::Admitted);
    }

    #[test]
    fn undated_is_rejected() {
        let v = verdict(None, Confidence::High, None);
        assert_eq!(filter().assess(&v), Admission::Undated);
    }

    #[test]
    fn date_outside_window_is_stale() {
        let v = verdict(
            Some(date(2025, 1, 20)),
            Confidence::High,
            Some(DatePattern::Iso),
        );
        assert_eq!(filter().assess(&v), Admission::Stale);
    }

    #[test]
    fn same_verdict_goes_stale_when_the_run_moves_on() {
        let v = verdict(
            Some(date(2025, 1, 29)),
            Confidence::Medium,
            Some(DatePattern::Iso),
        );
        assert_eq!(filter().assess(&v), Admission::Admitted);

        let later = RecencyFilter::new(RunClock::for_date(date(2025, 2, 5)).window());
        assert_eq!(later.assess(&v), Admission::Stale);
    }

    #[test]
    fn low_confidence_with_full_iso_is_admitted() {
        let v = verdict(
            Some(date(2025, 1, 29)),
            Confidence::Low,
            Some(DatePattern::Iso),
        );
        assert_eq!(filter().assess(&v), Admission::Admitted);
    }

    #[test]
    fn low_confidence_without_iso_is_rejected() {
        for pattern in [
            Some(DatePattern::UrlPath),
            Some(DatePattern::Compact),
            Some(DatePattern::MonthName),
            None,
        ] {
            let v = verdict(Some(date(2025, 1, 29)), Confidence::Low, pattern);
            assert_eq!(filter().assess(&v), Admission::LowConfidence, "{pattern:?}");
        }
    }

    #[test]
    fn unverifiable_source_is_rejected() {
        let mut v = verdict(
            Some(date(2025, 1, 29)),
            Confidence::High,
            Some(DatePattern::Iso),
        );
        v.source_type = SourceType::Unverifiable;
        assert_eq!(filter().assess(&v), Admission::Unverifiable);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let at_boundary = verdict(
            Some(date(2025, 1, 28)),
            Confidence::Medium,
            Some(DatePattern::Iso),
        );
        assert_eq!(filter().assess(&at_boundary), Admission::Admitted);

        let beyond = verdict(
            Some(date(2025, 1, 27)),
            Confidence::Medium,
            Some(DatePattern::Iso),
        );
        assert_eq!(filter().assess(&beyond), Admission::Stale);
    }
}
