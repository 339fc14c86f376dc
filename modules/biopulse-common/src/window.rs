use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Width of the admissibility window.
pub const WINDOW_HOURS: i64 = 48;

/// The injected "now" of a run. Every freshness decision derives from this
/// instant, never from the wall clock, so re-running with the same reference
/// date is reproducible.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    reference: DateTime<Utc>,
}

impl RunClock {
    pub fn at(reference: DateTime<Utc>) -> Self {
        RunClock { reference }
    }

    /// Clock for a date-only invocation, anchored at midnight UTC.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::at(date.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference.date_naive()
    }

    pub fn window(&self) -> AdmissibilityWindow {
        AdmissibilityWindow {
            start: self.reference - Duration::hours(WINDOW_HOURS),
            end: self.reference,
        }
    }
}

/// The half-open-in-neither-direction interval `[reference - 48h, reference]`.
/// Both bounds are inclusive: evidence exactly 48 hours old is still admitted.
#[derive(Debug, Clone, Copy)]
pub struct AdmissibilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AdmissibilityWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Date-granular admission. A bare calendar date is judged by its
    /// midnight UTC instant, the earliest moment the disclosure could carry
    /// that date.
    pub fn admits_date(&self, date: NaiveDate) -> bool {
        self.contains(date.and_time(NaiveTime::MIN).and_utc())
    }
}
