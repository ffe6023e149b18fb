use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Which requests a balance covers, judged by their start date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PeriodFilter {
    /// Calendar year of the start date.
    Year { year: i32 },
    /// Inclusive on whichever bounds are present.
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl PeriodFilter {
    /// A date range with at least one bound wins over `year`; with no range
    /// and no year the current calendar year of `today` applies.
    pub fn resolve(
        year: Option<i32>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        if from.is_some() || to.is_some() {
            return PeriodFilter::Range { from, to };
        }
        PeriodFilter::Year {
            year: year.unwrap_or_else(|| today.year()),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            PeriodFilter::Year { year } => date.year() == year,
            PeriodFilter::Range { from, to } => {
                from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn defaults_to_current_year() {
        let period = PeriodFilter::resolve(None, None, None, d(2026, 10, 16));
        assert_eq!(period, PeriodFilter::Year { year: 2026 });
        assert!(period.contains(d(2026, 1, 1)));
        assert!(!period.contains(d(2025, 12, 31)));
    }

    #[test]
    fn explicit_year_is_used_without_range() {
        let period = PeriodFilter::resolve(Some(2024), None, None, d(2026, 10, 16));
        assert_eq!(period, PeriodFilter::Year { year: 2024 });
    }

    #[test]
    fn partial_range_overrides_year() {
        let period = PeriodFilter::resolve(Some(2020), Some(d(2024, 3, 1)), None, d(2026, 1, 1));
        assert_eq!(
            period,
            PeriodFilter::Range {
                from: Some(d(2024, 3, 1)),
                to: None
            }
        );
        assert!(period.contains(d(2024, 3, 1)));
        assert!(period.contains(d(2031, 7, 9)));
        assert!(!period.contains(d(2024, 2, 15)));
        assert!(!period.contains(d(2020, 6, 1)));
    }

    #[test]
    fn upper_bound_only_is_inclusive() {
        let period = PeriodFilter::resolve(None, None, Some(d(2024, 6, 30)), d(2026, 1, 1));
        assert!(period.contains(d(2024, 6, 30)));
        assert!(period.contains(d(1999, 1, 1)));
        assert!(!period.contains(d(2024, 7, 1)));
    }
}
