//! Period classification.
//!
//! Reported end dates are exclusive: an instant of `2024-01-01` covers up to the
//! end of `2023-12-31`. Every stored end date is therefore the reported date
//! minus one day, and fiscal attributes derive from that shifted date.

use chrono::{Datelike, NaiveDate};
use filing_model::{Identifier, PeriodClass, PeriodInput, PeriodKind, PeriodNode};

use crate::arena::NodeArena;

/// Derived attributes of one period, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodDescriptor {
    /// Canonical URI; the dedup key.
    pub uri: String,
    pub period_type: PeriodKind,
    pub period_class: PeriodClass,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub forever_date: bool,
    pub fiscal_year: Option<i32>,
    pub fiscal_quarter: Option<String>,
    pub is_annual: bool,
    pub is_quarterly: bool,
    pub is_ytd: bool,
    pub days_in_period: Option<i64>,
}

impl PeriodDescriptor {
    fn empty(uri: String, period_type: PeriodKind, period_class: PeriodClass) -> Self {
        Self {
            uri,
            period_type,
            period_class,
            start_date: None,
            end_date: None,
            forever_date: false,
            fiscal_year: None,
            fiscal_quarter: None,
            is_annual: false,
            is_quarterly: false,
            is_ytd: false,
            days_in_period: None,
        }
    }
}

fn shift_end(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

pub fn fiscal_quarter_for_month(month: u32) -> &'static str {
    match month {
        1..=3 => "Q1",
        4..=6 => "Q2",
        7..=9 => "Q3",
        _ => "Q4",
    }
}

/// Duration bucket: class, quarter label, annual, quarterly, year-to-date.
pub fn classify_duration(
    days: i64,
    end: NaiveDate,
) -> (PeriodClass, Option<String>, bool, bool, bool) {
    match days {
        80..=100 => (
            PeriodClass::Quarterly,
            Some(fiscal_quarter_for_month(end.month()).to_string()),
            false,
            true,
            false,
        ),
        170..=190 => {
            let half = if (4..=7).contains(&end.month()) { "H1" } else { "H2" };
            (PeriodClass::SemiAnnual, Some(half.to_string()), false, false, true)
        }
        260..=280 => (PeriodClass::NineMonths, Some("M9".to_string()), false, false, true),
        350..=380 => (PeriodClass::Annual, Some("FY".to_string()), true, false, false),
        _ => (PeriodClass::Other, None, false, false, false),
    }
}

/// Classifies a reported period. A missing period becomes an `unknown` record
/// scoped to `report_id` so it never merges across filings.
pub fn describe_period(period: Option<&PeriodInput>, report_id: Identifier) -> PeriodDescriptor {
    match period {
        Some(PeriodInput::Instant { date }) => {
            let end = shift_end(*date);
            let day_ok = end.day() >= 28;
            let mut d = PeriodDescriptor::empty(
                format!("period:instant:{date}"),
                PeriodKind::Instant,
                PeriodClass::Instant,
            );
            d.end_date = Some(end);
            d.fiscal_year = Some(end.year());
            d.fiscal_quarter = Some(fiscal_quarter_for_month(end.month()).to_string());
            d.is_annual = day_ok && end.month() == 12;
            d.is_quarterly = day_ok && matches!(end.month(), 3 | 6 | 9 | 12);
            d.days_in_period = Some(0);
            d
        }
        Some(PeriodInput::StartEnd { start, end }) => {
            let shifted = shift_end(*end);
            let days = (shifted - *start).num_days() + 1;
            let (period_class, fiscal_quarter, is_annual, is_quarterly, is_ytd) =
                classify_duration(days, shifted);
            PeriodDescriptor {
                uri: format!("period:duration:{start}/{end}"),
                period_type: PeriodKind::Duration,
                period_class,
                start_date: Some(*start),
                end_date: Some(shifted),
                forever_date: false,
                fiscal_year: Some(shifted.year()),
                fiscal_quarter,
                is_annual,
                is_quarterly,
                is_ytd,
                days_in_period: Some(days),
            }
        }
        Some(PeriodInput::Forever) => {
            let mut d = PeriodDescriptor::empty(
                "period:forever".to_string(),
                PeriodKind::Forever,
                PeriodClass::Forever,
            );
            d.forever_date = true;
            d
        }
        None => PeriodDescriptor::empty(
            format!("period:unknown:{report_id}"),
            PeriodKind::Unknown,
            PeriodClass::Unknown,
        ),
    }
}

pub fn materialize_period(
    periods: &mut NodeArena<PeriodNode>,
    descriptor: PeriodDescriptor,
) -> Identifier {
    let key = descriptor.uri.clone();
    periods
        .insert_with(&key, |identifier| PeriodNode {
            identifier,
            uri: descriptor.uri,
            period_type: descriptor.period_type,
            period_class: descriptor.period_class,
            start_date: descriptor.start_date,
            end_date: descriptor.end_date,
            forever_date: descriptor.forever_date,
            fiscal_year: descriptor.fiscal_year,
            fiscal_quarter: descriptor.fiscal_quarter,
            is_annual: descriptor.is_annual,
            is_quarterly: descriptor.is_quarterly,
            is_ytd: descriptor.is_ytd,
            days_in_period: descriptor.days_in_period,
        })
        .id
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use proptest::prelude::*;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn report() -> Identifier {
        Identifier::from_semantic_key("report:test")
    }

    /// A duration whose inclusive length is `days`.
    fn duration(start: NaiveDate, days: u64) -> PeriodInput {
        PeriodInput::StartEnd {
            start,
            end: start.checked_add_days(Days::new(days)).unwrap(),
        }
    }

    #[test]
    fn instant_shifts_end_date() {
        let d = describe_period(
            Some(&PeriodInput::Instant { date: ymd(2023, 12, 31) }),
            report(),
        );
        assert_eq!(d.uri, "period:instant:2023-12-31");
        assert_eq!(d.end_date, Some(ymd(2023, 12, 30)));
        assert_eq!(d.fiscal_quarter.as_deref(), Some("Q4"));
        assert_eq!(d.fiscal_year, Some(2023));
        assert!(d.is_annual);
        assert!(d.is_quarterly);
        assert_eq!(d.days_in_period, Some(0));
        assert!(d.start_date.is_none());
    }

    #[test]
    fn instant_crossing_year_boundary() {
        let d = describe_period(
            Some(&PeriodInput::Instant { date: ymd(2024, 1, 1) }),
            report(),
        );
        assert_eq!(d.end_date, Some(ymd(2023, 12, 31)));
        assert_eq!(d.fiscal_year, Some(2023));
        assert!(d.is_annual);
    }

    #[test]
    fn instant_mid_month_is_neither_annual_nor_quarterly() {
        let d = describe_period(
            Some(&PeriodInput::Instant { date: ymd(2023, 6, 15) }),
            report(),
        );
        assert_eq!(d.fiscal_quarter.as_deref(), Some("Q2"));
        assert!(!d.is_annual);
        assert!(!d.is_quarterly);
    }

    #[test]
    fn duration_boundaries() {
        let start = ymd(2023, 1, 1);
        let cases = [
            (79, PeriodClass::Other),
            (80, PeriodClass::Quarterly),
            (100, PeriodClass::Quarterly),
            (101, PeriodClass::Other),
            (181, PeriodClass::SemiAnnual),
            (270, PeriodClass::NineMonths),
            (365, PeriodClass::Annual),
            (381, PeriodClass::Other),
        ];
        for (days, class) in cases {
            let d = describe_period(Some(&duration(start, days)), report());
            assert_eq!(d.days_in_period, Some(days as i64), "{days} days");
            assert_eq!(d.period_class, class, "{days} days");
        }
    }

    #[test]
    fn semi_annual_is_year_to_date() {
        let d = describe_period(Some(&duration(ymd(2023, 1, 1), 181)), report());
        assert!(d.is_ytd);
        assert_eq!(d.end_date, Some(ymd(2023, 6, 30)));
        assert_eq!(d.fiscal_quarter.as_deref(), Some("H1"));

        let h2 = describe_period(Some(&duration(ymd(2023, 7, 1), 184)), report());
        assert_eq!(h2.fiscal_quarter.as_deref(), Some("H2"));
    }

    #[test]
    fn calendar_year_is_annual() {
        let d = describe_period(
            Some(&PeriodInput::StartEnd {
                start: ymd(2023, 1, 1),
                end: ymd(2024, 1, 1),
            }),
            report(),
        );
        assert_eq!(d.uri, "period:duration:2023-01-01/2024-01-01");
        assert_eq!(d.end_date, Some(ymd(2023, 12, 31)));
        assert_eq!(d.days_in_period, Some(365));
        assert_eq!(d.period_class, PeriodClass::Annual);
        assert_eq!(d.fiscal_quarter.as_deref(), Some("FY"));
        assert_eq!(d.fiscal_year, Some(2023));
        assert!(d.is_annual);
        assert!(!d.is_ytd);
    }

    #[test]
    fn quarter_takes_label_from_end_month() {
        let d = describe_period(
            Some(&PeriodInput::StartEnd {
                start: ymd(2023, 7, 1),
                end: ymd(2023, 10, 1),
            }),
            report(),
        );
        assert_eq!(d.period_class, PeriodClass::Quarterly);
        assert_eq!(d.fiscal_quarter.as_deref(), Some("Q3"));
        assert!(d.is_quarterly);
    }

    #[test]
    fn nine_months_label() {
        let d = describe_period(Some(&duration(ymd(2023, 1, 1), 273)), report());
        assert_eq!(d.period_class, PeriodClass::NineMonths);
        assert_eq!(d.fiscal_quarter.as_deref(), Some("M9"));
        assert!(d.is_ytd);
    }

    #[test]
    fn forever_sets_only_forever_flag() {
        let d = describe_period(Some(&PeriodInput::Forever), report());
        assert_eq!(d.uri, "period:forever");
        assert!(d.forever_date);
        assert!(d.end_date.is_none());
        assert!(d.fiscal_year.is_none());
        assert!(!d.is_annual && !d.is_quarterly && !d.is_ytd);
    }

    #[test]
    fn unknown_is_scoped_to_report() {
        let a = describe_period(None, Identifier::from_semantic_key("report:a"));
        let b = describe_period(None, Identifier::from_semantic_key("report:b"));
        assert_ne!(a.uri, b.uri);
        assert_eq!(a.period_class, PeriodClass::Unknown);
    }

    #[test]
    fn same_period_dedups() {
        let mut periods = NodeArena::default();
        let input = PeriodInput::Instant { date: ymd(2023, 12, 31) };
        let a = materialize_period(&mut periods, describe_period(Some(&input), report()));
        let b = materialize_period(&mut periods, describe_period(Some(&input), report()));
        assert_eq!(a, b);
        assert_eq!(periods.len(), 1);
    }

    proptest! {
        #[test]
        fn duration_length_matches_inclusive_days(offset in 0u64..3650, days in 1u64..800) {
            let start = ymd(2000, 1, 1).checked_add_days(Days::new(offset)).unwrap();
            let d = describe_period(Some(&duration(start, days)), report());
            prop_assert_eq!(d.days_in_period, Some(days as i64));
            prop_assert_eq!(d.end_date, start.checked_add_days(Days::new(days - 1)));
        }
    }
}
