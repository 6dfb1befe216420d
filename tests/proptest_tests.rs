#![allow(clippy::cast_possible_truncation)]

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use mcp_flexstay::domain::calendar::{CellRef, DayCell, DisplayedMonth};
use mcp_flexstay::domain::month::{MonthToken, YearMonth};
use mcp_flexstay::domain::quote::{Quote, parse_price, strip_year};
use mcp_flexstay::domain::search_params::StayPolicy;
use mcp_flexstay::engine::best_price::select_best;
use mcp_flexstay::engine::candidates::{Spill, enumerate};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_year_month() -> impl Strategy<Value = YearMonth> {
    (2020..2036_i32, 0..12_u32)
        .prop_map(|(year, index)| YearMonth::new(year, MonthToken::from_index(index).unwrap()))
}

/// A month where each day is open, blocked, or open with a minimum stay.
fn arb_month() -> impl Strategy<Value = DisplayedMonth> {
    (
        arb_year_month(),
        prop::collection::vec((any::<bool>(), prop::option::of(1..8_u32)), 31),
    )
        .prop_map(|(ym, days)| {
            DisplayedMonth::layout(ym, |date| {
                let (open, min_nights) = days[date.day0() as usize];
                if open {
                    DayCell {
                        min_nights,
                        ..DayCell::open()
                    }
                } else {
                    DayCell::blocked()
                }
            })
        })
}

/// Calendar date shown at `at` in the grid of `ym`.
fn date_of(ym: YearMonth, at: CellRef) -> NaiveDate {
    let first = ym.first_day().unwrap();
    let lead = first.weekday().num_days_from_sunday() as usize;
    first + chrono::Days::new((at.position() - lead) as u64)
}

fn arb_policy() -> impl Strategy<Value = StayPolicy> {
    prop_oneof![
        Just(StayPolicy::Weekend),
        Just(StayPolicy::FullWeek),
        (1..=7_u32).prop_map(StayPolicy::Nights),
    ]
}

fn with_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Candidate enumeration
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn every_candidate_lasts_policy_nights(month in arb_month(), policy in arb_policy()) {
        let ym = month.year_month().unwrap();
        let found = enumerate(policy, &month);
        for c in &found.same_month {
            let stay = date_of(ym, c.check_out) - date_of(ym, c.check_in);
            prop_assert_eq!(stay.num_days(), i64::from(policy.nights()));
            prop_assert_eq!(c.nights, policy.nights());
        }
        for c in &found.cross_month {
            let stay = date_of(ym.next(), c.check_out) - date_of(ym, c.check_in);
            prop_assert_eq!(stay.num_days(), i64::from(policy.nights()));
            prop_assert_eq!(c.nights, policy.nights());
        }
    }

    #[test]
    fn same_month_pairs_are_selectable(month in arb_month(), policy in arb_policy()) {
        let found = enumerate(policy, &month);
        for c in &found.same_month {
            let check_in = month.cell(c.check_in).unwrap();
            prop_assert!(check_in.is_legal_check_in(policy.nights()));
            prop_assert!(month.cell(c.check_out).unwrap().selectable);
            prop_assert_ne!(c.spill, Spill::NextMonth);
        }
    }

    #[test]
    fn cross_month_checkouts_stay_in_first_rows(month in arb_month(), policy in arb_policy()) {
        let found = enumerate(policy, &month);
        for c in &found.cross_month {
            prop_assert_eq!(c.spill, Spill::NextMonth);
            prop_assert!(c.check_out.week < 2);
            prop_assert!(month.cell(c.check_in).unwrap().is_legal_check_in(policy.nights()));
        }
    }

    #[test]
    fn anchored_policies_check_in_on_anchor(month in arb_month()) {
        for policy in [StayPolicy::Weekend, StayPolicy::FullWeek] {
            let anchor = policy.anchor_day().unwrap();
            let found = enumerate(policy, &month);
            for c in found.same_month.iter().chain(&found.cross_month) {
                prop_assert_eq!(c.check_in.day, anchor);
            }
        }
    }

    #[test]
    fn anchored_stays_have_no_blocked_night(month in arb_month()) {
        for policy in [StayPolicy::Weekend, StayPolicy::FullWeek] {
            let found = enumerate(policy, &month);
            for c in found.same_month.iter().chain(&found.cross_month) {
                for offset in 1..policy.nights() as usize {
                    let inside = CellRef::from_position(c.check_in.position() + offset);
                    if let Some(cell) = month.cell(inside) {
                        prop_assert!(cell.selectable);
                    }
                }
            }
        }
    }

    #[test]
    fn open_month_yields_one_stay_per_day(ym in arb_year_month(), nights in 1..=7_u32) {
        let month = DisplayedMonth::layout(ym, |_| DayCell::open());
        let found = enumerate(StayPolicy::Nights(nights), &month);
        prop_assert_eq!(found.len(), ym.days_in_month() as usize);
    }
}

// ---------------------------------------------------------------------------
// Best price selection
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn best_price_is_minimum_and_first_seen(prices in prop::collection::vec(1..5000_u32, 1..40)) {
        let quotes: Vec<Quote> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Quote::new(format!("stay {i}"), format!("${}", with_thousands(*p))))
            .collect();

        let min = *prices.iter().min().unwrap();
        let first = prices.iter().position(|p| *p == min).unwrap();

        let result = select_best(&quotes);
        prop_assert!(!result.has_error);
        let expected_price = format!("${}", with_thousands(min));
        let expected_dates = format!("stay {first}");
        prop_assert_eq!(result.best_price.as_deref(), Some(expected_price.as_str()));
        prop_assert_eq!(result.best_dates.as_deref(), Some(expected_dates.as_str()));
    }

    #[test]
    fn parse_price_reads_grouped_dollars(n in 0..10_000_000_u32) {
        let label = format!("${} total", with_thousands(n));
        prop_assert_eq!(parse_price(&label), Some(f64::from(n)));
    }

    #[test]
    fn strip_year_drops_both_years(
        start in NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().num_days_from_ce()
            ..NaiveDate::from_ymd_opt(2030, 12, 1).unwrap().num_days_from_ce(),
        nights in 1..8_u64
    ) {
        let check_in = NaiveDate::from_num_days_from_ce_opt(start).unwrap();
        let check_out = check_in + chrono::Days::new(nights);
        let label = format!(
            "{} - {}",
            check_in.format("%b %-d, %Y"),
            check_out.format("%b %-d, %Y")
        );
        let expected = format!("{} - {}", check_in.format("%b %-d"), check_out.format("%b %-d"));
        prop_assert_eq!(strip_year(&label), expected);
    }
}

// ---------------------------------------------------------------------------
// Month resolution
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn resolved_month_is_never_in_the_past(
        index in 0..12_u32,
        day in NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().num_days_from_ce()
            ..NaiveDate::from_ymd_opt(2032, 1, 1).unwrap().num_days_from_ce()
    ) {
        let today = NaiveDate::from_num_days_from_ce_opt(day).unwrap();
        let current = YearMonth::new(today.year(), MonthToken::from_index(today.month0()).unwrap());
        let resolved = MonthToken::from_index(index).unwrap().resolve(today);
        prop_assert!(resolved >= current);
        prop_assert!(resolved.year - today.year() <= 1);
    }
}
