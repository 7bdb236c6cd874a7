//! Date calculator for recurrence rules.
//!
//! Arithmetic saturates at [`NaiveDate::MAX`] instead of failing; a saturated cursor is
//! always later than any realistic "today", so generation simply stops.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::rule::{RecurrenceRule, LAST_DAY_OF_MONTH};

/// A weekday set is always matched within this many days of the reference date.
const WEEKDAY_SCAN_DAYS: u64 = 8;

/// Returns the occurrence that follows `reference`, never `reference` itself.
///
/// Monthly and yearly steps clamp to the end of shorter months and do not remember the
/// day they were clamped from: an explicit day 31 goes Jan 31, Feb 29, Mar 29. Only the
/// [`LAST_DAY_OF_MONTH`] sentinel resolves to the true last day of every month.
pub fn next_occurrence(reference: NaiveDate, rule: &RecurrenceRule) -> NaiveDate {
    match rule {
        RecurrenceRule::Daily => add_days(reference, 1),
        RecurrenceRule::Custom { interval_days } => {
            add_days(reference, u64::from((*interval_days).max(1)))
        }
        RecurrenceRule::Weekly { weekdays } if weekdays.is_empty() => add_days(reference, 7),
        RecurrenceRule::Weekly { weekdays } => (1..=WEEKDAY_SCAN_DAYS)
            .map(|offset| add_days(reference, offset))
            .find(|candidate| matches_weekday(weekdays, *candidate))
            .unwrap_or_else(|| add_days(reference, 7)),
        RecurrenceRule::Monthly {
            day_of_month: Some(LAST_DAY_OF_MONTH),
        } => first_of_month(reference)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(last_day_of_month)
            .unwrap_or(NaiveDate::MAX),
        RecurrenceRule::Monthly { .. } => add_months(reference, 1),
        RecurrenceRule::Yearly => add_months(reference, 12),
    }
}

/// Returns the first due date of a new (or resumed) item.
///
/// Unlike [`next_occurrence`] the search is inclusive: it starts at `start` when that lies
/// in the future and at `today` otherwise, and the starting day itself qualifies when it
/// matches the rule's weekday or day-of-month constraint. Unconstrained rules are due on
/// the starting day.
pub fn initial_due(start: NaiveDate, rule: &RecurrenceRule, today: NaiveDate) -> NaiveDate {
    first_match_on_or_after(start.max(today), rule)
}

fn first_match_on_or_after(anchor: NaiveDate, rule: &RecurrenceRule) -> NaiveDate {
    match rule {
        RecurrenceRule::Weekly { weekdays } if !weekdays.is_empty() => (0..WEEKDAY_SCAN_DAYS)
            .map(|offset| add_days(anchor, offset))
            .find(|candidate| matches_weekday(weekdays, *candidate))
            .unwrap_or(anchor),
        RecurrenceRule::Monthly {
            day_of_month: Some(day),
        } => {
            let this_month = day_in_month(anchor, *day);
            match this_month {
                Some(candidate) if candidate >= anchor => candidate,
                _ => first_of_month(anchor)
                    .and_then(|first| first.checked_add_months(Months::new(1)))
                    .and_then(|next_month| day_in_month(next_month, *day))
                    .unwrap_or(NaiveDate::MAX),
            }
        }
        _ => anchor,
    }
}

/// Resolves `day` (1-31 or the sentinel) inside the month containing `date`, clamping
/// down to the month's last day.
fn day_in_month(date: NaiveDate, day: u8) -> Option<NaiveDate> {
    let last = last_day_of_month(date)?;
    if day >= LAST_DAY_OF_MONTH {
        return Some(last);
    }
    let target = u32::from(day.max(1)).min(last.day());
    date.with_day(target)
}

fn matches_weekday(weekdays: &BTreeSet<u8>, date: NaiveDate) -> bool {
    weekdays.contains(&(date.weekday().number_from_monday() as u8))
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
