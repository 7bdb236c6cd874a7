use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    rule::{RecurrenceRule, RuleError},
    schedule::{initial_due, next_occurrence},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Whether generated transactions are expenses or income.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Expense,
    Income,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Expense => f.write_str("expense"),
            ItemKind::Income => f.write_str("income"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Active,
    Paused,
    /// Past the end date. Derived from the clock, never stored.
    Ended,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Active => f.write_str("active"),
            ItemStatus::Paused => f.write_str("paused"),
            ItemStatus::Ended => f.write_str("ended"),
        }
    }
}

/// User supplied fields for a new recurring item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub kind: ItemKind,
    pub amount: Decimal,
    /// Expense category or income source.
    pub category: String,
    pub note: Option<String>,
    pub rule: RecurrenceRule,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl ItemDraft {
    pub fn new(
        kind: ItemKind,
        amount: Decimal,
        category: impl Into<String>,
        rule: RecurrenceRule,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            amount,
            category: category.into(),
            note: None,
            rule,
            start_date,
            end_date: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn ending_on(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

/// A recurring expense or income template plus its schedule progress.
///
/// Transitions (`paused`, `resumed`, `advanced`, `rescheduled`) consume the value and
/// return the next one; nothing is written until the caller saves it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringItem {
    pub id: Uuid,
    pub kind: ItemKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub rule: RecurrenceRule,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Earliest date whose occurrence has not been generated yet.
    pub next_due_date: NaiveDate,
    /// Calendar day of the last completed generation pass for this item.
    #[serde(default)]
    pub last_generated_date: Option<NaiveDate>,
    #[serde(default = "RecurringItem::default_active")]
    pub is_active: bool,
}

impl RecurringItem {
    /// Validates the draft and computes the first due date relative to `today`.
    pub fn create(draft: ItemDraft, today: NaiveDate) -> Result<Self, ItemError> {
        let next_due_date = initial_due(draft.start_date, &draft.rule, today);
        let item = Self {
            id: Uuid::new_v4(),
            kind: draft.kind,
            amount: draft.amount,
            category: draft.category,
            note: draft.note,
            rule: draft.rule,
            start_date: draft.start_date,
            end_date: draft.end_date,
            next_due_date,
            last_generated_date: None,
            is_active: true,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn default_active() -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ItemError> {
        self.rule.validate()?;
        if self.amount <= Decimal::ZERO {
            return Err(ItemError::NonPositiveAmount(self.amount));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ItemError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }

    pub fn is_ended(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| today > end)
    }

    pub fn status(&self, today: NaiveDate) -> ItemStatus {
        if self.is_ended(today) {
            ItemStatus::Ended
        } else if self.is_active {
            ItemStatus::Active
        } else {
            ItemStatus::Paused
        }
    }

    pub fn should_generate(&self, today: NaiveDate) -> bool {
        self.is_active && !self.is_ended(today) && self.next_due_date <= today
    }

    pub fn generated_on(&self, today: NaiveDate) -> bool {
        self.last_generated_date == Some(today)
    }

    /// Due dates from `next_due_date` through `until`, stopping at the end date.
    pub fn occurrences_through(&self, until: NaiveDate) -> Occurrences<'_> {
        let limit = match self.end_date {
            Some(end) => end.min(until),
            None => until,
        };
        Occurrences {
            rule: &self.rule,
            cursor: self.next_due_date,
            limit,
        }
    }

    pub fn paused(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Reactivates the item from `today` onward. Periods missed while paused are
    /// skipped, not caught up. Already active items are returned unchanged.
    pub fn resumed(mut self, today: NaiveDate) -> Self {
        if self.is_active {
            return self;
        }
        self.is_active = true;
        self.rescheduled(today)
    }

    /// Re-runs the initial due-date search from the later of `today` and the current
    /// due date, so the result never moves backward.
    pub fn rescheduled(mut self, today: NaiveDate) -> Self {
        self.next_due_date = initial_due(
            self.start_date,
            &self.rule,
            today.max(self.next_due_date),
        );
        self
    }

    /// Records generation progress. `completed_on` is stamped into
    /// `last_generated_date` only when the pass caught the item up completely.
    pub fn advanced(mut self, cursor: NaiveDate, completed_on: Option<NaiveDate>) -> Self {
        self.next_due_date = self.next_due_date.max(cursor);
        if completed_on.is_some() {
            self.last_generated_date = completed_on;
        }
        self
    }
}

/// Iterator over due dates of one item, see [`RecurringItem::occurrences_through`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    cursor: NaiveDate,
    limit: NaiveDate,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.cursor > self.limit {
            return None;
        }
        let current = self.cursor;
        self.cursor = next_occurrence(current, self.rule);
        // Saturated arithmetic can stall at NaiveDate::MAX.
        if self.cursor == current {
            self.limit = NaiveDate::MIN;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn daily_rent(start: NaiveDate) -> ItemDraft {
        ItemDraft::new(
            ItemKind::Expense,
            Decimal::new(1250, 2),
            "Rent",
            RecurrenceRule::Daily,
            start,
        )
    }

    #[test]
    fn create_computes_initial_due_date() {
        let today = date(2024, 3, 10);
        let item = RecurringItem::create(daily_rent(date(2024, 3, 1)), today).expect("create");
        assert_eq!(item.next_due_date, today);
        assert!(item.is_active);
        assert_eq!(item.last_generated_date, None);

        let future = RecurringItem::create(daily_rent(date(2024, 4, 1)), today).expect("create");
        assert_eq!(future.next_due_date, date(2024, 4, 1));
    }

    #[test]
    fn create_rejects_invalid_drafts() {
        let today = date(2024, 3, 10);
        let zero = ItemDraft {
            amount: Decimal::ZERO,
            ..daily_rent(today)
        };
        assert_eq!(
            RecurringItem::create(zero, today),
            Err(ItemError::NonPositiveAmount(Decimal::ZERO))
        );

        let reversed = daily_rent(today).ending_on(date(2024, 3, 1));
        assert!(matches!(
            RecurringItem::create(reversed, today),
            Err(ItemError::EndBeforeStart { .. })
        ));

        let bad_rule = ItemDraft {
            rule: RecurrenceRule::every_days(0),
            ..daily_rent(today)
        };
        assert_eq!(
            RecurringItem::create(bad_rule, today),
            Err(ItemError::Rule(RuleError::InvalidInterval(0)))
        );
    }

    #[test]
    fn ended_overrides_active_flag() {
        let today = date(2024, 3, 10);
        let item = RecurringItem::create(
            daily_rent(date(2024, 1, 1)).ending_on(date(2024, 2, 1)),
            date(2024, 1, 1),
        )
        .expect("create");
        assert!(item.is_active);
        assert_eq!(item.status(today), ItemStatus::Ended);
        assert!(!item.should_generate(today));
        assert_eq!(item.status(date(2024, 2, 1)), ItemStatus::Active);
        assert_eq!(item.clone().paused().status(today), ItemStatus::Ended);
    }

    #[test]
    fn pause_keeps_due_date_and_resume_skips_missed_periods() {
        let item = RecurringItem::create(daily_rent(date(2024, 1, 1)), date(2024, 1, 1))
            .expect("create");
        let paused = item.clone().paused();
        assert_eq!(paused.next_due_date, item.next_due_date);
        assert_eq!(paused.status(date(2024, 1, 5)), ItemStatus::Paused);
        assert!(!paused.should_generate(date(2024, 1, 5)));

        let today = date(2024, 1, 31);
        let resumed = paused.resumed(today);
        assert!(resumed.is_active);
        assert_eq!(resumed.next_due_date, today);
    }

    #[test]
    fn resume_aligns_to_the_rule_pattern() {
        let rule = RecurrenceRule::weekly_on(&[Weekday::Fri]);
        let draft = ItemDraft {
            rule,
            ..daily_rent(date(2024, 1, 1))
        };
        let item = RecurringItem::create(draft, date(2024, 1, 1))
            .expect("create")
            .paused();
        // 2024-03-06 is a Wednesday.
        let resumed = item.resumed(date(2024, 3, 6));
        assert_eq!(resumed.next_due_date, date(2024, 3, 8));
    }

    #[test]
    fn occurrences_stop_at_end_date() {
        let item = RecurringItem::create(
            daily_rent(date(2024, 1, 1)).ending_on(date(2024, 1, 3)),
            date(2024, 1, 1),
        )
        .expect("create");
        let dates: Vec<_> = item.occurrences_through(date(2024, 1, 10)).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
    }

    #[test]
    fn advanced_never_moves_backward() {
        let item = RecurringItem::create(daily_rent(date(2024, 1, 10)), date(2024, 1, 10))
            .expect("create");
        let advanced = item.clone().advanced(date(2024, 1, 5), None);
        assert_eq!(advanced.next_due_date, date(2024, 1, 10));
        assert_eq!(advanced.last_generated_date, None);

        let stamped = item.advanced(date(2024, 1, 12), Some(date(2024, 1, 11)));
        assert_eq!(stamped.next_due_date, date(2024, 1, 12));
        assert_eq!(stamped.last_generated_date, Some(date(2024, 1, 11)));
    }

    #[test]
    fn serialization_keeps_amount_as_string_and_active_flag() {
        let item = RecurringItem::create(daily_rent(date(2024, 1, 1)), date(2024, 1, 1))
            .expect("create")
            .paused();
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["amount"], "12.50");
        assert_eq!(json["is_active"], false);
        assert_eq!(json["kind"], "expense");

        let restored: RecurringItem = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored, item);
    }
}
