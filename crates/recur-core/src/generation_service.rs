//! Catch-up generation of due occurrences.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use recur_domain::{next_occurrence, GeneratedOccurrence, RecurringItem, TransactionRequest};
use uuid::Uuid;

use crate::{CoreError, ItemRepository, TransactionSink};

pub const DEFAULT_MAX_CATCH_UP: usize = 1024;

/// Caller-controlled knobs for one generation pass.
///
/// The last run timestamp is passed in rather than read from shared state, so hosts
/// decide where (and whether) to remember it. The throttle applies to every item kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPolicy {
    /// When the previous pass ran, if known.
    pub last_run: Option<DateTime<Utc>>,
    /// Skip the whole pass if the previous one ran less than this long ago.
    pub min_interval: Option<Duration>,
    /// Maximum occurrences emitted per item in one pass.
    pub max_catch_up: usize,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            last_run: None,
            min_interval: None,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
        }
    }
}

impl GenerationPolicy {
    pub fn throttled_at(&self, now: DateTime<Utc>) -> bool {
        match (self.last_run, self.min_interval) {
            (Some(last_run), Some(interval)) => now >= last_run && now - last_run < interval,
            _ => false,
        }
    }
}

/// An item whose pass stopped early because a collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub item_id: Uuid,
    /// Occurrences emitted for the item before the failure.
    pub emitted: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub today: Option<NaiveDate>,
    /// Emitted occurrences, grouped per item in chronological order.
    pub occurrences: Vec<GeneratedOccurrence>,
    pub failures: Vec<ItemFailure>,
    /// Items returned by the repository as due.
    pub scanned: usize,
    /// Due items skipped because they were already generated today.
    pub already_generated: usize,
    /// Items that hit `max_catch_up` and will continue on the next pass.
    pub truncated: Vec<Uuid>,
    pub throttled: bool,
}

impl GenerationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.truncated.is_empty()
    }

    pub fn generated_count(&self) -> usize {
        self.occurrences.len()
    }
}

struct ItemOutcome {
    emitted: Vec<GeneratedOccurrence>,
    failure: Option<CoreError>,
    truncated: bool,
}

pub struct GenerationService;

impl GenerationService {
    /// Emits every occurrence that became due up to `now`, including missed ones, and
    /// persists each item's progress.
    ///
    /// Failures are isolated per item: the item keeps the due date of the occurrence
    /// that failed, so it is retried on the next pass, and the remaining items still run.
    /// Only a failure to list the due items aborts the pass.
    pub fn generate_due(
        repository: &dyn ItemRepository,
        sink: &dyn TransactionSink,
        now: DateTime<Utc>,
        policy: &GenerationPolicy,
    ) -> Result<GenerationReport, CoreError> {
        let today = now.date_naive();
        let mut report = GenerationReport {
            today: Some(today),
            ..GenerationReport::default()
        };
        if policy.throttled_at(now) {
            tracing::debug!(%now, last_run = ?policy.last_run, "generation pass throttled");
            report.throttled = true;
            return Ok(report);
        }

        let mut due = repository.list_active_due(today)?;
        due.sort_by_key(|item| (item.next_due_date, item.id));
        report.scanned = due.len();
        if due.iter().all(|item| item.generated_on(today)) {
            report.already_generated = due.len();
            tracing::debug!(%today, scanned = report.scanned, "nothing due");
            return Ok(report);
        }

        repository.begin_batch()?;
        for item in due {
            if item.generated_on(today) {
                report.already_generated += 1;
                continue;
            }
            let item_id = item.id;
            let outcome = Self::generate_item(repository, sink, item, today, policy.max_catch_up);
            let emitted = outcome.emitted.len();
            report.occurrences.extend(outcome.emitted);
            if outcome.truncated {
                tracing::warn!(
                    item_id = %item_id,
                    emitted,
                    "catch-up limit reached, remaining occurrences deferred to the next pass"
                );
                report.truncated.push(item_id);
            }
            if let Some(err) = outcome.failure {
                tracing::warn!(item_id = %item_id, emitted, error = %err, "generation failed for item");
                report.failures.push(ItemFailure {
                    item_id,
                    emitted,
                    error: err.to_string(),
                });
            }
        }
        if let Err(err) = repository.end_batch() {
            tracing::warn!(error = %err, "failed to close repository batch");
        }

        tracing::info!(
            %today,
            scanned = report.scanned,
            generated = report.occurrences.len(),
            failures = report.failures.len(),
            "generation pass finished"
        );
        Ok(report)
    }

    fn generate_item(
        repository: &dyn ItemRepository,
        sink: &dyn TransactionSink,
        item: RecurringItem,
        today: NaiveDate,
        max_catch_up: usize,
    ) -> ItemOutcome {
        let mut cursor = item.next_due_date;
        let mut emitted = Vec::new();
        let mut failure = None;
        let mut truncated = false;

        for date in item.occurrences_through(today) {
            if emitted.len() >= max_catch_up {
                truncated = true;
                break;
            }
            let request = TransactionRequest::for_occurrence(&item, date);
            match sink.create(&request) {
                Ok(transaction_id) => {
                    tracing::debug!(item_id = %item.id, %date, %transaction_id, "occurrence generated");
                    emitted.push(GeneratedOccurrence::from_request(&request, transaction_id));
                    cursor = next_occurrence(date, &item.rule);
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let completed_on = (failure.is_none() && !truncated).then_some(today);
        let advanced = item.clone().advanced(cursor, completed_on);
        if advanced != item {
            if let Err(err) = repository.save(&advanced) {
                failure.get_or_insert(err);
            }
        }

        ItemOutcome {
            emitted,
            failure,
            truncated,
        }
    }
}
