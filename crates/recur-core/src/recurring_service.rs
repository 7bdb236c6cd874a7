//! Create, edit, pause, and resume recurring items.

use chrono::{Days, NaiveDate};
use recur_domain::{ItemDraft, RecurringItem, UpcomingOccurrence};
use uuid::Uuid;

use crate::{CoreError, ItemRepository};

/// Upper bound on projected dates per item in [`RecurringService::list_upcoming`].
const MAX_UPCOMING_PER_ITEM: usize = 1024;

/// Stateless helpers for managing recurring items in a repository.
pub struct RecurringService;

impl RecurringService {
    /// Validates the draft, computes its first due date, and persists it.
    pub fn create(
        repository: &dyn ItemRepository,
        draft: ItemDraft,
        today: NaiveDate,
    ) -> Result<RecurringItem, CoreError> {
        let item = RecurringItem::create(draft, today)?;
        repository.save(&item)?;
        tracing::info!(
            item_id = %item.id,
            kind = %item.kind,
            rule = %item.rule,
            next_due = %item.next_due_date,
            "recurring item created"
        );
        Ok(item)
    }

    pub fn get(repository: &dyn ItemRepository, id: Uuid) -> Result<RecurringItem, CoreError> {
        repository.get(id)?.ok_or(CoreError::ItemNotFound(id))
    }

    /// Items ordered by next due date.
    pub fn list(repository: &dyn ItemRepository) -> Result<Vec<RecurringItem>, CoreError> {
        let mut items = repository.list_all()?;
        items.sort_by_key(|item| (item.next_due_date, item.id));
        Ok(items)
    }

    /// Replaces the editable fields of an existing item.
    ///
    /// Schedule progress (`next_due_date`, `last_generated_date`) and the active flag stay
    /// owned by generation and pause/resume. When the rule or start date changed, the due
    /// date is searched again from today without moving backward.
    pub fn update(
        repository: &dyn ItemRepository,
        item: RecurringItem,
        today: NaiveDate,
    ) -> Result<RecurringItem, CoreError> {
        item.validate()?;
        let existing = Self::get(repository, item.id)?;
        let schedule_changed =
            item.rule != existing.rule || item.start_date != existing.start_date;

        let mut updated = RecurringItem {
            next_due_date: existing.next_due_date,
            last_generated_date: existing.last_generated_date,
            is_active: existing.is_active,
            ..item
        };
        if schedule_changed || updated.next_due_date < updated.start_date {
            updated = updated.rescheduled(today);
        }
        repository.save(&updated)?;
        tracing::info!(
            item_id = %updated.id,
            rescheduled = schedule_changed,
            next_due = %updated.next_due_date,
            "recurring item updated"
        );
        Ok(updated)
    }

    pub fn delete(repository: &dyn ItemRepository, id: Uuid) -> Result<(), CoreError> {
        if !repository.delete(id)? {
            return Err(CoreError::ItemNotFound(id));
        }
        tracing::info!(item_id = %id, "recurring item deleted");
        Ok(())
    }

    /// Deactivates the item. The due date is left where it was.
    pub fn pause(repository: &dyn ItemRepository, id: Uuid) -> Result<RecurringItem, CoreError> {
        let item = Self::get(repository, id)?;
        if !item.is_active {
            return Ok(item);
        }
        let paused = item.paused();
        repository.save(&paused)?;
        tracing::info!(item_id = %id, next_due = %paused.next_due_date, "recurring item paused");
        Ok(paused)
    }

    /// Reactivates the item from `today`; periods missed while paused are not generated.
    pub fn resume(
        repository: &dyn ItemRepository,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<RecurringItem, CoreError> {
        let item = Self::get(repository, id)?;
        if item.is_active {
            return Ok(item);
        }
        let resumed = item.resumed(today);
        repository.save(&resumed)?;
        tracing::info!(item_id = %id, next_due = %resumed.next_due_date, "recurring item resumed");
        Ok(resumed)
    }

    /// Projects occurrences of active, non-ended items from `today` through
    /// `today + within_days` inclusive, ordered by date. Overdue dates that a generation
    /// pass has not emitted yet are left out.
    pub fn list_upcoming(
        repository: &dyn ItemRepository,
        today: NaiveDate,
        within_days: u32,
    ) -> Result<Vec<UpcomingOccurrence>, CoreError> {
        let horizon = today
            .checked_add_days(Days::new(u64::from(within_days)))
            .unwrap_or(NaiveDate::MAX);
        let mut upcoming = Vec::new();
        for item in repository.list_all()? {
            if !item.is_active || item.is_ended(today) {
                continue;
            }
            upcoming.extend(
                item.occurrences_through(horizon)
                    .skip_while(|date| *date < today)
                    .take(MAX_UPCOMING_PER_ITEM)
                    .map(|date| UpcomingOccurrence::for_item(&item, date)),
            );
        }
        upcoming.sort_by_key(|entry| (entry.date, entry.item_id));
        Ok(upcoming)
    }
}
