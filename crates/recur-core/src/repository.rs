use chrono::NaiveDate;
use recur_domain::RecurringItem;
use uuid::Uuid;

use crate::CoreError;

/// Abstraction over persistence backends that store recurring items.
pub trait ItemRepository: Send + Sync {
    fn list_all(&self) -> Result<Vec<RecurringItem>, CoreError>;
    fn get(&self, id: Uuid) -> Result<Option<RecurringItem>, CoreError>;
    /// Inserts or replaces the item with the same id.
    fn save(&self, item: &RecurringItem) -> Result<(), CoreError>;
    /// Returns whether an item was removed.
    fn delete(&self, id: Uuid) -> Result<bool, CoreError>;

    /// Opens a group of saves that form one logical change, such as a generation pass.
    /// Backends that keep snapshots take a single one for the whole group.
    fn begin_batch(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Closes the group opened by [`ItemRepository::begin_batch`].
    fn end_batch(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Items that are active, not ended, and due on or before `today`.
    fn list_active_due(&self, today: NaiveDate) -> Result<Vec<RecurringItem>, CoreError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|item| item.should_generate(today))
            .collect())
    }
}
