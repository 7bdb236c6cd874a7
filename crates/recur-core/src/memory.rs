//! In-process adapters for hosts without persistence and for tests.

use std::{
    collections::BTreeMap,
    sync::{Mutex, RwLock},
};

use chrono::{Datelike, NaiveDate};
use recur_domain::{ItemKind, RecurringItem, TransactionRequest};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{CoreError, ItemRepository, TransactionSink};

fn poisoned() -> CoreError {
    CoreError::Storage("in-memory store lock poisoned".into())
}

/// Recurring items kept in a map keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    items: RwLock<BTreeMap<Uuid, RecurringItem>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = RecurringItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item.id, item)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemRepository for InMemoryItemRepository {
    fn list_all(&self) -> Result<Vec<RecurringItem>, CoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.values().cloned().collect())
    }

    fn get(&self, id: Uuid) -> Result<Option<RecurringItem>, CoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(&id).cloned())
    }

    fn save(&self, item: &RecurringItem) -> Result<(), CoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.insert(item.id, item.clone());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool, CoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        Ok(items.remove(&id).is_some())
    }
}

/// A transaction accepted by [`MemoryTransactionSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    pub id: Uuid,
    pub request: TransactionRequest,
}

/// Sink that records every request in insertion order.
#[derive(Debug, Default)]
pub struct MemoryTransactionSink {
    recorded: Mutex<Vec<RecordedTransaction>>,
}

impl MemoryTransactionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> Vec<RecordedTransaction> {
        self.recorded
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.recorded.lock().map(|recorded| recorded.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of recorded amounts of `kind` dated within the month of `date`.
    pub fn monthly_total(&self, kind: ItemKind, date: NaiveDate) -> Decimal {
        self.transactions()
            .iter()
            .filter(|txn| txn.request.kind == kind)
            .filter(|txn| {
                txn.request.date.year() == date.year() && txn.request.date.month() == date.month()
            })
            .map(|txn| txn.request.amount)
            .sum()
    }

    fn record(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        let mut recorded = self
            .recorded
            .lock()
            .map_err(|_| CoreError::Sink("in-memory sink lock poisoned".into()))?;
        let id = Uuid::new_v4();
        recorded.push(RecordedTransaction {
            id,
            request: request.clone(),
        });
        Ok(id)
    }
}

impl TransactionSink for MemoryTransactionSink {
    fn create_expense(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        self.record(request)
    }

    fn create_income(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        self.record(request)
    }
}
