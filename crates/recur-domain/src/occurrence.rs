//! Records exchanged with downstream transaction consumers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{ItemKind, RecurringItem};

/// Where a downstream transaction came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrigin {
    #[default]
    Manual,
    Recurring,
}

/// Payload handed to a transaction sink for one due occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub kind: ItemKind,
    pub amount: Decimal,
    /// Expense category or income source.
    pub category: String,
    pub date: NaiveDate,
    /// Note for expenses, description for income.
    pub note: Option<String>,
    pub origin: TransactionOrigin,
    /// Recurring item that produced the transaction.
    pub link_id: Uuid,
}

impl TransactionRequest {
    pub fn for_occurrence(item: &RecurringItem, date: NaiveDate) -> Self {
        Self {
            kind: item.kind,
            amount: item.amount,
            category: item.category.clone(),
            date,
            note: item.note.clone(),
            origin: TransactionOrigin::Recurring,
            link_id: item.id,
        }
    }
}

/// An occurrence that was successfully handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedOccurrence {
    pub item_id: Uuid,
    pub transaction_id: Uuid,
    pub kind: ItemKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
}

impl GeneratedOccurrence {
    pub fn from_request(request: &TransactionRequest, transaction_id: Uuid) -> Self {
        Self {
            item_id: request.link_id,
            transaction_id,
            kind: request.kind,
            amount: request.amount,
            category: request.category.clone(),
            date: request.date,
        }
    }
}

/// A projected occurrence that has not been generated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingOccurrence {
    pub item_id: Uuid,
    pub kind: ItemKind,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
}

impl UpcomingOccurrence {
    pub fn for_item(item: &RecurringItem, date: NaiveDate) -> Self {
        Self {
            item_id: item.id,
            kind: item.kind,
            amount: item.amount,
            category: item.category.clone(),
            date,
        }
    }
}
