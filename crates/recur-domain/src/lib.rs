//! recur-domain
//!
//! Value types for recurring expenses and income plus the pure date calculator.
//! No storage, no clock access, no terminal I/O.

pub mod item;
pub mod occurrence;
pub mod rule;
pub mod schedule;

pub use item::{ItemDraft, ItemError, ItemKind, ItemStatus, Occurrences, RecurringItem};
pub use occurrence::{
    GeneratedOccurrence, TransactionOrigin, TransactionRequest, UpcomingOccurrence,
};
pub use rule::{RecurrenceRule, RuleError, LAST_DAY_OF_MONTH};
pub use schedule::{initial_due, next_occurrence};
