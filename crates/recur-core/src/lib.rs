//! recur-core
//!
//! Recurring item services and the generation engine.
//! Depends on recur-domain. Storage and transaction creation are reached only through
//! the [`ItemRepository`] and [`TransactionSink`] traits.

pub mod error;
pub mod generation_service;
pub mod memory;
pub mod recurring_service;
pub mod repository;
pub mod sink;
pub mod time;


pub use error::CoreError;
pub use generation_service::*;
pub use memory::{InMemoryItemRepository, MemoryTransactionSink, RecordedTransaction};
pub use recurring_service::*;
pub use repository::ItemRepository;
pub use sink::TransactionSink;
pub use time::{Clock, FixedClock, SystemClock};
