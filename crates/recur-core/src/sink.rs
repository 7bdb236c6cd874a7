use recur_domain::{ItemKind, TransactionRequest};
use uuid::Uuid;

use crate::CoreError;

/// Downstream transaction creation. Each call is synchronous and may fail.
pub trait TransactionSink: Send + Sync {
    fn create_expense(&self, request: &TransactionRequest) -> Result<Uuid, CoreError>;
    fn create_income(&self, request: &TransactionRequest) -> Result<Uuid, CoreError>;

    /// Routes the request to the method matching its kind.
    fn create(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        match request.kind {
            ItemKind::Expense => self.create_expense(request),
            ItemKind::Income => self.create_income(request),
        }
    }
}
