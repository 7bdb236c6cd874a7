use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, NaiveDate, Utc};
use recur_core::{CoreError, TransactionSink};
use recur_domain::{ItemKind, TransactionOrigin, TransactionRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JOURNAL_FILE: &str = "transactions.jsonl";

/// One transaction accepted by the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub kind: ItemKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub origin: TransactionOrigin,
    pub link_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

impl JournalEntry {
    fn from_request(request: &TransactionRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: request.kind,
            amount: request.amount,
            category: request.category.clone(),
            date: request.date,
            note: request.note.clone(),
            origin: request.origin,
            link_id: request.link_id,
            recorded_at: Utc::now(),
        }
    }
}

/// Transaction sink that appends one JSON object per line.
#[derive(Debug)]
pub struct JsonTransactionJournal {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl JsonTransactionJournal {
    pub fn new(root: &Path) -> Result<Self, CoreError> {
        fs::create_dir_all(root)?;
        Ok(Self::at_path(root.join(JOURNAL_FILE)))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every recorded entry in append order.
    pub fn entries(&self) -> Result<Vec<JournalEntry>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|err| CoreError::Serde(err.to_string()))
            })
            .collect()
    }

    /// Entries produced by one recurring item.
    pub fn entries_for(&self, item_id: Uuid) -> Result<Vec<JournalEntry>, CoreError> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.link_id == item_id)
            .collect())
    }

    fn append(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        let entry = JournalEntry::from_request(request);
        let mut line =
            serde_json::to_string(&entry).map_err(|err| CoreError::Serde(err.to_string()))?;
        line.push('\n');

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| CoreError::Sink("journal lock poisoned".into()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| CoreError::Sink(format!("{}: {}", self.path.display(), err)))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|err| CoreError::Sink(format!("{}: {}", self.path.display(), err)))?;
        Ok(entry.id)
    }
}

impl TransactionSink for JsonTransactionJournal {
    fn create_expense(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        self.append(request)
    }

    fn create_income(&self, request: &TransactionRequest) -> Result<Uuid, CoreError> {
        self.append(request)
    }
}
