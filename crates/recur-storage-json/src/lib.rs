//! recur-storage-json
//!
//! Filesystem adapters for the recurrence engine: a JSON document of recurring items
//! with rolling backups, and a JSON Lines journal of generated transactions.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use chrono::Utc;
use recur_core::{CoreError, ItemRepository};
use recur_domain::RecurringItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod journal;

pub use journal::{JournalEntry, JsonTransactionJournal};

pub const ITEMS_SCHEMA_VERSION: u32 = 1;
const ITEMS_FILE: &str = "items.json";
const BACKUPS_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "items_";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%6f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// On-disk layout of the items file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub items: Vec<RecurringItem>,
}

impl Default for ItemDocument {
    fn default() -> Self {
        Self {
            schema_version: ITEMS_SCHEMA_VERSION,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// File name inside the backups directory.
    pub id: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Stores every recurring item in one JSON document under `root`.
///
/// Each write replaces the document through a temp file and rename. The previous
/// document is copied into `root/backups` first and only the newest `retention`
/// copies are kept. Inside a batch only the document as it stood when the batch opened
/// is backed up.
#[derive(Debug)]
pub struct JsonItemRepository {
    items_path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    write_lock: Mutex<()>,
    in_batch: AtomicBool,
}

impl JsonItemRepository {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(root, DEFAULT_RETENTION)
    }

    pub fn with_retention(root: PathBuf, retention: usize) -> Result<Self, CoreError> {
        let backups_dir = root.join(BACKUPS_DIR);
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            items_path: root.join(ITEMS_FILE),
            backups_dir,
            retention: retention.max(1),
            write_lock: Mutex::new(()),
            in_batch: AtomicBool::new(false),
        })
    }

    pub fn items_path(&self) -> &Path {
        &self.items_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Backups of the items file, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !file_name.starts_with(BACKUP_PREFIX) {
                continue;
            }
            let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            entries.push(BackupInfo {
                id: file_name.to_string(),
                path: path.clone(),
                size_bytes,
            });
        }
        // Fixed-width timestamps sort chronologically by name.
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    /// Replaces the items file with the backup named `backup_id` and returns its items.
    /// The current file is backed up first, so a restore can itself be undone.
    pub fn restore_backup(&self, backup_id: &str) -> Result<Vec<RecurringItem>, CoreError> {
        let path = self.backups_dir.join(backup_id);
        if !path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup_id
            )));
        }
        let document = load_document(&path)?;
        let _guard = self.lock()?;
        self.write_document(&document)?;
        tracing::info!(
            backup = backup_id,
            items = document.items.len(),
            "items restored from backup"
        );
        Ok(document.items)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, CoreError> {
        self.write_lock
            .lock()
            .map_err(|_| CoreError::Storage("item store lock poisoned".into()))
    }

    fn read_document(&self) -> Result<ItemDocument, CoreError> {
        if !self.items_path.exists() {
            return Ok(ItemDocument::default());
        }
        load_document(&self.items_path)
    }

    fn write_document(&self, document: &ItemDocument) -> Result<(), CoreError> {
        if self.items_path.exists() && !self.in_batch.load(Ordering::SeqCst) {
            self.backup_existing_file()?;
        }
        let json = serde_json::to_string_pretty(document)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        let tmp = tmp_path(&self.items_path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.items_path)?;
        Ok(())
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        fs::create_dir_all(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let file_name = format!("{}{}.{}", BACKUP_PREFIX, timestamp, BACKUP_EXTENSION);
        fs::copy(&self.items_path, self.backups_dir.join(&file_name))?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(backup = %entry.id, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<RecurringItem>) -> T,
    ) -> Result<T, CoreError> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;
        let outcome = change(&mut document.items);
        document.schema_version = ITEMS_SCHEMA_VERSION;
        self.write_document(&document)?;
        Ok(outcome)
    }
}

impl ItemRepository for JsonItemRepository {
    fn list_all(&self) -> Result<Vec<RecurringItem>, CoreError> {
        let _guard = self.lock()?;
        Ok(self.read_document()?.items)
    }

    fn get(&self, id: Uuid) -> Result<Option<RecurringItem>, CoreError> {
        Ok(self.list_all()?.into_iter().find(|item| item.id == id))
    }

    fn save(&self, item: &RecurringItem) -> Result<(), CoreError> {
        self.modify(|items| match items.iter_mut().find(|stored| stored.id == item.id) {
            Some(stored) => *stored = item.clone(),
            None => items.push(item.clone()),
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, CoreError> {
        let _guard = self.lock()?;
        let mut document = self.read_document()?;
        let before = document.items.len();
        document.items.retain(|item| item.id != id);
        if document.items.len() == before {
            return Ok(false);
        }
        self.write_document(&document)?;
        Ok(true)
    }

    fn begin_batch(&self) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        if !self.in_batch.load(Ordering::SeqCst) && self.items_path.exists() {
            self.backup_existing_file()?;
        }
        self.in_batch.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn end_batch(&self) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        self.in_batch.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Reads an items document, rejecting schema versions newer than this build knows.
pub fn load_document(path: &Path) -> Result<ItemDocument, CoreError> {
    let data = fs::read_to_string(path)?;
    let document: ItemDocument =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if document.schema_version > ITEMS_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "unsupported items schema version {} (expected at most {})",
            document.schema_version, ITEMS_SCHEMA_VERSION
        )));
    }
    Ok(document)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
