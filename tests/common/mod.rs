#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use recur_config::Config;
use recur_core::FixedClock;
use recur_domain::{ItemDraft, ItemKind, RecurrenceRule};
use recur_engine::RecurringManager;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique data directory that outlives the calling test.
pub fn temp_data_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn config_for(data_dir: PathBuf) -> Config {
    Config {
        data_dir: Some(data_dir),
        ..Config::default()
    }
}

/// JSON-backed manager whose clock is pinned to `today`.
pub fn manager_on(config: &Config, today: NaiveDate) -> RecurringManager {
    RecurringManager::from_config(config, Box::new(FixedClock::on(today)))
        .expect("create manager")
}

pub fn expense(category: &str, cents: i64, rule: RecurrenceRule, start: NaiveDate) -> ItemDraft {
    ItemDraft::new(ItemKind::Expense, Decimal::new(cents, 2), category, rule, start)
}

pub fn income(category: &str, cents: i64, rule: RecurrenceRule, start: NaiveDate) -> ItemDraft {
    ItemDraft::new(ItemKind::Income, Decimal::new(cents, 2), category, rule, start)
}
