use chrono::{DateTime, Duration, NaiveDate, Utc};
use recur_config::Config;
use recur_core::{
    Clock, GenerationPolicy, GenerationReport, GenerationService, ItemRepository,
    RecurringService, TransactionSink,
};
use recur_domain::{ItemDraft, RecurringItem, UpcomingOccurrence};
use recur_storage_json::{JsonItemRepository, JsonTransactionJournal};
use uuid::Uuid;

use crate::errors::EngineError;

/// Facade that wires a repository, a transaction sink, and a clock to the engine services.
///
/// The manager also remembers when its last generation pass ran, which feeds the
/// optional throttle in [`GenerationPolicy`].
pub struct RecurringManager {
    repository: Box<dyn ItemRepository>,
    sink: Box<dyn TransactionSink>,
    clock: Box<dyn Clock>,
    policy: GenerationPolicy,
}

impl RecurringManager {
    pub fn new(
        repository: Box<dyn ItemRepository>,
        sink: Box<dyn TransactionSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            sink,
            clock,
            policy: GenerationPolicy::default(),
        }
    }

    /// JSON item store and journal under the configured data directory.
    pub fn from_config(config: &Config, clock: Box<dyn Clock>) -> Result<Self, EngineError> {
        config.validate()?;
        let data_dir = config.resolve_data_dir();
        let repository =
            JsonItemRepository::with_retention(data_dir.clone(), config.backup_retention)?;
        let journal = JsonTransactionJournal::new(&data_dir)?;
        tracing::debug!(data_dir = %data_dir.display(), "opened JSON item store");
        let manager = Self::new(Box::new(repository), Box::new(journal), clock);
        Ok(manager.with_policy(policy_from(config)))
    }

    pub fn with_policy(mut self, policy: GenerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &GenerationPolicy {
        &self.policy
    }

    pub fn repository(&self) -> &dyn ItemRepository {
        self.repository.as_ref()
    }

    pub fn sink(&self) -> &dyn TransactionSink {
        self.sink.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn create(&self, draft: ItemDraft) -> Result<RecurringItem, EngineError> {
        Ok(RecurringService::create(
            self.repository(),
            draft,
            self.today(),
        )?)
    }

    pub fn get(&self, id: Uuid) -> Result<RecurringItem, EngineError> {
        Ok(RecurringService::get(self.repository(), id)?)
    }

    pub fn list(&self) -> Result<Vec<RecurringItem>, EngineError> {
        Ok(RecurringService::list(self.repository())?)
    }

    pub fn update(&self, item: RecurringItem) -> Result<RecurringItem, EngineError> {
        Ok(RecurringService::update(
            self.repository(),
            item,
            self.today(),
        )?)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), EngineError> {
        Ok(RecurringService::delete(self.repository(), id)?)
    }

    pub fn pause(&self, id: Uuid) -> Result<RecurringItem, EngineError> {
        Ok(RecurringService::pause(self.repository(), id)?)
    }

    pub fn resume(&self, id: Uuid) -> Result<RecurringItem, EngineError> {
        Ok(RecurringService::resume(
            self.repository(),
            id,
            self.today(),
        )?)
    }

    pub fn list_upcoming(&self, within_days: u32) -> Result<Vec<UpcomingOccurrence>, EngineError> {
        Ok(RecurringService::list_upcoming(
            self.repository(),
            self.today(),
            within_days,
        )?)
    }

    /// Runs a generation pass at the clock's current instant.
    pub fn generate_due(&mut self) -> Result<GenerationReport, EngineError> {
        let now = self.clock.now();
        self.generate_due_at(now)
    }

    pub fn generate_due_at(&mut self, now: DateTime<Utc>) -> Result<GenerationReport, EngineError> {
        let report =
            GenerationService::generate_due(self.repository(), self.sink(), now, &self.policy)?;
        if !report.throttled {
            self.policy.last_run = Some(now);
        }
        Ok(report)
    }
}

fn policy_from(config: &Config) -> GenerationPolicy {
    GenerationPolicy {
        last_run: None,
        min_interval: config
            .min_generation_interval_minutes
            .map(|minutes| Duration::minutes(i64::from(minutes))),
        max_catch_up: config.max_catch_up,
    }
}
