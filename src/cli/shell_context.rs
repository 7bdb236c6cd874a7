use std::{env, path::PathBuf};

use recur_config::{Config, ConfigManager};
use recur_core::{Clock, FixedClock, SystemClock};
use strsim::levenshtein;
use uuid::Uuid;

use crate::{errors::EngineError, manager::RecurringManager};

use super::{
    handlers::{self, parse_date, CliError, CommandError},
    output,
    registry::CommandRegistry,
};

/// Directory holding `config/` and, unless configured otherwise, the item data.
pub const HOME_ENV: &str = "RECUR_HOME";
/// Pins "today" to a `YYYY-MM-DD` date.
pub const TODAY_ENV: &str = "RECUR_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub struct ShellContext {
    pub(crate) registry: CommandRegistry,
    pub manager: RecurringManager,
    pub config: Config,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(manager: RecurringManager, config: Config) -> Self {
        let mut registry = CommandRegistry::new();
        handlers::register_all(&mut registry);
        Self {
            registry,
            manager,
            config,
            last_command: None,
            running: true,
        }
    }

    /// Builds the context from `RECUR_HOME`, the stored config, and `RECUR_TODAY`.
    pub fn from_env() -> Result<Self, CliError> {
        let home = match env::var_os(HOME_ENV) {
            Some(path) => PathBuf::from(path),
            None => Config::default().resolve_data_dir(),
        };
        let config_manager =
            ConfigManager::with_base_dir(home.clone()).map_err(EngineError::from)?;
        let mut config = config_manager.load().map_err(EngineError::from)?;
        if config.data_dir.is_none() {
            config.data_dir = Some(home.join("data"));
        }

        let clock: Box<dyn Clock> = match env::var(TODAY_ENV) {
            Ok(raw) if !raw.trim().is_empty() => {
                Box::new(FixedClock::on(parse_date(raw.trim())?))
            }
            _ => Box::new(SystemClock),
        };
        let manager = RecurringManager::from_config(&config, clock)?;
        Ok(Self::new(manager, config))
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.closest_command(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn closest_command(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_ascii_lowercase();
        self.registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance)
            .filter(|(distance, _)| *distance <= 3)
            .map(|(_, name)| name)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Engine(err) if err.is_not_found() => {
                output::error(&err);
                output::hint("Use `list` to see item ids.");
            }
            other => output::error(&other),
        }
    }

    /// Accepts a full id or an unambiguous prefix of its simple form.
    pub(crate) fn resolve_id(&self, raw: &str) -> Result<Uuid, CommandError> {
        if let Ok(id) = Uuid::parse_str(raw) {
            return Ok(id);
        }
        let needle = raw.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(CommandError::InvalidArguments("item id is required".into()));
        }
        let matches: Vec<Uuid> = self
            .manager
            .list()?
            .into_iter()
            .map(|item| item.id)
            .filter(|id| id.simple().to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(CommandError::InvalidArguments(format!(
                "no recurring item matches `{}`",
                raw
            ))),
            _ => Err(CommandError::InvalidArguments(format!(
                "`{}` matches several items; use more characters",
                raw
            ))),
        }
    }
}
