use std::io;

use chrono::NaiveDate;
use recur_domain::{ItemDraft, ItemKind, RecurrenceRule, RecurringItem, UpcomingOccurrence};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{errors::EngineError, utils::build_info};

use super::{
    help, output,
    registry::{CommandEntry, CommandRegistry},
    shell_context::ShellContext,
};

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// Errors that stop the CLI host itself.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Engine(inner) => CliError::Engine(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "help",
        "Show available commands",
        "help [command]",
        cmd_help,
    ));
    registry.register(CommandEntry::new(
        "version",
        "Show build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::new(
        "add",
        "Create a recurring expense or income",
        "add <expense|income> <amount> <category> <rule> [--start YYYY-MM-DD] [--end YYYY-MM-DD] [--note TEXT]",
        cmd_add,
    ));
    registry.register(CommandEntry::new(
        "list",
        "List recurring items",
        "list [--json]",
        cmd_list,
    ));
    registry.register(CommandEntry::new(
        "upcoming",
        "Project occurrences due in the coming days",
        "upcoming [days]",
        cmd_upcoming,
    ));
    registry.register(CommandEntry::new(
        "pause",
        "Stop generating an item until resumed",
        "pause <id>",
        cmd_pause,
    ));
    registry.register(CommandEntry::new(
        "resume",
        "Reactivate a paused item from today",
        "resume <id>",
        cmd_resume,
    ));
    registry.register(CommandEntry::new(
        "delete",
        "Remove a recurring item",
        "delete <id>",
        cmd_delete,
    ));
    registry.register(CommandEntry::new(
        "generate",
        "Create transactions for every due occurrence",
        "generate",
        cmd_generate,
    ));
    registry.register(CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit));
    registry.alias("quit", "exit");
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        None => help::print_overview(&context.registry),
        Some(name) => match context.registry.get(&name.to_ascii_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        },
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::info(meta.summary());
    output::line(format!("  built:   {}", meta.timestamp));
    output::line(format!("  target:  {} ({})", meta.target, meta.profile));
    output::line(format!("  rustc:   {}", meta.rustc));
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let draft = parse_add(args, context.manager.today())?;
    let item = context.manager.create(draft)?;
    output::success(format!(
        "Recurring {} `{}` created (id {}), next due {}",
        item.kind,
        item.category,
        short_id(item.id),
        item.next_due_date
    ));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let items = context.manager.list()?;
    if args.first() == Some(&"--json") {
        output::line(serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        output::info("No recurring items yet. Use `add` to create one.");
        return Ok(());
    }
    let today = context.manager.today();
    output::section("Recurring items");
    for item in &items {
        output::line(format_item_row(item, today));
    }
    Ok(())
}

fn cmd_upcoming(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let days = match args.first() {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            CommandError::InvalidArguments(format!("invalid day count `{}`", raw))
        })?,
        None => context.config.upcoming_window_days,
    };
    let upcoming = context.manager.list_upcoming(days)?;
    if upcoming.is_empty() {
        output::info(format!("No occurrences due in the next {} days.", days));
        return Ok(());
    }
    output::section(format!("Upcoming (next {} days)", days));
    for entry in &upcoming {
        output::line(format_upcoming_row(entry));
    }
    Ok(())
}

fn cmd_pause(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = context.resolve_id(required_arg(args, "pause <id>")?)?;
    let item = context.manager.pause(id)?;
    output::success(format!(
        "Paused `{}` ({}); generation stops until it is resumed",
        item.category,
        short_id(item.id)
    ));
    Ok(())
}

fn cmd_resume(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = context.resolve_id(required_arg(args, "resume <id>")?)?;
    let item = context.manager.resume(id)?;
    output::success(format!(
        "Resumed `{}` ({}), next due {}",
        item.category,
        short_id(item.id),
        item.next_due_date
    ));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = context.resolve_id(required_arg(args, "delete <id>")?)?;
    context.manager.delete(id)?;
    output::success(format!("Deleted recurring item {}", short_id(id)));
    Ok(())
}

fn cmd_generate(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let report = context.manager.generate_due()?;
    if report.throttled {
        output::warning("Generation skipped: the previous pass ran too recently.");
        return Ok(());
    }
    for occurrence in &report.occurrences {
        output::line(format!(
            "  {}  {:<7}  {:>10}  {}",
            occurrence.date,
            occurrence.kind.to_string(),
            occurrence.amount.to_string(),
            occurrence.category
        ));
    }
    for failure in &report.failures {
        output::warning(format!(
            "Item {} stopped after {} occurrence(s): {}",
            short_id(failure.item_id),
            failure.emitted,
            failure.error
        ));
    }
    for item_id in &report.truncated {
        output::warning(format!(
            "Item {} reached the catch-up limit; run `generate` again to continue.",
            short_id(*item_id)
        ));
    }
    if report.occurrences.is_empty() && report.failures.is_empty() {
        output::info("Nothing due.");
    } else {
        output::success(format!(
            "Generated {} transaction(s) as of {}",
            report.generated_count(),
            context.manager.today()
        ));
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

fn parse_add(args: &[&str], today: NaiveDate) -> Result<ItemDraft, CommandError> {
    let mut positional = Vec::new();
    let mut start = None;
    let mut end = None;
    let mut note = None;

    let mut iter = args.iter().copied();
    while let Some(arg) = iter.next() {
        match arg {
            "--start" => start = Some(parse_date(option_value(&mut iter, arg)?)?),
            "--end" => end = Some(parse_date(option_value(&mut iter, arg)?)?),
            "--note" => note = Some(option_value(&mut iter, arg)?.to_string()),
            flag if flag.starts_with("--") => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `{}`",
                    flag
                )))
            }
            value => positional.push(value),
        }
    }

    let [kind, amount, category, rule] = positional.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: add <expense|income> <amount> <category> <rule>".into(),
        ));
    };

    let mut draft = ItemDraft::new(
        parse_kind(kind)?,
        parse_amount(amount)?,
        *category,
        parse_rule(rule)?,
        start.unwrap_or(today),
    );
    if let Some(end) = end {
        draft = draft.ending_on(end);
    }
    if let Some(note) = note {
        draft = draft.with_note(note);
    }
    Ok(draft)
}

fn option_value<'a>(
    iter: &mut impl Iterator<Item = &'a str>,
    flag: &str,
) -> Result<&'a str, CommandError> {
    iter.next()
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{}` needs a value", flag)))
}

fn required_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    args.first()
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
}

fn parse_kind(raw: &str) -> Result<ItemKind, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "expense" => Ok(ItemKind::Expense),
        "income" => Ok(ItemKind::Income),
        _ => Err(CommandError::InvalidArguments(format!(
            "kind must be `expense` or `income`, got `{}`",
            raw
        ))),
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, CommandError> {
    raw.parse::<Decimal>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{}`", raw)))
}

fn parse_rule(raw: &str) -> Result<RecurrenceRule, CommandError> {
    raw.parse::<RecurrenceRule>()
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

fn format_item_row(item: &RecurringItem, today: NaiveDate) -> String {
    format!(
        "  {}  {:<7}  {:>10}  {:<16}  {:<24}  next {}  {}",
        short_id(item.id),
        item.kind.to_string(),
        item.amount.to_string(),
        item.category,
        item.rule.label(),
        item.next_due_date,
        item.status(today)
    )
}

fn format_upcoming_row(entry: &UpcomingOccurrence) -> String {
    format!(
        "  {}  {:<7}  {:>10}  {:<16}  {}",
        entry.date,
        entry.kind.to_string(),
        entry.amount.to_string(),
        entry.category,
        short_id(entry.item_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn add_arguments_build_a_draft() {
        let draft = parse_add(
            &[
                "income",
                "2500.00",
                "Salary",
                "monthly:25",
                "--end",
                "2025-12-31",
                "--note",
                "ACME payroll",
            ],
            date(2024, 1, 10),
        )
        .expect("draft");
        assert_eq!(draft.kind, ItemKind::Income);
        assert_eq!(draft.amount, Decimal::new(250_000, 2));
        assert_eq!(draft.rule, RecurrenceRule::monthly_on(25));
        assert_eq!(draft.start_date, date(2024, 1, 10));
        assert_eq!(draft.end_date, Some(date(2025, 12, 31)));
        assert_eq!(draft.note.as_deref(), Some("ACME payroll"));
    }

    #[test]
    fn add_rejects_bad_input() {
        let today = date(2024, 1, 10);
        for args in [
            &["expense", "12", "Rent"][..],
            &["gift", "12", "Rent", "daily"][..],
            &["expense", "twelve", "Rent", "daily"][..],
            &["expense", "12", "Rent", "fortnightly"][..],
            &["expense", "12", "Rent", "daily", "--start"][..],
            &["expense", "12", "Rent", "daily", "--every", "2"][..],
        ] {
            assert!(
                matches!(parse_add(args, today), Err(CommandError::InvalidArguments(_))),
                "{args:?} should be rejected"
            );
        }
    }

    #[test]
    fn short_ids_are_eight_hex_chars() {
        let id = Uuid::new_v4();
        let short = short_id(id);
        assert_eq!(short.len(), 8);
        assert!(id.simple().to_string().starts_with(&short));
    }
}
