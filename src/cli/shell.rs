use std::io::{self, BufRead};

use shell_words::split;

use super::{
    handlers::{CliError, CommandError},
    output,
    shell_context::{LoopControl, ShellContext},
};

/// Runs the command shell over stdin using the environment-derived context.
pub fn run_cli() -> Result<(), CliError> {
    let mut context = ShellContext::from_env()?;
    crate::init_with_filter(&context.config.log_filter);
    let stdin = io::stdin();
    run_script(&mut context, stdin.lock())
}

/// Executes one command per line until input ends or `exit` is read.
///
/// Lines starting with `#` are comments. Command errors are reported and the script
/// continues; only read failures abort.
pub fn run_script(context: &mut ShellContext, input: impl BufRead) -> Result<(), CliError> {
    for line in input.lines() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err),
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    if line.trim_start().starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(&err.message);
            return Ok(LoopControl::Continue);
        }
    };

    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    context.last_command = Some(line.trim().to_string());

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

#[derive(Debug)]
pub(crate) struct ParseError {
    pub message: String,
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;
    use recur_config::Config;
    use recur_core::{FixedClock, InMemoryItemRepository, MemoryTransactionSink};

    use super::*;
    use crate::manager::RecurringManager;

    fn context_on(today: NaiveDate) -> ShellContext {
        let manager = RecurringManager::new(
            Box::new(InMemoryItemRepository::new()),
            Box::new(MemoryTransactionSink::new()),
            Box::new(FixedClock::on(today)),
        );
        ShellContext::new(manager, Config::default())
    }

    fn run(context: &mut ShellContext, script: &str) {
        run_script(context, Cursor::new(script.to_string())).expect("script runs");
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"add expense 12 "Coffee beans" weekly"#).expect("tokens");
        assert_eq!(tokens, vec!["add", "expense", "12", "Coffee beans", "weekly"]);
        assert!(parse_command_line(r#"add "unterminated"#).is_err());
    }

    #[test]
    fn script_creates_pauses_and_generates() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut context = context_on(today);
        run(
            &mut context,
            "# monthly bills\n\
             add expense 1200 Rent monthly:1 --start 2024-04-01\n\
             add income 50 \"Side gig\" weekly --start 2024-05-10\n",
        );
        let items = context.manager.list().expect("list");
        assert_eq!(items.len(), 2);
        let rent = items
            .iter()
            .find(|item| item.category == "Rent")
            .expect("rent item");
        assert_eq!(rent.next_due_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let prefix = rent.id.simple().to_string()[..8].to_string();
        run(&mut context, &format!("pause {prefix}\ngenerate\n"));
        assert!(!context.manager.get(rent.id).expect("rent").is_active);
        let gig = context
            .manager
            .list()
            .expect("list")
            .into_iter()
            .find(|item| item.category == "Side gig")
            .expect("gig item");
        assert_eq!(gig.last_generated_date, Some(today));
    }

    #[test]
    fn exit_stops_processing_and_errors_do_not() {
        let mut context = context_on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        run(
            &mut context,
            "pause deadbeef\nlsit\nadd expense -5 Rent daily\nexit\nadd expense 5 Rent daily\n",
        );
        assert!(!context.running);
        assert!(context.manager.list().expect("list").is_empty());
        assert_eq!(context.last_command.as_deref(), Some("exit"));
    }

    #[test]
    fn typos_suggest_the_closest_command() {
        let context = context_on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(context.closest_command("genrate"), Some("generate"));
        assert_eq!(context.closest_command("LSIT"), Some("list"));
        assert_eq!(context.closest_command("xyzzyplugh"), None);
    }
}
