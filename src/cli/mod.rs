//! Line-oriented command shell over [`crate::RecurringManager`].

mod handlers;
mod help;
pub mod output;
mod registry;
mod shell;
mod shell_context;

pub use handlers::{CliError, CommandError};
pub use shell::{run_cli, run_script};
pub use shell_context::{ShellContext, HOME_ENV, TODAY_ENV};
