// SAT-based deduction assistant for criminal/innocent elimination puzzles.
//
// Each clue line is compiled to CNF and conjoined into a running constraint
// store; after every clue, each person is probed both ways and anyone whose
// status is pinned in every model gets reported once.
//
// Clue language (see `help` inside the program):
//   <letters> <op> <letters|number>     op: = == != <> > >= < <=
//   <letters> is connected|odd|even
//   ~<letters>                          count criminals instead of innocents

mod clue;
mod config;
mod deduce;
mod encode;
mod lexer;
mod oracle;
mod repl;
mod session;
mod store;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Settings, TimeoutPolicy};
use crate::repl::Repl;
use crate::session::Session;

/// Clue solver for daily criminal/innocent deduction puzzles
#[derive(Parser, Debug)]
#[command(name = "clues-core")]
#[command(about = "SAT-based deduction assistant for criminal/innocent puzzles", long_about = None)]
struct Cli {
    /// TOML settings file (solver_seconds, on_timeout)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Time budget per solver call, in seconds
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// What to do when the solver runs out of time
    #[arg(long, value_enum)]
    on_timeout: Option<TimeoutPolicy>,

    /// Don't print the welcome banner
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seconds) = cli.time_limit {
        settings.solver_seconds = seconds;
    }
    if let Some(policy) = cli.on_timeout {
        settings.on_timeout = policy;
    }
    settings.validate()?;

    tracing::debug!(?settings, "starting session");

    let mut repl = Repl::new(Session::new(settings));
    repl.banner = !cli.quiet;
    repl.show_stats = std::env::var("CLUES_STATS").is_ok();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl.run(stdin.lock(), &mut stdout)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["clues-core", "-t", "2.5", "--on-timeout", "abort", "-q"]);
        assert_eq!(cli.time_limit, Some(2.5));
        assert_eq!(cli.on_timeout, Some(TimeoutPolicy::Abort));
        assert!(cli.quiet);
        assert!(cli.config.is_none());
    }
}
