// Lungora Console - admin client for the Lungora triage platform
//
// Every dashboard screen is a subcommand. One-shot commands reuse the stored
// session as-is; `lungora shell` also validates it and keeps it fresh with a
// proactive refresh task until the shell exits.
//
// Architecture:
// - cli: argument parsing and the config subcommand
// - commands: one handler per subcommand, shared with the shell
// - shell: rustyline loop feeding lines back through the same parser
// - lungora_console: session, HTTP middleware chain, API resources, views

mod cli;
mod commands;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use lungora_console::app::Console;
use lungora_console::config::Config;
use lungora_console::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands only touch the config file; no logging, no session
    if let Commands::Config {
        show,
        reset,
        edit,
        path,
    } = cli.command
    {
        return cli::handle_config(show, reset, edit, path);
    }

    Config::ensure_config_exists();
    let config = Config::from_env()?;

    // Keep the guard alive so the file appender flushes on exit
    let _log_guard = logging::init(&config.logging);
    tracing::debug!(version = lungora_console::config::VERSION, "Starting");

    let console = Console::new(config).context("Failed to start console")?;

    let result = match cli.command {
        Commands::Shell => shell::run(&console).await,
        command => {
            console.controller.hydrate();
            commands::run(&console, command).await
        }
    };

    commands::report(&console);
    result
}
