// Interactive shell - one long-lived session
//
// Lines are split into words and parsed with the same subcommands as the
// binary. The session is validated once on entry and the proactive refresh
// task runs until the shell exits (the console drop cancels it).

use crate::cli::{self, Commands, ShellLine};
use crate::commands;
use anyhow::Result;
use clap::Parser;
use lungora_console::app::Console;
use lungora_console::session::TokenSource;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};

const HELP: &str = "\
Type a subcommand as you would after `lungora`, e.g.

  list doctors --search sara --sort name
  show articles 12
  login admin@lungora.test --remember

`help <command>` or `<command> --help` for details, `exit` to leave.";

pub async fn run(console: &Console) -> Result<()> {
    let restored = console.start().await;
    let settings = console.settings();
    println!("{} - {}", settings.name, settings.description);
    if restored {
        println!("Session restored.");
    } else {
        println!("Not logged in. Use `login <email>`.");
    }
    commands::report(console);

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .build();
    let mut editor = DefaultEditor::with_config(config)?;

    loop {
        let prompt = if console.session.is_authenticated() {
            "lungora> "
        } else {
            "lungora (logged out)> "
        };

        // Blocking read; the refresh task keeps running on other workers
        let line = tokio::task::block_in_place(|| editor.readline(prompt));
        let line = match line {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match trimmed {
            "exit" | "quit" => break,
            "help" => {
                println!("{}", HELP);
                continue;
            }
            _ => {}
        }

        let mut words = match cli::split_words(trimmed) {
            Ok(words) => words,
            Err(err) => {
                eprintln!("Error: {}", err);
                continue;
            }
        };
        if words.first().map(String::as_str) == Some("help") {
            words.remove(0);
            words.push("--help".to_string());
        }

        match ShellLine::try_parse_from(&words) {
            Ok(ShellLine { command }) => dispatch(console, command).await,
            // Covers --help output as well as real parse errors
            Err(err) => {
                let _ = err.print();
            }
        }
        commands::report(console);
    }

    tracing::debug!("Shell exiting");
    Ok(())
}

async fn dispatch(console: &Console, command: Commands) {
    let result = match command {
        Commands::Shell => {
            println!("Already in the shell.");
            Ok(())
        }
        // Edits take effect on the next start; this session keeps its config
        Commands::Config {
            show,
            reset,
            edit,
            path,
        } => cli::handle_config(show, reset, edit, path),
        command => commands::run(console, command).await,
    };
    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
    }
}
