// CLI module - command-line argument parsing and config handlers
//
// Every dashboard screen maps to a subcommand. `shell` keeps one session
// open and reads further subcommands interactively.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lungora_console::api::WorkingHour;
use lungora_console::config::{Config, VERSION};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::Command;

/// Lungora Console - admin client for the Lungora triage platform
#[derive(Parser)]
#[command(name = "lungora")]
#[command(version = VERSION)]
#[command(about = "Admin client for the Lungora triage platform", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// A line typed into the shell: same subcommands, no binary name
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login(LoginArgs),

    /// End the session on the server and forget stored credentials
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Create an account
    Register {
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        email: String,
    },

    /// Change the password of the logged-in account
    Passwd,

    /// List a collection with search, filters, sorting and paging
    List(ListArgs),

    /// Show one item as JSON
    Show {
        resource: Resource,
        id: String,
    },

    /// Delete one item
    Delete {
        resource: Resource,
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show a doctor's working hours, or replace them with --set
    Hours {
        doctor_id: String,
        /// Replacement schedule entry, repeatable: --set Monday=09:00-17:00
        #[arg(long = "set")]
        set: Vec<WorkingHour>,
    },

    /// Add or edit doctors
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },

    /// Add or rename categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Add or edit articles
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },

    /// Classify a chest image
    Predict { image: PathBuf },

    /// Show or change dashboard branding
    Settings {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        logo: Option<String>,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Interactive session with proactive token refresh
    Shell,
}

#[derive(Args)]
pub struct LoginArgs {
    pub email: String,

    /// Password (prefer --password-stdin or LUNGORA_PASSWORD)
    #[arg(long, env = "LUNGORA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long, conflicts_with = "password")]
    pub password_stdin: bool,

    /// Keep the session across restarts
    #[arg(long, short)]
    pub remember: bool,
}

#[derive(Args)]
pub struct ListArgs {
    pub resource: Resource,

    /// Case-insensitive substring over the resource's search fields
    #[arg(long, short)]
    pub search: Option<String>,

    /// Exact match on a field, repeatable: --filter role=Admin
    #[arg(long = "filter", short, value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Field to sort by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// 1-based page number
    #[arg(long, short, default_value_t = 1)]
    pub page: usize,

    /// Rows per page (defaults to [views] page_size)
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Subcommand)]
pub enum DoctorAction {
    /// Create a doctor (name and email required)
    Add(DoctorFields),
    /// Change the given fields, keep the rest
    Edit {
        id: String,
        #[command(flatten)]
        fields: DoctorFields,
    },
}

#[derive(Args, Default)]
pub struct DoctorFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub specialization: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub about: Option<String>,
    #[arg(long)]
    pub experience_years: Option<u32>,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    Add { name: String },
    Edit { id: String, name: String },
}

#[derive(Subcommand)]
pub enum ArticleAction {
    /// Create an article (all fields required)
    Add(ArticleFields),
    /// Change the given fields, keep the rest
    Edit {
        id: String,
        #[command(flatten)]
        fields: ArticleFields,
    },
}

#[derive(Args, Default)]
pub struct ArticleFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Body text; `@path` reads it from a file
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Users,
    Doctors,
    Categories,
    Articles,
    History,
}

/// Parse `field=value`
pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}

/// Split a shell line into words. Double or single quotes group words;
/// backslash escapes the next character.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                let escaped = chars.next().ok_or("trailing backslash")?;
                current.push(escaped);
                in_word = true;
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

// ─────────────────────────────────────────────────────────────────────────────
// Config subcommand
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_config(show: bool, reset: bool, edit: bool, path: bool) -> Result<()> {
    if path {
        println!("{}", config_path()?.display());
    } else if show {
        handle_config_show()?;
    } else if reset {
        handle_config_reset()?;
    } else if edit {
        handle_config_edit()?;
    } else {
        println!("Usage: lungora config [--show|--reset|--edit|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --edit    Open config file in $EDITOR");
        println!("  --path    Show config file path");
    }
    Ok(())
}

fn config_path() -> Result<PathBuf> {
    Config::config_path().ok_or_else(|| anyhow!("Could not determine config path"))
}

fn handle_config_show() -> Result<()> {
    let config = Config::from_env()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    let path = config_path()?;
    if path.exists() {
        println!("# Source: {}", path.display());
    } else {
        println!("# Source: defaults (no config file)");
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = config_path()?;

    if path.exists() && !confirm(&format!("Config file exists at {}. Overwrite?", path.display()))? {
        println!("Aborted.");
        return Ok(());
    }

    Config::write_default(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

fn handle_config_edit() -> Result<()> {
    let path = config_path()?;

    if !path.exists() {
        Config::write_default(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening {} with {}", path.display(), editor);

    let status = Command::new(&editor).arg(&path).status().with_context(|| {
        format!("Failed to launch editor '{}'. Set $EDITOR to your preferred editor", editor)
    })?;
    if !status.success() {
        bail!("Editor exited with status: {}", status);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Terminal prompts
// ─────────────────────────────────────────────────────────────────────────────

/// Read one line from the terminal without stalling the runtime's other tasks
pub fn prompt_line(prompt: &str) -> Result<String> {
    tokio::task::block_in_place(|| {
        let mut editor = DefaultEditor::new()?;
        match editor.readline(prompt) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => bail!("Cancelled"),
            Err(err) => Err(err.into()),
        }
    })
}

/// y/N prompt; anything but "y" declines
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("role = Admin"),
            Ok(("role".to_string(), "Admin".to_string()))
        );
        assert_eq!(
            parse_filter("specialization="),
            Ok(("specialization".to_string(), String::new()))
        );
        assert!(parse_filter("=Admin").is_err());
        assert!(parse_filter("role").is_err());
    }

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words(r#"list doctors --search "Sara Nabil"  -f 'location=New Cairo'"#).unwrap(),
            vec![
                "list",
                "doctors",
                "--search",
                "Sara Nabil",
                "-f",
                "location=New Cairo"
            ]
        );
        assert_eq!(split_words(r"show users a\ b").unwrap(), vec!["show", "users", "a b"]);
        assert_eq!(split_words(r#"search """#).unwrap(), vec!["search", ""]);
        assert!(split_words("list \"doctors").is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn test_list_args_parse() {
        let cli = Cli::try_parse_from([
            "lungora", "list", "doctors", "-f", "location=Giza", "--sort", "name", "--desc",
            "--page", "2",
        ])
        .unwrap();

        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.resource, Resource::Doctors);
        assert_eq!(args.filters, vec![("location".to_string(), "Giza".to_string())]);
        assert!(args.desc);
        assert_eq!(args.page, 2);
    }

    #[test]
    fn test_write_commands_parse() {
        let cli = Cli::try_parse_from([
            "lungora", "doctor", "edit", "7", "--location", "Giza", "--experience-years", "12",
        ])
        .unwrap();
        let Commands::Doctor {
            action: DoctorAction::Edit { id, fields },
        } = cli.command
        else {
            panic!("expected doctor edit");
        };
        assert_eq!(id, "7");
        assert_eq!(fields.location.as_deref(), Some("Giza"));
        assert_eq!(fields.experience_years, Some(12));
        assert_eq!(fields.name, None);

        let cli = Cli::try_parse_from([
            "lungora", "hours", "7", "--set", "Monday=09:00-17:00", "--set", "Tuesday=10:00-12:00",
        ])
        .unwrap();
        let Commands::Hours { set, .. } = cli.command else {
            panic!("expected hours");
        };
        assert_eq!(set.len(), 2);
        assert_eq!(set[1].day_of_week, "Tuesday");

        assert!(Cli::try_parse_from(["lungora", "hours", "7", "--set", "Monday"]).is_err());
    }

    #[test]
    fn test_shell_line_has_no_binary_name() {
        let line = ShellLine::try_parse_from(["show", "history", "42"]).unwrap();
        assert!(matches!(line.command, Commands::Show { resource: Resource::History, .. }));
    }
}
