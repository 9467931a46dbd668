// Command handlers - one function per subcommand, shared by one-shot mode
// and the interactive shell

use crate::cli::{
    confirm, prompt_line, ArticleAction, ArticleFields, CategoryAction, Commands, DoctorAction,
    DoctorFields, ListArgs, LoginArgs, Resource,
};
use anyhow::{anyhow, bail, Context, Result};
use lungora_console::api::models::{Article, Category, Doctor, PredictionRecord, User};
use lungora_console::api::{ArticleInput, CategoryInput, DoctorInput, WorkingHour};
use lungora_console::app::Console;
use lungora_console::auth::{ChangePasswordRequest, Credentials, RegisterRequest};
use lungora_console::collection::{self, CollectionState, Record, SortDirection};
use lungora_console::http::FileUpload;
use lungora_console::notice::NoticeLevel;
use lungora_console::session::{PersistenceMode, TokenSource};
use lungora_console::util::render_table;
use serde::Serialize;
use std::io::BufRead;

/// Widest a table cell may get before it is cut with an ellipsis
const MAX_CELL_WIDTH: usize = 40;

type Columns = &'static [(&'static str, &'static str)];

const USER_COLUMNS: Columns = &[
    ("ID", "id"),
    ("User name", "userName"),
    ("Email", "email"),
    ("Role", "role"),
    ("Created", "createdAt"),
];
const DOCTOR_COLUMNS: Columns = &[
    ("ID", "id"),
    ("Name", "name"),
    ("Specialization", "specialization"),
    ("Location", "location"),
    ("Phone", "phone"),
    ("Created", "createdAt"),
];
const CATEGORY_COLUMNS: Columns = &[("ID", "id"), ("Name", "categoryName"), ("Created", "createdAt")];
const ARTICLE_COLUMNS: Columns = &[
    ("ID", "id"),
    ("Title", "title"),
    ("Category", "categoryName"),
    ("Created", "createdAt"),
];
const HISTORY_COLUMNS: Columns = &[
    ("ID", "id"),
    ("User", "userName"),
    ("Prediction", "prediction"),
    ("Confidence (%)", "confidence"),
    ("Created", "createdAt"),
];

pub async fn run(console: &Console, command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => login(console, args).await,
        Commands::Logout => {
            console.controller.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => {
            require_session(console)?;
            let user = console.controller.current_user().await?;
            println!("{} <{}>", user.user_name, user.email);
            if let Some(role) = user.role {
                println!("Role: {}", role);
            }
            Ok(())
        }
        Commands::Register { user_name, email } => {
            let password = prompt_line("Password (visible): ")?;
            let confirm_password = prompt_line("Confirm password (visible): ")?;
            console
                .controller
                .register(&RegisterRequest {
                    user_name,
                    email: email.clone(),
                    password,
                    confirm_password,
                })
                .await?;
            println!("Registered {}. You can log in now.", email);
            Ok(())
        }
        Commands::Passwd => {
            require_session(console)?;
            let current_password = prompt_line("Current password (visible): ")?;
            let new_password = prompt_line("New password (visible): ")?;
            let confirm_new_password = prompt_line("Confirm new password (visible): ")?;
            console
                .controller
                .change_password(&ChangePasswordRequest {
                    current_password,
                    new_password,
                    confirm_new_password,
                })
                .await?;
            println!("Password changed.");
            Ok(())
        }
        Commands::List(args) => {
            require_session(console)?;
            list(console, args).await
        }
        Commands::Show { resource, id } => {
            require_session(console)?;
            show(console, resource, &id).await
        }
        Commands::Delete { resource, id, yes } => {
            require_session(console)?;
            if !yes && !confirm(&format!("Delete {} {}?", resource_name(resource), id))? {
                println!("Aborted.");
                return Ok(());
            }
            delete(console, resource, &id).await?;
            console.notices.push(
                NoticeLevel::Success,
                format!("Deleted {} {}", resource_name(resource), id),
            );
            Ok(())
        }
        Commands::Hours { doctor_id, set } => {
            require_session(console)?;
            let hours = if set.is_empty() {
                console.api.working_hours(&doctor_id).await?
            } else {
                let saved = console.api.set_working_hours(&doctor_id, &set).await?;
                console.notices.push(
                    NoticeLevel::Success,
                    format!("Working hours saved for doctor {}", doctor_id),
                );
                saved
            };
            print_hours(hours);
            Ok(())
        }
        Commands::Doctor { action } => {
            require_session(console)?;
            doctor(console, action).await
        }
        Commands::Category { action } => {
            require_session(console)?;
            category(console, action).await
        }
        Commands::Article { action } => {
            require_session(console)?;
            article(console, action).await
        }
        Commands::Predict { image } => {
            require_session(console)?;
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let file_name = image
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());

            let result = console.api.predict(FileUpload::image(file_name, bytes)).await?;
            println!("Prediction: {}", result.prediction);
            if let Some(confidence) = result.confidence {
                println!("Confidence: {:.1}%", confidence * 100.0);
            }
            for (label, probability) in &result.probabilities {
                println!("  {:<24} {:5.1}%", label, probability * 100.0);
            }
            Ok(())
        }
        Commands::Settings {
            name,
            description,
            logo,
        } => {
            let mut settings = console.settings();
            let changed = name.is_some() || description.is_some() || logo.is_some();
            if let Some(name) = name {
                settings.name = name;
            }
            if let Some(description) = description {
                settings.description = description;
            }
            if let Some(logo) = logo {
                settings.logo = Some(logo).filter(|l| !l.is_empty());
            }
            if changed {
                console.save_settings(&settings);
                console.notices.push(NoticeLevel::Success, "Settings saved");
            }
            print_json(&settings)
        }
        Commands::Config { .. } | Commands::Shell => {
            bail!("This command is not available here")
        }
    }
}

async fn login(console: &Console, args: LoginArgs) -> Result<()> {
    let password = match (args.password, args.password_stdin) {
        (Some(password), _) => password,
        (None, true) => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
        (None, false) => prompt_line("Password (visible): ")?,
    };

    let credentials = Credentials {
        email: args.email,
        password,
    };
    let mode = console
        .controller
        .login(&credentials, args.remember)
        .await
        .map_err(|err| anyhow!("Login failed: {}", err.messages().join("; ")))?;

    match mode {
        PersistenceMode::Durable => println!("Logged in as {} (remembered).", credentials.email),
        PersistenceMode::Ephemeral => println!(
            "Logged in as {} for this session only. Use --remember to stay logged in.",
            credentials.email
        ),
    }
    Ok(())
}

async fn list(console: &Console, args: ListArgs) -> Result<()> {
    let mut state = CollectionState::new(args.page_size.unwrap_or(console.config.views.page_size));
    if let Some(search) = args.search {
        state.set_search(search);
    }
    for (field, value) in args.filters {
        state.set_filter(field, value);
    }
    if let Some(key) = args.sort {
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        state.set_sort(key, direction);
    }
    state.go_to_page(args.page);

    match args.resource {
        Resource::Users => print_page(&console.api.users().await?, &state, USER_COLUMNS),
        Resource::Doctors => print_page(&console.api.doctors().await?, &state, DOCTOR_COLUMNS),
        Resource::Categories => {
            print_page(&console.api.categories().await?, &state, CATEGORY_COLUMNS)
        }
        Resource::Articles => print_page(&console.api.articles().await?, &state, ARTICLE_COLUMNS),
        Resource::History => print_page(&console.api.history().await?, &state, HISTORY_COLUMNS),
    }
    Ok(())
}

fn print_page<T: Record>(items: &[T], state: &CollectionState, columns: Columns) {
    let view = collection::view(items, state);
    if view.total_count == 0 {
        println!("No results.");
        return;
    }

    let headers: Vec<&str> = columns.iter().map(|(header, _)| *header).collect();
    let rows: Vec<Vec<String>> = view
        .page
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|(_, key)| item.field(key).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    print!("{}", render_table(&headers, &rows, MAX_CELL_WIDTH));
    println!(
        "\nPage {} of {} ({} result{})",
        view.current_page,
        view.total_pages,
        view.total_count,
        if view.total_count == 1 { "" } else { "s" }
    );
}

fn print_hours(hours: Vec<WorkingHour>) {
    let rows: Vec<Vec<String>> = hours
        .into_iter()
        .map(|h| vec![h.day_of_week, h.start_time, h.end_time])
        .collect();
    print!("{}", render_table(&["Day", "From", "To"], &rows, MAX_CELL_WIDTH));
}

// ─────────────────────────────────────────────────────────────────────────────
// Management forms
// ─────────────────────────────────────────────────────────────────────────────

async fn doctor(console: &Console, action: DoctorAction) -> Result<()> {
    let saved = match action {
        DoctorAction::Add(fields) => {
            let (Some(name), Some(email)) = (fields.name.clone(), fields.email.clone()) else {
                bail!("A new doctor needs --name and --email");
            };
            let mut input = DoctorInput {
                name,
                email,
                ..DoctorInput::default()
            };
            apply_doctor_fields(&mut input, fields);
            console.api.create_doctor(&input).await?
        }
        DoctorAction::Edit { id, fields } => {
            let mut input = DoctorInput::from(&console.api.doctor(&id).await?);
            if !apply_doctor_fields(&mut input, fields) {
                bail!("Nothing to change; pass at least one field");
            }
            console.api.update_doctor(&id, &input).await?
        }
    };
    console
        .notices
        .push(NoticeLevel::Success, format!("Saved doctor {}", saved.name));
    print_json(&saved)
}

/// Returns whether any field was given
fn apply_doctor_fields(input: &mut DoctorInput, fields: DoctorFields) -> bool {
    let mut changed = false;
    let mut set = |target: &mut Option<String>, value: Option<String>| {
        if value.is_some() {
            *target = value;
            changed = true;
        }
    };
    set(&mut input.phone, fields.phone);
    set(&mut input.specialization, fields.specialization);
    set(&mut input.location, fields.location);
    set(&mut input.about, fields.about);

    if let Some(name) = fields.name {
        input.name = name;
        changed = true;
    }
    if let Some(email) = fields.email {
        input.email = email;
        changed = true;
    }
    if fields.experience_years.is_some() {
        input.experience_years = fields.experience_years;
        changed = true;
    }
    changed
}

async fn category(console: &Console, action: CategoryAction) -> Result<()> {
    let saved = match action {
        CategoryAction::Add { name } => {
            console
                .api
                .create_category(&CategoryInput { category_name: name })
                .await?
        }
        CategoryAction::Edit { id, name } => {
            console
                .api
                .update_category(&id, &CategoryInput { category_name: name })
                .await?
        }
    };
    console.notices.push(
        NoticeLevel::Success,
        format!("Saved category {}", saved.category_name),
    );
    print_json(&saved)
}

async fn article(console: &Console, action: ArticleAction) -> Result<()> {
    let saved = match action {
        ArticleAction::Add(fields) => {
            let (Some(title), Some(description), Some(content), Some(category_id)) = (
                fields.title,
                fields.description,
                fields.content,
                fields.category_id,
            ) else {
                bail!("A new article needs --title, --description, --content and --category-id");
            };
            let input = ArticleInput {
                title,
                description,
                content: read_content(content).await?,
                category_id,
            };
            console.api.create_article(&input).await?
        }
        ArticleAction::Edit { id, fields } => {
            let mut input = ArticleInput::from(&console.api.article(&id).await?);
            if apply_article_fields(&mut input, fields).await? == 0 {
                bail!("Nothing to change; pass at least one field");
            }
            console.api.update_article(&id, &input).await?
        }
    };
    console
        .notices
        .push(NoticeLevel::Success, format!("Saved article {}", saved.title));
    print_json(&saved)
}

/// Returns how many fields were given
async fn apply_article_fields(input: &mut ArticleInput, fields: ArticleFields) -> Result<usize> {
    let mut given = 0;
    if let Some(title) = fields.title {
        input.title = title;
        given += 1;
    }
    if let Some(description) = fields.description {
        input.description = description;
        given += 1;
    }
    if let Some(content) = fields.content {
        input.content = read_content(content).await?;
        given += 1;
    }
    if let Some(category_id) = fields.category_id {
        input.category_id = category_id;
        given += 1;
    }
    Ok(given)
}

/// `@path` loads the body from a file; anything else is the body itself
async fn read_content(raw: String) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path)),
        None => Ok(raw),
    }
}

async fn show(console: &Console, resource: Resource, id: &str) -> Result<()> {
    match resource {
        Resource::Users => print_json::<User>(&console.api.user(id).await?),
        Resource::Doctors => print_json::<Doctor>(&console.api.doctor(id).await?),
        Resource::Articles => print_json::<Article>(&console.api.article(id).await?),
        Resource::History => print_json::<PredictionRecord>(&console.api.history_entry(id).await?),
        Resource::Categories => {
            // No single-category endpoint; pick it out of the list
            let categories: Vec<Category> = console.api.categories().await?;
            let category = categories
                .into_iter()
                .find(|c| c.id == id)
                .ok_or_else(|| anyhow!("No category with id {}", id))?;
            print_json(&category)
        }
    }
}

async fn delete(console: &Console, resource: Resource, id: &str) -> Result<()> {
    match resource {
        Resource::Users => console.api.delete_user(id).await?,
        Resource::Doctors => console.api.delete_doctor(id).await?,
        Resource::Categories => console.api.delete_category(id).await?,
        Resource::Articles => console.api.delete_article(id).await?,
        Resource::History => console.api.delete_history_entry(id).await?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resource_name(resource: Resource) -> &'static str {
    match resource {
        Resource::Users => "user",
        Resource::Doctors => "doctor",
        Resource::Categories => "category",
        Resource::Articles => "article",
        Resource::History => "history entry",
    }
}

fn require_session(console: &Console) -> Result<()> {
    if console.session.is_authenticated() {
        Ok(())
    } else {
        bail!("Not logged in. Run `lungora login <email>` first.")
    }
}

/// Print queued notices and the login hint, once each
pub fn report(console: &Console) {
    for notice in console.notices.drain() {
        eprintln!("[{}] {}", notice.level.as_str(), notice.message);
    }
    if console.take_login_request() {
        eprintln!("Log in again with `lungora login <email>`.");
    }
}
