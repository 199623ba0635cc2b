mod form;
mod list;
mod models;
mod store;
mod tui;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use form::ValidationError;
use models::{ApplicationRecord, EditableApplicationFields, NewApplicationFields};
use store::{RecordStore, SqliteStore};

#[derive(Parser)]
#[command(name = "apptrack")]
#[command(about = "Track job applications - add, list, filter, edit, and delete them")]
struct Cli {
    /// Path to the database file (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Add an application
    Add {
        /// Company name
        #[arg(short, long)]
        company: String,

        /// Position applied for
        #[arg(short, long)]
        position: String,

        /// Status (Applied, Pending, Rejected, Interview, Almost!, or anything else)
        #[arg(short, long, default_value = "Applied")]
        status: String,

        /// Link to the posting
        #[arg(long)]
        url: Option<String>,

        /// Location
        #[arg(short, long)]
        location: Option<String>,
    },

    /// List applications, newest first
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show application details
    Show {
        /// Application id (a unique prefix is enough)
        id: String,
    },

    /// Edit an application; unspecified fields keep their current value
    Edit {
        /// Application id (a unique prefix is enough)
        id: String,

        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        position: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        salary_range: Option<String>,
    },

    /// Delete an application
    Delete {
        /// Application id (a unique prefix is enough)
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Browse applications interactively
    Browse {
        /// Start with a status filter applied
        #[arg(short, long)]
        status: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match &cli.db {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_default()?,
    };

    match cli.command {
        Commands::Init => {
            println!("Database initialized at {}", store.path().display());
        }

        Commands::Add {
            company,
            position,
            status,
            url,
            location,
        } => {
            if company.trim().is_empty() {
                return Err(ValidationError::MissingField("company").into());
            }
            if position.trim().is_empty() {
                return Err(ValidationError::MissingField("position").into());
            }
            let record = store.create(&NewApplicationFields {
                company: company.trim().to_string(),
                position: position.trim().to_string(),
                status,
                url,
                location,
            })?;
            println!(
                "Added application {} ({} - {})",
                short_id(&record.id),
                record.company,
                record.position
            );
        }

        Commands::List { status, json } => {
            let records = store.list_all()?;
            let records: Vec<ApplicationRecord> = match status {
                Some(status) => records.into_iter().filter(|r| r.status == status).collect(),
                None => records,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No applications found.");
            } else {
                println!(
                    "{:<10} {:<10} {:<22} {:<26} {:<12}",
                    "ID", "STATUS", "COMPANY", "POSITION", "APPLIED"
                );
                println!("{}", "-".repeat(82));
                for record in records {
                    println!(
                        "{:<10} {:<10} {:<22} {:<26} {:<12}",
                        short_id(&record.id),
                        truncate(&record.status, 10),
                        truncate(&record.company, 20),
                        truncate(&record.position, 24),
                        &record.applied_date[..record.applied_date.len().min(10)],
                    );
                }
            }
        }

        Commands::Show { id } => {
            let record = resolve(&store, &id)?;
            println!("Application {}", record.id);
            println!("Company: {}", record.company);
            println!("Position: {}", record.position);
            println!("Status: {}", record.status);
            println!("Applied: {}", record.applied_date);
            if let Some(url) = &record.url {
                println!("URL: {}", url);
            }
            if let Some(location) = &record.location {
                println!("Location: {}", location);
            }
            if let Some(salary) = &record.salary_range {
                println!("Salary range: {}", salary);
            }
        }

        Commands::Edit {
            id,
            company,
            position,
            status,
            url,
            location,
            salary_range,
        } => {
            let record = resolve(&store, &id)?;
            let current = record.editable_fields();
            let fields = EditableApplicationFields {
                company: company.unwrap_or(current.company),
                position: position.unwrap_or(current.position),
                status: status.unwrap_or(current.status),
                url: url.or(current.url),
                location: location.or(current.location),
                salary_range: salary_range.or(current.salary_range),
            };
            store.update(&record.id, &fields)?;
            println!("Updated application {}", short_id(&record.id));
        }

        Commands::Delete { id, yes } => {
            let record = resolve(&store, &id)?;
            if !yes && !confirm_delete(&record)? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete(&record.id)?;
            println!("Deleted application to {}", record.company);
        }

        Commands::Browse { status } => {
            tui::run(&store, status.as_deref())?;
        }
    }

    Ok(())
}

/// Looks a record up by full id or unique prefix.
fn resolve(store: &SqliteStore, id: &str) -> Result<ApplicationRecord> {
    if let Some(record) = store.get(id)? {
        return Ok(record);
    }
    let mut matches = store
        .list_all()?
        .into_iter()
        .filter(|r| r.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record),
        (None, _) => Err(anyhow!("No application with id '{}'", id)),
        (Some(_), Some(_)) => Err(anyhow!("Id prefix '{}' is ambiguous", id)),
    }
}

fn confirm_delete(record: &ApplicationRecord) -> Result<bool> {
    print!(
        "Delete application to {} ({})? This cannot be undone. [y/N] ",
        record.company, record.position
    );
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        assert_eq!(truncate("ééééééééééé", 10), "ééééééé...");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-ten", 11), "exactly-ten");
    }

    #[test]
    fn short_id_handles_ids_shorter_than_the_prefix() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
