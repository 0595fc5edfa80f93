// DaveAssist - soft delete, restore and trash for care groups
// Entry point and command-line setup

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use daveassist::app::AppState;
use daveassist::commands::{self, ConsoleSink, ItemRef};
use daveassist::config::{
    DEFAULT_LOG_FILTER, DEFAULT_SETTINGS_FILE, ENV_SETTINGS_PATH, ENV_USER_EMAIL, ENV_USER_ID,
    TRASH_RETENTION_DAYS,
};
use daveassist::database::Actor;
use daveassist::registry::EntityKind;
use daveassist::services::{SettingsService, TrashListing};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "daveassist", version, about = "Soft delete, restore and trash for care groups")]
struct Cli {
    /// Use a local SQLite store instead of the hosted backend
    #[arg(long, global = true, value_name = "DB")]
    local: Option<PathBuf>,

    /// Settings file
    #[arg(
        long,
        global = true,
        env = ENV_SETTINGS_PATH,
        default_value = DEFAULT_SETTINGS_FILE
    )]
    settings: PathBuf,

    /// Acting user for the local store
    #[arg(long, global = true, env = ENV_USER_ID)]
    user_id: Option<String>,

    /// Acting user's email for the local store
    #[arg(long, global = true, env = ENV_USER_EMAIL)]
    email: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show version and active backend
    Info,
    /// Recently deleted items of a care group
    Trash {
        #[command(subcommand)]
        action: TrashCommand,
    },
    /// Move items of one kind to the trash
    Delete {
        kind: EntityKind,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Restore items of one kind from the trash
    Restore {
        kind: EntityKind,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Permanently remove items trashed longer than the retention window.
    /// Windows shorter than the default are refused.
    Purge {
        #[arg(long, default_value_t = TRASH_RETENTION_DAYS)]
        retention_days: i64,
    },
}

#[derive(Subcommand)]
enum TrashCommand {
    /// List trashed items, newest deletion first
    List {
        #[arg(long)]
        group: String,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count trashed items
    Count {
        #[arg(long)]
        group: String,
    },
    /// Restore items given as <type>:<id>
    Restore {
        #[arg(long)]
        group: String,
        #[arg(required = true)]
        items: Vec<ItemRef>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so listings stay pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = SettingsService::new(cli.settings.clone())
        .load_with_env()
        .await
        .context("Failed to load settings")?;

    let state = match &cli.local {
        Some(db_path) => {
            let actor = match (cli.user_id.clone(), cli.email.clone()) {
                (Some(user_id), Some(email)) => Some(Actor::new(user_id, email)),
                _ => None,
            };
            AppState::local(db_path, actor, &settings).await?
        }
        None => AppState::remote(&settings)?,
    };

    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    let sink = ConsoleSink;

    match command {
        Command::Info => {
            let info = commands::get_app_info(state);
            println!("daveassist {} ({} backend)", info.version, info.backend);
        }
        Command::Trash { action } => match action {
            TrashCommand::List { group, json } => {
                let listing = commands::list_trash(state, &group).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                } else {
                    print_listing(&listing);
                }
            }
            TrashCommand::Count { group } => {
                println!("{}", commands::count_trash(state, &group).await?);
            }
            TrashCommand::Restore { group, items } => {
                if !commands::restore_from_trash(state, &sink, &group, &items).await? {
                    bail!("Some items could not be restored");
                }
            }
        },
        Command::Delete { kind, ids } => {
            if !commands::delete_entities(state, &sink, kind, &ids).await? {
                bail!("Some {} could not be deleted", kind.spec().plural);
            }
        }
        Command::Restore { kind, ids } => {
            if !commands::restore_entities(state, &sink, kind, &ids).await? {
                bail!("Some {} could not be restored", kind.spec().plural);
            }
        }
        Command::Purge { retention_days } => {
            let purged = commands::purge_expired(state, retention_days).await?;
            println!("Purged {} item(s) older than {} days", purged, retention_days);
        }
    }

    Ok(())
}

fn print_listing(listing: &TrashListing) {
    if listing.items.is_empty() {
        println!("Trash is empty");
        return;
    }

    let now = Utc::now();
    for item in &listing.items {
        println!(
            "{}  {:<11} {}  {}  (by {}, {} days left)",
            item.deleted_at.format("%Y-%m-%d %H:%M"),
            item.kind,
            item.id,
            item.title,
            item.deleted_by_email.as_deref().unwrap_or("unknown"),
            item.days_until_purge(now),
        );
    }

    if listing.truncated {
        println!(
            "Showing {} of {} items; older items are not shown",
            listing.items.len(),
            listing.total
        );
    }
}
