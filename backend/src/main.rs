// slidecat - Annotatable image catalog
// Entry point and command-line interface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slidecat::app;
use slidecat::commands::{self, CommandOutcome};
use slidecat::config::{AppConfig, DEFAULT_DATABASE_FILE};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for slidecat
#[derive(Parser, Debug)]
#[command(name = "slidecat")]
#[command(about = "Catalog of annotatable image records")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(long, default_value = DEFAULT_DATABASE_FILE, env = "SLIDECAT_DATABASE")]
    database: PathBuf,

    /// XML image batch imported by `startup`
    #[arg(long, env = "SLIDECAT_IMPORT_XML")]
    import_xml: Option<PathBuf>,

    /// JSON color samples applied by `startup`
    #[arg(long, env = "SLIDECAT_COLOR_JSON")]
    color_json: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the configured batch, then update colors in the background
    Startup,
    /// Import an XML image batch
    Import { xml: PathBuf },
    /// Apply a JSON file of color samples
    Colors { json: PathBuf },
    /// Search records
    Search {
        #[arg(long)]
        user: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        comments: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Show a record with its tags and comments
    Show {
        uid: String,
        /// Remember the record as this user's last viewed one
        #[arg(long)]
        user: Option<String>,
    },
    /// Tag vocabulary operations
    #[command(subcommand)]
    Tags(TagCommand),
    /// Delete a comment
    DeleteComment { id: i64 },
    /// Delete a record and its comments
    DeleteRecord { id: i64 },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    /// List tags with reference counts
    List,
    /// Merge two tags into one
    Merge {
        name_a: String,
        name_b: String,
        new_name: String,
    },
    /// Remove a tag from one record
    Detach { uid: String, tag_id: i64 },
    /// Remove a tag from every record and delete it
    Purge { tag_id: i64 },
    /// Delete unreferenced tags
    Gc,
}

/// Print a command result and map it to the process exit code
fn emit<T: Serialize>(result: slidecat::error::Result<T>) -> Result<ExitCode> {
    let outcome = CommandOutcome::from(result);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slidecat=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    tracing::info!("Starting slidecat");

    let config = AppConfig {
        database_path: args.database,
        import_xml: args.import_xml,
        color_json: args.color_json,
    };

    let state = app::setup(config)
        .await
        .context("Failed to initialize application")?;

    match args.command {
        Command::Startup => {
            let (report, enrichment) = app::run_startup(&state)
                .await
                .context("Startup import failed")?;
            if let Some(handle) = enrichment {
                if let Err(e) = handle.await {
                    tracing::error!("Color enrichment task aborted: {}", e);
                }
            }
            emit(Ok(report))
        }
        Command::Import { xml } => emit(commands::import_images(&state, &xml).await),
        Command::Colors { json } => emit(commands::update_colors(&state, &json).await),
        Command::Search {
            user,
            description,
            tags,
            comments,
            color,
        } => {
            let terms: HashMap<String, String> = [
                ("descriptionSearchTerm", description),
                ("tagSearchTerm", tags),
                ("commentsSearchTerm", comments),
                ("colorSearchTerm", color),
            ]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();

            emit(commands::search_records(&state, &user, &terms).await)
        }
        Command::Show { uid, user } => match user {
            Some(user) => emit(commands::view_record(&state, &user, &uid).await),
            None => emit(commands::get_record(&state, &uid).await),
        },
        Command::Tags(tag_command) => match tag_command {
            TagCommand::List => emit(commands::list_tags(&state).await),
            TagCommand::Merge {
                name_a,
                name_b,
                new_name,
            } => emit(commands::merge_tags(&state, &name_a, &name_b, &new_name).await),
            TagCommand::Detach { uid, tag_id } => {
                emit(commands::detach_tag(&state, &uid, tag_id).await)
            }
            TagCommand::Purge { tag_id } => emit(commands::purge_tag(&state, tag_id).await),
            TagCommand::Gc => emit(commands::collect_tag_garbage(&state).await),
        },
        Command::DeleteComment { id } => emit(commands::delete_comment(&state, id).await),
        Command::DeleteRecord { id } => emit(commands::delete_record(&state, id).await),
    }
}
