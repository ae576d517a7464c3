use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use aura_application::{ChatService, bootstrap};
use aura_infrastructure::{AuraPaths, ConfigService, JsonStateRepository};

mod clipboard;
mod commands;
mod logging;
mod render;
mod repl;

#[derive(Parser)]
#[command(name = "aura")]
#[command(about = "Aura AI - chat with a hosted generative model from the terminal", long_about = None)]
struct Cli {
    /// Directory holding sessions.json and last-active-session
    #[arg(long, global = true, env = "AURA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat {
        /// Share link to import before the first prompt
        #[arg(long)]
        link: Option<String>,
        /// Directory transcripts are exported to
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Send one message to the current session and print the reply
    Send {
        text: String,
        /// Files to attach
        #[arg(short, long = "attach")]
        attach: Vec<PathBuf>,
    },
    /// List sessions
    Sessions,
    /// Start a new session
    New,
    /// Switch the current session (list position or ID)
    Select { session: String },
    /// Delete a session (list position or ID)
    Delete { session: String },
    /// Delete every session and start fresh
    Clear,
    /// Print the current conversation
    History,
    /// Write the current conversation as a text transcript
    Export {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print a share link for the current conversation
    Share {
        /// Also copy the link to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Import a conversation from a share link
    Import { link: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = AuraPaths::resolve(cli.data_dir.as_deref())
        .context("Failed to resolve aura directories")?;
    let logs_dir = paths.logs_dir();
    if let Err(e) = std::fs::create_dir_all(&logs_dir) {
        render::warn(format!("cannot create {}: {}", logs_dir.display(), e));
    }
    let _log_guard = logging::init(&logs_dir, cli.verbose);

    let command = cli.command.unwrap_or(Commands::Chat {
        link: None,
        export_dir: None,
    });
    let startup_link = match &command {
        Commands::Chat { link, .. } => link.clone(),
        _ => None,
    };
    let needs_model = matches!(command, Commands::Chat { .. } | Commands::Send { .. });

    let service = init_service(&paths, startup_link.as_deref(), needs_model).await?;

    match command {
        Commands::Chat { export_dir, .. } => {
            let export_dir = export_dir.unwrap_or_else(repl::default_export_dir);
            repl::run(service, export_dir).await?
        }
        Commands::Send { text, attach } => commands::send::send(&service, &text, &attach).await?,
        Commands::Sessions => commands::sessions::list(&service).await?,
        Commands::New => commands::sessions::new(&service).await?,
        Commands::Select { session } => commands::sessions::select(&service, &session).await?,
        Commands::Delete { session } => commands::sessions::delete(&service, &session).await?,
        Commands::Clear => commands::sessions::clear(&service).await?,
        Commands::History => commands::sessions::history(&service).await?,
        Commands::Export { dir } => {
            commands::transcript::export(&service, &dir).await?;
        }
        Commands::Share { copy } => commands::share::share(&service, copy).await?,
        Commands::Import { link } => commands::share::import(&service, &link).await?,
    }

    Ok(())
}

/// Loads configuration and sessions, then runs the startup bootstrap.
async fn init_service(
    paths: &AuraPaths,
    startup_link: Option<&str>,
    needs_model: bool,
) -> Result<ChatService> {
    if let Err(e) = paths.ensure_secret_file() {
        tracing::warn!("[Main] Could not create secret template: {}", e);
    }

    let config_service = ConfigService::new(paths.clone());
    let config = config_service
        .load_config()
        .context("Failed to load config.toml")?;

    let repository = Arc::new(JsonStateRepository::new(paths));
    let store = bootstrap::load_store(repository)?;
    let api_key = config_service.resolve_api_key();
    if let (Err(e), true) = (&api_key, needs_model) {
        render::warn(format!("{e}. Replies will fail until a key is configured."));
    }
    let gateway = bootstrap::connect_or_offline(&config, api_key);
    let service = ChatService::from_config(store, gateway, &config);

    let report = bootstrap::start(&service, startup_link).await?;
    if let Some(error) = &report.import_error {
        render::warn(format!("share link ignored: {error}"));
    }
    if let Some(imported) = &report.imported {
        render::info(format!(
            "Imported shared conversation ({} messages). Link: {}",
            imported.session.messages.len(),
            imported.clean_link
        ));
    }

    Ok(service)
}
