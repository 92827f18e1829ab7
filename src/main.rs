//! CLI entry point for journal-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use journal_rs::content::ContentStore;
use journal_rs::helpers::format_date;
use journal_rs::Site;

#[derive(Parser)]
#[command(name = "journal-rs")]
#[command(version)]
#[command(about = "Markdown content engine and server for a personal journal site", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the content server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// List journal entries
    List {
        /// Collection to list (published, archived)
        #[arg(default_value = "published")]
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "journal_rs=debug,info"
    } else {
        "journal_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            journal_rs::server::start(&site, &ip, port).await?;
        }

        Commands::List { collection } => {
            let site = Site::new(&base_dir)?;
            let store = ContentStore::new(&site);

            let entries = match collection.as_str() {
                "published" => store.published_entries().await?,
                "archived" => store.archived_entries().await?,
                other => {
                    anyhow::bail!("unknown collection '{}', expected published or archived", other)
                }
            };

            if entries.is_empty() {
                println!("No {} entries.", collection);
                return Ok(());
            }

            for entry in entries {
                let mut markers = Vec::new();
                if entry.metadata.pinned {
                    markers.push("pinned");
                }
                if entry.metadata.deprecated {
                    markers.push("deprecated");
                }
                let markers = if markers.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", markers.join(", "))
                };
                println!(
                    "{:<18} {:<24} {}{}",
                    format_date(&entry.metadata.date),
                    entry.slug,
                    entry.metadata.title,
                    markers
                );
            }
        }
    }

    Ok(())
}
