//! CLI entry point for spacetraveling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog front-end over a headless CMS", long_about = None)]
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
    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Clean the public folder
    Clean,

    /// List posts
    List {
        /// Follow every page instead of showing the first one
        #[arg(short, long)]
        all: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
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
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };

    match cli.command {
        Commands::Generate => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            tracing::info!("Generating static files...");
            app.generate().await?;
            println!("Generated successfully!");
        }

        Commands::Server { port, ip } => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            spacetraveling::server::start(&app, &ip, port).await?;
        }

        Commands::Clean => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            app.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { all } => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            spacetraveling::commands::list::run(&app, all).await?;
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
