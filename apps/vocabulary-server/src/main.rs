mod http_stack;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sea_orm::{ConnectOptions, Database};
use vocab_bootstrap::{AppConfig, CliArgs, init_logging, wait_for_shutdown};
use vocabulary::{VocabularyConfig, VocabularyModule};

/// Vocabulary Server - personal word collections with search and export
#[derive(Parser)]
#[command(name = "vocabulary-server")]
#[command(about = "Vocabulary Server - personal word collections with search and export")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref()
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // defaults -> YAML -> legacy env (prod) -> APP__* env -> CLI
    let mut config = AppConfig::load_layered(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliArgs {
        port: cli.port,
        verbose: cli.verbose,
    })?;

    init_logging(&config.logging);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_redacted_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config
        .module_config::<VocabularyConfig>("vocabulary")?
        .validate()?;
    config.database.connection_string()?;
    println!("Configuration is valid");
    println!("{}", config.to_redacted_yaml()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Vocabulary Server starting");

    let module_config: VocabularyConfig = config.module_config("vocabulary")?;

    let mut options = ConnectOptions::new(config.database.connection_string()?);
    options
        .max_connections(config.database.max_connections)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to the database")?;

    VocabularyModule::migrate(&db).await?;
    let module = VocabularyModule::init(&module_config, db).await?;

    let router = http_stack::apply(
        module.router(),
        &config.server.cors_allowed_origins,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = config.bind_socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = wait_for_shutdown().await {
                tracing::error!(error = %e, "Shutdown signal handling failed");
            }
        })
        .await
        .context("HTTP server failed")?;

    tracing::info!("Vocabulary Server stopped");
    Ok(())
}
