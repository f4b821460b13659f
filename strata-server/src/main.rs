use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser};
use strata_core::{ImageCatalog, database::InMemoryImageRepository};
use strata_server::{
    AppState, create_app,
    infra::config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "strata-server")]
#[command(about = "Image metadata registry with filtered, paginated listings")]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a strata.toml configuration file
    #[arg(short, long, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_server(cli.serve).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: args.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(config)
}

async fn build_catalog(config: &Config) -> anyhow::Result<ImageCatalog> {
    let limits = config.listing.page_limits();

    match config.database.url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let repository =
                strata_core::database::PostgresImageRepository::connect(
                    url,
                    config.database.max_connections,
                )
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(ImageCatalog::new(Arc::new(repository), limits))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => anyhow::bail!(
            "database.url is set but strata-server was built without the postgres feature"
        ),
        None => {
            info!("using in-memory image store");
            Ok(ImageCatalog::new(
                Arc::new(InMemoryImageRepository::new()),
                limits,
            ))
        }
    }
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(&args)?;
    let catalog = build_catalog(&config).await?;

    let addr = config
        .server
        .socket_addr()
        .context("invalid server host/port")?;
    info!(
        default_limit = config.listing.default_limit,
        max_limit = config.listing.max_limit,
        "Starting Strata registry on {}",
        addr
    );

    let router = create_app(AppState::new(catalog));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Strata registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
