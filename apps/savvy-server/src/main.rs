use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use savvy_db::{redact_credentials_in_dsn, ConnectOpts, DbHandle};
use survey_savvy::{SurveySavvy, SurveySavvyConfig};
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const INGRESS_MODULE: &str = "api_ingress";
const SURVEY_MODULE: &str = "survey_savvy";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Survey Savvy Server - surveys, votes and payments over HTTP
#[derive(Parser)]
#[command(name = "savvy-server")]
#[command(about = "Survey Savvy Server - surveys, votes and payments over HTTP")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    if let Some(path) = cli.config.as_deref() {
        if !path.exists() {
            bail!("Configuration file not found: {}", path.display());
        }
    }

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Survey Savvy Server starting");
    tracing::debug!(server = ?config.server, "Effective server configuration");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
    }
}

fn connect_opts(db_config: Option<&DatabaseConfig>) -> ConnectOpts {
    let Some(db_config) = db_config else {
        return ConnectOpts::default();
    };
    ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    }
}

/// DSN to connect to: in-memory SQLite under `--mock`, else the configured URL
/// with relative SQLite paths resolved against `home_dir`.
fn resolve_dsn(config: &AppConfig, mock: bool) -> Result<String> {
    if mock {
        return Ok("sqlite::memory:".to_string());
    }
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database configuration is required (or run with --mock)"))?;

    let dsn = db_config.url.trim();
    if dsn.is_empty() {
        bail!("Database URL not configured");
    }
    if dsn.starts_with("sqlite://") {
        return absolutize_sqlite_dsn(dsn, Path::new(&config.server.home_dir), true);
    }
    Ok(dsn.to_string())
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let mut ingress_cfg: ApiIngressConfig = config.module_config(INGRESS_MODULE)?;
    // An explicit --port wins over a configured bind address.
    if args.port.is_some() {
        ingress_cfg.bind_addr = None;
    }
    let survey_cfg: SurveySavvyConfig = config.module_config(SURVEY_MODULE)?;

    let dsn = resolve_dsn(&config, args.mock)?;
    tracing::info!("Connecting to database: {}", redact_credentials_in_dsn(&dsn));
    let db = DbHandle::connect(&dsn, connect_opts(config.database.as_ref()))
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected DB backend: {:?}", db.engine());

    SurveySavvy::migrate(db.seaorm()).await?;
    let module = SurveySavvy::init(db.sea(), &survey_cfg)?;

    let ingress = ApiIngress::new(ingress_cfg);
    let router = ingress.build_router(module.register_rest(Router::new()))?;
    let addr = ingress.resolve_bind_addr(&config.server.host, config.server.port)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = wait_for_shutdown().await {
                tracing::error!(error = ?e, "Signal handler failed; shutting down");
            }
            cancel.cancel();
        }
    });

    let served = ApiIngress::serve(router, addr, cancel).await;
    db.close().await;
    tracing::info!("Survey Savvy Server stopped");
    served
}

/// Wait for SIGTERM/SIGINT on unix, Ctrl+C elsewhere.
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
            _ = sigint.recv() => tracing::info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C");
    }

    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let ingress_cfg: ApiIngressConfig = config.module_config(INGRESS_MODULE)?;
    ApiIngress::new(ingress_cfg).resolve_bind_addr(&config.server.host, config.server.port)?;

    let survey_cfg: SurveySavvyConfig = config.module_config(SURVEY_MODULE)?;
    if survey_cfg.auth.token_secret.trim().is_empty() {
        bail!("modules.{SURVEY_MODULE}.auth.token_secret must not be empty");
    }
    if survey_cfg.payments.secret_key.trim().is_empty() {
        tracing::warn!("modules.{SURVEY_MODULE}.payments.secret_key is empty; payment intents will fail");
    }

    if let Some(db_config) = &config.database {
        DbHandle::detect(&db_config.url).with_context(|| {
            format!(
                "Unsupported database URL '{}'",
                redact_credentials_in_dsn(&db_config.url)
            )
        })?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
