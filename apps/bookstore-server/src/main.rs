use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::{ModuleCtx, ModuleCtxBuilder, ModuleRegistry, RunOptions, ShutdownOptions};
use modkit_db::{ConnectOpts, DbHandle};
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod seed;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Bookstore Server - book catalog with reviews and user accounts
#[derive(Parser)]
#[command(name = "bookstore-server")]
#[command(about = "Bookstore Server - book catalog with reviews and user accounts")]
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

    /// Use an in-memory database seeded with demo books
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
    /// Create a user with staff and superuser rights
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        password: String,
    },
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

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    wire_ingress(&mut config, args.port.is_some());

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Bookstore Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
        Commands::CreateSuperuser {
            username,
            email,
            password,
        } => create_superuser(config, args, &username, &email, &password).await,
    }
}

/// Every module of the application, in registration order.
fn build_registry() -> Result<ModuleRegistry> {
    let mut b = ModuleRegistry::builder();
    api_ingress::register(&mut b);
    accounts::register(&mut b);
    books::register(&mut b);
    pages::register(&mut b);
    Ok(b.build_topo_sorted()?)
}

/// The HTTP host listens on `server.host:server.port` unless its own section
/// names a `bind_addr`; `--port` always wins.
fn wire_ingress(config: &mut AppConfig, port_overridden: bool) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let timeout = config.server.timeout_sec;
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    let Some(obj) = section.as_object_mut() else {
        tracing::warn!("modules.api_ingress is not a mapping; leaving it untouched");
        return;
    };
    if port_overridden || !obj.contains_key("bind_addr") {
        obj.insert("bind_addr".into(), serde_json::Value::String(addr));
    }
    if timeout > 0 && !obj.contains_key("request_timeout_secs") {
        obj.insert("request_timeout_secs".into(), timeout.into());
    }
}

/// Expand a relative sqlite DSN against the home directory.
/// In-memory DSNs are returned unchanged.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if modkit_db::is_memory_dsn(dsn) {
        return Ok(dsn.to_string());
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

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

fn database_config(config: &AppConfig) -> Result<&DatabaseConfig> {
    config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database is not configured"))
}

async fn connect_db(config: &AppConfig, mock: bool) -> Result<Arc<DbHandle>> {
    let db_config = database_config(config)?;
    let dsn = if mock {
        MEMORY_DSN.to_string()
    } else {
        let raw = db_config.url.trim();
        if raw.is_empty() {
            return Err(anyhow!("Database URL not configured"));
        }
        match DbHandle::detect(raw)? {
            modkit_db::DbEngine::Sqlite => {
                absolutize_sqlite_dsn(raw, Path::new(&config.server.home_dir))?
            }
            modkit_db::DbEngine::Postgres => raw.to_string(),
        }
    };

    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms))),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!(
        dsn = %modkit_db::redact_credentials_in_dsn(Some(&dsn)),
        "Connecting to database"
    );
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(backend = ?db.engine(), "Connected to database");
    Ok(Arc::new(db))
}

/// Init and migrate all modules outside the server lifecycle.
async fn bootstrap_once(config: &AppConfig, db: Arc<DbHandle>) -> Result<ModuleCtx> {
    let registry = build_registry()?;
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(config.clone()))
        .with_db(db)
        .build();
    modkit::bootstrap(&registry, &ctx).await?;
    Ok(ctx)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let db = connect_db(&config, args.mock).await?;

    if args.mock {
        let ctx = bootstrap_once(&config, db.clone()).await?;
        seed::seed_demo_books(ctx.client_hub().get::<dyn books::BooksApi>()?).await?;
    }

    modkit::run(RunOptions {
        registry: build_registry()?,
        modules_cfg: Arc::new(config),
        db: modkit::DbOptions::Existing(db),
        shutdown: ShutdownOptions::Signals,
    })
    .await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(db) = &config.database {
        DbHandle::detect(db.url.trim())?;
    }
    build_registry()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn create_superuser(
    config: AppConfig,
    args: CliArgs,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let db = connect_db(&config, args.mock).await?;
    let ctx = bootstrap_once(&config, db).await?;
    let api = ctx.client_hub().get::<dyn accounts::AccountsApi>()?;

    let user = api
        .create_superuser(accounts::NewUser::new(username, email, password))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "Superuser created");
    println!("Superuser created successfully.");
    Ok(())
}
