use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    skillery_catalog::{CatalogStore, connect, run_migrations},
    skillery_config::{SkilleryConfig, apply_env_overrides, database_path, discover_and_load},
    skillery_enrich::{OpenAiGenerator, run_backfill},
    skillery_gateway::{AppState, submit_repository},
    skillery_github::GithubClient,
};

#[derive(Parser)]
#[command(name = "skillery", about = "Skillery — skills catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Catalog database path (overrides config value).
    #[arg(long, global = true, env = "SKILLERY_DB")]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the catalog server (default when no subcommand is provided).
    Serve,
    /// Ingest a repository and sync its skills into the catalog.
    Submit {
        /// `owner/repo` or a github.com URL.
        repo: String,
        /// GitHub token for this submission only.
        #[arg(long)]
        token: Option<String>,
    },
    /// Generate missing categories and tags for catalog skills.
    Backfill,
    /// Create the database file and apply the schema.
    InitDb,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> SkilleryConfig {
    let mut config = discover_and_load();
    apply_env_overrides(&mut config);
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = &cli.database {
        config.database.path = Some(db.clone());
    }
    config
}

async fn build_state(config: &SkilleryConfig) -> anyhow::Result<AppState> {
    let db_path = database_path(config);
    let pool = connect(&db_path).await?;
    run_migrations(&pool).await?;
    info!(path = %db_path.display(), "catalog database ready");

    let github = GithubClient::new(config.github.token.clone())?;
    let generator = OpenAiGenerator::new(
        config.openai.api_key.clone(),
        Some(config.openai.model.clone()),
    )
    .with_base_url(config.openai.base_url.clone());

    Ok(AppState::new(
        CatalogStore::new(pool),
        github,
        Arc::new(generator),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "skillery starting");
    let config = load_config(&cli);

    match cli.command {
        None | Some(Commands::Serve) => {
            let state = build_state(&config).await?;
            skillery_gateway::run(state, &config.server.bind, config.server.port).await
        },
        Some(Commands::Submit { repo, token }) => {
            let state = build_state(&config).await?;
            let outcome = submit_repository(&state, &repo, token).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        },
        Some(Commands::Backfill) => {
            let state = build_state(&config).await?;
            let report = run_backfill(&state.store, state.generator.as_ref()).await?;
            println!(
                "backfilled {} of {} skills ({} failed)",
                report.stats.success, report.stats.total, report.stats.error
            );
            Ok(())
        },
        Some(Commands::InitDb) => {
            let db_path = database_path(&config);
            let pool = connect(&db_path).await?;
            run_migrations(&pool).await?;
            println!("database ready at {}", db_path.display());
            Ok(())
        },
    }
}
