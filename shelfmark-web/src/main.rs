//! shelfmark-web - Catalogue web service
//!
//! JSON API over the shared book catalogue: works, copies, authors, tags,
//! locations and users, with duplicate detection on the author/tag create
//! flows and subtree aggregates for the location/tag views.

use anyhow::Result;
use clap::Parser;
use shelfmark_common::config;
use shelfmark_common::db::init::init_database;
use shelfmark_web::{build_router, AppState};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "shelfmark-web", about = "Shelfmark catalogue web service")]
struct Args {
    /// Root data folder (overrides SHELFMARK_ROOT and the config file)
    #[arg(long)]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Shelfmark web service (shelfmark-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref())?;
    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let (host, port) = config::load_listen_addr(&pool).await?;

    // Create application state and router
    let state = AppState::new(pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("shelfmark-web listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
