//! Cha Ching gateway
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌────────────┐    ┌──────────┐
//! │  Client  │───▶│  Gateway  │───▶│ Validator  │───▶│ Provider │
//! │  (JWT)   │    │  (axum)   │    │ (Directory)│    │ withdraw │
//! └──────────┘    └───────────┘    └────────────┘    └────┬─────┘
//!                                                         │
//!                                  ┌────────────┐         │
//!                                  │   Ledger   │◀────────┘
//!                                  │ (Postgres) │
//!                                  └────────────┘
//! ```
//!
//! Usage: `chaching [--env dev|prod] [--port N]`

use std::sync::Arc;

use anyhow::Context;
use chaching::account::{AccountDirectory, InMemoryAccountDirectory, PgAccountDirectory};
use chaching::config::AppConfig;
use chaching::db::Database;
use chaching::gateway::{self, state::AppState};
use chaching::provider::ProviderRegistry;
use chaching::transfer::{
    InMemoryLedger, LedgerRecorder, PgLedger, ReconciliationJournal, TransferCoordinator,
};
use chaching::user_auth::TokenVerifier;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config =
        AppConfig::load(&env).with_context(|| format!("loading config for env '{}'", env))?;
    let _log_guard = chaching::logging::init_logging(&app_config);

    tracing::info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        "Starting chaching gateway"
    );

    // Stores: PostgreSQL when configured, in-memory otherwise
    let (directory, ledger, pg_db): (
        Arc<dyn AccountDirectory>,
        Arc<dyn LedgerRecorder>,
        Option<Arc<Database>>,
    ) = match &app_config.postgres_url {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("connecting to PostgreSQL")?;
            db.ensure_schema().await.context("applying schema")?;
            tracing::info!("Connected to PostgreSQL");
            let pool = db.pool().clone();
            (
                Arc::new(PgAccountDirectory::new(pool.clone())),
                Arc::new(PgLedger::new(pool)),
                Some(Arc::new(db)),
            )
        }
        None => {
            tracing::warn!(
                "postgres_url not set; using empty in-memory stores. No users exist, so every \
                 transfer is rejected with NOT_FOUND, and nothing survives a restart"
            );
            (
                Arc::new(InMemoryAccountDirectory::new()),
                Arc::new(InMemoryLedger::new()),
                None,
            )
        }
    };

    let provider_timeout = app_config.transfer.provider_timeout();
    let registry = ProviderRegistry::from_config(&app_config.providers, provider_timeout)
        .context("building provider clients")?;
    tracing::info!(providers = ?registry.labels(), "Provider adapters registered");

    let journal = ReconciliationJournal::new(&app_config.transfer.journal_path);
    tracing::info!(path = %journal.path().display(), "Reconciliation journal");

    let coordinator = Arc::new(TransferCoordinator::new(
        directory,
        Arc::new(registry),
        ledger,
        Arc::new(journal),
        provider_timeout,
    ));

    let token_verifier =
        Arc::new(TokenVerifier::new(app_config.jwt_secret.clone()).context("jwt_secret")?);

    let state = Arc::new(AppState::new(coordinator, token_verifier, pg_db));

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    gateway::run_server(&app_config.gateway.host, port, state)
        .await
        .context("gateway server")?;

    tracing::info!("Gateway stopped");
    Ok(())
}
