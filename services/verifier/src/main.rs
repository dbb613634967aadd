use anyhow::Context as _;
use sea_orm::Database;
use tracing::{info, warn};

use mailotp_core::clock::SystemClock;
use mailotp_core::config::Config;
use mailotp_core::middleware::ApiKeyGate;
use mailotp_core::tracing::init_tracing;
use mailotp_verifier::config::VerifierConfig;
use mailotp_verifier::domain::repository::{Notifier, OtpStore};
use mailotp_verifier::infra::db::DbStore;
use mailotp_verifier::infra::mailgun::MailgunNotifier;
use mailotp_verifier::infra::memory::MemoryStore;
use mailotp_verifier::infra::sweeper::spawn_sweeper;
use mailotp_verifier::router::build_router;
use mailotp_verifier::state::AppState;
use mailotp_verifier_migration::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = VerifierConfig::from_env().context("failed to load configuration")?;
    init_tracing(config.log_format, "info");

    let gate = ApiKeyGate::new(config.api_key.clone());
    if !gate.is_configured() {
        warn!("API_KEY is not set; any non-empty x-api-key header is accepted");
    }

    let notifier = MailgunNotifier::new(config.mailgun(), config.sender_email.clone())?;
    if !notifier.is_configured() {
        warn!("MAILGUN_API_KEY / MAILGUN_DOMAIN not set; send-otp will fail with DELIVERY_FAILED");
    }

    match config.database_url() {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("failed to connect to database")?;
            Migrator::up(&db, None)
                .await
                .context("failed to run migrations")?;
            serve(&config, DbStore { db }, notifier, gate).await
        }
        None => {
            warn!("DATABASE_URL is not set; using in-memory store, data is lost on restart");
            serve(&config, MemoryStore::new(), notifier, gate).await
        }
    }
}

async fn serve<S, N>(
    config: &VerifierConfig,
    store: S,
    notifier: N,
    gate: ApiKeyGate,
) -> anyhow::Result<()>
where
    S: OtpStore,
    N: Notifier + Clone + 'static,
{
    spawn_sweeper(
        store.clone(),
        SystemClock,
        config.sweep_interval(),
        config.otp_retention(),
    );

    let router = build_router(AppState {
        store,
        notifier,
        gate,
    });
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("verifier service listening on {addr}");
    axum::serve(listener, router).await.context("server error")
}
