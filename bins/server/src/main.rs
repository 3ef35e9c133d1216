//! Ledgerline service.
//!
//! Loads configuration, migrates the database, wires the store and outbound
//! adapters, and runs the settlement scheduler until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ledgerline_core::crypto::{CardCipher, IntegrityKey};
use ledgerline_core::ledger::LedgerService;
use ledgerline_core::notify::{NoopNotifier, Notifier};
use ledgerline_core::rates::{FixedRateProvider, RateProvider};
use ledgerline_core::settlement::{SettlementScheduler, SettlementService};
use ledgerline_core::store::LedgerStore;
use ledgerline_db::PgLedgerStore;
use ledgerline_db::migration::Migrator;
use ledgerline_integrations::{CbrRateProvider, EmailNotifier};
use ledgerline_shared::config::LoggingConfig;
use ledgerline_shared::{AppConfig, EmailService};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(logging.json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!logging.json).then(tracing_subscriber::fmt::layer))
        .init();
}

fn rate_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn RateProvider>> {
    if let Some(rate) = config.rates.fixed_rate {
        info!(%rate, "Using fixed benchmark rate");
        return Ok(Arc::new(FixedRateProvider::new(rate)));
    }
    let provider = CbrRateProvider::new(&config.rates).context("Failed to build rate client")?;
    info!(url = %config.rates.provider_url, "Using central bank key rate");
    Ok(Arc::new(provider))
}

fn notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    if config.email.enabled {
        info!(
            smtp_host = %config.email.smtp_host,
            smtp_port = %config.email.smtp_port,
            "Email notifications enabled"
        );
        Arc::new(EmailNotifier::new(EmailService::new(config.email.clone())))
    } else {
        info!("Email notifications disabled");
        Arc::new(NoopNotifier)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let db = ledgerline_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None).await.context("Failed to run migrations")?;
    info!("Connected to database");

    // fail fast on bad card secrets before anything is scheduled
    CardCipher::from_hex(&config.security.encryption_key).context("Invalid encryption key")?;
    IntegrityKey::new(&config.security.integrity_secret).context("Invalid integrity secret")?;

    let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(db));
    let notifier = notifier(&config);

    let rates = rate_provider(&config)?;
    match rates.current_rate().await {
        Ok(rate) => info!(%rate, margin = %config.rates.bank_margin, "Benchmark rate available"),
        Err(e) => warn!(error = %e, "Benchmark rate unavailable at startup"),
    }

    let ledger = LedgerService::new(Arc::clone(&store), Arc::clone(&notifier));
    let settlement = Arc::new(SettlementService::new(
        store,
        ledger,
        notifier,
        config.settlement.penalty_rate,
    ));

    let scheduler = if config.settlement.enabled {
        let period = Duration::from_secs(config.settlement.interval_secs);
        info!(interval_secs = config.settlement.interval_secs, "Settlement scheduler started");
        Some(SettlementScheduler::start(settlement, period))
    } else {
        info!("Settlement scheduler disabled");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
        info!("Settlement scheduler stopped");
    }

    Ok(())
}
