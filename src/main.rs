//! # social-registration
//!
//! Loads configuration, prepares the database and serves the account routes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use social_registration::{
    Result,
    app::AppContext,
    config::ConfigManager,
    database,
    error::Context,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    web,
};

#[derive(Debug, Parser)]
#[command(name = "social-registration", version, about = "Social sign-in and registration service")]
struct Args {
    /// Configuration file, overriding SOCIAL_REGISTRATION_CONFIG and RUST_ENV
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset, e.g. `debug`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_level.as_deref());

    if let Err(e) = run(args).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("service failed: {e:?}")
        );
        return Err(e);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "service stopped cleanly"
    );
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let manager = ConfigManager::new(args.config)?;
    linfo!(
        "system",
        LogStage::Configuration,
        LogComponent::Config,
        "config_loaded",
        &format!("configuration loaded from {}", manager.source().display())
    );
    let config = manager.into_config();

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db)
        .await
        .context("database migration failed")?;
    let pending = database::check_database_status(&db)
        .await
        .context("database status check failed")?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "run_migrations",
        "database ready",
        pending_migrations = pending
    );

    let context = AppContext::build(config, db)?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        &format!("providers enabled: {:?}", context.providers.enabled())
    );

    web::serve(Arc::new(context)).await
}
