//! Zoho CRM to PostgreSQL project synchronization
//!
//! Copies mega-projects, commercial projects with their typologies, project
//! attributes and (optionally) cities from the CRM into the portal database.

// zohosync/src/main.rs
mod config;
mod db;
mod errors;
mod sync;
mod utils;
mod zoho;

use anyhow::{Context, Result};
use config::AppConfig;
use db::PgSink;
use std::env;
use std::process::ExitCode;
use sync::SyncContext;
use tracing::{info, warn};
use zoho::{ZohoClient, ZohoTokenProvider};

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let app_config = AppConfig::from_env().context("Failed to load configuration from the environment")?;
    utils::logging::init_logging(&app_config.log_level, &app_config.log_file)
        .context("Failed to initialize logging")?;

    for key in app_config.missing_keys() {
        warn!("⚠️ {} is not set; the calls that need it will fail.", key);
    }

    let choice = env::args().nth(1).map(|arg| arg.trim().to_string()).unwrap_or_else(|| "sync".to_string());

    match choice.as_str() {
        "sync" => {
            println!("⚙️ Starting Zoho CRM sync...");
            run_sync(&app_config).await.context("Sync process failed")?;
        }
        "check" => {
            println!("🔍 Checking database and CRM connectivity...");
            if !utils::setting::check_connections(&app_config).await {
                anyhow::bail!("One or more connectivity checks failed");
            }
        }
        _ => {
            println!("❌ Invalid choice '{}'. Use 'sync' (default) or 'check'.", choice);
            anyhow::bail!("Invalid operation choice");
        }
    }
    Ok(())
}

async fn run_sync(app_config: &AppConfig) -> Result<()> {
    let pool = db::create_pool(&app_config.database).await?;

    let http_client = reqwest::Client::new();
    let tokens = ZohoTokenProvider::new(http_client.clone(), &app_config.zoho);
    let reader = ZohoClient::new(http_client, &app_config.zoho.api_base_url);
    let sink = PgSink::new(pool.clone());
    let ctx = SyncContext::new(&tokens, &reader, &sink);

    let report = sync::run_all(&ctx, app_config.sync_cities).await;

    pool.close().await;
    info!("🔌 Database pool closed.");

    for summary in &report.summaries {
        println!(
            "  {}: {} fetched, {} upserted, {} skipped",
            summary.family, summary.fetched, summary.succeeded, summary.skipped
        );
    }
    report.into_result()
}
