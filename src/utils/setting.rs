// Environment checks run by the `check` command
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{ConnectOptions, Connection};
use tracing::{error, info};

use crate::config::{AppConfig, DatabaseConfig};
use crate::zoho::{CrmReader, TokenProvider, ZohoClient, ZohoTokenProvider};

pub async fn check_db_connection(config: &DatabaseConfig) -> bool {
    match query_server_time(config).await {
        Ok(now) => {
            println!("✅ Successfully connected to {} (server time {})", config.describe(), now);
            info!("✅ Database reachable at {}.", config.describe());
            true
        }
        Err(e) => {
            eprintln!("❌ Failed to connect to {}: {:#}", config.describe(), e);
            error!("❌ Database check failed for {}: {:#}", config.describe(), e);
            false
        }
    }
}

async fn query_server_time(config: &DatabaseConfig) -> Result<DateTime<Utc>> {
    let mut conn = config.connect_options()?.connect().await.context("Connection refused")?;
    let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
        .fetch_one(&mut conn)
        .await
        .context("SELECT NOW() failed")?;
    conn.close().await.ok();
    Ok(now)
}

/// Verifies the token exchange and a one-record COQL read.
pub async fn check_crm_connection(http_client: reqwest::Client, config: &AppConfig) -> bool {
    let tokens = ZohoTokenProvider::new(http_client.clone(), &config.zoho);
    let token = match tokens.get_access_token().await {
        Ok(token) => {
            println!("✅ Obtained a CRM access token from {}", config.zoho.token_url);
            token
        }
        Err(e) => {
            eprintln!("❌ Failed to obtain a CRM access token: {}", e);
            return false;
        }
    };

    let reader = ZohoClient::new(http_client, &config.zoho.api_base_url);
    match reader.fetch_mega_projects(&token, 0, 1).await {
        Ok(page) => {
            println!(
                "✅ COQL query succeeded against {} ({} record(s) returned)",
                config.zoho.api_base_url,
                page.records.len()
            );
            true
        }
        Err(e) => {
            eprintln!("❌ COQL query failed against {}: {}", config.zoho.api_base_url, e);
            false
        }
    }
}

/// Runs every check, even after one fails.
pub async fn check_connections(config: &AppConfig) -> bool {
    let db_ok = check_db_connection(&config.database).await;
    let crm_ok = check_crm_connection(reqwest::Client::new(), config).await;
    db_ok && crm_ok
}
