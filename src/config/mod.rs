// zohosync/src/config/mod.rs
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.zoho.com/oauth/v2/token";
pub const DEFAULT_API_BASE_URL: &str = "https://www.zohoapis.com/crm/v2";
const DEFAULT_PG_PORT: u16 = 5432;
const DEFAULT_PG_SSL_MODE: &str = "prefer";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_LOG_FILE: &str = "sync.log";

// No Debug derive: these carry credentials.
#[derive(Clone)]
pub struct ZohoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_url: String,
    pub api_base_url: String,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; when set it takes precedence over the PG_* parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AppConfig {
    pub zoho: ZohoConfig,
    pub database: DatabaseConfig,
    pub log_level: String,
    pub log_file: PathBuf,
    pub sync_cities: bool,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Missing credentials are left empty so the call that needs them fails
    /// downstream; malformed numbers and flags are rejected here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).unwrap_or_default();

        let zoho = ZohoConfig {
            client_id: required("ZOHO_CLIENT_ID"),
            client_secret: required("ZOHO_CLIENT_SECRET"),
            refresh_token: required("ZOHO_REFRESH_TOKEN"),
            token_url: get("ZOHO_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: get("ZOHO_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        let port = match get("PG_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PG_PORT must be a valid port number, got '{}'", raw))?,
            None => DEFAULT_PG_PORT,
        };

        let max_connections = match get("PG_MAX_CONNECTIONS") {
            Some(raw) => {
                let value = raw.parse::<u32>().with_context(|| {
                    format!("PG_MAX_CONNECTIONS must be a positive integer, got '{}'", raw)
                })?;
                if value == 0 {
                    anyhow::bail!("PG_MAX_CONNECTIONS must be at least 1");
                }
                value
            }
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let database = DatabaseConfig {
            url: get("DATABASE_URL"),
            host: required("PG_HOST"),
            port,
            database: required("PG_DATABASE"),
            user: required("PG_USER"),
            password: required("PG_PASSWORD"),
            ssl_mode: get("PG_SSL_MODE").unwrap_or_else(|| DEFAULT_PG_SSL_MODE.to_string()),
            max_connections,
        };

        let sync_cities = match get("SYNC_CITIES") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("SYNC_CITIES must be true or false, got '{}'", raw))?,
            None => false,
        };

        Ok(AppConfig {
            zoho,
            database,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_file: get("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            sync_cities,
        })
    }

    /// Names of the settings that were not supplied and will make a downstream call fail.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let checks = [
            ("ZOHO_CLIENT_ID", &self.zoho.client_id),
            ("ZOHO_CLIENT_SECRET", &self.zoho.client_secret),
            ("ZOHO_REFRESH_TOKEN", &self.zoho.refresh_token),
        ];
        for (key, value) in checks {
            if value.is_empty() {
                missing.push(key);
            }
        }
        if self.database.url.is_none() {
            let db_checks = [
                ("PG_HOST", &self.database.host),
                ("PG_DATABASE", &self.database.database),
                ("PG_USER", &self.database.user),
            ];
            for (key, value) in db_checks {
                if value.is_empty() {
                    missing.push(key);
                }
            }
        }
        missing
    }
}

impl DatabaseConfig {
    /// Connection options for the pool, honouring `DATABASE_URL` when present.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .map_err(|e| anyhow::anyhow!("Invalid PG_SSL_MODE '{}': {}", self.ssl_mode, e))?;

        if let Some(url) = &self.url {
            let options = PgConnectOptions::from_str(url)
                .context("DATABASE_URL is not a valid PostgreSQL connection URL")?;
            return Ok(options);
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .ssl_mode(ssl_mode);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        Ok(options)
    }

    /// Human readable target without credentials, for log lines.
    pub fn describe(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!("unrecognised boolean value")),
    }
}
