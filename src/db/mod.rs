// zohosync/src/db/mod.rs
pub(crate) mod cities;
pub(crate) mod commercial_projects;
pub(crate) mod mega_projects;
pub(crate) mod project_attributes;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors;
use crate::zoho::{
    CityRecord, CommercialProjectRecord, CrmReader, MegaProjectRecord, ParameterAttributeRecord,
};

/// Opens the bounded connection pool shared by every unit of work of a run.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let options = config.connect_options()?;
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to PostgreSQL at {}", config.describe()))?;
    info!(
        "✅ PostgreSQL pool ready ({} max connections) for {}.",
        config.max_connections,
        config.describe()
    );
    Ok(pool)
}

/// Destination of the sync. Each call is one unit of work: everything it
/// writes commits together or not at all.
///
/// `Ok(false)` means the record was skipped for lacking its business key.
#[async_trait]
pub trait ProjectSink: Send + Sync {
    /// Upserts a mega-project after fetching its attributes through `reader`.
    async fn sync_mega_project(
        &self,
        record: &MegaProjectRecord,
        reader: &dyn CrmReader,
        token: &str,
    ) -> errors::Result<bool>;

    /// Upserts a commercial project with its attributes and typologies.
    async fn sync_commercial_project(
        &self,
        record: &CommercialProjectRecord,
        reader: &dyn CrmReader,
        token: &str,
    ) -> errors::Result<bool>;

    async fn sync_project_attribute(&self, record: &ParameterAttributeRecord) -> errors::Result<bool>;

    async fn sync_city(&self, record: &CityRecord) -> errors::Result<bool>;
}

/// `ProjectSink` over PostgreSQL: one transaction per call, rolled back on drop.
pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectSink for PgSink {
    async fn sync_mega_project(
        &self,
        record: &MegaProjectRecord,
        reader: &dyn CrmReader,
        token: &str,
    ) -> errors::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let written = mega_projects::upsert_mega_project(&mut tx, record, reader, token).await?;
        tx.commit().await?;
        debug!("Transaction committed for Mega Project {:?}.", record.id);
        Ok(written)
    }

    async fn sync_commercial_project(
        &self,
        record: &CommercialProjectRecord,
        reader: &dyn CrmReader,
        token: &str,
    ) -> errors::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let written =
            commercial_projects::sync_commercial_project(&mut tx, record, reader, token).await?;
        tx.commit().await?;
        debug!("Transaction committed for Commercial Project {:?}.", record.id);
        Ok(written)
    }

    async fn sync_project_attribute(&self, record: &ParameterAttributeRecord) -> errors::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let written = project_attributes::upsert_project_attribute(&mut tx, record).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn sync_city(&self, record: &CityRecord) -> errors::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let written = cities::upsert_city(&mut tx, record).await?;
        tx.commit().await?;
        Ok(written)
    }
}
