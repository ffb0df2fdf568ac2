// zohosync/src/sync/project_attributes.rs
use tracing::{error, info, warn};

use super::{SyncContext, SyncFamily, SyncSummary};
use crate::errors::Result;
use crate::zoho::MAX_PAGE_SIZE;

/// Syncs the attribute-typed rows of `Parametros`.
///
/// Reads a single page of up to `MAX_PAGE_SIZE` records; anything past it is
/// not synced and only reported.
pub async fn run_project_attribute_sync(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    sync_project_attributes(ctx)
        .await
        .inspect_err(|e| error!("❌ Project Attribute sync failed: {}", e))
}

async fn sync_project_attributes(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    let token = ctx.tokens.get_access_token().await?;
    let mut summary = SyncSummary::new(SyncFamily::ProjectAttributes);

    info!("📥 Fetching 'Atributo' records from Parametros...");
    let page = ctx
        .reader
        .fetch_parameter_attributes(&token, 0, MAX_PAGE_SIZE)
        .await?;
    if page.records.is_empty() {
        info!("ℹ️ No attributes found in Parametros.");
        summary.log();
        return Ok(summary);
    }
    if page.has_more {
        warn!(
            "⚠️ Parametros holds more than {} attributes ({} returned); only the first page is synced.",
            MAX_PAGE_SIZE, page.count
        );
    }
    summary.fetched = page.records.len();

    for record in &page.records {
        let written = ctx.sink.sync_project_attribute(record).await?;
        summary.record(written);
    }

    summary.log();
    Ok(summary)
}
