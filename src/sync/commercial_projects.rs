// zohosync/src/sync/commercial_projects.rs
use tracing::{debug, error, warn};

use super::{SyncContext, SyncFamily, SyncSummary};
use crate::errors::Result;

/// Pages through every commercial project. Each project and its typologies
/// form one unit of work in the sink.
pub async fn run_commercial_project_sync(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    sync_commercial_projects(ctx)
        .await
        .inspect_err(|e| error!("❌ Commercial Project sync failed: {}", e))
}

async fn sync_commercial_projects(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    let token = ctx.tokens.get_access_token().await?;
    let mut summary = SyncSummary::new(SyncFamily::CommercialProjects);
    let mut offset = 0u32;

    loop {
        debug!("📥 Requesting Commercial Project page at offset {}.", offset);
        let page = ctx
            .reader
            .fetch_commercial_projects(&token, offset, ctx.page_size)
            .await?;
        if page.records.is_empty() {
            break;
        }
        summary.fetched += page.records.len();

        for record in &page.records {
            // No unit of work is opened for a record without its key.
            if record.key().is_none() {
                warn!("⚠️ Commercial Project without id (hc), skipping: {:?}", record.name);
                summary.record(false);
                continue;
            }
            let written = ctx.sink.sync_commercial_project(record, ctx.reader, &token).await?;
            summary.record(written);
        }

        if !page.has_more {
            break;
        }
        offset += ctx.page_size;
    }

    summary.log();
    Ok(summary)
}
