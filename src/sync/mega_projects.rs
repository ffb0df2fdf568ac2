// zohosync/src/sync/mega_projects.rs
use tracing::{debug, error};

use super::{SyncContext, SyncFamily, SyncSummary};
use crate::errors::Result;

/// Pages through every mega-project, upserting each one with its attributes.
pub async fn run_mega_project_sync(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    sync_mega_projects(ctx)
        .await
        .inspect_err(|e| error!("❌ Mega Project sync failed: {}", e))
}

async fn sync_mega_projects(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    let token = ctx.tokens.get_access_token().await?;
    let mut summary = SyncSummary::new(SyncFamily::MegaProjects);
    let mut offset = 0u32;

    loop {
        debug!("📥 Requesting Mega Project page at offset {}.", offset);
        let page = ctx.reader.fetch_mega_projects(&token, offset, ctx.page_size).await?;
        if page.records.is_empty() {
            debug!("ℹ️ Empty Mega Project page at offset {}.", offset);
            break;
        }
        summary.fetched += page.records.len();

        for record in &page.records {
            let written = ctx.sink.sync_mega_project(record, ctx.reader, &token).await?;
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
