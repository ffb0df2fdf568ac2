// zohosync/src/sync/cities.rs
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use super::{SyncContext, SyncFamily, SyncSummary};
use crate::errors::Result;
use crate::zoho::{CityRecord, MAX_PAGE_SIZE};

/// Syncs the cities referenced by commercial projects. Single page.
pub async fn run_city_sync(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    sync_cities(ctx)
        .await
        .inspect_err(|e| error!("❌ City sync failed: {}", e))
}

async fn sync_cities(ctx: &SyncContext<'_>) -> Result<SyncSummary> {
    let token = ctx.tokens.get_access_token().await?;
    let mut summary = SyncSummary::new(SyncFamily::Cities);

    info!("📥 Fetching cities of Commercial Projects...");
    let page = ctx.reader.fetch_cities(&token, 0, MAX_PAGE_SIZE).await?;
    if page.has_more {
        warn!("⚠️ More than {} city references; only the first page is synced.", MAX_PAGE_SIZE);
    }

    let raw_count = page.records.len();
    let cities = dedupe_by_id(page.records);
    debug!("ℹ️ {} city references, {} unique.", raw_count, cities.len());
    summary.fetched = cities.len();

    for city in &cities {
        let written = ctx.sink.sync_city(city).await?;
        summary.record(written);
    }

    summary.log();
    Ok(summary)
}

/// Keeps first-seen order; a later record with the same id replaces the earlier one.
fn dedupe_by_id(records: Vec<CityRecord>) -> Vec<CityRecord> {
    let mut unique: Vec<CityRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        match record.key().map(str::to_string) {
            Some(id) => match positions.get(&id) {
                Some(&at) => unique[at] = record,
                None => {
                    positions.insert(id, unique.len());
                    unique.push(record);
                }
            },
            None => unique.push(record),
        }
    }
    unique
}
