// zohosync/src/sync/mod.rs
pub(crate) mod cities;
pub(crate) mod commercial_projects;
pub(crate) mod mega_projects;
pub(crate) mod project_attributes;

#[cfg(test)]
pub(crate) mod testing;

use chrono::Local;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::db::ProjectSink;
use crate::errors::{Result, SyncError};
use crate::zoho::{CrmReader, MAX_PAGE_SIZE, TokenProvider};

/// Collaborators shared by every orchestrator of a run.
pub struct SyncContext<'a> {
    pub tokens: &'a dyn TokenProvider,
    pub reader: &'a dyn CrmReader,
    pub sink: &'a dyn ProjectSink,
    pub page_size: u32,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        tokens: &'a dyn TokenProvider,
        reader: &'a dyn CrmReader,
        sink: &'a dyn ProjectSink,
    ) -> Self {
        Self {
            tokens,
            reader,
            sink,
            page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Counters reported by an orchestrator that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub family: SyncFamily,
    pub fetched: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

impl SyncSummary {
    pub fn new(family: SyncFamily) -> Self {
        Self {
            family,
            fetched: 0,
            succeeded: 0,
            skipped: 0,
        }
    }

    /// Counts the outcome of one unit of work.
    pub fn record(&mut self, written: bool) {
        if written {
            self.succeeded += 1;
        } else {
            self.skipped += 1;
        }
    }

    pub fn log(&self) {
        info!(
            "📊 {} sync finished: {} fetched, {} upserted, {} skipped.",
            self.family, self.fetched, self.succeeded, self.skipped
        );
        if self.skipped > 0 {
            warn!("⚠️ {} {} records were skipped for missing required fields.", self.skipped, self.family);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFamily {
    MegaProjects,
    ProjectAttributes,
    CommercialProjects,
    Cities,
}

impl SyncFamily {
    /// Run order. Cities only run when explicitly enabled.
    pub fn sequence(include_cities: bool) -> Vec<SyncFamily> {
        let mut families = vec![
            SyncFamily::MegaProjects,
            SyncFamily::ProjectAttributes,
            SyncFamily::CommercialProjects,
        ];
        if include_cities {
            families.push(SyncFamily::Cities);
        }
        families
    }

    pub async fn run(self, ctx: &SyncContext<'_>) -> Result<SyncSummary> {
        match self {
            SyncFamily::MegaProjects => mega_projects::run_mega_project_sync(ctx).await,
            SyncFamily::ProjectAttributes => project_attributes::run_project_attribute_sync(ctx).await,
            SyncFamily::CommercialProjects => {
                commercial_projects::run_commercial_project_sync(ctx).await
            }
            SyncFamily::Cities => cities::run_city_sync(ctx).await,
        }
    }
}

impl fmt::Display for SyncFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncFamily::MegaProjects => "Mega Project",
            SyncFamily::ProjectAttributes => "Project Attribute",
            SyncFamily::CommercialProjects => "Commercial Project",
            SyncFamily::Cities => "City",
        };
        f.write_str(label)
    }
}

/// Outcome of a full run.
#[derive(Debug)]
pub struct RunReport {
    pub summaries: Vec<SyncSummary>,
    pub failure: Option<(SyncFamily, SyncError)>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> anyhow::Result<()> {
        match self.failure {
            None => Ok(()),
            Some((family, e)) => Err(anyhow::Error::new(e).context(format!("{} sync failed", family))),
        }
    }
}

/// Runs the families in order and stops at the first one that fails.
pub async fn run_all(ctx: &SyncContext<'_>, include_cities: bool) -> RunReport {
    let started_at = Local::now();
    let timer = Instant::now();
    info!("🏁 Starting full synchronization at {}...", started_at.format("%Y-%m-%d %H:%M:%S"));

    let mut report = RunReport {
        summaries: Vec::new(),
        failure: None,
    };

    for family in SyncFamily::sequence(include_cities) {
        info!("--- Starting {} sync ---", family);
        match family.run(ctx).await {
            Ok(summary) => {
                info!("--- {} sync completed ---", family);
                report.summaries.push(summary);
            }
            Err(e) => {
                error!("💥 FATAL: {} sync aborted, remaining families not run: {}", family, e);
                report.failure = Some((family, e));
                break;
            }
        }
    }

    let status = if report.succeeded() { "completed" } else { "finished WITH ERRORS" };
    info!(
        "🚪 Synchronization {} in {:.1}s ({} of {} families done).",
        status,
        timer.elapsed().as_secs_f64(),
        report.summaries.len(),
        SyncFamily::sequence(include_cities).len()
    );
    report
}
