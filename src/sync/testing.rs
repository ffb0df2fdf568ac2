// zohosync/src/sync/testing.rs
//! In-memory fakes for the CRM, the token endpoint and the database.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::db::ProjectSink;
use crate::db::cities::CityRow;
use crate::db::commercial_projects::{CommercialProjectRow, TypologyRow};
use crate::db::mega_projects::MegaProjectRow;
use crate::db::project_attributes::ProjectAttributeRow;
use crate::errors::{Result, SyncError};
use crate::zoho::{
    CityRecord, CommercialProjectRecord, CrmReader, MegaProjectRecord, Page,
    ParameterAttributeRecord, TokenProvider, TypologyRecord,
};

pub fn mega(id: &str) -> MegaProjectRecord {
    MegaProjectRecord {
        id: Some(id.to_string()),
        name: Some(format!("Mega {}", id)),
        latitude: Some(json!("6.2")),
        ..MegaProjectRecord::default()
    }
}

pub fn commercial(id: &str) -> CommercialProjectRecord {
    CommercialProjectRecord {
        id: Some(id.to_string()),
        name: Some(format!("Proyecto {}", id)),
        rooms: Some(json!(["2", "3"])),
        ..CommercialProjectRecord::default()
    }
}

pub fn typology(id: &str) -> TypologyRecord {
    TypologyRecord {
        id: Some(id.to_string()),
        name: Some(format!("Tipo {}", id)),
        price_from: Some(json!("250000000")),
        ..TypologyRecord::default()
    }
}

pub fn attribute(id: &str, name: &str) -> ParameterAttributeRecord {
    ParameterAttributeRecord {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
    }
}

pub fn city(id: &str, name: &str) -> CityRecord {
    CityRecord {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
    }
}

#[derive(Default)]
pub struct MockTokens {
    pub fail: bool,
    calls: AtomicUsize,
}

impl MockTokens {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn invalid() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for MockTokens {
    async fn get_access_token(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SyncError::Auth("invalid_client".to_string()));
        }
        Ok("test-token".to_string())
    }
}

/// Serves stored records by offset/limit and remembers every bulk call.
#[derive(Default)]
pub struct MockReader {
    pub mega_projects: Vec<MegaProjectRecord>,
    pub commercial_projects: Vec<CommercialProjectRecord>,
    pub parameter_attributes: Vec<ParameterAttributeRecord>,
    pub cities: Vec<CityRecord>,
    /// Typologies per commercial project id.
    pub typologies: Vec<(String, Vec<TypologyRecord>)>,
    pub fail_parameter_attributes: bool,
    /// Bulk fetches at this offset fail.
    pub fail_at_offset: Option<u32>,
    /// Child lookups for this parent id fail.
    pub fail_children_for: Option<String>,
    pub calls: Mutex<Vec<(&'static str, u32, u32)>>,
}

impl MockReader {
    /// Offsets requested for one family, in call order.
    pub fn offsets(&self, family: &str) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _, _)| *name == family)
            .map(|(_, offset, _)| *offset)
            .collect()
    }

    pub fn limits(&self, family: &str) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _, _)| *name == family)
            .map(|(_, _, limit)| *limit)
            .collect()
    }

    pub fn mega_project_calls(&self) -> usize {
        self.offsets("mega_projects").len()
    }

    pub fn commercial_project_calls(&self) -> usize {
        self.offsets("commercial_projects").len()
    }

    pub fn city_calls(&self) -> usize {
        self.offsets("cities").len()
    }

    fn page<T: Clone>(&self, family: &'static str, items: &[T], offset: u32, limit: u32) -> Result<Page<T>> {
        self.calls.lock().unwrap().push((family, offset, limit));
        if self.fail_at_offset == Some(offset) {
            return Err(SyncError::Fetch(format!("{} page at offset {} failed", family, offset)));
        }
        let start = (offset as usize).min(items.len());
        let end = (start + limit as usize).min(items.len());
        Ok(Page {
            records: items[start..end].to_vec(),
            has_more: end < items.len(),
            count: (end - start) as u64,
        })
    }

    fn check_parent(&self, parent_id: &str) -> Result<()> {
        if self.fail_children_for.as_deref() == Some(parent_id) {
            return Err(SyncError::Fetch(format!("search for parent {} failed", parent_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CrmReader for MockReader {
    async fn fetch_mega_projects(&self, _token: &str, offset: u32, limit: u32) -> Result<Page<MegaProjectRecord>> {
        self.page("mega_projects", &self.mega_projects, offset, limit)
    }

    async fn fetch_commercial_projects(
        &self,
        _token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<CommercialProjectRecord>> {
        self.page("commercial_projects", &self.commercial_projects, offset, limit)
    }

    async fn fetch_parameter_attributes(
        &self,
        _token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<ParameterAttributeRecord>> {
        if self.fail_parameter_attributes {
            return Err(SyncError::Fetch("HTTP 500 from coql".to_string()));
        }
        self.page("parameter_attributes", &self.parameter_attributes, offset, limit)
    }

    async fn fetch_cities(&self, _token: &str, offset: u32, limit: u32) -> Result<Page<CityRecord>> {
        self.page("cities", &self.cities, offset, limit)
    }

    async fn fetch_mega_project_attributes(&self, _token: &str, parent_id: &str) -> Result<Vec<Value>> {
        self.check_parent(parent_id)?;
        Ok(vec![json!({"id": format!("attr-{}", parent_id)})])
    }

    async fn fetch_commercial_project_attributes(&self, _token: &str, parent_id: &str) -> Result<Vec<Value>> {
        self.check_parent(parent_id)?;
        Ok(Vec::new())
    }

    async fn fetch_typologies(&self, _token: &str, parent_id: &str) -> Result<Vec<TypologyRecord>> {
        self.check_parent(parent_id)?;
        Ok(self
            .typologies
            .iter()
            .find(|(hc, _)| hc == parent_id)
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }
}

/// Committed rows, keyed like the destination tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkState {
    pub mega_projects: BTreeMap<String, MegaProjectRow>,
    pub commercial_projects: BTreeMap<String, CommercialProjectRow>,
    pub typologies: BTreeMap<String, TypologyRow>,
    pub project_attributes: BTreeMap<String, ProjectAttributeRow>,
    pub cities: BTreeMap<String, CityRow>,
}

/// Maps records with the real row builders and stages each unit of work,
/// committing it only when every write in it succeeds.
#[derive(Default)]
pub struct MockSink {
    /// Writing this typology id fails like a database error.
    pub fail_on_typology: Option<String>,
    pub state: Mutex<SinkState>,
    pub processed: Mutex<Vec<String>>,
}

impl MockSink {
    pub fn snapshot(&self) -> SinkState {
        self.state.lock().unwrap().clone()
    }

    /// Business keys handed to the sink, in call order.
    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().unwrap().clone()
    }

    fn note(&self, key: Option<&str>) {
        self.processed
            .lock()
            .unwrap()
            .push(key.unwrap_or_default().to_string());
    }
}

#[async_trait]
impl ProjectSink for MockSink {
    async fn sync_mega_project(
        &self,
        record: &MegaProjectRecord,
        reader: &dyn CrmReader,
        token: &str,
    ) -> Result<bool> {
        self.note(record.key());
        let Some(id) = record.key() else {
            return Ok(false);
        };
        let attributes = reader.fetch_mega_project_attributes(token, id).await?;
        let row = MegaProjectRow::from_record(id, record, attributes);
        self.state.lock().unwrap().mega_projects.insert(id.to_string(), row);
        Ok(true)
    }

    async fn sync_commercial_project(
        &self,
        record: &CommercialProjectRecord,
        reader: &dyn CrmReader,
        token: &str,
    ) -> Result<bool> {
        self.note(record.key());
        let Some(hc) = record.key() else {
            return Ok(false);
        };
        let attributes = reader.fetch_commercial_project_attributes(token, hc).await?;
        let project = CommercialProjectRow::from_record(hc, record, attributes);

        let mut staged = Vec::new();
        for typology in reader.fetch_typologies(token, hc).await? {
            let Some(id) = typology.key() else {
                continue;
            };
            if self.fail_on_typology.as_deref() == Some(id) {
                return Err(SyncError::Persistence(sqlx::Error::Protocol(format!(
                    "violates check constraint on typology {}",
                    id
                ))));
            }
            staged.push(TypologyRow::from_record(id, hc, &typology));
        }

        let mut state = self.state.lock().unwrap();
        state.commercial_projects.insert(hc.to_string(), project);
        for row in staged {
            state.typologies.insert(row.id.clone(), row);
        }
        Ok(true)
    }

    async fn sync_project_attribute(&self, record: &ParameterAttributeRecord) -> Result<bool> {
        self.note(record.key());
        let Some(row) = ProjectAttributeRow::from_record(record) else {
            return Ok(false);
        };
        self.state
            .lock()
            .unwrap()
            .project_attributes
            .insert(row.id.clone(), row);
        Ok(true)
    }

    async fn sync_city(&self, record: &CityRecord) -> Result<bool> {
        self.note(record.key());
        let Some(row) = CityRow::from_record(record) else {
            return Ok(false);
        };
        self.state.lock().unwrap().cities.insert(row.id.clone(), row);
        Ok(true)
    }
}
