// zohosync/src/zoho/mod.rs
pub mod auth;
pub mod client;
pub mod records;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

pub use auth::{TokenProvider, ZohoTokenProvider};
pub use client::ZohoClient;
pub use records::{
    CityRecord, CommercialProjectRecord, MegaProjectRecord, ParameterAttributeRecord,
    TypologyRecord,
};

/// Hard ceiling on COQL page size imposed by the CRM.
pub const MAX_PAGE_SIZE: u32 = 200;

/// One page of a COQL query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// `info.more_records` from the response envelope.
    pub has_more: bool,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Page {
            records: Vec::new(),
            has_more: false,
            count: 0,
        }
    }
}

/// Read access to the CRM: paged bulk queries plus per-parent child lookups.
#[async_trait]
pub trait CrmReader: Send + Sync {
    async fn fetch_mega_projects(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<MegaProjectRecord>>;

    async fn fetch_commercial_projects(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<CommercialProjectRecord>>;

    async fn fetch_parameter_attributes(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<ParameterAttributeRecord>>;

    async fn fetch_cities(&self, token: &str, offset: u32, limit: u32) -> Result<Page<CityRecord>>;

    /// Raw child records of the `Atributos_Mega_Proyecto` module.
    async fn fetch_mega_project_attributes(&self, token: &str, parent_id: &str)
    -> Result<Vec<Value>>;

    /// Raw child records of the `Atributos` module.
    async fn fetch_commercial_project_attributes(
        &self,
        token: &str,
        parent_id: &str,
    ) -> Result<Vec<Value>>;

    async fn fetch_typologies(&self, token: &str, parent_id: &str) -> Result<Vec<TypologyRecord>>;
}
