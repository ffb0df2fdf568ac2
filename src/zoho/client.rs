// zohosync/src/zoho/client.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use super::records::{
    CityRecord, CommercialProjectRecord, MegaProjectRecord, ParameterAttributeRecord,
    TypologyRecord,
};
use super::{CrmReader, MAX_PAGE_SIZE, Page};
use crate::errors::{Result, SyncError};

const MEGA_PROJECT_ATTRIBUTES_MODULE: &str = "Atributos_Mega_Proyecto";
const COMMERCIAL_PROJECT_ATTRIBUTES_MODULE: &str = "Atributos";
const TYPOLOGIES_MODULE: &str = "Tipologias";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<Vec<T>>,
    info: Option<PageInfo>,
}

/// Null or absent flags read as "no more records".
#[derive(Debug, Default, Deserialize)]
struct PageInfo {
    more_records: Option<bool>,
    count: Option<u64>,
}

/// HTTP client for the Zoho CRM v2 API: COQL bulk reads and module search.
pub struct ZohoClient {
    http_client: reqwest::Client,
    api_base_url: String,
}

impl ZohoClient {
    pub fn new(http_client: reqwest::Client, api_base_url: &str) -> Self {
        Self {
            http_client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Runs one COQL query. A 204 answer is an empty, final page.
    async fn coql<T>(&self, token: &str, query: String, what: &str) -> Result<Page<T>>
    where
        T: DeserializeOwned + Send,
    {
        let url = format!("{}/coql", self.api_base_url);
        debug!("COQL for {}: {}", what, query);

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, auth_header(token))
            .json(&json!({ "select_query": query }))
            .send()
            .await
            .map_err(|e| {
                error!("❌ Error fetching {} from Zoho: {}", what, e);
                SyncError::Fetch(format!("{} request failed: {}", what, e))
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            info!("ℹ️ Zoho returned no content for {}.", what);
            return Ok(Page::empty());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Error fetching {} from Zoho ({}): {}", what, status, body);
            return Err(SyncError::Fetch(format!(
                "{} request failed with status {}: {}",
                what, status, body
            )));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            error!("❌ Unexpected {} response from Zoho: {}", what, e);
            SyncError::Fetch(format!("Malformed {} response: {}", what, e))
        })?;

        let info = envelope.info.unwrap_or_default();
        let records = envelope.data.unwrap_or_default();
        let has_more = info.more_records.unwrap_or(false);
        let count = info.count.unwrap_or(records.len() as u64);
        info!(
            "✅ {} {} fetched from Zoho (count: {}). More records: {}",
            records.len(),
            what,
            count,
            has_more
        );

        Ok(Page {
            records,
            has_more,
            count,
        })
    }

    /// Searches `module` for records whose `Parent_Id` lookup is `parent_id`.
    async fn search_children<T>(&self, token: &str, module: &str, parent_id: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let url = format!("{}/{}/search", self.api_base_url, module);
        let criteria = format!("(Parent_Id.id:equals:{})", parent_id);
        debug!("ℹ️ Fetching {} records for parent {}...", module, parent_id);

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, auth_header(token))
            .query(&[("criteria", criteria.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("❌ Error fetching {} for parent {}: {}", module, parent_id, e);
                SyncError::Fetch(format!("{} search failed for {}: {}", module, parent_id, e))
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            debug!("ℹ️ No {} records (204) for parent {}.", module, parent_id);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                "❌ Error fetching {} for parent {} ({}): {}",
                module, parent_id, status, body
            );
            return Err(SyncError::Fetch(format!(
                "{} search for {} failed with status {}: {}",
                module, parent_id, status, body
            )));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            error!("❌ Unexpected {} response for parent {}: {}", module, parent_id, e);
            SyncError::Fetch(format!("Malformed {} response for {}: {}", module, parent_id, e))
        })?;

        let records = envelope.data.unwrap_or_default();
        debug!("✅ {} {} records fetched for parent {}.", records.len(), module, parent_id);
        Ok(records)
    }
}

fn auth_header(token: &str) -> String {
    format!("Zoho-oauthtoken {}", token)
}

fn capped(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

fn mega_projects_query(offset: u32, limit: u32) -> String {
    format!(
        "SELECT id, Name, Direccion_MP, Slogan_comercial, Descripcion, Record_Image, \
         Latitud_MP, Longitud_MP FROM Mega_Proyectos WHERE id is not null LIMIT {},{}",
        offset,
        capped(limit)
    )
}

fn commercial_projects_query(offset: u32, limit: u32) -> String {
    format!(
        "SELECT id, Name, Slogan, Direccion, Descripcion_corta, Descripcion_larga, SIG, \
         Sala_de_ventas.Name, Cantidad_SMMLV, Descripcion_descuento, Precios_desde, \
         Precios_hasta, Tipo_de_proyecto, Mega_Proyecto.id, Estado, Proyecto_destacado, \
         Area_construida_desde, Area_construida_hasta, Habitaciones, Ba_os, Latitud, Longitud \
         FROM Proyectos_Comerciales WHERE id is not null LIMIT {},{}",
        offset,
        capped(limit)
    )
}

fn parameter_attributes_query(offset: u32, limit: u32) -> String {
    format!(
        "SELECT id, Nombre_atributo FROM Parametros WHERE Tipo = 'Atributo' LIMIT {},{}",
        offset,
        capped(limit)
    )
}

fn cities_query(offset: u32, limit: u32) -> String {
    format!(
        "SELECT Ciudad.Name, Ciudad.id FROM Proyectos_Comerciales WHERE Ciudad is not null LIMIT {},{}",
        offset,
        capped(limit)
    )
}

#[async_trait]
impl CrmReader for ZohoClient {
    async fn fetch_mega_projects(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<MegaProjectRecord>> {
        info!("ℹ️ Fetching Mega Projects from Zoho (offset: {}, limit: {})...", offset, capped(limit));
        self.coql(token, mega_projects_query(offset, limit), "Mega Projects").await
    }

    async fn fetch_commercial_projects(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<CommercialProjectRecord>> {
        info!(
            "ℹ️ Fetching Commercial Projects from Zoho (offset: {}, limit: {})...",
            offset,
            capped(limit)
        );
        self.coql(token, commercial_projects_query(offset, limit), "Commercial Projects")
            .await
    }

    async fn fetch_parameter_attributes(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<ParameterAttributeRecord>> {
        info!(
            "ℹ️ Fetching 'Parametros' attributes from Zoho (offset: {}, limit: {})...",
            offset,
            capped(limit)
        );
        self.coql(token, parameter_attributes_query(offset, limit), "Parametros attributes")
            .await
    }

    async fn fetch_cities(&self, token: &str, offset: u32, limit: u32) -> Result<Page<CityRecord>> {
        info!("ℹ️ Fetching cities from Zoho (offset: {}, limit: {})...", offset, capped(limit));
        self.coql(token, cities_query(offset, limit), "city records").await
    }

    async fn fetch_mega_project_attributes(
        &self,
        token: &str,
        parent_id: &str,
    ) -> Result<Vec<Value>> {
        self.search_children(token, MEGA_PROJECT_ATTRIBUTES_MODULE, parent_id)
            .await
    }

    async fn fetch_commercial_project_attributes(
        &self,
        token: &str,
        parent_id: &str,
    ) -> Result<Vec<Value>> {
        self.search_children(token, COMMERCIAL_PROJECT_ATTRIBUTES_MODULE, parent_id)
            .await
    }

    async fn fetch_typologies(&self, token: &str, parent_id: &str) -> Result<Vec<TypologyRecord>> {
        self.search_children(token, TYPOLOGIES_MODULE, parent_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_queries_cap_limit_at_200() {
        assert!(mega_projects_query(400, 500).ends_with("LIMIT 400,200"));
        assert!(commercial_projects_query(0, 50).ends_with("LIMIT 0,50"));
        assert!(parameter_attributes_query(0, 200).contains("Tipo = 'Atributo'"));
        assert!(cities_query(0, 200).contains("Ciudad is not null"));
    }

    #[tokio::test]
    async fn test_coql_page_is_parsed_with_envelope_flags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coql"))
            .and(header("Authorization", "Zoho-oauthtoken tok"))
            .and(body_partial_json(json!({
                "select_query": mega_projects_query(200, 200)
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "1", "Name": "Ciudad del Rio", "Latitud_MP": "6.21"},
                    {"id": "2", "Name": "Altos", "Record_Image": "a.jpg,b.jpg"}
                ],
                "info": {"more_records": true, "count": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let page = client.fetch_mega_projects("tok", 200, 200).await.unwrap();

        assert_eq!(page.records.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.count, 2);
        assert_eq!(page.records[0].key(), Some("1"));
        assert_eq!(page.records[1].name.as_deref(), Some("Altos"));
    }

    #[derive(Debug, Deserialize)]
    struct BareRecord {
        id: String,
    }

    #[test]
    fn test_envelope_parses_for_records_without_default() {
        let envelope: Envelope<BareRecord> = serde_json::from_value(json!({})).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.info.is_none());

        let envelope: Envelope<BareRecord> =
            serde_json::from_value(json!({"data": [{"id": "1"}], "info": null})).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data[0].id, "1");
    }

    #[tokio::test]
    async fn test_coql_null_page_flags_read_as_final_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "1", "Name": "Ciudad del Rio"}],
                "info": {"more_records": null, "count": null}
            })))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let page = client.fetch_mega_projects("tok", 0, 200).await.unwrap();

        assert_eq!(page.records.len(), 1);
        assert!(!page.has_more);
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn test_coql_no_content_is_empty_final_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coql"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let page = client.fetch_commercial_projects("tok", 0, 200).await.unwrap();

        assert!(page.records.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_coql_error_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coql"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "INVALID_TOKEN",
                "message": "invalid oauth token"
            })))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let result = client.fetch_parameter_attributes("expired", 0, 200).await;

        assert!(matches!(result, Err(SyncError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_coql_malformed_envelope_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coql"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let result = client.fetch_mega_projects("tok", 0, 200).await;

        assert!(matches!(result, Err(SyncError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_search_children_filters_by_parent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Tipologias/search"))
            .and(query_param("criteria", "(Parent_Id.id:equals:5410)"))
            .and(header("Authorization", "Zoho-oauthtoken tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "t-1", "Nombre": "Tipo A", "Precio_desde": "250000000"},
                    {"Nombre": "Sin id"}
                ],
                "info": {"more_records": false, "count": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let typologies = client.fetch_typologies("tok", "5410").await.unwrap();

        assert_eq!(typologies.len(), 2);
        assert_eq!(typologies[0].key(), Some("t-1"));
        assert_eq!(typologies[1].key(), None);
    }

    #[tokio::test]
    async fn test_search_children_no_content_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Atributos_Mega_Proyecto/search"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let attributes = client.fetch_mega_project_attributes("tok", "1").await.unwrap();

        assert!(attributes.is_empty());
    }

    #[tokio::test]
    async fn test_search_children_without_data_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Atributos/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"info": {}})))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let attributes = client
            .fetch_commercial_project_attributes("tok", "1")
            .await
            .unwrap();

        assert!(attributes.is_empty());
    }

    #[tokio::test]
    async fn test_search_children_server_error_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Atributos/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ZohoClient::new(reqwest::Client::new(), &server.uri());
        let result = client.fetch_commercial_project_attributes("tok", "1").await;

        assert!(matches!(result, Err(SyncError::Fetch(_))));
    }
}
