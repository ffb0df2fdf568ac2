// zohosync/src/db/mega_projects.rs
use serde_json::Value;
use sqlx::PgConnection;
use sqlx::types::Json;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::utils::parse::{parse_float, split_comma_list};
use crate::zoho::{CrmReader, MegaProjectRecord};

const UPSERT_MEGA_PROJECT_SQL: &str = r#"
    INSERT INTO public."Mega_Projects" (
        id, name, address, slogan, description, "attributes",
        gallery, latitude, longitude, is_public
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (id) DO UPDATE SET
        name = EXCLUDED.name,
        address = EXCLUDED.address,
        slogan = EXCLUDED.slogan,
        description = EXCLUDED.description,
        "attributes" = EXCLUDED."attributes",
        gallery = EXCLUDED.gallery,
        latitude = EXCLUDED.latitude,
        longitude = EXCLUDED.longitude,
        is_public = EXCLUDED.is_public
"#;

/// Column values of one `Mega_Projects` row.
#[derive(Debug, Clone, PartialEq)]
pub struct MegaProjectRow {
    pub id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub slogan: Option<String>,
    pub description: Option<String>,
    /// Child records as a JSON array; NULL when the project has none.
    pub attributes: Option<Value>,
    /// Image list, always an array (possibly empty).
    pub gallery: Value,
    pub latitude: f64,
    pub longitude: f64,
    pub is_public: bool,
}

impl MegaProjectRow {
    pub fn from_record(id: &str, record: &MegaProjectRecord, attributes: Vec<Value>) -> Self {
        let gallery = match &record.record_image {
            Some(Value::String(raw)) => split_comma_list(raw),
            _ => Vec::new(),
        };

        MegaProjectRow {
            id: id.to_string(),
            name: record.name.clone(),
            address: record.address.clone(),
            slogan: record.slogan.clone(),
            description: record.description.clone(),
            attributes: (!attributes.is_empty()).then(|| Value::Array(attributes)),
            gallery: Value::from(gallery),
            latitude: parse_float(record.latitude.as_ref(), 0.0),
            longitude: parse_float(record.longitude.as_ref(), 0.0),
            // Not sourced from the CRM.
            is_public: false,
        }
    }
}

/// Fetches the project's attributes and upserts it. `Ok(false)` when the record has no id.
pub async fn upsert_mega_project(
    conn: &mut PgConnection,
    record: &MegaProjectRecord,
    reader: &dyn CrmReader,
    token: &str,
) -> Result<bool> {
    let Some(id) = record.key() else {
        warn!("⚠️ Mega Project without id, skipping: {:?}", record);
        return Ok(false);
    };
    let name = record.name.as_deref().unwrap_or("Unknown name");

    let attributes = reader.fetch_mega_project_attributes(token, id).await?;
    let row = MegaProjectRow::from_record(id, record, attributes);

    write_mega_project(conn, &row).await.inspect_err(|e| {
        error!("❌ Database error processing Mega Project {} ('{}'): {}", id, name, e);
    })?;

    info!("✅ Mega Project {} ('{}') upserted.", id, name);
    Ok(true)
}

async fn write_mega_project(conn: &mut PgConnection, row: &MegaProjectRow) -> Result<()> {
    sqlx::query(UPSERT_MEGA_PROJECT_SQL)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.address)
        .bind(&row.slogan)
        .bind(&row.description)
        .bind(row.attributes.as_ref().map(Json))
        .bind(Json(&row.gallery))
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(row.is_public)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
