// zohosync/src/db/commercial_projects.rs
use serde_json::Value;
use sqlx::PgConnection;
use sqlx::types::Json;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::utils::parse::{parse_float, parse_int, parse_rooms};
use crate::zoho::{CommercialProjectRecord, CrmReader, TypologyRecord};

const UPSERT_PROJECT_SQL: &str = r#"
    INSERT INTO public."Projects" (
        hc, name, slogan, address, small_description, long_description, sic,
        sales_room_name, salary_minimum_count, discount_description, price_from_general,
        price_up_general, "type", mega_project_id, status, highlighted, built_area,
        private_area, rooms, bathrooms, latitude, longitude, is_public, "attributes"
    ) VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
        $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
    )
    ON CONFLICT (hc) DO UPDATE SET
        name = EXCLUDED.name, slogan = EXCLUDED.slogan, address = EXCLUDED.address,
        small_description = EXCLUDED.small_description, long_description = EXCLUDED.long_description,
        sic = EXCLUDED.sic, sales_room_name = EXCLUDED.sales_room_name,
        salary_minimum_count = EXCLUDED.salary_minimum_count,
        discount_description = EXCLUDED.discount_description,
        price_from_general = EXCLUDED.price_from_general, price_up_general = EXCLUDED.price_up_general,
        "type" = EXCLUDED."type", mega_project_id = EXCLUDED.mega_project_id, status = EXCLUDED.status,
        highlighted = EXCLUDED.highlighted, built_area = EXCLUDED.built_area,
        private_area = EXCLUDED.private_area, rooms = EXCLUDED.rooms, bathrooms = EXCLUDED.bathrooms,
        latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude, is_public = EXCLUDED.is_public,
        "attributes" = EXCLUDED."attributes"
"#;

const UPSERT_TYPOLOGY_SQL: &str = r#"
    INSERT INTO public."Typologies" (
        id, project_id, "name", description, price_from, price_up,
        rooms, bathrooms, built_area, private_area, plans, gallery
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    ON CONFLICT (id) DO UPDATE SET
        project_id = EXCLUDED.project_id, "name" = EXCLUDED."name", description = EXCLUDED.description,
        price_from = EXCLUDED.price_from, price_up = EXCLUDED.price_up, rooms = EXCLUDED.rooms,
        bathrooms = EXCLUDED.bathrooms, built_area = EXCLUDED.built_area,
        private_area = EXCLUDED.private_area, plans = EXCLUDED.plans, gallery = EXCLUDED.gallery
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct CommercialProjectRow {
    pub hc: String,
    pub name: Option<String>,
    pub slogan: Option<String>,
    pub address: Option<String>,
    pub small_description: Option<String>,
    pub long_description: Option<String>,
    pub sic: Option<String>,
    pub sales_room_name: Option<String>,
    pub salary_minimum_count: i32,
    pub discount_description: Option<String>,
    pub price_from_general: f64,
    pub price_up_general: f64,
    pub project_type: Option<String>,
    pub mega_project_id: Option<String>,
    pub status: Option<Value>,
    /// `None` when the CRM has no value for the flag.
    pub highlighted: Option<bool>,
    pub built_area: f64,
    pub private_area: f64,
    pub rooms: i32,
    pub bathrooms: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub is_public: bool,
    pub attributes: Option<Value>,
}

impl CommercialProjectRow {
    pub fn from_record(hc: &str, record: &CommercialProjectRecord, attributes: Vec<Value>) -> Self {
        CommercialProjectRow {
            hc: hc.to_string(),
            name: record.name.clone(),
            slogan: record.slogan.clone(),
            address: record.address.clone(),
            small_description: record.short_description.clone(),
            long_description: record.long_description.clone(),
            sic: record.sig.clone(),
            sales_room_name: record.sales_room_name.clone(),
            salary_minimum_count: parse_int(record.minimum_salary_count.as_ref(), 0),
            discount_description: record.discount_description.clone(),
            price_from_general: parse_float(record.price_from.as_ref(), 0.0),
            price_up_general: parse_float(record.price_to.as_ref(), 0.0),
            project_type: record.project_type.clone(),
            mega_project_id: record.mega_project_id.clone().filter(|id| !id.is_empty()),
            status: record.status.clone().filter(is_present),
            highlighted: record.highlighted.as_ref().and_then(Value::as_bool),
            built_area: parse_float(record.built_area_from.as_ref(), 0.0),
            // The CRM has no private area field on projects; the upper built area stands in.
            private_area: parse_float(record.built_area_to.as_ref(), 0.0),
            rooms: parse_rooms(record.rooms.as_ref(), "Habitaciones"),
            bathrooms: parse_rooms(record.bathrooms.as_ref(), "Ba_os"),
            latitude: parse_float(record.latitude.as_ref(), 0.0),
            longitude: parse_float(record.longitude.as_ref(), 0.0),
            is_public: false,
            attributes: (!attributes.is_empty()).then(|| Value::Array(attributes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypologyRow {
    pub id: String,
    pub project_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_from: f64,
    pub price_up: f64,
    pub rooms: i32,
    pub bathrooms: i32,
    pub built_area: f64,
    pub private_area: f64,
    pub plans: Option<Value>,
    pub gallery: Option<Value>,
}

impl TypologyRow {
    pub fn from_record(id: &str, project_hc: &str, record: &TypologyRecord) -> Self {
        TypologyRow {
            id: id.to_string(),
            project_id: project_hc.to_string(),
            name: record.name.clone(),
            description: record.description.clone(),
            price_from: parse_float(record.price_from.as_ref(), 0.0),
            price_up: 0.0,
            rooms: parse_int(record.rooms.as_ref(), 0),
            bathrooms: parse_int(record.bathrooms.as_ref(), 0),
            built_area: parse_float(record.built_area.as_ref(), 0.0),
            private_area: parse_float(record.private_area.as_ref(), 0.0),
            plans: None,
            gallery: None,
        }
    }
}

/// Project row plus typologies as one unit: upsert the project (with its
/// attributes), then fetch and upsert its typologies on the same connection.
///
/// `Ok(false)` when the record has no id; nothing is written in that case.
pub async fn sync_commercial_project(
    conn: &mut PgConnection,
    record: &CommercialProjectRecord,
    reader: &dyn CrmReader,
    token: &str,
) -> Result<bool> {
    let Some(hc) = record.key() else {
        warn!("⚠️ Commercial Project without id (hc), skipping: {:?}", record);
        return Ok(false);
    };

    upsert_commercial_project(conn, hc, record, reader, token).await?;

    let typologies = reader.fetch_typologies(token, hc).await?;
    upsert_typologies(conn, hc, &typologies).await?;
    Ok(true)
}

async fn upsert_commercial_project(
    conn: &mut PgConnection,
    hc: &str,
    record: &CommercialProjectRecord,
    reader: &dyn CrmReader,
    token: &str,
) -> Result<()> {
    let name = record.name.as_deref().unwrap_or("Unknown name");

    let attributes = reader.fetch_commercial_project_attributes(token, hc).await?;
    let row = CommercialProjectRow::from_record(hc, record, attributes);

    write_commercial_project(conn, &row).await.inspect_err(|e| {
        error!("❌ Database error processing Commercial Project {} ('{}'): {}", hc, name, e);
    })?;

    info!("✅ Commercial Project {} ('{}') upserted.", hc, name);
    Ok(())
}

/// Upserts every typology with an id; the ones without are logged and skipped.
/// Returns how many were written.
pub async fn upsert_typologies(
    conn: &mut PgConnection,
    project_hc: &str,
    typologies: &[TypologyRecord],
) -> Result<usize> {
    if typologies.is_empty() {
        debug!("ℹ️ No typologies for Commercial Project {}.", project_hc);
        return Ok(0);
    }

    info!("ℹ️ Processing {} typologies for Commercial Project {}...", typologies.len(), project_hc);
    let mut processed = 0;
    for typology in typologies {
        let Some(id) = typology.key() else {
            warn!("⚠️ Typology without id for Commercial Project {}, skipping: {:?}", project_hc, typology);
            continue;
        };

        let row = TypologyRow::from_record(id, project_hc, typology);
        write_typology(conn, &row).await.inspect_err(|e| {
            error!(
                "❌ Database error processing typology {} of Commercial Project {}: {}",
                id, project_hc, e
            );
        })?;
        processed += 1;
        debug!("✅ Typology {} ('{}') upserted.", id, row.name.as_deref().unwrap_or(""));
    }

    info!("✅ {} typologies upserted for Commercial Project {}.", processed, project_hc);
    Ok(processed)
}

async fn write_commercial_project(conn: &mut PgConnection, row: &CommercialProjectRow) -> Result<()> {
    sqlx::query(UPSERT_PROJECT_SQL)
        .bind(&row.hc)
        .bind(&row.name)
        .bind(&row.slogan)
        .bind(&row.address)
        .bind(&row.small_description)
        .bind(&row.long_description)
        .bind(&row.sic)
        .bind(&row.sales_room_name)
        .bind(row.salary_minimum_count)
        .bind(&row.discount_description)
        .bind(row.price_from_general)
        .bind(row.price_up_general)
        .bind(&row.project_type)
        .bind(&row.mega_project_id)
        .bind(row.status.as_ref().map(Json))
        .bind(row.highlighted)
        .bind(row.built_area)
        .bind(row.private_area)
        .bind(row.rooms)
        .bind(row.bathrooms)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(row.is_public)
        .bind(row.attributes.as_ref().map(Json))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn write_typology(conn: &mut PgConnection, row: &TypologyRow) -> Result<()> {
    sqlx::query(UPSERT_TYPOLOGY_SQL)
        .bind(&row.id)
        .bind(&row.project_id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(row.price_from)
        .bind(row.price_up)
        .bind(row.rooms)
        .bind(row.bathrooms)
        .bind(row.built_area)
        .bind(row.private_area)
        .bind(row.plans.as_ref().map(Json))
        .bind(row.gallery.as_ref().map(Json))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Mirrors the CRM's notion of an empty value: null, "", [] and {} are absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}
