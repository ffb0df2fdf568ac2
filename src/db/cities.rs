// zohosync/src/db/cities.rs
use sqlx::PgConnection;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::zoho::CityRecord;

const UPSERT_CITY_SQL: &str = r#"
    INSERT INTO public."Cities" (id, "name", is_public)
    VALUES ($1, $2, $3)
    ON CONFLICT (id) DO UPDATE SET
        "name" = EXCLUDED."name",
        is_public = EXCLUDED.is_public
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct CityRow {
    pub id: String,
    pub name: String,
    pub is_public: bool,
}

impl CityRow {
    /// The CRM names cities as "City / Region"; only the city part is stored.
    pub fn from_record(record: &CityRecord) -> Option<Self> {
        let id = record.key()?;
        let full_name = record.name.as_deref().filter(|n| !n.is_empty())?;
        let name = full_name.split('/').next().unwrap_or_default().trim();
        if name.is_empty() {
            return None;
        }
        Some(CityRow {
            id: id.to_string(),
            name: name.to_string(),
            is_public: true,
        })
    }
}

pub async fn upsert_city(conn: &mut PgConnection, record: &CityRecord) -> Result<bool> {
    let Some(row) = CityRow::from_record(record) else {
        warn!("⚠️ Invalid city record (missing id or name), skipping: {:?}", record);
        return Ok(false);
    };

    sqlx::query(UPSERT_CITY_SQL)
        .bind(&row.id)
        .bind(&row.name)
        .bind(row.is_public)
        .execute(&mut *conn)
        .await
        .inspect_err(|e| error!("❌ Database error processing city {} ('{}'): {}", row.id, row.name, e))?;

    info!("✅ City {} ('{}') upserted.", row.id, row.name);
    Ok(true)
}
