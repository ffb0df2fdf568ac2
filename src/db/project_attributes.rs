// zohosync/src/db/project_attributes.rs
use sqlx::PgConnection;
use tracing::{debug, error, warn};

use crate::errors::Result;
use crate::zoho::ParameterAttributeRecord;

const UPSERT_PROJECT_ATTRIBUTE_SQL: &str = r#"
    INSERT INTO public."Project_Attributes" (id, name)
    VALUES ($1, $2)
    ON CONFLICT (id) DO UPDATE SET
        name = EXCLUDED.name
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAttributeRow {
    pub id: String,
    pub name: String,
}

impl ProjectAttributeRow {
    /// `None` unless the record carries both an id and a name.
    pub fn from_record(record: &ParameterAttributeRecord) -> Option<Self> {
        let id = record.key()?;
        let name = record.name.as_ref()?;
        Some(ProjectAttributeRow {
            id: id.to_string(),
            name: name.clone(),
        })
    }
}

pub async fn upsert_project_attribute(
    conn: &mut PgConnection,
    record: &ParameterAttributeRecord,
) -> Result<bool> {
    let Some(row) = ProjectAttributeRow::from_record(record) else {
        warn!("⚠️ Invalid 'Parametros' attribute (missing id or Nombre_atributo), skipping: {:?}", record);
        return Ok(false);
    };

    sqlx::query(UPSERT_PROJECT_ATTRIBUTE_SQL)
        .bind(&row.id)
        .bind(&row.name)
        .execute(&mut *conn)
        .await
        .inspect_err(|e| error!("❌ Database error processing attribute {}: {}", row.id, e))?;

    debug!("✅ Attribute {} ('{}') upserted.", row.id, row.name);
    Ok(true)
}
