// zohosync/src/zoho/records.rs
//! Typed shapes of the records returned by COQL queries and search endpoints.
//!
//! Text fields accept whatever scalar the CRM sends; numeric fields stay raw
//! JSON until the writers normalize them with `utils::parse`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MegaProjectRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Direccion_MP", default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(rename = "Slogan_comercial", default, deserialize_with = "lenient_text")]
    pub slogan: Option<String>,
    #[serde(rename = "Descripcion", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "Record_Image", default)]
    pub record_image: Option<Value>,
    #[serde(rename = "Latitud_MP", default)]
    pub latitude: Option<Value>,
    #[serde(rename = "Longitud_MP", default)]
    pub longitude: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommercialProjectRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Slogan", default, deserialize_with = "lenient_text")]
    pub slogan: Option<String>,
    #[serde(rename = "Direccion", default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(rename = "Descripcion_corta", default, deserialize_with = "lenient_text")]
    pub short_description: Option<String>,
    #[serde(rename = "Descripcion_larga", default, deserialize_with = "lenient_text")]
    pub long_description: Option<String>,
    #[serde(rename = "SIG", default, deserialize_with = "lenient_text")]
    pub sig: Option<String>,
    #[serde(rename = "Sala_de_ventas.Name", default, deserialize_with = "lenient_text")]
    pub sales_room_name: Option<String>,
    #[serde(rename = "Cantidad_SMMLV", default)]
    pub minimum_salary_count: Option<Value>,
    #[serde(rename = "Descripcion_descuento", default, deserialize_with = "lenient_text")]
    pub discount_description: Option<String>,
    #[serde(rename = "Precios_desde", default)]
    pub price_from: Option<Value>,
    #[serde(rename = "Precios_hasta", default)]
    pub price_to: Option<Value>,
    #[serde(rename = "Tipo_de_proyecto", default, deserialize_with = "lenient_text")]
    pub project_type: Option<String>,
    #[serde(rename = "Mega_Proyecto.id", default, deserialize_with = "lenient_text")]
    pub mega_project_id: Option<String>,
    #[serde(rename = "Estado", default)]
    pub status: Option<Value>,
    #[serde(rename = "Proyecto_destacado", default)]
    pub highlighted: Option<Value>,
    #[serde(rename = "Area_construida_desde", default)]
    pub built_area_from: Option<Value>,
    #[serde(rename = "Area_construida_hasta", default)]
    pub built_area_to: Option<Value>,
    #[serde(rename = "Habitaciones", default)]
    pub rooms: Option<Value>,
    #[serde(rename = "Ba_os", default)]
    pub bathrooms: Option<Value>,
    #[serde(rename = "Latitud", default)]
    pub latitude: Option<Value>,
    #[serde(rename = "Longitud", default)]
    pub longitude: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TypologyRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(rename = "Nombre", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Descripci_n", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "Precio_desde", default)]
    pub price_from: Option<Value>,
    #[serde(rename = "Habitaciones", default)]
    pub rooms: Option<Value>,
    #[serde(rename = "Ba_os", default)]
    pub bathrooms: Option<Value>,
    #[serde(rename = "Area_construida", default)]
    pub built_area: Option<Value>,
    #[serde(rename = "Area_privada", default)]
    pub private_area: Option<Value>,
}

/// A row of the `Parametros` module with `Tipo = 'Atributo'`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParameterAttributeRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(rename = "Nombre_atributo", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

/// The city lookup of a commercial project, as selected through COQL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CityRecord {
    #[serde(rename = "Ciudad.id", default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(rename = "Ciudad.Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

/// Business key of a record: present and non-empty.
pub fn business_key(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

impl MegaProjectRecord {
    pub fn key(&self) -> Option<&str> {
        business_key(&self.id)
    }
}

impl CommercialProjectRecord {
    pub fn key(&self) -> Option<&str> {
        business_key(&self.id)
    }
}

impl TypologyRecord {
    pub fn key(&self) -> Option<&str> {
        business_key(&self.id)
    }
}

impl ParameterAttributeRecord {
    pub fn key(&self) -> Option<&str> {
        business_key(&self.id)
    }
}

impl CityRecord {
    pub fn key(&self) -> Option<&str> {
        business_key(&self.id)
    }
}

/// Accepts strings as-is, stringifies numbers and booleans, keeps structured
/// values as their JSON text and maps null to `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
