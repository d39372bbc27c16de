use serde::de::{Deserializer, Error as DeError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One page of a category grid response. Items stay as raw key-value bags;
/// the transform stages drop and rename fields by name.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CategoryPage {
    #[serde(
        default,
        rename = "numberOfPages",
        deserialize_with = "deserialize_flexible_u64"
    )]
    pub number_of_pages: u64,
    #[serde(default)]
    pub products: GridProducts,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GridProducts {
    #[serde(default)]
    pub items: Vec<Map<String, Value>>,
}

impl CategoryPage {
    pub fn item_count(&self) -> usize {
        self.products.items.len()
    }
}

/// Accepts both JSON numbers and numeric strings; some grid responses quote
/// their page counts.
fn deserialize_flexible_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| DeError::custom(format!("invalid page count: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| DeError::custom(format!("invalid page count '{}': {}", s, e))),
        Value::Null => Ok(0),
        other => Err(DeError::custom(format!(
            "invalid page count type: {}",
            other
        ))),
    }
}
