use super::client::ApiClient;
use super::model::CategoryPage;
use crate::config::{Endpoints, FORMAT_PLACEHOLDER};
use crate::logging::{log, LogLevel};
use serde_json::{Map, Value};

/// Fetch one grid page for a (category, language) pair. `None` means the page
/// could not be fetched or parsed; the walker treats that as end-of-stream.
pub async fn fetch_category_page(
    client: &ApiClient,
    endpoints: &Endpoints,
    lang_code: &str,
    category_code: &str,
    page: u64,
) -> Option<CategoryPage> {
    let url = endpoints.grid_url(lang_code, category_code, page);
    let value = client.fetch_json(&url).await?;

    match serde_json::from_value::<CategoryPage>(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log(
                LogLevel::Debug,
                &format!(
                    "Grid response for {} page {} did not match expected shape: {}",
                    category_code, page, e
                ),
            );
            None
        }
    }
}

/// Fetch the raw detail object for a product code. `None` on any fetch or
/// shape failure; the product is stored without enrichment in that case.
pub async fn fetch_product_detail(
    client: &ApiClient,
    endpoints: &Endpoints,
    product_code: &str,
) -> Option<Map<String, Value>> {
    let url = endpoints.detail_url(product_code);
    let value = client.fetch_json(&url).await?;

    match value {
        Value::Object(map) => Some(map),
        _ => {
            log(
                LogLevel::Debug,
                &format!("Detail response for {} is not an object", product_code),
            );
            None
        }
    }
}

/// Fetch the media list for a product code and substitute the `$format$`
/// placeholder with the configured style token. Empty on any failure.
pub async fn fetch_product_media(
    client: &ApiClient,
    endpoints: &Endpoints,
    product_code: &str,
    image_style: &str,
) -> Vec<String> {
    let url = endpoints.media_url(product_code);
    let value = match client.fetch_json(&url).await {
        Some(v) => v,
        None => {
            log(
                LogLevel::Debug,
                &format!("Failed to get media for {}", product_code),
            );
            return Vec::new();
        }
    };

    let entries = match value {
        Value::Array(entries) => entries,
        _ => {
            log(
                LogLevel::Debug,
                &format!("Media response for {} is not a list", product_code),
            );
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| entry.get("url").and_then(Value::as_str))
        .map(|url| url.replace(FORMAT_PLACEHOLDER, image_style))
        .collect()
}
