use crate::api::client::ApiClient;
use crate::api::fetchers;
use crate::config::{Endpoints, DETAIL_DROP_KEYS, DETAIL_RENAME_KEYS};
use crate::logging::{log, LogLevel};
use serde_json::{Map, Value};

/// Trim and rename a raw detail object. The matching-language translation
/// block is merged over the top level first, so translated fields win over
/// their same-named defaults. Drop and rename lists live in `config`.
pub fn transform_detail(mut data: Map<String, Value>, language: &str) -> Map<String, Value> {
    if let Some(Value::Array(translations)) = data.get("translations").cloned() {
        for translation in translations {
            if let Value::Object(fields) = translation {
                let matches = fields
                    .get("language")
                    .and_then(Value::as_str)
                    .map_or(false, |l| l == language);
                if matches {
                    for (key, value) in fields {
                        data.insert(key, value);
                    }
                }
            }
        }
    }

    let mut result = Map::new();
    for (key, value) in data {
        if DETAIL_DROP_KEYS.contains(key.as_str()) {
            continue;
        }
        match DETAIL_RENAME_KEYS.get(key.as_str()) {
            Some(renamed) => result.insert((*renamed).to_string(), value),
            None => result.insert(key, value),
        };
    }
    result
}

/// Fetch and transform product detail fields for merging into a listing
/// record. Empty on fetch failure; the caller stores the record un-enriched.
pub async fn enrich(
    client: &ApiClient,
    endpoints: &Endpoints,
    product_code: &str,
    language: &str,
) -> Map<String, Value> {
    let data = match fetchers::fetch_product_detail(client, endpoints, product_code).await {
        Some(data) => data,
        None => {
            log(
                LogLevel::Debug,
                &format!("Failed to get product details for {}", product_code),
            );
            return Map::new();
        }
    };

    let transformed = transform_detail(data, language);
    log(
        LogLevel::Debug,
        &format!(
            "Product details for {}: {} field(s)",
            product_code,
            transformed.len()
        ),
    );
    transformed
}
