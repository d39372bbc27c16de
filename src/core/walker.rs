use crate::api::client::ApiClient;
use crate::api::fetchers;
use crate::config::CrawlConfig;
use crate::core::store::CatalogStore;
use crate::error::AppResult;
use crate::logging::{log, LogLevel};
use crate::transform::{detail, listing};
use serde_json::Value;

/// Counters from one (category, language) traversal, folded into the run
/// stats by the orchestrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkOutcome {
    pub pages_fetched: usize,
    pub new_products: usize,
    pub skipped_products: usize,
    pub details_merged: usize,
    pub details_empty: usize,
}

/// Walk all grid pages for one (category, language) pair, feeding each new
/// product through the normalizer (and optionally the detail enricher)
/// before inserting it into the store.
///
/// A failed page fetch ends the traversal quietly; so does an empty item
/// list. Products already present in the store are skipped without any
/// further fetches. Strictly sequential: incremental-skip decisions depend
/// on store state.
pub async fn walk_category(
    client: &ApiClient,
    cfg: &CrawlConfig,
    store: &mut CatalogStore,
    lang_code: &str,
    category_code: &str,
) -> AppResult<WalkOutcome> {
    let mut outcome = WalkOutcome::default();

    if !cfg.categories.iter().any(|c| c == category_code) {
        log(
            LogLevel::Debug,
            &format!(
                "Category {} not in {:?}",
                category_code, cfg.categories
            ),
        );
        return Ok(outcome);
    }

    let mut page: u64 = 0;
    let mut number_of_pages: u64 = 1;

    while page < number_of_pages {
        let grid = match fetchers::fetch_category_page(
            client,
            &cfg.endpoints,
            lang_code,
            category_code,
            page,
        )
        .await
        {
            Some(grid) => grid,
            None => {
                log(
                    LogLevel::Debug,
                    &format!(
                        "Failed to get products for {} on page {}",
                        category_code, page
                    ),
                );
                break;
            }
        };
        outcome.pages_fetched += 1;
        number_of_pages = grid.number_of_pages;

        let count = grid.item_count();
        if count == 0 {
            log(
                LogLevel::Debug,
                &format!("No products found for {} on page {}", category_code, page),
            );
            break;
        }
        log(
            LogLevel::Debug,
            &format!(
                "Found {} products for {} on page {}",
                count, category_code, page
            ),
        );

        for mut product in grid.products.items {
            let product_code = match product.get("productCode").and_then(Value::as_str) {
                Some(code) if !code.is_empty() => code.to_string(),
                _ => {
                    log(
                        LogLevel::Debug,
                        &format!(
                            "Skipping item without productCode on {} page {}",
                            category_code, page
                        ),
                    );
                    continue;
                }
            };

            if store.contains(&product_code) {
                log(
                    LogLevel::Debug,
                    &format!("Product {} already processed", product_code),
                );
                outcome.skipped_products += 1;
                continue;
            }

            log(
                LogLevel::Debug,
                &format!("Processing product {}", product_code),
            );
            listing::normalize_listing(&mut product, &cfg.image_style);

            // Listings occasionally carry no usable image URLs; the media
            // endpoint is the fallback source for those.
            let has_images = product
                .get("images")
                .and_then(Value::as_array)
                .map_or(false, |a| !a.is_empty());
            if !has_images {
                let media_urls = fetchers::fetch_product_media(
                    client,
                    &cfg.endpoints,
                    &product_code,
                    &cfg.image_style,
                )
                .await;
                product.insert(
                    "images".to_string(),
                    Value::Array(media_urls.into_iter().map(Value::String).collect()),
                );
            }

            if cfg.product_details {
                let fields =
                    detail::enrich(client, &cfg.endpoints, &product_code, &cfg.language).await;
                if fields.is_empty() {
                    outcome.details_empty += 1;
                } else {
                    outcome.details_merged += 1;
                }
                for (key, value) in fields {
                    product.insert(key, value);
                }
            }

            store.insert(product_code, product)?;
            outcome.new_products += 1;
        }

        page += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> CrawlConfig {
        CrawlConfig {
            endpoints: Endpoints {
                grid_base: server.uri(),
                catalog_api_base: format!("{}/v1", server.uri()),
            },
            ..CrawlConfig::default()
        }
    }

    fn grid_item(code: &str) -> serde_json::Value {
        json!({
            "productCode": code,
            "primaryImage": { "src": format!("//cdn/media/S/std/{}_img.jpg", code) },
            "alternateImage": { "src": format!("//cdn/media/S/std/{}_img-2.jpg", code) },
            "alternateGalleryImages": [],
            "fullPrice": "100"
        })
    }

    async fn mount_grid_page(
        server: &MockServer,
        page: u64,
        number_of_pages: u64,
        items: Vec<serde_json::Value>,
    ) {
        Mock::given(method("GET"))
            .and(path("/us/en/c/productgrid"))
            .and(query_param("categoryCode", "women"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "numberOfPages": number_of_pages,
                "products": { "items": items }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn walks_every_page_until_number_of_pages() {
        let server = MockServer::start().await;
        mount_grid_page(&server, 0, 3, vec![grid_item("p0")]).await;
        mount_grid_page(&server, 1, 3, vec![grid_item("p1")]).await;
        mount_grid_page(&server, 2, 3, vec![grid_item("p2")]).await;

        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();

        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.new_products, 3);
        assert_eq!(store.len(), 3);

        let grid_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/us/en/c/productgrid")
            .count();
        assert_eq!(grid_requests, 3);
    }

    #[tokio::test]
    async fn empty_item_list_halts_early() {
        let server = MockServer::start().await;
        mount_grid_page(&server, 0, 5, vec![grid_item("p0")]).await;
        mount_grid_page(&server, 1, 5, vec![]).await;
        // Pages 2-4 are never mounted; reaching them would fail the test
        // through the request count below.

        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();

        assert_eq!(outcome.new_products, 1);
        let grid_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/us/en/c/productgrid")
            .count();
        assert_eq!(grid_requests, 2);
    }

    #[tokio::test]
    async fn failed_first_fetch_is_end_of_stream_not_error() {
        let server = MockServer::start().await;
        // No mocks mounted; every request 404s.
        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();
        assert_eq!(outcome.pages_fetched, 0);
        assert_eq!(outcome.new_products, 0);
    }

    #[tokio::test]
    async fn second_walk_skips_every_stored_product() {
        let server = MockServer::start().await;
        mount_grid_page(&server, 0, 1, vec![grid_item("p0"), grid_item("p1")]).await;

        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let first = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();
        assert_eq!(first.new_products, 2);
        let snapshot: Vec<String> = {
            let mut codes: Vec<String> = store.iter().map(|(k, _)| k.clone()).collect();
            codes.sort();
            codes
        };

        let second = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();
        assert_eq!(second.new_products, 0);
        assert_eq!(second.skipped_products, 2);
        assert_eq!(store.len(), 2);
        let mut codes_after: Vec<String> = store.iter().map(|(k, _)| k.clone()).collect();
        codes_after.sort();
        assert_eq!(snapshot, codes_after);
    }

    #[tokio::test]
    async fn unlisted_category_is_skipped_before_any_fetch() {
        let server = MockServer::start().await;
        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "not-a-category")
            .await
            .unwrap();
        assert_eq!(outcome.pages_fetched, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn imageless_listing_falls_back_to_media_endpoint() {
        let server = MockServer::start().await;
        mount_grid_page(
            &server,
            0,
            1,
            vec![json!({ "productCode": "p0", "fullPrice": "100" })],
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/v1/media/p0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "url": "https://cdn/media/$format$/std/p0_a.jpg" },
                { "url": "https://cdn/media/$format$/std/p0_b.jpg" }
            ])))
            .mount(&server)
            .await;

        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();
        assert_eq!(outcome.new_products, 1);

        let (_, record) = store.iter().next().unwrap();
        let images: Vec<&str> = record
            .get("images")
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(
            images,
            vec![
                "https://cdn/media/DarkGray_Center_0_0_2400x2400/std/p0_a.jpg",
                "https://cdn/media/DarkGray_Center_0_0_2400x2400/std/p0_b.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn failed_media_fetch_stores_record_with_empty_images() {
        let server = MockServer::start().await;
        mount_grid_page(
            &server,
            0,
            1,
            vec![json!({ "productCode": "p0", "fullPrice": "100" })],
        )
        .await;
        // No media mock; the fallback request 404s.

        let cfg = test_config(&server);
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();
        assert_eq!(outcome.new_products, 1);

        let (_, record) = store.iter().next().unwrap();
        let images = record.get("images").and_then(Value::as_array).unwrap();
        assert!(images.is_empty());

        let media_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/v1/media/p0")
            .count();
        assert_eq!(media_requests, 1);
    }

    #[tokio::test]
    async fn enrichment_fields_override_listing_fields() {
        let server = MockServer::start().await;
        let mut item = grid_item("p0");
        item["editorial"] = json!("listing-level");
        mount_grid_page(&server, 0, 1, vec![item]).await;

        Mock::given(method("GET"))
            .and(path("/v1/products/p0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "editorialDescription": "A",
                "translations": [
                    { "language": "en", "editorialDescription": "B" }
                ]
            })))
            .mount(&server)
            .await;

        let cfg = CrawlConfig {
            product_details: true,
            ..test_config(&server)
        };
        let client = ApiClient::new(&cfg.user_agent).unwrap();
        let mut store = CatalogStore::default();

        let outcome = walk_category(&client, &cfg, &mut store, "us/en", "women")
            .await
            .unwrap();
        assert_eq!(outcome.details_merged, 1);

        let (_, record) = store.iter().next().unwrap();
        assert_eq!(record.get("editorial").unwrap(), "B");
    }
}
