use crate::api::client::{ApiClient, DownloadOutcome};
use crate::config::{self, CrawlConfig};
use crate::core::stats::{self, CategoryStats};
use crate::core::store::CatalogStore;
use crate::core::walker;
use crate::error::AppResult;
use crate::io;
use crate::logging::{log, LogLevel};
use crate::utils;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::Semaphore;

/// Crawl mode: walk every configured (language, category) pair sequentially
/// against the shared store, then persist once. A save failure propagates;
/// it is the run's only persistence point.
pub async fn run_crawl(cfg: CrawlConfig) -> AppResult<i32> {
    let overall_start_time = Instant::now();
    let start_ts_str = Utc::now().format("%Y-%m-%d %H:%M:%S %Z").to_string();
    log(
        LogLevel::Step,
        &format!(
            "Starting catalog crawl ({} language(s), {} categorie(s)) at {}",
            cfg.lang_codes.len(),
            cfg.categories.len(),
            start_ts_str
        ),
    );
    log(
        LogLevel::Info,
        &format!(
            "Catalog root: {}, catalog path: {}",
            cfg.catalog_root().display(),
            cfg.catalog_path.display()
        ),
    );

    let client = ApiClient::new(&cfg.user_agent)?;
    let mut store = CatalogStore::load(&cfg.catalog_path).await?;
    let mut run_stats = stats::initialize_stats();

    for lang_code in &cfg.lang_codes {
        log(
            LogLevel::Step,
            &format!("Processing language {}", lang_code),
        );
        for category in &cfg.categories {
            log(LogLevel::Info, &format!("Processing category {}", category));
            let outcome =
                walker::walk_category(&client, &cfg, &mut store, lang_code, category).await?;

            let pages = run_stats.get_mut("Page Fetch").unwrap();
            pages.ok += outcome.pages_fetched;
            let products = run_stats.get_mut("Products").unwrap();
            products.ok += outcome.new_products;
            products.skip_or_empty += outcome.skipped_products;
            let details = run_stats.get_mut("Detail Fetch").unwrap();
            details.ok += outcome.details_merged;
            details.skip_or_empty += outcome.details_empty;

            log(
                LogLevel::Info,
                &format!(
                    "{} [{}]: {} page(s), {} new, {} already stored",
                    category,
                    lang_code,
                    outcome.pages_fetched,
                    outcome.new_products,
                    outcome.skipped_products
                ),
            );
        }
    }

    let save_path = cfg
        .save_path
        .clone()
        .unwrap_or_else(|| cfg.catalog_path.clone());
    match store.save(&save_path).await {
        Ok(()) => run_stats.get_mut("Save Catalog").unwrap().add_ok(),
        Err(e) => {
            run_stats.get_mut("Save Catalog").unwrap().add_fail();
            log(
                LogLevel::Error,
                &format!("Catalog save failed: {} - aborting run.", e),
            );
            return Err(e);
        }
    }

    stats::print_summary(&run_stats, overall_start_time.elapsed());
    Ok(stats::determine_exit_code(&run_stats))
}

struct ProductUnit {
    product_code: String,
    images: Vec<String>,
}

enum ProductDownload {
    Skipped,
    Done { downloaded: usize, failed: usize },
}

/// Image mode: for every stored product, ensure its directory holds one file
/// per listed image. Products whose `.jpg` count already matches are skipped
/// without any network traffic. Units are independent and idempotent, so
/// they run through a bounded worker pool; the store is read-only here.
pub async fn run_image_downloads(cfg: CrawlConfig) -> AppResult<i32> {
    let overall_start_time = Instant::now();
    let store = CatalogStore::load(&cfg.catalog_path).await?;
    if store.is_empty() {
        log(
            LogLevel::Warning,
            "Catalog is empty; nothing to download.",
        );
        return Ok(0);
    }
    log(
        LogLevel::Step,
        &format!("Downloading images for {} product(s)", store.len()),
    );

    let client = Arc::new(ApiClient::new(&cfg.user_agent)?);
    let root = cfg.catalog_root();
    let semaphore = Arc::new(Semaphore::new(config::MAX_DOWNLOAD_CONCUR));

    let units: Vec<ProductUnit> = store
        .iter()
        .map(|(code, record)| ProductUnit {
            product_code: record
                .get("productCode")
                .and_then(Value::as_str)
                .unwrap_or(code)
                .to_string(),
            images: record
                .get("images")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    let mut run_stats = stats::initialize_stats();
    let download_stats: CategoryStats = stream::iter(units)
        .map(|unit| {
            let client = client.clone();
            let semaphore = semaphore.clone();
            let product_dir = root.join(&unit.product_code);
            async move {
                let _permit =
                    utils::acquire_semaphore(&semaphore, "Product Image Download").await?;
                download_product_images(&client, product_dir, unit).await
            }
        })
        .buffer_unordered(config::MAX_DOWNLOAD_CONCUR)
        .fold(CategoryStats::default(), |mut acc, result| async move {
            match result {
                Ok(ProductDownload::Skipped) => acc.add_skip(),
                Ok(ProductDownload::Done { failed: 0, .. }) => acc.add_ok(),
                Ok(ProductDownload::Done { .. }) => acc.add_fail(),
                Err(e) => {
                    log(LogLevel::Error, &format!("Download unit failed: {}", e));
                    acc.add_fail();
                }
            }
            acc
        })
        .await;

    *run_stats.get_mut("Image Download").unwrap() = download_stats;
    stats::print_summary(&run_stats, overall_start_time.elapsed());
    Ok(stats::determine_exit_code(&run_stats))
}

async fn download_product_images(
    client: &ApiClient,
    product_dir: PathBuf,
    unit: ProductUnit,
) -> AppResult<ProductDownload> {
    fs::create_dir_all(&product_dir)
        .await
        .map_err(|e| crate::error::AppError::io_at(e, &product_dir))?;

    let expected = unit.images.len();
    if io::count_jpg_files(&product_dir).await? == expected {
        log(
            LogLevel::Debug,
            &format!("Images already downloaded for {}", unit.product_code),
        );
        return Ok(ProductDownload::Skipped);
    }

    let mut downloaded = 0;
    let mut failed = 0;
    for image in &unit.images {
        let filename = io::url_filename(image);
        let image_path = product_dir.join(filename);
        match client.download_file(image, &image_path).await? {
            DownloadOutcome::Downloaded => downloaded += 1,
            DownloadOutcome::AlreadyExists => {}
            DownloadOutcome::RequestFailed => failed += 1,
        }
    }
    log(
        LogLevel::Debug,
        &format!(
            "{}: {} downloaded, {} failed, {} expected",
            unit.product_code, downloaded, failed, expected
        ),
    );
    Ok(ProductDownload::Done { downloaded, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer, catalog_path: PathBuf) -> CrawlConfig {
        CrawlConfig {
            catalog_path,
            endpoints: Endpoints {
                grid_base: server.uri(),
                catalog_api_base: format!("{}/v1", server.uri()),
            },
            ..CrawlConfig::default()
        }
    }

    async fn write_catalog(path: &std::path::Path, value: serde_json::Value) {
        tokio::fs::write(path, serde_json::to_vec_pretty(&value).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn matching_file_count_skips_all_network_calls() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");

        let image_url = format!("{}/m/p1_a.jpg", server.uri());
        write_catalog(
            &catalog_path,
            json!({ "p1": { "productCode": "p1", "images": [image_url] } }),
        )
        .await;
        let product_dir = dir.path().join("p1");
        tokio::fs::create_dir_all(&product_dir).await.unwrap();
        tokio::fs::write(product_dir.join("p1_a.jpg"), b"jpg")
            .await
            .unwrap();

        let cfg = test_config(&server, catalog_path);
        let exit = run_image_downloads(cfg).await.unwrap();
        assert_eq!(exit, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_images_are_downloaded_into_product_dirs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/m/p1_a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let image_url = format!("{}/m/p1_a.jpg", server.uri());
        write_catalog(
            &catalog_path,
            json!({ "p1": { "productCode": "p1", "images": [image_url] } }),
        )
        .await;

        let cfg = test_config(&server, catalog_path);
        let exit = run_image_downloads(cfg).await.unwrap();
        assert_eq!(exit, 0);

        let saved = tokio::fs::read(dir.path().join("p1").join("p1_a.jpg"))
            .await
            .unwrap();
        assert_eq!(saved, b"image-bytes");
    }

    #[tokio::test]
    async fn failed_downloads_leave_no_file_and_set_exit_code() {
        let server = MockServer::start().await;
        // No mock for the image URL; the request 404s.
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let image_url = format!("{}/m/p1_a.jpg", server.uri());
        write_catalog(
            &catalog_path,
            json!({ "p1": { "productCode": "p1", "images": [image_url] } }),
        )
        .await;

        let cfg = test_config(&server, catalog_path);
        let exit = run_image_downloads(cfg).await.unwrap();
        assert_eq!(exit, 1);
        assert!(!dir.path().join("p1").join("p1_a.jpg").exists());
    }

    #[tokio::test]
    async fn crawl_twice_yields_identical_catalog_and_zero_delta() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/us/en/c/productgrid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "numberOfPages": 1,
                "products": { "items": [ {
                    "productCode": "p1",
                    "primaryImage": { "src": "//cdn/media/S1/std/p1_img.jpg" },
                    "fullPrice": "100"
                } ] }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let cfg = test_config(&server, catalog_path.clone());

        assert_eq!(run_crawl(cfg.clone()).await.unwrap(), 0);
        let first: serde_json::Value = serde_json::from_str(
            &tokio::fs::read_to_string(&catalog_path).await.unwrap(),
        )
        .unwrap();

        assert_eq!(run_crawl(cfg).await.unwrap(), 0);
        let second: serde_json::Value = serde_json::from_str(
            &tokio::fs::read_to_string(&catalog_path).await.unwrap(),
        )
        .unwrap();

        assert_eq!(first, second);
        let reloaded = CatalogStore::load(&catalog_path).await.unwrap();
        assert_eq!(reloaded.delta(), 0);
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn crawl_save_failure_propagates() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let cfg = CrawlConfig {
            save_path: Some(dir.path().join("no_such_dir").join("catalog.json")),
            ..test_config(&server, dir.path().join("catalog.json"))
        };
        assert!(run_crawl(cfg).await.is_err());
    }
}
