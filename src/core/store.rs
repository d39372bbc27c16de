use crate::error::{AppError, AppResult};
use crate::io;
use crate::logging::{log, LogLevel};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Raw key-value bag for one product. Semantics live in two fields:
/// `productCode` (stable identifier) and `images` (deduplicated URL list);
/// everything else is carried as-is.
pub type ProductRecord = Map<String, Value>;

/// In-memory catalog keyed by product code. Loaded once at process start,
/// grown by insertion during a crawl, persisted wholesale at the end.
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: HashMap<String, ProductRecord>,
    initial_count: usize,
}

impl CatalogStore {
    /// Load the catalog from `path`, or start empty when the file is absent.
    /// A present-but-unparsable file is an error; silently replacing a
    /// corrupt catalog would discard every previous run.
    pub async fn load(path: &Path) -> AppResult<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(CatalogStore::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io_at(e, path))?;
        let products: HashMap<String, ProductRecord> = serde_json::from_str(&content)?;
        let initial_count = products.len();
        log(
            LogLevel::Info,
            &format!("Loaded {} products from {}", initial_count, path.display()),
        );

        Ok(CatalogStore {
            products,
            initial_count,
        })
    }

    pub fn contains(&self, product_code: &str) -> bool {
        self.products.contains_key(product_code)
    }

    /// Add a record under its code. Overwriting is refused: once a code is
    /// stored it is never re-fetched or mutated on later runs.
    pub fn insert(&mut self, product_code: String, record: ProductRecord) -> AppResult<()> {
        if self.products.contains_key(&product_code) {
            return Err(AppError::Store(format!(
                "Refusing to overwrite existing product '{}'",
                product_code
            )));
        }
        self.products.insert(product_code, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Entries added since load.
    pub fn delta(&self) -> usize {
        self.products.len().saturating_sub(self.initial_count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProductRecord)> {
        self.products.iter()
    }

    /// Persist the full catalog, overwriting `path`. Failure here is fatal
    /// for the run; this is its only persistence point.
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        io::save_json_pretty(path, self.products.clone()).await?;
        log(
            LogLevel::Info,
            &format!("Saved {} products to {}", self.products.len(), path.display()),
        );
        log(
            LogLevel::Info,
            &format!("Added {} new products", self.delta()),
        );
        Ok(())
    }
}
