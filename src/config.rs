use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub const DEFAULT_CATALOG_PATH: &str = "catalog.json";
pub const MAX_DOWNLOAD_CONCUR: usize = 8;

pub const HTTP_TIMEOUT_SECONDS: u64 = 35;
pub const HTTP_CONNECT_TIMEOUT: u64 = 20;

const GRID_BASE_URL: &str = "https://www.gucci.com";
const CATALOG_API_BASE_URL: &str = "https://prod-catalog-api.guccidigital.io/v1";

/// Canonical rendering variant substituted into every image URL.
pub const IMAGE_STYLE: &str = "DarkGray_Center_0_0_2400x2400";

/// Placeholder token in media-endpoint URLs, replaced with the style constant.
pub const FORMAT_PLACEHOLDER: &str = "$format$";

/// Position of the style token in a '/'-split scheme-relative image URL
/// (`//host/media/<style>/...`).
pub const STYLE_SEGMENT_INDEX: usize = 4;

pub static DEFAULT_CATEGORIES: Lazy<Vec<String>> = Lazy::new(|| {
    vec!["women", "men", "jewelry-watches"]
        .into_iter()
        .map(String::from)
        .collect()
});

pub static DEFAULT_LANG_CODES: Lazy<Vec<String>> = Lazy::new(|| vec!["us/en".to_string()]);

pub const DEFAULT_LANGUAGE: &str = "en";

pub const USER_AGENT_VAL: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0";

/// Presentation-only listing fields removed after image normalization.
/// The three raw image fields go last; they are superseded by `images`.
pub static LISTING_DROP_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "showOutOfStockLabel",
        "showAvailableInStoreOnlyLabel",
        "videoBackgroundImage",
        "zoomImagePrimary",
        "zoomImageAlternate",
        "filterType",
        "nonTransactionalWebSite",
        "isDiyProduct",
        "inStockEntry",
        "inStoreStockEntry",
        "inStoreStockRegionalEntry",
        "visibleWithoutStock",
        "showSavedItemIcon",
        "type",
        "saleType",
        "fullPrice",
        "position",
        "isFavorite",
        "isOnlineExclusive",
        "isRegionalOnlineExclusive",
        "regionalOnlineExclusiveMsg",
        "isExclusiveSale",
        "label",
        "imgBase",
        "productName",
        "primaryImage",
        "alternateImage",
        "alternateGalleryImages",
    ]
    .iter()
    .cloned()
    .collect()
});

pub static DETAIL_DROP_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "assortments",
        "availability",
        "categories",
        "status",
        "variants",
        "project",
        "prices",
        "lastUpdated",
        "exotic",
        "genders",
        "materialCare",
        "styleCode",
        "language",
        "madeIn",
        "translations",
    ]
    .iter()
    .cloned()
    .collect()
});

pub static DETAIL_RENAME_KEYS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("editorialDescription", "editorial"),
        ("variationDescription", "variation"),
        ("departmentDescription", "department"),
        ("subDepartmentDescription", "subDepartment"),
        ("seasonDescription", "season"),
        ("detailParts", "details"),
    ])
});

/// Endpoint URL builders. Bases are injected so tests can point them at a
/// local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub grid_base: String,
    pub catalog_api_base: String,
}

impl Endpoints {
    pub fn production() -> Self {
        Endpoints {
            grid_base: GRID_BASE_URL.to_string(),
            catalog_api_base: CATALOG_API_BASE_URL.to_string(),
        }
    }

    pub fn grid_url(&self, lang_code: &str, category_code: &str, page: u64) -> String {
        format!(
            "{}/{}/c/productgrid?categoryCode={}&show=All&page={}",
            self.grid_base, lang_code, category_code, page
        )
    }

    pub fn detail_url(&self, product_code: &str) -> String {
        format!("{}/products/{}", self.catalog_api_base, product_code)
    }

    pub fn media_url(&self, product_code: &str) -> String {
        format!("{}/media/{}", self.catalog_api_base, product_code)
    }
}

/// Everything one crawl or image-download pass needs, resolved from the CLI.
/// Components take this by reference instead of reaching for globals.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub catalog_path: PathBuf,
    pub categories: Vec<String>,
    pub lang_codes: Vec<String>,
    pub language: String,
    pub product_details: bool,
    pub save_path: Option<PathBuf>,
    pub endpoints: Endpoints,
    pub user_agent: String,
    pub image_style: String,
}

impl CrawlConfig {
    /// Parent directory of the catalog file; product image directories are
    /// created as its children.
    pub fn catalog_root(&self) -> PathBuf {
        self.catalog_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            categories: DEFAULT_CATEGORIES.clone(),
            lang_codes: DEFAULT_LANG_CODES.clone(),
            language: DEFAULT_LANGUAGE.to_string(),
            product_details: false,
            save_path: None,
            endpoints: Endpoints::production(),
            user_agent: USER_AGENT_VAL.to_string(),
            image_style: IMAGE_STYLE.to_string(),
        }
    }
}
