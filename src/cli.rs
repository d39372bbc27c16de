use crate::config::{self, CrawlConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Incrementally crawls a paginated product API into a local catalog and downloads product images.",
    long_about = None
)]
pub struct CliArgs {
    #[arg(
        long,
        default_value = config::DEFAULT_CATALOG_PATH,
        value_name = "FILE_PATH",
        help = "Path to the catalog JSON file"
    )]
    catalog_path: String,

    #[arg(
        long,
        num_args = 1..,
        value_name = "CATEGORY",
        help = "Category codes to process (defaults to the built-in allow-list)"
    )]
    categories: Vec<String>,

    #[arg(
        short = 'l',
        long,
        num_args = 1..,
        value_name = "LANG_CODE",
        help = "Site language codes to crawl (e.g. us/en)"
    )]
    lang_code: Vec<String>,

    #[arg(
        long,
        default_value = config::DEFAULT_LANGUAGE,
        help = "Target language for translation selection"
    )]
    language: String,

    #[arg(long, help = "Fetch and merge product details for each new product")]
    product_details: bool,

    #[arg(
        long,
        value_name = "FILE_PATH",
        help = "Alternate save destination for the catalog"
    )]
    save_path: Option<String>,

    #[arg(
        long,
        help = "Download images for stored products instead of crawling"
    )]
    download_images: bool,

    #[arg(
        long,
        value_name = "FILE_PATH",
        help = "Run in test mode: transform a local detail JSON file and exit",
        conflicts_with = "download_images"
    )]
    test_detail_file: Option<String>,

    #[arg(
        long,
        default_value = "test_output.json",
        value_name = "OUTPUT_FILE",
        help = "Output file name for test mode",
        requires = "test_detail_file"
    )]
    test_output_file: String,
}

impl CliArgs {
    pub fn to_config(&self) -> CrawlConfig {
        let mut cfg = CrawlConfig {
            catalog_path: PathBuf::from(&self.catalog_path),
            language: self.language.clone(),
            product_details: self.product_details,
            save_path: self.save_path.as_deref().map(PathBuf::from),
            ..CrawlConfig::default()
        };
        if !self.categories.is_empty() {
            cfg.categories = self.categories.clone();
        }
        if !self.lang_code.is_empty() {
            cfg.lang_codes = self.lang_code.clone();
        }
        cfg
    }

    pub fn download_images(&self) -> bool {
        self.download_images
    }

    pub fn get_test_detail_file(&self) -> Option<PathBuf> {
        self.test_detail_file.as_deref().map(PathBuf::from)
    }

    pub fn get_test_output_file(&self) -> PathBuf {
        PathBuf::from(&self.test_output_file)
    }
}
