use crate::logging::{log, LogLevel};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CategoryStats {
    pub ok: usize,
    pub fail: usize,
    pub skip_or_empty: usize,
    pub total_tasks: usize,
}

impl CategoryStats {
    pub fn add_ok(&mut self) {
        self.ok += 1;
    }
    pub fn add_fail(&mut self) {
        self.fail += 1;
    }
    pub fn add_skip(&mut self) {
        self.skip_or_empty += 1;
    }
}

pub type RunStats = BTreeMap<String, CategoryStats>;

const CATEGORIES_ORDER: [&str; 5] = [
    "Page Fetch",
    "Products",
    "Detail Fetch",
    "Image Download",
    "Save Catalog",
];

pub fn initialize_stats() -> RunStats {
    CATEGORIES_ORDER
        .iter()
        .map(|name| (name.to_string(), CategoryStats::default()))
        .collect()
}

pub fn print_summary(stats: &RunStats, duration: Duration) {
    let sep = "=".repeat(60);
    println!("\n{}\n{:^60}\n{}", sep, "Run Summary", sep);
    println!("Total Run Time:    {:.3?}", duration);
    println!("{}", "-".repeat(60));
    println!(
        "{:<17} {:<8} {:<12} {:<8} {:<8}",
        "Category", "OK", "Skip/Empty", "Fail", "Total"
    );
    println!("{}", "-".repeat(60));

    for &cat_name in &CATEGORIES_ORDER {
        if let Some(s) = stats.get(cat_name) {
            let total = if s.total_tasks > 0 {
                s.total_tasks
            } else {
                s.ok + s.skip_or_empty + s.fail
            };
            println!(
                "{:<17} {:<8} {:<12} {:<8} {:<8}",
                cat_name, s.ok, s.skip_or_empty, s.fail, total
            );
        }
    }
    println!("{}", sep);

    let total_failures: usize = stats.values().map(|s| s.fail).sum();
    if total_failures > 0 {
        log(
            LogLevel::Error,
            &format!(
                "Run completed with errors: {} task(s) failed. Check logs.",
                total_failures
            ),
        );
    } else {
        log(LogLevel::Success, "Run completed successfully.");
    }

    let end_ts_str = chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string();
    log(
        LogLevel::Step,
        &format!("--- Run Finished at {} ---", end_ts_str),
    );
}

pub fn determine_exit_code(stats: &RunStats) -> i32 {
    let any_failures = stats.values().any(|s| s.fail > 0);
    if any_failures {
        1
    } else {
        0
    }
}
