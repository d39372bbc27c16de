use catalog_update::cli::CliArgs;
use catalog_update::core::processor;
use catalog_update::error::{AppError, AppResult};
use catalog_update::logging::{log, setup_logging, LogLevel};
use catalog_update::testing;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tokio::runtime::Builder;

fn main() -> ExitCode {
    setup_logging();

    let cli_args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            log(LogLevel::Error, &format!("CLI Argument Error: {}", e));
            let _ = CliArgs::command().print_help();
            return ExitCode::from(2);
        }
    };

    let runtime = match Builder::new_multi_thread()
        .enable_all()
        .thread_name("catalog-worker")
        .worker_threads(num_cpus::get())
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log(
                LogLevel::Error,
                &format!("FATAL: Failed to build Tokio runtime: {}", e),
            );
            return ExitCode::FAILURE;
        }
    };

    let main_result: AppResult<i32> = runtime.block_on(async {
        let cfg = cli_args.to_config();

        if let Some(test_file_path) = cli_args.get_test_detail_file() {
            if !test_file_path.exists() {
                log(
                    LogLevel::Error,
                    &format!("Test input file not found: {}", test_file_path.display()),
                );
                return Err(AppError::Argument("Test input file not found.".to_string()));
            }
            let output_path = cli_args.get_test_output_file();
            match testing::test_detail_transform(&test_file_path, output_path, &cfg.language).await
            {
                Ok(()) => Ok(0),
                Err(e) => {
                    log(LogLevel::Error, &format!("Test mode failed: {:?}", e));
                    Ok(1)
                }
            }
        } else if cli_args.download_images() {
            processor::run_image_downloads(cfg).await
        } else {
            processor::run_crawl(cfg).await
        }
    });

    match main_result {
        Ok(exit_code) => ExitCode::from(exit_code as u8),
        Err(e) => {
            if !matches!(e, AppError::Argument(_)) {
                log(LogLevel::Error, &format!("FATAL UNEXPECTED ERROR: {:?}", e));
            }
            ExitCode::FAILURE
        }
    }
}
