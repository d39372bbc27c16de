use crate::error::{AppError, AppResult};
use crate::io;
use crate::logging::{log, LogLevel};
use crate::transform::detail;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Offline check of the detail transformation: read a raw detail response
/// from a local JSON file, run the trim/rename/translation-merge stage, and
/// write the result next to it. No network involved.
pub async fn test_detail_transform(
    input_path: &Path,
    output_path: PathBuf,
    language: &str,
) -> AppResult<()> {
    log(LogLevel::Info, "--- Running Detail Transform Test ---");
    log(
        LogLevel::Info,
        &format!("Input file: {}", input_path.display()),
    );
    log(
        LogLevel::Info,
        &format!("Output file: {}", output_path.display()),
    );

    let json_content = fs::read_to_string(input_path)
        .await
        .map_err(|e| AppError::io_at(e, input_path))?;
    let value: Value = serde_json::from_str(&json_content)?;
    let data = match value {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::Argument(
                "Test input file must contain a JSON object (detail endpoint format).".into(),
            ))
        }
    };

    log(LogLevel::Info, "Starting transformation...");
    let transformed = detail::transform_detail(data, language);
    log(
        LogLevel::Success,
        &format!("Transformation produced {} field(s).", transformed.len()),
    );

    io::save_json_pretty(&output_path, transformed).await?;
    log(
        LogLevel::Success,
        &format!(
            "Successfully saved transformed data to {}",
            output_path.display()
        ),
    );
    Ok(())
}
