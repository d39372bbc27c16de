use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use crate::utils;
use serde::Serialize;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

async fn write_file_async(fpath: &Path, data: &[u8]) -> AppResult<()> {
    let mut file = File::create(fpath)
        .await
        .map_err(|e| AppError::io_at(e, fpath))?;
    file.write_all(data)
        .await
        .map_err(|e| AppError::io_at(e, fpath))?;
    Ok(())
}

/// Serialize `data` as pretty-printed JSON and write it to `fpath`.
/// serde_json leaves non-ASCII characters unescaped, so the file stays
/// human-readable. Serialization runs on a blocking thread. The bytes go to
/// a sibling temp file first and are renamed into place, so a failed save
/// never truncates or removes an existing file at `fpath`.
pub async fn save_json_pretty<T>(fpath: &Path, data: T) -> AppResult<()>
where
    T: Serialize + Send + 'static,
{
    let bytes =
        utils::run_blocking(move || serde_json::to_vec_pretty(&data).map_err(AppError::from))
            .await?;

    let tmp_path = match fpath.file_name() {
        Some(name) => {
            let mut tmp_name = name.to_os_string();
            tmp_name.push(".tmp");
            fpath.with_file_name(tmp_name)
        }
        None => {
            return Err(AppError::Io(format!(
                "Invalid save path '{}': no file name",
                fpath.display()
            )))
        }
    };

    let result = match write_file_async(&tmp_path, &bytes).await {
        Ok(()) => fs::rename(&tmp_path, fpath)
            .await
            .map_err(|e| AppError::io_at(e, fpath)),
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        log(
            LogLevel::Error,
            &format!("Save JSON FAIL: {}. File: '{}'", e, fpath.display()),
        );
        if fs::try_exists(&tmp_path).await.unwrap_or(false) {
            let _ = fs::remove_file(&tmp_path).await;
        }
    }
    result
}

/// Trailing path segment of a URL, used as the on-disk image filename.
pub fn url_filename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Number of `.jpg` files directly inside `dir`. Zero when the directory
/// does not exist yet.
pub async fn count_jpg_files(dir: &Path) -> AppResult<usize> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(0);
    }
    let mut entries = fs::read_dir(dir).await.map_err(|e| AppError::io_at(e, dir))?;
    let mut count = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::io_at(e, dir))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jpg") {
            count += 1;
        }
    }
    Ok(count)
}
