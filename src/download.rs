// download.rs — 图片下载与本地缓存
// 目标目录中已存在同名文件即视为已下载，不做校验

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::http::Fetcher;

/// 确保 `target_dir` 存在并下载 `image_url`，返回本地路径
///
/// - `target_dir` 是普通文件时报错，不会发起下载
/// - 同名文件已存在时直接返回其路径
/// - 先写入 `<name>.part` 再重命名，写入失败时删除临时文件
pub async fn download(fetcher: &dyn Fetcher, image_url: &str, target_dir: &Path) -> AppResult<PathBuf> {
    prepare_dir(target_dir).await?;

    let destination = target_dir.join(file_name(image_url)?);
    if fs::try_exists(&destination).await? {
        tracing::debug!(path = %destination.display(), "already downloaded, skipping");
        return Ok(destination);
    }

    let bytes = fetcher.fetch(image_url).await?;

    let partial = destination.with_file_name(format!(
        "{}.part",
        destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));
    if let Err(e) = write_file(&partial, &bytes).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e);
    }
    fs::rename(&partial, &destination).await?;

    tracing::debug!(path = %destination.display(), len = bytes.len(), "image saved");
    Ok(destination)
}

/// 创建目标目录；路径被普通文件占用时报错
async fn prepare_dir(target_dir: &Path) -> AppResult<()> {
    match fs::metadata(target_dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AppError::TargetNotDirectory(target_dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %target_dir.display(), "creating target directory");
            fs::create_dir_all(target_dir).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let mut file = File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}

/// URL 路径的最后一段，作为本地文件名
pub fn file_name(image_url: &str) -> AppResult<String> {
    let parsed = Url::parse(image_url).map_err(|e| AppError::InvalidImageUrl(format!("{}: {}", image_url, e)))?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidImageUrl(image_url.to_string()))
}
