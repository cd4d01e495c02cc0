// error.rs — 统一错误类型
// 所有模块都返回 AppResult，由 main 负责打印并设置退出码

use std::path::PathBuf;

use rust_i18n::t;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // 网络错误（feed 或图片请求失败、非 2xx 状态码）
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidFeedUrl(String),

    // 解析错误
    #[error("Unsupported feed format: {0}")]
    UnsupportedFeed(String),

    #[error("Malformed feed: {0}")]
    MalformedFeed(String),

    #[error("Post index {index} out of range (feed has {len} posts)")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("No image found in feed")]
    NoImageFound,

    // 下载目录被同名普通文件占用
    #[error("Target path exists and is not a directory: {}", .0.display())]
    TargetNotDirectory(PathBuf),

    #[error("Cannot derive a file name from image URL: {0}")]
    InvalidImageUrl(String),

    // 壁纸设置
    #[error("Unsupported desktop environment: {0}")]
    UnsupportedDesktop(String),

    #[error("{program} failed: {reason}")]
    SetterFailed { program: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 按当前语言输出给用户看的错误信息
    pub fn localized(&self) -> String {
        self.localized_in(&rust_i18n::locale())
    }

    pub fn localized_in(&self, locale: &str) -> String {
        let message = match self {
            AppError::Http(e) => t!("error_http", locale = locale, reason = e),
            AppError::Io(e) => t!("error_io", locale = locale, reason = e),
            AppError::InvalidFeedUrl(url) => t!("error_invalid_feed_url", locale = locale, url = url),
            AppError::UnsupportedFeed(reason) => t!("error_unsupported_feed", locale = locale, reason = reason),
            AppError::MalformedFeed(reason) => t!("error_malformed_feed", locale = locale, reason = reason),
            AppError::IndexOutOfRange { index, len } => {
                t!("error_index_out_of_range", locale = locale, index = index, len = len)
            }
            AppError::NoImageFound => t!("error_no_image", locale = locale),
            AppError::TargetNotDirectory(path) => {
                t!("error_target_not_dir", locale = locale, path = path.display())
            }
            AppError::InvalidImageUrl(url) => t!("error_invalid_image_url", locale = locale, url = url),
            AppError::UnsupportedDesktop(desktop) => {
                t!("error_unsupported_desktop", locale = locale, desktop = desktop)
            }
            AppError::SetterFailed { program, reason } => {
                t!("error_set_failed", locale = locale, program = program, reason = reason)
            }
            AppError::Config(reason) => t!("error_config", locale = locale, reason = reason),
        };
        message.to_string()
    }
}
