// config.rs — 配置管理模块
// 遵循 Unix 风格：从 ~/.config/profound-wallpapers/config.toml 读取默认值，
// 命令行参数优先于环境变量，环境变量优先于配置文件。

use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize};
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::source::PhotoPolicy;

/// 默认下载目录
pub const DEFAULT_TARGET_DIR: &str = "~/Pictures/Profound Programmer/";

/// 默认 Tumblr 博客
pub const DEFAULT_BLOG: &str = "theprofoundprogrammer";

/// 覆盖下载目录的环境变量
pub const TARGET_DIR_ENV: &str = "PROFOUND_WALLPAPERS_DIR";

/// 展开路径中的 ~ 和环境变量 ($HOME 等)
pub fn expand_path(path_str: &str) -> PathBuf {
    PathBuf::from(tilde(path_str).into_owned())
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
    #[serde(default)]
    source: SourceConfig,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct CommonConfig {
    /// 图片保存目录 (支持 ~ 展开)
    #[serde(default = "default_target_dir")]
    target_dir: String,
    /// 是否优先安全版本
    #[serde(default)]
    sfw: bool,
    /// 选图方式：top（最新）或 random（随机）
    #[serde(default)]
    selection: Selection,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            sfw: false,
            selection: Selection::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct SourceConfig {
    /// Tumblr 博客名
    #[serde(default = "default_blog")]
    blog: String,
    /// Tumblr 帖子的链接提取方式
    #[serde(default)]
    extraction: Extraction,
    /// 任意 RSS / Atom / Tumblr API 地址，设置后忽略 blog
    #[serde(default)]
    feed_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            blog: default_blog(),
            extraction: Extraction::default(),
            feed_url: None,
        }
    }
}

fn default_target_dir() -> String {
    DEFAULT_TARGET_DIR.to_string()
}
fn default_blog() -> String {
    DEFAULT_BLOG.to_string()
}

/// 选图方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    Top,
    Random,
}

/// Tumblr 帖子的链接提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Extraction {
    /// caption 中的 "HD Version" 链接
    #[default]
    Caption,
    /// 分辨率最大的 photo-url
    LargestPhoto,
}

/// 应用全局配置项（已合并配置文件与环境变量）
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 图片保存目录 (优先级：ENV > TOML)
    pub target_dir: PathBuf,
    pub sfw: bool,
    pub selection: Selection,
    pub blog: String,
    pub extraction: Extraction,
    pub feed_url: Option<String>,
    /// 配置文件所在路径
    pub config_path: PathBuf,
}

impl AppConfig {
    /// 从默认位置加载配置；文件不存在时使用默认值
    pub fn load() -> AppResult<Self> {
        let config_path = expand_path("~/.config/profound-wallpapers/config.toml");
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        let config_file = Self::load_config_from_file(config_path)?;
        let env_target = env::var(TARGET_DIR_ENV).ok().filter(|v| !v.is_empty());
        Ok(Self::from_parts(config_file, env_target, config_path))
    }

    fn from_parts(config_file: ConfigFile, env_target: Option<String>, config_path: &Path) -> Self {
        // 优先级：环境变量 > 配置文件内容
        let target = env_target.unwrap_or(config_file.common.target_dir);

        Self {
            target_dir: expand_path(&target),
            sfw: config_file.common.sfw,
            selection: config_file.common.selection,
            blog: config_file.source.blog,
            extraction: config_file.source.extraction,
            feed_url: config_file.source.feed_url,
            config_path: config_path.to_path_buf(),
        }
    }

    /// 解析 TOML 配置文件；文件不存在返回默认值，格式错误则报错
    fn load_config_from_file(path: &Path) -> AppResult<ConfigFile> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(ConfigFile::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// 按配置与 sfw 偏好得到 Tumblr 提取策略
    pub fn photo_policy(&self, sfw: bool) -> PhotoPolicy {
        match self.extraction {
            Extraction::Caption => PhotoPolicy::CaptionLink { sfw },
            Extraction::LargestPhoto => PhotoPolicy::LargestPhoto,
        }
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> AppResult<String> {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).map_err(|e| AppError::Config(e.to_string()))
    }
}
