// cli.rs — 命令行接口定义模块
// 单一命令，无子命令；未指定的选项回退到配置文件中的默认值

use clap::Parser;
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

use crate::config::{AppConfig, Selection};

/// 桌面壁纸更新工具
///
/// 从 theprofoundprogrammer.com（Tumblr）获取最新或随机的一张图片，
/// 下载到本地目录后设置为桌面壁纸。
#[derive(Parser, Debug)]
#[command(name = "profound-wallpapers")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(about = "Desktop updater of images sourced from theprofoundprogrammer.com")]
pub struct Cli {
    /// 优先使用安全版本 (Safe-For-Work)
    #[arg(short = 's', long, conflicts_with = "nsfw")]
    pub sfw: bool,

    /// 优先使用普通高清版本（默认）
    #[arg(short = 'n', long)]
    pub nsfw: bool,

    /// 随机挑选一张图片
    #[arg(short = 'r', long, conflicts_with = "top")]
    pub random: bool,

    /// 挑选最新的一张图片（默认）
    #[arg(short = 't', long)]
    pub top: bool,

    /// 使用任意 RSS / Atom / Tumblr API 地址代替配置的博客
    #[arg(long, value_name = "URL")]
    pub feed: Option<String>,

    /// 只下载，不设置壁纸
    #[arg(long)]
    pub no_set: bool,

    /// 按顺序列出 feed 中每个帖子提取到的链接，不下载
    #[arg(short = 'l', long, conflicts_with_all = ["random", "no_set"])]
    pub list: bool,

    /// 打印配置文件的 JSON Schema 后退出
    #[arg(long)]
    pub config_schema: bool,

    /// 生成 shell 补全脚本后退出（支持 bash, zsh, fish, elvish, powershell）
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// 图片保存目录（默认 ~/Pictures/Profound Programmer/）
    pub target: Option<String>,
}

/// 命令行与配置合并后的运行选项
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub sfw: bool,
    pub selection: Selection,
    pub feed_url: Option<String>,
    pub target_dir: std::path::PathBuf,
    pub set_background: bool,
    pub list: bool,
}

impl Cli {
    /// 命令行参数优先，其次是配置
    pub fn resolve(&self, config: &AppConfig) -> RunOptions {
        let sfw = if self.sfw {
            true
        } else if self.nsfw {
            false
        } else {
            config.sfw
        };

        let selection = if self.random {
            Selection::Random
        } else if self.top {
            Selection::Top
        } else {
            config.selection
        };

        let target_dir = self
            .target
            .as_deref()
            .map(crate::config::expand_path)
            .unwrap_or_else(|| config.target_dir.clone());

        RunOptions {
            sfw,
            selection,
            feed_url: self.feed.clone().or_else(|| config.feed_url.clone()),
            target_dir,
            set_background: !self.no_set,
            list: self.list,
        }
    }
}
