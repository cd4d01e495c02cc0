// main.rs — 程序入口
// 负责初始化运行时与日志、解析命令行参数，并串起 feed → 选图 → 下载 → 设置壁纸

mod cli;
mod config;
mod download;
mod error;
mod http;
mod setter;
mod source;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales", fallback = "en");

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::generate; // 引入补全脚本生成函数
use rust_i18n::t;
use tracing_subscriber::EnvFilter;

use cli::{Cli, RunOptions};
use config::{AppConfig, Selection};
use error::{AppError, AppResult};
use http::{Fetcher, HttpFetcher};
use source::Feed;

/// 单线程运行时：所有请求依次等待，没有并发
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    // 诊断日志写到 stderr，默认只显示警告，可用 RUST_LOG 调整
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(
            shell,
            &mut Cli::command(),
            "profound-wallpapers",
            &mut std::io::stdout(),
        );
        return;
    }

    let result = if cli.config_schema {
        AppConfig::get_schema().map(|schema| println!("{}", schema))
    } else {
        handle_run(&cli).await
    };

    if let Err(e) = result {
        eprintln!("{}", t!("error", reason => e.localized()));
        std::process::exit(1);
    }
}

/// 读取配置、合并命令行参数，并准备好真实的 HTTP 客户端
async fn handle_run(cli: &Cli) -> AppResult<()> {
    let config = AppConfig::load()?;
    tracing::debug!(path = %config.config_path.display(), "configuration loaded");

    let options = cli.resolve(&config);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
    run(&options, &config, fetcher).await
}

/// feed → 选图 → 下载 → 设置壁纸；任何一步找不到图片都以 NoImageFound 结束
async fn run(options: &RunOptions, config: &AppConfig, fetcher: Arc<dyn Fetcher>) -> AppResult<()> {
    let policy = config.photo_policy(options.sfw);

    let feed = match options.feed_url.as_deref() {
        Some(url) => {
            println!("{}", t!("feed_start", source => url));
            Feed::open(Arc::clone(&fetcher), url, policy).await?
        }
        None => {
            println!("{}", t!("feed_start", source => &config.blog));
            Feed::tumblr(Arc::clone(&fetcher), &config.blog, policy).await?
        }
    };
    println!(
        "{}",
        t!("feed_loaded", url => feed.url(), kind => feed.kind().name(), count => feed.len())
    );

    if options.list {
        for (index, entry) in feed.entries().await?.iter().enumerate() {
            let link = feed.extract(entry).unwrap_or_else(|| t!("no_link").to_string());
            println!("{}", t!("feed_listing", index => index, url => link));
        }
        return Ok(());
    }

    if feed.is_empty() {
        return Err(AppError::NoImageFound);
    }

    let picked = match options.selection {
        Selection::Top => feed.top().await?,
        Selection::Random => {
            println!("{}", t!("random_pick"));
            feed.random().await?
        }
    };
    let image_url = picked.ok_or(AppError::NoImageFound)?;
    println!("{}", t!("image_selected", url => &image_url));

    let image_path = download::download(fetcher.as_ref(), &image_url, &options.target_dir).await?;
    println!("{}", t!("save_path", path => image_path.display()));

    if options.set_background {
        println!("{}", t!("setting_wallpaper"));
        let desktop = setter::set_from_path(&image_path)?;
        println!("{}", t!("set_done", desktop => desktop.name()));
    }

    Ok(())
}
