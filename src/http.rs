// http.rs — HTTP 抓取接口
// Feed 与下载器都只依赖 Fetcher trait，测试中用 mock 替换真实网络

use crate::error::AppResult;
use async_trait::async_trait;

/// 按 URL 取回完整响应体
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>>;
}

/// 基于 reqwest 的实现
///
/// 不设置超时，沿用 reqwest 的默认行为
pub struct HttpFetcher {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
        tracing::debug!(url, "GET");

        // 非 2xx 状态码同样视为网络错误
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        tracing::debug!(url, len = bytes.len(), "response received");
        Ok(bytes.to_vec())
    }
}
