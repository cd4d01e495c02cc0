// source/mod.rs — Feed 抽象
// 把 RSS、Atom、JSON Feed、Tumblr 照片 API 几种方言统一成同一组能力：
// 长度、按索引访问、顺序遍历、链接提取，以及在此之上的 top / random 选图。

pub mod caption;
pub mod syndication;
pub mod tumblr;

use std::sync::Arc;

use rand::Rng;

use crate::error::{AppError, AppResult};
use crate::http::Fetcher;
use tumblr::Post;

/// random() 的最大尝试次数 = round(条目数 × 该系数)
///
/// 保证在几乎没有可提取条目的 feed 上也会终止；代价是即使存在可提取条目也可能返回空。
pub const RANDOM_ATTEMPT_FACTOR: f64 = 1.5;

/// Tumblr 帖子的链接提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoPolicy {
    /// 取 max-width 最大的 photo-url
    LargestPhoto,
    /// 取 caption 中的高清链接，`sfw` 为真时优先安全版本
    CaptionLink { sfw: bool },
}

/// feed 方言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
    Json,
    Tumblr(PhotoPolicy),
}

impl FeedKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeedKind::Rss => "RSS",
            FeedKind::Atom => "Atom",
            FeedKind::Json => "JSON Feed",
            FeedKind::Tumblr(_) => "Tumblr",
        }
    }
}

/// feed 中的一个条目
#[derive(Debug, Clone)]
pub enum Entry {
    Syndication(Box<feed_rs::model::Entry>),
    Post(Post),
}

impl Entry {
    pub fn id(&self) -> &str {
        match self {
            Entry::Syndication(entry) => &entry.id,
            Entry::Post(post) => &post.id,
        }
    }
}

/// 已抓取并解析的 feed，构造后不可变
pub struct Feed {
    url: String,
    kind: FeedKind,
    /// RSS/Atom 为全部条目；Tumblr 仅为首次请求缓存的那一批
    entries: Vec<Entry>,
    /// 条目总数；Tumblr 取自 posts@total，运行期间不再校验
    len: usize,
    fetcher: Arc<dyn Fetcher>,
}

impl Feed {
    /// 抓取并解析 `url`：先按 RSS/Atom/JSON Feed 解析，失败后再尝试 Tumblr API 响应
    ///
    /// `policy` 只在文档是 Tumblr API 响应时生效
    pub async fn open(fetcher: Arc<dyn Fetcher>, url: &str, policy: PhotoPolicy) -> AppResult<Feed> {
        let bytes = fetcher.fetch(url).await?;

        let (kind, entries, len) = match syndication::parse(&bytes) {
            Ok((kind, entries)) => {
                let entries: Vec<Entry> = entries
                    .into_iter()
                    .map(|entry| Entry::Syndication(Box::new(entry)))
                    .collect();
                let len = entries.len();
                (kind, entries, len)
            }
            Err(unsupported) => match tumblr::parse(&bytes) {
                Ok(page) => {
                    let cached = page
                        .posts
                        .into_iter()
                        .take(tumblr::CACHED_POSTS.min(page.total))
                        .map(Entry::Post)
                        .collect();
                    (FeedKind::Tumblr(policy), cached, page.total)
                }
                Err(e) => {
                    tracing::debug!(url, error = %e, "not a Tumblr API response either");
                    return Err(unsupported);
                }
            },
        };

        let feed = Feed {
            url: url.to_string(),
            kind,
            entries,
            len,
            fetcher,
        };
        tracing::debug!(url, kind = feed.kind().name(), len, cached = feed.entries.len(), "feed opened");
        Ok(feed)
    }

    /// 打开某个 Tumblr 博客的照片帖子 feed
    pub async fn tumblr(fetcher: Arc<dyn Fetcher>, blog: &str, policy: PhotoPolicy) -> AppResult<Feed> {
        Self::open(fetcher, &tumblr::api_url(blog), policy).await
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 按索引取条目，负数从末尾倒数
    ///
    /// Tumblr 超出缓存批次的索引会单独请求一个只含该帖子的窗口
    pub async fn entry_at(&self, index: isize) -> AppResult<Entry> {
        let position = resolve_index(index, self.len)?;

        if let Some(entry) = self.entries.get(position) {
            return Ok(entry.clone());
        }

        match self.kind {
            FeedKind::Tumblr(_) => self
                .window(position, 1)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| AppError::MalformedFeed(format!("post {} missing from API window", position))),
            // 其余方言的 len 就是 entries 的长度，不会走到这里
            FeedKind::Rss | FeedKind::Atom | FeedKind::Json => {
                Err(AppError::IndexOutOfRange { index, len: self.len })
            }
        }
    }

    /// 按 feed 顺序返回全部条目
    pub async fn entries(&self) -> AppResult<Vec<Entry>> {
        let mut all = Vec::with_capacity(self.len);
        self.scan(|entry| {
            all.push(entry.clone());
            None::<()>
        })
        .await?;
        Ok(all)
    }

    /// 从条目中提取图片链接
    pub fn extract(&self, entry: &Entry) -> Option<String> {
        match entry {
            Entry::Syndication(entry) => syndication::entry_link(entry),
            Entry::Post(post) => match self.kind {
                FeedKind::Tumblr(PhotoPolicy::CaptionLink { sfw }) => caption::caption_link(post, sfw),
                _ => tumblr::largest_photo(post),
            },
        }
    }

    /// 按顺序找到的第一个可提取链接
    pub async fn top(&self) -> AppResult<Option<String>> {
        self.scan(|entry| self.extract(entry)).await
    }

    /// 随机抽取条目直到提取成功，最多尝试 `random_attempts(len)` 次
    pub async fn random(&self) -> AppResult<Option<String>> {
        let attempts = random_attempts(self.len);

        for attempt in 1..=attempts {
            let index = rand::thread_rng().gen_range(0..self.len);
            let entry = self.entry_at(index as isize).await?;
            if let Some(url) = self.extract(&entry) {
                tracing::debug!(index, attempt, id = entry.id(), "random pick succeeded");
                return Ok(Some(url));
            }
        }

        tracing::debug!(attempts, "random pick gave up");
        Ok(None)
    }

    /// 按顺序访问条目，`visit` 返回 Some 时立即停止
    ///
    /// Tumblr 先遍历缓存批次，之后从缓存末尾开始按 WINDOW_SIZE 分页请求，
    /// 窗口起点为 `cached + k × WINDOW_SIZE`。
    async fn scan<T>(&self, mut visit: impl FnMut(&Entry) -> Option<T>) -> AppResult<Option<T>> {
        for entry in &self.entries {
            if let Some(hit) = visit(entry) {
                return Ok(Some(hit));
            }
        }

        if !matches!(self.kind, FeedKind::Tumblr(_)) {
            return Ok(None);
        }

        let mut start = self.entries.len();
        while start < self.len {
            let window = self.window(start, tumblr::WINDOW_SIZE).await?;
            if window.is_empty() {
                tracing::warn!(start, total = self.len, "API returned an empty window, stopping early");
                break;
            }

            let remaining = self.len - start;
            for entry in window.iter().take(remaining) {
                if let Some(hit) = visit(entry) {
                    return Ok(Some(hit));
                }
            }
            start += tumblr::WINDOW_SIZE;
        }

        Ok(None)
    }

    async fn window(&self, start: usize, num: usize) -> AppResult<Vec<Entry>> {
        let url = tumblr::window_url(&self.url, start, num)?;
        tracing::debug!(start, num, "fetching post window");

        let bytes = self.fetcher.fetch(&url).await?;
        let page = tumblr::parse(&bytes)?;
        Ok(page.posts.into_iter().map(Entry::Post).collect())
    }
}

/// 把可能为负的索引换算成 `[0, len)` 内的位置
pub fn resolve_index(index: isize, len: usize) -> AppResult<usize> {
    let signed_len = len as isize;
    let position = if index < 0 { index + signed_len } else { index };

    if position < 0 || position >= signed_len {
        return Err(AppError::IndexOutOfRange { index, len });
    }
    Ok(position as usize)
}

pub fn random_attempts(len: usize) -> usize {
    (len as f64 * RANDOM_ATTEMPT_FACTOR).round() as usize
}
