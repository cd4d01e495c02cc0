// tumblr.rs — Tumblr v1 read API（/api/read?type=photo）
//
// 首次请求默认返回最新的 20 个帖子；更靠后的帖子需要带 start/num 参数分页请求。
// 响应结构：<tumblr><posts total="N"><post id="…"><photo-caption/><photo-url max-width="…"/>…

use serde::Deserialize;
use url::Url;

use crate::error::{AppError, AppResult};

/// 首次请求中缓存的帖子数
pub const CACHED_POSTS: usize = 20;

/// 遍历时每个分页窗口的帖子数
pub const WINDOW_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct TumblrDocument {
    posts: Posts,
}

#[derive(Debug, Deserialize)]
struct Posts {
    #[serde(rename = "@total")]
    total: usize,
    #[serde(rename = "post", default)]
    post: Vec<Post>,
}

/// 一个照片帖子
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    #[serde(rename = "@id", default)]
    pub id: String,
    /// caption 是转义后的 HTML 片段
    #[serde(rename = "photo-caption", default)]
    pub caption: Option<String>,
    #[serde(rename = "photo-url", default)]
    pub photos: Vec<PhotoUrl>,
}

/// 同一张图的某个分辨率版本
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoUrl {
    #[serde(rename = "@max-width", default)]
    pub max_width: Option<String>,
    #[serde(rename = "$text", default)]
    pub url: String,
}

/// 一次 API 响应：声明的帖子总数与本次返回的帖子
#[derive(Debug)]
pub struct Page {
    pub total: usize,
    pub posts: Vec<Post>,
}

/// 某个博客的照片帖子 API 地址
pub fn api_url(blog: &str) -> String {
    format!("https://{}.tumblr.com/api/read?type=photo", blog)
}

/// 从 `start` 开始取 `num` 个帖子的窗口地址，保留原有的查询参数
pub fn window_url(base: &str, start: usize, num: usize) -> AppResult<String> {
    let mut url = Url::parse(base).map_err(|e| AppError::InvalidFeedUrl(format!("{}: {}", base, e)))?;
    url.query_pairs_mut()
        .append_pair("start", &start.to_string())
        .append_pair("num", &num.to_string());
    Ok(url.into())
}

/// 解析 API 响应
pub fn parse(bytes: &[u8]) -> AppResult<Page> {
    let document: TumblrDocument =
        quick_xml::de::from_reader(bytes).map_err(|e| AppError::MalformedFeed(e.to_string()))?;

    Ok(Page {
        total: document.posts.total,
        posts: document.posts.post,
    })
}

/// 多个分辨率版本中 max-width 最大的那张图，无法解析的宽度按 0 计
pub fn largest_photo(post: &Post) -> Option<String> {
    post.photos
        .iter()
        .filter(|photo| !photo.url.trim().is_empty())
        .max_by_key(|photo| {
            photo
                .max_width
                .as_deref()
                .and_then(|w| w.trim().parse::<u32>().ok())
                .unwrap_or(0)
        })
        .map(|photo| photo.url.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let base = api_url("theprofoundprogrammer");
        assert_eq!(
            base,
            "https://theprofoundprogrammer.tumblr.com/api/read?type=photo"
        );
        assert_eq!(
            window_url(&base, 70, 50).unwrap(),
            "https://theprofoundprogrammer.tumblr.com/api/read?type=photo&start=70&num=50"
        );
    }

    #[test]
    fn test_window_url_without_query() {
        assert_eq!(
            window_url("https://x.tumblr.com/api/read", 20, 50).unwrap(),
            "https://x.tumblr.com/api/read?start=20&num=50"
        );
        assert!(matches!(
            window_url("not a url", 0, 1),
            Err(AppError::InvalidFeedUrl(_))
        ));
    }

    #[test]
    fn test_parse_total() {
        let page = parse(br#"<tumblr><posts start="0" total="137"/></tumblr>"#).unwrap();
        assert_eq!(page.total, 137);
        assert!(page.posts.is_empty());

        assert!(matches!(
            parse(b"<tumblr><tumblelog/></tumblr>"),
            Err(AppError::MalformedFeed(_))
        ));
        assert!(matches!(
            parse(br#"<tumblr><posts total="lots"/></tumblr>"#),
            Err(AppError::MalformedFeed(_))
        ));
    }

    #[test]
    fn test_parse_posts() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <tumblr version="1.0">
              <tumblelog name="blog" title="Blog"/>
              <posts start="0" total="2">
                <post id="11" type="photo">
                  <photo-caption>&lt;a href="http://x/hd.png"&gt;HD Version&lt;/a&gt;</photo-caption>
                  <photo-url max-width="1280">http://x/11.jpg</photo-url>
                  <tag>motivation</tag>
                </post>
                <post id="10" type="photo"/>
              </posts>
            </tumblr>"#;

        let page = parse(xml).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.posts.len(), 2);

        let first = &page.posts[0];
        assert_eq!(first.id, "11");
        assert_eq!(
            first.caption.as_deref(),
            Some(r#"<a href="http://x/hd.png">HD Version</a>"#)
        );
        assert_eq!(first.photos[0].url, "http://x/11.jpg");

        assert_eq!(page.posts[1].id, "10");
        assert!(page.posts[1].photos.is_empty());
    }

    #[test]
    fn test_largest_photo_picks_max_width() {
        let page = parse(
            br#"<tumblr><posts total="1"><post id="1">
                <photo-url max-width="500">http://x/a_500.jpg</photo-url>
                <photo-url max-width="1280">http://x/a_1280.jpg</photo-url>
                <photo-url max-width="wide">http://x/a_wide.jpg</photo-url>
                <photo-url max-width="75">http://x/a_75sq.jpg</photo-url>
            </post></posts></tumblr>"#,
        )
        .unwrap();
        assert_eq!(largest_photo(&page.posts[0]).as_deref(), Some("http://x/a_1280.jpg"));
    }

    #[test]
    fn test_largest_photo_without_photos() {
        let post = Post {
            id: "1".to_string(),
            caption: Some("nothing".to_string()),
            photos: Vec::new(),
        };
        assert_eq!(largest_photo(&post), None);
    }
}
