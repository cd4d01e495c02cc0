// caption.rs — 从图片说明的 HTML 中挑选高清链接
//
// Profound Programmer 的每个帖子在 caption 里附带 "HD Version" 链接，
// 部分帖子还有额外的 "HD Safe-For-Work Version" 链接。

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::tumblr::Post;

/// 安全版本链接文字
static SFW_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new("HD Safe-For-Work Version").expect("valid SFW marker regex"));

/// 通用高清链接文字
static HD_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new("HD Version").expect("valid HD marker regex"));

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// 从 Tumblr 帖子的 `<photo-caption>` 中提取链接
///
/// `sfw` 为真时优先返回安全版本；找不到时回退到通用高清链接，
/// 所以即使请求安全版本，也可能得到未经筛选的图片。
pub fn caption_link(post: &Post, sfw: bool) -> Option<String> {
    let caption = post.caption.as_deref()?;
    link_in_html(caption, sfw)
}

pub fn link_in_html(html: &str, sfw: bool) -> Option<String> {
    let fragment = Html::parse_fragment(html);

    let find = |marker: &Regex| {
        fragment
            .select(&ANCHOR)
            .find(|a| marker.is_match(&a.text().collect::<String>()))
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    };

    let preferred = if sfw { find(&*SFW_MARKER) } else { None };
    preferred.or_else(|| find(&*HD_MARKER))
}
