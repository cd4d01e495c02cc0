// syndication.rs — 通用 RSS / Atom / JSON Feed 方言
// 文档交给 feed-rs 解析（命名空间前缀、非 UTF-8 编码都由它处理），这里只负责挑链接

use feed_rs::model::{Entry, FeedType};

use crate::error::{AppError, AppResult};

use super::FeedKind;

/// 解析 feed 文档，返回方言与全部条目
pub fn parse(bytes: &[u8]) -> AppResult<(FeedKind, Vec<Entry>)> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| AppError::UnsupportedFeed(e.to_string()))?;

    let kind = match feed.feed_type {
        FeedType::Atom => FeedKind::Atom,
        FeedType::JSON => FeedKind::Json,
        _ => FeedKind::Rss,
    };
    Ok((kind, feed.entries))
}

/// 条目的第一个没有 rel 或 rel="alternate" 的链接
///
/// RSS 的 `<link>` 没有 rel，因此同样适用
pub fn entry_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .map(|link| link.href.trim())
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(xml: &[u8]) -> Vec<Option<String>> {
        let (_, entries) = parse(xml).unwrap();
        entries.iter().map(entry_link).collect()
    }

    #[test]
    fn test_rss_items_and_links() {
        let xml = br#"<rss version="2.0"><channel>
            <title>Photos</title>
            <item><title>one</title><link>http://x/img1.jpg</link></item>
            <item><title>two</title></item>
        </channel></rss>"#;

        let (kind, entries) = parse(xml).unwrap();
        assert_eq!(kind, FeedKind::Rss);
        assert_eq!(entries.len(), 2);
        assert_eq!(entry_link(&entries[0]).as_deref(), Some("http://x/img1.jpg"));
        assert_eq!(entry_link(&entries[1]), None);
    }

    #[test]
    fn test_atom_link_skips_non_alternate_relations() {
        let xml = br#"<feed xmlns="http://www.w3.org/2005/Atom">
            <id>urn:photos</id>
            <title>Photos</title>
            <link rel="self" href="http://x/feed.atom"/>
            <entry>
              <id>urn:1</id>
              <link rel="enclosure" href="http://x/big.jpg"/>
              <link href="http://x/post/1"/>
            </entry>
            <entry>
              <id>urn:2</id>
              <link rel="alternate" href="http://x/post/2"/>
            </entry>
            <entry>
              <id>urn:3</id>
              <link rel="replies" href="http://x/post/3#comments"/>
            </entry>
        </feed>"#;

        assert_eq!(
            links(xml),
            vec![
                Some("http://x/post/1".to_string()),
                Some("http://x/post/2".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_prefixed_atom_namespace() {
        let xml = br#"<a:feed xmlns:a="http://www.w3.org/2005/Atom">
            <a:id>urn:photos</a:id>
            <a:entry><a:id>urn:1</a:id><a:link href="http://x/a.jpg"/></a:entry>
        </a:feed>"#;

        let (kind, entries) = parse(xml).unwrap();
        assert_eq!(kind, FeedKind::Atom);
        assert_eq!(entry_link(&entries[0]).as_deref(), Some("http://x/a.jpg"));
    }

    #[test]
    fn test_latin1_encoded_rss() {
        let mut xml = br#"<?xml version="1.0" encoding="ISO-8859-1"?>
            <rss version="2.0"><channel><title>Photos</title><item><link>http://x/caf"#
            .to_vec();
        xml.push(0xe9);
        xml.extend_from_slice(b".jpg</link></item></channel></rss>");

        let link = links(&xml).remove(0).unwrap();
        assert!(!link.contains('\u{FFFD}'), "mangled link: {link}");
        assert!(link == "http://x/café.jpg" || link == "http://x/caf%C3%A9.jpg", "{link}");
    }

    #[test]
    fn test_non_feed_document_is_unsupported() {
        assert!(matches!(
            parse(b"<html><body>not a feed</body></html>"),
            Err(AppError::UnsupportedFeed(_))
        ));
    }
}
