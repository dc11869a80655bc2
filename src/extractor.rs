use crate::utils::{resolve_image_src, strip_tags};
use crate::{ImageRef, Preview};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

/// Upper bound, in characters, of the paragraph text a fallback description is cut from.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Marker appended to a description derived from a paragraph.
pub const ELLIPSIS: &str = "...";

// A tag is `<name`, then attributes, then `>`. A quote opens a value only right
// after `=`; such a value may contain `>`. Any other quote is plain text, so
// `alt=Joe's` or a doubled `""` does not swallow the following markup.
static META_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b(?:=\s*"[^"]*"|=\s*'[^']*'|[^>])*>"#).unwrap()
});

static IMG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b(?:=\s*"[^"]*"|=\s*'[^']*'|[^>])*>"#).unwrap()
});

// Unquoted values run to the next whitespace or `>` and may hold apostrophes.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>][^\s>]*))"#)
        .unwrap()
});

static OG_PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^og:([a-z_]+)$").unwrap());

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());

/// OpenGraph names that map onto typed `Preview` fields, or that would collide
/// with them once the extra map is flattened.
const RESERVED_PROPERTIES: [&str; 5] = ["title", "description", "image", "url", "images"];

/// Metadata extractor, responsible for turning a fetched document into a [`Preview`].
///
/// Extraction never fails: a document with nothing usable yields a preview whose
/// title is the resolved URL and whose other fields are empty.
#[derive(Clone)]
pub struct MetadataExtractor;

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, resolved_url: &str, body: &str) -> Preview {
        let mut properties = self.extract_og_properties(body);
        debug!(
            url = %resolved_url,
            og_properties = properties.len(),
            "Collected OpenGraph properties"
        );

        let title = properties
            .remove("title")
            .and_then(|t| clean_text(&t))
            .or_else(|| self.extract_title_tag(body))
            .unwrap_or_else(|| resolved_url.to_string());

        let description = properties
            .remove("description")
            .and_then(|d| clean_text(&d))
            .or_else(|| self.extract_paragraph_summary(body));

        let images = match properties.remove("image").and_then(|i| clean_text(&i)) {
            Some(og_image) => resolve_image_src(&og_image, resolved_url)
                .map(|src| vec![ImageRef { src }])
                .unwrap_or_default(),
            None => self.extract_images(body, resolved_url),
        };
        debug!(url = %resolved_url, images = images.len(), "Resolved image candidates");

        let extra = properties
            .into_iter()
            .filter(|(name, _)| !RESERVED_PROPERTIES.contains(&name.as_str()))
            .map(|(name, value)| (name, strip_tags(value.trim())))
            .collect();

        Preview {
            url: resolved_url.to_string(),
            title,
            description,
            images,
            extra,
        }
    }

    /// Every `<meta property="og:NAME" content="...">`, keyed by `NAME`.
    /// A later tag with the same name replaces an earlier one.
    fn extract_og_properties(&self, body: &str) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();

        for tag in META_TAG_RE.find_iter(body) {
            let attrs = parse_attributes(tag.as_str());
            let name = attrs
                .get("property")
                .and_then(|p| OG_PROPERTY_RE.captures(p.trim()))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());

            if let (Some(name), Some(content)) = (name, attrs.get("content")) {
                properties.insert(name, content.clone());
            }
        }

        properties
    }

    fn extract_title_tag(&self, body: &str) -> Option<String> {
        TITLE_RE
            .captures(body)
            .and_then(|c| c.get(1))
            .and_then(|m| clean_text(m.as_str()))
    }

    /// Summary cut from the first paragraph: at most [`DESCRIPTION_MAX_CHARS`]
    /// characters, last (possibly partial) word dropped, [`ELLIPSIS`] appended.
    fn extract_paragraph_summary(&self, body: &str) -> Option<String> {
        let inner = PARAGRAPH_RE.captures(body)?.get(1)?.as_str();
        let text = strip_tags(inner);
        let head: String = text.chars().take(DESCRIPTION_MAX_CHARS).collect();

        let mut words: Vec<&str> = head.split_whitespace().collect();
        words.pop();
        if words.is_empty() {
            return None;
        }

        Some(format!("{}{ELLIPSIS}", words.join(" ")))
    }

    fn extract_images(&self, body: &str, resolved_url: &str) -> Vec<ImageRef> {
        IMG_TAG_RE
            .find_iter(body)
            .filter_map(|tag| parse_attributes(tag.as_str()).remove("src"))
            .filter_map(|src| {
                let resolved = resolve_image_src(&strip_tags(&src), resolved_url);
                if resolved.is_none() {
                    debug!(src = %src, "Skipping image that cannot be made absolute");
                }
                resolved
            })
            .map(|src| ImageRef { src })
            .collect()
    }
}

/// Attribute map of a single start tag. Names are lower-cased; the first
/// occurrence of a repeated attribute wins, as in browsers.
fn parse_attributes(tag: &str) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    for caps in ATTR_RE.captures_iter(tag) {
        let name = caps[1].to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        attrs.entry(name).or_insert(value);
    }
    attrs
}

/// Tag-stripped, trimmed text, or `None` when nothing is left.
fn clean_text(raw: &str) -> Option<String> {
    let text = strip_tags(raw).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://example.com/blog/post";

    fn extract(body: &str) -> Preview {
        MetadataExtractor::new().extract(URL, body)
    }

    #[test]
    fn test_og_title_wins_over_title_tag() {
        let preview = extract(
            r#"<html><head><title>Fallback</title>
            <meta property="og:title" content="Open Graph Title"></head></html>"#,
        );
        assert_eq!(preview.title, "Open Graph Title");
    }

    #[test]
    fn test_attribute_order_and_quotes() {
        let preview = extract(r#"<meta content='Reversed' property='og:title' />"#);
        assert_eq!(preview.title, "Reversed");
    }

    #[test]
    fn test_empty_og_title_falls_back_to_title_tag() {
        let preview = extract(
            r#"<meta property="og:title" content=""><title> Page <b>Title</b> </title>"#,
        );
        assert_eq!(preview.title, "Page Title");
    }

    #[test]
    fn test_title_falls_back_to_url() {
        let preview = extract("<html><body>nothing here</body></html>");
        assert_eq!(preview.title, URL);
        assert_eq!(preview.url, URL);
        assert!(preview.description.is_none());
        assert!(preview.images.is_empty());
        assert!(preview.extra.is_empty());
    }

    #[test]
    fn test_extra_properties_are_preserved() {
        let preview = extract(
            r#"<meta property="og:site_name" content="Example <i>Site</i>">
            <meta property="og:type" content="article">
            <meta property="og:type" content="website">
            <meta property="og:url" content="http://example.com/canonical">
            <meta property="og:image:width" content="640">
            <meta property="OG:locale" content="en_US">
            <meta name="og:author" content="ignored">"#,
        );
        assert_eq!(preview.site_name(), Some("Example Site"));
        assert_eq!(preview.property("type"), Some("website"));
        assert_eq!(preview.extra.len(), 2);
    }

    #[test]
    fn test_meta_content_may_contain_angle_bracket() {
        let preview = extract(r#"<meta property="og:description" content="a > b">"#);
        assert_eq!(preview.description.as_deref(), Some("a > b"));
    }

    #[test]
    fn test_paragraph_description_drops_last_word() {
        let preview = extract("<p class=\"lead\">The <em>quick</em> brown fox jumps</p><p>Second</p>");
        assert_eq!(preview.description.as_deref(), Some("The quick brown fox..."));
    }

    #[test]
    fn test_long_paragraph_is_truncated() {
        let words: Vec<String> = (0..200).map(|i| format!("word{i}")).collect();
        let body = format!("<p>{}</p>", words.join(" "));
        let description = extract(&body).description.unwrap();

        assert!(description.ends_with(ELLIPSIS));
        let text = description.trim_end_matches(ELLIPSIS);
        assert!(text.chars().count() <= DESCRIPTION_MAX_CHARS);
        for word in text.split(' ') {
            assert!(words.contains(&word.to_string()), "partial word {word}");
        }
    }

    #[test]
    fn test_single_word_paragraph_gives_no_description() {
        assert!(extract("<p>Hello</p>").description.is_none());
        assert!(extract("<param name=x><p></p>").description.is_none());
    }

    #[test]
    fn test_og_image_is_sole_entry() {
        let preview = extract(
            r#"<meta property="og:image" content="http://x/a.png"><img src="/other.png">"#,
        );
        assert_eq!(
            preview.images,
            vec![ImageRef {
                src: "http://x/a.png".into()
            }]
        );
        assert!(preview.property("image").is_none());
    }

    #[test]
    fn test_img_tags_in_document_order() {
        let preview = extract(
            r#"<img src="/pics/a.png"><img alt="x" src='b.png'>
            <IMG data-src="lazy.png" SRC="//cdn.example.com/c.png">
            <img src="https://other.org/d.png"><img alt="no source">"#,
        );
        let srcs: Vec<&str> = preview.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(
            srcs,
            vec![
                "http://example.com/pics/a.png",
                "http://example.com/blog/b.png",
                "https://cdn.example.com/c.png",
                "https://other.org/d.png",
            ]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let body = r#"<title>T</title><meta property="og:type" content="x"><p>one two three</p><img src="a.png">"#;
        let first = extract(body);
        let second = extract(body);
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_apostrophe_in_unquoted_value_does_not_swallow_tags() {
        let preview = extract(
            "<meta name=author content=O'Brien>\n\
             <meta property=\"og:title\" content=\"Real Title\">\n\
             <p>It's a nice day outside</p>",
        );
        assert_eq!(preview.title, "Real Title");

        let preview = extract(r#"<img alt=Joe's src="/a.png"><img src="/b.png"><p>it's here</p>"#);
        let srcs: Vec<&str> = preview.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(
            srcs,
            vec!["http://example.com/a.png", "http://example.com/b.png"]
        );
    }

    #[test]
    fn test_doubled_quote_keeps_image() {
        let preview = extract(r#"<img src="/a.png"" alt="x"><img src="/b.png">"#);
        let srcs: Vec<&str> = preview.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(
            srcs,
            vec!["http://example.com/a.png", "http://example.com/b.png"]
        );
    }

    #[test]
    fn test_unquoted_og_content() {
        let preview = extract("<meta property=og:site_name content=O'Reilly>");
        assert_eq!(preview.site_name(), Some("O'Reilly"));
    }

    #[test]
    fn test_malformed_html_degrades() {
        let preview = extract("<title>Unclosed <meta property=\"og:title <p>text <img src=");
        assert_eq!(preview.title, URL);
        assert!(preview.images.is_empty());
    }
}
