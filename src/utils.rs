use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthChar;
use url::Url;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static ABSOLUTE_HTTP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").unwrap());

/// Safely truncate a string, ensuring it is not truncated in the middle of multi-byte characters
///
/// This function will:
/// 1. Correctly handle Unicode characters (including Chinese, emoji, etc.)
/// 2. Add ellipsis when maximum length is reached
/// 3. Ensure the output string's display width does not exceed the specified length
#[cfg_attr(not(feature = "logging"), allow(dead_code))]
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Removes every `<...>` tag from `text`. Text between tags is kept untouched.
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// `scheme://host[:port]` of `url`, without a trailing slash.
pub fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    Some(format!("{}://{host}{port}", url.scheme()))
}

/// Origin plus the path with its last segment removed, always ending in `/`.
pub fn directory_of(url: &Url) -> Option<String> {
    let origin = origin_of(url)?;
    let path = url.path();
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    Some(format!("{origin}{dir}"))
}

/// Turns an image reference found in a document into an absolute URL.
///
/// * `//cdn/x.png` gets an `https:` prefix
/// * `/x.png` is joined to the origin of `resolved_url`
/// * `http(s)://...` is kept as is
/// * anything else is joined to the directory of `resolved_url`
///
/// Returns `None` for an empty reference, for a reference with any other scheme
/// (`data:`, `javascript:`, ...), or when a relative reference meets a
/// `resolved_url` that has no host to anchor it.
pub fn resolve_image_src(src: &str, resolved_url: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    if src.starts_with("//") {
        return Some(format!("https:{src}"));
    }
    if ABSOLUTE_HTTP_RE.is_match(src) {
        return Some(src.to_string());
    }
    if SCHEME_RE.is_match(src) {
        return None;
    }

    let base = Url::parse(resolved_url).ok()?;
    if src.starts_with('/') {
        Some(format!("{}{src}", origin_of(&base)?))
    } else {
        Some(format!("{}{src}", directory_of(&base)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Hello, world!", 10), "Hello, ...");
        assert_eq!(truncate_str("你好，世界！", 8), "你好...");
        assert_eq!(truncate_str("Hello 你好！", 10), "Hello ...");
        assert_eq!(truncate_str("Hi!", 10), "Hi!");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>Bold</b> move"), "Bold move");
        assert_eq!(strip_tags("a <a href=\"/x\">link</a>."), "a link.");
        assert_eq!(strip_tags("plain"), "plain");
        assert_eq!(strip_tags("1 < 2"), "1 < 2");
    }

    #[test]
    fn test_directory_of() {
        let url = Url::parse("http://example.com/blog/post/index.html").unwrap();
        assert_eq!(directory_of(&url).unwrap(), "http://example.com/blog/post/");

        let url = Url::parse("http://example.com").unwrap();
        assert_eq!(directory_of(&url).unwrap(), "http://example.com/");

        let url = Url::parse("https://example.com:8443/a/b?q=1").unwrap();
        assert_eq!(directory_of(&url).unwrap(), "https://example.com:8443/a/");
    }

    #[test]
    fn test_resolve_image_src() {
        let base = "http://example.com/blog/post";
        assert_eq!(
            resolve_image_src("/pics/a.png", base).unwrap(),
            "http://example.com/pics/a.png"
        );
        assert_eq!(
            resolve_image_src("//cdn.example.com/c.png", base).unwrap(),
            "https://cdn.example.com/c.png"
        );
        assert_eq!(
            resolve_image_src("HTTPS://other.org/x.jpg", base).unwrap(),
            "HTTPS://other.org/x.jpg"
        );
        assert_eq!(
            resolve_image_src("b.png", "http://example.com/blog/post/index.html").unwrap(),
            "http://example.com/blog/post/b.png"
        );
        assert_eq!(resolve_image_src("  ", base), None);
        assert_eq!(resolve_image_src("data:image/png;base64,iVBORw0KGgo=", base), None);
        assert_eq!(resolve_image_src("javascript:void(0)", base), None);
        assert_eq!(
            resolve_image_src("img/a:b.png", base).unwrap(),
            "http://example.com/blog/img/a:b.png"
        );
        assert_eq!(resolve_image_src("b.png", "not a url"), None);
    }
}
