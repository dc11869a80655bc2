#![allow(dead_code)]

use link_preview::{Fetcher, BROWSER_USER_AGENT};

/// Fetcher that talks to the mock server directly, whatever proxy the
/// environment configures.
pub fn local_fetcher() -> Fetcher {
    let client = reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(std::time::Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap();
    Fetcher::with_client(client)
}

pub const ARTICLE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Plain Title</title>
    <meta property="og:title" content="Open Graph Title">
    <meta property="og:site_name" content="Example Blog">
    <meta property="og:type" content="article">
</head>
<body>
    <p>First paragraph of the article with several words in it</p>
    <img src="/pics/a.png">
    <img src="b.png">
    <img src="//cdn.example.com/c.png">
</body>
</html>"#;
