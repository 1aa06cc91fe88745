use url::Url;

/// Schemes that never lead to a crawlable page
const NON_NAVIGABLE_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "whatsapp:"];

/// Substrings marking sections and hosts the harvest never visits
const BLOCKED_PATTERNS: &[&str] = &[
    "/blog/",
    "/category/",
    "/tag/",
    "/author/",
    "/feed/",
    "/rss/",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
];

/// File extensions that are not HTML content
const NON_CONTENT_EXTENSIONS: &[&str] = &[
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".bmp",
    // archives
    ".zip", ".rar", ".gz", ".tar", ".7z",
    // stylesheets and scripts
    ".css", ".js",
    // documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    // media
    ".mp3", ".mp4", ".mov", ".avi",
];

/// Decides whether a URL should be left out of the frontier
///
/// A URL is skipped when it is empty, carries a fragment marker, uses a
/// non-navigable scheme, contains a blocklisted section or host, or its path
/// ends in a non-content file extension. All checks are case-insensitive.
///
/// # Examples
///
/// ```
/// use site_harvest::url::should_skip;
///
/// assert!(should_skip(""));
/// assert!(should_skip("https://example.com/#rooms"));
/// assert!(should_skip("MAILTO:info@example.com"));
/// assert!(should_skip("https://example.com/blog/summer"));
/// assert!(should_skip("https://example.com/brochure.PDF"));
/// assert!(!should_skip("https://example.com/rooms"));
/// ```
pub fn should_skip(url: &str) -> bool {
    if url.is_empty() {
        return true;
    }

    if url.contains('#') {
        return true;
    }

    let lower = url.to_lowercase();

    if NON_NAVIGABLE_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return true;
    }

    if BLOCKED_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
        return true;
    }

    let path = path_of(&lower);
    NON_CONTENT_EXTENSIONS
        .iter()
        .any(|extension| path.ends_with(extension))
}

/// Returns the path component, falling back to the text before any query
fn path_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split('?').next().unwrap_or(url).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_skip_table() {
        let cases: &[(&str, bool)] = &[
            // empty
            ("", true),
            // fragments
            ("#", true),
            ("#top", true),
            ("https://example.com/page#section", true),
            // schemes
            ("mailto:info@example.com", true),
            ("tel:+123456789", true),
            ("javascript:void(0)", true),
            ("whatsapp://send?phone=123", true),
            ("Tel:+123", true),
            ("JavaScript:alert(1)", true),
            // blocklisted sections
            ("https://example.com/blog/post-1", true),
            ("https://example.com/category/news", true),
            ("https://example.com/tag/beach", true),
            ("https://example.com/author/admin", true),
            ("https://example.com/feed/", true),
            ("https://example.com/rss/", true),
            ("https://example.com/BLOG/Post", true),
            // social hosts
            ("https://www.facebook.com/example", true),
            ("https://twitter.com/example", true),
            ("https://instagram.com/example", true),
            ("https://www.linkedin.com/company/example", true),
            // non-content extensions
            ("https://example.com/photo.jpg", true),
            ("https://example.com/photo.JPEG", true),
            ("https://example.com/logo.png", true),
            ("https://example.com/anim.gif", true),
            ("https://example.com/menu.pdf", true),
            ("https://example.com/pack.zip", true),
            ("https://example.com/site.css", true),
            ("https://example.com/app.js", true),
            ("https://example.com/app.js?v=3", true),
            ("/relative/brochure.docx", true),
            // content
            ("https://example.com/", false),
            ("https://example.com/rooms", false),
            ("https://example.com/contact-us/", false),
            ("https://example.com/page.html", false),
            ("https://example.com/data.json", false),
            ("https://example.com/blogging-tips", false),
            ("https://example.com/?page=2", false),
            ("/about", false),
        ];

        for (url, expected) in cases {
            assert_eq!(should_skip(url), *expected, "should_skip({:?})", url);
        }
    }

    #[test]
    fn test_extension_only_matches_path_end() {
        assert!(!should_skip("https://example.com/images.jpg/gallery"));
        assert!(!should_skip("https://example.com/css-guide"));
    }
}
