use url::Url;

/// Resolves a raw href against the start URL
///
/// Returns `None` for empty hrefs and hrefs the URL parser rejects. The
/// result is the serialized absolute URL, which is what the frontier
/// deduplicates on.
///
/// # Examples
///
/// ```
/// use site_harvest::url::absolutize;
/// use url::Url;
///
/// let start = Url::parse("https://example.com/home/").unwrap();
/// assert_eq!(absolutize(&start, "../rooms").as_deref(), Some("https://example.com/rooms"));
/// assert_eq!(absolutize(&start, "https://other.org/x").as_deref(), Some("https://other.org/x"));
/// ```
pub fn absolutize(start_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    start_url.join(href).ok().map(|url| url.to_string())
}
