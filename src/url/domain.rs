use crate::{UrlError, UrlResult};
use url::Url;

/// Strips a leading literal `www.` from a host
///
/// Not public-suffix aware: `www.example.com` and
/// `example.com` compare equal, `shop.example.com` does not.
///
/// # Examples
///
/// ```
/// use site_harvest::url::normalize_domain;
///
/// assert_eq!(normalize_domain("www.example.com"), "example.com");
/// assert_eq!(normalize_domain("example.com"), "example.com");
/// assert_eq!(normalize_domain("shop.example.com"), "shop.example.com");
/// ```
pub fn normalize_domain(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Extracts the authority used for domain comparison
///
/// This is the lowercase host, followed by `:port` when the URL names a
/// port other than its scheme's default.
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Derives the normalized base domain of a start URL
///
/// # Errors
///
/// Fails if the URL does not parse, is not http(s), or has no host.
pub fn base_domain(start_url: &str) -> UrlResult<String> {
    let url = Url::parse(start_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let authority = extract_authority(&url).ok_or(UrlError::MissingDomain)?;
    Ok(normalize_domain(&authority).to_string())
}

/// Checks whether a (possibly relative) href belongs to the site
///
/// The href is resolved against the start URL first, so relative links are
/// always in-domain. Comparison is on the normalized authority.
pub fn is_in_domain(href: &str, base_domain: &str, start_url: &Url) -> bool {
    let Ok(absolute) = start_url.join(href) else {
        return false;
    };

    match extract_authority(&absolute) {
        Some(authority) => normalize_domain(&authority) == normalize_domain(base_domain),
        None => false,
    }
}
