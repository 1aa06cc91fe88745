/// Collapses every whitespace run to a single space and trims the ends
///
/// # Examples
///
/// ```
/// use site_harvest::extract::clean_text;
///
/// assert_eq!(clean_text("a\n\tb  c"), "a b c");
/// assert_eq!(clean_text("  Rooms &\r\n Rates  "), "Rooms & Rates");
/// assert_eq!(clean_text(""), "");
/// ```
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Like [`clean_text`], treating an absent value as empty
pub fn clean_optional_text(text: Option<&str>) -> String {
    text.map(clean_text).unwrap_or_default()
}
