use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use price_ripple::url::extract_domain;
///
/// let url = Url::parse("https://www.alza.cz/iphone-15").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.alza.cz".to_string()));
///
/// let url = Url::parse("https://WWW.DATART.CZ/pracka").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.datart.cz".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the root page of the URL's origin (`scheme://host[:port]/`)
///
/// Warm-up requests go here, and warmed requests use it as their referer.
/// Returns None for opaque origins such as `data:` URLs.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use price_ripple::url::origin_root;
///
/// let url = Url::parse("https://www.alza.cz/iphone-15?dq=1").unwrap();
/// assert_eq!(origin_root(&url), Some("https://www.alza.cz/".to_string()));
/// ```
pub fn origin_root(url: &Url) -> Option<String> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/", origin.ascii_serialization()))
}
