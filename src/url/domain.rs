use url::Url;

/// Returns the authority a URL is scoped to: lowercase host plus any explicit port
///
/// Two URLs belong to the same crawl only when these strings are identical, so
/// `example.com`, `www.example.com` and `example.com:8080` are all distinct.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemapper::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
