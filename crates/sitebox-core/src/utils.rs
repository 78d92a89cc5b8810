//! Utility helpers for SiteBox

use url::Url;

/// Scheme, host and explicit port of an absolute URL, e.g. `https://example.com`.
///
/// Returns an empty string when the input has no host.
pub fn extract_domain(url: &str) -> String {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(_) => return String::new(),
    };

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}://{}:{}", parsed.scheme(), host, port),
        (Some(host), None) => format!("{}://{}", parsed.scheme(), host),
        (None, _) => String::new(),
    }
}
