//! URL utilities for consistent deduplication and scan-input handling.

use url::Url;

/// Canonicalize a URL for use as a deduplication key.
///
/// Parses the input as an absolute URL and strips a trailing slash from the
/// path (except the root path `/`). Input that cannot be parsed is returned
/// unchanged - callers must tolerate non-normalized fallbacks.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(parsed) => {
            let normalized = parsed.to_string();
            // The bare root path keeps its slash; anything deeper loses it
            if parsed.path() != "/" && normalized.ends_with('/') && !normalized.ends_with("//") {
                normalized[..normalized.len() - 1].to_string()
            } else {
                normalized
            }
        }
        Err(_) => raw.to_string(),
    }
}

/// Resolve a possibly-relative link against a base URL
pub fn resolve_against(base: &str, link: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(link).ok().map(|u| u.to_string())
}

/// Normalize a scan input URL (CLI convenience).
///
/// Adds an `https://` prefix for bare domains and appends `/sitemap.xml`
/// when the input does not already point at an XML document.
pub fn normalize_scan_url(input: &str) -> String {
    let trimmed = input.trim();

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    if with_scheme.to_lowercase().ends_with(".xml") {
        with_scheme
    } else {
        format!("{}/sitemap.xml", with_scheme.trim_end_matches('/'))
    }
}

/// Check that a URL is fetchable by the scanner (absolute, http or https)
pub fn is_fetchable_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
