pub mod backoff;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod export;
pub mod extract;
pub mod fetch_queue;
pub mod logging;
pub mod models;
pub mod network;
pub mod resolver;
pub mod sanitizer;
pub mod sitemap_parser;
pub mod url_utils;

// Re-export main types for library usage
pub use classifier::classify_url;
pub use fetch_queue::{FetchQueue, FetchQueueConfig};
pub use models::{ClassifiedUrl, PageDetails, ResolutionResult, ScanStats, SitemapEntry, UrlType};
pub use network::{Fetch, FetchError, HttpClient};
pub use resolver::{ResolveError, ResolverConfig, SitemapResolver};
pub use sanitizer::sanitize_xml;
pub use sitemap_parser::{parse_sitemap, ParseError, ParseStrategy, ParsedSitemap, SitemapKind};
pub use url_utils::{normalize_scan_url, normalize_url};
