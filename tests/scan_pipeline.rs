//! End-to-end resolver scenarios over a canned fetcher.

use async_trait::async_trait;
use parking_lot::Mutex;
use sitemap_scanner::fetch_queue::{FetchQueue, FetchQueueConfig};
use sitemap_scanner::network::{Fetch, FetchError};
use sitemap_scanner::resolver::{ResolveError, ResolverConfig, SitemapResolver};
use sitemap_scanner::{ParseError, UrlType};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Serves canned bodies keyed by normalized URL and counts every fetch
struct StubFetcher {
    responses: HashMap<String, Result<String, FetchError>>,
    fetch_counts: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fetch_counts: Mutex::new(HashMap::new()),
        }
    }

    fn with_body(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), Err(error));
        self
    }

    fn count(&self, url: &str) -> usize {
        self.fetch_counts.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetch for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        *self.fetch_counts.lock().entry(url.to_string()).or_insert(0) += 1;
        match self.responses.get(url) {
            Some(response) => response.clone(),
            None => Err(FetchError::Status(404)),
        }
    }
}

fn resolver_for(fetcher: Arc<StubFetcher>) -> SitemapResolver {
    resolver_with(fetcher, ResolverConfig::default())
}

fn resolver_with(fetcher: Arc<StubFetcher>, config: ResolverConfig) -> SitemapResolver {
    let queue = Arc::new(FetchQueue::with_config(FetchQueueConfig::default()));
    SitemapResolver::with_config(fetcher, queue, config)
}

fn urlset(locs: &[&str]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for loc in locs {
        body.push_str(&format!("<url><loc>{loc}</loc></url>"));
    }
    body.push_str("</urlset>");
    body
}

fn sitemapindex(locs: &[&str]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for loc in locs {
        body.push_str(&format!("<sitemap><loc>{loc}</loc></sitemap>"));
    }
    body.push_str("</sitemapindex>");
    body
}

#[tokio::test(start_paused = true)]
async fn scan_of_flat_urlset_classifies_and_counts() {
    let fetcher = Arc::new(StubFetcher::new().with_body(
        "https://example.com/sitemap.xml",
        &urlset(&[
            "https://example.com/sitemap_product_7.xml",
            "https://example.com/category/shoes",
            "https://example.com/about-us",
        ]),
    ));

    let result = resolver_for(Arc::clone(&fetcher))
        .resolve("https://example.com/sitemap.xml")
        .await
        .unwrap();

    assert!(!result.is_sitemap_index);
    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.by_type[&UrlType::Product], 1);
    assert_eq!(result.stats.by_type[&UrlType::Category], 1);
    assert_eq!(result.stats.by_type[&UrlType::Page], 1);
    assert_eq!(result.stats.by_type[&UrlType::Blog], 0);
}

#[tokio::test(start_paused = true)]
async fn scan_of_index_aggregates_children_in_order() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .with_body(
                "https://shop.example/sitemap.xml",
                &sitemapindex(&[
                    "https://shop.example/sitemap_product_1.xml",
                    "https://shop.example/sitemap_product_2.xml",
                ]),
            )
            .with_body(
                "https://shop.example/sitemap_product_1.xml",
                &urlset(&[
                    "https://shop.example/product/a",
                    "https://shop.example/product/b",
                ]),
            )
            .with_body(
                "https://shop.example/sitemap_product_2.xml",
                &urlset(&[
                    "https://shop.example/product/c",
                    "https://shop.example/product/d",
                ]),
            ),
    );

    let result = resolver_for(Arc::clone(&fetcher))
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    assert!(result.is_sitemap_index);
    assert_eq!(result.stats.total, 4);
    assert_eq!(result.stats.by_type[&UrlType::Product], 4);

    // Output order follows the order children were listed in the index
    let products: Vec<&str> = result.urls[&UrlType::Product]
        .iter()
        .map(|u| u.loc.as_str())
        .collect();
    assert_eq!(
        products,
        vec![
            "https://shop.example/product/a",
            "https://shop.example/product/b",
            "https://shop.example/product/c",
            "https://shop.example/product/d",
        ]
    );

    // Each sitemap document was fetched exactly once
    assert_eq!(fetcher.count("https://shop.example/sitemap.xml"), 1);
    assert_eq!(fetcher.count("https://shop.example/sitemap_product_1.xml"), 1);
    assert_eq!(fetcher.count("https://shop.example/sitemap_product_2.xml"), 1);
}

#[tokio::test(start_paused = true)]
async fn duplicate_leaf_across_siblings_counted_once() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .with_body(
                "https://shop.example/sitemap.xml",
                &sitemapindex(&[
                    "https://shop.example/sitemap_product_1.xml",
                    "https://shop.example/sitemap_product_2.xml",
                ]),
            )
            .with_body(
                "https://shop.example/sitemap_product_1.xml",
                &urlset(&["https://shop.example/product/same-bag"]),
            )
            .with_body(
                "https://shop.example/sitemap_product_2.xml",
                // Same product, trailing slash variant
                &urlset(&["https://shop.example/product/same-bag/"]),
            ),
    );

    let result = resolver_for(fetcher)
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    assert_eq!(result.stats.total, 1);
    assert_eq!(result.stats.by_type[&UrlType::Product], 1);
}

#[tokio::test(start_paused = true)]
async fn cyclic_index_references_terminate() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .with_body(
                "https://shop.example/sitemap.xml",
                &sitemapindex(&[
                    "https://shop.example/sitemap_b.xml",
                    "https://shop.example/sitemap_leaf.xml",
                ]),
            )
            .with_body(
                "https://shop.example/sitemap_b.xml",
                // Points back at the root and forward to the leaf
                &sitemapindex(&[
                    "https://shop.example/sitemap.xml",
                    "https://shop.example/sitemap_leaf.xml",
                ]),
            )
            .with_body(
                "https://shop.example/sitemap_leaf.xml",
                &urlset(&[
                    "https://shop.example/product/a",
                    "https://shop.example/product/b",
                ]),
            ),
    );

    let result = resolver_for(Arc::clone(&fetcher))
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    assert_eq!(result.stats.by_type[&UrlType::Product], 2);
    // The cycle back to the root was not re-fetched, and the leaf was
    // fetched only once despite being referenced twice
    assert_eq!(fetcher.count("https://shop.example/sitemap.xml"), 1);
    assert_eq!(fetcher.count("https://shop.example/sitemap_leaf.xml"), 1);
}

#[tokio::test(start_paused = true)]
async fn broken_child_sitemap_is_contained() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .with_body(
                "https://shop.example/sitemap.xml",
                &sitemapindex(&[
                    "https://shop.example/sitemap_dead.xml",
                    "https://shop.example/sitemap_ok.xml",
                ]),
            )
            .with_error(
                "https://shop.example/sitemap_dead.xml",
                FetchError::Status(404),
            )
            .with_body(
                "https://shop.example/sitemap_ok.xml",
                &urlset(&["https://shop.example/product/a"]),
            ),
    );

    let result = resolver_for(fetcher)
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    // Partial success: the healthy sibling still contributes
    assert_eq!(result.stats.total, 1);
    assert_eq!(result.stats.by_type[&UrlType::Product], 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_xml_recovered_by_fallback() {
    // Unescaped ampersand plus a self-closing <url/>; the sanitizer and
    // fallback scan still extract the usable loc values
    let broken = r#"<?xml version="1.0"?><urlset>
        <url/>
        <url><loc>https://shop.example/product/a?x=1&y=2</loc></url>
        <url><loc>https://shop.example/about-us</loc></url>
    </urlset>"#;

    let fetcher =
        Arc::new(StubFetcher::new().with_body("https://shop.example/sitemap.xml", broken));

    let result = resolver_for(fetcher)
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    assert_eq!(result.stats.total, 2);
    assert_eq!(result.stats.by_type[&UrlType::Product], 1);
    assert_eq!(result.stats.by_type[&UrlType::Page], 1);
}

#[tokio::test(start_paused = true)]
async fn leaf_cap_sets_truncated_flag() {
    let locs: Vec<String> = (0..12)
        .map(|i| format!("https://shop.example/product/item-{i}"))
        .collect();
    let loc_refs: Vec<&str> = locs.iter().map(|s| s.as_str()).collect();

    let fetcher = Arc::new(
        StubFetcher::new().with_body("https://shop.example/sitemap.xml", &urlset(&loc_refs)),
    );

    let config = ResolverConfig {
        max_urls: 10,
        ..ResolverConfig::default()
    };
    let result = resolver_with(fetcher, config)
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    assert!(result.truncated);
    assert_eq!(result.stats.total, 10);
    // The first ten in document order survive
    assert_eq!(
        result.urls[&UrlType::Product][0].loc,
        "https://shop.example/product/item-0"
    );
}

#[tokio::test(start_paused = true)]
async fn advanced_scan_populates_details_and_degrades() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .with_body(
                "https://shop.example/sitemap.xml",
                &urlset(&[
                    "https://shop.example/product/blue-bag",
                    "https://shop.example/product/red-bag",
                    "https://shop.example/about-us",
                ]),
            )
            .with_body(
                "https://shop.example/product/blue-bag",
                r#"<html><head><title>Shop</title></head><body>
                    <h1>Blue Canvas Bag</h1>
                    <span itemprop="price">149,90 TL</span>
                </body></html>"#,
            )
            .with_error(
                "https://shop.example/product/red-bag",
                FetchError::Status(404),
            ),
    );

    let config = ResolverConfig {
        advanced: true,
        batch_size: 1,
        ..ResolverConfig::default()
    };
    let result = resolver_with(Arc::clone(&fetcher), config)
        .resolve("https://shop.example/sitemap.xml")
        .await
        .unwrap();

    let products = &result.urls[&UrlType::Product];
    assert_eq!(products.len(), 2);

    let details = products[0].details.as_ref().expect("details missing");
    assert_eq!(details.title.as_deref(), Some("Blue Canvas Bag"));
    assert_eq!(details.price.as_deref(), Some("149,90"));

    // An unreachable product page degrades to no details, not a failure
    assert!(products[1].details.is_none());
    // Plain pages are never fetched for enrichment
    assert!(result.urls[&UrlType::Page][0].details.is_none());
    assert_eq!(fetcher.count("https://shop.example/about-us"), 0);
}

#[tokio::test(start_paused = true)]
async fn unreachable_root_propagates_fetch_error() {
    let fetcher = Arc::new(StubFetcher::new().with_error(
        "https://shop.example/sitemap.xml",
        FetchError::ConnectionRefused,
    ));

    let result = resolver_for(fetcher)
        .resolve("https://shop.example/sitemap.xml")
        .await;

    assert!(matches!(
        result,
        Err(ResolveError::Fetch(FetchError::ConnectionRefused))
    ));
}

#[tokio::test(start_paused = true)]
async fn empty_root_is_no_urls_found() {
    let fetcher = Arc::new(StubFetcher::new().with_body(
        "https://shop.example/sitemap.xml",
        "<html><body>soft 404</body></html>",
    ));

    let result = resolver_for(fetcher)
        .resolve("https://shop.example/sitemap.xml")
        .await;

    assert!(matches!(
        result,
        Err(ResolveError::Parse(ParseError::NoUrlsFound))
    ));
}

#[tokio::test(start_paused = true)]
async fn invalid_root_url_rejected() {
    let fetcher = Arc::new(StubFetcher::new());
    let result = resolver_for(fetcher).resolve("not a url at all").await;
    assert!(matches!(result, Err(ResolveError::InvalidUrl(_))));
}

/// Fetcher that never responds within the deadline
struct StalledFetcher;

#[async_trait]
impl Fetch for StalledFetcher {
    async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(String::new())
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_surfaces_timeout_error() {
    let queue = Arc::new(FetchQueue::with_config(FetchQueueConfig::default()));
    let config = ResolverConfig {
        deadline: Duration::from_secs(30),
        ..ResolverConfig::default()
    };
    let resolver = SitemapResolver::with_config(Arc::new(StalledFetcher), queue, config);

    let result = resolver.resolve("https://shop.example/sitemap.xml").await;
    assert!(matches!(result, Err(ResolveError::DeadlineExceeded)));
}
