use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page type assigned to a discovered URL by the classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UrlType {
    /// Product detail page
    Product,
    /// Category / collection listing page
    Category,
    /// Blog post or article
    Blog,
    /// Blog tag listing page
    Tag,
    /// Anything else (home, about, contact, ...)
    Page,
}

impl UrlType {
    /// Convert UrlType to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlType::Product => "product",
            UrlType::Category => "category",
            UrlType::Blog => "blog",
            UrlType::Tag => "tag",
            UrlType::Page => "page",
        }
    }

    /// All types, in bucket order
    pub fn all() -> [UrlType; 5] {
        [
            UrlType::Product,
            UrlType::Category,
            UrlType::Blog,
            UrlType::Tag,
            UrlType::Page,
        ]
    }
}

impl std::fmt::Display for UrlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry extracted from a sitemap document.
///
/// Either a page reference (from a urlset) or a nested sitemap reference
/// (from a sitemapindex); immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    /// The URL of the page or nested sitemap
    pub loc: String,

    /// Last modification timestamp, as given in the source document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,

    /// Change frequency hint (daily, weekly, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,

    /// Crawl priority hint (0.0 - 1.0, kept as the source string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl SitemapEntry {
    pub fn new(loc: String) -> Self {
        Self {
            loc,
            lastmod: None,
            changefreq: None,
            priority: None,
        }
    }
}

/// Details scraped from a page during an advanced scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
}

impl PageDetails {
    /// True when no field was extracted
    pub fn is_empty(&self) -> bool {
        *self == PageDetails::default()
    }
}

/// A sitemap entry with its assigned type and optional scraped details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedUrl {
    pub loc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(rename = "type")]
    pub url_type: UrlType,

    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub details: Option<PageDetails>,
}

impl ClassifiedUrl {
    pub fn new(entry: SitemapEntry, url_type: UrlType) -> Self {
        Self {
            loc: entry.loc,
            lastmod: entry.lastmod,
            changefreq: entry.changefreq,
            priority: entry.priority,
            url_type,
            details: None,
        }
    }
}

/// Per-type counts for a finished scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub total: usize,
    pub by_type: BTreeMap<UrlType, usize>,
}

/// Final output of one resolution call.
///
/// Built incrementally during traversal and returned once; not mutated
/// afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Classified URLs, bucketed by type; every bucket is present even
    /// when empty
    pub urls: BTreeMap<UrlType, Vec<ClassifiedUrl>>,

    pub stats: ScanStats,

    /// Whether the root document was a sitemap index
    pub is_sitemap_index: bool,

    /// Whether the leaf URL list was cut off at the configured cap
    pub truncated: bool,
}

impl ResolutionResult {
    /// Bucket a list of classified URLs and compute the stats
    pub fn from_classified(
        classified: Vec<ClassifiedUrl>,
        is_sitemap_index: bool,
        truncated: bool,
    ) -> Self {
        let mut urls: BTreeMap<UrlType, Vec<ClassifiedUrl>> = BTreeMap::new();
        for url_type in UrlType::all() {
            urls.insert(url_type, Vec::new());
        }

        for item in classified {
            urls.entry(item.url_type).or_default().push(item);
        }

        let by_type: BTreeMap<UrlType, usize> =
            urls.iter().map(|(t, v)| (*t, v.len())).collect();
        let total = by_type.values().sum();

        Self {
            urls,
            stats: ScanStats { total, by_type },
            is_sitemap_index,
            truncated,
        }
    }

    /// Flat iterator over all classified URLs, bucket by bucket
    pub fn iter_urls(&self) -> impl Iterator<Item = &ClassifiedUrl> {
        self.urls.values().flatten()
    }
}
