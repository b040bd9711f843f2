//! Recursive sitemap resolution.
//!
//! Turns a root sitemap URL into a classified, deduplicated list of page
//! URLs. Sitemap-index entries recurse back through the fetch queue; a
//! broken nested sitemap contributes nothing instead of failing the whole
//! scan. The visited set is owned by one resolution call and never shared
//! across concurrent scans.

use crate::classifier::classify_url;
use crate::config::Config;
use crate::extract;
use crate::fetch_queue::FetchQueue;
use crate::models::{ClassifiedUrl, PageDetails, ResolutionResult, SitemapEntry, UrlType};
use crate::network::{Fetch, FetchError};
use crate::sanitizer::sanitize_xml;
use crate::sitemap_parser::{parse_sitemap, ParseError, SitemapKind};
use crate::url_utils::{is_fetchable_url, normalize_url};
use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Policy knobs for one resolver instance
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Cap on collected leaf URLs; exceeding it sets `truncated`
    pub max_urls: usize,
    /// Scrape page details for product/category/blog URLs
    pub advanced: bool,
    /// Pause between successive child-sitemap resolutions
    pub child_pause: Duration,
    /// Leaf URLs classified/enriched concurrently per batch
    pub batch_size: usize,
    /// Pause between enrichment batches
    pub batch_pause: Duration,
    /// Wall-clock budget for the whole resolution call
    pub deadline: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_urls: Config::MAX_LEAF_URLS,
            advanced: false,
            child_pause: Duration::from_millis(Config::CHILD_SITEMAP_PAUSE_MS),
            batch_size: Config::CLASSIFY_BATCH_SIZE,
            batch_pause: Duration::from_millis(Config::BATCH_PAUSE_MS),
            deadline: Duration::from_secs(Config::SCAN_DEADLINE_SECS),
        }
    }
}

/// Errors surfaced by a resolution call.
///
/// Only root-level failures reach the caller; failures below the root are
/// contained and logged.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("scan deadline exceeded")]
    DeadlineExceeded,
}

/// Resolves a root sitemap URL into a [`ResolutionResult`]
pub struct SitemapResolver {
    fetcher: Arc<dyn Fetch>,
    queue: Arc<FetchQueue>,
    config: ResolverConfig,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<dyn Fetch>, queue: Arc<FetchQueue>) -> Self {
        Self::with_config(fetcher, queue, ResolverConfig::default())
    }

    pub fn with_config(
        fetcher: Arc<dyn Fetch>,
        queue: Arc<FetchQueue>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            fetcher,
            queue,
            config,
        }
    }

    /// Resolve a root sitemap URL.
    ///
    /// All-or-nothing at the top level: an unreachable root, a root that
    /// parses to zero entries, or blowing the wall-clock deadline all
    /// return an error. Failures on nested sitemaps are contained.
    pub async fn resolve(&self, root_url: &str) -> Result<ResolutionResult, ResolveError> {
        match timeout(self.config.deadline, self.resolve_inner(root_url)).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::DeadlineExceeded),
        }
    }

    async fn resolve_inner(&self, root_url: &str) -> Result<ResolutionResult, ResolveError> {
        let root = normalize_url(root_url);
        if !is_fetchable_url(&root) {
            return Err(ResolveError::InvalidUrl(root_url.to_string()));
        }

        info!(url = %root, "starting sitemap scan");

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root.clone());

        let text = self.fetch_document(&root).await?;
        let parsed = parse_sitemap(&sanitize_xml(&text))?;
        let is_sitemap_index = parsed.kind == SitemapKind::Index;
        debug!(kind = ?parsed.kind, strategy = ?parsed.strategy, entries = parsed.entries.len(), "root sitemap parsed");

        let mut leaves = Vec::new();
        if is_sitemap_index {
            let child_count = parsed.entries.len();
            for (i, child) in parsed.entries.into_iter().enumerate() {
                leaves.extend(self.collect_leaves(child.loc, &mut visited).await);
                if i + 1 < child_count {
                    sleep(self.config.child_pause).await;
                }
            }
        } else {
            leaves = parsed.entries;
        }

        // Dedup across sibling sitemaps by normalized URL, first
        // encounter wins, so document order is preserved
        let mut seen: HashSet<String> = HashSet::new();
        leaves.retain(|entry| seen.insert(normalize_url(&entry.loc)));

        let truncated = leaves.len() > self.config.max_urls;
        if truncated {
            info!(
                total = leaves.len(),
                cap = self.config.max_urls,
                "limiting scan to first {} URLs",
                self.config.max_urls
            );
            leaves.truncate(self.config.max_urls);
        }

        let classified = self.classify_batches(leaves).await;
        let result = ResolutionResult::from_classified(classified, is_sitemap_index, truncated);
        info!(total = result.stats.total, "sitemap scan finished");
        Ok(result)
    }

    /// Recursively collect leaf entries under one sitemap URL.
    ///
    /// Any fetch or parse failure here is contained: the node is logged
    /// and contributes an empty list.
    fn collect_leaves<'a>(
        &'a self,
        loc: String,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Vec<SitemapEntry>> {
        async move {
            let url = normalize_url(&loc);
            if !visited.insert(url.clone()) {
                debug!(url = %url, "skipping already visited sitemap");
                return Vec::new();
            }

            let text = match self.fetch_document(&url).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to fetch nested sitemap");
                    return Vec::new();
                }
            };

            let parsed = match parse_sitemap(&sanitize_xml(&text)) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to parse nested sitemap");
                    return Vec::new();
                }
            };

            match parsed.kind {
                SitemapKind::UrlSet => parsed.entries,
                SitemapKind::Index => {
                    let mut leaves = Vec::new();
                    let child_count = parsed.entries.len();
                    for (i, child) in parsed.entries.into_iter().enumerate() {
                        leaves.extend(self.collect_leaves(child.loc, visited).await);
                        if i + 1 < child_count {
                            sleep(self.config.child_pause).await;
                        }
                    }
                    leaves
                }
            }
        }
        .boxed()
    }

    async fn fetch_document(&self, url: &str) -> Result<String, FetchError> {
        let fetcher = Arc::clone(&self.fetcher);
        let target = url.to_string();
        self.queue
            .submit(url, move || {
                let fetcher = Arc::clone(&fetcher);
                let target = target.clone();
                async move { fetcher.fetch_text(&target).await }
            })
            .await
    }

    /// Classify (and in advanced mode enrich) leaf entries in bounded
    /// batches. Enrichment failures degrade to `details: None`.
    async fn classify_batches(&self, leaves: Vec<SitemapEntry>) -> Vec<ClassifiedUrl> {
        let mut classified = Vec::with_capacity(leaves.len());
        let batch_size = self.config.batch_size.max(1);
        let total = leaves.len();

        for (batch_index, batch) in leaves
            .chunks(batch_size)
            .map(|chunk| chunk.to_vec())
            .enumerate()
        {
            let futures = batch.into_iter().map(|entry| async move {
                let url_type = classify_url(&entry.loc);
                let mut item = ClassifiedUrl::new(entry, url_type);
                if self.config.advanced {
                    item.details = self.fetch_details(&item.loc, url_type).await;
                }
                item
            });
            classified.extend(join_all(futures).await);

            // Pacing only matters when enrichment touched the network
            let more_remaining = (batch_index + 1) * batch_size < total;
            if self.config.advanced && more_remaining {
                sleep(self.config.batch_pause).await;
            }
        }

        classified
    }

    async fn fetch_details(&self, url: &str, url_type: UrlType) -> Option<PageDetails> {
        let details = match url_type {
            UrlType::Product | UrlType::Category | UrlType::Blog => {
                match self.fetch_document(url).await {
                    Ok(html) => extract::extract_details(&html, url, url_type),
                    Err(e) => {
                        warn!(url = %url, error = %e, "failed to fetch page details");
                        return None;
                    }
                }
            }
            UrlType::Tag | UrlType::Page => return None,
        };

        if details.is_empty() {
            None
        } else {
            Some(details)
        }
    }
}
