//! URL type classification from hostname and path patterns.
//!
//! Pure and deterministic: the same URL always classifies the same way.
//! Rule order matters - sitemap-filename hints are checked before generic
//! path segments, which are checked before regex shapes, and product rules
//! always win over category, blog and tag rules within a tier.

use crate::models::UrlType;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PRODUCT_SHAPES: Vec<Regex> = vec![
        Regex::new(r"pr-\d+\.html$").unwrap(),
        Regex::new(r"/p-[a-z0-9-]+$").unwrap(),
    ];
    static ref CATEGORY_SHAPES: Vec<Regex> = vec![
        Regex::new(r"cat-\d+\.html$").unwrap(),
        Regex::new(r"/c-[a-z0-9-]+$").unwrap(),
    ];
    static ref BLOG_SHAPES: Vec<Regex> = vec![
        Regex::new(r"blog-\d+\.html$").unwrap(),
        Regex::new(r"post-\d+\.html$").unwrap(),
        Regex::new(r"/b-[a-z0-9-]+$").unwrap(),
        Regex::new(r"/article/[\w-]+$").unwrap(),
    ];
    static ref TAG_SHAPES: Vec<Regex> = vec![Regex::new(r"/t-[a-z0-9-]+$").unwrap(),];
}

const PRODUCT_SEGMENTS: &[&str] = &["/urun/", "/product/", "/p/", "product.aspx"];
const CATEGORY_SEGMENTS: &[&str] = &["/kategori/", "/category/", "/c/", "collection"];
const BLOG_SEGMENTS: &[&str] = &["/blog/", "/makale/", "/article/", "/post/"];
const TAG_SEGMENTS: &[&str] = &["/tag/"];

/// Assign a type to a discovered URL.
///
/// Evaluation order (first match wins):
/// 1. sitemap filename hints (`sitemap_product`, `sitemap_blogtag`, ...)
/// 2. per-type patterns, product then category then blog then tag; each
///    type tries its path segments (`/urun/`, `/product/`, ...) before its
///    regex shapes (`...-pr-123.html`, `/p-some-slug`, ...)
/// 3. default: `UrlType::Page`
pub fn classify_url(url: &str) -> UrlType {
    let lower = url.to_lowercase();

    // Tier 1: sitemap filename hints. The compound names must be checked
    // before their `sitemap_blog` prefix.
    if lower.contains("sitemap_product") {
        return UrlType::Product;
    }
    if lower.contains("sitemap_blogtag") {
        return UrlType::Tag;
    }
    if lower.contains("sitemap_blogcategory") {
        return UrlType::Category;
    }
    if lower.contains("sitemap_blog") {
        return UrlType::Blog;
    }
    if lower.contains("sitemap_category") {
        return UrlType::Category;
    }

    // Tiers 2 and 3: one type at a time, so every product pattern beats
    // every category pattern, and so on down the list. Within a type, path
    // segments are tried before regex shapes.
    if matches_type(&lower, PRODUCT_SEGMENTS, &PRODUCT_SHAPES) {
        return UrlType::Product;
    }
    if matches_type(&lower, CATEGORY_SEGMENTS, &CATEGORY_SHAPES) {
        return UrlType::Category;
    }
    if matches_type(&lower, BLOG_SEGMENTS, &BLOG_SHAPES) {
        return UrlType::Blog;
    }
    if matches_type(&lower, TAG_SEGMENTS, &TAG_SHAPES) {
        return UrlType::Tag;
    }

    UrlType::Page
}

fn matches_type(lower: &str, segments: &[&str], shapes: &[Regex]) -> bool {
    segments.iter().any(|s| lower.contains(s)) || shapes.iter().any(|re| re.is_match(lower))
}
