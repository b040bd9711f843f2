//! Page detail extraction for advanced scans.
//!
//! Selector lookup tables per page type; pure functions over the fetched
//! HTML so they can be tested without a network.

use crate::models::{PageDetails, UrlType};
use crate::url_utils::resolve_against;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_PRICE: Regex = Regex::new(r"[^\d.,]").unwrap();
}

/// Extract details appropriate to the page type
pub fn extract_details(html: &str, page_url: &str, url_type: UrlType) -> PageDetails {
    match url_type {
        UrlType::Product => extract_product_details(html, page_url),
        UrlType::Category => extract_category_details(html),
        UrlType::Blog => extract_blog_details(html),
        UrlType::Tag | UrlType::Page => PageDetails::default(),
    }
}

/// Title, price, description and images from a product page
pub fn extract_product_details(html: &str, page_url: &str) -> PageDetails {
    let document = Html::parse_document(html);

    let title = first_text(
        &document,
        &["h1", r#"[itemprop="name"]"#, "title"],
    );

    let price = first_text(
        &document,
        &[r#"[itemprop="price"]"#, ".price", "[data-price]"],
    )
    .map(|raw| NON_PRICE.replace_all(&raw, "").to_string())
    .filter(|p| !p.is_empty());

    let description = first_text(
        &document,
        &[r#"[itemprop="description"]"#, ".product-description"],
    )
    .or_else(|| meta_description(&document));

    let mut images = Vec::new();
    let img = Selector::parse("img").expect("Invalid CSS selector");
    for element in document.select(&img) {
        let src = element
            .value()
            .attr("src")
            .or_else(|| element.value().attr("data-src"));
        if let Some(src) = src {
            if src.contains("product") || src.contains("images") {
                let absolute = if src.starts_with("http") {
                    src.to_string()
                } else {
                    match resolve_against(page_url, src) {
                        Some(resolved) => resolved,
                        None => continue,
                    }
                };
                if !images.contains(&absolute) {
                    images.push(absolute);
                }
            }
        }
    }

    PageDetails {
        title,
        price,
        description,
        images,
        ..PageDetails::default()
    }
}

/// Title and description from a category listing page
pub fn extract_category_details(html: &str) -> PageDetails {
    let document = Html::parse_document(html);

    PageDetails {
        title: first_text(&document, &["h1", "title"]),
        description: meta_description(&document)
            .or_else(|| first_text(&document, &[".category-description"])),
        ..PageDetails::default()
    }
}

/// Title, description, author and publish date from a blog post
pub fn extract_blog_details(html: &str) -> PageDetails {
    let document = Html::parse_document(html);

    PageDetails {
        title: first_text(&document, &["h1", "title"]),
        description: meta_description(&document)
            .or_else(|| first_text(&document, &["article p"])),
        author: first_text(&document, &[r#"[itemprop="author"]"#, ".author"]),
        publish_date: first_attr(&document, r#"[itemprop="datePublished"]"#, "content")
            .or_else(|| first_text(&document, &[".published-date"])),
        ..PageDetails::default()
    }
}

/// First non-empty text content among the given selectors, in order
fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let selector = Selector::parse(raw).expect("Invalid CSS selector");
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect();
            let cleaned = WHITESPACE.replace_all(text.trim(), " ").to_string();
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

fn first_attr(document: &Html, raw: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(raw).expect("Invalid CSS selector");
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn meta_description(document: &Html) -> Option<String> {
    first_attr(document, r#"meta[name="description"]"#, "content")
}
