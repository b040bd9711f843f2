//! Permissive sitemap XML parsing with a tolerant fallback scan.
//!
//! The structured pass walks the XML events case-insensitively and ignores
//! anything it does not recognize. When that fails - or finds nothing - a
//! relaxed tag scan pulls `<url>` and `<sitemap>` blocks straight out of
//! the markup. Zero entries from both strategies is an explicit error, not
//! an empty success.

use crate::models::SitemapEntry;
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

/// Which document shape a sitemap resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// A sitemapindex: entries point at other sitemap documents
    Index,
    /// A urlset: entries point at pages directly
    UrlSet,
}

/// Which parse strategy produced the entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Structured,
    FallbackScan,
}

/// Parsed sitemap document
#[derive(Debug, Clone)]
pub struct ParsedSitemap {
    pub kind: SitemapKind,
    pub entries: Vec<SitemapEntry>,
    pub strategy: ParseStrategy,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("no URLs found in sitemap")]
    NoUrlsFound,

    #[error("XML error: {0}")]
    Xml(String),
}

/// Parse sitemap XML into a typed list of entries.
///
/// Tries the structured parse first; on failure or zero entries falls back
/// to the relaxed tag scan. The returned [`ParseStrategy`] records which
/// one succeeded.
pub fn parse_sitemap(xml: &str) -> Result<ParsedSitemap, ParseError> {
    match structured_parse(xml) {
        Ok(parsed) if !parsed.entries.is_empty() => return Ok(parsed),
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "structured sitemap parse failed, trying fallback scan"),
    }

    let fallback = fallback_scan(xml);
    if fallback.entries.is_empty() {
        return Err(ParseError::NoUrlsFound);
    }
    Ok(fallback)
}

/// Event-based parse, case-insensitive on tag names, trimming text values,
/// skipping unknown elements.
fn structured_parse(xml: &str) -> Result<ParsedSitemap, ParseError> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;

    let mut kind: Option<SitemapKind> = None;
    let mut entries = Vec::new();
    let mut current: Option<SitemapEntry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                // Full qualified name: namespaced tags like <image:loc>
                // must not be mistaken for <loc>
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"sitemapindex" => kind = Some(SitemapKind::Index),
                    b"urlset" => kind = Some(SitemapKind::UrlSet),
                    b"sitemap" => {
                        kind.get_or_insert(SitemapKind::Index);
                        current = Some(SitemapEntry::new(String::new()));
                    }
                    b"url" => {
                        kind.get_or_insert(SitemapKind::UrlSet);
                        current = Some(SitemapEntry::new(String::new()));
                    }
                    b"loc" => field = start_field(&current, Field::Loc, &mut text),
                    b"lastmod" => field = start_field(&current, Field::Lastmod, &mut text),
                    b"changefreq" => field = start_field(&current, Field::Changefreq, &mut text),
                    b"priority" => field = start_field(&current, Field::Priority, &mut text),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    let value = e
                        .unescape()
                        .map_err(|err| ParseError::Xml(err.to_string()))?;
                    text.push_str(&value);
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"loc" | b"lastmod" | b"changefreq" | b"priority" => {
                        if let (Some(entry), Some(which)) = (current.as_mut(), field.take()) {
                            let value = text.trim().to_string();
                            if !value.is_empty() {
                                match which {
                                    Field::Loc => entry.loc = value,
                                    Field::Lastmod => entry.lastmod = Some(value),
                                    Field::Changefreq => entry.changefreq = Some(value),
                                    Field::Priority => entry.priority = Some(value),
                                }
                            }
                        }
                    }
                    b"sitemap" | b"url" => {
                        if let Some(entry) = current.take() {
                            if !entry.loc.is_empty() {
                                entries.push(entry);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        }
    }

    Ok(ParsedSitemap {
        kind: kind.unwrap_or(SitemapKind::UrlSet),
        entries,
        strategy: ParseStrategy::Structured,
    })
}

#[derive(Clone, Copy)]
enum Field {
    Loc,
    Lastmod,
    Changefreq,
    Priority,
}

fn start_field(current: &Option<SitemapEntry>, which: Field, text: &mut String) -> Option<Field> {
    if current.is_some() {
        text.clear();
        Some(which)
    } else {
        None
    }
}

lazy_static! {
    static ref ENTRY_BLOCK: Regex =
        Regex::new(r"(?is)<(url|sitemap)\b[^>]*>(.*?)</\s*(?:url|sitemap)\s*>").unwrap();
    static ref LOC: Regex = Regex::new(r"(?is)<loc[^>]*>(.*?)</\s*loc\s*>").unwrap();
    static ref LASTMOD: Regex = Regex::new(r"(?is)<lastmod[^>]*>(.*?)</\s*lastmod\s*>").unwrap();
    static ref CHANGEFREQ: Regex =
        Regex::new(r"(?is)<changefreq[^>]*>(.*?)</\s*changefreq\s*>").unwrap();
    static ref PRIORITY: Regex = Regex::new(r"(?is)<priority[^>]*>(.*?)</\s*priority\s*>").unwrap();
}

/// Relaxed tag scan over markup too broken for the structured parse.
///
/// Entries without a `loc` are discarded. Index-ness is detected from the
/// presence of `<sitemap>` blocks or a `sitemapindex` root anywhere in the
/// content.
fn fallback_scan(content: &str) -> ParsedSitemap {
    let mut entries = Vec::new();
    let mut saw_sitemap_block = false;

    for caps in ENTRY_BLOCK.captures_iter(content) {
        if caps[1].eq_ignore_ascii_case("sitemap") {
            saw_sitemap_block = true;
        }
        let block = &caps[2];

        let loc = match first_capture(&LOC, block) {
            Some(loc) if !loc.is_empty() => loc,
            _ => continue,
        };

        entries.push(SitemapEntry {
            loc,
            lastmod: first_capture(&LASTMOD, block),
            changefreq: first_capture(&CHANGEFREQ, block),
            priority: first_capture(&PRIORITY, block),
        });
    }

    let kind = if saw_sitemap_block || content.to_lowercase().contains("sitemapindex") {
        SitemapKind::Index
    } else {
        SitemapKind::UrlSet
    };

    ParsedSitemap {
        kind,
        entries,
        strategy: ParseStrategy::FallbackScan,
    }
}

fn first_capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .map(|caps| unescape_entities(caps[1].trim()))
        .filter(|s| !s.is_empty())
}

/// Undo the five predefined XML entities; the fallback scan reads raw text
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
