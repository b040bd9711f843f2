//! Best-effort repair pass for malformed sitemap XML.
//!
//! Real-world sitemaps routinely contain null bytes, stray control
//! characters, self-closing elements and broken attribute syntax that make
//! strict parsers bail out. This pass rewrites the worst offenders before
//! parsing. It is not a validator - the output is not guaranteed to be
//! well-formed, it only raises the odds that the subsequent parse succeeds.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;

lazy_static! {
    // `<tag attrs/>` -> `<tag attrs></tag>`
    static ref SELF_CLOSING: Regex =
        Regex::new(r"<([a-zA-Z][a-zA-Z0-9:_.-]*)([^<>]*?)\s*/>").unwrap();

    // Any opening tag, for scoped attribute repair
    static ref OPEN_TAG: Regex = Regex::new(r"<[a-zA-Z][^<>]*>").unwrap();

    // A bare attribute name followed by whitespace or the tag end
    static ref BARE_ATTR: Regex = Regex::new(r"(\s+[a-zA-Z][a-zA-Z0-9:_-]*)([\s>])").unwrap();

    // Two adjacent xmlns declarations inside one tag
    static ref DOUBLE_XMLNS: Regex =
        Regex::new(r#"(xmlns=["'][^"']*["'])\s+(xmlns=["'][^"']*["'])"#).unwrap();
}

/// Repair common defects in raw sitemap XML.
///
/// Applies, in order: null-byte removal, self-closing tag expansion,
/// invalid-character stripping, bare-attribute repair and duplicate-xmlns
/// collapse.
pub fn sanitize_xml(input: &str) -> String {
    let no_nulls = input.replace('\0', "");

    let expanded = SELF_CLOSING.replace_all(&no_nulls, |caps: &Captures| {
        format!("<{}{}></{}>", &caps[1], &caps[2], &caps[1])
    });

    let valid_chars: String = expanded.chars().filter(|&c| is_valid_xml_char(c)).collect();

    let attrs_fixed = OPEN_TAG.replace_all(&valid_chars, |caps: &Captures| {
        fix_bare_attributes(&caps[0])
    });

    DOUBLE_XMLNS
        .replace_all(&attrs_fixed, |caps: &Captures| {
            if caps[1] == caps[2] {
                caps[1].to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Valid XML 1.0 character ranges: tab, LF, CR, U+0020-U+D7FF,
/// U+E000-U+FFFD and the supplementary planes.
fn is_valid_xml_char(c: char) -> bool {
    matches!(c, '\u{09}' | '\u{0A}' | '\u{0D}')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

/// Give attributes without a value an explicit empty one, within one tag.
///
/// Runs to a fixpoint because consecutive bare attributes share the
/// whitespace the pattern consumes.
fn fix_bare_attributes(tag: &str) -> String {
    // Quoted values may legitimately contain spaces; only touch tags
    // without quotes to avoid rewriting attribute content.
    if tag.contains('"') || tag.contains('\'') {
        return tag.to_string();
    }

    let mut current = tag.to_string();
    loop {
        let next = BARE_ATTR.replace_all(&current, |caps: &Captures| {
            format!("{}=\"\"{}", &caps[1], &caps[2])
        });
        match next {
            Cow::Borrowed(_) => return current,
            Cow::Owned(owned) => current = owned,
        }
    }
}
