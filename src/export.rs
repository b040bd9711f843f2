//! Result rendering for the CLI collaborator: CSV and pretty JSON.

use crate::models::ResolutionResult;
use std::io::Write;

/// Write a resolution result as CSV, one row per classified URL.
///
/// # Errors
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(result: &ResolutionResult, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "URL,Type,Last Modified,Change Frequency,Priority")?;

    for item in result.iter_urls() {
        writeln!(
            writer,
            "{},{},{},{},{}",
            csv_field(&item.loc),
            csv_field(item.url_type.as_str()),
            csv_field(item.lastmod.as_deref().unwrap_or("")),
            csv_field(item.changefreq.as_deref().unwrap_or("")),
            csv_field(item.priority.as_deref().unwrap_or("")),
        )?;
    }

    Ok(())
}

/// Quote a CSV field, doubling embedded quotes; values may contain commas
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Write a resolution result as pretty-printed JSON.
///
/// # Errors
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(result: &ResolutionResult, writer: &mut W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)?;
    Ok(())
}

/// Render a short human-readable summary of a scan
pub fn render_summary(result: &ResolutionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Scanned {} URL(s){}{}\n",
        result.stats.total,
        if result.is_sitemap_index {
            " across a sitemap index"
        } else {
            ""
        },
        if result.truncated { " (truncated)" } else { "" },
    ));

    for (url_type, count) in &result.stats.by_type {
        out.push_str(&format!("  {:<10} {}\n", url_type.to_string(), count));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifiedUrl, SitemapEntry, UrlType};

    fn sample_result() -> ResolutionResult {
        let mut entry = SitemapEntry::new("https://a.com/product/1".to_string());
        entry.lastmod = Some("2024-01-01".to_string());
        ResolutionResult::from_classified(
            vec![
                ClassifiedUrl::new(entry, UrlType::Product),
                ClassifiedUrl::new(
                    SitemapEntry::new("https://a.com/about".to_string()),
                    UrlType::Page,
                ),
            ],
            false,
            false,
        )
    }

    #[test]
    fn test_csv_output() {
        let mut buffer = Vec::new();
        write_csv(&sample_result(), &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "URL,Type,Last Modified,Change Frequency,Priority"
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"https://a.com/product/1\",\"product\",\"2024-01-01\",\"\",\"\""
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"https://a.com/about\",\"page\",\"\",\"\",\"\""
        );
    }

    #[test]
    fn test_csv_fields_with_commas_stay_intact() {
        let mut entry = SitemapEntry::new("https://a.com/product/2".to_string());
        entry.lastmod = Some("Jan 2, 2024".to_string());
        entry.changefreq = Some("weekly, roughly".to_string());
        let result = ResolutionResult::from_classified(
            vec![ClassifiedUrl::new(entry, UrlType::Product)],
            false,
            false,
        );

        let mut buffer = Vec::new();
        write_csv(&result, &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();

        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "\"https://a.com/product/2\",\"product\",\"Jan 2, 2024\",\"weekly, roughly\",\"\""
        );
    }

    #[test]
    fn test_json_round_trips() {
        let mut buffer = Vec::new();
        write_json(&sample_result(), &mut buffer).unwrap();
        let parsed: ResolutionResult = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.stats.total, 2);
    }

    #[test]
    fn test_summary_mentions_truncation() {
        let mut result = sample_result();
        result.truncated = true;
        assert!(render_summary(&result).contains("(truncated)"));
    }
}
