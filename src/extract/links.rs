//! Raw link extraction from HTML bodies
//!
//! Returns hrefs exactly as they appear in the page, relative or absolute;
//! resolution against the base URL and scope filtering happen later in the
//! candidate pipeline.

use scraper::{Html, Selector};

/// Extracts every candidate href from an HTML document
///
/// Skipped outright:
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - empty hrefs
/// - `<a href="..." download>` links
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if href.is_empty() {
                    continue;
                }
                if href.starts_with("javascript:")
                    || href.starts_with("mailto:")
                    || href.starts_with("tel:")
                    || href.starts_with("data:")
                {
                    continue;
                }
                links.push(href.to_string());
            }
        }
    }

    links
}
