use log::debug;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::http::Fetch;

/// One downloadable file found on a listing page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub title: String,
    pub link: String,
}

/// Fetch a listing page and extract its attachments.
pub fn fetch_listing<F: Fetch + ?Sized>(
    client: &F,
    url: &str,
) -> Result<Vec<Attachment>, FetchError> {
    debug!("Fetching listing {}", url);
    let response = client.get(url)?;
    let html = String::from_utf8_lossy(&response.body);
    Ok(parse_listing(&html))
}

/// Extract `(title, link)` pairs from `td.attachment-title` cells, in
/// document order. Cells without a usable `a.attachment-link` are skipped.
pub fn parse_listing(html: &str) -> Vec<Attachment> {
    let document = Html::parse_document(html);
    let cell_selector = Selector::parse("td.attachment-title").unwrap();
    let link_selector = Selector::parse("a.attachment-link").unwrap();

    let mut attachments = Vec::new();

    for cell in document.select(&cell_selector) {
        let Some(link_el) = cell.select(&link_selector).next() else {
            continue;
        };

        let title = link_el.text().collect::<String>().trim().to_string();
        let link = link_el.value().attr("href").unwrap_or("").trim().to_string();

        if link.is_empty() {
            debug!("Skipping attachment without href: {:?}", title);
            continue;
        }

        attachments.push(Attachment { title, link });
    }

    attachments
}
